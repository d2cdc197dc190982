//! Field validators
//!
//! A [`FieldRule`] is an ordered list of [`Check`] descriptors for one field,
//! evaluated in sequence and stopped at the first failure, followed by an
//! optional [`Normalize`] step. Rules never touch their input; they return a
//! new value or a [`ValidationError`].

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::normalizers::{
    decimal_places, format_amount, lowercase_email, parse_int_prefix, round_to_cents,
};

lazy_static! {
    /// `local@domain` shape with dot-separated local atoms; domain segments
    /// are checked separately
    static ref EMAIL_SHAPE_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9_%+'\-]+(\.[A-Za-z0-9_%+'\-]+)*@[A-Za-z0-9.\-]+$").unwrap();

    /// Hyphenated UUID in any version
    static ref UUID_REGEX: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    ).unwrap();

    /// Letters, whitespace, hyphens and apostrophes
    static ref NAME_CHARSET_REGEX: Regex = Regex::new(r"^[a-zA-Z\s'\-]+$").unwrap();
}

/// Largest accepted amount
pub const MAX_AMOUNT: f64 = 999_999_999.99;
/// Decimal digits an amount may carry
pub const AMOUNT_DECIMALS: usize = 2;
pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 100;
pub const MIN_EMAIL_LENGTH: usize = 5;
pub const MAX_EMAIL_LENGTH: usize = 255;
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
/// Highest page number; keeps `(page - 1) * limit` well inside `i64`
pub const MAX_PAGE: i64 = 1_000_000_000;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Category of a field-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RequiredFieldMissing,
    TypeMismatch,
    FormatInvalid,
    RangeViolation,
    PrecisionViolation,
    CharsetViolation,
    EnumViolation,
    RefinementViolation,
}

impl ErrorKind {
    /// Machine-readable rule identifier
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::RequiredFieldMissing => "required",
            ErrorKind::TypeMismatch => "invalid_type",
            ErrorKind::FormatInvalid => "invalid_format",
            ErrorKind::RangeViolation => "out_of_range",
            ErrorKind::PrecisionViolation => "invalid_precision",
            ErrorKind::CharsetViolation => "invalid_charset",
            ErrorKind::EnumViolation => "invalid_enum_value",
            ErrorKind::RefinementViolation => "refinement_failed",
        }
    }
}

/// One field-level validation failure
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Top-level field name, or the section name for section-wide failures
    pub field: String,
    /// Dotted location, e.g. `body.email`
    pub path: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            path: field.clone(),
            field,
            kind,
            message: message.into(),
        }
    }

    /// Prefix the path with the request section the field belongs to
    pub fn within(mut self, section: &str) -> Self {
        if !section.is_empty() {
            self.path = format!("{}.{}", section, self.path);
        }
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Message configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Message overrides for a single rule, grouped by failure family
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleMessages {
    /// Used when the field is absent or blank
    pub required: Option<String>,
    /// Used for type, format, charset and enum failures
    pub format: Option<String>,
    /// Used for length, bound and precision failures
    pub range: Option<String>,
}

impl RuleMessages {
    pub fn format(message: impl Into<String>) -> Self {
        Self {
            format: Some(message.into()),
            ..Self::default()
        }
    }

    fn pick(&self, kind: ErrorKind) -> Option<&str> {
        match kind {
            ErrorKind::RequiredFieldMissing => self.required.as_deref(),
            ErrorKind::TypeMismatch
            | ErrorKind::FormatInvalid
            | ErrorKind::CharsetViolation
            | ErrorKind::EnumViolation => self.format.as_deref(),
            ErrorKind::RangeViolation | ErrorKind::PrecisionViolation => self.range.as_deref(),
            ErrorKind::RefinementViolation => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Checks
// ─────────────────────────────────────────────────────────────────────────────

/// One atomic check. Coercing checks hand their output to the next check.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// Must be a JSON string
    String,
    /// Must be a JSON number
    Number,
    /// String must not be blank
    NonEmpty,
    MinChars(usize),
    MaxChars(usize),
    EmailShape,
    /// Domain contains a dot and no empty segment
    EmailDomain,
    Uuid,
    NameCharset,
    OneOf(&'static [&'static str]),
    Positive,
    AtLeast(f64),
    AtMost(f64),
    MaxDecimalPlaces(usize),
    /// Coerce a query string to an integer; blank strings yield `default`
    IntegerString { default: i64 },
}

type CheckFailure = (ErrorKind, String);

impl Check {
    fn evaluate(&self, label: &str, value: Value) -> Result<Value, CheckFailure> {
        match self {
            Check::String => {
                text(label, &value)?;
                Ok(value)
            }
            Check::Number => {
                number(label, &value)?;
                Ok(value)
            }
            Check::NonEmpty => {
                if text(label, &value)?.trim().is_empty() {
                    return Err((
                        ErrorKind::RequiredFieldMissing,
                        format!("{} is required", label),
                    ));
                }
                Ok(value)
            }
            Check::MinChars(min) => {
                if text(label, &value)?.chars().count() < *min {
                    return Err((
                        ErrorKind::RangeViolation,
                        format!("{} must be at least {} characters", label, min),
                    ));
                }
                Ok(value)
            }
            Check::MaxChars(max) => {
                if text(label, &value)?.chars().count() > *max {
                    return Err((
                        ErrorKind::RangeViolation,
                        format!("{} cannot exceed {} characters", label, max),
                    ));
                }
                Ok(value)
            }
            Check::EmailShape => {
                if !EMAIL_SHAPE_REGEX.is_match(text(label, &value)?) {
                    return Err((ErrorKind::FormatInvalid, "Invalid email format".to_string()));
                }
                Ok(value)
            }
            Check::EmailDomain => {
                let email = text(label, &value)?;
                let valid = match email.split_once('@') {
                    Some((local, domain)) => {
                        !local.is_empty()
                            && domain.contains('.')
                            && domain.split('.').all(|segment| !segment.is_empty())
                    }
                    None => false,
                };
                if !valid {
                    return Err((
                        ErrorKind::FormatInvalid,
                        format!("{} must have a valid domain with proper format", label),
                    ));
                }
                Ok(value)
            }
            Check::Uuid => {
                if !UUID_REGEX.is_match(text(label, &value)?) {
                    return Err((
                        ErrorKind::FormatInvalid,
                        format!("{} must be a valid UUID", label),
                    ));
                }
                Ok(value)
            }
            Check::NameCharset => {
                if !NAME_CHARSET_REGEX.is_match(text(label, &value)?) {
                    return Err((
                        ErrorKind::CharsetViolation,
                        format!(
                            "{} can only contain letters, spaces, hyphens, and apostrophes",
                            label
                        ),
                    ));
                }
                Ok(value)
            }
            Check::OneOf(allowed) => {
                let candidate = text(label, &value)?;
                if !allowed.iter().any(|option| *option == candidate) {
                    return Err((
                        ErrorKind::EnumViolation,
                        format!("{} must be one of: {}", label, allowed.join(", ")),
                    ));
                }
                Ok(value)
            }
            Check::Positive => {
                if number(label, &value)? <= 0.0 {
                    return Err((
                        ErrorKind::RangeViolation,
                        format!("{} must be a positive number", label),
                    ));
                }
                Ok(value)
            }
            Check::AtLeast(min) => {
                if number(label, &value)? < *min {
                    return Err((
                        ErrorKind::RangeViolation,
                        format!("{} must be at least {}", label, display_bound(*min)),
                    ));
                }
                Ok(value)
            }
            Check::AtMost(max) => {
                if number(label, &value)? > *max {
                    return Err((
                        ErrorKind::RangeViolation,
                        format!("{} cannot exceed {}", label, display_bound(*max)),
                    ));
                }
                Ok(value)
            }
            Check::MaxDecimalPlaces(places) => {
                if decimal_places(number(label, &value)?) > *places {
                    return Err((
                        ErrorKind::PrecisionViolation,
                        format!("{} cannot have more than {} decimal places", label, places),
                    ));
                }
                Ok(value)
            }
            Check::IntegerString { default } => {
                let raw = text(label, &value)?;
                if raw.is_empty() {
                    return Ok(Value::from(*default));
                }
                parse_int_prefix(raw)
                    .map(Value::from)
                    .ok_or_else(|| (ErrorKind::TypeMismatch, format!("{} must be a number", label)))
            }
        }
    }
}

fn text<'a>(label: &str, value: &'a Value) -> Result<&'a str, CheckFailure> {
    value
        .as_str()
        .ok_or_else(|| (ErrorKind::TypeMismatch, format!("{} must be a string", label)))
}

fn number(label: &str, value: &Value) -> Result<f64, CheckFailure> {
    value
        .as_f64()
        .ok_or_else(|| (ErrorKind::TypeMismatch, format!("{} must be a number", label)))
}

fn display_bound(bound: f64) -> String {
    if bound.fract() == 0.0 {
        format!("{}", bound as i64)
    } else {
        format_amount(bound)
    }
}

/// Transform applied once every check has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    Lowercase,
    RoundToCents,
}

impl Normalize {
    fn apply(&self, value: Value) -> Value {
        match (self, &value) {
            (Normalize::Lowercase, Value::String(s)) => Value::String(lowercase_email(s)),
            (Normalize::RoundToCents, Value::Number(n)) => n
                .as_f64()
                .map(round_to_cents)
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(value),
            _ => value,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field rules
// ─────────────────────────────────────────────────────────────────────────────

/// What to do when a field is absent from its section
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    Optional,
    /// Substitute this value without running the checks
    Default(Value),
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: &'static str,
    /// Display name used in messages, e.g. `Email`
    pub label: &'static str,
    pub presence: Presence,
    pub checks: Vec<Check>,
    pub normalize: Option<Normalize>,
    pub messages: RuleMessages,
}

impl FieldRule {
    pub fn new(
        field: &'static str,
        label: &'static str,
        presence: Presence,
        checks: Vec<Check>,
    ) -> Self {
        Self {
            field,
            label,
            presence,
            checks,
            normalize: None,
            messages: RuleMessages::default(),
        }
    }

    pub fn with_normalize(mut self, normalize: Normalize) -> Self {
        self.normalize = Some(normalize);
        self
    }

    pub fn with_messages(mut self, messages: RuleMessages) -> Self {
        self.messages = messages;
        self
    }

    /// Validate one raw value.
    ///
    /// `Ok(None)` means an optional field was absent and produces no output.
    pub fn validate(&self, value: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        let Some(raw) = value else {
            return match &self.presence {
                Presence::Required => Err(self.fail(
                    ErrorKind::RequiredFieldMissing,
                    format!("{} is required", self.label),
                )),
                Presence::Optional => Ok(None),
                Presence::Default(default) => Ok(Some(default.clone())),
            };
        };

        let mut current = raw.clone();
        for check in &self.checks {
            current = check
                .evaluate(self.label, current)
                .map_err(|(kind, message)| self.fail(kind, message))?;
        }

        Ok(Some(match self.normalize {
            Some(normalize) => normalize.apply(current),
            None => current,
        }))
    }

    fn fail(&self, kind: ErrorKind, default_message: String) -> ValidationError {
        let message = self
            .messages
            .pick(kind)
            .map(str::to_string)
            .unwrap_or(default_message);
        ValidationError::new(self.field, kind, message)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule set
// ─────────────────────────────────────────────────────────────────────────────

/// Email: non-blank, `local@domain`, dotted domain, lower-cased
pub fn email_rule(presence: Presence, messages: &RuleMessages) -> FieldRule {
    FieldRule::new(
        "email",
        "Email",
        presence,
        vec![Check::String, Check::NonEmpty, Check::EmailShape, Check::EmailDomain],
    )
    .with_normalize(Normalize::Lowercase)
    .with_messages(messages.clone())
}

/// Email with the storage length bounds of a user record
pub fn user_email_rule(presence: Presence, messages: &RuleMessages) -> FieldRule {
    let mut rule = email_rule(presence, messages);
    rule.checks.extend([
        Check::MinChars(MIN_EMAIL_LENGTH),
        Check::MaxChars(MAX_EMAIL_LENGTH),
    ]);
    rule
}

/// Amount: number, positive, bounded, at most two decimals, rounded to cents
pub fn amount_rule(presence: Presence, messages: &RuleMessages) -> FieldRule {
    FieldRule::new(
        "amount",
        "Amount",
        presence,
        vec![
            Check::Number,
            Check::Positive,
            Check::AtMost(MAX_AMOUNT),
            Check::MaxDecimalPlaces(AMOUNT_DECIMALS),
        ],
    )
    .with_normalize(Normalize::RoundToCents)
    .with_messages(messages.clone())
}

pub fn name_rule(presence: Presence, messages: &RuleMessages) -> FieldRule {
    FieldRule::new(
        "name",
        "Name",
        presence,
        vec![
            Check::String,
            Check::MinChars(MIN_NAME_LENGTH),
            Check::MaxChars(MAX_NAME_LENGTH),
            Check::NameCharset,
        ],
    )
    .with_messages(messages.clone())
}

pub fn enum_rule(
    field: &'static str,
    label: &'static str,
    presence: Presence,
    allowed: &'static [&'static str],
    messages: &RuleMessages,
) -> FieldRule {
    FieldRule::new(field, label, presence, vec![Check::String, Check::OneOf(allowed)])
        .with_messages(messages.clone())
}

pub fn uuid_rule(field: &'static str, label: &'static str, messages: &RuleMessages) -> FieldRule {
    FieldRule::new(field, label, Presence::Required, vec![Check::String, Check::Uuid])
        .with_messages(messages.clone())
}

/// Optional free-text filter
pub fn text_rule(field: &'static str, label: &'static str) -> FieldRule {
    FieldRule::new(field, label, Presence::Optional, vec![Check::String])
}

pub fn page_rule(messages: &RuleMessages) -> FieldRule {
    FieldRule::new(
        "page",
        "Page",
        Presence::Default(Value::from(DEFAULT_PAGE)),
        vec![
            Check::IntegerString {
                default: DEFAULT_PAGE,
            },
            Check::Positive,
            Check::AtMost(MAX_PAGE as f64),
        ],
    )
    .with_messages(messages.clone())
}

pub fn limit_rule(messages: &RuleMessages) -> FieldRule {
    FieldRule::new(
        "limit",
        "Limit",
        Presence::Default(Value::from(DEFAULT_LIMIT)),
        vec![
            Check::IntegerString {
                default: DEFAULT_LIMIT,
            },
            Check::AtLeast(1.0),
            Check::AtMost(MAX_LIMIT as f64),
        ],
    )
    .with_messages(messages.clone())
}
