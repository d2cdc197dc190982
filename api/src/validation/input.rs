//! Standalone email/amount validation
//!
//! Independent of the request adapter: validates a free-standing
//! `{email, amount}` object and reports failures as `{field, message, fix}`.

use once_cell::sync::Lazy;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::friendly::FriendlyError;
use super::requests::ValidationMessages;
use super::schema::Section;
use super::validators::{amount_rule, email_rule, Presence};

static DEFAULT_INPUT_SECTION: Lazy<Section> =
    Lazy::new(|| input_section(&ValidationMessages::default()));

/// Normalized standalone input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidInput {
    pub email: String,
    pub amount: f64,
}

/// Outcome of [`validate_input`]
#[derive(Debug, Clone, PartialEq)]
pub enum InputValidation {
    Valid(ValidInput),
    Invalid(Vec<FriendlyError>),
}

impl InputValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, InputValidation::Valid(_))
    }

    pub fn data(&self) -> Option<&ValidInput> {
        match self {
            InputValidation::Valid(data) => Some(data),
            InputValidation::Invalid(_) => None,
        }
    }

    pub fn errors(&self) -> &[FriendlyError] {
        match self {
            InputValidation::Valid(_) => &[],
            InputValidation::Invalid(errors) => errors,
        }
    }
}

impl Serialize for InputValidation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("InputValidation", 2)?;
        match self {
            InputValidation::Valid(data) => {
                state.serialize_field("valid", &true)?;
                state.serialize_field("data", data)?;
            }
            InputValidation::Invalid(errors) => {
                state.serialize_field("valid", &false)?;
                state.serialize_field("errors", errors)?;
            }
        }
        state.end()
    }
}

/// Rules for the standalone `{email, amount}` object, email first
pub fn input_section(messages: &ValidationMessages) -> Section {
    Section::new(vec![
        email_rule(Presence::Required, &messages.email),
        amount_rule(Presence::Required, &messages.amount),
    ])
}

/// Validate an arbitrary value as `{email, amount}` with the default messages
pub fn validate_input(input: &Value) -> InputValidation {
    validate_input_with(&DEFAULT_INPUT_SECTION, input)
}

pub fn validate_input_with(section: &Section, input: &Value) -> InputValidation {
    let normalized = match section.validate("", input) {
        Ok(normalized) => normalized,
        Err(errors) => {
            return InputValidation::Invalid(errors.iter().map(FriendlyError::from).collect())
        }
    };

    match serde_json::from_value::<ValidInput>(Value::Object(normalized)) {
        Ok(data) => InputValidation::Valid(data),
        Err(err) => InputValidation::Invalid(vec![FriendlyError {
            field: "input".to_string(),
            message: err.to_string(),
            fix: super::friendly::fix_suggestion("input", "").to_string(),
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_accepts_valid_email() {
        let result = validate_input(&json!({"email": "user@domain.com", "amount": 100}));
        assert!(result.is_valid());
        assert_eq!(result.data().unwrap().email, "user@domain.com");
    }

    #[test]
    fn test_rejects_missing_email() {
        let result = validate_input(&json!({"amount": 100}));
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].field, "email");
        assert_eq!(result.errors()[0].fix, "Please provide an email address");
    }

    #[test]
    fn test_missing_email_reported_before_amount() {
        let result = validate_input(&json!({"amount": -5}));
        let errors = result.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[1].field, "amount");
        assert_eq!(errors[1].fix, "Enter an amount greater than 0");
    }

    #[test]
    fn test_rejects_invalid_email_format() {
        let result = validate_input(&json!({"email": "invalid-email", "amount": 100}));
        assert_eq!(result.errors()[0].field, "email");
        assert_eq!(result.errors()[0].message, "Invalid email format");
        assert_eq!(
            result.errors()[0].fix,
            "Enter a valid email address in the format user@domain.com"
        );
    }

    #[test]
    fn test_accepts_valid_amount() {
        let result = validate_input(&json!({"email": "user@domain.com", "amount": 123.45}));
        assert_eq!(result.data().unwrap().amount, 123.45);
    }

    #[test]
    fn test_rejects_negative_amount() {
        let result = validate_input(&json!({"email": "user@domain.com", "amount": -100}));
        assert_eq!(result.errors()[0].field, "amount");
    }

    #[test]
    fn test_rejects_more_than_two_decimals() {
        let result = validate_input(&json!({"email": "user@domain.com", "amount": 100.123}));
        let error = &result.errors()[0];
        assert_eq!(error.field, "amount");
        assert!(error.message.contains("decimal places"));
    }

    #[test]
    fn test_rejects_amount_over_maximum() {
        let result = validate_input(&json!({"email": "user@domain.com", "amount": 1000000000}));
        assert_eq!(result.errors()[0].field, "amount");
        assert_eq!(
            result.errors()[0].fix,
            "Enter an amount less than or equal to 999,999,999.99"
        );
    }

    #[test]
    fn test_rejects_string_amount() {
        let result = validate_input(&json!({"email": "user@domain.com", "amount": "12"}));
        assert_eq!(result.errors()[0].fix, "Enter a valid numeric amount (e.g., 1234.56)");
    }

    #[test]
    fn test_normalizes_and_is_idempotent() {
        let first = validate_input(&json!({"email": "Mixed@Case.Org", "amount": 10.5}));
        let data = first.data().unwrap().clone();
        assert_eq!(data.email, "mixed@case.org");
        assert_eq!(data.amount, 10.5);

        let again = validate_input(&serde_json::to_value(&data).unwrap());
        assert_eq!(again.data(), Some(&data));
    }

    #[test]
    fn test_non_object_input() {
        let result = validate_input(&json!("user@domain.com"));
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].field, "input");
    }

    #[test]
    fn test_serialized_shape() {
        let ok = serde_json::to_value(validate_input(&json!({"email": "a@b.co", "amount": 1}))).unwrap();
        assert_eq!(ok, json!({"valid": true, "data": {"email": "a@b.co", "amount": 1.0}}));

        let bad = serde_json::to_value(validate_input(&json!({}))).unwrap();
        assert_eq!(bad["valid"], false);
        assert_eq!(bad["errors"].as_array().unwrap().len(), 2);
        assert!(bad.get("data").is_none());
    }

    proptest! {
        #[test]
        fn valid_input_is_lowercased_and_kept(
            local in "[A-Za-z0-9]{1,16}",
            host in "[A-Za-z0-9]{1,16}",
            cents in 1i64..=99_999_999_999,
        ) {
            let email = format!("{local}@{host}.com");
            let amount = cents as f64 / 100.0;
            let result = validate_input(&json!({"email": email, "amount": amount}));
            let data = result.data().cloned();
            prop_assert_eq!(
                data,
                Some(ValidInput { email: email.to_lowercase(), amount })
            );
        }

        #[test]
        fn three_decimal_amounts_get_precision_fix(tens in 0i64..=99_999_999_998, digit in 1i64..=9) {
            let amount = (tens * 10 + digit) as f64 / 1000.0;
            let result = validate_input(&json!({"email": "a@b.co", "amount": amount}));
            prop_assert_eq!(result.errors().len(), 1);
            prop_assert_eq!(
                result.errors()[0].fix.as_str(),
                "Enter an amount with maximum 2 decimal places (e.g., 123.45)"
            );
        }
    }
}
