//! Composite schema validation
//!
//! A [`Schema`] groups field rules into the three request sections (`body`,
//! `query`, `params`) and validates all of them in one pass, collecting one
//! error per failing field. Undeclared fields are dropped, never rejected.

use serde_json::{Map, Value};

use super::validators::{ErrorKind, FieldRule, ValidationError};

/// Whole-object rule run after every field of its section passed
#[derive(Clone)]
pub struct Refinement {
    pub message: String,
    pub check: fn(&Map<String, Value>) -> bool,
}

impl std::fmt::Debug for Refinement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refinement")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Refinement {
    pub fn new(message: impl Into<String>, check: fn(&Map<String, Value>) -> bool) -> Self {
        Self {
            message: message.into(),
            check,
        }
    }
}

/// Field rules for one request section
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub fields: Vec<FieldRule>,
    pub refinements: Vec<Refinement>,
}

impl Section {
    pub fn new(fields: Vec<FieldRule>) -> Self {
        Self {
            fields,
            refinements: Vec::new(),
        }
    }

    pub fn with_refinement(mut self, refinement: Refinement) -> Self {
        self.refinements.push(refinement);
        self
    }

    /// Validate `input` as the section called `name`.
    ///
    /// An empty `name` leaves error paths unprefixed.
    pub fn validate(
        &self,
        name: &str,
        input: &Value,
    ) -> Result<Map<String, Value>, Vec<ValidationError>> {
        let Some(object) = input.as_object() else {
            let label = if name.is_empty() { "input" } else { name };
            return Err(vec![ValidationError::new(
                label,
                ErrorKind::TypeMismatch,
                format!("Expected object, received {}", json_type(input)),
            )]);
        };

        let mut output = Map::new();
        let mut errors = Vec::new();

        for rule in &self.fields {
            match rule.validate(object.get(rule.field)) {
                Ok(Some(value)) => {
                    output.insert(rule.field.to_string(), value);
                }
                Ok(None) => {}
                Err(error) => errors.push(error.within(name)),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        for refinement in &self.refinements {
            if !(refinement.check)(&output) {
                let field = if name.is_empty() { "input" } else { name };
                errors.push(ValidationError::new(
                    field,
                    ErrorKind::RefinementViolation,
                    refinement.message.clone(),
                ));
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors)
        }
    }
}

/// Raw request input, one JSON value per section
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParts {
    pub body: Value,
    pub query: Value,
    pub params: Value,
}

impl Default for RequestParts {
    fn default() -> Self {
        Self {
            body: Value::Object(Map::new()),
            query: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
        }
    }
}

/// Validated and normalized request input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedInput {
    pub body: Map<String, Value>,
    pub query: Map<String, Value>,
    pub params: Map<String, Value>,
}

/// Immutable per-route validation schema
#[derive(Debug, Clone)]
pub struct Schema {
    name: &'static str,
    body: Section,
    query: Section,
    params: Section,
}

impl Schema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            body: Section::default(),
            query: Section::default(),
            params: Section::default(),
        }
    }

    pub fn with_body(mut self, section: Section) -> Self {
        self.body = section;
        self
    }

    pub fn with_query(mut self, section: Section) -> Self {
        self.query = section;
        self
    }

    pub fn with_params(mut self, section: Section) -> Self {
        self.params = section;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Validate every section, reporting errors from all of them together
    pub fn validate(&self, input: &RequestParts) -> Result<NormalizedInput, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let body = collect(self.body.validate("body", &input.body), &mut errors);
        let query = collect(self.query.validate("query", &input.query), &mut errors);
        let params = collect(self.params.validate("params", &input.params), &mut errors);

        if errors.is_empty() {
            Ok(NormalizedInput {
                body,
                query,
                params,
            })
        } else {
            Err(errors)
        }
    }
}

fn collect(
    result: Result<Map<String, Value>, Vec<ValidationError>>,
    errors: &mut Vec<ValidationError>,
) -> Map<String, Value> {
    match result {
        Ok(map) => map,
        Err(mut section_errors) => {
            errors.append(&mut section_errors);
            Map::new()
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validators::{
        email_rule, name_rule, uuid_rule, Presence, RuleMessages,
    };
    use serde_json::json;

    fn schema() -> Schema {
        let messages = RuleMessages::default();
        Schema::new("test")
            .with_body(Section::new(vec![
                name_rule(Presence::Required, &messages),
                email_rule(Presence::Required, &messages),
            ]))
            .with_params(Section::new(vec![uuid_rule("id", "ID", &messages)]))
    }

    fn parts(body: Value, params: Value) -> RequestParts {
        RequestParts {
            body,
            params,
            ..RequestParts::default()
        }
    }

    #[test]
    fn test_success_drops_undeclared_fields() {
        let input = parts(
            json!({"name": "Jo", "email": "JO@X.IO", "extra": true}),
            json!({"id": "550e8400-e29b-41d4-a716-446655440000"}),
        );
        let out = schema().validate(&input).unwrap();
        assert_eq!(Value::Object(out.body), json!({"name": "Jo", "email": "jo@x.io"}));
        assert!(out.query.is_empty());
        assert_eq!(out.params["id"], "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_collects_one_error_per_field_across_sections() {
        let input = parts(json!({"name": "1", "email": "bad"}), json!({"id": "nope"}));
        let errors = schema().validate(&input).unwrap_err();
        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["body.name", "body.email", "params.id"]);
    }

    #[test]
    fn test_non_object_section() {
        let input = parts(json!([1, 2]), json!({"id": "550e8400-e29b-41d4-a716-446655440000"}));
        let errors = schema().validate(&input).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "body");
        assert_eq!(errors[0].kind, ErrorKind::TypeMismatch);
        assert!(errors[0].message.contains("array"));
    }

    #[test]
    fn test_refinement_runs_after_fields() {
        let section = Section::new(vec![name_rule(Presence::Optional, &RuleMessages::default())])
            .with_refinement(Refinement::new("need something", |data| !data.is_empty()));

        let errors = section.validate("body", &json!({})).unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::RefinementViolation);
        assert_eq!(errors[0].path, "body");

        // A field failure suppresses the refinement
        let errors = section.validate("body", &json!({"name": "9"})).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::CharsetViolation);
    }

    #[test]
    fn test_unprefixed_section() {
        let section = Section::new(vec![email_rule(Presence::Required, &RuleMessages::default())]);
        let errors = section.validate("", &json!({})).unwrap_err();
        assert_eq!(errors[0].path, "email");

        let errors = section.validate("", &Value::Null).unwrap_err();
        assert_eq!(errors[0].field, "input");
    }
}
