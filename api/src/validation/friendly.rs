//! Friendly error mapping
//!
//! Turns a raw validation failure into a message plus an actionable fix.

use serde::{Deserialize, Serialize};

use super::validators::ValidationError;

/// A failure as shown to an end user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendlyError {
    pub field: String,
    pub message: String,
    pub fix: String,
}

impl From<&ValidationError> for FriendlyError {
    fn from(error: &ValidationError) -> Self {
        Self {
            field: error.field.clone(),
            message: error.message.clone(),
            fix: fix_suggestion(&error.field, &error.message).to_string(),
        }
    }
}

/// Look up the fix suggestion for a field and failure message
pub fn fix_suggestion(field: &str, message: &str) -> &'static str {
    match field {
        "email" => {
            if message.contains("required") {
                "Please provide an email address"
            } else {
                "Enter a valid email address in the format user@domain.com"
            }
        }
        "amount" => {
            if message.contains("required") {
                "Please provide an amount"
            } else if message.contains("positive") {
                "Enter an amount greater than 0"
            } else if message.contains("decimal places") {
                "Enter an amount with maximum 2 decimal places (e.g., 123.45)"
            } else if message.contains("exceed") {
                "Enter an amount less than or equal to 999,999,999.99"
            } else {
                "Enter a valid numeric amount (e.g., 1234.56)"
            }
        }
        _ => "Please check the input requirements and try again",
    }
}
