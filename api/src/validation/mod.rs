//! Input Validation Module
//!
//! Schema-driven validation and normalization for the user API, plus a
//! standalone email/amount validator with friendly fix suggestions.
//!
//! # Overview
//!
//! 1. **Validators** - atomic field rules (`FieldRule`, `Check`, `Normalize`)
//! 2. **Schema** - per-section composition with whole-object refinements
//! 3. **Requests** - the user route schemas and their message configuration
//! 4. **Middleware / Extractors** - the route gate and the typed `Validated` view
//! 5. **Friendly / Input** - standalone `{email, amount}` validation and amount formatting
//!
//! # Usage
//!
//! ```ignore
//! let schemas = UserSchemas::new(&ValidationMessages::default());
//!
//! let route = post(create_user).route_layer(middleware::from_fn_with_state(
//!     schemas.create.clone(),
//!     validate_request,
//! ));
//!
//! pub async fn create_user(
//!     Validated { body, .. }: Validated<NewUser>,
//! ) -> impl IntoResponse {
//!     // body is validated and normalized
//! }
//! ```
//!
//! ## Validation Error Response
//!
//! ```json
//! {
//!   "status": 400,
//!   "errors": [
//!     {"path": "body.email", "message": "Invalid email format", "code": "invalid_format"},
//!     {"path": "params.id", "message": "Invalid user ID format", "code": "invalid_format"}
//!   ]
//! }
//! ```
//!
//! A body over `MAX_BODY_BYTES` gets the same shape with status 413 and the
//! `payload_too_large` code.

pub mod extractors;
pub mod friendly;
pub mod input;
pub mod middleware;
pub mod normalizers;
pub mod requests;
pub mod schema;
pub mod validators;

// Re-export commonly used items
pub use extractors::{
    IssueBody, NoFields, Validated, ValidatedRequest, ValidationRejection, ValidationRejectionBody,
};
pub use friendly::{fix_suggestion, FriendlyError};
pub use input::{validate_input, validate_input_with, InputValidation, ValidInput};
pub use middleware::validate_request;
pub use normalizers::format_amount;
pub use requests::{UserSchemas, ValidationMessages};
pub use schema::{NormalizedInput, Refinement, RequestParts, Schema, Section};
pub use validators::{Check, ErrorKind, FieldRule, Normalize, Presence, RuleMessages, ValidationError};
