//! Validation schemas for the user endpoints
//!
//! Schemas are built once at startup from a [`ValidationMessages`] value and
//! shared read-only by every request.

use std::sync::Arc;

use serde_json::Value;
use shared::{Role, SortField, SortOrder};

use super::schema::{Refinement, Schema, Section};
use super::validators::{
    enum_rule, limit_rule, name_rule, page_rule, text_rule, user_email_rule, uuid_rule, Presence,
    RuleMessages,
};

/// Message overrides for every rule kind the user schemas use
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationMessages {
    pub email: RuleMessages,
    pub amount: RuleMessages,
    pub name: RuleMessages,
    pub role: RuleMessages,
    pub id: RuleMessages,
    pub page: RuleMessages,
    pub limit: RuleMessages,
    pub sort: RuleMessages,
}

impl Default for ValidationMessages {
    fn default() -> Self {
        Self {
            email: RuleMessages::default(),
            amount: RuleMessages::default(),
            name: RuleMessages::default(),
            role: RuleMessages::format("Role must be either \"user\" or \"admin\""),
            id: RuleMessages::format("Invalid user ID format"),
            page: RuleMessages::default(),
            limit: RuleMessages::default(),
            sort: RuleMessages::default(),
        }
    }
}

pub const UPDATE_REQUIRES_FIELD: &str = "At least one field must be provided for update";

/// The four route schemas of the user API
#[derive(Debug, Clone)]
pub struct UserSchemas {
    pub create: Arc<Schema>,
    pub update: Arc<Schema>,
    pub search: Arc<Schema>,
    pub get: Arc<Schema>,
}

impl UserSchemas {
    pub fn new(messages: &ValidationMessages) -> Self {
        Self {
            create: Arc::new(create_user_schema(messages)),
            update: Arc::new(update_user_schema(messages)),
            search: Arc::new(search_users_schema(messages)),
            get: Arc::new(get_user_schema(messages)),
        }
    }
}

impl Default for UserSchemas {
    fn default() -> Self {
        Self::new(&ValidationMessages::default())
    }
}

fn user_id_params(messages: &ValidationMessages) -> Section {
    Section::new(vec![uuid_rule("id", "User ID", &messages.id)])
}

pub fn create_user_schema(messages: &ValidationMessages) -> Schema {
    Schema::new("create_user").with_body(Section::new(vec![
        name_rule(Presence::Required, &messages.name),
        user_email_rule(Presence::Required, &messages.email),
        enum_rule(
            "role",
            "Role",
            Presence::Default(Value::from(Role::User.as_str())),
            &Role::ALL,
            &messages.role,
        ),
    ]))
}

pub fn update_user_schema(messages: &ValidationMessages) -> Schema {
    Schema::new("update_user")
        .with_body(
            Section::new(vec![
                name_rule(Presence::Optional, &messages.name),
                user_email_rule(Presence::Optional, &messages.email),
                enum_rule("role", "Role", Presence::Optional, &Role::ALL, &messages.role),
            ])
            .with_refinement(Refinement::new(UPDATE_REQUIRES_FIELD, |data| !data.is_empty())),
        )
        .with_params(user_id_params(messages))
}

pub fn search_users_schema(messages: &ValidationMessages) -> Schema {
    Schema::new("search_users").with_query(Section::new(vec![
        text_rule("name", "Name"),
        text_rule("email", "Email"),
        enum_rule("role", "Role", Presence::Optional, &Role::ALL, &messages.role),
        page_rule(&messages.page),
        limit_rule(&messages.limit),
        enum_rule(
            "sortBy",
            "Sort field",
            Presence::Optional,
            &SortField::ALL,
            &messages.sort,
        ),
        enum_rule(
            "order",
            "Order",
            Presence::Optional,
            &SortOrder::ALL,
            &messages.sort,
        ),
    ]))
}

pub fn get_user_schema(messages: &ValidationMessages) -> Schema {
    Schema::new("get_user").with_params(user_id_params(messages))
}
