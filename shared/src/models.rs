use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════════════
// USER RECORDS
// ═══════════════════════════════════════════════════════════════════════════

/// A stored user record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Access level of a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub const ALL: [&'static str; 2] = ["user", "admin"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Payload for inserting a user, already validated and normalized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// Partial update of a user; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Column a user listing can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "email")]
    Email,
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl SortField {
    pub const ALL: [&'static str; 3] = ["name", "email", "createdAt"];

    /// Database column backing this sort key
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Email => "email",
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const ALL: [&'static str; 2] = ["asc", "desc"];

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filters, ordering and pagination for listing users
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub page: i64,
    pub limit: i64,
    pub sort_by: Option<SortField>,
    pub order: Option<SortOrder>,
}

impl UserSearch {
    /// Rows to skip; saturates instead of overflowing on absurd pages
    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0).saturating_mul(self.limit.max(0))
    }
}

impl Default for UserSearch {
    fn default() -> Self {
        Self {
            name: None,
            email: None,
            role: None,
            page: 1,
            limit: 10,
            sort_by: None,
            order: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RESPONSE ENVELOPES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub status: u16,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(status: u16, data: T) -> Self {
        Self { status, data }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub status: u16,
    pub data: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        Self {
            status: 200,
            data,
            page,
            limit,
            total,
        }
    }
}
