//! User record storage
//!
//! Plain functions over an explicit `PgPool`. Inputs are expected to be
//! validated and normalized already.

use std::time::Instant;

use shared::{NewUser, User, UserChanges, UserSearch};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::metrics;

const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at";

pub async fn create_user(pool: &PgPool, new_user: &NewUser) -> Result<User, sqlx::Error> {
    timed(
        "insert_user",
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, role) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(new_user.role)
        .fetch_one(pool),
    )
    .await
}

pub async fn find_user(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    timed(
        "select_user",
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(pool),
    )
    .await
}

/// Page of users matching the search, plus the total match count
pub async fn search_users(
    pool: &PgPool,
    search: &UserSearch,
) -> Result<(Vec<User>, i64), sqlx::Error> {
    let mut count = count_query(search);
    let total: i64 = timed("count_users", count.build_query_scalar().fetch_one(pool)).await?;

    let mut select = select_query(search);
    let users = timed("select_users", select.build_query_as::<User>().fetch_all(pool)).await?;

    Ok((users, total))
}

/// Apply `changes` to a user; `None` when no such user exists
pub async fn update_user(
    pool: &PgPool,
    id: Uuid,
    changes: &UserChanges,
) -> Result<Option<User>, sqlx::Error> {
    let mut query = update_query(id, changes);
    timed("update_user", query.build_query_as::<User>().fetch_optional(pool)).await
}

fn push_filters(builder: &mut QueryBuilder<'static, Postgres>, search: &UserSearch) {
    if let Some(name) = &search.name {
        builder.push(" AND name ILIKE ").push_bind(contains_pattern(name));
    }
    if let Some(email) = &search.email {
        builder.push(" AND email ILIKE ").push_bind(contains_pattern(email));
    }
    if let Some(role) = search.role {
        builder.push(" AND role = ").push_bind(role);
    }
}

fn count_query(search: &UserSearch) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
    push_filters(&mut builder, search);
    builder
}

fn select_query(search: &UserSearch) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM users WHERE 1=1", USER_COLUMNS));
    push_filters(&mut builder, search);

    let sort_by = search.sort_by.unwrap_or_default();
    let order = search.order.unwrap_or_default();
    // Column names come from a closed enum, never from the request
    builder
        .push(" ORDER BY ")
        .push(sort_by.column())
        .push(" ")
        .push(order.as_sql())
        .push(", id ASC");

    builder
        .push(" LIMIT ")
        .push_bind(search.limit)
        .push(" OFFSET ")
        .push_bind(search.offset());
    builder
}

fn update_query(id: Uuid, changes: &UserChanges) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("UPDATE users SET ");
    let mut assignments = builder.separated(", ");
    if let Some(name) = &changes.name {
        assignments.push("name = ").push_bind_unseparated(name.clone());
    }
    if let Some(email) = &changes.email {
        assignments.push("email = ").push_bind_unseparated(email.clone());
    }
    if let Some(role) = changes.role {
        assignments.push("role = ").push_bind_unseparated(role);
    }
    assignments.push("updated_at = NOW()");

    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(USER_COLUMNS);
    builder
}

/// ILIKE pattern matching `needle` anywhere, with wildcards escaped
fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

async fn timed<T, F>(query: &str, future: F) -> Result<T, sqlx::Error>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    let start = Instant::now();
    let result = future.await;
    metrics::observe_db_query(query, start.elapsed().as_secs_f64());
    if result.is_err() {
        metrics::observe_db_error(query);
    }
    result
}
