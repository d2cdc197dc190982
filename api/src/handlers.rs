use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{NewUser, PaginatedResponse, SuccessResponse, User, UserChanges, UserSearch};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    metrics,
    state::AppState,
    users,
    validation::{NoFields, Validated},
};

/// Path parameters of `/api/users/:id`
#[derive(Debug, Deserialize)]
pub struct UserPath {
    pub id: Uuid,
}

fn db_error(operation: &str, err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            tracing::info!(operation = operation, "unique constraint rejected write");
            return ApiError::conflict("EmailTaken", "A user with this email already exists");
        }
    }
    tracing::error!(operation = operation, error = ?err, "database operation failed");
    ApiError::internal("An unexpected database error occurred")
}

fn user_not_found() -> ApiError {
    ApiError::not_found("UserNotFound", "User not found")
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let uptime = state.started_at.elapsed().as_secs();
    let now = chrono::Utc::now().to_rfc3339();

    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    if db_ok {
        tracing::debug!(uptime_secs = uptime, "health check passed");
        (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": now,
                "uptime_secs": uptime
            })),
        )
    } else {
        tracing::warn!(uptime_secs = uptime, "health check degraded, db unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": now,
                "uptime_secs": uptime
            })),
        )
    }
}

/// Create a user from a validated body
pub async fn create_user(
    State(state): State<AppState>,
    Validated { body, .. }: Validated<NewUser>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<User>>)> {
    let user = users::create_user(&state.db, &body)
        .await
        .map_err(|err| db_error("create user", err))?;

    metrics::USERS_CREATED.inc();
    tracing::info!(user_id = %user.id, "User created successfully");

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(StatusCode::CREATED.as_u16(), user)),
    ))
}

/// List users with filters, sorting and pagination
pub async fn search_users(
    State(state): State<AppState>,
    Validated { query, .. }: Validated<NoFields, UserSearch>,
) -> ApiResult<Json<PaginatedResponse<User>>> {
    let (users, total) = users::search_users(&state.db, &query)
        .await
        .map_err(|err| db_error("search users", err))?;

    Ok(Json(PaginatedResponse::new(users, total, query.page, query.limit)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Validated { params, .. }: Validated<NoFields, NoFields, UserPath>,
) -> ApiResult<Json<SuccessResponse<User>>> {
    let user = users::find_user(&state.db, params.id)
        .await
        .map_err(|err| db_error("get user", err))?
        .ok_or_else(user_not_found)?;

    Ok(Json(SuccessResponse::new(StatusCode::OK.as_u16(), user)))
}

/// Apply a partial update; the body is guaranteed non-empty
pub async fn update_user(
    State(state): State<AppState>,
    Validated { body, params, .. }: Validated<UserChanges, NoFields, UserPath>,
) -> ApiResult<Json<SuccessResponse<User>>> {
    let user = users::update_user(&state.db, params.id, &body)
        .await
        .map_err(|err| db_error("update user", err))?
        .ok_or_else(user_not_found)?;

    metrics::USERS_UPDATED.inc();
    tracing::info!(user_id = %params.id, "User updated successfully");

    Ok(Json(SuccessResponse::new(StatusCode::OK.as_u16(), user)))
}

pub async fn route_not_found() -> impl IntoResponse {
    ApiError::not_found("RouteNotFound", "Route not found")
}
