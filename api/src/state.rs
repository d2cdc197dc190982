use prometheus::Registry;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;

use crate::validation::{UserSchemas, ValidationMessages};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub started_at: Instant,
    pub registry: Registry,
    pub schemas: Arc<UserSchemas>,
}

impl AppState {
    pub fn new(db: PgPool, registry: Registry, messages: &ValidationMessages) -> Self {
        Self {
            db,
            started_at: Instant::now(),
            registry,
            schemas: Arc::new(UserSchemas::new(messages)),
        }
    }
}
