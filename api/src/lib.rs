pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod metrics_handler;
pub mod observability;
pub mod routes;
pub mod state;
pub mod users;
pub mod validation;
