use once_cell::sync::Lazy;
use prometheus::{
    opts, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Registry,
    TextEncoder,
};

macro_rules! counter_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| IntCounterVec::new(opts!($name, $help), $labels).unwrap())
    };
}
macro_rules! histogram_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| {
            HistogramVec::new(HistogramOpts::new($name, $help).buckets(LATENCY_BUCKETS.to_vec()), $labels)
                .unwrap()
        })
    };
}
macro_rules! counter {
    ($name:expr, $help:expr) => {
        Lazy::new(|| IntCounter::new($name, $help).unwrap())
    };
}
macro_rules! gauge {
    ($name:expr, $help:expr) => {
        Lazy::new(|| IntGauge::new($name, $help).unwrap())
    };
}

const LATENCY_BUCKETS: [f64; 12] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

// ── HTTP ────────────────────────────────────────────────────────────────────
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> =
    counter_vec!("http_requests_total", "Total HTTP requests", &["method", "path", "status"]);
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> =
    histogram_vec!("http_request_duration_seconds", "HTTP request latency", &["method", "path"]);
pub static HTTP_IN_FLIGHT: Lazy<IntGauge> = gauge!("http_requests_in_flight", "In-flight HTTP requests");

// ── Validation ──────────────────────────────────────────────────────────────
pub static VALIDATION_REJECTIONS: Lazy<IntCounterVec> = counter_vec!(
    "validation_rejections_total",
    "Requests rejected by schema validation",
    &["schema"]
);
pub static VALIDATION_FIELD_ERRORS: Lazy<IntCounterVec> = counter_vec!(
    "validation_field_errors_total",
    "Field-level validation errors by code",
    &["schema", "code"]
);

// ── Users ───────────────────────────────────────────────────────────────────
pub static USERS_CREATED: Lazy<IntCounter> = counter!("users_created_total", "Users created");
pub static USERS_UPDATED: Lazy<IntCounter> = counter!("users_updated_total", "Users updated");

// ── Database ────────────────────────────────────────────────────────────────
pub static DB_QUERY_DURATION: Lazy<HistogramVec> =
    histogram_vec!("db_query_duration_seconds", "Database query latency", &["query"]);
pub static DB_ERRORS_TOTAL: Lazy<IntCounterVec> =
    counter_vec!("db_errors_total", "Failed database operations", &["query"]);

pub fn register_all(r: &Registry) -> prometheus::Result<()> {
    r.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    r.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    r.register(Box::new(HTTP_IN_FLIGHT.clone()))?;
    r.register(Box::new(VALIDATION_REJECTIONS.clone()))?;
    r.register(Box::new(VALIDATION_FIELD_ERRORS.clone()))?;
    r.register(Box::new(USERS_CREATED.clone()))?;
    r.register(Box::new(USERS_UPDATED.clone()))?;
    r.register(Box::new(DB_QUERY_DURATION.clone()))?;
    r.register(Box::new(DB_ERRORS_TOTAL.clone()))?;
    Ok(())
}

pub fn gather_metrics(r: &Registry) -> String {
    let encoder = TextEncoder::new();
    let families = r.gather();
    let mut buf = Vec::new();
    encoder.encode(&families, &mut buf).unwrap_or_default();
    String::from_utf8(buf).unwrap_or_default()
}

pub fn observe_http(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

pub fn observe_validation_rejection<'a>(schema: &str, codes: impl IntoIterator<Item = &'a str>) {
    VALIDATION_REJECTIONS.with_label_values(&[schema]).inc();
    for code in codes {
        VALIDATION_FIELD_ERRORS
            .with_label_values(&[schema, code])
            .inc();
    }
}

pub fn observe_db_query(query: &str, duration_secs: f64) {
    DB_QUERY_DURATION
        .with_label_values(&[query])
        .observe(duration_secs);
}

pub fn observe_db_error(query: &str) {
    DB_ERRORS_TOTAL.with_label_values(&[query]).inc();
}
