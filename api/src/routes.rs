use axum::{
    extract::MatchedPath,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{
    handlers, metrics, metrics_handler,
    state::AppState,
    validation::{validate_request, UserSchemas},
};

pub fn observability_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler::metrics_endpoint))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health_check))
}

/// User routes, each gated by its own validation schema
pub fn user_routes(schemas: &UserSchemas) -> Router<AppState> {
    Router::new()
        .route(
            "/api/users",
            get(handlers::search_users)
                .route_layer(middleware::from_fn_with_state(schemas.search.clone(), validate_request))
                .merge(
                    post(handlers::create_user).route_layer(middleware::from_fn_with_state(
                        schemas.create.clone(),
                        validate_request,
                    )),
                ),
        )
        .route(
            "/api/users/:id",
            get(handlers::get_user)
                .route_layer(middleware::from_fn_with_state(schemas.get.clone(), validate_request))
                .merge(
                    put(handlers::update_user).route_layer(middleware::from_fn_with_state(
                        schemas.update.clone(),
                        validate_request,
                    )),
                ),
        )
}

/// Header set unless the handler already chose a value
fn default_header(name: &'static str, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        HeaderName::from_static(name),
        HeaderValue::from_static(value),
    )
}

/// The full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(user_routes(&state.schemas))
        .merge(health_routes())
        .merge(observability_routes())
        .fallback(handlers::route_not_found)
        .layer(middleware::from_fn(request_logger))
        .layer(
            ServiceBuilder::new()
                .layer(default_header(
                    "content-security-policy",
                    "default-src 'self'; frame-ancestors 'self'; object-src 'none'",
                ))
                .layer(default_header("cross-origin-opener-policy", "same-origin"))
                .layer(default_header("cross-origin-resource-policy", "same-origin"))
                .layer(default_header("origin-agent-cluster", "?1"))
                .layer(default_header("referrer-policy", "no-referrer"))
                .layer(default_header(
                    "strict-transport-security",
                    "max-age=31536000; includeSubDomains",
                ))
                .layer(default_header("x-content-type-options", "nosniff"))
                .layer(default_header("x-dns-prefetch-control", "off"))
                .layer(default_header("x-frame-options", "SAMEORIGIN"))
                .layer(default_header("x-permitted-cross-domain-policies", "none")),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn request_logger(req: axum::extract::Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let start = std::time::Instant::now();

    metrics::HTTP_IN_FLIGHT.inc();
    let response = next.run(req).await;
    metrics::HTTP_IN_FLIGHT.dec();

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    metrics::observe_http(method.as_str(), &path, status, elapsed.as_secs_f64());

    tracing::info!("{method} {uri} {status} {}ms", elapsed.as_millis());

    response
}
