//! Portal API
//!
//! REST service behind the client portal desktop app.
//!
//! ## REST Endpoints
//!
//! - `GET /api/user-type?email=` - Internal user for an email
//! - `POST /api/user-type` - Validate that an identity may use the portal
//! - `GET /api/company` - Caller's organization
//! - `GET /api/employees` - Agents placed with the caller's organization
//! - `GET /api/breaks` - Breaks running today
//! - `GET /api/attendance` - Attendance with statistics
//! - `POST /api/attendance` - Record attendance
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod state;

use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use crate::config::{Config, ConfigError};
pub use crate::error::{ApiError, ApiResult};
pub use crate::state::{AppState, Directory};

/// Build the HTTP router
pub fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout;

    let api = Router::new()
        .route(
            "/user-type",
            get(handlers::get_user_type).post(handlers::validate_access),
        )
        .route("/company", get(handlers::get_company))
        .route("/employees", get(handlers::list_employees))
        .route("/breaks", get(handlers::list_active_breaks))
        .route(
            "/attendance",
            get(handlers::list_attendance).post(handlers::record_attendance),
        );

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Outermost first
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api", api)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}
