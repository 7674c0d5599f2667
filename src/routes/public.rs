use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only endpoints reachable without logging in.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers and monitoring.
        .route("/health", get(|| async { "ok" }))
        // GET /?department=...&q=...&page=...
        // The home page is the employee listing.
        .route("/", get(handlers::list_employees))
        // GET /employees/?department=...&q=...&page=...
        .route("/employees/", get(handlers::list_employees))
        // GET /employees/employee/{id}/
        .route("/employees/employee/{id}/", get(handlers::get_employee))
}
