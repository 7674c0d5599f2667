use axum::{
    Json, Router,
    extract::FromRef,
    http::HeaderName,
    routing::get,
};
use utoipa::OpenApi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod listing;
pub mod models;
pub mod navigation;
pub mod repository;

// Routing segregated by audience (Public, Staff, Admin).
pub mod routes;
use routes::{admin, public, staff};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// The OpenAPI document for every route, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_employees, handlers::get_employee, handlers::new_employee_form,
        handlers::create_employee, handlers::edit_employee_form, handlers::update_employee,
        handlers::confirm_delete_employee, handlers::delete_employee,
        handlers::list_departments, handlers::create_department, handlers::delete_department
    ),
    components(
        schemas(
            models::Department, models::Employee, models::EmployeeRow, models::EmployeeDetail,
            models::DeleteConfirmation, models::CreateDepartmentRequest,
            listing::EmployeeListing, listing::PageInfo,
            forms::EmployeeForm, forms::EmployeeFormPage,
            navigation::Breadcrumb, error::FieldErrors, error::ErrorBody,
        )
    ),
    tags(
        (name = "employee-directory", description = "Employee Directory API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single, cloneable container of everything a request needs: the store and the
/// immutable configuration.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Postgres in deployments, in-memory for local runs and tests.
    pub repo: RepositoryState,
    /// Configuration: loaded once at startup.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors (Actor, StaffUser) pull only the components they need.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies the observability layers and registers
/// the application state.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(public::public_routes())
        // Staff-only routes: gated per handler by the `StaffUser` extractor.
        .merge(staff::staff_routes())
        .nest("/admin", admin::admin_routes())
        .with_state(state);

    // Observability and correlation layers, applied outermost.
    base_router.layer(
        ServiceBuilder::new()
            // Request ID Generation: a UUID for every incoming request.
            .layer(SetRequestIdLayer::new(
                x_request_id.clone(),
                MakeRequestUuid,
            ))
            // Request Tracing: one span per request carrying the request ID.
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            // Request ID Propagation: echo x-request-id back to the client.
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Builds the `TraceLayer` span so every log line of a request is correlated by its
/// `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
