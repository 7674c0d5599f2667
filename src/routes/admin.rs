use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get},
};

/// Admin Router Module
///
/// Department management. Departments are otherwise read-only in this service, so this
/// is the only way they are created or removed.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /admin/departments
        .route(
            "/departments",
            get(handlers::list_departments).post(handlers::create_department),
        )
        // DELETE /admin/departments/{id}
        // Employees of the department are kept with their department cleared.
        .route("/departments/{id}", delete(handlers::delete_department))
}
