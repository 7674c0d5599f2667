use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Staff Router Module
///
/// Create, edit and delete for employees. Each path serves the form (or confirmation)
/// on GET and performs the action on POST. Anonymous actors are redirected to log in;
/// authenticated non-staff actors are redirected to the listing.
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /employees/employee/add/
        // The static `add` segment takes priority over the `{id}` routes below.
        .route(
            "/employees/employee/add/",
            get(handlers::new_employee_form).post(handlers::create_employee),
        )
        // GET/POST /employees/employee/{id}/edit/
        .route(
            "/employees/employee/{id}/edit/",
            get(handlers::edit_employee_form).post(handlers::update_employee),
        )
        // GET/POST /employees/employee/{id}/delete/
        // Two-step delete: GET shows the confirmation, POST executes it.
        .route(
            "/employees/employee/{id}/delete/",
            get(handlers::confirm_delete_employee).post(handlers::delete_employee),
        )
}
