use crate::{
    AppState,
    auth::StaffUser,
    error::{AppError, ErrorBody, FieldErrors},
    forms::{self, EmployeeForm, EmployeeFormPage},
    listing::{self, EmployeeListing, ListQuery},
    models::{
        CreateDepartmentRequest, DeleteConfirmation, Department, Employee, EmployeeDetail,
    },
    navigation,
};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

// --- Helpers ---

async fn find_employee(state: &AppState, id: i64) -> Result<Employee, AppError> {
    state
        .repo
        .get_employee(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No employee found with id {}", id)))
}

/// Re-displays a rejected form with its errors (422), or passes any other failure through.
async fn form_response(
    state: &AppState,
    form: EmployeeForm,
    error: AppError,
    action: String,
    breadcrumbs: Vec<navigation::Breadcrumb>,
) -> Result<Response, AppError> {
    let errors = match error {
        AppError::Validation(errors) => errors,
        other => return Err(other),
    };
    let page = EmployeeFormPage {
        form,
        errors,
        departments: state.repo.list_departments().await?,
        action,
        breadcrumbs,
    };
    Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response())
}

// --- Public Handlers ---

/// list_employees
///
/// [Public Route] The filtered, paginated employee listing. Also served at `/`.
///
/// The store hands over its current contents and `listing::build_listing` does the
/// filtering, ordering and pagination.
#[utoipa::path(
    get,
    path = "/employees/",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of the listing", body = EmployeeListing),
        (status = 404, description = "Page out of range", body = ErrorBody)
    )
)]
pub async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<EmployeeListing>, AppError> {
    let employees = state.repo.list_employees().await?;
    let departments = state.repo.list_departments().await?;
    Ok(Json(listing::build_listing(&query, employees, departments)?))
}

/// get_employee
///
/// [Public Route] A single employee with their department and breadcrumb trail.
#[utoipa::path(
    get,
    path = "/employees/employee/{id}/",
    params(("id" = i64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Found", body = EmployeeDetail),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EmployeeDetail>, AppError> {
    let employee = find_employee(&state, id).await?;
    let department = match employee.department_id {
        Some(department_id) => state.repo.get_department(department_id).await?,
        None => None,
    };
    Ok(Json(EmployeeDetail {
        full_name: employee.full_name(),
        breadcrumbs: navigation::detail_trail(&employee),
        department,
        employee,
    }))
}

// --- Staff Handlers ---
// Every handler below takes `StaffUser`, so the staff gate has already run.

/// new_employee_form
///
/// [Staff Route] The empty add-employee form.
#[utoipa::path(
    get,
    path = "/employees/employee/add/",
    responses(
        (status = 200, description = "Form context", body = EmployeeFormPage),
        (status = 303, description = "Not logged in or not staff")
    )
)]
pub async fn new_employee_form(
    _staff: StaffUser,
    State(state): State<AppState>,
) -> Result<Json<EmployeeFormPage>, AppError> {
    Ok(Json(EmployeeFormPage {
        form: EmployeeForm::default(),
        errors: FieldErrors::new(),
        departments: state.repo.list_departments().await?,
        action: navigation::EMPLOYEE_ADD.to_string(),
        breadcrumbs: navigation::add_trail(),
    }))
}

/// create_employee
///
/// [Staff Route] Validates and persists a new employee, then redirects to the listing.
/// Invalid submissions come back as the form with field errors (422).
#[utoipa::path(
    post,
    path = "/employees/employee/add/",
    request_body(content = EmployeeForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created, or not logged in / not staff"),
        (status = 422, description = "Validation failed", body = EmployeeFormPage)
    )
)]
pub async fn create_employee(
    StaffUser(user): StaffUser,
    State(state): State<AppState>,
    Form(form): Form<EmployeeForm>,
) -> Result<Response, AppError> {
    let result = match forms::validate_employee(state.repo.as_ref(), &form, None).await {
        Ok(input) => state.repo.create_employee(input).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(employee) => {
            tracing::info!(employee_id = employee.id, by = %user.username, "employee created");
            Ok(Redirect::to(navigation::EMPLOYEE_LIST).into_response())
        }
        Err(e) => {
            form_response(
                &state,
                form,
                e,
                navigation::EMPLOYEE_ADD.to_string(),
                navigation::add_trail(),
            )
            .await
        }
    }
}

/// edit_employee_form
///
/// [Staff Route] The edit form, pre-filled from the stored record.
#[utoipa::path(
    get,
    path = "/employees/employee/{id}/edit/",
    params(("id" = i64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Form context", body = EmployeeFormPage),
        (status = 303, description = "Not logged in or not staff"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn edit_employee_form(
    _staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EmployeeFormPage>, AppError> {
    let employee = find_employee(&state, id).await?;
    Ok(Json(EmployeeFormPage {
        form: EmployeeForm::from(&employee),
        errors: FieldErrors::new(),
        departments: state.repo.list_departments().await?,
        action: navigation::employee_edit(id),
        breadcrumbs: navigation::edit_trail(&employee),
    }))
}

/// update_employee
///
/// [Staff Route] Applies the submitted field set to an existing employee.
/// The email uniqueness check excludes the record being edited.
#[utoipa::path(
    post,
    path = "/employees/employee/{id}/edit/",
    params(("id" = i64, Path, description = "Employee ID")),
    request_body(content = EmployeeForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated, or not logged in / not staff"),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 422, description = "Validation failed", body = EmployeeFormPage)
    )
)]
pub async fn update_employee(
    StaffUser(user): StaffUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<EmployeeForm>,
) -> Result<Response, AppError> {
    // The breadcrumb trail names the stored record, not the submitted values.
    let existing = find_employee(&state, id).await?;

    let result = match forms::validate_employee(state.repo.as_ref(), &form, Some(id)).await {
        Ok(input) => state.repo.update_employee(id, input).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(Some(_)) => {
            tracing::info!(employee_id = id, by = %user.username, "employee updated");
            Ok(Redirect::to(navigation::EMPLOYEE_LIST).into_response())
        }
        // Deleted between the lookup and the write.
        Ok(None) => Err(AppError::not_found(format!("No employee found with id {}", id))),
        Err(e) => {
            form_response(
                &state,
                form,
                e,
                navigation::employee_edit(id),
                navigation::edit_trail(&existing),
            )
            .await
        }
    }
}

/// confirm_delete_employee
///
/// [Staff Route] First step of the delete flow: what would be deleted, and where to
/// post to confirm.
#[utoipa::path(
    get,
    path = "/employees/employee/{id}/delete/",
    params(("id" = i64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Confirmation context", body = DeleteConfirmation),
        (status = 303, description = "Not logged in or not staff"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn confirm_delete_employee(
    _staff: StaffUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteConfirmation>, AppError> {
    let employee = find_employee(&state, id).await?;
    Ok(Json(DeleteConfirmation {
        full_name: employee.full_name(),
        confirm_url: navigation::employee_delete(id),
        cancel_url: navigation::employee_detail(id),
        breadcrumbs: navigation::delete_trail(&employee),
        employee,
    }))
}

/// delete_employee
///
/// [Staff Route] Second step of the delete flow: removes the employee and redirects
/// to the listing.
#[utoipa::path(
    post,
    path = "/employees/employee/{id}/delete/",
    params(("id" = i64, Path, description = "Employee ID")),
    responses(
        (status = 303, description = "Deleted, or not logged in / not staff"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_employee(
    StaffUser(user): StaffUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    if !state.repo.delete_employee(id).await? {
        return Err(AppError::not_found(format!("No employee found with id {}", id)));
    }
    tracing::info!(employee_id = id, by = %user.username, "employee deleted");
    Ok(Redirect::to(navigation::EMPLOYEE_LIST))
}

// --- Department Administration ---

/// list_departments
///
/// [Staff Route] All departments, alphabetically.
#[utoipa::path(
    get,
    path = "/admin/departments",
    responses(
        (status = 200, description = "Departments", body = [Department]),
        (status = 303, description = "Not logged in or not staff")
    )
)]
pub async fn list_departments(
    _staff: StaffUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Department>>, AppError> {
    Ok(Json(state.repo.list_departments().await?))
}

/// create_department
///
/// [Staff Route] Creates a department. Names are trimmed and must be unique.
#[utoipa::path(
    post,
    path = "/admin/departments",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Created", body = Department),
        (status = 303, description = "Not logged in or not staff"),
        (status = 422, description = "Validation failed", body = FieldErrors)
    )
)]
pub async fn create_department(
    StaffUser(user): StaffUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    let name = forms::validate_department_name(&payload.name).map_err(AppError::Validation)?;
    let department = state.repo.create_department(&name).await?;
    tracing::info!(department_id = department.id, by = %user.username, "department created");
    Ok((StatusCode::CREATED, Json(department)))
}

/// delete_department
///
/// [Staff Route] Deletes a department. Its employees stay, with no department.
#[utoipa::path(
    delete,
    path = "/admin/departments/{id}",
    params(("id" = i64, Path, description = "Department ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 303, description = "Not logged in or not staff"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_department(
    StaffUser(user): StaffUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !state.repo.delete_department(id).await? {
        return Err(AppError::not_found(format!("No department found with id {}", id)));
    }
    tracing::info!(department_id = id, by = %user.username, "department deleted");
    Ok(StatusCode::NO_CONTENT)
}
