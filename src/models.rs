use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::navigation::Breadcrumb;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The identity record mirrored from the external authentication system (`users` table).
/// This service never writes it; it is only read to resolve the actor behind a request.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    // Elevated privilege: may create, edit and delete employees.
    pub is_staff: bool,
}

/// Department
///
/// A named organisational unit. Names are unique; listings are alphabetical.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

/// Employee
///
/// The primary record of the directory (`employees` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    #[ts(type = "string")]
    pub hire_date: NaiveDate,
    pub job_title: String,
    // Cleared (never left dangling) when the department is deleted.
    pub department_id: Option<i64>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// EmployeeInput
///
/// The cleaned, validated field set produced by `forms::validate_employee`.
/// It is the only shape the repository accepts for employee writes.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub hire_date: NaiveDate,
    pub job_title: String,
    pub department_id: Option<i64>,
}

impl EmployeeInput {
    pub fn into_employee(self, id: i64) -> Employee {
        Employee {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone_number: self.phone_number,
            hire_date: self.hire_date,
            job_title: self.job_title,
            department_id: self.department_id,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// CreateDepartmentRequest
///
/// Input payload for the department administration endpoint (POST /admin/departments).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateDepartmentRequest {
    #[serde(default)]
    pub name: String,
}

// --- Display Contexts (Output Schemas) ---

/// EmployeeRow
///
/// One entry of the employee listing: the record plus the values a list template displays.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct EmployeeRow {
    #[serde(flatten)]
    pub employee: Employee,
    pub full_name: String,
    pub department_name: Option<String>,
}

/// EmployeeDetail
///
/// Display context for a single employee (GET /employees/employee/{id}/).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeDetail {
    pub employee: Employee,
    pub full_name: String,
    pub department: Option<Department>,
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// DeleteConfirmation
///
/// First step of the two-step delete flow. Posting to `confirm_url` executes the delete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteConfirmation {
    pub employee: Employee,
    pub full_name: String,
    pub confirm_url: String,
    pub cancel_url: String,
    pub breadcrumbs: Vec<Breadcrumb>,
}
