//! Named routes and the breadcrumb trails attached to every display context.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::Employee;

pub const HOME: &str = "/";
pub const EMPLOYEE_LIST: &str = "/employees/";
pub const EMPLOYEE_ADD: &str = "/employees/employee/add/";

pub fn employee_detail(id: i64) -> String {
    format!("/employees/employee/{}/", id)
}

pub fn employee_edit(id: i64) -> String {
    format!("/employees/employee/{}/edit/", id)
}

pub fn employee_delete(id: i64) -> String {
    format!("/employees/employee/{}/delete/", id)
}

/// Breadcrumb
///
/// One (label, link) step of the navigation trail.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct Breadcrumb {
    pub name: String,
    pub url: String,
}

impl Breadcrumb {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Home → Employees
pub fn list_trail() -> Vec<Breadcrumb> {
    vec![
        Breadcrumb::new("Home", HOME),
        Breadcrumb::new("Employees", EMPLOYEE_LIST),
    ]
}

/// Home → Employees → [full name]
pub fn detail_trail(employee: &Employee) -> Vec<Breadcrumb> {
    let mut trail = list_trail();
    trail.push(Breadcrumb::new(
        employee.full_name(),
        employee_detail(employee.id),
    ));
    trail
}

pub fn add_trail() -> Vec<Breadcrumb> {
    let mut trail = list_trail();
    trail.push(Breadcrumb::new("Add Employee", EMPLOYEE_ADD));
    trail
}

pub fn edit_trail(employee: &Employee) -> Vec<Breadcrumb> {
    let mut trail = detail_trail(employee);
    trail.push(Breadcrumb::new("Edit", employee_edit(employee.id)));
    trail
}

pub fn delete_trail(employee: &Employee) -> Vec<Breadcrumb> {
    let mut trail = detail_trail(employee);
    trail.push(Breadcrumb::new("Delete", employee_delete(employee.id)));
    trail
}
