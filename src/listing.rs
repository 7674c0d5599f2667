//! Employee listing: filtering, ordering and pagination.
//!
//! Everything here is pure. `build_listing` maps the request's query parameters and the
//! current contents of the store to the display context of one listing page, so the
//! whole listing behaviour can be exercised without a server or a database.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppError,
    models::{Department, Employee, EmployeeRow},
    navigation::{self, Breadcrumb},
};

/// Fixed number of employees per listing page.
pub const PAGE_SIZE: usize = 10;

/// ListQuery
///
/// Query parameters accepted by the listing endpoints (GET / and GET /employees/).
/// Values are kept as raw strings so they can be echoed back exactly as submitted.
#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Department id to restrict the listing to.
    pub department: Option<String>,
    /// Case-insensitive text matched against first name, last name and job title.
    pub q: Option<String>,
    /// 1-based page number, or `last`.
    pub page: Option<String>,
}

/// How the `department` parameter restricts the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentFilter {
    Any,
    Id(i64),
    /// A value that cannot name any department; nothing matches.
    Unmatchable,
}

/// EmployeeFilter
///
/// The parsed form of the listing's `department` and `q` parameters. The two
/// restrictions compose with AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeFilter {
    pub department: DepartmentFilter,
    /// Lower-cased search text; `None` when absent or empty.
    pub query: Option<String>,
}

impl EmployeeFilter {
    pub fn from_query(params: &ListQuery) -> Self {
        let department = match params.department.as_deref().map(str::trim) {
            None | Some("") => DepartmentFilter::Any,
            Some(raw) => raw
                .parse::<i64>()
                .map(DepartmentFilter::Id)
                .unwrap_or(DepartmentFilter::Unmatchable),
        };

        let query = params
            .q
            .as_deref()
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        Self { department, query }
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        let in_department = match self.department {
            DepartmentFilter::Any => true,
            DepartmentFilter::Id(id) => employee.department_id == Some(id),
            DepartmentFilter::Unmatchable => false,
        };
        if !in_department {
            return false;
        }

        match &self.query {
            None => true,
            Some(needle) => [
                &employee.first_name,
                &employee.last_name,
                &employee.job_title,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(needle.as_str())),
        }
    }

    /// Filters, then sorts by last name, first name (id breaks exact ties).
    pub fn apply(&self, employees: Vec<Employee>) -> Vec<Employee> {
        let mut matched: Vec<Employee> = employees
            .into_iter()
            .filter(|employee| self.matches(employee))
            .collect();
        sort_employees(&mut matched);
        matched
    }
}

/// Case-insensitive by last name, then first name. The raw names and then the id
/// break ties, so the order is total.
pub fn sort_employees(employees: &mut [Employee]) {
    employees.sort_by_cached_key(|e| {
        (
            e.last_name.to_lowercase(),
            e.first_name.to_lowercase(),
            e.last_name.clone(),
            e.first_name.clone(),
            e.id,
        )
    });
}

/// PageInfo
///
/// Pagination metadata for one listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageInfo {
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    /// Total number of matching records across all pages.
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

/// paginate
///
/// Selects one page of `items`. A missing or empty `page` is page 1 and `last` is the
/// final page. Non-integers, numbers below 1 and numbers past the last page are
/// `NotFound`. An empty collection still has an (empty) first page.
pub fn paginate<T>(items: Vec<T>, page: Option<&str>, per_page: usize) -> Result<Page<T>, AppError> {
    let per_page = per_page.max(1);
    let count = items.len();
    let num_pages = count.div_ceil(per_page).max(1);

    let number = match page.map(str::trim) {
        None | Some("") => 1,
        Some("last") => num_pages,
        Some(raw) => {
            let requested = raw
                .parse::<i64>()
                .map_err(|_| AppError::not_found("That page number is not an integer"))?;
            if requested < 1 {
                return Err(AppError::not_found("That page number is less than 1"));
            }
            usize::try_from(requested)
                .ok()
                .filter(|n| *n <= num_pages)
                .ok_or_else(|| AppError::not_found("That page contains no results"))?
        }
    };

    let items = items
        .into_iter()
        .skip((number - 1) * per_page)
        .take(per_page)
        .collect();

    Ok(Page {
        items,
        info: PageInfo {
            number,
            num_pages,
            per_page,
            count,
            has_next: number < num_pages,
            has_previous: number > 1,
        },
    })
}

/// EmployeeListing
///
/// Display context of the employee listing page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeListing {
    pub employees: Vec<EmployeeRow>,
    pub page: PageInfo,
    /// Every department, for the filter selector.
    pub departments: Vec<Department>,
    /// The `department` parameter as submitted, or empty.
    pub selected_department: String,
    /// The `q` parameter as submitted, or empty.
    pub query: String,
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// build_listing
///
/// The listing as one pure function: (request parameters, current data) → (page of
/// results, display metadata). `departments` is returned alphabetically.
pub fn build_listing(
    params: &ListQuery,
    employees: Vec<Employee>,
    mut departments: Vec<Department>,
) -> Result<EmployeeListing, AppError> {
    let filter = EmployeeFilter::from_query(params);
    let page = paginate(filter.apply(employees), params.page.as_deref(), PAGE_SIZE)?;

    departments.sort_by(|a, b| a.name.cmp(&b.name));
    let names: HashMap<i64, &str> = departments
        .iter()
        .map(|d| (d.id, d.name.as_str()))
        .collect();

    let rows = page
        .items
        .into_iter()
        .map(|employee| EmployeeRow {
            full_name: employee.full_name(),
            department_name: employee
                .department_id
                .and_then(|id| names.get(&id))
                .map(|name| name.to_string()),
            employee,
        })
        .collect();

    Ok(EmployeeListing {
        employees: rows,
        page: page.info,
        selected_department: params.department.clone().unwrap_or_default(),
        query: params.q.clone().unwrap_or_default(),
        departments,
        breadcrumbs: navigation::list_trail(),
    })
}
