//! Employee form cleaning and validation.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    error::{AppError, FieldErrors},
    models::{Department, Employee, EmployeeInput},
    navigation::Breadcrumb,
    repository::Repository,
};

pub const NAME_MAX_LENGTH: usize = 100;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const PHONE_MAX_LENGTH: usize = 20;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_DATE: &str = "Enter a valid date.";
pub const DUPLICATE_EMAIL: &str = "Employee with this Email already exists.";
pub const DUPLICATE_DEPARTMENT: &str = "Department with this Name already exists.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// An accepted `hire_date` input format. chrono's `%Y` takes one to four digits, so
/// the year segment's width is checked before parsing.
struct DateFormat {
    pattern: &'static str,
    separator: char,
    year_position: usize,
    year_digits: usize,
}

/// Tried in order.
const DATE_INPUT_FORMATS: [DateFormat; 3] = [
    DateFormat { pattern: "%Y-%m-%d", separator: '-', year_position: 0, year_digits: 4 },
    DateFormat { pattern: "%m/%d/%Y", separator: '/', year_position: 2, year_digits: 4 },
    DateFormat { pattern: "%m/%d/%y", separator: '/', year_position: 2, year_digits: 2 },
];

impl DateFormat {
    fn parse(&self, raw: &str) -> Option<NaiveDate> {
        let year = raw.split(self.separator).nth(self.year_position)?;
        if year.len() != self.year_digits || !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDate::parse_from_str(raw, self.pattern).ok()
    }
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:localhost|(?:[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?\.)+(?:\p{L}{2,63}|xn--[A-Za-z0-9-]{1,59}))$",
    )
    .expect("email pattern is valid")
});

/// EmployeeForm
///
/// The editable employee field set exactly as submitted (`application/x-www-form-urlencoded`).
/// Every field is a string so that invalid input can be re-displayed verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(default)]
pub struct EmployeeForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub hire_date: String,
    pub job_title: String,
    /// Department id, or empty for none.
    pub department: String,
}

impl From<&Employee> for EmployeeForm {
    fn from(employee: &Employee) -> Self {
        Self {
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            email: employee.email.clone(),
            phone_number: employee.phone_number.clone().unwrap_or_default(),
            hire_date: employee.hire_date.format("%Y-%m-%d").to_string(),
            job_title: employee.job_title.clone(),
            department: employee
                .department_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }
}

impl EmployeeForm {
    /// clean
    ///
    /// Field-level validation that needs nothing but the department choices. Uniqueness
    /// of the email is checked separately by `validate_employee`.
    pub fn clean(&self, departments: &[Department]) -> Result<EmployeeInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = required_text(&mut errors, "first_name", &self.first_name, NAME_MAX_LENGTH);
        let last_name = required_text(&mut errors, "last_name", &self.last_name, NAME_MAX_LENGTH);
        let job_title = required_text(&mut errors, "job_title", &self.job_title, NAME_MAX_LENGTH);

        let email = required_text(&mut errors, "email", &self.email, EMAIL_MAX_LENGTH);
        if !email.is_empty() && !is_valid_email(&email) {
            errors.add("email", INVALID_EMAIL);
        }

        let phone_number = self.phone_number.trim();
        if let Some(message) = too_long(phone_number, PHONE_MAX_LENGTH) {
            errors.add("phone_number", message);
        }

        let hire_date = match self.hire_date.trim() {
            "" => {
                errors.add("hire_date", REQUIRED);
                None
            }
            raw => {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    errors.add("hire_date", INVALID_DATE);
                }
                parsed
            }
        };

        let department_id = match self.department.trim() {
            "" => None,
            raw => {
                let id = raw
                    .parse::<i64>()
                    .ok()
                    .filter(|id| departments.iter().any(|d| d.id == *id));
                if id.is_none() {
                    errors.add("department", INVALID_CHOICE);
                }
                id
            }
        };

        match hire_date {
            Some(hire_date) if errors.is_empty() => Ok(EmployeeInput {
                first_name,
                last_name,
                email,
                phone_number: (!phone_number.is_empty()).then(|| phone_number.to_string()),
                hire_date,
                job_title,
                department_id,
            }),
            _ => Err(errors),
        }
    }
}

/// validate_employee
///
/// Full validation of a submitted employee form: field cleaning followed by the email
/// uniqueness check against the store. `instance` is the id being edited, which is
/// excluded from the uniqueness check. Failures are `AppError::Validation`.
pub async fn validate_employee(
    repo: &dyn Repository,
    form: &EmployeeForm,
    instance: Option<i64>,
) -> Result<EmployeeInput, AppError> {
    let departments = repo.list_departments().await?;
    let mut errors = match form.clean(&departments) {
        Ok(input) => {
            if repo.email_in_use(&input.email, instance).await? {
                return Err(AppError::Validation(FieldErrors::single("email", DUPLICATE_EMAIL)));
            }
            return Ok(input);
        }
        Err(errors) => errors,
    };

    // Uniqueness is only meaningful for an email that is otherwise valid.
    let email = form.email.trim();
    if !errors.contains("email") && repo.email_in_use(email, instance).await? {
        errors.add("email", DUPLICATE_EMAIL);
    }
    Err(AppError::Validation(errors))
}

/// validate_department_name
///
/// Trims and checks a department name; uniqueness is enforced by the store.
pub fn validate_department_name(name: &str) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = required_text(&mut errors, "name", name, NAME_MAX_LENGTH);
    if errors.is_empty() { Ok(name) } else { Err(errors) }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_INPUT_FORMATS.iter().find_map(|format| format.parse(raw))
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn required_text(errors: &mut FieldErrors, field: &str, raw: &str, max: usize) -> String {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else if let Some(message) = too_long(value, max) {
        errors.add(field, message);
    }
    value.to_string()
}

fn too_long(value: &str, max: usize) -> Option<String> {
    let length = value.chars().count();
    (length > max).then(|| {
        format!(
            "Ensure this value has at most {} characters (it has {}).",
            max, length
        )
    })
}

/// EmployeeFormPage
///
/// Display context of the add/edit form. Returned empty on GET, and with the submitted
/// values and their errors (HTTP 422) when a POST fails validation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeFormPage {
    pub form: EmployeeForm,
    pub errors: FieldErrors,
    pub departments: Vec<Department>,
    /// Where the form posts to.
    pub action: String,
    pub breadcrumbs: Vec<Breadcrumb>,
}
