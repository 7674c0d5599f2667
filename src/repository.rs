use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, FieldErrors},
    forms::{DUPLICATE_DEPARTMENT, DUPLICATE_EMAIL, INVALID_CHOICE},
    listing::sort_employees,
    models::{Department, Employee, EmployeeInput, User},
};

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers only ever see
/// `Arc<dyn Repository>`, so the Postgres store and the in-memory store are
/// interchangeable.
///
/// Write operations report constraint violations (duplicate email or department name,
/// unknown department) as `AppError::Validation` so callers can re-display the form.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Departments ---
    // Alphabetical by name.
    async fn list_departments(&self) -> Result<Vec<Department>, AppError>;
    async fn get_department(&self, id: i64) -> Result<Option<Department>, AppError>;
    async fn create_department(&self, name: &str) -> Result<Department, AppError>;
    // Employees of the department are kept, with their department cleared.
    async fn delete_department(&self, id: i64) -> Result<bool, AppError>;

    // --- Employees ---
    // Ordered by last name, first name.
    async fn list_employees(&self) -> Result<Vec<Employee>, AppError>;
    async fn get_employee(&self, id: i64) -> Result<Option<Employee>, AppError>;
    // True if another employee (other than `exclude`) already uses `email`.
    async fn email_in_use(&self, email: &str, exclude: Option<i64>) -> Result<bool, AppError>;
    async fn create_employee(&self, input: EmployeeInput) -> Result<Employee, AppError>;
    async fn update_employee(&self, id: i64, input: EmployeeInput) -> Result<Option<Employee>, AppError>;
    async fn delete_employee(&self, id: i64) -> Result<bool, AppError>;

    // --- Identity ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The `Repository` backed by PostgreSQL. Referential integrity on department deletion
/// is delegated to the schema (`ON DELETE SET NULL`).
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const EMPLOYEE_COLUMNS: &str =
    "id, first_name, last_name, email, phone_number, hire_date, job_title, department_id";

/// Maps constraint violations raised at write time onto the form field they concern.
fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            match db.constraint() {
                Some("employees_email_key") => {
                    return AppError::Validation(FieldErrors::single("email", DUPLICATE_EMAIL));
                }
                Some("departments_name_key") => {
                    return AppError::Validation(FieldErrors::single("name", DUPLICATE_DEPARTMENT));
                }
                _ => {}
            }
        }
        if db.is_foreign_key_violation() {
            return AppError::Validation(FieldErrors::single("department", INVALID_CHOICE));
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_departments(&self) -> Result<Vec<Department>, AppError> {
        let departments =
            sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(departments)
    }

    async fn get_department(&self, id: i64) -> Result<Option<Department>, AppError> {
        let department =
            sqlx::query_as::<_, Department>("SELECT id, name FROM departments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(department)
    }

    async fn create_department(&self, name: &str) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>("INSERT INTO departments (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    /// delete_department
    ///
    /// A single statement; the `ON DELETE SET NULL` foreign key clears the employees'
    /// references in the same transaction.
    async fn delete_department(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        let query = format!(
            "SELECT {} FROM employees \
             ORDER BY LOWER(last_name), LOWER(first_name), last_name, first_name, id",
            EMPLOYEE_COLUMNS
        );
        let employees = sqlx::query_as::<_, Employee>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    async fn get_employee(&self, id: i64) -> Result<Option<Employee>, AppError> {
        let query = format!("SELECT {} FROM employees WHERE id = $1", EMPLOYEE_COLUMNS);
        let employee = sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn email_in_use(&self, email: &str, exclude: Option<i64>) -> Result<bool, AppError> {
        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM employees WHERE email = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(in_use)
    }

    async fn create_employee(&self, input: EmployeeInput) -> Result<Employee, AppError> {
        let query = format!(
            "INSERT INTO employees (first_name, last_name, email, phone_number, hire_date, job_title, department_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(input.first_name)
            .bind(input.last_name)
            .bind(input.email)
            .bind(input.phone_number)
            .bind(input.hire_date)
            .bind(input.job_title)
            .bind(input.department_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn update_employee(&self, id: i64, input: EmployeeInput) -> Result<Option<Employee>, AppError> {
        let query = format!(
            "UPDATE employees SET first_name = $2, last_name = $3, email = $4, phone_number = $5, \
             hire_date = $6, job_title = $7, department_id = $8 WHERE id = $1 RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .bind(input.first_name)
            .bind(input.last_name)
            .bind(input.email)
            .bind(input.phone_number)
            .bind(input.hire_date)
            .bind(input.job_title)
            .bind(input.department_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn delete_employee(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT id, username, is_staff FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[derive(Default)]
struct InMemoryState {
    departments: BTreeMap<i64, Department>,
    employees: BTreeMap<i64, Employee>,
    users: HashMap<Uuid, User>,
    last_department_id: i64,
    last_employee_id: i64,
}

impl InMemoryState {
    /// The same constraints the Postgres schema enforces.
    fn check_employee(&self, input: &EmployeeInput, id: Option<i64>) -> Result<(), AppError> {
        let duplicate = self
            .employees
            .values()
            .any(|e| e.email == input.email && Some(e.id) != id);
        if duplicate {
            return Err(AppError::Validation(FieldErrors::single("email", DUPLICATE_EMAIL)));
        }
        if let Some(department_id) = input.department_id {
            if !self.departments.contains_key(&department_id) {
                return Err(AppError::Validation(FieldErrors::single("department", INVALID_CHOICE)));
            }
        }
        Ok(())
    }
}

/// InMemoryRepository
///
/// A process-local `Repository` with the same constraints as the Postgres schema.
/// Used for local runs without `DATABASE_URL` and throughout the test-suite.
#[derive(Default)]
pub struct InMemoryRepository {
    state: RwLock<InMemoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an identity, as the external authentication system would.
    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_departments(&self) -> Result<Vec<Department>, AppError> {
        let state = self.state.read().await;
        let mut departments: Vec<Department> = state.departments.values().cloned().collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(departments)
    }

    async fn get_department(&self, id: i64) -> Result<Option<Department>, AppError> {
        Ok(self.state.read().await.departments.get(&id).cloned())
    }

    async fn create_department(&self, name: &str) -> Result<Department, AppError> {
        let mut state = self.state.write().await;
        if state.departments.values().any(|d| d.name == name) {
            return Err(AppError::Validation(FieldErrors::single("name", DUPLICATE_DEPARTMENT)));
        }
        state.last_department_id += 1;
        let department = Department {
            id: state.last_department_id,
            name: name.to_string(),
        };
        state.departments.insert(department.id, department.clone());
        Ok(department)
    }

    async fn delete_department(&self, id: i64) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        if state.departments.remove(&id).is_none() {
            return Ok(false);
        }
        for employee in state.employees.values_mut() {
            if employee.department_id == Some(id) {
                employee.department_id = None;
            }
        }
        Ok(true)
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        let mut employees: Vec<Employee> =
            self.state.read().await.employees.values().cloned().collect();
        sort_employees(&mut employees);
        Ok(employees)
    }

    async fn get_employee(&self, id: i64) -> Result<Option<Employee>, AppError> {
        Ok(self.state.read().await.employees.get(&id).cloned())
    }

    async fn email_in_use(&self, email: &str, exclude: Option<i64>) -> Result<bool, AppError> {
        Ok(self
            .state
            .read()
            .await
            .employees
            .values()
            .any(|e| e.email == email && Some(e.id) != exclude))
    }

    async fn create_employee(&self, input: EmployeeInput) -> Result<Employee, AppError> {
        let mut state = self.state.write().await;
        state.check_employee(&input, None)?;
        state.last_employee_id += 1;
        let employee = input.into_employee(state.last_employee_id);
        state.employees.insert(employee.id, employee.clone());
        Ok(employee)
    }

    async fn update_employee(&self, id: i64, input: EmployeeInput) -> Result<Option<Employee>, AppError> {
        let mut state = self.state.write().await;
        if !state.employees.contains_key(&id) {
            return Ok(None);
        }
        state.check_employee(&input, Some(id))?;
        let employee = input.into_employee(id);
        state.employees.insert(id, employee.clone());
        Ok(Some(employee))
    }

    async fn delete_employee(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.state.write().await.employees.remove(&id).is_some())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }
}
