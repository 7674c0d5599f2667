use chrono::NaiveDate;
use employee_directory::{
    AppError, InMemoryRepository,
    forms::{DUPLICATE_DEPARTMENT, DUPLICATE_EMAIL, INVALID_CHOICE},
    models::{EmployeeInput, User},
    repository::Repository,
};
use uuid::Uuid;

fn input(first: &str, last: &str, email: &str, department_id: Option<i64>) -> EmployeeInput {
    EmployeeInput {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        phone_number: None,
        hire_date: NaiveDate::from_ymd_opt(2020, 5, 4).unwrap(),
        job_title: "Engineer".to_string(),
        department_id,
    }
}

#[tokio::test]
async fn test_ids_are_assigned_sequentially() {
    let repo = InMemoryRepository::new();

    let first = repo.create_employee(input("Ada", "Lovelace", "ada@example.com", None)).await.unwrap();
    let second = repo.create_employee(input("Alan", "Turing", "alan@example.com", None)).await.unwrap();

    assert_eq!((first.id, second.id), (1, 2));
    assert_eq!(repo.get_employee(2).await.unwrap(), Some(second));
}

#[tokio::test]
async fn test_employees_are_listed_by_last_then_first_name() {
    let repo = InMemoryRepository::new();
    repo.create_employee(input("Bob", "Smith", "bob@example.com", None)).await.unwrap();
    repo.create_employee(input("Carol", "Jones", "carol@example.com", None)).await.unwrap();
    repo.create_employee(input("Alice", "Smith", "alice@example.com", None)).await.unwrap();

    let names: Vec<String> = repo
        .list_employees()
        .await
        .unwrap()
        .iter()
        .map(|e| e.full_name())
        .collect();

    assert_eq!(names, vec!["Carol Jones", "Alice Smith", "Bob Smith"]);

    repo.create_employee(input("Dirk", "de Groot", "dirk@example.com", None)).await.unwrap();
    let first = repo.list_employees().await.unwrap().remove(0);
    assert_eq!(first.full_name(), "Dirk de Groot");
}

#[tokio::test]
async fn test_departments_are_listed_alphabetically() {
    let repo = InMemoryRepository::new();
    repo.create_department("Sales").await.unwrap();
    repo.create_department("Engineering").await.unwrap();

    let names: Vec<String> = repo
        .list_departments()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();

    assert_eq!(names, vec!["Engineering", "Sales"]);
}

#[tokio::test]
async fn test_duplicate_department_name_is_rejected() {
    let repo = InMemoryRepository::new();
    repo.create_department("Sales").await.unwrap();

    match repo.create_department("Sales").await {
        Err(AppError::Validation(errors)) => {
            assert_eq!(errors.get("name"), Some(&[DUPLICATE_DEPARTMENT.to_string()][..]));
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_store_enforces_unique_email() {
    let repo = InMemoryRepository::new();
    let ada = repo.create_employee(input("Ada", "Lovelace", "ada@example.com", None)).await.unwrap();
    let alan = repo.create_employee(input("Alan", "Turing", "alan@example.com", None)).await.unwrap();

    let created = repo.create_employee(input("Ada", "King", "ada@example.com", None)).await;
    let updated = repo
        .update_employee(alan.id, input("Alan", "Turing", "ada@example.com", None))
        .await;

    for result in [created.map(Some), updated] {
        match result {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.get("email"), Some(&[DUPLICATE_EMAIL.to_string()][..]));
            }
            other => panic!("expected a validation error, got {:?}", other),
        }
    }
    assert!(repo.email_in_use("ada@example.com", None).await.unwrap());
    assert!(!repo.email_in_use("ada@example.com", Some(ada.id)).await.unwrap());
    assert_eq!(repo.list_employees().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_store_rejects_unknown_department() {
    let repo = InMemoryRepository::new();

    let result = repo.create_employee(input("Ada", "Lovelace", "ada@example.com", Some(9))).await;

    match result {
        Err(AppError::Validation(errors)) => {
            assert_eq!(errors.get("department"), Some(&[INVALID_CHOICE.to_string()][..]));
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_department_delete_nulls_references() {
    let repo = InMemoryRepository::new();
    let sales = repo.create_department("Sales").await.unwrap();
    let engineering = repo.create_department("Engineering").await.unwrap();
    let bob = repo
        .create_employee(input("Bob", "Smith", "bob@example.com", Some(sales.id)))
        .await
        .unwrap();
    let alice = repo
        .create_employee(input("Alice", "Smith", "alice@example.com", Some(engineering.id)))
        .await
        .unwrap();

    assert!(repo.delete_department(sales.id).await.unwrap());
    assert!(!repo.delete_department(sales.id).await.unwrap());

    assert_eq!(repo.get_employee(bob.id).await.unwrap().unwrap().department_id, None);
    assert_eq!(
        repo.get_employee(alice.id).await.unwrap().unwrap().department_id,
        Some(engineering.id)
    );
}

#[tokio::test]
async fn test_update_and_delete_missing_employee() {
    let repo = InMemoryRepository::new();

    assert_eq!(
        repo.update_employee(3, input("Ada", "Lovelace", "ada@example.com", None))
            .await
            .unwrap(),
        None
    );
    assert!(!repo.delete_employee(3).await.unwrap());
}

#[tokio::test]
async fn test_users_are_looked_up_by_id() {
    let repo = InMemoryRepository::new();
    let user = User {
        id: Uuid::new_v4(),
        username: "hr.manager".to_string(),
        is_staff: true,
    };
    repo.insert_user(user.clone()).await;

    assert_eq!(repo.get_user(user.id).await.unwrap(), Some(user));
    assert_eq!(repo.get_user(Uuid::new_v4()).await.unwrap(), None);
}
