use employee_directory::{
    AppConfig, AppState, InMemoryRepository, create_router,
    auth::Claims,
    config::Env,
    listing::EmployeeListing,
    models::{Department, EmployeeDetail, User},
    repository::{Repository, RepositoryState},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use reqwest::{StatusCode, header, redirect::Policy};
use std::{sync::Arc, time::SystemTime};
use tokio::net::TcpListener;
use uuid::Uuid;

const STAFF_ID: Uuid = Uuid::from_u128(0x51aff);
const CLERK_ID: Uuid = Uuid::from_u128(0xc1e4c);

pub struct TestApp {
    pub address: String,
    pub repo: Arc<InMemoryRepository>,
    pub config: AppConfig,
}

async fn spawn_app(env: Env) -> TestApp {
    let repo = Arc::new(InMemoryRepository::new());
    repo.insert_user(User {
        id: STAFF_ID,
        username: "hr.manager".to_string(),
        is_staff: true,
    })
    .await;
    repo.insert_user(User {
        id: CLERK_ID,
        username: "clerk".to_string(),
        is_staff: false,
    })
    .await;

    let config = AppConfig {
        env,
        ..AppConfig::default()
    };
    let state = AppState {
        repo: repo.clone() as RepositoryState,
        config: config.clone(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        config,
    }
}

/// Redirects are what the staff gate answers with, so the client must not follow them.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

fn bearer(app: &TestApp, user_id: Uuid) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + 3600,
    };
    let key = EncodingKey::from_secret(app.config.jwt_secret.as_bytes());
    format!("Bearer {}", encode(&Header::default(), &claims, &key).unwrap())
}

fn employee_form(email: &str, department: &str) -> Vec<(&'static str, String)> {
    vec![
        ("first_name", "Alice".to_string()),
        ("last_name", "Smith".to_string()),
        ("email", email.to_string()),
        ("phone_number", "".to_string()),
        ("hire_date", "03/15/2021".to_string()),
        ("job_title", "Backend Engineer".to_string()),
        ("department", department.to_string()),
    ]
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app(Env::Local).await;
    let response = client()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app(Env::Local).await;
    let document: serde_json::Value = client()
        .get(format!("{}/api-docs/openapi.json", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(document["paths"]["/employees/"].is_object());
}

#[tokio::test]
async fn test_anonymous_can_browse() {
    let app = spawn_app(Env::Production).await;
    let engineering = app.repo.create_department("Engineering").await.unwrap();

    let response = client()
        .get(format!("{}/?q=nobody", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing: EmployeeListing = response.json().await.unwrap();
    assert!(listing.employees.is_empty());
    assert_eq!(listing.query, "nobody");
    assert_eq!(listing.departments, vec![engineering]);
}

#[tokio::test]
async fn test_anonymous_mutation_redirects_to_login() {
    let app = spawn_app(Env::Production).await;

    let response = client()
        .post(format!("{}/employees/employee/add/", app.address))
        .form(&employee_form("alice@example.com", ""))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/accounts/login/?next=%2Femployees%2Femployee%2Fadd%2F"
    );
    assert!(app.repo.list_employees().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_nested_admin_route_keeps_full_path_in_next() {
    let app = spawn_app(Env::Production).await;

    let response = client()
        .get(format!("{}/admin/departments", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/accounts/login/?next=%2Fadmin%2Fdepartments"
    );
}

#[tokio::test]
async fn test_non_staff_mutation_redirects_to_listing() {
    let app = spawn_app(Env::Production).await;

    let response = client()
        .post(format!("{}/employees/employee/add/", app.address))
        .header(header::AUTHORIZATION, bearer(&app, CLERK_ID))
        .form(&employee_form("alice@example.com", ""))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/employees/");
    assert!(app.repo.list_employees().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_staff_employee_lifecycle() {
    let app = spawn_app(Env::Production).await;
    let client = client();
    let auth = bearer(&app, STAFF_ID);
    let department: Department = client
        .post(format!("{}/admin/departments", app.address))
        .header(header::AUTHORIZATION, &auth)
        .json(&serde_json::json!({ "name": "Engineering" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Create
    let response = client
        .post(format!("{}/employees/employee/add/", app.address))
        .header(header::AUTHORIZATION, &auth)
        .form(&employee_form("alice@example.com", &department.id.to_string()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/employees/");
    let alice = app.repo.list_employees().await.unwrap().remove(0);

    // Read
    let detail: EmployeeDetail = client
        .get(format!("{}/employees/employee/{}/", app.address, alice.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail.full_name, "Alice Smith");
    assert_eq!(detail.department, Some(department));
    assert_eq!(detail.employee.hire_date.to_string(), "2021-03-15");

    // Update with a duplicate-free change
    let mut form = employee_form("alice@example.com", "");
    form[5].1 = "Staff Engineer".to_string();
    let response = client
        .post(format!("{}/employees/employee/{}/edit/", app.address, alice.id))
        .header(header::AUTHORIZATION, &auth)
        .form(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Delete
    let response = client
        .post(format!("{}/employees/employee/{}/delete/", app.address, alice.id))
        .header(header::AUTHORIZATION, &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = client
        .get(format!("{}/employees/employee/{}/", app.address, alice.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_submission_is_unprocessable() {
    let app = spawn_app(Env::Local).await;

    // The local bypass header stands in for a token.
    let response = client()
        .post(format!("{}/employees/employee/add/", app.address))
        .header("x-user-id", STAFF_ID.to_string())
        .form(&employee_form("not-an-email", ""))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["errors"]["email"][0], "Enter a valid email address.");
    assert_eq!(page["form"]["email"], "not-an-email");
}

#[tokio::test]
async fn test_page_out_of_range_is_not_found() {
    let app = spawn_app(Env::Local).await;

    let response = client()
        .get(format!("{}/employees/?page=2", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
