//! Routing checks for the insights router driven through `tower::ServiceExt`.

mod support;

use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use hr_insights::router::insights_router;
use hr_insights::service::EmployeeService;
use hr_insights::store::{Cell, EmployeeRepository, SqliteRepository, StoreError, Table};
use serde_json::{json, Value};
use support::Fixture;
use tower::ServiceExt;

fn router(fixture: &Fixture) -> Router {
    insights_router(Arc::new(fixture.service()))
}

async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(payload) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&payload).unwrap())
        }
        None => Body::empty(),
    };

    let response = router.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn insights_route_applies_department_selection() {
    let fixture = Fixture::bootstrapped();

    let (status, body) = send(
        router(&fixture),
        Method::GET,
        "/api/v1/insights?source=sql&departments=Sales",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "sql");
    assert_eq!(body["headline"]["headcount"], 2);
    assert_eq!(body["headline"]["attrition_rate_pct"], 50.0);
    assert_eq!(body["top_performers"].as_array().map(Vec::len), Some(5));
    assert!(body["generated_at"].is_string());
}

#[tokio::test]
async fn insights_route_rejects_unknown_source() {
    let fixture = Fixture::bootstrapped();

    let (status, body) = send(
        router(&fixture),
        Method::GET,
        "/api/v1/insights?source=spreadsheet",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("spreadsheet"));
}

#[tokio::test]
async fn employee_routes_cover_insert_update_and_delete() {
    let fixture = Fixture::bootstrapped();
    let app = router(&fixture);
    let hire = json!({
        "employee_number": 4000,
        "department": "Sales",
        "job_role": "Sales Representative",
        "monthly_income": 3900,
        "education": 2,
        "work_life_balance": 3
    });

    let (status, _) = send(app.clone(), Method::POST, "/api/v1/employees", Some(hire.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app.clone(), Method::POST, "/api/v1/employees", Some(hire)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("4000"));

    let changes = json!({
        "monthly_income": 4200,
        "department": "Human Resources",
        "job_role": "Recruiter",
        "education": 3,
        "work_life_balance": 2,
        "over_time": "No"
    });
    let (status, body) = send(
        app.clone(),
        Method::PUT,
        "/api/v1/employees/4000",
        Some(changes.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let (status, _) = send(app.clone(), Method::PUT, "/api/v1/employees/4001", Some(changes)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(
        app.clone(),
        Method::GET,
        "/api/v1/insights?departments=Human%20Resources",
        None,
    )
    .await;
    assert_eq!(body["headline"]["headcount"], 2);

    let (status, body) = send(app.clone(), Method::DELETE, "/api/v1/employees/4000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let (status, _) = send(app, Method::DELETE, "/api/v1/employees/4000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn eda_routes_report_profile_and_bad_columns() {
    let fixture = Fixture::bootstrapped();
    let app = router(&fixture);

    let (status, body) = send(app.clone(), Method::GET, "/api/v1/departments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!(["Human Resources", "Research & Development", "Sales"])
    );

    let (status, body) = send(
        app.clone(),
        Method::GET,
        "/api/v1/eda/preview?columns=EmployeeNumber,Department&limit=2",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"], json!([["1", "Sales"], ["2", "Research & Development"]]));

    let (status, body) = send(
        app.clone(),
        Method::GET,
        "/api/v1/eda/histogram?column=MonthlyIncome&bins=5",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bins"].as_array().map(Vec::len), Some(5));

    let (status, _) = send(
        app.clone(),
        Method::GET,
        "/api/v1/eda/histogram?column=Department",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app.clone(),
        Method::GET,
        "/api/v1/eda/preview?columns=Salary",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(app, Method::POST, "/api/v1/cache/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"], 11);
}

#[tokio::test]
async fn missing_store_surfaces_as_service_unavailable() {
    let fixture = Fixture::new();

    let (status, body) = send(router(&fixture), Method::GET, "/api/v1/departments", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn repeated_department_keys_select_names_with_commas() {
    let fixture = Fixture::bootstrapped();
    let app = router(&fixture);

    let changes = json!({
        "monthly_income": 6100,
        "department": "Sales, EMEA",
        "job_role": "Sales Executive",
        "education": 2,
        "work_life_balance": 1,
        "over_time": "Yes"
    });
    let (status, _) = send(app.clone(), Method::PUT, "/api/v1/employees/1", Some(changes)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app.clone(),
        Method::GET,
        "/api/v1/insights?source=sql&department=Sales%2C%20EMEA",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["headline"]["headcount"], 1);

    let (_, body) = send(
        app,
        Method::GET,
        "/api/v1/insights?department=Sales%2C%20EMEA&department=Sales",
        None,
    )
    .await;
    assert_eq!(body["headline"]["headcount"], 2);
}

/// Holds `load_all` until the test releases it.
struct GatedRepository {
    inner: SqliteRepository,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl EmployeeRepository for GatedRepository {
    fn load_all(&self) -> Result<Table, StoreError> {
        let _ = self.entered.lock().unwrap().send(());
        self.release
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(5))
            .map_err(|_| StoreError::StoreUnavailable("load was never released".to_string()))?;
        self.inner.load_all()
    }

    fn query_rows(&self, statement: &str, params: &[Cell]) -> Result<Vec<Vec<Cell>>, StoreError> {
        self.inner.query_rows(statement, params)
    }

    fn execute(&self, statement: &str, params: &[Cell]) -> Result<usize, StoreError> {
        self.inner.execute(statement, params)
    }
}

#[tokio::test]
async fn slow_snapshot_load_does_not_stall_other_requests() {
    let fixture = Fixture::bootstrapped();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let repository = GatedRepository {
        inner: SqliteRepository::new(&fixture.store_path),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let app = insights_router(Arc::new(EmployeeService::new(Arc::new(repository))));

    let slow = tokio::spawn(send(app.clone(), Method::GET, "/api/v1/departments", None));
    let entered = tokio::task::spawn_blocking(move || entered_rx.recv_timeout(Duration::from_secs(5)))
        .await
        .unwrap();
    assert!(entered.is_ok(), "snapshot load never started");

    let (status, body) = send(app, Method::GET, "/api/v1/insights?source=sql", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["headline"]["headcount"], 11);

    release_tx.send(()).unwrap();
    let (status, body) = slow.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!(["Human Resources", "Research & Development", "Sales"])
    );
}
