use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::analytics::profile::{Histogram, MissingCount, Preview};
use crate::analytics::profile::{DEFAULT_HISTOGRAM_BINS, DEFAULT_PREVIEW_COLUMNS};
use crate::analytics::{Dashboard, DataSource, DepartmentFilter};
use crate::error::AppError;
use crate::service::EmployeeService;
use crate::store::{EmployeeRepository, EmployeeUpdate, NewEmployee, OverTime};

/// Router builder exposing the insight views, dataset profile and employee forms.
pub fn insights_router<R>(service: Arc<EmployeeService<R>>) -> Router
where
    R: EmployeeRepository + 'static,
{
    Router::new()
        .route("/api/v1/departments", get(departments_handler::<R>))
        .route("/api/v1/insights", get(insights_handler::<R>))
        .route("/api/v1/eda/missing", get(missing_handler::<R>))
        .route("/api/v1/eda/columns", get(columns_handler::<R>))
        .route("/api/v1/eda/preview", get(preview_handler::<R>))
        .route("/api/v1/eda/histogram", get(histogram_handler::<R>))
        .route("/api/v1/employees", post(add_handler::<R>))
        .route(
            "/api/v1/employees/:employee_number",
            put(update_handler::<R>).delete(remove_handler::<R>),
        )
        .route("/api/v1/cache/refresh", post(refresh_handler::<R>))
        .with_state(service)
}

/// Query string of `GET /api/v1/insights`.
///
/// Departments come from repeated `department=` keys, taken verbatim, and
/// from a comma separated `departments=` list; the selection is their union.
/// Neither key means every department; a key with no names means none.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InsightsQuery {
    pub source: Option<String>,
    pub departments: Option<Vec<String>>,
}

impl InsightsQuery {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "source" => query.source = Some(value),
                "department" => {
                    let selected = query.departments.get_or_insert_with(Vec::new);
                    let name = value.trim();
                    if !name.is_empty() {
                        selected.push(name.to_string());
                    }
                }
                "departments" => query
                    .departments
                    .get_or_insert_with(Vec::new)
                    .extend(split_list(&value)),
                _ => {}
            }
        }
        query
    }

    pub fn filter(&self) -> DepartmentFilter {
        match &self.departments {
            None => DepartmentFilter::All,
            Some(names) => DepartmentFilter::only(names.iter().cloned()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub source: DataSource,
    pub filter: DepartmentFilter,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub dashboard: Dashboard,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub columns: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HistogramQuery {
    pub column: String,
    #[serde(default)]
    pub bins: Option<usize>,
}

/// Body of `PUT /api/v1/employees/:employee_number`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    pub monthly_income: i64,
    pub department: String,
    pub job_role: String,
    pub education: i64,
    pub work_life_balance: i64,
    pub over_time: OverTime,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Runs store and aggregation work on the blocking pool.
async fn blocking<R, T, F>(service: Arc<EmployeeService<R>>, work: F) -> Result<T, AppError>
where
    R: EmployeeRepository + 'static,
    T: Send + 'static,
    F: FnOnce(&EmployeeService<R>) -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&service)).await?
}

fn not_found(employee_number: i64) -> Response {
    let payload = json!({
        "error": format!("employee {employee_number} not found"),
    });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

pub(crate) async fn departments_handler<R>(
    State(service): State<Arc<EmployeeService<R>>>,
) -> Result<Json<Vec<String>>, AppError>
where
    R: EmployeeRepository + 'static,
{
    let departments = blocking(service, |service| Ok(service.departments()?)).await?;
    Ok(Json(departments))
}

pub(crate) async fn insights_handler<R>(
    State(service): State<Arc<EmployeeService<R>>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<InsightsResponse>, AppError>
where
    R: EmployeeRepository + 'static,
{
    let query = InsightsQuery::from_pairs(pairs);
    let source = match query.source.as_deref() {
        Some(raw) => raw.parse::<DataSource>()?,
        None => DataSource::default(),
    };
    let filter = query.filter();
    let scope = filter.clone();
    let dashboard = blocking(service, move |service| Ok(service.dashboard(source, &scope)?)).await?;

    Ok(Json(InsightsResponse {
        source,
        filter,
        generated_at: Utc::now(),
        dashboard,
    }))
}

pub(crate) async fn missing_handler<R>(
    State(service): State<Arc<EmployeeService<R>>>,
) -> Result<Json<Vec<MissingCount>>, AppError>
where
    R: EmployeeRepository + 'static,
{
    let missing = blocking(service, |service| Ok(service.missing_values()?)).await?;
    Ok(Json(missing))
}

pub(crate) async fn columns_handler<R>(
    State(service): State<Arc<EmployeeService<R>>>,
) -> Result<Json<Vec<String>>, AppError>
where
    R: EmployeeRepository + 'static,
{
    let columns = blocking(service, |service| Ok(service.numeric_columns()?)).await?;
    Ok(Json(columns))
}

pub(crate) async fn preview_handler<R>(
    State(service): State<Arc<EmployeeService<R>>>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<Preview>, AppError>
where
    R: EmployeeRepository + 'static,
{
    let preview = blocking(service, move |service| {
        let preview = match query.columns.as_deref() {
            Some(raw) => service.preview(&split_list(raw), query.limit)?,
            None => service.preview(&DEFAULT_PREVIEW_COLUMNS, query.limit)?,
        };
        Ok(preview)
    })
    .await?;
    Ok(Json(preview))
}

pub(crate) async fn histogram_handler<R>(
    State(service): State<Arc<EmployeeService<R>>>,
    Query(query): Query<HistogramQuery>,
) -> Result<Json<Histogram>, AppError>
where
    R: EmployeeRepository + 'static,
{
    let bins = query.bins.unwrap_or(DEFAULT_HISTOGRAM_BINS);
    let histogram = blocking(service, move |service| {
        Ok(service.histogram(query.column.trim(), bins)?)
    })
    .await?;
    Ok(Json(histogram))
}

pub(crate) async fn add_handler<R>(
    State(service): State<Arc<EmployeeService<R>>>,
    Json(employee): Json<NewEmployee>,
) -> Result<Response, AppError>
where
    R: EmployeeRepository + 'static,
{
    let employee = blocking(service, move |service| {
        service.add(&employee)?;
        Ok(employee)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(employee)).into_response())
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<EmployeeService<R>>>,
    Path(employee_number): Path<i64>,
    Json(request): Json<UpdateRequest>,
) -> Result<Response, AppError>
where
    R: EmployeeRepository + 'static,
{
    let update = EmployeeUpdate {
        employee_number,
        monthly_income: request.monthly_income,
        department: request.department,
        job_role: request.job_role,
        education: request.education,
        work_life_balance: request.work_life_balance,
        over_time: request.over_time,
    };

    match blocking(service, move |service| Ok(service.update(&update)?)).await? {
        0 => Ok(not_found(employee_number)),
        updated => Ok(Json(json!({ "updated": updated })).into_response()),
    }
}

pub(crate) async fn remove_handler<R>(
    State(service): State<Arc<EmployeeService<R>>>,
    Path(employee_number): Path<i64>,
) -> Result<Response, AppError>
where
    R: EmployeeRepository + 'static,
{
    match blocking(service, move |service| Ok(service.remove(employee_number)?)).await? {
        0 => Ok(not_found(employee_number)),
        deleted => Ok(Json(json!({ "deleted": deleted })).into_response()),
    }
}

pub(crate) async fn refresh_handler<R>(
    State(service): State<Arc<EmployeeService<R>>>,
) -> Result<Json<serde_json::Value>, AppError>
where
    R: EmployeeRepository + 'static,
{
    let snapshot = blocking(service, |service| Ok(service.refresh()?)).await?;
    Ok(Json(json!({
        "generation": snapshot.generation,
        "rows": snapshot.table.len(),
    })))
}
