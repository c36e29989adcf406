use crate::analytics::AnalyticsError;
use crate::config::ConfigError;
use crate::store::StoreError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Task(tokio::task::JoinError),
    Store(StoreError),
    Analytics(AnalyticsError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Store(err) | AppError::Analytics(AnalyticsError::Store(err)) => {
                store_status(err)
            }
            AppError::Analytics(
                AnalyticsError::UnknownColumn(_)
                | AnalyticsError::NotNumeric(_)
                | AnalyticsError::InvalidBins
                | AnalyticsError::UnknownSource(_),
            ) => StatusCode::BAD_REQUEST,
            AppError::Analytics(_)
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::ConstraintViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::SourceNotFound { .. } | StoreError::StoreWriteError { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Task(err) => write!(f, "request task failed: {}", err),
            AppError::Store(err) => write!(f, "store error: {}", err),
            AppError::Analytics(err) => write!(f, "analytics error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Task(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Analytics(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Task(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<AnalyticsError> for AppError {
    fn from(value: AnalyticsError) -> Self {
        Self::Analytics(value)
    }
}
