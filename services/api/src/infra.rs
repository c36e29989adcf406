use hr_insights::analytics::DataSource;
use hr_insights::config::AppConfig;
use hr_insights::error::AppError;
use hr_insights::service::EmployeeService;
use hr_insights::store::{BootstrapOutcome, SqliteRepository};
use hr_insights::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type SqliteService = EmployeeService<SqliteRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads configuration and installs logging for the one-shot commands.
pub(crate) fn load_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

/// Bootstraps the store when missing and wraps it in the service.
pub(crate) fn open_service(config: &AppConfig) -> Result<SqliteService, AppError> {
    let (service, outcome) = EmployeeService::open(&config.store)?;
    match outcome {
        BootstrapOutcome::Created { rows, columns } => {
            info!(rows, columns, store = %config.store.store_path.display(), "store bootstrapped");
        }
        BootstrapOutcome::AlreadyPresent => {
            info!(store = %config.store.store_path.display(), "using existing store");
        }
    }
    Ok(service)
}

pub(crate) fn parse_source(raw: &str) -> Result<DataSource, String> {
    raw.parse::<DataSource>().map_err(|err| err.to_string())
}
