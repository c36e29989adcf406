use crate::cli::ServeArgs;
use crate::infra::{open_service, AppState};
use crate::routes::with_insight_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hr_insights::config::AppConfig;
use hr_insights::error::AppError;
use hr_insights::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(args: ServeArgs) -> Result<(), AppError> {
    let config = apply_overrides(AppConfig::load()?, args);
    telemetry::init(&config.telemetry)?;

    let service = Arc::new(open_service(&config)?);
    let snapshot = service.snapshot()?;
    info!(
        rows = snapshot.table.len(),
        columns = snapshot.table.columns().len(),
        "employee snapshot loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_insight_routes(service)
        .layer(Extension(state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness.store(true, Ordering::Release);
    info!(?config.environment, %addr, store = %config.store.store_path.display(), "hr insights ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(readiness))
        .await?;
    Ok(())
}

fn apply_overrides(mut config: AppConfig, args: ServeArgs) -> AppConfig {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config
}

async fn shutdown_signal(readiness: Arc<AtomicBool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    readiness.store(false, Ordering::Release);
    info!("shutdown requested, draining connections");
}
