use crate::cli::ServeArgs;
use crate::infra::{default_matching_config, dependencies, AppState, InMemoryDispatchStore};
use crate::routes::with_dispatch_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use dispatch_ai::config::AppConfig;
use dispatch_ai::error::AppError;
use dispatch_ai::telemetry;
use dispatch_ai::workflows::dispatch::{
    AutotuneController, DispatchRouterState, MatchingService,
};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryDispatchStore::default());
    let matching_config = default_matching_config();
    let service = Arc::new(MatchingService::new(
        dependencies(&store),
        matching_config.clone(),
    ));
    let autotune = Arc::new(AutotuneController::new(
        store.clone(),
        store.clone(),
        matching_config,
    ));

    let app = with_dispatch_routes(DispatchRouterState { service, autotune })
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "dispatch matching service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
