use crate::cli::ServeArgs;
use crate::infra::{build_orchestrator, build_registry, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use underwriter::config::AppConfig;
use underwriter::error::AppError;
use underwriter::telemetry;

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

    let registry = build_registry(&config.underwriting);
    for (domain, outcome) in registry.preload() {
        if let Err(err) = outcome {
            // Requests for this domain will fail safe to manual review.
            warn!(%domain, error = %err, "rule set unavailable");
        }
    }
    let orchestrator = Arc::new(build_orchestrator(&config.underwriting, registry));

    let app = with_operational_routes(orchestrator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        config_dir = %config.underwriting.config_dir.display(),
        "underwriting service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
