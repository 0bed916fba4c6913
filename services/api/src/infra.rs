use metrics_exporter_prometheus::PrometheusHandle;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use underwriter::config::UnderwritingConfig;
use underwriter::underwriting::{
    ConfigurationResolver, DecisionOrchestrator, DecisionTableBackend, RuleRegistry,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_registry(config: &UnderwritingConfig) -> Arc<RuleRegistry> {
    let registry = match &config.rules_dir {
        Some(dir) => RuleRegistry::with_directory(dir.clone()),
        None => RuleRegistry::bundled(),
    };
    Arc::new(registry)
}

pub(crate) fn build_orchestrator(
    config: &UnderwritingConfig,
    registry: Arc<RuleRegistry>,
) -> DecisionOrchestrator {
    DecisionOrchestrator::new(
        ConfigurationResolver::from_directory(config.config_dir.clone()),
        Arc::new(DecisionTableBackend::new(registry)),
    )
}

/// Reads the application body from `path`, or from stdin when no path is given.
pub(crate) fn read_payload(path: Option<&Path>) -> io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut body = String::new();
            io::stdin().read_to_string(&mut body)?;
            Ok(body)
        }
    }
}
