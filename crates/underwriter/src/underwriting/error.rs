use super::backend::BackendError;
use super::domain::Domain;

/// Failures inside the decision pipeline. The orchestrator converts every variant into the
/// fail-safe manual review decision; none of them reach callers of `decide`.
#[derive(Debug, thiserror::Error)]
pub enum UnderwritingError {
    #[error("Unsupported domain: {0}")]
    UnsupportedDomain(String),
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    /// Non-fatal: the resolver logs it and moves on to the next tier.
    #[error("configuration '{path}' unavailable: {reason}")]
    ConfigurationUnavailable { path: String, reason: String },
    #[error("No rule session available for domain {domain}: {source}")]
    NoSessionAvailable {
        domain: Domain,
        #[source]
        source: BackendError,
    },
    #[error("Rule evaluation failed: {0}")]
    EvaluationFailure(#[source] BackendError),
    #[error("Decision pipeline panicked: {0}")]
    Panicked(String),
}

impl From<serde_json::Error> for UnderwritingError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}
