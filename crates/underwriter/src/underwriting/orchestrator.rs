use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::adapters::adapter_named;
use super::backend::{BackendError, Phase, RuleBackend, SessionGuard};
use super::domain::{Decision, WorkingMemory};
use super::error::UnderwritingError;
use super::resolver::ConfigurationResolver;

/// Drives a payload through normalization, configuration resolution and phased rule
/// evaluation. Shared across requests; holds no per-decision state.
pub struct DecisionOrchestrator {
    resolver: ConfigurationResolver,
    backend: Arc<dyn RuleBackend>,
}

impl DecisionOrchestrator {
    pub fn new(resolver: ConfigurationResolver, backend: Arc<dyn RuleBackend>) -> Self {
        Self { resolver, backend }
    }

    /// Decide an application. Never fails: any pipeline error yields a manual review
    /// decision naming the error.
    pub fn decide(&self, domain: &str, product: &str, client_id: &str, payload: &str) -> Decision {
        self.decide_bytes(domain, product, client_id, payload.as_bytes())
    }

    /// [`decide`](Self::decide) over a raw body. Bytes that are not valid UTF-8 anywhere in
    /// the document, string contents included, are a malformed payload.
    pub fn decide_bytes(
        &self,
        domain: &str,
        product: &str,
        client_id: &str,
        payload: &[u8],
    ) -> Decision {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.try_decide_bytes(domain, product, client_id, payload)
        }))
        .unwrap_or_else(|panic| Err(UnderwritingError::Panicked(panic_message(panic))));

        match outcome {
            Ok(decision) => {
                debug!(
                    domain,
                    product,
                    client_id,
                    status = ?decision.status(),
                    reasons = decision.reasons().len(),
                    "decision complete"
                );
                decision
            }
            Err(err) => {
                warn!(domain, product, client_id, error = %err, "decision failed, routing to manual review");
                Decision::fail_safe(&err)
            }
        }
    }

    /// The pipeline without the fail-safe translation.
    pub fn try_decide(
        &self,
        domain: &str,
        product: &str,
        client_id: &str,
        payload: &str,
    ) -> Result<Decision, UnderwritingError> {
        self.try_decide_bytes(domain, product, client_id, payload.as_bytes())
    }

    pub fn try_decide_bytes(
        &self,
        domain: &str,
        product: &str,
        client_id: &str,
        payload: &[u8],
    ) -> Result<Decision, UnderwritingError> {
        let payload: Value = serde_json::from_slice(payload)?;
        let adapter = adapter_named(domain)?;
        let facts = adapter.normalize(product, client_id, &payload)?;
        let domain = facts.domain();

        let config = self.resolver.resolve(domain, product, client_id);
        let mut memory = WorkingMemory::new(facts, config);

        let session = self
            .backend
            .open_session(domain)
            .map_err(|source| UnderwritingError::NoSessionAvailable { domain, source })?;
        let mut session = SessionGuard::new(session);

        // A panicking backend still yields a decision.
        let evaluated = panic::catch_unwind(AssertUnwindSafe(|| {
            session.evaluate_phases(&mut memory, &Phase::ORDER)
        }))
        .unwrap_or_else(|panic| {
            Err(BackendError::Unavailable(format!(
                "rule session panicked: {}",
                panic_message(panic)
            )))
        });
        drop(session);

        evaluated.map_err(UnderwritingError::EvaluationFailure)?;
        Ok(memory.into_decision())
    }
}

impl std::fmt::Debug for DecisionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionOrchestrator")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
