//! Contract between the orchestrator and whatever evaluates the domain rule content.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{Domain, WorkingMemory};

/// Named rule stage. Evaluation always follows [`Phase::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Eligibility,
    Affordability,
    Risk,
    Finalize,
}

impl Phase {
    pub const ORDER: [Phase; 4] = [
        Phase::Eligibility,
        Phase::Affordability,
        Phase::Risk,
        Phase::Finalize,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Phase::Eligibility => "eligibility",
            Phase::Affordability => "affordability",
            Phase::Risk => "risk",
            Phase::Finalize => "finalize",
        }
    }

    /// Requested phases in canonical order, duplicates removed.
    pub fn canonical(requested: &[Phase]) -> Vec<Phase> {
        Phase::ORDER
            .into_iter()
            .filter(|phase| requested.contains(phase))
            .collect()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Source of per-domain rule sessions. Implementations hold only read-only shared state.
pub trait RuleBackend: Send + Sync {
    fn open_session(&self, domain: Domain) -> Result<Box<dyn RuleSession>, BackendError>;
}

/// A single-use evaluation session bound to one decision.
pub trait RuleSession: Send {
    /// Run the requested phases against the working memory, mutating only its decision.
    fn evaluate_phases(
        &mut self,
        memory: &mut WorkingMemory,
        phases: &[Phase],
    ) -> Result<(), BackendError>;

    /// Release backend resources. Calling it more than once has no further effect.
    fn close(&mut self);
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("rules for domain {domain} are not initialized: {reason}")]
    Uninitialized { domain: Domain, reason: String },
    #[error("session already closed")]
    SessionClosed,
    #[error("rule '{rule}' failed: {reason}")]
    Rule { rule: String, reason: String },
    #[error("{0}")]
    Unavailable(String),
}

/// Owns an open session and closes it when dropped, on every exit path.
pub struct SessionGuard {
    session: Box<dyn RuleSession>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn RuleSession>) -> Self {
        Self { session }
    }

    pub fn evaluate_phases(
        &mut self,
        memory: &mut WorkingMemory,
        phases: &[Phase],
    ) -> Result<(), BackendError> {
        self.session.evaluate_phases(memory, phases)
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.close();
    }
}
