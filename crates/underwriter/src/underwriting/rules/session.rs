use std::sync::Arc;

use tracing::trace;

use super::{RuleRegistry, RuleSet};
use crate::underwriting::backend::{BackendError, Phase, RuleBackend, RuleSession};
use crate::underwriting::domain::{Domain, WorkingMemory};

/// Backend evaluating the registry's decision tables.
#[derive(Debug, Clone)]
pub struct DecisionTableBackend {
    registry: Arc<RuleRegistry>,
}

impl DecisionTableBackend {
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }
}

impl RuleBackend for DecisionTableBackend {
    fn open_session(&self, domain: Domain) -> Result<Box<dyn RuleSession>, BackendError> {
        let rules = self
            .registry
            .rule_set(domain)
            .map_err(|err| BackendError::Uninitialized {
                domain,
                reason: err.to_string(),
            })?;
        Ok(Box::new(TableSession::new(rules)))
    }
}

/// Session over one rule set. Every rule of a phase whose conditions hold when it is
/// reached fires once.
#[derive(Debug)]
pub struct TableSession {
    rules: Arc<RuleSet>,
    open: bool,
}

impl TableSession {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules, open: true }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl RuleSession for TableSession {
    fn evaluate_phases(
        &mut self,
        memory: &mut WorkingMemory,
        phases: &[Phase],
    ) -> Result<(), BackendError> {
        if !self.open {
            return Err(BackendError::SessionClosed);
        }

        for phase in Phase::canonical(phases) {
            for rule in self.rules.rules_for(phase) {
                if rule.matches(memory) {
                    trace!(%phase, rule = %rule.name, "rule fired");
                    rule.fire(memory);
                }
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }
}
