//! Underwriting decision pipeline.
//!
//! A raw application payload is normalized by the domain adapter into a [`FactSet`], the
//! client configuration is resolved from the most specific tier available, and a
//! [`RuleBackend`] session evaluates the eligibility, affordability, risk and finalize
//! phases in that order against the per-request [`WorkingMemory`].

pub mod adapters;
pub mod backend;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod resolver;
pub mod router;
pub mod rules;

#[cfg(test)]
mod tests;

pub use adapters::{adapter_for, adapter_named, DomainAdapter, FieldKind};
pub use backend::{BackendError, Phase, RuleBackend, RuleSession, SessionGuard};
pub use domain::{
    Configuration, Decision, DecisionStatus, Domain, FactSet, FactValue, WorkingMemory,
};
pub use error::UnderwritingError;
pub use orchestrator::DecisionOrchestrator;
pub use resolver::{
    ConfigSource, ConfigSourceError, ConfigTier, ConfigurationResolver, DirectoryConfigSource,
    InMemoryConfigSource,
};
pub use router::decision_router;
pub use rules::{
    Action, Comparison, Condition, DecisionTableBackend, Operand, Rule, RuleRegistry, RuleSet,
    RuleSetError,
};
