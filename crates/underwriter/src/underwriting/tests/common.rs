use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::{json, Value};

use crate::underwriting::backend::{BackendError, Phase, RuleBackend, RuleSession};
use crate::underwriting::domain::{DecisionStatus, Domain, WorkingMemory};
use crate::underwriting::orchestrator::DecisionOrchestrator;
use crate::underwriting::resolver::{ConfigurationResolver, InMemoryConfigSource};
use crate::underwriting::rules::{
    Action, Condition, DecisionTableBackend, Rule, RuleRegistry, RuleSet,
};

pub(super) fn clean_mortgage_payload() -> Value {
    json!({
        "creditScore": 720,
        "age": 35,
        "annualIncome": 120000.0,
        "monthlyDebt": 2000.0,
        "employmentYears": 5.0,
        "propertyValue": 300000.0,
        "loanAmount": 240000.0
    })
}

pub(super) fn rule(name: &str, phase: Phase, status: Option<DecisionStatus>, reason: &str) -> Rule {
    Rule {
        name: name.to_string(),
        phase,
        salience: 0,
        when: Vec::new(),
        then: Action {
            status,
            reason: Some(reason.to_string()),
        },
    }
}

pub(super) fn guarded_rule(
    name: &str,
    phase: Phase,
    when: Vec<Condition>,
    status: DecisionStatus,
    reason: &str,
) -> Rule {
    Rule {
        when,
        ..rule(name, phase, Some(status), reason)
    }
}

pub(super) fn rule_set(domain: Domain, rules: Vec<Rule>) -> RuleSet {
    RuleSet {
        domain,
        version: "test".to_string(),
        rules,
    }
}

pub(super) fn table_backend(rule_sets: Vec<RuleSet>) -> Arc<DecisionTableBackend> {
    Arc::new(DecisionTableBackend::new(Arc::new(
        RuleRegistry::from_rule_sets(rule_sets),
    )))
}

pub(super) fn bundled_backend() -> Arc<DecisionTableBackend> {
    Arc::new(DecisionTableBackend::new(Arc::new(RuleRegistry::bundled())))
}

pub(super) fn orchestrator(
    source: InMemoryConfigSource,
    backend: Arc<dyn RuleBackend>,
) -> DecisionOrchestrator {
    DecisionOrchestrator::new(ConfigurationResolver::new(Arc::new(source)), backend)
}

pub(super) fn decide_json(
    orchestrator: &DecisionOrchestrator,
    domain: &str,
    payload: &Value,
) -> crate::underwriting::domain::Decision {
    orchestrator.decide(domain, "standard", "acme", &payload.to_string())
}

/// How a [`ScriptedBackend`] session behaves.
#[derive(Clone)]
pub(super) enum Script {
    RefuseSession,
    FailEvaluation,
    PanicDuringEvaluation,
    /// Record a reason and then fail, leaving partial state behind.
    PartialThenFail,
    DoNothing,
}

/// Backend double that counts session opens and closes.
#[derive(Clone)]
pub(super) struct ScriptedBackend {
    script: Script,
    pub(super) opened: Arc<AtomicUsize>,
    pub(super) closed: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub(super) fn new(script: Script) -> Self {
        Self {
            script,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(super) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(super) fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl RuleBackend for ScriptedBackend {
    fn open_session(&self, domain: Domain) -> Result<Box<dyn RuleSession>, BackendError> {
        if matches!(self.script, Script::RefuseSession) {
            return Err(BackendError::Uninitialized {
                domain,
                reason: "rule container offline".to_string(),
            });
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            closed: self.closed.clone(),
            is_closed: false,
        }))
    }
}

struct ScriptedSession {
    script: Script,
    closed: Arc<AtomicUsize>,
    is_closed: bool,
}

impl RuleSession for ScriptedSession {
    fn evaluate_phases(
        &mut self,
        memory: &mut WorkingMemory,
        _phases: &[Phase],
    ) -> Result<(), BackendError> {
        match self.script {
            Script::FailEvaluation => Err(BackendError::Rule {
                rule: "broken-rule".to_string(),
                reason: "division by zero".to_string(),
            }),
            Script::PanicDuringEvaluation => panic!("rule engine crashed"),
            Script::PartialThenFail => {
                memory.decision_mut().set_status(DecisionStatus::Approved);
                memory.decision_mut().add_reason("partial reason");
                Err(BackendError::Unavailable("lost connection".to_string()))
            }
            Script::DoNothing | Script::RefuseSession => Ok(()),
        }
    }

    fn close(&mut self) {
        if !self.is_closed {
            self.is_closed = true;
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
