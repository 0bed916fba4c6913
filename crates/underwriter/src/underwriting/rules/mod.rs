//! Decision-table rule backend: JSON rule sets evaluated phase by phase against working
//! memory.

mod registry;
mod session;

pub(crate) use registry::bundled_document;
pub use registry::RuleRegistry;
pub use session::{DecisionTableBackend, TableSession};

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::backend::Phase;
use super::domain::{Decision, DecisionStatus, Domain, FactValue, WorkingMemory};

/// Versioned rule content for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub domain: Domain,
    pub version: String,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Parse and validate a rule set document expected to belong to `domain`.
    pub fn from_json(domain: Domain, body: &str) -> Result<Self, RuleSetError> {
        let rule_set: RuleSet =
            serde_json::from_str(body).map_err(|err| RuleSetError::Invalid {
                domain,
                reason: err.to_string(),
            })?;

        if rule_set.domain != domain {
            return Err(RuleSetError::DomainMismatch {
                expected: domain,
                found: rule_set.domain,
            });
        }
        rule_set.validate()?;
        Ok(rule_set)
    }

    fn validate(&self) -> Result<(), RuleSetError> {
        let invalid = |reason: String| RuleSetError::Invalid {
            domain: self.domain,
            reason,
        };

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.name.trim().is_empty() {
                return Err(invalid(format!("rule #{index} has no name")));
            }
            if self.rules[..index].iter().any(|other| other.name == rule.name) {
                return Err(invalid(format!("duplicate rule name '{}'", rule.name)));
            }
            if rule.then.status.is_none() && rule.then.reason.is_none() {
                return Err(invalid(format!("rule '{}' has no effect", rule.name)));
            }
        }
        Ok(())
    }

    /// Rules of a phase by descending salience, declaration order breaking ties.
    pub fn rules_for(&self, phase: Phase) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self.rules.iter().filter(|rule| rule.phase == phase).collect();
        rules.sort_by_key(|rule| Reverse(rule.salience));
        rules
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub phase: Phase,
    #[serde(default)]
    pub salience: i32,
    #[serde(default)]
    pub when: Vec<Condition>,
    pub then: Action,
}

impl Rule {
    pub fn matches(&self, memory: &WorkingMemory) -> bool {
        self.when.iter().all(|condition| condition.holds(memory))
    }

    pub(crate) fn fire(&self, memory: &mut WorkingMemory) {
        let reason = self
            .then
            .reason
            .as_deref()
            .map(|template| render_reason(template, memory, self));
        apply(memory.decision_mut(), self.then.status, reason);
    }

    /// Default a condition of this rule falls back to for a configuration option.
    fn config_default(&self, option: &str) -> Option<&Value> {
        self.when.iter().find_map(|condition| match condition {
            Condition::Compare {
                value:
                    Operand::Config {
                        config,
                        default: Some(default),
                    },
                ..
            } if config == option => Some(default),
            _ => None,
        })
    }
}

fn apply(decision: &mut Decision, status: Option<DecisionStatus>, reason: Option<String>) {
    if let Some(status) = status {
        decision.set_status(status);
    }
    if let Some(reason) = reason {
        decision.add_reason(reason);
    }
}

/// Effect of a fired rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DecisionStatus>,
    /// Reason text; `{name}` placeholders are filled from facts, then configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum Condition {
    Compare {
        fact: String,
        op: Comparison,
        value: Operand,
    },
    Present {
        fact: String,
    },
    Missing {
        fact: String,
    },
    StatusUnset,
    StatusIs {
        status: DecisionStatus,
    },
    StatusIsNot {
        status: DecisionStatus,
    },
}

impl Condition {
    pub fn holds(&self, memory: &WorkingMemory) -> bool {
        let status = memory.decision().status();
        match self {
            Condition::Compare { fact, op, value } => {
                let Some(left) = memory.facts().fact(fact) else {
                    return false;
                };
                match value.resolve(memory) {
                    Some(right) => op.evaluate(&left, &right),
                    None => false,
                }
            }
            Condition::Present { fact } => memory.facts().fact(fact).is_some(),
            Condition::Missing { fact } => memory.facts().fact(fact).is_none(),
            Condition::StatusUnset => status.is_none(),
            Condition::StatusIs { status: expected } => status == Some(*expected),
            Condition::StatusIsNot { status: expected } => status != Some(*expected),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Ne,
}

impl Comparison {
    /// Numbers compare as floats; text and booleans only support equality.
    fn evaluate(self, left: &FactValue, right: &Value) -> bool {
        match left {
            FactValue::Integer(_) | FactValue::Float(_) => {
                let (Some(left), Some(right)) = (left.as_f64(), right.as_f64()) else {
                    return false;
                };
                match self {
                    Comparison::Lt => left < right,
                    Comparison::Lte => left <= right,
                    Comparison::Gt => left > right,
                    Comparison::Gte => left >= right,
                    Comparison::Eq => left == right,
                    Comparison::Ne => left != right,
                }
            }
            FactValue::Boolean(left) => right
                .as_bool()
                .map(|right| self.equality(*left == right))
                .unwrap_or(false),
            FactValue::Text(left) => right
                .as_str()
                .map(|right| self.equality(left == right))
                .unwrap_or(false),
        }
    }

    fn equality(self, equal: bool) -> bool {
        match self {
            Comparison::Eq => equal,
            Comparison::Ne => !equal,
            _ => false,
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Config {
        config: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
    },
    Fact {
        fact: String,
    },
    Literal(Value),
}

impl Operand {
    fn resolve(&self, memory: &WorkingMemory) -> Option<Value> {
        let resolved = match self {
            Operand::Config { config, default } => memory
                .config()
                .get(config)
                .filter(|value| !value.is_null())
                .or(default.as_ref())
                .cloned(),
            Operand::Fact { fact } => memory.facts().fact(fact).map(fact_to_json),
            Operand::Literal(value) => Some(value.clone()),
        };
        resolved.filter(|value| !value.is_null())
    }
}

fn fact_to_json(value: FactValue) -> Value {
    match value {
        FactValue::Integer(value) => Value::from(value),
        FactValue::Float(value) => Value::from(value),
        FactValue::Boolean(value) => Value::Bool(value),
        FactValue::Text(value) => Value::String(value),
    }
}

fn render_reason(template: &str, memory: &WorkingMemory, rule: &Rule) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            rendered.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let key = &after[..end];
        match placeholder_value(key, memory, rule) {
            Some(text) => rendered.push_str(&text),
            None => {
                rendered.push('{');
                rendered.push_str(key);
                rendered.push('}');
            }
        }
        rest = &after[end + 1..];
    }

    rendered.push_str(rest);
    rendered
}

// Facts first, then the client configuration, then the rule's own default.
fn placeholder_value(key: &str, memory: &WorkingMemory, rule: &Rule) -> Option<String> {
    if let Some(value) = memory.facts().fact(key) {
        return Some(match value {
            FactValue::Float(number) => format_number(number),
            other => other.to_string(),
        });
    }

    let value = memory
        .config()
        .get(key)
        .filter(|value| !value.is_null())
        .or_else(|| rule.config_default(key))?;
    Some(match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| number.to_string()),
        other => other.to_string(),
    })
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleSetError {
    #[error("rule set for {domain} could not be read from {path}: {reason}")]
    Unreadable {
        domain: Domain,
        path: String,
        reason: String,
    },
    #[error("rule set for {domain} is invalid: {reason}")]
    Invalid { domain: Domain, reason: String },
    #[error("rule set declares domain {found} but was loaded for {expected}")]
    DomainMismatch { expected: Domain, found: Domain },
    #[error("no rule set registered for {0}")]
    Missing(Domain),
}
