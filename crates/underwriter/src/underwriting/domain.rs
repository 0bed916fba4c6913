use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::UnderwritingError;

/// Product lines the pipeline knows how to normalize and evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Auto,
    Life,
    Mortgage,
    Travel,
}

impl Domain {
    pub const ALL: [Domain; 4] = [Domain::Auto, Domain::Life, Domain::Mortgage, Domain::Travel];

    pub const fn label(self) -> &'static str {
        match self {
            Domain::Auto => "auto",
            Domain::Life => "life",
            Domain::Mortgage => "mortgage",
            Domain::Travel => "travel",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Domain::Auto => 0,
            Domain::Life => 1,
            Domain::Mortgage => 2,
            Domain::Travel => 3,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Domain {
    type Err = UnderwritingError;

    /// Exact name match, ignoring ASCII case. Surrounding whitespace is not trimmed.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|domain| domain.label().eq_ignore_ascii_case(value))
            .ok_or_else(|| UnderwritingError::UnsupportedDomain(value.to_string()))
    }
}

/// Typed scalar carried by a fact set attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl FactValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FactValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FactValue::Integer(value) => Some(*value as f64),
            FactValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FactValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FactValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Integer(value) => write!(f, "{value}"),
            FactValue::Float(value) => write!(f, "{value}"),
            FactValue::Boolean(value) => write!(f, "{value}"),
            FactValue::Text(value) => f.write_str(value),
        }
    }
}

/// Normalized application facts for a single decision.
///
/// Every attribute declared by the domain adapter is present as a key; `None` means the
/// caller left the field out or sent an explicit null. The set is only built by adapters and
/// exposes no mutation afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactSet {
    domain: Domain,
    product: String,
    client_id: String,
    attributes: BTreeMap<String, Option<FactValue>>,
    derived: BTreeMap<String, Option<f64>>,
}

impl FactSet {
    pub(crate) fn new(domain: Domain, product: &str, client_id: &str) -> Self {
        Self {
            domain,
            product: product.to_string(),
            client_id: client_id.to_string(),
            attributes: BTreeMap::new(),
            derived: BTreeMap::new(),
        }
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: Option<FactValue>) {
        self.attributes.insert(name.to_string(), value);
    }

    pub(crate) fn set_derived(&mut self, name: &str, value: Option<f64>) {
        self.derived.insert(name.to_string(), value);
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn attributes(&self) -> &BTreeMap<String, Option<FactValue>> {
        &self.attributes
    }

    pub fn derived(&self) -> &BTreeMap<String, Option<f64>> {
        &self.derived
    }

    /// The attribute's value when it is declared and set.
    pub fn attribute(&self, name: &str) -> Option<&FactValue> {
        self.attributes.get(name).and_then(Option::as_ref)
    }

    pub fn derived_value(&self, name: &str) -> Option<f64> {
        self.derived.get(name).copied().flatten()
    }

    /// Whether the adapter declared the field, regardless of it being set.
    pub fn is_declared(&self, name: &str) -> bool {
        self.attributes.contains_key(name) || self.derived.contains_key(name)
    }

    /// Resolve a fact by name, looking at attributes before derived values.
    pub fn fact(&self, name: &str) -> Option<FactValue> {
        match self.attributes.get(name) {
            Some(value) => value.clone(),
            None => self.derived_value(name).map(FactValue::Float),
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.attribute(name).and_then(FactValue::as_i64)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(FactValue::as_f64)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.attribute(name).and_then(FactValue::as_bool)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(FactValue::as_text)
    }
}

/// Per-client option document handed to rule evaluation as read-only input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(Map<String, Value>);

impl Configuration {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, option: &str) -> Option<&Value> {
        self.0.get(option)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Configuration {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Final underwriting verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStatus {
    Approved,
    Rejected,
    ManualReview,
}

impl DecisionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DecisionStatus::Approved => "APPROVED",
            DecisionStatus::Rejected => "REJECTED",
            DecisionStatus::ManualReview => "MANUAL_REVIEW",
        }
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DecisionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "APPROVED" => Ok(DecisionStatus::Approved),
            "REJECTED" => Ok(DecisionStatus::Rejected),
            "MANUAL_REVIEW" => Ok(DecisionStatus::ManualReview),
            other => Err(format!("unknown decision status '{other}'")),
        }
    }
}

/// Outcome accumulated by the rule phases. Status may be overwritten; reasons only grow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    status: Option<DecisionStatus>,
    reasons: Vec<String>,
}

impl Decision {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome used whenever the pipeline fails before producing a decision.
    pub fn fail_safe(message: impl fmt::Display) -> Self {
        Self {
            status: Some(DecisionStatus::ManualReview),
            reasons: vec![format!("Engine error: {message}")],
        }
    }

    pub fn status(&self) -> Option<DecisionStatus> {
        self.status
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn set_status(&mut self, status: DecisionStatus) {
        self.status = Some(status);
    }

    pub fn add_reason(&mut self, reason: impl Into<String>) {
        self.reasons.push(reason.into());
    }
}

/// Per-request bundle handed to a rule session: facts and configuration are read-only,
/// only the decision is writable.
#[derive(Debug)]
pub struct WorkingMemory {
    facts: FactSet,
    config: Configuration,
    decision: Decision,
}

impl WorkingMemory {
    pub fn new(facts: FactSet, config: Configuration) -> Self {
        Self {
            facts,
            config,
            decision: Decision::new(),
        }
    }

    pub fn facts(&self) -> &FactSet {
        &self.facts
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    pub fn decision_mut(&mut self) -> &mut Decision {
        &mut self.decision
    }

    pub fn into_decision(self) -> Decision {
        self.decision
    }
}
