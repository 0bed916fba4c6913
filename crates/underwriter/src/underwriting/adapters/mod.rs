//! Domain adapters turning raw application payloads into typed fact sets.
//!
//! Every adapter applies the same field rule: a field is read when present and not null,
//! otherwise the attribute is recorded as unset. Coercion is strict per declared kind.

mod auto;
mod life;
mod mortgage;
mod travel;

pub use auto::AutoAdapter;
pub use life::LifeAdapter;
pub use mortgage::MortgageAdapter;
pub use travel::TravelAdapter;

use serde_json::{Map, Value};

use super::domain::{Domain, FactSet, FactValue};
use super::error::UnderwritingError;

/// Normalizes a payload for one product domain.
pub trait DomainAdapter: Send + Sync {
    fn domain(&self) -> Domain;

    fn normalize(
        &self,
        product: &str,
        client_id: &str,
        payload: &Value,
    ) -> Result<FactSet, UnderwritingError>;
}

/// Adapter registered for a catalog domain.
pub fn adapter_for(domain: Domain) -> &'static dyn DomainAdapter {
    match domain {
        Domain::Auto => &AutoAdapter,
        Domain::Life => &LifeAdapter,
        Domain::Mortgage => &MortgageAdapter,
        Domain::Travel => &TravelAdapter,
    }
}

/// Adapter lookup by case-insensitive domain name.
pub fn adapter_named(name: &str) -> Result<&'static dyn DomainAdapter, UnderwritingError> {
    let domain: Domain = name.parse()?;
    Ok(adapter_for(domain))
}

/// Scalar kind a payload field is coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl FieldKind {
    const fn label(self) -> &'static str {
        match self {
            FieldKind::Integer => "an integer",
            FieldKind::Float => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Text => "a string",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSpec {
    pub(crate) name: &'static str,
    pub(crate) kind: FieldKind,
}

impl FieldSpec {
    pub(crate) const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
        }
    }

    pub(crate) const fn float(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Float,
        }
    }

    pub(crate) const fn boolean(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Boolean,
        }
    }

    pub(crate) const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }
}

pub(crate) fn payload_object(payload: &Value) -> Result<&Map<String, Value>, UnderwritingError> {
    payload.as_object().ok_or_else(|| {
        UnderwritingError::MalformedPayload("application payload must be a JSON object".to_string())
    })
}

/// Read declared fields into the fact set, recording absent and null fields as unset.
pub(crate) fn read_fields(
    facts: &mut FactSet,
    payload: &Map<String, Value>,
    fields: &[FieldSpec],
) -> Result<(), UnderwritingError> {
    for field in fields {
        let value = read_field(payload, field.name, field.kind)?;
        facts.set_attribute(field.name, value);
    }
    Ok(())
}

pub(crate) fn read_field(
    payload: &Map<String, Value>,
    name: &str,
    kind: FieldKind,
) -> Result<Option<FactValue>, UnderwritingError> {
    let raw = match payload.get(name) {
        None | Some(Value::Null) => return Ok(None),
        Some(raw) => raw,
    };

    coerce(raw, kind).map(Some).ok_or_else(|| {
        UnderwritingError::MalformedPayload(format!(
            "field '{name}' must be {}, found {raw}",
            kind.label()
        ))
    })
}

fn coerce(raw: &Value, kind: FieldKind) -> Option<FactValue> {
    match kind {
        FieldKind::Integer => integral(raw).map(FactValue::Integer),
        FieldKind::Float => raw.as_f64().map(FactValue::Float),
        FieldKind::Boolean => raw.as_bool().map(FactValue::Boolean),
        FieldKind::Text => raw.as_str().map(|text| FactValue::Text(text.to_string())),
    }
}

// JSON does not separate 42 from 42.0; an integral float is still an integer.
fn integral(raw: &Value) -> Option<i64> {
    if let Some(value) = raw.as_i64() {
        return Some(value);
    }
    let value = raw.as_f64()?;
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}
