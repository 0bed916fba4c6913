use serde_json::Value;

use super::{payload_object, read_fields, DomainAdapter, FieldSpec};
use crate::underwriting::domain::{Domain, FactSet};
use crate::underwriting::error::UnderwritingError;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("age"),
    FieldSpec::integer("tripDays"),
    FieldSpec::text("destinationRisk"),
    FieldSpec::float("sumInsured"),
    FieldSpec::boolean("preExistingConditions"),
    FieldSpec::integer("pastClaims"),
];

/// Single-trip travel cover.
#[derive(Debug, Default, Clone, Copy)]
pub struct TravelAdapter;

impl DomainAdapter for TravelAdapter {
    fn domain(&self) -> Domain {
        Domain::Travel
    }

    fn normalize(
        &self,
        product: &str,
        client_id: &str,
        payload: &Value,
    ) -> Result<FactSet, UnderwritingError> {
        let payload = payload_object(payload)?;
        let mut facts = FactSet::new(Domain::Travel, product, client_id);
        read_fields(&mut facts, payload, FIELDS)?;
        Ok(facts)
    }
}
