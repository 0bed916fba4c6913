use serde_json::Value;

use super::{payload_object, read_fields, DomainAdapter, FieldSpec};
use crate::underwriting::domain::{Domain, FactSet};
use crate::underwriting::error::UnderwritingError;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("age"),
    FieldSpec::boolean("smoker"),
    FieldSpec::float("sumAssured"),
    FieldSpec::float("bmi"),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct LifeAdapter;

impl DomainAdapter for LifeAdapter {
    fn domain(&self) -> Domain {
        Domain::Life
    }

    fn normalize(
        &self,
        product: &str,
        client_id: &str,
        payload: &Value,
    ) -> Result<FactSet, UnderwritingError> {
        let payload = payload_object(payload)?;
        let mut facts = FactSet::new(Domain::Life, product, client_id);
        read_fields(&mut facts, payload, FIELDS)?;
        Ok(facts)
    }
}
