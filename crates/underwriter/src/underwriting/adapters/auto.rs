use serde_json::Value;

use super::{payload_object, read_fields, DomainAdapter, FieldSpec};
use crate::underwriting::domain::{Domain, FactSet};
use crate::underwriting::error::UnderwritingError;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("driverAge"),
    FieldSpec::integer("incidentsLast3Years"),
    FieldSpec::float("vehicleValue"),
    FieldSpec::float("desiredCoverage"),
    FieldSpec::integer("annualMileage"),
];

/// Motor policies: driver profile and vehicle cover.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoAdapter;

impl DomainAdapter for AutoAdapter {
    fn domain(&self) -> Domain {
        Domain::Auto
    }

    fn normalize(
        &self,
        product: &str,
        client_id: &str,
        payload: &Value,
    ) -> Result<FactSet, UnderwritingError> {
        let payload = payload_object(payload)?;
        let mut facts = FactSet::new(Domain::Auto, product, client_id);
        read_fields(&mut facts, payload, FIELDS)?;
        Ok(facts)
    }
}
