use serde_json::Value;

use super::{payload_object, read_field, read_fields, DomainAdapter, FieldKind, FieldSpec};
use crate::underwriting::domain::{Domain, FactSet, FactValue};
use crate::underwriting::error::UnderwritingError;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("creditScore"),
    FieldSpec::integer("age"),
    FieldSpec::float("annualIncome"),
    FieldSpec::float("monthlyDebt"),
    FieldSpec::float("employmentYears"),
    FieldSpec::float("propertyValue"),
];

pub const LOAN_AMOUNT: &str = "loanAmount";
pub const DOWN_PAYMENT: &str = "downPayment";
pub const DEBT_TO_INCOME: &str = "dti";
pub const LOAN_TO_VALUE: &str = "ltv";

/// Residential mortgages. Callers send either the loan amount or the down payment; the
/// other side is derived from the property value.
#[derive(Debug, Default, Clone, Copy)]
pub struct MortgageAdapter;

impl DomainAdapter for MortgageAdapter {
    fn domain(&self) -> Domain {
        Domain::Mortgage
    }

    fn normalize(
        &self,
        product: &str,
        client_id: &str,
        payload: &Value,
    ) -> Result<FactSet, UnderwritingError> {
        let payload = payload_object(payload)?;
        let mut facts = FactSet::new(Domain::Mortgage, product, client_id);
        read_fields(&mut facts, payload, FIELDS)?;

        let property_value = facts.float("propertyValue");
        let loan_amount =
            read_field(payload, LOAN_AMOUNT, FieldKind::Float)?.and_then(|v| v.as_f64());

        // loanAmount wins when both sides are supplied.
        let (loan_amount, down_payment) = match loan_amount {
            Some(loan) => (Some(loan), property_value.map(|value| value - loan)),
            None => {
                let down = read_field(payload, DOWN_PAYMENT, FieldKind::Float)?
                    .and_then(|v| v.as_f64());
                (
                    down.and_then(|down| property_value.map(|value| value - down)),
                    down,
                )
            }
        };
        facts.set_attribute(LOAN_AMOUNT, loan_amount.map(FactValue::Float));
        facts.set_attribute(DOWN_PAYMENT, down_payment.map(FactValue::Float));

        let dti = debt_to_income(facts.float("monthlyDebt"), facts.float("annualIncome"));
        let ltv = loan_to_value(loan_amount, property_value);
        facts.set_derived(DEBT_TO_INCOME, dti);
        facts.set_derived(LOAN_TO_VALUE, ltv);

        Ok(facts)
    }
}

fn debt_to_income(monthly_debt: Option<f64>, annual_income: Option<f64>) -> Option<f64> {
    let income = annual_income.filter(|income| *income > 0.0)?;
    Some(monthly_debt? / (income / 12.0))
}

fn loan_to_value(loan_amount: Option<f64>, property_value: Option<f64>) -> Option<f64> {
    let value = property_value.filter(|value| *value > 0.0)?;
    Some(loan_amount? / value)
}
