use serde_json::{json, Map, Value};

use crate::underwriting::adapters::{adapter_for, adapter_named};
use crate::underwriting::domain::{Domain, FactValue};
use crate::underwriting::error::UnderwritingError;

fn declared_fields(domain: Domain) -> Vec<&'static str> {
    match domain {
        Domain::Auto => vec![
            "driverAge",
            "incidentsLast3Years",
            "vehicleValue",
            "desiredCoverage",
            "annualMileage",
        ],
        Domain::Life => vec!["age", "smoker", "sumAssured", "bmi"],
        Domain::Mortgage => vec![
            "creditScore",
            "age",
            "annualIncome",
            "monthlyDebt",
            "employmentYears",
            "propertyValue",
            "loanAmount",
            "downPayment",
        ],
        Domain::Travel => vec![
            "age",
            "tripDays",
            "destinationRisk",
            "sumInsured",
            "preExistingConditions",
            "pastClaims",
        ],
    }
}

#[test]
fn absent_fields_are_unset_for_every_domain() {
    for domain in Domain::ALL {
        let facts = adapter_for(domain)
            .normalize("standard", "acme", &json!({}))
            .expect("empty payload normalizes");

        for field in declared_fields(domain) {
            assert!(facts.is_declared(field), "{domain}: {field} not declared");
            assert_eq!(facts.attribute(field), None, "{domain}: {field} should be unset");
        }
    }
}

#[test]
fn explicit_null_matches_absent_field() {
    for domain in Domain::ALL {
        let adapter = adapter_for(domain);
        let absent = adapter
            .normalize("standard", "acme", &json!({}))
            .expect("absent normalizes");

        let nulls: Map<String, Value> = declared_fields(domain)
            .into_iter()
            .map(|field| (field.to_string(), Value::Null))
            .collect();
        let explicit = adapter
            .normalize("standard", "acme", &Value::Object(nulls))
            .expect("nulls normalize");

        assert_eq!(absent, explicit, "{domain}: null differs from absent");
    }
}

#[test]
fn zero_like_values_stay_distinct_from_unset() {
    let facts = adapter_for(Domain::Travel)
        .normalize(
            "single-trip",
            "acme",
            &json!({ "pastClaims": 0, "preExistingConditions": false, "destinationRisk": "" }),
        )
        .expect("payload normalizes");

    assert_eq!(facts.integer("pastClaims"), Some(0));
    assert_eq!(facts.boolean("preExistingConditions"), Some(false));
    assert_eq!(facts.text("destinationRisk"), Some(""));
    assert_eq!(facts.attribute("sumInsured"), None);
}

#[test]
fn attributes_are_typed_per_domain() {
    let facts = adapter_for(Domain::Life)
        .normalize(
            "term",
            "acme",
            &json!({ "age": 41, "smoker": true, "sumAssured": 250000, "bmi": 27.4 }),
        )
        .expect("life payload normalizes");

    assert_eq!(facts.attribute("age"), Some(&FactValue::Integer(41)));
    assert_eq!(facts.attribute("smoker"), Some(&FactValue::Boolean(true)));
    assert_eq!(facts.attribute("sumAssured"), Some(&FactValue::Float(250000.0)));
    assert_eq!(facts.float("bmi"), Some(27.4));
    assert_eq!(facts.product(), "term");
    assert_eq!(facts.client_id(), "acme");
    assert_eq!(facts.domain(), Domain::Life);
}

#[test]
fn mortgage_derives_down_payment_from_loan_amount() {
    let facts = adapter_for(Domain::Mortgage)
        .normalize(
            "fixed30",
            "acme",
            &json!({ "propertyValue": 300000, "loanAmount": 240000 }),
        )
        .expect("mortgage normalizes");

    assert_eq!(facts.float("downPayment"), Some(60000.0));
    let ltv = facts.derived_value("ltv").expect("ltv derived");
    assert!((ltv - 0.8).abs() < 1e-12);
}

#[test]
fn mortgage_derives_loan_amount_from_down_payment() {
    let facts = adapter_for(Domain::Mortgage)
        .normalize(
            "fixed30",
            "acme",
            &json!({ "propertyValue": 300000, "downPayment": 60000 }),
        )
        .expect("mortgage normalizes");

    assert_eq!(facts.float("loanAmount"), Some(240000.0));
    let ltv = facts.derived_value("ltv").expect("ltv derived");
    assert!((ltv - 0.8).abs() < 1e-12);
}

#[test]
fn mortgage_prefers_loan_amount_when_both_supplied() {
    let facts = adapter_for(Domain::Mortgage)
        .normalize(
            "fixed30",
            "acme",
            &json!({ "propertyValue": 300000, "loanAmount": 200000, "downPayment": 60000 }),
        )
        .expect("mortgage normalizes");

    assert_eq!(facts.float("loanAmount"), Some(200000.0));
    assert_eq!(facts.float("downPayment"), Some(100000.0));
}

#[test]
fn mortgage_null_loan_amount_falls_back_to_down_payment() {
    let facts = adapter_for(Domain::Mortgage)
        .normalize(
            "fixed30",
            "acme",
            &json!({ "propertyValue": 300000, "loanAmount": null, "downPayment": 60000 }),
        )
        .expect("mortgage normalizes");

    assert_eq!(facts.float("loanAmount"), Some(240000.0));
}

#[test]
fn mortgage_without_property_value_keeps_counterpart_unset() {
    let facts = adapter_for(Domain::Mortgage)
        .normalize("fixed30", "acme", &json!({ "loanAmount": 240000 }))
        .expect("mortgage normalizes");

    assert_eq!(facts.float("loanAmount"), Some(240000.0));
    assert_eq!(facts.attribute("downPayment"), None);
    assert_eq!(facts.derived_value("ltv"), None);
}

#[test]
fn mortgage_zero_income_leaves_dti_unset() {
    let facts = adapter_for(Domain::Mortgage)
        .normalize(
            "fixed30",
            "acme",
            &json!({ "annualIncome": 0, "monthlyDebt": 1500, "propertyValue": 0, "loanAmount": 1000 }),
        )
        .expect("mortgage normalizes");

    assert!(facts.derived().contains_key("dti"));
    assert_eq!(facts.derived_value("dti"), None);
    assert_eq!(facts.derived_value("ltv"), None);
}

#[test]
fn mortgage_computes_monthly_debt_to_income() {
    let facts = adapter_for(Domain::Mortgage)
        .normalize(
            "fixed30",
            "acme",
            &json!({ "annualIncome": 120000, "monthlyDebt": 2500 }),
        )
        .expect("mortgage normalizes");

    let dti = facts.derived_value("dti").expect("dti derived");
    assert!((dti - 0.25).abs() < 1e-12);
}

#[test]
fn integer_fields_reject_fractional_and_text_values() {
    let adapter = adapter_for(Domain::Auto);

    for payload in [json!({ "driverAge": 30.5 }), json!({ "driverAge": "30" })] {
        match adapter.normalize("standard", "acme", &payload) {
            Err(UnderwritingError::MalformedPayload(message)) => {
                assert!(message.contains("driverAge"), "unexpected message {message}")
            }
            other => panic!("expected malformed payload, got {other:?}"),
        }
    }

    let facts = adapter
        .normalize("standard", "acme", &json!({ "driverAge": 30.0 }))
        .expect("integral float accepted");
    assert_eq!(facts.integer("driverAge"), Some(30));
}

#[test]
fn boolean_and_text_fields_do_not_guess() {
    let adapter = adapter_for(Domain::Travel);

    assert!(matches!(
        adapter.normalize("single-trip", "acme", &json!({ "preExistingConditions": "yes" })),
        Err(UnderwritingError::MalformedPayload(_))
    ));
    assert!(matches!(
        adapter.normalize("single-trip", "acme", &json!({ "destinationRisk": 3 })),
        Err(UnderwritingError::MalformedPayload(_))
    ));
}

#[test]
fn payload_must_be_an_object() {
    match adapter_for(Domain::Life).normalize("term", "acme", &json!([1, 2, 3])) {
        Err(UnderwritingError::MalformedPayload(_)) => {}
        other => panic!("expected malformed payload, got {other:?}"),
    }
}

#[test]
fn adapter_lookup_is_case_insensitive_and_exact() {
    let adapter = adapter_named("MortGage").expect("mortgage adapter");
    assert_eq!(adapter.domain(), Domain::Mortgage);

    for name in ["boat", "mortgages", " auto", ""] {
        match adapter_named(name) {
            Err(UnderwritingError::UnsupportedDomain(found)) => assert_eq!(found, name),
            Err(other) => panic!("expected unsupported domain, got {other:?}"),
            Ok(_) => panic!("'{name}' should not resolve"),
        }
    }
}
