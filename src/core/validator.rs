//! Structural validation gate. Performs no extraction; the output list is
//! surfaced verbatim to the operator, so each check appends its own error
//! instead of short-circuiting.

use crate::core::cpf;
use crate::core::detector::{EVENT_WRAPPER_A, EVENT_WRAPPER_B};
use crate::core::extract::{descendant, descendant_text, descendants};
use crate::domain::model::ValidationReport;
use roxmltree::Document;

pub fn validate(raw_xml: &str) -> ValidationReport {
    match Document::parse(raw_xml) {
        Ok(doc) => validate_document(&doc),
        // Nothing else can be checked on an unparseable stream.
        Err(e) => ValidationReport::from_errors(vec![format!("XML parse error: {}", e)]),
    }
}

pub fn validate_document(doc: &Document) -> ValidationReport {
    let mut report = ValidationReport::new();
    let root = doc.root_element();

    if root.tag_name().name() != "eSocial" {
        report.record_error(format!(
            "missing eSocial root element (found '{}')",
            root.tag_name().name()
        ));
    }

    let has_a = descendant(root, EVENT_WRAPPER_A).is_some();
    let has_b = descendant(root, EVENT_WRAPPER_B).is_some();
    if !has_a && !has_b {
        report.record_error(format!(
            "unrecognized event type: expected {} or {}",
            EVENT_WRAPPER_A, EVENT_WRAPPER_B
        ));
    }

    match descendant(root, "ideEmpregador") {
        None => report.record_error("missing employer identification block (ideEmpregador)"),
        Some(block) => {
            if descendant_text(block, "nrInsc").is_none() {
                report.record_error("missing employer identifier (nrInsc)");
            }
        }
    }

    let beneficiaries = descendants(root, "ideBenef");
    if beneficiaries.is_empty() {
        report.record_error("no beneficiary block (ideBenef) found");
    }
    for (index, block) in beneficiaries.iter().enumerate() {
        match descendant_text(*block, "cpfBenef") {
            None => report.record_error(format!(
                "beneficiary {}: missing tax ID (cpfBenef)",
                index + 1
            )),
            Some(raw) if !cpf::is_valid_cpf(raw) => report.record_error(format!(
                "beneficiary {}: invalid CPF '{}'",
                index + 1,
                raw
            )),
            Some(_) => {}
        }
    }

    report
}
