//! Extractor for the current `evtIrrfBenef` layout (single beneficiary with
//! an itemized demonstrative plus a payment-detail sub-block).

use super::{competence_year, descendant, descendant_text, descendants, parse_amount, Totals};
use crate::config::rubric_map::RubricMap;
use crate::core::cpf;
use crate::domain::model::{BeneficiaryRecord, EntryCategory, RawRubricEntry, RubricKind};
use crate::utils::error::Result;
use roxmltree::Document;

/// Three-digit demonstrative type codes.
const TP_EARNINGS: &str = "011";
const TP_SOCIAL_SECURITY: &str = "041";
const TP_JUDICIAL_DISCOUNT: &str = "051";
const TP_WITHHOLDING: &str = "061";

pub fn extract_variant_b(doc: &Document, map: &RubricMap) -> Result<Vec<BeneficiaryRecord>> {
    let root = doc.root_element();
    let year = competence_year(doc)?;

    let benef = match descendant(root, "ideBenef") {
        Some(b) => b,
        None => return Ok(Vec::new()),
    };
    let raw_cpf = match descendant_text(benef, "cpfBenef") {
        Some(c) => c,
        None => return Ok(Vec::new()),
    };
    let cpf = match cpf::normalize_cpf(raw_cpf) {
        Some(c) => c,
        None => {
            tracing::warn!("skipping beneficiary with invalid CPF '{}'", raw_cpf);
            return Ok(Vec::new());
        }
    };
    let name = descendant_text(benef, "nmBenef").unwrap_or("");

    // Flatten the demonstrative; discounts may arrive with a negative sign.
    let mut entries: Vec<RawRubricEntry> = Vec::new();
    for node in descendants(root, "itemRend") {
        let raw_amount = match descendant_text(node, "vrItem") {
            Some(v) => v,
            None => continue,
        };
        let amount = parse_amount("vrItem", raw_amount)?;

        entries.push(RawRubricEntry {
            kind: if amount.is_sign_negative() {
                RubricKind::Deduction
            } else {
                RubricKind::Earning
            },
            type_code: descendant_text(node, "tpInfo").unwrap_or_default().to_string(),
            rubric_code: descendant_text(node, "codRubr")
                .unwrap_or_default()
                .to_string(),
            amount,
        });
    }

    let mut totals = Totals::default();
    for entry in &entries {
        let amount = entry.amount.abs();
        let category = match entry.type_code.as_str() {
            TP_WITHHOLDING => EntryCategory::Withholding,
            TP_SOCIAL_SECURITY => EntryCategory::SocialSecurity,
            TP_JUDICIAL_DISCOUNT => EntryCategory::Alimony,
            TP_EARNINGS => {
                if entry.kind == RubricKind::Earning && map.is_thirteenth(&entry.rubric_code) {
                    EntryCategory::ThirteenthIncome
                } else {
                    EntryCategory::TaxableIncome
                }
            }
            // Generic "099" and anything unrecognized: rubric table first,
            // then the sign default. A miss is an auditable default, not an
            // error.
            other => match map.classify_generic(&entry.rubric_code) {
                Some(category) => category,
                None => {
                    tracing::debug!(
                        "unclassified entry tpInfo='{}' codRubr='{}', routing by sign",
                        other,
                        entry.rubric_code
                    );
                    if entry.kind == RubricKind::Deduction {
                        EntryCategory::OtherDeduction
                    } else {
                        EntryCategory::TaxableIncome
                    }
                }
            },
        };
        totals.apply(category, amount);
    }

    // The payment-detail totals describe the same amounts as the itemized
    // demonstrative through a different lens; merge per field via max.
    for node in descendants(root, "detPgto") {
        let kind = match descendant_text(node, "tpValor") {
            Some(k) => k,
            None => continue,
        };
        let raw = match descendant_text(node, "vrPgto") {
            Some(v) => v,
            None => continue,
        };
        let value = parse_amount("vrPgto", raw)?.abs();

        match kind {
            // Net pay has no receipt field; summing it anywhere would
            // double-count.
            "1" => {}
            "2" => {
                totals.social_security_contribution =
                    totals.social_security_contribution.max(value)
            }
            "3" => totals.withholding_tax = totals.withholding_tax.max(value),
            "4" => {
                totals.thirteenth_salary_income = totals.thirteenth_salary_income.max(value)
            }
            "5" => {
                totals.thirteenth_salary_withholding_tax =
                    totals.thirteenth_salary_withholding_tax.max(value)
            }
            other => tracing::debug!("unknown payment-detail tpValor '{}' ignored", other),
        }
    }

    Ok(vec![totals.into_record(&cpf, name, &year)])
}
