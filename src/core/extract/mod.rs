//! Record extraction from parsed S-1210 documents.
//!
//! The two schema variants share the tree-walking helpers and the
//! accumulator fold here; the per-variant walk and classification live in
//! `variant_a` / `variant_b`. Element lookup goes by local tag name, which
//! sidesteps the eSocial default namespace.

pub mod variant_a;
pub mod variant_b;

use crate::domain::model::{BeneficiaryRecord, EmployerIdentity, EntryCategory, TaxIdKind};
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use roxmltree::{Document, Node};
use rust_decimal::Decimal;
use std::str::FromStr;

pub use variant_a::extract_variant_a;
pub use variant_b::extract_variant_b;

pub(crate) fn descendant<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

pub(crate) fn descendants<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Vec<Node<'a, 'input>> {
    node.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == name)
        .collect()
}

pub(crate) fn descendant_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    descendant(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub(crate) fn parse_amount(field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| EtlError::ProcessingError {
        message: format!("invalid decimal in {}: '{}' ({})", field, raw, e),
    })
}

/// Derives the 4-digit calendar year from the event's reference period.
/// Monthly events carry `YYYY-MM`; annual thirteenth-salary events carry a
/// bare `YYYY`.
pub(crate) fn competence_year(doc: &Document) -> Result<String> {
    let period =
        descendant_text(doc.root_element(), "perApur").ok_or_else(|| EtlError::ValidationError {
            message: "missing reference period (perApur)".to_string(),
        })?;

    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", period), "%Y-%m-%d") {
        return Ok(date.format("%Y").to_string());
    }
    if period.len() == 4 && period.chars().all(|c| c.is_ascii_digit()) {
        return Ok(period.to_string());
    }

    Err(EtlError::ProcessingError {
        message: format!(
            "invalid reference period '{}', expected YYYY-MM or YYYY",
            period
        ),
    })
}

/// Reads the employer identification block shared by both variants.
pub fn employer_identity(doc: &Document) -> Result<EmployerIdentity> {
    let root = doc.root_element();

    let block = descendant(root, "ideEmpregador").ok_or_else(|| EtlError::ValidationError {
        message: "missing employer identification block (ideEmpregador)".to_string(),
    })?;

    let tax_id = descendant_text(block, "nrInsc").ok_or_else(|| EtlError::ValidationError {
        message: "missing employer identifier (nrInsc)".to_string(),
    })?;

    let kind = match descendant_text(block, "tpInsc") {
        Some("2") => TaxIdKind::Cpf,
        Some("1") => TaxIdKind::Cnpj,
        // tpInsc absent or out of range: fall back on identifier length.
        _ => {
            if tax_id.chars().filter(|c| c.is_ascii_digit()).count() == 11 {
                TaxIdKind::Cpf
            } else {
                TaxIdKind::Cnpj
            }
        }
    };

    Ok(EmployerIdentity {
        tax_id: tax_id.to_string(),
        kind,
    })
}

/// Per-beneficiary accumulators filled by the classification fold. Amounts
/// arrive as absolute values.
#[derive(Debug, Default, Clone)]
pub(crate) struct Totals {
    pub taxable_income: Decimal,
    pub social_security_contribution: Decimal,
    pub withholding_tax: Decimal,
    pub alimony_deduction: Decimal,
    pub thirteenth_salary_income: Decimal,
    pub thirteenth_salary_withholding_tax: Decimal,
    pub other_deductions: Decimal,
    pub exempt_income: Decimal,
    pub health_plan_deduction: Decimal,
}

impl Totals {
    pub fn apply(&mut self, category: EntryCategory, amount: Decimal) {
        match category {
            EntryCategory::TaxableIncome => self.taxable_income += amount,
            EntryCategory::ThirteenthIncome => self.thirteenth_salary_income += amount,
            EntryCategory::ExemptIncome => self.exempt_income += amount,
            EntryCategory::SocialSecurity => self.social_security_contribution += amount,
            EntryCategory::Withholding => self.withholding_tax += amount,
            EntryCategory::Alimony => self.alimony_deduction += amount,
            EntryCategory::HealthPlan => self.health_plan_deduction += amount,
            EntryCategory::OtherDeduction => self.other_deductions += amount,
        }
    }

    pub fn into_record(self, cpf: &str, name: &str, year: &str) -> BeneficiaryRecord {
        let mut record = BeneficiaryRecord::new(cpf, name, year);
        record.taxable_income = self.taxable_income;
        record.social_security_contribution = self.social_security_contribution;
        record.withholding_tax = self.withholding_tax;
        record.alimony_deduction = self.alimony_deduction;
        record.thirteenth_salary_income = self.thirteenth_salary_income;
        record.thirteenth_salary_withholding_tax = self.thirteenth_salary_withholding_tax;
        record.other_deductions = self.other_deductions;
        record.exempt_income = self.exempt_income;
        record.health_plan_deduction = self.health_plan_deduction;
        record
    }
}
