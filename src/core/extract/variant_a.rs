//! Extractor for the legacy `evtPgtos` layout (multiple beneficiaries per
//! document, document-scoped payment blocks).

use super::{competence_year, descendant, descendant_text, descendants, parse_amount, Totals};
use crate::config::rubric_map::RubricMap;
use crate::core::cpf;
use crate::domain::model::{BeneficiaryRecord, RawRubricEntry, RubricKind};
use crate::utils::error::Result;
use roxmltree::Document;

pub fn extract_variant_a(doc: &Document, map: &RubricMap) -> Result<Vec<BeneficiaryRecord>> {
    let root = doc.root_element();
    let year = competence_year(doc)?;

    // Payment blocks are not nested per beneficiary in this layout; flatten
    // the whole document's itemized entries once.
    let mut entries: Vec<RawRubricEntry> = Vec::new();
    for node in descendants(root, "detRubrFl") {
        let type_code = descendant_text(node, "tpRubr").unwrap_or_default();
        let kind = match type_code {
            "1" => RubricKind::Earning,
            "2" => RubricKind::Deduction,
            // Informative rubrics (3/4) carry no payable amount.
            _ => continue,
        };

        let rubric_code = descendant_text(node, "codRubr").unwrap_or_default();
        let raw_amount = match descendant_text(node, "vrRubr") {
            Some(v) => v,
            None => continue,
        };

        entries.push(RawRubricEntry {
            kind,
            type_code: type_code.to_string(),
            rubric_code: rubric_code.to_string(),
            amount: parse_amount("vrRubr", raw_amount)?,
        });
    }

    let mut totals = Totals::default();
    for entry in &entries {
        let category = map.classify(entry.kind, &entry.rubric_code);
        totals.apply(category, entry.amount.abs());
    }

    // The withholding summary sub-block describes the same amounts the
    // itemized entries do; merge via max so nothing is counted twice.
    if let Some(summary) = descendant(root, "infoIrrf") {
        if let Some(raw) = descendant_text(summary, "vrRetencao") {
            let value = parse_amount("vrRetencao", raw)?.abs();
            totals.withholding_tax = totals.withholding_tax.max(value);
        }
        if let Some(raw) = descendant_text(summary, "vrRend13") {
            let value = parse_amount("vrRend13", raw)?.abs();
            totals.thirteenth_salary_income = totals.thirteenth_salary_income.max(value);
        }
        if let Some(raw) = descendant_text(summary, "vrRet13") {
            let value = parse_amount("vrRet13", raw)?.abs();
            totals.thirteenth_salary_withholding_tax =
                totals.thirteenth_salary_withholding_tax.max(value);
        }
    }

    // Dependent deductions are separate amounts, so they sum.
    for node in descendants(root, "dedDepen") {
        if let Some(raw) = descendant_text(node, "vrDedDep") {
            totals.other_deductions += parse_amount("vrDedDep", raw)?.abs();
        }
    }

    let mut records = Vec::new();
    for benef in descendants(root, "ideBenef") {
        let raw_cpf = match descendant_text(benef, "cpfBenef") {
            Some(c) => c,
            None => continue,
        };
        let cpf = match cpf::normalize_cpf(raw_cpf) {
            Some(c) => c,
            None => {
                tracing::warn!("skipping beneficiary with invalid CPF '{}'", raw_cpf);
                continue;
            }
        };
        let name = descendant_text(benef, "nmBenef").unwrap_or("");

        // A beneficiary with zero payment blocks still yields a zeroed
        // record, not an error.
        records.push(totals.clone().into_record(&cpf, name, &year));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn extract(xml: &str) -> Vec<BeneficiaryRecord> {
        let doc = Document::parse(xml).unwrap();
        extract_variant_a(&doc, &RubricMap::default()).unwrap()
    }

    fn event(body: &str) -> String {
        format!(
            r#"<eSocial xmlns="http://www.esocial.gov.br/schema/evt/evtPgtos/v02_05_00">
              <evtPgtos Id="ID1">
                <ideEvento><perApur>2023-05</perApur></ideEvento>
                <ideEmpregador><tpInsc>1</tpInsc><nrInsc>12345678000195</nrInsc></ideEmpregador>
                {}
              </evtPgtos>
            </eSocial>"#,
            body
        )
    }

    #[test]
    fn classifies_earning_and_social_security_deduction() {
        let xml = event(
            r#"<ideBenef><cpfBenef>52998224725</cpfBenef><nmBenef>Maria da Silva</nmBenef></ideBenef>
               <infoPgto><detPgtoFl>
                 <detRubrFl><tpRubr>1</tpRubr><codRubr>SALARIO</codRubr><vrRubr>5000.00</vrRubr></detRubrFl>
                 <detRubrFl><tpRubr>2</tpRubr><codRubr>INSS</codRubr><vrRubr>450.00</vrRubr></detRubrFl>
               </detPgtoFl></infoPgto>"#,
        );

        let records = extract(&xml);
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.cpf, "52998224725");
        assert_eq!(r.name, "Maria da Silva");
        assert_eq!(r.calendar_year, "2023");
        assert_eq!(r.taxable_income, dec("5000.00"));
        assert_eq!(r.social_security_contribution, dec("450.00"));
        assert_eq!(r.withholding_tax, Decimal::ZERO);
        assert_eq!(r.thirteenth_salary_income, Decimal::ZERO);
        assert_eq!(r.other_deductions, Decimal::ZERO);
    }

    #[test]
    fn withholding_summary_merges_via_max_not_sum() {
        let xml = event(
            r#"<ideBenef><cpfBenef>52998224725</cpfBenef></ideBenef>
               <infoPgto><detPgtoFl>
                 <detRubrFl><tpRubr>2</tpRubr><codRubr>IRRF</codRubr><vrRubr>300.00</vrRubr></detRubrFl>
               </detPgtoFl></infoPgto>
               <infoIrrf><vrRetencao>300.00</vrRetencao><vrRend13>1200.00</vrRend13><vrRet13>90.00</vrRet13></infoIrrf>"#,
        );

        let r = &extract(&xml)[0];
        // Same amount described twice stays a single amount.
        assert_eq!(r.withholding_tax, dec("300.00"));
        assert_eq!(r.thirteenth_salary_income, dec("1200.00"));
        assert_eq!(r.thirteenth_salary_withholding_tax, dec("90.00"));
    }

    #[test]
    fn summary_larger_than_itemized_wins() {
        let xml = event(
            r#"<ideBenef><cpfBenef>52998224725</cpfBenef></ideBenef>
               <infoPgto><detPgtoFl>
                 <detRubrFl><tpRubr>2</tpRubr><codRubr>IRRF</codRubr><vrRubr>250.00</vrRubr></detRubrFl>
               </detPgtoFl></infoPgto>
               <infoIrrf><vrRetencao>310.00</vrRetencao></infoIrrf>"#,
        );

        assert_eq!(extract(&xml)[0].withholding_tax, dec("310.00"));
    }

    #[test]
    fn thirteenth_salary_earnings_split_off() {
        let xml = event(
            r#"<ideBenef><cpfBenef>52998224725</cpfBenef></ideBenef>
               <infoPgto><detPgtoFl>
                 <detRubrFl><tpRubr>1</tpRubr><codRubr>SALARIO</codRubr><vrRubr>3000.00</vrRubr></detRubrFl>
                 <detRubrFl><tpRubr>1</tpRubr><codRubr>13SAL</codRubr><vrRubr>1500.00</vrRubr></detRubrFl>
               </detPgtoFl></infoPgto>"#,
        );

        let r = &extract(&xml)[0];
        assert_eq!(r.taxable_income, dec("3000.00"));
        assert_eq!(r.thirteenth_salary_income, dec("1500.00"));
    }

    #[test]
    fn dependent_deductions_sum_into_other() {
        let xml = event(
            r#"<ideBenef><cpfBenef>52998224725</cpfBenef></ideBenef>
               <dedDepen><vrDedDep>189.59</vrDedDep></dedDepen>
               <dedDepen><vrDedDep>189.59</vrDedDep></dedDepen>"#,
        );

        assert_eq!(extract(&xml)[0].other_deductions, dec("379.18"));
    }

    #[test]
    fn zero_payment_blocks_still_yield_record() {
        let xml = event(r#"<ideBenef><cpfBenef>52998224725</cpfBenef></ideBenef>"#);

        let records = extract(&xml);
        assert_eq!(records.len(), 1);
        assert!(records[0].is_all_zero());
    }

    #[test]
    fn invalid_cpf_beneficiary_is_skipped_others_survive() {
        let xml = event(
            r#"<ideBenef><cpfBenef>11111111111</cpfBenef></ideBenef>
               <ideBenef><cpfBenef>52998224725</cpfBenef></ideBenef>
               <infoPgto><detPgtoFl>
                 <detRubrFl><tpRubr>1</tpRubr><codRubr>SALARIO</codRubr><vrRubr>100.00</vrRubr></detRubrFl>
               </detPgtoFl></infoPgto>"#,
        );

        let records = extract(&xml);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cpf, "52998224725");
    }

    #[test]
    fn informative_rubrics_are_ignored() {
        let xml = event(
            r#"<ideBenef><cpfBenef>52998224725</cpfBenef></ideBenef>
               <infoPgto><detPgtoFl>
                 <detRubrFl><tpRubr>3</tpRubr><codRubr>FGTS</codRubr><vrRubr>400.00</vrRubr></detRubrFl>
               </detPgtoFl></infoPgto>"#,
        );

        assert!(extract(&xml)[0].is_all_zero());
    }
}
