//! Cross-document consolidation of extracted records.

use crate::domain::model::BeneficiaryRecord;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Groups records by `(cpf, calendar_year)` and sums every monetary field.
/// Separate documents cover disjoint payment periods, so the merge is
/// additive here, unlike the max-based merge inside a single extractor.
/// Order-independent; output is sorted by key for stable artifacts.
pub fn consolidate(records: Vec<BeneficiaryRecord>) -> Vec<BeneficiaryRecord> {
    let mut merged: HashMap<(String, String), BeneficiaryRecord> = HashMap::new();

    for record in records {
        let key = (record.cpf.clone(), record.calendar_year.clone());
        match merged.entry(key) {
            Entry::Occupied(mut existing) => existing.get_mut().merge_add(&record),
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
    }

    let mut consolidated: Vec<BeneficiaryRecord> = merged.into_values().collect();
    consolidated.sort_by(|a, b| {
        (a.cpf.as_str(), a.calendar_year.as_str()).cmp(&(b.cpf.as_str(), b.calendar_year.as_str()))
    });
    consolidated
}
