use crate::domain::model::{EntryCategory, RubricKind};
use crate::utils::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

/// Rubric classification table. Replaces the original system's ad hoc
/// substring checks with an exact code table plus documented keyword
/// fallbacks, loadable from TOML so the table can track the official rubric
/// catalogue without a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricMap {
    /// Exact rubric code -> category. Consulted before any keyword rule.
    #[serde(default)]
    pub exact: HashMap<String, EntryCategory>,

    /// Keyword fallbacks for deduction-kind entries, checked in this fixed
    /// priority order; first match wins.
    #[serde(default)]
    pub social_security: Vec<String>,
    #[serde(default)]
    pub withholding: Vec<String>,
    #[serde(default)]
    pub alimony: Vec<String>,
    #[serde(default)]
    pub health_plan: Vec<String>,

    /// Rubric codes that identify thirteenth-salary earnings.
    #[serde(default)]
    pub thirteenth: HashSet<String>,
}

impl Default for RubricMap {
    fn default() -> Self {
        let mut exact = HashMap::new();
        exact.insert("INSS".to_string(), EntryCategory::SocialSecurity);
        exact.insert("IRRF".to_string(), EntryCategory::Withholding);
        exact.insert("PENSAO".to_string(), EntryCategory::Alimony);
        exact.insert("PLANOSAUDE".to_string(), EntryCategory::HealthPlan);
        exact.insert("AJUDACUSTO".to_string(), EntryCategory::ExemptIncome);
        exact.insert("DIARIAS".to_string(), EntryCategory::ExemptIncome);

        Self {
            exact,
            social_security: vec![
                "INSS".to_string(),
                "PREV".to_string(),
                "RGPS".to_string(),
                "RPPS".to_string(),
            ],
            withholding: vec!["IRRF".to_string(), "IRF".to_string()],
            alimony: vec!["PENSAO".to_string(), "ALIMENT".to_string()],
            health_plan: vec![
                "SAUDE".to_string(),
                "ODONTO".to_string(),
                "MEDIC".to_string(),
                "PLANO".to_string(),
            ],
            thirteenth: ["13SAL", "DEC13", "GRAT13", "ADTO13"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl RubricMap {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let map: RubricMap = toml::from_str(&content)?;
        Ok(map)
    }

    /// Classifies one itemized entry. Total over `RubricKind`; the
    /// unclassifiable remainder routes to the documented defaults
    /// (other-deductions for discounts, taxable income for earnings), never
    /// to an error.
    pub fn classify(&self, kind: RubricKind, rubric_code: &str) -> EntryCategory {
        match kind {
            RubricKind::Earning => self.classify_earning(rubric_code),
            RubricKind::Deduction => self.classify_deduction(rubric_code),
        }
    }

    fn classify_earning(&self, rubric_code: &str) -> EntryCategory {
        let code = normalize(rubric_code);

        if self.exact.get(&code) == Some(&EntryCategory::ExemptIncome) {
            return EntryCategory::ExemptIncome;
        }
        if self.is_thirteenth(&code) {
            return EntryCategory::ThirteenthIncome;
        }
        EntryCategory::TaxableIncome
    }

    fn classify_deduction(&self, rubric_code: &str) -> EntryCategory {
        let code = normalize(rubric_code);

        if let Some(&category) = self.exact.get(&code) {
            if category != EntryCategory::ExemptIncome
                && category != EntryCategory::TaxableIncome
                && category != EntryCategory::ThirteenthIncome
            {
                return category;
            }
        }

        for (keywords, category) in [
            (&self.social_security, EntryCategory::SocialSecurity),
            (&self.withholding, EntryCategory::Withholding),
            (&self.alimony, EntryCategory::Alimony),
            (&self.health_plan, EntryCategory::HealthPlan),
        ] {
            if keywords.iter().any(|k| code.contains(k.as_str())) {
                return category;
            }
        }

        EntryCategory::OtherDeduction
    }

    /// Free-text lookup for entries whose type code is the generic "other"
    /// category; `None` means the caller should apply its sign-based default.
    pub fn classify_generic(&self, rubric_code: &str) -> Option<EntryCategory> {
        let code = normalize(rubric_code);

        if let Some(&category) = self.exact.get(&code) {
            return Some(category);
        }
        if self.is_thirteenth(&code) {
            return Some(EntryCategory::ThirteenthIncome);
        }

        for (keywords, category) in [
            (&self.social_security, EntryCategory::SocialSecurity),
            (&self.withholding, EntryCategory::Withholding),
            (&self.alimony, EntryCategory::Alimony),
            (&self.health_plan, EntryCategory::HealthPlan),
        ] {
            if keywords.iter().any(|k| code.contains(k.as_str())) {
                return Some(category);
            }
        }

        None
    }

    /// Thirteenth-salary test: the exact code set first, then a
    /// token-boundary match on "13" so codes like 5130 or 2013 do not
    /// false-positive the way a bare substring check did.
    pub fn is_thirteenth(&self, rubric_code: &str) -> bool {
        let code = normalize(rubric_code);

        if self.thirteenth.contains(&code) {
            return true;
        }
        thirteenth_token().is_match(&code)
    }
}

fn normalize(code: &str) -> String {
    code.trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

fn thirteenth_token() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"(^|[^0-9])13([^0-9]|$)").expect("valid regex"))
}
