use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Employer identification taken from the event's `ideEmpregador` block.
/// Produced once per source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerIdentity {
    pub tax_id: String,
    pub kind: TaxIdKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxIdKind {
    Cnpj,
    Cpf,
}

/// One line of the income-tax withholding receipt, keyed by
/// `(cpf, calendar_year)`. Every monetary field is a non-negative
/// accumulator; entries with a negative sign in the source are folded in
/// by absolute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficiaryRecord {
    pub cpf: String,
    pub name: String,
    pub calendar_year: String,
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

impl BeneficiaryRecord {
    pub fn new(cpf: impl Into<String>, name: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            cpf: cpf.into(),
            name: name.into(),
            calendar_year: year.into(),
            taxable_income: Decimal::ZERO,
            social_security_contribution: Decimal::ZERO,
            withholding_tax: Decimal::ZERO,
            alimony_deduction: Decimal::ZERO,
            thirteenth_salary_income: Decimal::ZERO,
            thirteenth_salary_withholding_tax: Decimal::ZERO,
            other_deductions: Decimal::ZERO,
            exempt_income: Decimal::ZERO,
            health_plan_deduction: Decimal::ZERO,
        }
    }

    /// A record with every accumulator at zero is still valid (a declared
    /// beneficiary with no classified entries) but worth flagging upstream.
    pub fn is_all_zero(&self) -> bool {
        self.taxable_income.is_zero()
            && self.social_security_contribution.is_zero()
            && self.withholding_tax.is_zero()
            && self.alimony_deduction.is_zero()
            && self.thirteenth_salary_income.is_zero()
            && self.thirteenth_salary_withholding_tax.is_zero()
            && self.other_deductions.is_zero()
            && self.exempt_income.is_zero()
            && self.health_plan_deduction.is_zero()
    }

    /// Additive merge used across separate source documents. Amounts from
    /// distinct documents cover disjoint payment periods, so they sum;
    /// the intra-document max-merge lives in the extractors.
    pub fn merge_add(&mut self, other: &BeneficiaryRecord) {
        if other.name.len() > self.name.len() {
            self.name = other.name.clone();
        }
        self.taxable_income += other.taxable_income;
        self.social_security_contribution += other.social_security_contribution;
        self.withholding_tax += other.withholding_tax;
        self.alimony_deduction += other.alimony_deduction;
        self.thirteenth_salary_income += other.thirteenth_salary_income;
        self.thirteenth_salary_withholding_tax += other.thirteenth_salary_withholding_tax;
        self.other_deductions += other.other_deductions;
        self.exempt_income += other.exempt_income;
        self.health_plan_deduction += other.health_plan_deduction;
    }
}

/// Whether an itemized rubric pays the beneficiary or discounts from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RubricKind {
    Earning,
    Deduction,
}

/// Transient itemized entry flattened out of one document's payment blocks.
/// Consumed immediately by the classification fold; never persisted.
#[derive(Debug, Clone)]
pub struct RawRubricEntry {
    pub kind: RubricKind,
    pub type_code: String,
    pub rubric_code: String,
    pub amount: Decimal,
}

/// Closed classification outcome for one rubric entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryCategory {
    TaxableIncome,
    ThirteenthIncome,
    ExemptIncome,
    SocialSecurity,
    Withholding,
    Alimony,
    HealthPlan,
    OtherDeduction,
}

/// The two known S-1210 layouts, resolved once by the schema detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaVariant {
    /// Legacy layout: `evtPgtos`, multiple beneficiaries per document.
    VariantA,
    /// Current layout: `evtIrrfBenef`, one beneficiary with an itemized
    /// demonstrative.
    VariantB,
    Unknown,
}

/// Structural validation outcome, surfaced verbatim to the operator.
/// `valid` is true iff `errors` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.valid = false;
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw XML text of one uploaded document, tagged with its origin for
/// error reporting.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub xml: String,
}

/// Per-document result: either extracted records, or the validation errors
/// explaining why there are none. Never a silent drop.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub source: String,
    pub variant: SchemaVariant,
    pub employer: Option<EmployerIdentity>,
    pub report: ValidationReport,
    pub records: Vec<BeneficiaryRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformResult {
    pub outcomes: Vec<DocumentOutcome>,
    pub consolidated: Vec<BeneficiaryRecord>,
}
