use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    Business, FilingStatus, Form1099B, Form1099Div, Form1099Int, Form1099Nec, FormW2, ScheduleK1,
};

pub const DEFAULT_TAX_YEAR: i32 = 2025;

fn default_tax_year() -> i32 {
    DEFAULT_TAX_YEAR
}

/// Everything known about one taxpayer for one tax year.
///
/// The engine only reads a profile. Field-level validation (identifier
/// formats, non-negative amounts) happens before a profile reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxpayerProfile {
    pub first_name: String,
    pub last_name: String,
    #[serde(default = "default_tax_year")]
    pub tax_year: i32,
    pub filing_status: FilingStatus,
    pub taxpayer_age: u32,
    /// Two-letter state of the mailing address.
    pub state: String,
    pub country: String,
    pub foreign_address: bool,

    pub forms_w2: Vec<FormW2>,
    pub forms_1099_int: Vec<Form1099Int>,
    pub forms_1099_div: Vec<Form1099Div>,
    pub forms_1099_b: Vec<Form1099B>,
    pub forms_1099_nec: Vec<Form1099Nec>,
    pub schedule_k1s: Vec<ScheduleK1>,
    pub businesses: Vec<Business>,
    pub dependents: Vec<Dependent>,

    pub estimated_payments: Vec<EstimatedPayment>,
    pub health_insurance: Option<HealthInsurance>,
    pub prior_year_tax: Decimal,

    pub uses_itemized_deductions: bool,
    /// State and local taxes deducted on Schedule A.
    pub state_local_tax_deduction: Decimal,

    pub foreign_residency: ForeignResidency,
    pub colorado: ColoradoInputs,
}

impl Default for TaxpayerProfile {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            tax_year: DEFAULT_TAX_YEAR,
            filing_status: FilingStatus::default(),
            taxpayer_age: 0,
            state: String::new(),
            country: String::new(),
            foreign_address: false,
            forms_w2: Vec::new(),
            forms_1099_int: Vec::new(),
            forms_1099_div: Vec::new(),
            forms_1099_b: Vec::new(),
            forms_1099_nec: Vec::new(),
            schedule_k1s: Vec::new(),
            businesses: Vec::new(),
            dependents: Vec::new(),
            estimated_payments: Vec::new(),
            health_insurance: None,
            prior_year_tax: Decimal::ZERO,
            uses_itemized_deductions: false,
            state_local_tax_deduction: Decimal::ZERO,
            foreign_residency: ForeignResidency::default(),
            colorado: ColoradoInputs::default(),
        }
    }
}

impl TaxpayerProfile {
    pub fn new(filing_status: FilingStatus) -> Self {
        Self {
            filing_status,
            ..Self::default()
        }
    }

    pub fn total_estimated_payments(&self) -> Decimal {
        self.estimated_payments.iter().map(|p| p.amount).sum()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependent {
    pub first_name: String,
    pub last_name: String,
    pub relationship: String,
    /// Under 17 with a valid SSN; otherwise counts toward the other-dependent credit.
    pub is_qualifying_child_ctc: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatedPayment {
    pub quarter: u8,
    pub date_paid: Option<NaiveDate>,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthInsurance {
    pub provider: String,
    pub total_premiums: Decimal,
    pub months_covered: u32,
}

impl Default for HealthInsurance {
    fn default() -> Self {
        Self {
            provider: String::new(),
            total_premiums: Decimal::ZERO,
            months_covered: 12,
        }
    }
}

/// Day counts for the Form 2555 physical presence test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignResidency {
    pub country: String,
    pub days_in_foreign_country: u32,
    pub days_in_us: u32,
}

/// Inputs that only matter to the Colorado return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColoradoInputs {
    pub has_filing_obligation: bool,
    pub tabor_refund: Decimal,
    pub pension_income: Decimal,
    /// Colorado-source income when it is known directly; otherwise it is
    /// derived from the K-1s.
    pub source_income: Option<Decimal>,
}
