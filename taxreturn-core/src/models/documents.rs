//! Source documents reported to the taxpayer.
//!
//! Field comments give the box on the paper form. Every amount defaults to
//! zero so profiles only need to list the boxes that are filled in.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Form W-2, Wage and Tax Statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormW2 {
    pub employer_name: String,
    /// Box 1
    pub wages: Decimal,
    /// Box 2
    pub federal_tax_withheld: Decimal,
    /// Box 3
    pub ss_wages: Decimal,
    /// Box 5
    pub medicare_wages: Decimal,
}

/// Form 1099-INT, Interest Income.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099Int {
    pub payer_name: String,
    /// Box 1
    pub interest_income: Decimal,
    /// Box 8
    pub tax_exempt_interest: Decimal,
    /// Box 4
    pub federal_tax_withheld: Decimal,
}

/// Form 1099-DIV, Dividends and Distributions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099Div {
    pub payer_name: String,
    /// Box 1a
    pub ordinary_dividends: Decimal,
    /// Box 1b
    pub qualified_dividends: Decimal,
    /// Box 2a
    pub capital_gain_distributions: Decimal,
    /// Box 4
    pub federal_tax_withheld: Decimal,
}

/// Form 1099-B summary, split by holding period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099B {
    pub broker_name: String,
    pub st_proceeds: Decimal,
    pub st_cost_basis: Decimal,
    pub lt_proceeds: Decimal,
    pub lt_cost_basis: Decimal,
    /// Box 4
    pub federal_tax_withheld: Decimal,
}

impl Form1099B {
    pub fn net_short_term(&self) -> Decimal {
        self.st_proceeds - self.st_cost_basis
    }

    pub fn net_long_term(&self) -> Decimal {
        self.lt_proceeds - self.lt_cost_basis
    }
}

/// Form 1099-NEC, Nonemployee Compensation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099Nec {
    pub payer_name: String,
    /// Box 1
    pub nonemployee_compensation: Decimal,
    /// Box 4
    pub federal_tax_withheld: Decimal,
}

/// Schedule K-1 (Form 1065), Partner's Share of Income.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleK1 {
    pub partnership_name: String,
    /// Box 1
    pub ordinary_business_income: Decimal,
    /// Box 2
    pub net_rental_income: Decimal,
    /// Box 3
    pub other_net_rental_income: Decimal,
    /// Box 4
    pub guaranteed_payments: Decimal,
    /// Box 5
    pub interest_income: Decimal,
    /// Box 6a
    pub dividends: Decimal,
    /// Box 6b
    pub qualified_dividends: Decimal,
    /// Box 7
    pub royalties: Decimal,
    /// Box 8
    pub net_short_term_capital_gain: Decimal,
    /// Box 9a
    pub net_long_term_capital_gain: Decimal,
    /// Box 10
    pub net_section_1231_gain: Decimal,
    /// Box 11
    pub other_income: Decimal,
    /// Box 12
    pub section_179_deduction: Decimal,
    /// Box 13
    pub other_deductions: Decimal,
    /// Box 14
    pub self_employment_earnings: Decimal,
    /// Box 20, code Z
    pub qbi_amount: Decimal,
    pub qbi_w2_wages: Decimal,
    pub qbi_ubia: Decimal,
    /// Specified service trade or business; excluded from the §199A deduction.
    pub is_sstb: bool,
}

impl ScheduleK1 {
    pub fn has_capital_activity(&self) -> bool {
        !self.net_short_term_capital_gain.is_zero()
            || !self.net_long_term_capital_gain.is_zero()
            || !self.net_section_1231_gain.is_zero()
    }
}
