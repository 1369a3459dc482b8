//! Next-year estimated tax payments (Form 1040-ES).
//!
//! | Line | Description |
//! |------|-------------|
//! | 11c  | Expected tax: this year's total tax less refundable credits |
//! | 12a  | Line 11c × 90% |
//! | 12b  | Prior year's tax × 100% (110% above the AGI threshold) |
//! | 12c  | Required annual payment: smaller of 12a and 12b |
//! | 13   | Expected withholding |
//! | 14a  | Line 12c − Line 13 (no payments required if ≤ 0) |
//! | 14b  | Line 11c − Line 13 (no payments required if under $1,000) |
//!
//! This year's return is the basis for next year: its total tax stands in
//! for the expected tax and its withholding for expected withholding.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{EstimatedTaxConfig, FilingStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedTaxInput {
    pub total_tax: Decimal,
    pub refundable_credits: Decimal,
    /// Tax shown on the prior year's return; zero when there was none.
    pub prior_year_tax: Decimal,
    pub agi: Decimal,
    pub withholding: Decimal,
}

/// Which safe harbor sets the required annual payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafeHarbor {
    #[default]
    CurrentYear,
    PriorYear,
    /// 110% of the prior year's tax for high-AGI filers.
    PriorYearHighIncome,
}

impl std::fmt::Display for SafeHarbor {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(match self {
            Self::CurrentYear => "90% of current year tax",
            Self::PriorYear => "100% of prior year tax",
            Self::PriorYearHighIncome => "110% of prior year tax",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyPayment {
    pub quarter: u8,
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedTaxPlan {
    pub expected_tax: Decimal,
    pub safe_harbor_current_year: Decimal,
    /// `None` when there is no prior-year tax to base a safe harbor on.
    pub safe_harbor_prior_year: Option<Decimal>,
    pub method: SafeHarbor,
    pub required_annual_payment: Decimal,
    /// Required payment not covered by withholding.
    pub underpayment: Decimal,
    pub estimated_payments_required: bool,
    pub payments: Vec<QuarterlyPayment>,
}

impl EstimatedTaxPlan {
    pub fn quarterly_amount(&self) -> Decimal {
        self.payments
            .first()
            .map(|p| p.amount)
            .unwrap_or_default()
    }
}

/// Calculator for next year's estimated payments.
#[derive(Debug, Clone)]
pub struct EstimatedTaxPlanner<'a> {
    config: &'a EstimatedTaxConfig,
}

impl<'a> EstimatedTaxPlanner<'a> {
    pub fn new(config: &'a EstimatedTaxConfig) -> Self {
        Self { config }
    }

    pub fn plan(
        &self,
        input: &EstimatedTaxInput,
        filing_status: FilingStatus,
    ) -> EstimatedTaxPlan {
        let expected_tax = self.expected_tax(input.total_tax, input.refundable_credits);
        let safe_harbor_current_year = self.current_year_harbor(expected_tax);
        let prior = self.prior_year_harbor(input.prior_year_tax, input.agi, filing_status);

        let (method, required_annual_payment) = match prior {
            Some((method, amount)) if amount <= safe_harbor_current_year => (method, amount),
            _ => (SafeHarbor::CurrentYear, safe_harbor_current_year),
        };

        let underpayment = self.underpayment(required_annual_payment, input.withholding);
        let balance = self.balance_after_withholding(expected_tax, input.withholding);
        let estimated_payments_required =
            self.are_payments_required(underpayment, balance);

        let payments = self.schedule(if estimated_payments_required {
            underpayment
        } else {
            Decimal::ZERO
        });

        debug!(
            %expected_tax,
            %required_annual_payment,
            %method,
            estimated_payments_required,
            "Estimated tax plan computed"
        );

        EstimatedTaxPlan {
            expected_tax,
            safe_harbor_current_year,
            safe_harbor_prior_year: prior.map(|(_, amount)| amount),
            method,
            required_annual_payment,
            underpayment,
            estimated_payments_required,
            payments,
        }
    }

    fn expected_tax(
        &self,
        total_tax: Decimal,
        refundable_credits: Decimal,
    ) -> Decimal {
        non_negative(round_half_up(total_tax - refundable_credits))
    }

    fn current_year_harbor(
        &self,
        expected_tax: Decimal,
    ) -> Decimal {
        round_half_up(expected_tax * self.config.current_year_rate)
    }

    fn prior_year_harbor(
        &self,
        prior_year_tax: Decimal,
        agi: Decimal,
        filing_status: FilingStatus,
    ) -> Option<(SafeHarbor, Decimal)> {
        if prior_year_tax <= Decimal::ZERO {
            return None;
        }
        let (method, rate) = if agi > *self.config.high_income_threshold.get(filing_status) {
            (
                SafeHarbor::PriorYearHighIncome,
                self.config.high_income_prior_year_rate,
            )
        } else {
            (SafeHarbor::PriorYear, self.config.prior_year_rate)
        };
        Some((method, round_half_up(prior_year_tax * rate)))
    }

    fn underpayment(
        &self,
        required_annual_payment: Decimal,
        withholding: Decimal,
    ) -> Decimal {
        non_negative(round_half_up(required_annual_payment - withholding))
    }

    fn balance_after_withholding(
        &self,
        expected_tax: Decimal,
        withholding: Decimal,
    ) -> Decimal {
        non_negative(round_half_up(expected_tax - withholding))
    }

    fn are_payments_required(
        &self,
        underpayment: Decimal,
        balance: Decimal,
    ) -> bool {
        underpayment > Decimal::ZERO && balance >= self.config.required_payment_threshold
    }

    /// Splits `annual` over the four due dates; the last payment absorbs the
    /// rounding remainder.
    fn schedule(
        &self,
        annual: Decimal,
    ) -> Vec<QuarterlyPayment> {
        let quarterly = round_half_up(annual / Decimal::from(4));
        self.config
            .due_dates
            .iter()
            .zip(1u8..)
            .map(|(&due_date, quarter)| QuarterlyPayment {
                quarter,
                due_date,
                amount: if quarter == 4 {
                    annual - quarterly * Decimal::from(3)
                } else {
                    quarterly
                },
            })
            .collect()
    }
}
