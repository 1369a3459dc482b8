//! Schedule SE, Self-Employment Tax.
//!
//! # Schedule Structure
//!
//! | Line | Description |
//! |------|-------------|
//! | 3    | Net earnings: Schedule C profit plus K-1 self-employment earnings |
//! | 4a   | Line 3 × 92.35% (net earnings factor) |
//! | 7    | Maximum earnings subject to social security tax |
//! | 8a   | W-2 social security wages |
//! | 9    | Line 7 minus Line 8a (floored at zero) |
//! | 10   | Social security tax: smaller of Line 4a or Line 9 × 12.4% |
//! | 11   | Medicare tax: Line 4a × 2.9% |
//! | 12   | Self-employment tax: Line 10 + Line 11 |
//! | 13   | Deductible part of SE tax: Line 12 × 50% |
//!
//! # Minimum Threshold
//!
//! Net earnings under $400 owe no self-employment tax; earnings of exactly
//! $400 are taxed. The threshold is [`SeWorksheetConfig::min_se_threshold`].
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use taxreturn_core::calculations::schedules::{SeWorksheet, SeWorksheetConfig};
//!
//! let config = SeWorksheetConfig {
//!     ss_wage_max: dec!(176100.00),
//!     ss_tax_rate: dec!(0.124),
//!     medicare_tax_rate: dec!(0.029),
//!     net_earnings_factor: dec!(0.9235),
//!     deduction_factor: dec!(0.50),
//!     min_se_threshold: dec!(400.00),
//! };
//!
//! let result = SeWorksheet::new(config)
//!     .calculate(dec!(100000.00), dec!(0.00))
//!     .unwrap();
//!
//! assert_eq!(result.se_tax, dec!(14129.55));
//! assert_eq!(result.deductible_se_tax, dec!(7064.78));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::LineItem;

const FORM: &str = "Schedule SE";

/// Errors from invalid self-employment tax parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeWorksheetError {
    /// The net earnings factor must be in (0, 1].
    #[error("net earnings factor must be between 0 and 1, got {0}")]
    InvalidNetEarningsFactor(Decimal),

    #[error("social security tax rate must be between 0 and 1, got {0}")]
    InvalidSocialSecurityRate(Decimal),

    #[error("medicare tax rate must be between 0 and 1, got {0}")]
    InvalidMedicareRate(Decimal),

    #[error("deduction factor must be between 0 and 1, got {0}")]
    InvalidDeductionFactor(Decimal),

    #[error("social security wage maximum must be positive, got {0}")]
    InvalidSsWageMax(Decimal),

    #[error("minimum SE threshold must be non-negative, got {0}")]
    InvalidMinSeThreshold(Decimal),
}

/// Self-employment tax parameters for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeWorksheetConfig {
    /// Social security wage base (Line 7). $176,100 for 2025.
    pub ss_wage_max: Decimal,

    /// Combined employer and employee social security rate, 12.4%.
    pub ss_tax_rate: Decimal,

    /// Combined employer and employee Medicare rate, 2.9%.
    pub medicare_tax_rate: Decimal,

    /// Share of net earnings subject to SE tax (Line 4a multiplier), 92.35%.
    pub net_earnings_factor: Decimal,

    /// Deductible share of SE tax (Line 13 multiplier), 50%.
    pub deduction_factor: Decimal,

    /// Net earnings below this amount owe no SE tax.
    pub min_se_threshold: Decimal,
}

impl SeWorksheetConfig {
    /// Checks every rate is a fraction and every amount is in range.
    ///
    /// # Errors
    ///
    /// Returns the first [`SeWorksheetError`] found.
    pub fn validate(&self) -> Result<(), SeWorksheetError> {
        if self.net_earnings_factor <= Decimal::ZERO || self.net_earnings_factor > Decimal::ONE {
            return Err(SeWorksheetError::InvalidNetEarningsFactor(
                self.net_earnings_factor,
            ));
        }
        if !is_fraction(self.ss_tax_rate) {
            return Err(SeWorksheetError::InvalidSocialSecurityRate(
                self.ss_tax_rate,
            ));
        }
        if !is_fraction(self.medicare_tax_rate) {
            return Err(SeWorksheetError::InvalidMedicareRate(
                self.medicare_tax_rate,
            ));
        }
        if !is_fraction(self.deduction_factor) {
            return Err(SeWorksheetError::InvalidDeductionFactor(
                self.deduction_factor,
            ));
        }
        if self.ss_wage_max <= Decimal::ZERO {
            return Err(SeWorksheetError::InvalidSsWageMax(self.ss_wage_max));
        }
        if self.min_se_threshold < Decimal::ZERO {
            return Err(SeWorksheetError::InvalidMinSeThreshold(
                self.min_se_threshold,
            ));
        }
        Ok(())
    }
}

fn is_fraction(value: Decimal) -> bool {
    (Decimal::ZERO..=Decimal::ONE).contains(&value)
}

/// Computed Schedule SE.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSeResult {
    /// Line 3.
    pub net_se_earnings: Decimal,
    /// Line 4a.
    pub taxable_se_earnings: Decimal,
    /// Line 9.
    pub remaining_ss_base: Decimal,
    /// Smaller of Line 4a and Line 9.
    pub ss_taxable_earnings: Decimal,
    /// Line 10.
    pub social_security_tax: Decimal,
    /// Line 11.
    pub medicare_tax: Decimal,
    /// Line 12.
    pub se_tax: Decimal,
    /// Line 13, carried to Schedule 1 line 15.
    pub deductible_se_tax: Decimal,
    /// Net earnings were under the minimum, so no tax is due.
    pub below_threshold: bool,
    pub lines: Vec<LineItem>,
}

/// Calculator for Schedule SE.
#[derive(Debug, Clone)]
pub struct SeWorksheet {
    config: SeWorksheetConfig,
}

impl SeWorksheet {
    pub fn new(config: SeWorksheetConfig) -> Self {
        Self { config }
    }

    /// Computes self-employment tax on `net_se_earnings`, coordinating the
    /// social security wage base with `w2_ss_wages` already taxed through
    /// payroll.
    ///
    /// # Errors
    ///
    /// Returns [`SeWorksheetError`] if the configuration is invalid.
    pub fn calculate(
        &self,
        net_se_earnings: Decimal,
        w2_ss_wages: Decimal,
    ) -> Result<ScheduleSeResult, SeWorksheetError> {
        self.config.validate()?;

        let net_se_earnings = round_half_up(net_se_earnings);
        let mut lines = vec![
            LineItem::new(FORM, "3", "Net SE earnings", net_se_earnings)
                .with_explanation("Combined net profit from Schedule C + K-1 SE earnings"),
        ];

        if net_se_earnings < self.config.min_se_threshold {
            warn!(
                net_se_earnings = %net_se_earnings,
                threshold = %self.config.min_se_threshold,
                "SE earnings below minimum threshold; no SE tax due"
            );
            lines.push(
                LineItem::new(FORM, "4", "No SE tax required", Decimal::ZERO).with_explanation(
                    format!("Net SE earnings under ${}", self.config.min_se_threshold.normalize()),
                ),
            );
            return Ok(ScheduleSeResult {
                net_se_earnings,
                below_threshold: true,
                lines,
                ..ScheduleSeResult::default()
            });
        }

        let taxable_se_earnings = self.taxable_se_earnings(net_se_earnings);
        lines.push(
            LineItem::new(FORM, "4a", "Multiply Line 3 by 92.35%", taxable_se_earnings)
                .with_explanation(format!(
                    "${net_se_earnings} × {} = ${taxable_se_earnings}",
                    self.config.net_earnings_factor
                )),
        );

        let remaining_ss_base = self.remaining_ss_wage_base(w2_ss_wages);
        let ss_taxable_earnings = taxable_se_earnings.min(remaining_ss_base);
        let social_security_tax = self.social_security_tax(ss_taxable_earnings);
        lines.push(
            LineItem::new(FORM, "10", "Social Security tax", social_security_tax).with_explanation(
                format!(
                    "min(${taxable_se_earnings}, ${remaining_ss_base}) × {}",
                    self.config.ss_tax_rate
                ),
            ),
        );

        let medicare_tax = self.medicare_tax(taxable_se_earnings);
        lines.push(
            LineItem::new(FORM, "11", "Medicare tax", medicare_tax).with_explanation(format!(
                "${taxable_se_earnings} × {}",
                self.config.medicare_tax_rate
            )),
        );

        let se_tax = round_half_up(social_security_tax + medicare_tax);
        lines.push(
            LineItem::new(FORM, "12", "Self-employment tax", se_tax).with_explanation(format!(
                "SS tax ${social_security_tax} + Medicare ${medicare_tax}"
            )),
        );

        let deductible_se_tax = self.se_tax_deduction(se_tax);
        lines.push(
            LineItem::new(FORM, "13", "Deductible part of SE tax", deductible_se_tax)
                .with_explanation("Carried to Schedule 1, Line 15")
                .with_reference("https://www.irs.gov/instructions/i1040sse"),
        );

        debug!(
            %net_se_earnings,
            %se_tax,
            %deductible_se_tax,
            "Schedule SE computed"
        );

        Ok(ScheduleSeResult {
            net_se_earnings,
            taxable_se_earnings,
            remaining_ss_base,
            ss_taxable_earnings,
            social_security_tax,
            medicare_tax,
            se_tax,
            deductible_se_tax,
            below_threshold: false,
            lines,
        })
    }

    /// # Form Reference
    ///
    /// Line 4a: Multiply line 3 by 92.35% (0.9235)
    fn taxable_se_earnings(
        &self,
        net_se_earnings: Decimal,
    ) -> Decimal {
        round_half_up(net_se_earnings * self.config.net_earnings_factor)
    }

    /// Wage base left after W-2 social security wages.
    ///
    /// # Form Reference
    ///
    /// - Line 7: Maximum earnings subject to social security tax
    /// - Line 8a: Total social security wages
    /// - Line 9: Line 7 minus Line 8a (if zero or less, skip Line 10)
    fn remaining_ss_wage_base(
        &self,
        w2_ss_wages: Decimal,
    ) -> Decimal {
        let remaining = self.config.ss_wage_max - w2_ss_wages;
        if remaining <= Decimal::ZERO {
            warn!(
                ss_wage_max = %self.config.ss_wage_max,
                w2_ss_wages = %w2_ss_wages,
                "W-2 wages exhaust the social security wage base; no SS tax on SE earnings"
            );
        }
        non_negative(round_half_up(remaining))
    }

    /// # Form Reference
    ///
    /// Line 10: Smaller of line 4a or line 9, multiplied by 12.4%
    fn social_security_tax(
        &self,
        ss_taxable_earnings: Decimal,
    ) -> Decimal {
        round_half_up(ss_taxable_earnings * self.config.ss_tax_rate)
    }

    /// Medicare applies to all taxable SE earnings without a wage base.
    ///
    /// # Form Reference
    ///
    /// Line 11: Multiply line 4a by 2.9% (0.029)
    fn medicare_tax(
        &self,
        taxable_se_earnings: Decimal,
    ) -> Decimal {
        round_half_up(taxable_se_earnings * self.config.medicare_tax_rate)
    }

    /// # Form Reference
    ///
    /// Line 13: Multiply line 12 by 50% (0.50)
    fn se_tax_deduction(
        &self,
        se_tax: Decimal,
    ) -> Decimal {
        round_half_up(se_tax * self.config.deduction_factor)
    }
}
