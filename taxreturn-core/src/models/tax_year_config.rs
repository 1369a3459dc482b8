//! Per-year rates, thresholds and deduction amounts.
//!
//! Everything the engines need for one tax year lives in [`TaxYearConfig`].
//! Tables that differ by filing status are stored as [`PerStatus`] so every
//! status always has a value.
//!
//! # Supported Years
//!
//! | Year | Source |
//! |------|--------|
//! | 2025 | Rev. Proc. 2024-40 as amended for 2025 |

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::schedules::{SeWorksheetConfig, SeWorksheetError};
use crate::models::{FilingStatus, PerStatus, TaxBracket};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no built-in tables for tax year {0}")]
    UnsupportedTaxYear(i32),

    #[error("bracket table for {0} is empty")]
    EmptyBracketTable(FilingStatus),

    #[error("bracket table for {status} is not contiguous at {at}")]
    NonContiguousBrackets { status: FilingStatus, at: Decimal },

    #[error("bracket table for {0} has no open-ended top bracket")]
    MissingTopBracket(FilingStatus),

    #[error("invalid calendar date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("self-employment parameters: {0}")]
    SelfEmployment(#[from] SeWorksheetError),
}

/// Rate plus per-status threshold for the flat surtaxes (Forms 8959, 8960).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurtaxConfig {
    pub rate: Decimal,
    pub threshold: PerStatus<Decimal>,
}

/// §199A parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QbiConfig {
    pub deduction_rate: Decimal,
    pub threshold: PerStatus<Decimal>,
    pub phaseout_range: PerStatus<Decimal>,
    pub wage_limit_rate: Decimal,
    pub wage_and_capital_wage_rate: Decimal,
    pub wage_and_capital_ubia_rate: Decimal,
}

/// Preferential-rate bands and the capital loss limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsConfig {
    /// Top of the 0% band, measured in total taxable income.
    pub zero_rate_max: PerStatus<Decimal>,
    /// Top of the 15% band, measured in total taxable income.
    pub fifteen_rate_max: PerStatus<Decimal>,
    pub fifteen_rate: Decimal,
    pub twenty_rate: Decimal,
    pub loss_limit: PerStatus<Decimal>,
}

/// Form 6251 parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmtConfig {
    pub exemption: PerStatus<Decimal>,
    pub phaseout_start: PerStatus<Decimal>,
    pub phaseout_rate: Decimal,
    pub low_rate: Decimal,
    pub high_rate: Decimal,
    pub breakpoint: PerStatus<Decimal>,
}

/// Schedule 8812 parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditConfig {
    pub child_credit: Decimal,
    pub other_dependent_credit: Decimal,
    pub phaseout_threshold: PerStatus<Decimal>,
    pub phaseout_step: Decimal,
    pub phaseout_per_step: Decimal,
    pub refundable_per_child: Decimal,
    pub earned_income_threshold: Decimal,
    pub earned_income_rate: Decimal,
}

/// Form 2555 parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeieConfig {
    pub exclusion_limit: Decimal,
    pub physical_presence_days: u32,
}

/// Schedule C rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub meals_deduction_rate: Decimal,
    pub home_office_rate: Decimal,
    pub home_office_max_sqft: Decimal,
}

/// Form 1040-ES safe-harbor parameters for the following year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedTaxConfig {
    pub current_year_rate: Decimal,
    pub prior_year_rate: Decimal,
    pub high_income_prior_year_rate: Decimal,
    pub high_income_threshold: PerStatus<Decimal>,
    pub required_payment_threshold: Decimal,
    pub due_dates: [NaiveDate; 4],
}

/// SEP-IRA parameters used by the recommendation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirementConfig {
    pub sep_contribution_rate: Decimal,
    pub sep_limit: Decimal,
    pub sep_min_se_income: Decimal,
}

/// Colorado Form 104 parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColoradoConfig {
    pub state_code: String,
    pub tax_rate: Decimal,
    pub pension_min_age: u32,
    pub pension_senior_age: u32,
    pub pension_subtraction: Decimal,
    pub pension_subtraction_senior: Decimal,
}

/// Every constant the return engine uses for a single tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub tax_year: i32,
    pub brackets: PerStatus<Vec<TaxBracket>>,
    pub standard_deduction: PerStatus<Decimal>,
    pub self_employment: SeWorksheetConfig,
    pub additional_medicare: SurtaxConfig,
    pub niit: SurtaxConfig,
    pub qbi: QbiConfig,
    pub capital_gains: CapitalGainsConfig,
    pub amt: AmtConfig,
    pub credits: CreditConfig,
    pub feie: FeieConfig,
    pub business: BusinessConfig,
    pub estimated_tax: EstimatedTaxConfig,
    pub retirement: RetirementConfig,
    pub colorado: ColoradoConfig,
}

impl TaxYearConfig {
    /// Returns the built-in tables for `year`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedTaxYear`] for any year without built-in tables.
    pub fn for_year(year: i32) -> Result<Self, ConfigError> {
        match year {
            2025 => Self::tax_year_2025(),
            other => Err(ConfigError::UnsupportedTaxYear(other)),
        }
    }

    /// Replaces the ordinary-income bracket tables, e.g. with tables loaded
    /// from the published rate schedules.
    pub fn with_bracket_tables(
        mut self,
        brackets: PerStatus<Vec<TaxBracket>>,
    ) -> Self {
        self.brackets = brackets;
        self
    }

    pub fn brackets_for(
        &self,
        status: FilingStatus,
    ) -> &[TaxBracket] {
        self.brackets.get(status)
    }

    /// Checks the bracket tables and self-employment parameters.
    ///
    /// Each bracket table must be non-empty, start at zero, have each lower
    /// bound equal the previous upper bound, and end with an open bracket.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (status, table) in self.brackets.iter() {
            validate_brackets(status, table)?;
        }
        self.self_employment.validate()?;
        Ok(())
    }

    fn tax_year_2025() -> Result<Self, ConfigError> {
        let single = TaxBracket::schedule(&[
            (Some(dec!(11925)), dec!(0.10)),
            (Some(dec!(48475)), dec!(0.12)),
            (Some(dec!(103350)), dec!(0.22)),
            (Some(dec!(197300)), dec!(0.24)),
            (Some(dec!(250525)), dec!(0.32)),
            (Some(dec!(626350)), dec!(0.35)),
            (None, dec!(0.37)),
        ]);
        let joint = TaxBracket::schedule(&[
            (Some(dec!(23850)), dec!(0.10)),
            (Some(dec!(96950)), dec!(0.12)),
            (Some(dec!(206700)), dec!(0.22)),
            (Some(dec!(394600)), dec!(0.24)),
            (Some(dec!(501050)), dec!(0.32)),
            (Some(dec!(751600)), dec!(0.35)),
            (None, dec!(0.37)),
        ]);
        let separate = TaxBracket::schedule(&[
            (Some(dec!(11925)), dec!(0.10)),
            (Some(dec!(48475)), dec!(0.12)),
            (Some(dec!(103350)), dec!(0.22)),
            (Some(dec!(197300)), dec!(0.24)),
            (Some(dec!(250525)), dec!(0.32)),
            (Some(dec!(375800)), dec!(0.35)),
            (None, dec!(0.37)),
        ]);
        let head_of_household = TaxBracket::schedule(&[
            (Some(dec!(17000)), dec!(0.10)),
            (Some(dec!(64850)), dec!(0.12)),
            (Some(dec!(103350)), dec!(0.22)),
            (Some(dec!(197300)), dec!(0.24)),
            (Some(dec!(250500)), dec!(0.32)),
            (Some(dec!(626350)), dec!(0.35)),
            (None, dec!(0.37)),
        ]);

        let high_earner_threshold =
            PerStatus::joint_separate_other(dec!(250000), dec!(125000), dec!(200000));

        Ok(Self {
            tax_year: 2025,
            brackets: PerStatus {
                single,
                married_filing_jointly: joint.clone(),
                married_filing_separately: separate,
                head_of_household,
                qualifying_surviving_spouse: joint,
            },
            standard_deduction: PerStatus {
                single: dec!(15750),
                married_filing_jointly: dec!(31500),
                married_filing_separately: dec!(15750),
                head_of_household: dec!(23625),
                qualifying_surviving_spouse: dec!(31500),
            },
            self_employment: SeWorksheetConfig {
                ss_wage_max: dec!(176100.00),
                ss_tax_rate: dec!(0.124),
                medicare_tax_rate: dec!(0.029),
                net_earnings_factor: dec!(0.9235),
                deduction_factor: dec!(0.50),
                min_se_threshold: dec!(400.00),
            },
            additional_medicare: SurtaxConfig {
                rate: dec!(0.009),
                threshold: high_earner_threshold.clone(),
            },
            niit: SurtaxConfig {
                rate: dec!(0.038),
                threshold: high_earner_threshold,
            },
            qbi: QbiConfig {
                deduction_rate: dec!(0.20),
                threshold: PerStatus::joint_separate_other(
                    dec!(394600),
                    dec!(197300),
                    dec!(197300),
                ),
                phaseout_range: PerStatus::joint_separate_other(
                    dec!(100000),
                    dec!(50000),
                    dec!(50000),
                ),
                wage_limit_rate: dec!(0.50),
                wage_and_capital_wage_rate: dec!(0.25),
                wage_and_capital_ubia_rate: dec!(0.025),
            },
            capital_gains: CapitalGainsConfig {
                zero_rate_max: PerStatus {
                    single: dec!(48350),
                    married_filing_jointly: dec!(96700),
                    married_filing_separately: dec!(48350),
                    head_of_household: dec!(64750),
                    qualifying_surviving_spouse: dec!(96700),
                },
                fifteen_rate_max: PerStatus {
                    single: dec!(533400),
                    married_filing_jointly: dec!(600050),
                    married_filing_separately: dec!(300000),
                    head_of_household: dec!(566700),
                    qualifying_surviving_spouse: dec!(600050),
                },
                fifteen_rate: dec!(0.15),
                twenty_rate: dec!(0.20),
                loss_limit: PerStatus::joint_separate_other(
                    dec!(3000),
                    dec!(1500),
                    dec!(3000),
                ),
            },
            amt: AmtConfig {
                exemption: PerStatus::joint_separate_other(
                    dec!(137000),
                    dec!(68500),
                    dec!(88100),
                ),
                phaseout_start: PerStatus::joint_separate_other(
                    dec!(1252700),
                    dec!(609350),
                    dec!(626350),
                ),
                phaseout_rate: dec!(0.25),
                low_rate: dec!(0.26),
                high_rate: dec!(0.28),
                breakpoint: PerStatus::joint_separate_other(
                    dec!(239100),
                    dec!(119550),
                    dec!(239100),
                ),
            },
            credits: CreditConfig {
                child_credit: dec!(2500),
                other_dependent_credit: dec!(500),
                phaseout_threshold: PerStatus::joint_separate_other(
                    dec!(400000),
                    dec!(200000),
                    dec!(200000),
                ),
                phaseout_step: dec!(1000),
                phaseout_per_step: dec!(50),
                refundable_per_child: dec!(1700),
                earned_income_threshold: dec!(2500),
                earned_income_rate: dec!(0.15),
            },
            feie: FeieConfig {
                exclusion_limit: dec!(130000),
                physical_presence_days: 330,
            },
            business: BusinessConfig {
                meals_deduction_rate: dec!(0.50),
                home_office_rate: dec!(5.00),
                home_office_max_sqft: dec!(300),
            },
            estimated_tax: EstimatedTaxConfig {
                current_year_rate: dec!(0.90),
                prior_year_rate: dec!(1.00),
                high_income_prior_year_rate: dec!(1.10),
                high_income_threshold: PerStatus::joint_separate_other(
                    dec!(150000),
                    dec!(75000),
                    dec!(150000),
                ),
                required_payment_threshold: dec!(1000.00),
                due_dates: [
                    date(2026, 4, 15)?,
                    date(2026, 6, 15)?,
                    date(2026, 9, 15)?,
                    date(2027, 1, 15)?,
                ],
            },
            retirement: RetirementConfig {
                sep_contribution_rate: dec!(0.25),
                sep_limit: dec!(69000),
                sep_min_se_income: dec!(50000),
            },
            colorado: ColoradoConfig {
                state_code: "CO".to_string(),
                tax_rate: dec!(0.044),
                pension_min_age: 55,
                pension_senior_age: 65,
                pension_subtraction: dec!(20000),
                pension_subtraction_senior: dec!(24000),
            },
        })
    }
}

fn date(
    year: i32,
    month: u32,
    day: u32,
) -> Result<NaiveDate, ConfigError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ConfigError::InvalidDate { year, month, day })
}

fn validate_brackets(
    status: FilingStatus,
    table: &[TaxBracket],
) -> Result<(), ConfigError> {
    let Some(last) = table.last() else {
        return Err(ConfigError::EmptyBracketTable(status));
    };
    if last.max_income.is_some() {
        return Err(ConfigError::MissingTopBracket(status));
    }

    let mut expected_lower = Decimal::ZERO;
    for (index, bracket) in table.iter().enumerate() {
        if bracket.min_income != expected_lower {
            return Err(ConfigError::NonContiguousBrackets {
                status,
                at: bracket.min_income,
            });
        }
        match bracket.max_income {
            Some(max) if max > bracket.min_income => expected_lower = max,
            Some(max) => {
                return Err(ConfigError::NonContiguousBrackets { status, at: max });
            }
            None if index + 1 == table.len() => {}
            None => return Err(ConfigError::MissingTopBracket(status)),
        }
    }
    Ok(())
}
