//! Form 1040 for one taxpayer and one tax year.
//!
//! [`calculate_return`] runs the schedules and forms in the order the lines
//! depend on each other. Each stage consumes the records produced before it
//! and yields a new one; nothing computed by an earlier stage is revised.
//!
//! 1. Schedule C per business
//! 2. Schedule E for K-1s
//! 3. Interest and dividends, Schedule D, net investment income
//! 4. Schedule SE
//! 5. Total income, adjustments, AGI
//! 6. Standard deduction, QBI deduction, taxable income
//! 7. Income tax, Additional Medicare Tax, NIIT, AMT
//! 8. Credits
//! 9. Total tax, payments, refund or amount owed

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::calculations::brackets::{
    PreferentialRateInput, PreferentialRateResult, preferential_rate_tax, progressive_tax,
};
use crate::calculations::common::{non_negative, ratio, round_half_up};
use crate::calculations::forms::{
    AmtInput, CreditInput, FeieInput, Form2555Result, Form6251Result, Form8995Result,
    QualifiedBusinessIncome, TaxCreditsResult, additional_medicare_tax, calculate_amt,
    calculate_qbi_deduction, calculate_tax_credits, evaluate_feie, net_investment_income_tax,
};
use crate::calculations::schedules::{
    CapitalGainSources, K1Destination, ScheduleCResult, ScheduleDResult, ScheduleEResult,
    ScheduleSeResult, SeWorksheet, SeWorksheetError, calculate_schedule_c, calculate_schedule_d,
    calculate_schedule_e,
};
use crate::models::{
    Business, ConfigError, FilingStatus, LineItem, TaxYearConfig, TaxpayerProfile,
};

/// Name given to the Schedule C built from 1099-NEC totals.
pub const NEC_BUSINESS_NAME: &str = "1099-NEC Income";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReturnError {
    #[error("invalid tax year configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("self-employment tax: {0}")]
    SelfEmployment(#[from] SeWorksheetError),

    #[error("profile is for tax year {profile} but the configuration is for {config}")]
    TaxYearMismatch { profile: i32, config: i32 },
}

/// A completed federal return.
///
/// Schedule results are present only when the schedule applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form1040Result {
    pub tax_year: i32,
    pub filing_status: FilingStatus,

    pub schedule_c_results: Vec<ScheduleCResult>,
    pub schedule_e: Option<ScheduleEResult>,
    pub schedule_d: Option<ScheduleDResult>,
    pub schedule_se: Option<ScheduleSeResult>,
    pub qbi: Option<Form8995Result>,
    pub form_6251: Option<Form6251Result>,
    pub tax_credits: Option<TaxCreditsResult>,
    /// Informational: the exclusion is evaluated, never applied.
    pub feie: Option<Form2555Result>,
    pub preferential_rate: Option<PreferentialRateResult>,

    pub wage_income: Decimal,
    pub tax_exempt_interest: Decimal,
    pub taxable_interest: Decimal,
    pub qualified_dividends: Decimal,
    pub ordinary_dividends: Decimal,
    pub capital_gain_loss: Decimal,
    pub business_income: Decimal,
    /// Schedule 1 additional income: Schedule C plus Schedule E.
    pub schedule_1_income: Decimal,
    pub total_income: Decimal,
    pub adjustments: Decimal,
    pub agi: Decimal,
    pub deduction: Decimal,
    pub qbi_deduction: Decimal,
    pub taxable_income: Decimal,

    pub tax: Decimal,
    pub se_tax: Decimal,
    pub additional_medicare: Decimal,
    pub net_investment_income: Decimal,
    pub niit: Decimal,
    pub amt: Decimal,
    pub nonrefundable_credits: Decimal,
    pub total_tax: Decimal,

    pub withholding: Decimal,
    pub estimated_payments: Decimal,
    pub refundable_credits: Decimal,
    pub total_payments: Decimal,
    pub overpayment: Decimal,
    pub amount_owed: Decimal,

    /// Every line computed, in order: each schedule's lines followed by the
    /// Form 1040, Schedule 1 and Schedule 2 lines that use them.
    pub lines: Vec<LineItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRates {
    /// Income tax (line 16) over total income.
    pub income_tax_rate: Decimal,
    /// Total tax (line 24) over total income.
    pub total_tax_rate: Decimal,
}

impl Form1040Result {
    /// Effective rates as fractions, or `None` when there is no positive
    /// total income to divide by.
    pub fn effective_rates(&self) -> Option<EffectiveRates> {
        if self.total_income <= Decimal::ZERO {
            return None;
        }
        Some(EffectiveRates {
            income_tax_rate: ratio(self.tax, self.total_income)?.round_dp(4),
            total_tax_rate: ratio(self.total_tax, self.total_income)?.round_dp(4),
        })
    }

    /// Lines belonging to one form, in computation order.
    pub fn lines_for<'a>(
        &'a self,
        form: &'a str,
    ) -> impl Iterator<Item = &'a LineItem> + 'a {
        self.lines.iter().filter(move |item| item.form == form)
    }
}

/// Computes the federal return for `profile` under `config`.
///
/// # Errors
///
/// Returns [`ReturnError`] before any computation when the configuration is
/// invalid or is for a different tax year than the profile.
pub fn calculate_return(
    profile: &TaxpayerProfile,
    config: &TaxYearConfig,
) -> Result<Form1040Result, ReturnError> {
    config.validate()?;
    if profile.tax_year != config.tax_year {
        return Err(ReturnError::TaxYearMismatch {
            profile: profile.tax_year,
            config: config.tax_year,
        });
    }

    let status = profile.filing_status;
    let mut lines = Vec::new();

    let business = business_stage(profile, config, &mut lines);
    let pass_through = pass_through_stage(profile, &mut lines);
    let investment = investment_stage(profile, config, &pass_through, &mut lines);
    let self_employment =
        self_employment_stage(profile, config, &business, &pass_through, &mut lines)?;
    let income = income_stage(
        profile,
        &business,
        &pass_through,
        &investment,
        &self_employment,
        &mut lines,
    );
    let deduction = deduction_stage(
        profile,
        config,
        &business,
        &investment,
        &income,
        &mut lines,
    );
    let tax = tax_stage(
        profile,
        config,
        &investment,
        &self_employment,
        &income,
        &deduction,
        &mut lines,
    );
    let credits = credit_stage(profile, config, &business, &income, &tax, &mut lines);
    let feie = feie_evaluation(profile, config, &business, &tax);

    let total_tax = non_negative(round_half_up(
        tax.income_tax + self_employment.se_tax + tax.additional_medicare + tax.niit + tax.amt
            - credits.nonrefundable,
    ));
    lines.push(
        LineItem::new("Form 1040", "24", "Total tax", total_tax).with_explanation(format!(
            "Income tax ${} + SE tax ${} + Additional Medicare ${} + NIIT ${} + AMT ${} − credits ${}",
            tax.income_tax,
            self_employment.se_tax,
            tax.additional_medicare,
            tax.niit,
            tax.amt,
            credits.nonrefundable
        )),
    );

    let withholding = round_half_up(total_withholding(profile));
    if withholding > Decimal::ZERO {
        lines.push(LineItem::new(
            "Form 1040",
            "25d",
            "Federal income tax withheld",
            withholding,
        ));
    }
    let estimated_payments = round_half_up(profile.total_estimated_payments());
    if estimated_payments > Decimal::ZERO {
        lines.push(LineItem::new(
            "Form 1040",
            "26",
            "Estimated tax payments",
            estimated_payments,
        ));
    }
    if credits.refundable > Decimal::ZERO {
        lines.push(LineItem::new(
            "Form 1040",
            "28",
            "Additional child tax credit",
            credits.refundable,
        ));
    }
    let total_payments = round_half_up(withholding + estimated_payments + credits.refundable);
    lines.push(LineItem::new(
        "Form 1040",
        "33",
        "Total payments",
        total_payments,
    ));

    let overpayment = non_negative(total_payments - total_tax);
    let amount_owed = non_negative(total_tax - total_payments);
    if overpayment > Decimal::ZERO {
        lines.push(LineItem::new("Form 1040", "34", "Overpaid", overpayment));
    } else {
        lines.push(LineItem::new(
            "Form 1040",
            "37",
            "Amount you owe",
            amount_owed,
        ));
    }

    info!(
        filing_status = %status,
        agi = %income.agi,
        taxable_income = %deduction.taxable_income,
        %total_tax,
        %overpayment,
        %amount_owed,
        "Federal return computed"
    );

    Ok(Form1040Result {
        tax_year: config.tax_year,
        filing_status: status,
        schedule_c_results: business.schedule_c,
        schedule_e: pass_through.schedule_e,
        schedule_d: investment.schedule_d,
        schedule_se: self_employment.schedule_se,
        qbi: deduction.qbi,
        form_6251: tax.form_6251,
        tax_credits: credits.tax_credits,
        feie,
        preferential_rate: tax.preferential_rate,
        wage_income: income.wages,
        tax_exempt_interest: investment.tax_exempt_interest,
        taxable_interest: investment.taxable_interest,
        qualified_dividends: investment.qualified_dividends,
        ordinary_dividends: investment.ordinary_dividends,
        capital_gain_loss: investment.capital_gain_loss,
        business_income: business.total_business_income,
        schedule_1_income: income.schedule_1_income,
        total_income: income.total_income,
        adjustments: income.adjustments,
        agi: income.agi,
        deduction: deduction.deduction,
        qbi_deduction: deduction.qbi_deduction,
        taxable_income: deduction.taxable_income,
        tax: tax.income_tax,
        se_tax: self_employment.se_tax,
        additional_medicare: tax.additional_medicare,
        net_investment_income: investment.net_investment_income,
        niit: tax.niit,
        amt: tax.amt,
        nonrefundable_credits: credits.nonrefundable,
        total_tax,
        withholding,
        estimated_payments,
        refundable_credits: credits.refundable,
        total_payments,
        overpayment,
        amount_owed,
        lines,
    })
}

// =============================================================================
// Stage 1: Schedule C
// =============================================================================

struct BusinessStage {
    schedule_c: Vec<ScheduleCResult>,
    total_business_income: Decimal,
}

/// Declared businesses, or one built from 1099-NEC totals when none are
/// declared.
fn businesses_for(profile: &TaxpayerProfile) -> Vec<Business> {
    if !profile.businesses.is_empty() {
        return profile.businesses.clone();
    }
    let nec_total: Decimal = profile
        .forms_1099_nec
        .iter()
        .map(|f| f.nonemployee_compensation)
        .sum();
    if nec_total > Decimal::ZERO {
        debug!(%nec_total, "No businesses declared; building Schedule C from 1099-NEC");
        vec![Business::from_receipts(NEC_BUSINESS_NAME, nec_total)]
    } else {
        Vec::new()
    }
}

fn business_stage(
    profile: &TaxpayerProfile,
    config: &TaxYearConfig,
    lines: &mut Vec<LineItem>,
) -> BusinessStage {
    let mut schedule_c = Vec::new();
    let mut total_business_income = Decimal::ZERO;

    for business in businesses_for(profile) {
        let result = calculate_schedule_c(&business, &config.business);
        lines.extend(result.lines.iter().cloned());
        lines.push(
            LineItem::new(
                "Schedule 1",
                "3",
                format!("Business income: {}", result.business_name),
                result.net_profit_loss,
            )
            .with_explanation("From Schedule C, Line 31"),
        );
        total_business_income += result.net_profit_loss;
        schedule_c.push(result);
    }

    BusinessStage {
        schedule_c,
        total_business_income: round_half_up(total_business_income),
    }
}

// =============================================================================
// Stage 2: Schedule E
// =============================================================================

struct PassThroughStage {
    schedule_e: Option<ScheduleEResult>,
}

impl PassThroughStage {
    fn destination_total(
        &self,
        destination: K1Destination,
    ) -> Decimal {
        self.schedule_e
            .as_ref()
            .map(|e| e.destination_total(destination))
            .unwrap_or_default()
    }

    fn schedule_e_income(&self) -> Decimal {
        self.schedule_e
            .as_ref()
            .map(|e| e.total_schedule_e_income)
            .unwrap_or_default()
    }

    fn self_employment_earnings(&self) -> Decimal {
        self.schedule_e
            .as_ref()
            .map(ScheduleEResult::self_employment_earnings)
            .unwrap_or_default()
    }
}

fn pass_through_stage(
    profile: &TaxpayerProfile,
    lines: &mut Vec<LineItem>,
) -> PassThroughStage {
    if profile.schedule_k1s.is_empty() {
        return PassThroughStage { schedule_e: None };
    }

    let schedule_e = calculate_schedule_e(&profile.schedule_k1s, profile.filing_status);
    lines.extend(schedule_e.lines.iter().cloned());
    lines.push(
        LineItem::new(
            "Schedule 1",
            "5",
            "Rental real estate, royalties, partnerships",
            schedule_e.total_schedule_e_income,
        )
        .with_explanation("From Schedule E, Line 26"),
    );

    PassThroughStage {
        schedule_e: Some(schedule_e),
    }
}

// =============================================================================
// Stage 3: interest, dividends, Schedule D
// =============================================================================

struct InvestmentStage {
    tax_exempt_interest: Decimal,
    taxable_interest: Decimal,
    qualified_dividends: Decimal,
    ordinary_dividends: Decimal,
    schedule_d: Option<ScheduleDResult>,
    capital_gain_loss: Decimal,
    net_investment_income: Decimal,
}

fn investment_stage(
    profile: &TaxpayerProfile,
    config: &TaxYearConfig,
    pass_through: &PassThroughStage,
    lines: &mut Vec<LineItem>,
) -> InvestmentStage {
    let tax_exempt_interest = round_half_up(
        profile
            .forms_1099_int
            .iter()
            .map(|f| f.tax_exempt_interest)
            .sum(),
    );
    let taxable_interest = round_half_up(
        profile
            .forms_1099_int
            .iter()
            .map(|f| f.interest_income)
            .sum::<Decimal>()
            + pass_through.destination_total(K1Destination::InterestLine),
    );
    let qualified_dividends = round_half_up(
        profile
            .forms_1099_div
            .iter()
            .map(|f| f.qualified_dividends)
            .sum::<Decimal>()
            + pass_through.destination_total(K1Destination::QualifiedDividendLine),
    );
    let ordinary_dividends = round_half_up(
        profile
            .forms_1099_div
            .iter()
            .map(|f| f.ordinary_dividends)
            .sum::<Decimal>()
            + pass_through.destination_total(K1Destination::DividendLine),
    );

    let sources = CapitalGainSources {
        broker_statements: &profile.forms_1099_b,
        dividend_statements: &profile.forms_1099_div,
        schedule_e: pass_through.schedule_e.as_ref(),
    };
    let schedule_d = sources.has_activity().then(|| {
        calculate_schedule_d(&sources, profile.filing_status, &config.capital_gains)
    });
    let capital_gain_loss = schedule_d
        .as_ref()
        .map(|d| d.capital_gain_for_1040)
        .unwrap_or_default();
    if let Some(schedule_d) = &schedule_d {
        lines.extend(schedule_d.lines.iter().cloned());
    }

    let mut net_investment_income = non_negative(taxable_interest) + non_negative(ordinary_dividends);
    if let Some(schedule_d) = &schedule_d {
        net_investment_income += non_negative(schedule_d.net_capital_gain_loss);
    }
    if let Some(schedule_e) = &pass_through.schedule_e {
        net_investment_income +=
            non_negative(schedule_e.net_rental_income) + non_negative(schedule_e.royalties);
    }
    let net_investment_income = round_half_up(net_investment_income);
    debug!(%net_investment_income, "Net investment income accumulated");

    InvestmentStage {
        tax_exempt_interest,
        taxable_interest,
        qualified_dividends,
        ordinary_dividends,
        schedule_d,
        capital_gain_loss,
        net_investment_income,
    }
}

// =============================================================================
// Stage 4: Schedule SE
// =============================================================================

struct SelfEmploymentStage {
    schedule_se: Option<ScheduleSeResult>,
    se_tax: Decimal,
    deductible_se_tax: Decimal,
}

fn self_employment_stage(
    profile: &TaxpayerProfile,
    config: &TaxYearConfig,
    business: &BusinessStage,
    pass_through: &PassThroughStage,
    lines: &mut Vec<LineItem>,
) -> Result<SelfEmploymentStage, SeWorksheetError> {
    let se_income =
        round_half_up(business.total_business_income + pass_through.self_employment_earnings());
    if se_income <= Decimal::ZERO {
        return Ok(SelfEmploymentStage {
            schedule_se: None,
            se_tax: Decimal::ZERO,
            deductible_se_tax: Decimal::ZERO,
        });
    }

    let w2_ss_wages: Decimal = profile.forms_w2.iter().map(|w2| w2.ss_wages).sum();
    let worksheet = SeWorksheet::new(config.self_employment.clone());
    let result = worksheet.calculate(se_income, w2_ss_wages)?;

    if result.below_threshold {
        return Ok(SelfEmploymentStage {
            schedule_se: None,
            se_tax: Decimal::ZERO,
            deductible_se_tax: Decimal::ZERO,
        });
    }

    lines.extend(result.lines.iter().cloned());
    Ok(SelfEmploymentStage {
        se_tax: result.se_tax,
        deductible_se_tax: result.deductible_se_tax,
        schedule_se: Some(result),
    })
}

// =============================================================================
// Stage 5: total income, adjustments, AGI
// =============================================================================

struct IncomeStage {
    wages: Decimal,
    schedule_1_income: Decimal,
    total_income: Decimal,
    adjustments: Decimal,
    agi: Decimal,
}

fn income_stage(
    profile: &TaxpayerProfile,
    business: &BusinessStage,
    pass_through: &PassThroughStage,
    investment: &InvestmentStage,
    self_employment: &SelfEmploymentStage,
    lines: &mut Vec<LineItem>,
) -> IncomeStage {
    let wages = round_half_up(profile.forms_w2.iter().map(|w2| w2.wages).sum());
    if wages > Decimal::ZERO {
        lines.push(LineItem::new(
            "Form 1040",
            "1a",
            "Wages, salaries, tips",
            wages,
        ));
    }
    if investment.tax_exempt_interest > Decimal::ZERO {
        lines.push(LineItem::new(
            "Form 1040",
            "2a",
            "Tax-exempt interest",
            investment.tax_exempt_interest,
        ));
    }
    if investment.taxable_interest > Decimal::ZERO {
        lines.push(LineItem::new(
            "Form 1040",
            "2b",
            "Taxable interest",
            investment.taxable_interest,
        ));
    }
    if investment.qualified_dividends > Decimal::ZERO {
        lines.push(LineItem::new(
            "Form 1040",
            "3a",
            "Qualified dividends",
            investment.qualified_dividends,
        ));
    }
    if investment.ordinary_dividends > Decimal::ZERO {
        lines.push(LineItem::new(
            "Form 1040",
            "3b",
            "Ordinary dividends",
            investment.ordinary_dividends,
        ));
    }
    if !investment.capital_gain_loss.is_zero() {
        lines.push(LineItem::new(
            "Form 1040",
            "7",
            "Capital gain or (loss)",
            investment.capital_gain_loss,
        ));
    }

    let schedule_1_income =
        round_half_up(business.total_business_income + pass_through.schedule_e_income());
    lines.push(LineItem::new(
        "Form 1040",
        "8",
        "Additional income from Schedule 1",
        schedule_1_income,
    ));

    let total_income = round_half_up(
        wages
            + investment.taxable_interest
            + investment.ordinary_dividends
            + investment.capital_gain_loss
            + schedule_1_income,
    );
    lines.push(LineItem::new("Form 1040", "9", "Total income", total_income));

    let mut adjustments = Decimal::ZERO;
    if self_employment.schedule_se.is_some() {
        adjustments += self_employment.deductible_se_tax;
        lines.push(LineItem::new(
            "Schedule 1",
            "15",
            "Deductible part of self-employment tax",
            self_employment.deductible_se_tax,
        ));
    }

    if let Some(insurance) = profile
        .health_insurance
        .as_ref()
        .filter(|h| h.total_premiums > Decimal::ZERO)
    {
        let limit =
            non_negative(business.total_business_income - self_employment.deductible_se_tax);
        let deduction = round_half_up(insurance.total_premiums.min(limit));
        adjustments += deduction;
        lines.push(
            LineItem::new(
                "Schedule 1",
                "17",
                "Self-employed health insurance deduction",
                deduction,
            )
            .with_explanation(format!(
                "Premiums ${} limited to net business income less deductible SE tax (${limit})",
                insurance.total_premiums
            )),
        );
    }

    let adjustments = round_half_up(adjustments);
    lines.push(LineItem::new(
        "Form 1040",
        "10",
        "Adjustments to income",
        adjustments,
    ));

    let agi = round_half_up(total_income - adjustments);
    lines.push(
        LineItem::new("Form 1040", "11", "Adjusted gross income", agi)
            .with_explanation("Total income minus adjustments"),
    );

    IncomeStage {
        wages,
        schedule_1_income,
        total_income,
        adjustments,
        agi,
    }
}

// =============================================================================
// Stage 6: deductions and taxable income
// =============================================================================

struct DeductionStage {
    deduction: Decimal,
    qbi: Option<Form8995Result>,
    qbi_deduction: Decimal,
    taxable_income: Decimal,
}

fn deduction_stage(
    profile: &TaxpayerProfile,
    config: &TaxYearConfig,
    business: &BusinessStage,
    investment: &InvestmentStage,
    income: &IncomeStage,
    lines: &mut Vec<LineItem>,
) -> DeductionStage {
    let status = profile.filing_status;
    let deduction = *config.standard_deduction.get(status);
    lines.push(LineItem::new(
        "Form 1040",
        "12",
        format!("Standard deduction ({status})"),
        deduction,
    ));

    let taxable_before_qbi = non_negative(income.agi - deduction);
    let has_qbi_source = !business.schedule_c.is_empty()
        || profile
            .schedule_k1s
            .iter()
            .any(|k1| !k1.is_sstb && !k1.qbi_amount.is_zero());

    let qbi = has_qbi_source.then(|| {
        let qbi_income = QualifiedBusinessIncome::gather(&business.schedule_c, &profile.schedule_k1s);
        let net_capital_gain = investment
            .schedule_d
            .as_ref()
            .map(|d| non_negative(d.net_capital_gain_loss))
            .unwrap_or_default()
            + investment.qualified_dividends;
        calculate_qbi_deduction(
            &qbi_income,
            taxable_before_qbi,
            net_capital_gain,
            status,
            &config.qbi,
        )
    });
    let qbi_deduction = qbi
        .as_ref()
        .map(|q| q.qbi_deduction)
        .unwrap_or_default();
    if let Some(qbi) = &qbi {
        lines.extend(qbi.lines.iter().cloned());
    }
    lines.push(LineItem::new(
        "Form 1040",
        "13",
        "Qualified business income deduction",
        qbi_deduction,
    ));

    let taxable_income = non_negative(round_half_up(income.agi - deduction - qbi_deduction));
    lines.push(LineItem::new(
        "Form 1040",
        "15",
        "Taxable income",
        taxable_income,
    ));

    DeductionStage {
        deduction,
        qbi,
        qbi_deduction,
        taxable_income,
    }
}

// =============================================================================
// Stage 7: income tax and Schedule 2 taxes
// =============================================================================

struct TaxStage {
    income_tax: Decimal,
    preferential_rate: Option<PreferentialRateResult>,
    additional_medicare: Decimal,
    niit: Decimal,
    form_6251: Option<Form6251Result>,
    amt: Decimal,
}

fn tax_stage(
    profile: &TaxpayerProfile,
    config: &TaxYearConfig,
    investment: &InvestmentStage,
    self_employment: &SelfEmploymentStage,
    income: &IncomeStage,
    deduction: &DeductionStage,
    lines: &mut Vec<LineItem>,
) -> TaxStage {
    let status = profile.filing_status;
    let brackets = config.brackets_for(status);
    let taxable_income = deduction.taxable_income;

    let (net_lt, net_st) = investment
        .schedule_d
        .as_ref()
        .map(|d| (d.net_lt_gain_loss, d.net_st_gain_loss))
        .unwrap_or_default();

    let (income_tax, preferential_rate) =
        if investment.qualified_dividends > Decimal::ZERO || net_lt > Decimal::ZERO {
            let worksheet = preferential_rate_tax(
                &PreferentialRateInput {
                    taxable_income,
                    qualified_dividends: investment.qualified_dividends,
                    net_long_term_gain: net_lt,
                    net_short_term_gain: net_st,
                },
                status,
                brackets,
                &config.capital_gains,
            );
            (worksheet.tax, Some(worksheet))
        } else {
            (progressive_tax(taxable_income, brackets), None)
        };
    lines.push(
        LineItem::new("Form 1040", "16", "Tax", income_tax).with_explanation(
            if preferential_rate.is_some() {
                "Qualified Dividends and Capital Gain Tax Worksheet".to_string()
            } else {
                format!("{status} tax rate schedule")
            },
        ),
    );

    let w2_medicare_wages: Decimal = profile.forms_w2.iter().map(|w2| w2.medicare_wages).sum();
    let se_medicare_earnings = self_employment
        .schedule_se
        .as_ref()
        .map(|se| se.taxable_se_earnings)
        .unwrap_or_default();
    let medicare_earnings = w2_medicare_wages + se_medicare_earnings;
    let additional_medicare = if medicare_earnings > Decimal::ZERO {
        additional_medicare_tax(medicare_earnings, status, &config.additional_medicare)
    } else {
        Decimal::ZERO
    };
    if additional_medicare > Decimal::ZERO {
        lines.push(
            LineItem::new(
                "Schedule 2",
                "11",
                "Additional Medicare Tax",
                additional_medicare,
            )
            .with_explanation(format!(
                "Medicare wages and SE earnings ${} over the {status} threshold",
                round_half_up(medicare_earnings)
            )),
        );
    }

    let niit = if investment.net_investment_income > Decimal::ZERO {
        net_investment_income_tax(
            investment.net_investment_income,
            income.agi,
            status,
            &config.niit,
        )
    } else {
        Decimal::ZERO
    };
    if niit > Decimal::ZERO {
        lines.push(
            LineItem::new("Schedule 2", "12", "Net investment income tax", niit).with_explanation(
                format!(
                    "On ${} net investment income",
                    investment.net_investment_income
                ),
            ),
        );
    }

    let salt_addback = if profile.uses_itemized_deductions {
        profile.state_local_tax_deduction
    } else {
        Decimal::ZERO
    };
    let form_6251 = (salt_addback > Decimal::ZERO).then(|| {
        calculate_amt(
            &AmtInput {
                taxable_income,
                regular_tax: income_tax,
                salt_addback,
                other_adjustments: Decimal::ZERO,
            },
            status,
            &config.amt,
        )
    });
    let amt = form_6251
        .as_ref()
        .map(|f| f.amt)
        .unwrap_or_default();
    if let Some(form) = &form_6251 {
        lines.extend(form.lines.iter().cloned());
    }
    if amt > Decimal::ZERO {
        lines.push(LineItem::new(
            "Schedule 2",
            "1",
            "Alternative minimum tax",
            amt,
        ));
    }

    TaxStage {
        income_tax,
        preferential_rate,
        additional_medicare,
        niit,
        form_6251,
        amt,
    }
}

// =============================================================================
// Stage 8: credits
// =============================================================================

struct CreditStage {
    tax_credits: Option<TaxCreditsResult>,
    nonrefundable: Decimal,
    refundable: Decimal,
}

fn credit_stage(
    profile: &TaxpayerProfile,
    config: &TaxYearConfig,
    business: &BusinessStage,
    income: &IncomeStage,
    tax: &TaxStage,
    lines: &mut Vec<LineItem>,
) -> CreditStage {
    if profile.dependents.is_empty() {
        return CreditStage {
            tax_credits: None,
            nonrefundable: Decimal::ZERO,
            refundable: Decimal::ZERO,
        };
    }

    let result = calculate_tax_credits(
        &profile.dependents,
        &CreditInput {
            agi: income.agi,
            tax_liability: round_half_up(tax.income_tax + tax.amt),
            earned_income: income.wages + non_negative(business.total_business_income),
        },
        profile.filing_status,
        &config.credits,
    );
    lines.extend(result.lines.iter().cloned());
    if result.nonrefundable_credit > Decimal::ZERO {
        lines.push(LineItem::new(
            "Form 1040",
            "19",
            "Child tax credit and credit for other dependents",
            result.nonrefundable_credit,
        ));
    }

    CreditStage {
        nonrefundable: result.nonrefundable_credit,
        refundable: result.refundable_actc,
        tax_credits: Some(result),
    }
}

/// Form 2555 against Schedule C profit, reported alongside the return
/// without changing it.
fn feie_evaluation(
    profile: &TaxpayerProfile,
    config: &TaxYearConfig,
    business: &BusinessStage,
    tax: &TaxStage,
) -> Option<Form2555Result> {
    let days = profile.foreign_residency.days_in_foreign_country;
    let foreign_earned_income = non_negative(business.total_business_income);
    if days == 0 || foreign_earned_income.is_zero() {
        return None;
    }
    Some(evaluate_feie(
        &FeieInput {
            days_in_foreign_country: days,
            foreign_earned_income,
            tax_without_feie: tax.income_tax,
        },
        config.brackets_for(profile.filing_status),
        &config.feie,
    ))
}

fn total_withholding(profile: &TaxpayerProfile) -> Decimal {
    profile
        .forms_w2
        .iter()
        .map(|f| f.federal_tax_withheld)
        .chain(profile.forms_1099_int.iter().map(|f| f.federal_tax_withheld))
        .chain(profile.forms_1099_div.iter().map(|f| f.federal_tax_withheld))
        .chain(profile.forms_1099_b.iter().map(|f| f.federal_tax_withheld))
        .chain(profile.forms_1099_nec.iter().map(|f| f.federal_tax_withheld))
        .sum()
}
