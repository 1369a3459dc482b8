//! Qualified business income deduction (§199A), Forms 8995 and 8995-A.
//!
//! Below the filing-status threshold the deduction is 20% of QBI. Above it,
//! the W-2 wage and UBIA limit phases in linearly over the phase-out range.
//! Both branches are capped at 20% of taxable income less net capital gain,
//! where net capital gain includes qualified dividends.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{clamp_fraction, non_negative, round_half_up};
use crate::calculations::schedules::ScheduleCResult;
use crate::models::{FilingStatus, LineItem, QbiConfig, ScheduleK1};

/// QBI and its limitation inputs, summed across every qualified trade or
/// business.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedBusinessIncome {
    pub schedule_c_qbi: Decimal,
    pub k1_qbi: Decimal,
    pub w2_wages: Decimal,
    pub ubia: Decimal,
}

impl QualifiedBusinessIncome {
    /// Collects Schedule C profits and non-SSTB K-1 Box 20 amounts.
    ///
    /// Schedule C wage expense stands in for W-2 wages paid by the business.
    pub fn gather(
        schedule_c: &[ScheduleCResult],
        k1s: &[ScheduleK1],
    ) -> Self {
        let qualified_k1s = || k1s.iter().filter(|k1| !k1.is_sstb);

        Self {
            schedule_c_qbi: schedule_c.iter().map(|c| c.net_profit_loss).sum(),
            k1_qbi: qualified_k1s().map(|k1| k1.qbi_amount).sum(),
            w2_wages: schedule_c.iter().map(|c| c.wages_paid).sum::<Decimal>()
                + qualified_k1s().map(|k1| k1.qbi_w2_wages).sum::<Decimal>(),
            ubia: schedule_c.iter().map(|c| c.qbi_ubia).sum::<Decimal>()
                + qualified_k1s().map(|k1| k1.qbi_ubia).sum::<Decimal>(),
        }
    }

    pub fn total(&self) -> Decimal {
        round_half_up(self.schedule_c_qbi + self.k1_qbi)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form8995Result {
    pub total_qbi: Decimal,
    pub taxable_income_before_qbi: Decimal,
    /// 20% of taxable income less net capital gain.
    pub income_limit: Decimal,
    /// Greater of 50% of W-2 wages or 25% of wages plus 2.5% of UBIA.
    pub wage_limit: Decimal,
    /// Share of the phase-out range used, in `[0, 1]`.
    pub phase_in_fraction: Decimal,
    /// Taxable income exceeded the threshold (Form 8995-A).
    pub is_limited: bool,
    pub qbi_deduction: Decimal,
    pub lines: Vec<LineItem>,
}

pub fn calculate_qbi_deduction(
    income: &QualifiedBusinessIncome,
    taxable_income_before_qbi: Decimal,
    net_capital_gain: Decimal,
    filing_status: FilingStatus,
    config: &QbiConfig,
) -> Form8995Result {
    let total_qbi = income.total();
    let mut lines = vec![
        LineItem::new("Form 8995", "1-3", "Total qualified business income", total_qbi)
            .with_explanation(if income.k1_qbi.is_zero() {
                "Sum of net profit from Schedule C businesses".to_string()
            } else {
                format!(
                    "Schedule C ${} + K-1 QBI ${}",
                    round_half_up(income.schedule_c_qbi),
                    round_half_up(income.k1_qbi)
                )
            }),
    ];

    if total_qbi <= Decimal::ZERO {
        debug!(%total_qbi, "No QBI deduction: QBI is zero or negative");
        lines.push(LineItem::new(
            "Form 8995",
            "15",
            "No QBI deduction (QBI is zero or negative)",
            Decimal::ZERO,
        ));
        return Form8995Result {
            total_qbi,
            taxable_income_before_qbi,
            lines,
            ..Form8995Result::default()
        };
    }

    let tentative = round_half_up(total_qbi * config.deduction_rate);
    let income_limit = round_half_up(
        non_negative(taxable_income_before_qbi - net_capital_gain) * config.deduction_rate,
    );
    let threshold = *config.threshold.get(filing_status);

    let (deduction, is_limited, wage_limit, phase_in_fraction) =
        if taxable_income_before_qbi <= threshold {
            (tentative, false, Decimal::ZERO, Decimal::ZERO)
        } else {
            let range = *config.phaseout_range.get(filing_status);
            let excess = taxable_income_before_qbi - threshold;
            let fraction = if range.is_zero() {
                Decimal::ONE
            } else {
                clamp_fraction(excess / range)
            };

            let wage_limit = round_half_up(
                (income.w2_wages * config.wage_limit_rate).max(
                    income.w2_wages * config.wage_and_capital_wage_rate
                        + income.ubia * config.wage_and_capital_ubia_rate,
                ),
            );
            let limited = tentative.min(wage_limit);
            let phased = round_half_up(tentative - (tentative - limited) * fraction);

            (non_negative(phased), true, wage_limit, fraction)
        };

    let qbi_deduction = deduction.min(income_limit);

    let line = if is_limited {
        LineItem::new("Form 8995-A", "39", "QBI deduction (limited)", qbi_deduction)
            .with_explanation(format!(
                "Taxable income ${taxable_income_before_qbi} exceeds ${} by ${}. \
                 Phase-in {}%. W-2 wages ${}, UBIA ${}, wage limit ${wage_limit}.",
                threshold.normalize(),
                taxable_income_before_qbi - threshold,
                round_half_up(phase_in_fraction * Decimal::ONE_HUNDRED).normalize(),
                round_half_up(income.w2_wages),
                round_half_up(income.ubia),
            ))
    } else {
        LineItem::new("Form 8995", "15", "QBI deduction (20% of QBI)", qbi_deduction)
            .with_explanation(format!(
                "Below {filing_status} threshold of ${}. 20% × ${total_qbi} = ${tentative}, \
                 limited to ${income_limit}",
                threshold.normalize()
            ))
    };
    lines.push(line.with_reference("https://www.irs.gov/forms-pubs/about-form-8995"));

    debug!(
        %total_qbi,
        %taxable_income_before_qbi,
        is_limited,
        %qbi_deduction,
        "QBI deduction computed"
    );

    Form8995Result {
        total_qbi,
        taxable_income_before_qbi,
        income_limit,
        wage_limit,
        phase_in_fraction,
        is_limited,
        qbi_deduction,
        lines,
    }
}
