//! Schedule D, Capital Gains and Losses.
//!
//! Short-term sources: 1099-B short-term sales and K-1 Box 8. Long-term
//! sources: 1099-B long-term sales, K-1 Boxes 9a and 10, and 1099-DIV Box 2a
//! capital gain distributions. A net loss is limited on Form 1040 line 7 to
//! the filing-status cap ($1,500 MFS, $3,000 otherwise).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::round_half_up;
use crate::calculations::schedules::{HoldingPeriod, K1Destination, ScheduleEResult};
use crate::models::{CapitalGainsConfig, FilingStatus, Form1099B, Form1099Div, LineItem};

const FORM: &str = "Schedule D";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDResult {
    pub net_st_gain_loss: Decimal,
    pub net_lt_gain_loss: Decimal,
    pub net_capital_gain_loss: Decimal,
    /// Line 21: the amount carried to Form 1040 line 7 after the loss limit.
    pub capital_gain_for_1040: Decimal,
    /// Net loss beyond the limit, carried to next year.
    pub loss_carryover: Decimal,
    pub lines: Vec<LineItem>,
}

/// Every document that can carry a capital gain or loss.
#[derive(Debug, Clone, Copy)]
pub struct CapitalGainSources<'a> {
    pub broker_statements: &'a [Form1099B],
    pub dividend_statements: &'a [Form1099Div],
    pub schedule_e: Option<&'a ScheduleEResult>,
}

impl CapitalGainSources<'_> {
    /// Whether any source reports capital activity, i.e. Schedule D is needed.
    pub fn has_activity(&self) -> bool {
        !self.broker_statements.is_empty()
            || self
                .dividend_statements
                .iter()
                .any(|d| d.capital_gain_distributions > Decimal::ZERO)
            || self.schedule_e.is_some_and(|e| {
                e.entries
                    .iter()
                    .any(|entry| matches!(entry.k1_box.destination(), K1Destination::ScheduleD(_)))
            })
    }
}

pub fn calculate_schedule_d(
    sources: &CapitalGainSources<'_>,
    filing_status: FilingStatus,
    config: &CapitalGainsConfig,
) -> ScheduleDResult {
    let mut lines = Vec::new();

    let k1_short = sources
        .schedule_e
        .map(|e| e.destination_total(K1Destination::ScheduleD(HoldingPeriod::ShortTerm)))
        .unwrap_or_default();
    let k1_long = sources
        .schedule_e
        .map(|e| e.destination_total(K1Destination::ScheduleD(HoldingPeriod::LongTerm)))
        .unwrap_or_default();

    let broker_short: Decimal = sources
        .broker_statements
        .iter()
        .map(Form1099B::net_short_term)
        .sum();
    let broker_long: Decimal = sources
        .broker_statements
        .iter()
        .map(Form1099B::net_long_term)
        .sum();
    let distributions: Decimal = sources
        .dividend_statements
        .iter()
        .map(|d| d.capital_gain_distributions)
        .sum();

    let net_st_gain_loss = round_half_up(broker_short + k1_short);
    let net_lt_gain_loss = round_half_up(broker_long + k1_long + distributions);
    let net_capital_gain_loss = round_half_up(net_st_gain_loss + net_lt_gain_loss);

    if !net_st_gain_loss.is_zero() {
        lines.push(LineItem::new(
            FORM,
            "7",
            "Net short-term capital gain/loss",
            net_st_gain_loss,
        ));
    }
    if !net_lt_gain_loss.is_zero() {
        let mut item = LineItem::new(FORM, "15", "Net long-term capital gain/loss", net_lt_gain_loss);
        if !distributions.is_zero() {
            item = item.with_explanation(format!(
                "Includes ${} capital gain distributions",
                round_half_up(distributions)
            ));
        }
        lines.push(item);
    }
    lines.push(LineItem::new(
        FORM,
        "16",
        "Combined net gain/loss",
        net_capital_gain_loss,
    ));

    let loss_limit = *config.loss_limit.get(filing_status);
    let (capital_gain_for_1040, loss_carryover) = if net_capital_gain_loss >= Decimal::ZERO {
        (net_capital_gain_loss, Decimal::ZERO)
    } else {
        let allowed = net_capital_gain_loss.max(-loss_limit);
        (allowed, allowed - net_capital_gain_loss)
    };

    let mut line_21 = LineItem::new(
        FORM,
        "21",
        "Capital gain/loss for 1040 Line 7",
        capital_gain_for_1040,
    );
    if loss_carryover > Decimal::ZERO {
        line_21 = line_21.with_explanation(format!(
            "Loss limited to ${} ({filing_status}); ${loss_carryover} carries forward",
            loss_limit.normalize()
        ));
    }
    lines.push(line_21);

    debug!(
        %net_st_gain_loss,
        %net_lt_gain_loss,
        %capital_gain_for_1040,
        "Schedule D computed"
    );

    ScheduleDResult {
        net_st_gain_loss,
        net_lt_gain_loss,
        net_capital_gain_loss,
        capital_gain_for_1040,
        loss_carryover,
        lines,
    }
}
