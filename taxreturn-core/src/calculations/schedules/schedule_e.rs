//! Schedule E Part II, income from partnerships (K-1).
//!
//! Every K-1 box is tagged up front with the one place its amount is reported
//! ([`K1Destination`]). Totals are derived by filtering routed entries on that
//! tag, so an amount that belongs on the interest, dividend or capital gain
//! lines can never leak into the Schedule E total.
//!
//! | Box | Destination |
//! |-----|-------------|
//! | 1, 2, 3, 4, 7, 11 | Schedule E total |
//! | 12, 13 | Schedule E total (as deductions) |
//! | 5 | Form 1040 line 2b |
//! | 6a | Form 1040 line 3b |
//! | 6b | Form 1040 line 3a (subset of 6a) |
//! | 8 | Schedule D, short-term |
//! | 9a, 10 | Schedule D, long-term |
//! | 14 | Schedule SE |
//!
//! Married-filing-separately filers who lived apart get no passive rental loss
//! allowance (IRC §469(i)(5)(B)): negative Box 2 and Box 3 amounts are
//! suspended and carried forward instead of deducted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::round_half_up;
use crate::models::{FilingStatus, LineItem, ScheduleK1};

const FORM: &str = "Schedule E";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldingPeriod {
    ShortTerm,
    LongTerm,
}

/// Where a K-1 amount is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum K1Destination {
    ScheduleE,
    InterestLine,
    DividendLine,
    /// Box 6b is the qualified portion of Box 6a and adds to no total.
    QualifiedDividendLine,
    ScheduleD(HoldingPeriod),
    SelfEmployment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum K1Box {
    OrdinaryBusinessIncome,
    NetRentalIncome,
    OtherNetRentalIncome,
    GuaranteedPayments,
    Interest,
    Dividends,
    QualifiedDividends,
    Royalties,
    NetShortTermCapitalGain,
    NetLongTermCapitalGain,
    NetSection1231Gain,
    OtherIncome,
    Section179Deduction,
    OtherDeductions,
    SelfEmploymentEarnings,
}

impl K1Box {
    pub const ALL: [K1Box; 15] = [
        Self::NetRentalIncome,
        Self::OtherNetRentalIncome,
        Self::OrdinaryBusinessIncome,
        Self::GuaranteedPayments,
        Self::Interest,
        Self::Dividends,
        Self::QualifiedDividends,
        Self::Royalties,
        Self::NetShortTermCapitalGain,
        Self::NetLongTermCapitalGain,
        Self::NetSection1231Gain,
        Self::OtherIncome,
        Self::Section179Deduction,
        Self::OtherDeductions,
        Self::SelfEmploymentEarnings,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::OrdinaryBusinessIncome => "K-1 Box 1",
            Self::NetRentalIncome => "K-1 Box 2",
            Self::OtherNetRentalIncome => "K-1 Box 3",
            Self::GuaranteedPayments => "K-1 Box 4",
            Self::Interest => "K-1 Box 5",
            Self::Dividends => "K-1 Box 6a",
            Self::QualifiedDividends => "K-1 Box 6b",
            Self::Royalties => "K-1 Box 7",
            Self::NetShortTermCapitalGain => "K-1 Box 8",
            Self::NetLongTermCapitalGain => "K-1 Box 9a",
            Self::NetSection1231Gain => "K-1 Box 10",
            Self::OtherIncome => "K-1 Box 11",
            Self::Section179Deduction => "K-1 Box 12",
            Self::OtherDeductions => "K-1 Box 13",
            Self::SelfEmploymentEarnings => "K-1 Box 14",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::OrdinaryBusinessIncome => "Ordinary business income",
            Self::NetRentalIncome => "Net rental income",
            Self::OtherNetRentalIncome => "Other net rental income",
            Self::GuaranteedPayments => "Guaranteed payments",
            Self::Interest => "Interest income",
            Self::Dividends => "Dividends",
            Self::QualifiedDividends => "Qualified dividends",
            Self::Royalties => "Royalties",
            Self::NetShortTermCapitalGain => "Net short-term capital gain",
            Self::NetLongTermCapitalGain => "Net long-term capital gain",
            Self::NetSection1231Gain => "Net §1231 gain",
            Self::OtherIncome => "Other income",
            Self::Section179Deduction => "§179 deduction",
            Self::OtherDeductions => "Other deductions",
            Self::SelfEmploymentEarnings => "SE earnings",
        }
    }

    pub fn destination(&self) -> K1Destination {
        match self {
            Self::OrdinaryBusinessIncome
            | Self::NetRentalIncome
            | Self::OtherNetRentalIncome
            | Self::GuaranteedPayments
            | Self::Royalties
            | Self::OtherIncome
            | Self::Section179Deduction
            | Self::OtherDeductions => K1Destination::ScheduleE,
            Self::Interest => K1Destination::InterestLine,
            Self::Dividends => K1Destination::DividendLine,
            Self::QualifiedDividends => K1Destination::QualifiedDividendLine,
            Self::NetShortTermCapitalGain => K1Destination::ScheduleD(HoldingPeriod::ShortTerm),
            Self::NetLongTermCapitalGain | Self::NetSection1231Gain => {
                K1Destination::ScheduleD(HoldingPeriod::LongTerm)
            }
            Self::SelfEmploymentEarnings => K1Destination::SelfEmployment,
        }
    }

    /// Boxes 12 and 13 reduce the total they are routed to.
    fn is_deduction(&self) -> bool {
        matches!(self, Self::Section179Deduction | Self::OtherDeductions)
    }

    fn is_rental(&self) -> bool {
        matches!(self, Self::NetRentalIncome | Self::OtherNetRentalIncome)
    }

    fn note(&self) -> Option<&'static str> {
        match self.destination() {
            K1Destination::InterestLine => Some("Flows to Form 1040 Line 2b"),
            K1Destination::DividendLine => Some("Flows to Form 1040 Line 3b"),
            K1Destination::QualifiedDividendLine => Some("Flows to Form 1040 Line 3a"),
            K1Destination::ScheduleD(_) => Some("Flows to Schedule D"),
            K1Destination::SelfEmployment => Some("Added to Schedule SE calculation"),
            K1Destination::ScheduleE if *self == Self::GuaranteedPayments => {
                Some("Subject to self-employment tax")
            }
            K1Destination::ScheduleE => None,
        }
    }

    pub fn amount(
        &self,
        k1: &ScheduleK1,
    ) -> Decimal {
        match self {
            Self::OrdinaryBusinessIncome => k1.ordinary_business_income,
            Self::NetRentalIncome => k1.net_rental_income,
            Self::OtherNetRentalIncome => k1.other_net_rental_income,
            Self::GuaranteedPayments => k1.guaranteed_payments,
            Self::Interest => k1.interest_income,
            Self::Dividends => k1.dividends,
            Self::QualifiedDividends => k1.qualified_dividends,
            Self::Royalties => k1.royalties,
            Self::NetShortTermCapitalGain => k1.net_short_term_capital_gain,
            Self::NetLongTermCapitalGain => k1.net_long_term_capital_gain,
            Self::NetSection1231Gain => k1.net_section_1231_gain,
            Self::OtherIncome => k1.other_income,
            Self::Section179Deduction => k1.section_179_deduction,
            Self::OtherDeductions => k1.other_deductions,
            Self::SelfEmploymentEarnings => k1.self_employment_earnings,
        }
    }
}

/// One K-1 box after routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct K1Entry {
    pub partnership: String,
    pub k1_box: K1Box,
    /// Amount as reported on the K-1.
    pub reported: Decimal,
    /// Amount allowed this year; zero when suspended.
    pub allowed: Decimal,
    pub suspended: bool,
}

impl K1Entry {
    /// Contribution to the destination total: deductions count negative.
    pub fn signed_amount(&self) -> Decimal {
        if self.k1_box.is_deduction() {
            -self.allowed
        } else {
            self.allowed
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEResult {
    pub entries: Vec<K1Entry>,
    pub net_rental_income: Decimal,
    pub ordinary_business_income: Decimal,
    pub guaranteed_payments: Decimal,
    pub interest_income: Decimal,
    pub dividends: Decimal,
    pub qualified_dividends: Decimal,
    pub royalties: Decimal,
    pub net_st_capital_gain: Decimal,
    pub net_lt_capital_gain: Decimal,
    pub net_section_1231_gain: Decimal,
    pub other_income: Decimal,
    pub section_179_deduction: Decimal,
    pub other_deductions: Decimal,
    pub se_earnings_from_k1: Decimal,
    /// Rental losses disallowed this year and carried forward.
    pub suspended_rental_losses: Decimal,
    /// Line 26: only boxes routed to Schedule E.
    pub total_schedule_e_income: Decimal,
    pub warnings: Vec<String>,
    pub lines: Vec<LineItem>,
}

impl ScheduleEResult {
    /// Sum of allowed amounts for one box across all K-1s.
    pub fn box_total(
        &self,
        k1_box: K1Box,
    ) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.k1_box == k1_box)
            .map(|e| e.allowed)
            .sum()
    }

    /// Signed sum of every entry routed to `destination`.
    pub fn destination_total(
        &self,
        destination: K1Destination,
    ) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.k1_box.destination() == destination)
            .map(K1Entry::signed_amount)
            .sum()
    }

    /// K-1 earnings subject to SE tax: Box 14 plus guaranteed payments.
    pub fn self_employment_earnings(&self) -> Decimal {
        self.se_earnings_from_k1 + self.guaranteed_payments
    }
}

/// Routes every box of every K-1 and derives the Schedule E totals.
pub fn calculate_schedule_e(
    k1s: &[ScheduleK1],
    filing_status: FilingStatus,
) -> ScheduleEResult {
    let mut entries = Vec::new();
    let mut lines = Vec::new();
    let mut warnings = Vec::new();

    for k1 in k1s {
        for k1_box in K1Box::ALL {
            let reported = k1_box.amount(k1);
            if reported.is_zero() {
                continue;
            }

            let suspended = k1_box.is_rental()
                && reported < Decimal::ZERO
                && filing_status == FilingStatus::MarriedFilingSeparately;

            if suspended {
                warn!(
                    partnership = %k1.partnership_name,
                    loss = %reported,
                    "Passive rental loss suspended for MFS filer"
                );
                warnings.push(format!(
                    "Rental loss of ${} from {} suspended (MFS, IRC §469(i)(5)(B))",
                    round_half_up(-reported),
                    k1.partnership_name
                ));
                lines.push(
                    LineItem::new(
                        FORM,
                        k1_box.label(),
                        format!(
                            "K-1 rental loss from {} (SUSPENDED)",
                            k1.partnership_name
                        ),
                        Decimal::ZERO,
                    )
                    .with_explanation(format!(
                        "Actual loss: ${}. MFS filers get $0 passive loss allowance. \
                         Loss is suspended and carries forward.",
                        round_half_up(reported)
                    ))
                    .with_reference("IRC §469(i)(5)(B)"),
                );
            } else {
                let mut item = LineItem::new(
                    FORM,
                    k1_box.label(),
                    format!("{} from {}", k1_box.description(), k1.partnership_name),
                    round_half_up(reported),
                );
                if let Some(note) = k1_box.note() {
                    item = item.with_explanation(note);
                }
                lines.push(item);
            }

            entries.push(K1Entry {
                partnership: k1.partnership_name.clone(),
                k1_box,
                reported,
                allowed: if suspended { Decimal::ZERO } else { reported },
                suspended,
            });
        }
    }

    let mut result = ScheduleEResult {
        entries,
        warnings,
        ..ScheduleEResult::default()
    };

    result.net_rental_income = round_half_up(
        result.box_total(K1Box::NetRentalIncome) + result.box_total(K1Box::OtherNetRentalIncome),
    );
    result.ordinary_business_income = round_half_up(result.box_total(K1Box::OrdinaryBusinessIncome));
    result.guaranteed_payments = round_half_up(result.box_total(K1Box::GuaranteedPayments));
    result.interest_income = round_half_up(result.destination_total(K1Destination::InterestLine));
    result.dividends = round_half_up(result.destination_total(K1Destination::DividendLine));
    result.qualified_dividends =
        round_half_up(result.destination_total(K1Destination::QualifiedDividendLine));
    result.royalties = round_half_up(result.box_total(K1Box::Royalties));
    result.net_st_capital_gain = round_half_up(
        result.destination_total(K1Destination::ScheduleD(HoldingPeriod::ShortTerm)),
    );
    result.net_lt_capital_gain = round_half_up(result.box_total(K1Box::NetLongTermCapitalGain));
    result.net_section_1231_gain = round_half_up(result.box_total(K1Box::NetSection1231Gain));
    result.other_income = round_half_up(result.box_total(K1Box::OtherIncome));
    result.section_179_deduction = round_half_up(result.box_total(K1Box::Section179Deduction));
    result.other_deductions = round_half_up(result.box_total(K1Box::OtherDeductions));
    result.se_earnings_from_k1 =
        round_half_up(result.destination_total(K1Destination::SelfEmployment));
    result.suspended_rental_losses = round_half_up(
        -result
            .entries
            .iter()
            .filter(|e| e.suspended)
            .map(|e| e.reported)
            .sum::<Decimal>(),
    );
    result.total_schedule_e_income =
        round_half_up(result.destination_total(K1Destination::ScheduleE));

    lines.push(LineItem::new(
        FORM,
        "26",
        "Total Schedule E income",
        result.total_schedule_e_income,
    ));
    result.lines = lines;

    debug!(
        k1_count = k1s.len(),
        total = %result.total_schedule_e_income,
        suspended = %result.suspended_rental_losses,
        "Schedule E computed"
    );

    result
}
