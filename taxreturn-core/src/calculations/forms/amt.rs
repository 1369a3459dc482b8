//! Alternative minimum tax, Form 6251.
//!
//! | Line | Description |
//! |------|-------------|
//! | 7    | Alternative minimum taxable income |
//! | 13   | Exemption after phase-out |
//! | 14   | Tentative minimum tax (26% / 28%) |
//! | 15   | AMT: tentative minimum tax over regular tax |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{AmtConfig, FilingStatus, LineItem};

const FORM: &str = "Form 6251";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmtInput {
    pub taxable_income: Decimal,
    pub regular_tax: Decimal,
    /// State and local taxes deducted on Schedule A, added back for AMT.
    pub salt_addback: Decimal,
    pub other_adjustments: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form6251Result {
    pub amti: Decimal,
    pub exemption: Decimal,
    pub amt_taxable_income: Decimal,
    pub tentative_minimum_tax: Decimal,
    pub amt: Decimal,
    pub lines: Vec<LineItem>,
}

pub fn calculate_amt(
    input: &AmtInput,
    filing_status: FilingStatus,
    config: &AmtConfig,
) -> Form6251Result {
    let amti = round_half_up(input.taxable_income + input.salt_addback + input.other_adjustments);

    let base_exemption = *config.exemption.get(filing_status);
    let phaseout_start = *config.phaseout_start.get(filing_status);
    let exemption = if amti <= phaseout_start {
        base_exemption
    } else {
        non_negative(round_half_up(
            base_exemption - (amti - phaseout_start) * config.phaseout_rate,
        ))
    };

    let amt_taxable_income = non_negative(amti - exemption);
    let breakpoint = *config.breakpoint.get(filing_status);
    let tentative_minimum_tax = if amt_taxable_income <= breakpoint {
        round_half_up(amt_taxable_income * config.low_rate)
    } else {
        round_half_up(
            breakpoint * config.low_rate + (amt_taxable_income - breakpoint) * config.high_rate,
        )
    };

    let amt = non_negative(tentative_minimum_tax - input.regular_tax);

    debug!(%amti, %exemption, %tentative_minimum_tax, %amt, "AMT computed");

    let lines = vec![
        LineItem::new(FORM, "7", "Alternative minimum taxable income", amti).with_explanation(
            format!(
                "Taxable income ${} + SALT ${} + other ${}",
                input.taxable_income, input.salt_addback, input.other_adjustments
            ),
        ),
        LineItem::new(FORM, "13", "AMT exemption", exemption),
        LineItem::new(FORM, "14", "Tentative minimum tax", tentative_minimum_tax),
        LineItem::new(FORM, "15", "Alternative minimum tax", amt)
            .with_explanation(format!("Regular tax ${}", input.regular_tax))
            .with_reference("https://www.irs.gov/instructions/i6251"),
    ];

    Form6251Result {
        amti,
        exemption,
        amt_taxable_income,
        tentative_minimum_tax,
        amt,
        lines,
    }
}
