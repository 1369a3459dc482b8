//! Child tax credit, credit for other dependents and the additional child
//! tax credit (Schedule 8812).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up, steps_rounded_up};
use crate::models::{CreditConfig, Dependent, FilingStatus, LineItem};

const FORM: &str = "Schedule 8812";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCreditsResult {
    pub num_qualifying_children: usize,
    pub num_other_dependents: usize,
    pub gross_ctc: Decimal,
    pub gross_odc: Decimal,
    pub phaseout_reduction: Decimal,
    pub total_credit_after_phaseout: Decimal,
    /// Limited to the tax liability before credits.
    pub nonrefundable_credit: Decimal,
    pub refundable_actc: Decimal,
    pub lines: Vec<LineItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditInput {
    pub agi: Decimal,
    /// Income tax plus AMT.
    pub tax_liability: Decimal,
    pub earned_income: Decimal,
}

/// Computes Schedule 8812 for `dependents`.
///
/// The caller skips this entirely when there are no dependents.
pub fn calculate_tax_credits(
    dependents: &[Dependent],
    input: &CreditInput,
    filing_status: FilingStatus,
    config: &CreditConfig,
) -> TaxCreditsResult {
    let num_qualifying_children = dependents
        .iter()
        .filter(|d| d.is_qualifying_child_ctc)
        .count();
    let num_other_dependents = dependents.len() - num_qualifying_children;
    let children = Decimal::from(num_qualifying_children);

    let gross_ctc = config.child_credit * children;
    let gross_odc = config.other_dependent_credit * Decimal::from(num_other_dependents);
    let mut lines = vec![LineItem::new(
        FORM,
        "4",
        format!(
            "CTC: {num_qualifying_children} children × ${}",
            config.child_credit.normalize()
        ),
        gross_ctc,
    )];
    if gross_odc > Decimal::ZERO {
        lines.push(LineItem::new(
            FORM,
            "5",
            format!(
                "ODC: {num_other_dependents} dependents × ${}",
                config.other_dependent_credit.normalize()
            ),
            gross_odc,
        ));
    }

    let threshold = *config.phaseout_threshold.get(filing_status);
    let phaseout_reduction =
        steps_rounded_up(input.agi - threshold, config.phaseout_step) * config.phaseout_per_step;
    let total_credit_after_phaseout = non_negative(gross_ctc + gross_odc - phaseout_reduction);
    if phaseout_reduction > Decimal::ZERO {
        lines.push(
            LineItem::new(FORM, "12", "Phase-out reduction", phaseout_reduction).with_explanation(
                format!(
                    "AGI ${} over ${} threshold: ${} per ${} or part",
                    input.agi,
                    threshold.normalize(),
                    config.phaseout_per_step.normalize(),
                    config.phaseout_step.normalize()
                ),
            ),
        );
    }

    let nonrefundable_credit = total_credit_after_phaseout.min(non_negative(input.tax_liability));
    lines.push(LineItem::new(
        FORM,
        "14",
        "Nonrefundable credit",
        nonrefundable_credit,
    ));

    // Only the child portion is refundable.
    let unused_ctc = non_negative(gross_ctc.min(total_credit_after_phaseout) - nonrefundable_credit);
    let refundable_actc = if unused_ctc > Decimal::ZERO && num_qualifying_children > 0 {
        let per_child_cap = config.refundable_per_child * children;
        let earned_amount = round_half_up(
            non_negative(input.earned_income - config.earned_income_threshold)
                * config.earned_income_rate,
        );
        unused_ctc.min(per_child_cap).min(earned_amount)
    } else {
        Decimal::ZERO
    };
    if refundable_actc > Decimal::ZERO {
        lines.push(LineItem::new(
            FORM,
            "27",
            "Additional child tax credit (refundable)",
            refundable_actc,
        ));
    }

    debug!(
        num_qualifying_children,
        num_other_dependents,
        %phaseout_reduction,
        %nonrefundable_credit,
        %refundable_actc,
        "Tax credits computed"
    );

    TaxCreditsResult {
        num_qualifying_children,
        num_other_dependents,
        gross_ctc,
        gross_odc,
        phaseout_reduction,
        total_credit_after_phaseout,
        nonrefundable_credit,
        refundable_actc,
        lines,
    }
}
