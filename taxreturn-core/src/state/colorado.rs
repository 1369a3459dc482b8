//! Colorado Form 104 with nonresident apportionment (Form 104PN).
//!
//! Colorado taxes federal taxable income, adjusted by state additions and
//! subtractions, at a flat rate. A nonresident owes the share of that tax
//! matching Colorado-source income over federal total income.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculations::common::{clamp_fraction, non_negative, ratio, round_half_up};
use crate::calculations::return_calc::{Form1040Result, ReturnError, calculate_return};
use crate::models::{ColoradoConfig, LineItem, TaxYearConfig, TaxpayerProfile};

const FORM: &str = "CO Form 104";
const FORM_PN: &str = "CO Form 104PN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColoradoForm104Result {
    pub federal_taxable_income: Decimal,
    pub additions: Decimal,
    pub subtractions: Decimal,
    pub co_taxable_income: Decimal,
    pub tax_before_apportionment: Decimal,
    pub is_nonresident: bool,
    pub source_income: Decimal,
    /// Colorado-source share of total income, in `[0, 1]`.
    pub apportionment: Decimal,
    pub co_tax: Decimal,
    pub lines: Vec<LineItem>,
}

/// Colorado-source income from K-1s: rental, ordinary business income,
/// guaranteed payments and interest. Every K-1 is treated as coming from a
/// Colorado partnership.
pub fn colorado_source_income(profile: &TaxpayerProfile) -> Decimal {
    profile
        .schedule_k1s
        .iter()
        .map(|k1| {
            k1.net_rental_income
                + k1.ordinary_business_income
                + k1.guaranteed_payments
                + k1.interest_income
        })
        .sum()
}

pub fn calculate_colorado_104(
    federal: &Form1040Result,
    profile: &TaxpayerProfile,
    config: &ColoradoConfig,
) -> ColoradoForm104Result {
    let mut lines = vec![
        LineItem::new(
            FORM,
            "1",
            "Federal taxable income",
            federal.taxable_income,
        )
        .with_explanation("From federal Form 1040, Line 15"),
    ];

    let mut additions = Decimal::ZERO;
    if profile.uses_itemized_deductions && profile.state_local_tax_deduction > Decimal::ZERO {
        additions += profile.state_local_tax_deduction;
        lines.push(
            LineItem::new(
                FORM,
                "2",
                "State income tax addback",
                profile.state_local_tax_deduction,
            )
            .with_explanation("SALT deducted on federal Schedule A"),
        );
    }

    let inputs = &profile.colorado;
    let mut subtractions = Decimal::ZERO;
    if inputs.tabor_refund > Decimal::ZERO {
        subtractions += inputs.tabor_refund;
        lines.push(LineItem::new(
            FORM,
            "Sub",
            "TABOR refund subtraction",
            inputs.tabor_refund,
        ));
    }
    let age = profile.taxpayer_age;
    if inputs.pension_income > Decimal::ZERO && age >= config.pension_min_age {
        let limit = if age >= config.pension_senior_age {
            config.pension_subtraction_senior
        } else {
            config.pension_subtraction
        };
        let pension = inputs.pension_income.min(limit);
        subtractions += pension;
        lines.push(
            LineItem::new(FORM, "Sub", "Pension and annuity subtraction", pension)
                .with_explanation(format!("Age {age}: up to ${}", limit.normalize())),
        );
    }

    let co_taxable_income =
        non_negative(round_half_up(federal.taxable_income + additions - subtractions));
    lines.push(LineItem::new(
        FORM,
        "4",
        "Colorado taxable income",
        co_taxable_income,
    ));

    let tax_before_apportionment = round_half_up(co_taxable_income * config.tax_rate);
    lines.push(
        LineItem::new(FORM, "5", "Colorado tax", tax_before_apportionment).with_explanation(
            format!("${co_taxable_income} × {}", config.tax_rate),
        ),
    );

    let is_nonresident = profile.foreign_address || profile.state != config.state_code;
    let (source_income, apportionment, co_tax) = if is_nonresident
        && federal.total_income > Decimal::ZERO
    {
        let source_income = round_half_up(
            inputs
                .source_income
                .unwrap_or_else(|| colorado_source_income(profile)),
        );
        let apportionment = ratio(source_income, federal.total_income)
            .map(clamp_fraction)
            .unwrap_or(Decimal::ONE);
        let co_tax = round_half_up(tax_before_apportionment * apportionment);

        lines.push(LineItem::new(
            FORM_PN,
            "36",
            "Colorado-source income",
            source_income,
        ));
        lines.push(
            LineItem::new(
                FORM_PN,
                "37",
                "Apportionment percentage",
                round_half_up(apportionment * Decimal::ONE_HUNDRED),
            )
            .with_explanation(format!(
                "${source_income} / ${} total income",
                federal.total_income
            )),
        );
        lines.push(
            LineItem::new(FORM, "7", "Colorado tax (apportioned)", co_tax).with_explanation(
                format!("${tax_before_apportionment} × {}", apportionment.round_dp(4)),
            ),
        );
        (source_income, apportionment, co_tax)
    } else {
        debug!(is_nonresident, "Colorado tax not apportioned");
        lines.push(LineItem::new(
            FORM,
            "7",
            "Colorado tax",
            tax_before_apportionment,
        ));
        (Decimal::ZERO, Decimal::ONE, tax_before_apportionment)
    };

    info!(%co_taxable_income, %apportionment, %co_tax, "Colorado return computed");

    ColoradoForm104Result {
        federal_taxable_income: federal.taxable_income,
        additions,
        subtractions,
        co_taxable_income,
        tax_before_apportionment,
        is_nonresident,
        source_income,
        apportionment,
        co_tax,
        lines,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullReturn {
    pub federal: Form1040Result,
    pub colorado: Option<ColoradoForm104Result>,
}

/// Federal return, plus Colorado when the profile has a Colorado filing
/// obligation.
pub fn calculate_full_return(
    profile: &TaxpayerProfile,
    config: &TaxYearConfig,
) -> Result<FullReturn, ReturnError> {
    let federal = calculate_return(profile, config)?;
    let colorado = profile
        .colorado
        .has_filing_obligation
        .then(|| calculate_colorado_104(&federal, profile, &config.colorado));

    Ok(FullReturn { federal, colorado })
}
