//! Foreign earned income exclusion, Form 2555.
//!
//! The exclusion is evaluated with the stacking method: tax on the excluded
//! amount alone is subtracted from the tax without the exclusion. The
//! exclusion never changes self-employment tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::brackets::progressive_tax;
use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{FeieConfig, LineItem, TaxBracket};

const FORM: &str = "Form 2555";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form2555Result {
    pub days_in_foreign_country: u32,
    /// Physical presence test met.
    pub qualifies: bool,
    pub foreign_earned_income: Decimal,
    pub exclusion_amount: Decimal,
    pub tax_without_feie: Decimal,
    pub tax_on_excluded: Decimal,
    pub tax_with_feie: Decimal,
    pub savings: Decimal,
    pub is_beneficial: bool,
    pub lines: Vec<LineItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeieInput {
    pub days_in_foreign_country: u32,
    pub foreign_earned_income: Decimal,
    /// Income tax on the return as computed without the exclusion.
    pub tax_without_feie: Decimal,
}

pub fn evaluate_feie(
    input: &FeieInput,
    brackets: &[TaxBracket],
    config: &FeieConfig,
) -> Form2555Result {
    let days = input.days_in_foreign_country;
    let qualifies = days >= config.physical_presence_days;
    let foreign_earned_income = round_half_up(input.foreign_earned_income);

    let mut lines = vec![
        LineItem::new(
            FORM,
            "Physical presence",
            format!("Days in foreign country: {days}"),
            Decimal::from(days),
        )
        .with_explanation(format!(
            "Need {} full days in a 12-month period: {}",
            config.physical_presence_days,
            if qualifies {
                "qualifies"
            } else {
                "does not qualify"
            }
        )),
    ];

    if !qualifies {
        debug!(days, "FEIE not available: physical presence test not met");
        return Form2555Result {
            days_in_foreign_country: days,
            foreign_earned_income,
            tax_without_feie: input.tax_without_feie,
            tax_with_feie: input.tax_without_feie,
            lines,
            ..Form2555Result::default()
        };
    }

    let exclusion_amount = non_negative(foreign_earned_income).min(config.exclusion_limit);
    lines.push(
        LineItem::new(FORM, "42", "Foreign earned income exclusion", exclusion_amount)
            .with_explanation(format!(
                "Lesser of earned income ${foreign_earned_income} or limit ${}",
                config.exclusion_limit.normalize()
            )),
    );

    let tax_on_excluded = progressive_tax(exclusion_amount, brackets);
    let tax_with_feie = non_negative(input.tax_without_feie - tax_on_excluded);
    let savings = round_half_up(input.tax_without_feie - tax_with_feie);
    let is_beneficial = savings > Decimal::ZERO;

    lines.push(
        LineItem::new(FORM, "Analysis", "Income tax savings", savings).with_explanation(format!(
            "Tax without FEIE ${}, with FEIE ${tax_with_feie}. SE tax is unchanged. {}",
            input.tax_without_feie,
            if is_beneficial {
                "Beneficial"
            } else {
                "Not beneficial"
            }
        )),
    );

    debug!(%exclusion_amount, %tax_with_feie, %savings, "FEIE evaluated");

    Form2555Result {
        days_in_foreign_country: days,
        qualifies,
        foreign_earned_income,
        exclusion_amount,
        tax_without_feie: input.tax_without_feie,
        tax_on_excluded,
        tax_with_feie,
        savings,
        is_beneficial,
        lines,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{FilingStatus, TaxYearConfig};

    // =========================================================================
    // evaluate_feie tests
    // =========================================================================

    #[test]
    fn feie_requires_physical_presence() {
        let config = TaxYearConfig::for_year(2025).unwrap();
        let input = FeieInput {
            days_in_foreign_country: 329,
            foreign_earned_income: dec!(120000),
            tax_without_feie: dec!(15000),
        };

        let result = evaluate_feie(
            &input,
            config.brackets_for(FilingStatus::Single),
            &config.feie,
        );

        assert!(!result.qualifies);
        assert!(!result.is_beneficial);
        assert_eq!(result.exclusion_amount, dec!(0));
        assert_eq!(result.tax_with_feie, dec!(15000));
    }

    #[test]
    fn feie_stacks_excluded_income_at_the_bottom() {
        let config = TaxYearConfig::for_year(2025).unwrap();
        let brackets = config.brackets_for(FilingStatus::MarriedFilingSeparately);
        let input = FeieInput {
            days_in_foreign_country: 340,
            foreign_earned_income: dec!(20000),
            tax_without_feie: dec!(9000),
        };

        let result = evaluate_feie(&input, brackets, &config.feie);

        assert!(result.qualifies);
        assert_eq!(result.exclusion_amount, dec!(20000.00));
        assert_eq!(result.tax_on_excluded, dec!(2161.50));
        assert_eq!(result.tax_with_feie, dec!(6838.50));
        assert_eq!(result.savings, dec!(2161.50));
        assert!(result.is_beneficial);
    }

    #[test]
    fn feie_caps_exclusion_at_limit_and_floors_tax() {
        let config = TaxYearConfig::for_year(2025).unwrap();
        let input = FeieInput {
            days_in_foreign_country: 365,
            foreign_earned_income: dec!(250000),
            tax_without_feie: dec!(1000),
        };

        let result = evaluate_feie(
            &input,
            config.brackets_for(FilingStatus::Single),
            &config.feie,
        );

        assert_eq!(result.exclusion_amount, dec!(130000));
        assert_eq!(result.tax_with_feie, dec!(0));
        assert_eq!(result.savings, dec!(1000.00));
    }

    #[test]
    fn feie_is_not_beneficial_without_tax() {
        let config = TaxYearConfig::for_year(2025).unwrap();
        let input = FeieInput {
            days_in_foreign_country: 350,
            foreign_earned_income: dec!(10000),
            tax_without_feie: dec!(0),
        };

        let result = evaluate_feie(
            &input,
            config.brackets_for(FilingStatus::Single),
            &config.feie,
        );

        assert!(result.qualifies);
        assert!(!result.is_beneficial);
    }
}
