//! Progressive bracket tax and the Qualified Dividends and Capital Gain Tax
//! Worksheet (Form 1040 instructions, line 16).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{CapitalGainsConfig, FilingStatus, TaxBracket};

/// Tax on `income` under a progressive schedule, rounded to the cent.
///
/// Each bracket taxes the slice of income between its lower bound and its
/// upper bound. Zero or negative income yields zero.
pub fn progressive_tax(
    income: Decimal,
    brackets: &[TaxBracket],
) -> Decimal {
    let mut tax = Decimal::ZERO;

    for bracket in brackets {
        if income <= bracket.min_income {
            break;
        }
        let top = match bracket.max_income {
            Some(max) => income.min(max),
            None => income,
        };
        tax += (top - bracket.min_income) * bracket.rate;
    }

    round_half_up(tax)
}

/// Rate of the bracket that `income` falls in. Income at a bracket's upper
/// bound belongs to that bracket; zero or negative income gets the lowest rate.
pub fn marginal_rate(
    income: Decimal,
    brackets: &[TaxBracket],
) -> Decimal {
    brackets
        .iter()
        .find(|bracket| bracket.contains(income))
        .or_else(|| brackets.first())
        .map(|bracket| bracket.rate)
        .unwrap_or(Decimal::ZERO)
}

/// Inputs to the preferential-rate worksheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferentialRateInput {
    pub taxable_income: Decimal,
    pub qualified_dividends: Decimal,
    pub net_long_term_gain: Decimal,
    pub net_short_term_gain: Decimal,
}

/// Breakdown of the worksheet, kept for the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferentialRateResult {
    pub net_capital_gain: Decimal,
    pub preferential_income: Decimal,
    pub ordinary_income: Decimal,
    pub ordinary_tax: Decimal,
    pub at_zero_rate: Decimal,
    pub at_fifteen_rate: Decimal,
    pub at_twenty_rate: Decimal,
    pub worksheet_tax: Decimal,
    pub regular_tax: Decimal,
    /// The lesser of `worksheet_tax` and `regular_tax`.
    pub tax: Decimal,
}

/// Net capital gain: net long-term gain reduced by any net short-term loss,
/// never below zero.
pub fn net_capital_gain(
    net_long_term_gain: Decimal,
    net_short_term_gain: Decimal,
) -> Decimal {
    non_negative(net_long_term_gain + net_short_term_gain.min(Decimal::ZERO))
}

/// Runs the Qualified Dividends and Capital Gain Tax Worksheet.
///
/// Preferential income is stacked on top of ordinary income and split across
/// the 0%, 15% and 20% bands. The result never exceeds the regular bracket
/// tax on the same taxable income.
pub fn preferential_rate_tax(
    input: &PreferentialRateInput,
    status: FilingStatus,
    brackets: &[TaxBracket],
    config: &CapitalGainsConfig,
) -> PreferentialRateResult {
    let taxable_income = input.taxable_income;
    let regular_tax = progressive_tax(taxable_income, brackets);

    if taxable_income <= Decimal::ZERO {
        return PreferentialRateResult::default();
    }

    let net_capital_gain = net_capital_gain(input.net_long_term_gain, input.net_short_term_gain);
    let preferential_income = (input.qualified_dividends + net_capital_gain).min(taxable_income);

    if preferential_income <= Decimal::ZERO {
        return PreferentialRateResult {
            net_capital_gain,
            ordinary_income: taxable_income,
            ordinary_tax: regular_tax,
            worksheet_tax: regular_tax,
            regular_tax,
            tax: regular_tax,
            ..PreferentialRateResult::default()
        };
    }

    let ordinary_income = non_negative(taxable_income - preferential_income);
    let ordinary_tax = progressive_tax(ordinary_income, brackets);

    let zero_room = non_negative(*config.zero_rate_max.get(status) - ordinary_income);
    let at_zero_rate = preferential_income.min(zero_room);
    let remaining = preferential_income - at_zero_rate;

    let fifteen_room =
        non_negative(*config.fifteen_rate_max.get(status) - ordinary_income - at_zero_rate);
    let at_fifteen_rate = remaining.min(fifteen_room);
    let at_twenty_rate = remaining - at_fifteen_rate;

    let preferential_tax =
        round_half_up(at_fifteen_rate * config.fifteen_rate + at_twenty_rate * config.twenty_rate);
    let worksheet_tax = round_half_up(ordinary_tax + preferential_tax);
    let tax = worksheet_tax.min(regular_tax);

    debug!(
        %taxable_income,
        %preferential_income,
        %worksheet_tax,
        %regular_tax,
        "Preferential-rate worksheet computed"
    );

    PreferentialRateResult {
        net_capital_gain,
        preferential_income,
        ordinary_income,
        ordinary_tax,
        at_zero_rate,
        at_fifteen_rate,
        at_twenty_rate,
        worksheet_tax,
        regular_tax,
        tax,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::TaxYearConfig;

    fn config() -> TaxYearConfig {
        TaxYearConfig::for_year(2025).unwrap()
    }

    // =========================================================================
    // progressive_tax tests
    // =========================================================================

    #[test]
    fn progressive_tax_is_zero_for_zero_income() {
        let config = config();

        let tax = progressive_tax(dec!(0), config.brackets_for(FilingStatus::Single));

        assert_eq!(tax, dec!(0));
    }

    #[test]
    fn progressive_tax_spans_two_brackets() {
        let config = config();

        let tax = progressive_tax(
            dec!(20000),
            config.brackets_for(FilingStatus::MarriedFilingSeparately),
        );

        // 11,925 × 10% + 8,075 × 12%
        assert_eq!(tax, dec!(2161.50));
    }

    #[test]
    fn progressive_tax_matches_published_base_tax_at_bounds() {
        let config = config();

        for status in FilingStatus::ALL {
            let brackets = config.brackets_for(status);
            for bracket in brackets.iter().skip(1) {
                let tax = progressive_tax(bracket.min_income, brackets);
                assert_eq!(tax, round_half_up(bracket.base_tax), "{status} at {}", bracket.min_income);
            }
        }
    }

    #[test]
    fn progressive_tax_is_monotonic_for_every_status() {
        let config = config();

        for status in FilingStatus::ALL {
            let brackets = config.brackets_for(status);
            let mut previous = Decimal::ZERO;
            let mut income = Decimal::ZERO;
            while income <= dec!(900000) {
                let tax = progressive_tax(income, brackets);
                assert!(tax >= previous, "{status} tax decreased at {income}");
                previous = tax;
                income += dec!(2500);
            }
        }
    }

    #[test]
    fn progressive_tax_is_linear_inside_a_bracket() {
        let config = config();
        let brackets = config.brackets_for(FilingStatus::MarriedFilingJointly);

        let low = progressive_tax(dec!(100000), brackets);
        let mid = progressive_tax(dec!(150000), brackets);
        let high = progressive_tax(dec!(200000), brackets);

        assert_eq!(mid - low, high - mid);
        assert_eq!(high - mid, dec!(11000.00));
    }

    #[test]
    fn progressive_tax_uses_top_rate_above_last_bound() {
        let config = config();
        let brackets = config.brackets_for(FilingStatus::Single);

        let tax = progressive_tax(dec!(726350), brackets);

        assert_eq!(tax, dec!(188769.75) + dec!(37000.00));
    }

    // =========================================================================
    // marginal_rate tests
    // =========================================================================

    #[test]
    fn marginal_rate_includes_upper_bound() {
        let config = config();
        let brackets = config.brackets_for(FilingStatus::Single);

        assert_eq!(marginal_rate(dec!(48475), brackets), dec!(0.12));
        assert_eq!(marginal_rate(dec!(48476), brackets), dec!(0.22));
        assert_eq!(marginal_rate(dec!(5000000), brackets), dec!(0.37));
    }

    #[test]
    fn marginal_rate_floors_at_lowest_bracket() {
        let config = config();
        let brackets = config.brackets_for(FilingStatus::Single);

        assert_eq!(marginal_rate(dec!(0), brackets), dec!(0.10));
        assert_eq!(marginal_rate(dec!(-2500), brackets), dec!(0.10));
        assert_eq!(marginal_rate(dec!(0.01), brackets), dec!(0.10));
        assert_eq!(marginal_rate(dec!(100), &[]), dec!(0));
    }

    // =========================================================================
    // preferential_rate_tax tests
    // =========================================================================

    #[test]
    fn preferential_rate_tax_fills_zero_band_first() {
        let config = config();
        let input = PreferentialRateInput {
            taxable_income: dec!(60000),
            qualified_dividends: dec!(0),
            net_long_term_gain: dec!(20000),
            net_short_term_gain: dec!(0),
        };

        let result = preferential_rate_tax(
            &input,
            FilingStatus::Single,
            config.brackets_for(FilingStatus::Single),
            &config.capital_gains,
        );

        assert_eq!(result.ordinary_income, dec!(40000));
        assert_eq!(result.at_zero_rate, dec!(8350));
        assert_eq!(result.at_fifteen_rate, dec!(11650));
        // 1,192.50 + 28,075 × 12% = 4,561.50; 11,650 × 15% = 1,747.50
        assert_eq!(result.worksheet_tax, dec!(6309.00));
        assert_eq!(result.tax, dec!(6309.00));
    }

    #[test]
    fn preferential_rate_tax_nets_short_term_loss() {
        let config = config();
        let input = PreferentialRateInput {
            taxable_income: dec!(100000),
            qualified_dividends: dec!(0),
            net_long_term_gain: dec!(10000),
            net_short_term_gain: dec!(-4000),
        };

        let result = preferential_rate_tax(
            &input,
            FilingStatus::MarriedFilingJointly,
            config.brackets_for(FilingStatus::MarriedFilingJointly),
            &config.capital_gains,
        );

        assert_eq!(result.net_capital_gain, dec!(6000));
        assert_eq!(result.preferential_income, dec!(6000));
    }

    #[test]
    fn preferential_rate_tax_returns_regular_tax_without_preferential_income() {
        let config = config();
        let brackets = config.brackets_for(FilingStatus::Single);
        let input = PreferentialRateInput {
            taxable_income: dec!(50000),
            net_long_term_gain: dec!(-2000),
            ..PreferentialRateInput::default()
        };

        let result =
            preferential_rate_tax(&input, FilingStatus::Single, brackets, &config.capital_gains);

        assert_eq!(result.tax, progressive_tax(dec!(50000), brackets));
    }

    #[test]
    fn preferential_rate_tax_caps_preferential_income_at_taxable_income() {
        let config = config();
        let brackets = config.brackets_for(FilingStatus::HeadOfHousehold);
        let input = PreferentialRateInput {
            taxable_income: dec!(30000),
            qualified_dividends: dec!(50000),
            ..PreferentialRateInput::default()
        };

        let result = preferential_rate_tax(
            &input,
            FilingStatus::HeadOfHousehold,
            brackets,
            &config.capital_gains,
        );

        assert_eq!(result.preferential_income, dec!(30000));
        assert_eq!(result.tax, dec!(0));
    }

    #[test]
    fn preferential_rate_tax_never_exceeds_regular_tax() {
        let config = config();

        for status in FilingStatus::ALL {
            let brackets = config.brackets_for(status);
            let mut taxable = dec!(0);
            while taxable <= dec!(800000) {
                for share in [dec!(0.1), dec!(0.5), dec!(1.2)] {
                    let input = PreferentialRateInput {
                        taxable_income: taxable,
                        qualified_dividends: round_half_up(taxable * share / dec!(2)),
                        net_long_term_gain: round_half_up(taxable * share / dec!(2)),
                        net_short_term_gain: dec!(-1000),
                    };
                    let result =
                        preferential_rate_tax(&input, status, brackets, &config.capital_gains);
                    assert!(
                        result.tax <= progressive_tax(taxable, brackets),
                        "{status} at {taxable}"
                    );
                }
                taxable += dec!(25000);
            }
        }
    }
}
