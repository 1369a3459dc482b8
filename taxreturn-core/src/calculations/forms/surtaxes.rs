//! Additional Medicare Tax (Form 8959) and Net Investment Income Tax
//! (Form 8960).

use rust_decimal::Decimal;

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{FilingStatus, SurtaxConfig};

/// 0.9% of combined Medicare wages and SE earnings over the threshold.
pub fn additional_medicare_tax(
    medicare_earnings: Decimal,
    filing_status: FilingStatus,
    config: &SurtaxConfig,
) -> Decimal {
    let excess = non_negative(medicare_earnings - *config.threshold.get(filing_status));
    round_half_up(excess * config.rate)
}

/// 3.8% of the lesser of net investment income and AGI over the threshold.
pub fn net_investment_income_tax(
    net_investment_income: Decimal,
    agi: Decimal,
    filing_status: FilingStatus,
    config: &SurtaxConfig,
) -> Decimal {
    let agi_excess = non_negative(agi - *config.threshold.get(filing_status));
    round_half_up(non_negative(net_investment_income).min(agi_excess) * config.rate)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::TaxYearConfig;

    // =========================================================================
    // additional_medicare_tax tests
    // =========================================================================

    #[test]
    fn additional_medicare_applies_above_mfs_threshold() {
        let config = TaxYearConfig::for_year(2025).unwrap();

        let tax = additional_medicare_tax(
            dec!(135000),
            FilingStatus::MarriedFilingSeparately,
            &config.additional_medicare,
        );

        assert_eq!(tax, dec!(90.00));
    }

    #[test]
    fn additional_medicare_is_zero_below_threshold() {
        let config = TaxYearConfig::for_year(2025).unwrap();

        let tax = additional_medicare_tax(
            dec!(240000),
            FilingStatus::MarriedFilingJointly,
            &config.additional_medicare,
        );

        assert_eq!(tax, dec!(0));
    }

    // =========================================================================
    // net_investment_income_tax tests
    // =========================================================================

    #[test]
    fn niit_taxes_lesser_of_income_and_excess() {
        let config = TaxYearConfig::for_year(2025).unwrap();

        let limited_by_excess =
            net_investment_income_tax(dec!(50000), dec!(210000), FilingStatus::Single, &config.niit);
        let limited_by_income =
            net_investment_income_tax(dec!(5000), dec!(300000), FilingStatus::Single, &config.niit);

        assert_eq!(limited_by_excess, dec!(380.00));
        assert_eq!(limited_by_income, dec!(190.00));
    }

    #[test]
    fn niit_is_zero_at_threshold() {
        let config = TaxYearConfig::for_year(2025).unwrap();

        let tax = net_investment_income_tax(
            dec!(40000),
            dec!(125000),
            FilingStatus::MarriedFilingSeparately,
            &config.niit,
        );

        assert_eq!(tax, dec!(0));
    }
}
