//! Shared arithmetic for the return engines.
//!
//! All currency amounts are rounded to the cent with [`round_half_up`] after
//! each multiplication, matching how the IRS worksheets are filled in by hand.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use taxreturn_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Floors a value at zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use taxreturn_core::calculations::common::non_negative;
///
/// assert_eq!(non_negative(dec!(-3500.00)), dec!(0));
/// assert_eq!(non_negative(dec!(42.10)), dec!(42.10));
/// ```
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Clamps a ratio into `[0, 1]`.
pub fn clamp_fraction(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, Decimal::ONE)
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn ratio(
    numerator: Decimal,
    denominator: Decimal,
) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Number of whole or partial `step`s in `amount`, for "per $1,000 or
/// fraction thereof" phase-outs. Non-positive amounts have no steps.
pub fn steps_rounded_up(
    amount: Decimal,
    step: Decimal,
) -> Decimal {
    if amount <= Decimal::ZERO || step <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (amount / step).ceil()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        let result = round_half_up(dec!(123.454));

        assert_eq!(result, dec!(123.45));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        let result = round_half_up(dec!(7064.775));

        assert_eq!(result, dec!(7064.78));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        let result = round_half_up(dec!(-123.455));

        assert_eq!(result, dec!(-123.46));
    }

    #[test]
    fn round_half_up_handles_large_values() {
        let result = round_half_up(dec!(999999.999));

        assert_eq!(result, dec!(1000000.00));
    }

    // =========================================================================
    // non_negative / clamp_fraction tests
    // =========================================================================

    #[test]
    fn non_negative_floors_losses_at_zero() {
        assert_eq!(non_negative(dec!(-0.01)), dec!(0));
        assert_eq!(non_negative(dec!(0.01)), dec!(0.01));
    }

    #[test]
    fn clamp_fraction_bounds_both_ends() {
        assert_eq!(clamp_fraction(dec!(-0.25)), dec!(0));
        assert_eq!(clamp_fraction(dec!(1.75)), dec!(1));
        assert_eq!(clamp_fraction(dec!(0.4)), dec!(0.4));
    }

    // =========================================================================
    // ratio tests
    // =========================================================================

    #[test]
    fn ratio_returns_none_for_zero_denominator() {
        assert_eq!(ratio(dec!(100), dec!(0)), None);
    }

    #[test]
    fn ratio_divides() {
        assert_eq!(ratio(dec!(25), dec!(100)), Some(dec!(0.25)));
    }

    // =========================================================================
    // steps_rounded_up tests
    // =========================================================================

    #[test]
    fn steps_rounded_up_counts_partial_step() {
        assert_eq!(steps_rounded_up(dec!(1000.01), dec!(1000)), dec!(2));
    }

    #[test]
    fn steps_rounded_up_counts_exact_steps() {
        assert_eq!(steps_rounded_up(dec!(100000), dec!(1000)), dec!(100));
    }

    #[test]
    fn steps_rounded_up_is_zero_for_non_positive_amount() {
        assert_eq!(steps_rounded_up(dec!(0), dec!(1000)), dec!(0));
        assert_eq!(steps_rounded_up(dec!(-5), dec!(1000)), dec!(0));
    }
}
