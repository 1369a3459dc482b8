use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One bracket of a progressive rate schedule.
///
/// `max_income` is `None` for the open-ended top bracket. `base_tax` is the
/// tax on all income below `min_income`, as printed in the IRS rate schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
    pub base_tax: Decimal,
}

impl TaxBracket {
    /// Builds a full schedule from `(upper_bound, rate)` pairs.
    ///
    /// Lower bounds and base tax are derived from the previous bracket, so the
    /// pairs must be in ascending order. Pass `None` as the last bound.
    pub fn schedule(pairs: &[(Option<Decimal>, Decimal)]) -> Vec<TaxBracket> {
        let mut brackets = Vec::with_capacity(pairs.len());
        let mut lower = Decimal::ZERO;
        let mut base_tax = Decimal::ZERO;

        for &(upper, rate) in pairs {
            brackets.push(TaxBracket {
                min_income: lower,
                max_income: upper,
                rate,
                base_tax,
            });
            if let Some(upper) = upper {
                base_tax += (upper - lower) * rate;
                lower = upper;
            }
        }

        brackets
    }

    /// Whether `income` falls inside this bracket (upper bound inclusive).
    pub fn contains(
        &self,
        income: Decimal,
    ) -> bool {
        income > self.min_income && self.max_income.is_none_or(|max| income <= max)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn schedule_derives_lower_bounds_and_base_tax() {
        let brackets = TaxBracket::schedule(&[
            (Some(dec!(11925)), dec!(0.10)),
            (Some(dec!(48475)), dec!(0.12)),
            (None, dec!(0.22)),
        ]);

        assert_eq!(brackets.len(), 3);
        assert_eq!(brackets[1].min_income, dec!(11925));
        assert_eq!(brackets[1].base_tax, dec!(1192.50));
        assert_eq!(brackets[2].min_income, dec!(48475));
        assert_eq!(brackets[2].base_tax, dec!(5578.50));
        assert_eq!(brackets[2].max_income, None);
    }

    #[test]
    fn contains_treats_upper_bound_as_inclusive() {
        let bracket = TaxBracket {
            min_income: dec!(11925),
            max_income: Some(dec!(48475)),
            rate: dec!(0.12),
            base_tax: dec!(1192.50),
        };

        assert!(bracket.contains(dec!(48475)));
        assert!(!bracket.contains(dec!(11925)));
        assert!(!bracket.contains(dec!(48475.01)));
    }
}
