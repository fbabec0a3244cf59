//! Simplified tax withholding
//!
//! Withholding is a flat percentage of the gross amount, rounded to cents
//! (half away from zero).

use rust_decimal::{Decimal, RoundingStrategy};

use crate::shifts::error::{ShiftError, ShiftResult};

/// Withholding rate applied when a shift has no explicit tax amount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxPolicy {
    default_rate_percent: Decimal,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            default_rate_percent: Decimal::from(11),
        }
    }
}

impl TaxPolicy {
    pub fn new(default_rate_percent: Decimal) -> ShiftResult<Self> {
        validate_rate(default_rate_percent)?;
        Ok(Self {
            default_rate_percent,
        })
    }

    pub fn default_rate_percent(&self) -> Decimal {
        self.default_rate_percent
    }

    /// Tax withheld on `gross` at `rate` percent (default rate when `None`)
    pub fn withholding(&self, gross: Decimal, rate: Option<Decimal>) -> ShiftResult<Decimal> {
        let rate = rate.unwrap_or(self.default_rate_percent);
        validate_rate(rate)?;

        gross
            .checked_mul(rate)
            .and_then(|amount| amount.checked_div(Decimal::from(100)))
            .map(to_cents)
            .ok_or_else(|| ShiftError::Validation("Gross amount is out of range".to_string()))
    }
}

fn validate_rate(rate: Decimal) -> ShiftResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::from(100) {
        return Err(ShiftError::Validation(
            "Tax rate must be between 0 and 100 percent".to_string(),
        ));
    }
    Ok(())
}

/// Round to two decimal places and fix the scale at 2
pub fn to_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_default_rate() {
        let policy = TaxPolicy::default();
        assert_eq!(policy.withholding(dec("1500.00"), None).unwrap(), dec("165.00"));
    }

    #[test]
    fn test_rate_override() {
        let policy = TaxPolicy::default();
        assert_eq!(
            policy.withholding(dec("1000"), Some(dec("27.5"))).unwrap(),
            dec("275.00")
        );
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        let policy = TaxPolicy::new(dec("10")).unwrap();
        assert_eq!(policy.withholding(dec("0.05"), None).unwrap(), dec("0.01"));

        let policy = TaxPolicy::default();
        // 333.33 * 11% = 36.6663
        assert_eq!(policy.withholding(dec("333.33"), None).unwrap(), dec("36.67"));
    }

    #[test]
    fn test_result_has_two_decimal_places() {
        let policy = TaxPolicy::default();
        let tax = policy.withholding(dec("100"), None).unwrap();
        assert_eq!(tax.to_string(), "11.00");
    }

    #[test]
    fn test_zero_rate_and_zero_gross() {
        let policy = TaxPolicy::new(Decimal::ZERO).unwrap();
        assert_eq!(policy.withholding(dec("1200"), None).unwrap(), Decimal::ZERO);
        assert_eq!(TaxPolicy::default().withholding(Decimal::ZERO, None).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_gross_is_an_error() {
        let policy = TaxPolicy::default();
        assert!(matches!(
            policy.withholding(Decimal::MAX, None),
            Err(ShiftError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_rate() {
        assert!(TaxPolicy::new(dec("-1")).is_err());
        assert!(TaxPolicy::new(dec("100.01")).is_err());
        assert!(TaxPolicy::default().withholding(dec("10"), Some(dec("101"))).is_err());
    }
}
