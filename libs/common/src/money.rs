//! Currency amounts
//!
//! Callers always see amounts in major units (euros, not cents). Protocol
//! versions that transmit integer minor units convert at the wire boundary
//! with the helpers below.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::error::{MeteError, MeteResult};

/// Minor units per major unit
const MINOR_PER_MAJOR: i64 = 100;

/// Round a major-unit amount to whole minor units, halves away from zero
///
/// Every protocol version rounds through here, whether it sends decimals or
/// integer minor units.
pub fn round_to_minor(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a major-unit amount to integer minor units
///
/// Sub-cent precision is lost, see [`round_to_minor`].
pub fn to_minor_units(amount: Decimal) -> MeteResult<i64> {
    round_to_minor(amount)
        .checked_mul(Decimal::from(MINOR_PER_MAJOR))
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| MeteError::invalid_input(format!("Amount {} is out of range", amount)))
}

/// Convert integer minor units to a major-unit amount
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Parse an amount typed by a user
///
/// Accepts both `.` and `,` as decimal separator and at most two decimals.
/// The amount must be strictly positive; direction is expressed by the
/// operation (pay or deposit).
pub fn parse_amount(input: &str) -> MeteResult<Decimal> {
    let normalized = input.trim().replace(',', ".");
    let amount = Decimal::from_str(&normalized)
        .map_err(|_| MeteError::invalid_input(format!("'{}' is not an amount", input)))?;
    if amount <= Decimal::ZERO {
        return Err(MeteError::invalid_input("The amount must be positive"));
    }
    if amount.normalize().scale() > 2 {
        return Err(MeteError::invalid_input(format!(
            "'{}' has more than two decimals",
            input
        )));
    }
    Ok(amount)
}

/// How a server wants amounts to be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyFormat {
    pub currency: String,
    pub currency_before: bool,
    pub decimal_separator: String,
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self {
            currency: "€".to_string(),
            currency_before: false,
            decimal_separator: ",".to_string(),
        }
    }
}

impl MoneyFormat {
    /// Render an amount with two decimals and the currency symbol
    pub fn format(&self, amount: Decimal) -> String {
        let number = format!("{:.2}", round_to_minor(amount)).replace('.', &self.decimal_separator);
        if self.currency_before {
            format!("{}{}", self.currency, number)
        } else {
            format!("{} {}", number, self.currency)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_decimal_amounts_round_trip() {
        for minor in [-250_000, -1, 0, 1, 5, 99, 150, 1_999, 123_456_789] {
            let amount = from_minor_units(minor);
            assert_eq!(to_minor_units(amount).expect("in range"), minor);
            assert_eq!(from_minor_units(to_minor_units(amount).expect("in range")), amount);
        }
    }

    #[test]
    fn test_encode_rounds_to_nearest_minor_unit() {
        assert_eq!(to_minor_units(Decimal::new(1_005, 3)).expect("in range"), 101);
        assert_eq!(to_minor_units(Decimal::new(1_004, 3)).expect("in range"), 100);
        assert_eq!(to_minor_units(Decimal::new(-1_005, 3)).expect("in range"), -101);
        assert_eq!(to_minor_units(Decimal::new(15, 1)).expect("in range"), 150);
        assert_eq!(to_minor_units(Decimal::new(125, 3)).expect("in range"), 13);
        assert_eq!(round_to_minor(Decimal::new(125, 3)), Decimal::new(13, 2));
        assert_eq!(round_to_minor(Decimal::new(1_005, 3)), Decimal::new(101, 2));
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        assert!(to_minor_units(Decimal::MAX).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1.5").expect("valid"), Decimal::new(15, 1));
        assert_eq!(parse_amount(" 2,30 ").expect("valid"), Decimal::new(230, 2));
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-3").is_err());
        assert!(parse_amount("a lot").is_err());
        assert!(parse_amount("0,125").is_err());
        assert_eq!(parse_amount("1.500").expect("trailing zeros"), Decimal::new(1_500, 3));
    }

    #[test]
    fn test_format() {
        let euro = MoneyFormat::default();
        assert_eq!(euro.format(Decimal::new(15, 1)), "1,50 €");

        let dollar = MoneyFormat {
            currency: "$".to_string(),
            currency_before: true,
            decimal_separator: ".".to_string(),
        };
        assert_eq!(dollar.format(Decimal::new(-2, 0)), "$-2.00");
    }
}
