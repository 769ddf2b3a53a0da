//! Numeric precision rules shared by the prompt and the parser.
//!
//! Every value is rounded half-to-even ("banker's rounding"): percentages to
//! 2 dp, geocoordinates to 6 dp. Same precision the `employment_data` table stores.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

pub const PERCENTAGE_DP: u32 = 2;
pub const COORDINATE_DP: u32 = 6;

pub fn round_percentage(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PERCENTAGE_DP, RoundingStrategy::MidpointNearestEven)
}

pub fn round_coordinate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(COORDINATE_DP, RoundingStrategy::MidpointNearestEven)
}

/// Converts a float to its shortest round-trip decimal form, so `12.34_f64`
/// becomes exactly `12.34`. `None` for NaN, infinities and out-of-range values.
pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_percentage_rounds_half_to_even() {
        assert_eq!(round_percentage(dec("12.345")), dec("12.34"));
        assert_eq!(round_percentage(dec("12.355")), dec("12.36"));
        assert_eq!(round_percentage(dec("0.125")), dec("0.12"));
        assert_eq!(round_percentage(dec("12.3451")), dec("12.35"));
    }

    #[test]
    fn test_coordinate_keeps_six_places() {
        assert_eq!(round_coordinate(dec("-3.1791234")), dec("-3.179123"));
        assert_eq!(round_coordinate(dec("51.4816665")), dec("51.481666"));
        assert_eq!(round_coordinate(dec("51.48")), dec("51.48"));
    }

    #[test]
    fn test_decimal_from_f64_is_shortest_form() {
        assert_eq!(decimal_from_f64(12.34), Some(dec("12.34")));
        assert_eq!(decimal_from_f64(-3.17), Some(dec("-3.17")));
        assert!(decimal_from_f64(f64::NAN).is_none());
    }
}
