//! Fixed-point field specifications.
//!
//! A `DecimalSpec` mirrors a `NUMERIC(max_digits, decimal_places)` column:
//! values are rejected when they carry more digits than the column can hold,
//! and rendered quantized to exactly `decimal_places` places.

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalSpec {
    pub max_digits: Option<u32>,
    pub decimal_places: u32,
}

/// Money amounts (unit prices).
pub const MONEY: DecimalSpec = DecimalSpec { max_digits: Some(30), decimal_places: 3 };
/// Width/height in millimetres.
pub const LENGTH_MM: DecimalSpec = DecimalSpec { max_digits: Some(4), decimal_places: 1 };
/// Weight in grams.
pub const WEIGHT_G: DecimalSpec = DecimalSpec { max_digits: Some(5), decimal_places: 1 };
/// Diagonal screen size in inches.
pub const SCREEN_INCH: DecimalSpec = DecimalSpec { max_digits: Some(4), decimal_places: 2 };

impl DecimalSpec {
    pub const fn new(max_digits: u32, decimal_places: u32) -> Self {
        Self { max_digits: Some(max_digits), decimal_places }
    }

    pub fn max_whole_digits(&self) -> Option<u32> {
        self.max_digits.map(|max| max.saturating_sub(self.decimal_places))
    }

    /// Check that `value` fits the column; returns the first violated rule.
    pub fn validate(&self, value: &Decimal) -> Result<(), String> {
        let normalized = value.normalize();
        let digits = normalized.mantissa().unsigned_abs().to_string().len() as u32;
        self.validate_digits(digits, -i64::from(normalized.scale()))
    }

    /// Same rules over a significand of `digits` digits times `10^exponent`.
    ///
    /// Used for values that parse as numbers but fall outside what `Decimal`
    /// can hold.
    pub fn validate_digits(&self, digits: u32, exponent: i64) -> Result<(), String> {
        let digits = u64::from(digits);
        let (total, whole, places) = if exponent >= 0 {
            let total = digits.saturating_add(exponent.unsigned_abs());
            (total, total, 0)
        } else {
            let places = exponent.unsigned_abs();
            if places > digits {
                (places, 0, places)
            } else {
                (digits, digits - places, places)
            }
        };

        if let Some(max) = self.max_digits {
            if total > u64::from(max) {
                return Err(format!("Ensure that there are no more than {max} digits in total."));
            }
        }
        if places > u64::from(self.decimal_places) {
            return Err(format!(
                "Ensure that there are no more than {} decimal places.",
                self.decimal_places
            ));
        }
        if let Some(max_whole) = self.max_whole_digits() {
            if whole > u64::from(max_whole) {
                return Err(format!(
                    "Ensure that there are no more than {max_whole} digits before the decimal point."
                ));
            }
        }
        Ok(())
    }

    /// Round (half even) and rescale to exactly `decimal_places` places.
    pub fn quantize(&self, value: Decimal) -> Decimal {
        let mut rounded = value.round_dp(self.decimal_places);
        rounded.rescale(self.decimal_places);
        rounded
    }

    /// Text form used when a field coerces decimals to strings.
    pub fn to_text(&self, value: Decimal) -> String {
        self.quantize(value).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn accepts_values_within_precision() {
        assert!(LENGTH_MM.validate(&d("146.7")).is_ok());
        assert!(LENGTH_MM.validate(&d("0")).is_ok());
        assert!(SCREEN_INCH.validate(&d("5.80")).is_ok());
        assert!(WEIGHT_G.validate(&d("1200.0")).is_ok());
    }

    #[test]
    fn rejects_too_many_digits() {
        assert_eq!(
            LENGTH_MM.validate(&d("12345")).unwrap_err(),
            "Ensure that there are no more than 4 digits in total."
        );
    }

    #[test]
    fn digit_rules_apply_beyond_decimal_range() {
        assert_eq!(
            MONEY.validate_digits(1, -30).unwrap_err(),
            "Ensure that there are no more than 3 decimal places."
        );
        assert_eq!(
            LENGTH_MM.validate_digits(1, 40).unwrap_err(),
            "Ensure that there are no more than 4 digits in total."
        );
        assert!(WEIGHT_G.validate_digits(12, 2).is_ok());
    }

    #[test]
    fn rejects_too_many_places() {
        assert_eq!(
            LENGTH_MM.validate(&d("71.25")).unwrap_err(),
            "Ensure that there are no more than 1 decimal places."
        );
    }

    #[test]
    fn rejects_too_many_whole_digits() {
        assert_eq!(
            SCREEN_INCH.validate(&d("100.5")).unwrap_err(),
            "Ensure that there are no more than 2 digits before the decimal point."
        );
    }

    #[test]
    fn small_fractions_count_leading_zero_places() {
        // 0.005 has three decimal places even though it has one significant digit.
        assert!(MONEY.validate(&d("0.005")).is_ok());
        assert!(SCREEN_INCH.validate(&d("0.005")).is_err());
    }

    #[test]
    fn quantizes_to_fixed_places() {
        assert_eq!(MONEY.to_text(d("12.99")), "12.990");
        assert_eq!(LENGTH_MM.to_text(d("70")), "70.0");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: anything quantized to a spec's places and within its
            /// whole-digit budget passes that spec's validation.
            #[test]
            fn quantized_values_fit(whole in 0i64..1000, frac in 0i64..10) {
                let value = Decimal::new(whole * 10 + frac, 1);
                let quantized = WEIGHT_G.quantize(value);
                prop_assert!(WEIGHT_G.validate(&quantized).is_ok());
            }

            /// Property: quantizing twice is the same as quantizing once.
            #[test]
            fn quantize_is_idempotent(raw in -1_000_000i64..1_000_000, scale in 0u32..6) {
                let value = Decimal::new(raw, scale);
                let once = MONEY.quantize(value);
                prop_assert_eq!(MONEY.quantize(once), once);
                prop_assert_eq!(once.scale(), 3);
            }
        }
    }
}
