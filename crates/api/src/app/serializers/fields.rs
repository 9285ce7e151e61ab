//! Per-field parsing of JSON input.
//!
//! Each parser turns one raw JSON value into a typed value or a single
//! user-facing message, worded the way dashboard clients expect.

use core::str::FromStr;

use myshop_core::DomainError;
use myshop_products::{Decimal, DecimalSpec};
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

pub const REQUIRED: &str = "This field is required.";
pub const NULL: &str = "This field may not be null.";
pub const BLANK: &str = "This field may not be blank.";
pub const INVALID_STRING: &str = "Not a valid string.";
pub const INVALID_INTEGER: &str = "A valid integer is required.";
pub const INVALID_NUMBER: &str = "A valid number is required.";
pub const INVALID_BOOLEAN: &str = "Must be a valid boolean.";
pub const INVALID_SLUG: &str =
    "Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens.";

/// Largest value a positive integer column accepts.
pub const MAX_POSITIVE_INTEGER: i64 = 2_147_483_647;

/// Type name reported in "wrong type" messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

pub fn does_not_exist(pk: &impl core::fmt::Display) -> String {
    format!("Invalid pk \"{pk}\" - object does not exist.")
}

#[derive(Debug, Clone, Copy)]
pub struct CharField {
    pub max_length: Option<usize>,
    pub allow_blank: bool,
}

impl CharField {
    pub const fn required(max_length: usize) -> Self {
        Self { max_length: Some(max_length), allow_blank: false }
    }

    pub const fn text() -> Self {
        Self { max_length: None, allow_blank: true }
    }

    /// Surrounding whitespace is trimmed before the blank and length checks.
    pub fn parse(&self, value: &Value) -> Result<String, String> {
        let text = match value {
            Value::Null => return Err(NULL.to_string()),
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return Err(INVALID_STRING.to_string()),
        };
        if text.is_empty() {
            return if self.allow_blank { Ok(text) } else { Err(BLANK.to_string()) };
        }
        if let Some(max) = self.max_length {
            if text.chars().count() > max {
                return Err(format!("Ensure this field has no more than {max} characters."));
            }
        }
        Ok(text)
    }
}

pub fn parse_slug(value: &Value) -> Result<String, String> {
    let slug = CharField::required(255).parse(value)?;
    if slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        Ok(slug)
    } else {
        Err(INVALID_SLUG.to_string())
    }
}

/// Non-negative integer that fits a positive integer column.
pub fn parse_u32(value: &Value) -> Result<u32, String> {
    let number = match value {
        Value::Null => return Err(NULL.to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if n.as_u64().is_some() {
                return Err(max_value_message());
            } else {
                integral(n.as_f64().unwrap_or(f64::NAN))?
            }
        }
        // Plain digits, optionally followed by a zero fraction such as "32.00".
        Value::String(s) => {
            let s = s.trim();
            let whole = match s.split_once('.') {
                Some((whole, fraction)) if fraction.bytes().all(|b| b == b'0') => whole,
                _ => s,
            };
            whole.parse::<i64>().map_err(|_| INVALID_INTEGER.to_string())?
        }
        _ => return Err(INVALID_INTEGER.to_string()),
    };

    if number < 0 {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }
    if number > MAX_POSITIVE_INTEGER {
        return Err(max_value_message());
    }
    u32::try_from(number).map_err(|_| max_value_message())
}

fn integral(value: f64) -> Result<i64, String> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_POSITIVE_INTEGER as f64 * 2.0 {
        Ok(value as i64)
    } else {
        Err(INVALID_INTEGER.to_string())
    }
}

fn max_value_message() -> String {
    format!("Ensure this value is less than or equal to {MAX_POSITIVE_INTEGER}.")
}

pub fn parse_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Null => Err(NULL.to_string()),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(INVALID_BOOLEAN.to_string()),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" | "t" | "y" => Ok(true),
            "false" | "0" | "no" | "off" | "f" | "n" => Ok(false),
            _ => Err(INVALID_BOOLEAN.to_string()),
        },
        _ => Err(INVALID_BOOLEAN.to_string()),
    }
}

/// Decimal checked against `spec` and quantized to its decimal places.
///
/// Accepts JSON numbers and numeric strings, including exponent notation.
pub fn parse_decimal(value: &Value, spec: DecimalSpec) -> Result<Decimal, String> {
    let text = match value {
        Value::Null => return Err(NULL.to_string()),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(INVALID_NUMBER.to_string()),
    };
    let decimal = match Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)) {
        Ok(decimal) => decimal,
        Err(_) => {
            // Well-formed but out of range: report the precision rule it breaks.
            if let Some((digits, exponent)) = significand(&text) {
                spec.validate_digits(digits, exponent)?;
            }
            return Err(INVALID_NUMBER.to_string());
        }
    };
    spec.validate(&decimal)?;
    Ok(spec.quantize(decimal))
}

/// Significant digit count and base-10 exponent of a numeric literal such
/// as `-12.50e-3`, with leading and trailing zeros dropped.
fn significand(text: &str) -> Option<(u32, i64)> {
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (number, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((number, exponent)) => (number, exponent.parse::<i64>().ok()?),
        None => (unsigned, 0),
    };
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{whole}{fraction}");
    let trimmed = digits.trim_start_matches('0');
    let significant = trimmed.trim_end_matches('0');
    if significant.is_empty() {
        return Some((1, 0));
    }
    let trailing = (trimmed.len() - significant.len()) as i64;
    let exponent = exponent
        .checked_sub(fraction.len() as i64)?
        .checked_add(trailing)?;
    Some((significant.len() as u32, exponent))
}

/// Render a decimal either as a quantized string or as a native JSON number.
pub fn render_decimal(value: Decimal, spec: DecimalSpec, coerce_to_string: bool) -> Value {
    if coerce_to_string {
        Value::String(spec.to_text(value))
    } else {
        serde_json::json!(spec.quantize(value).to_f64())
    }
}

/// One of a fixed set of wire values. Numbers are matched by their text.
pub fn parse_choice<T>(value: &Value) -> Result<T, String>
where
    T: FromStr<Err = DomainError>,
{
    let raw = match value {
        Value::Null => return Err(NULL.to_string()),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    };
    raw.parse::<T>().map_err(|err| match err {
        DomainError::Validation(msg) => msg,
        other => other.to_string(),
    })
}

/// Primary key of a related row. Existence is checked separately.
pub fn parse_pk<T: FromStr>(value: &Value) -> Result<T, String> {
    match value {
        Value::Null => Err(NULL.to_string()),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("\"{}\" is not a valid UUID.", s.trim())),
        other => Err(format!(
            "Incorrect type. Expected pk value, received {}.",
            type_name(other)
        )),
    }
}

pub fn parse_pk_list<T: FromStr>(value: &Value) -> Result<Vec<T>, String> {
    match value {
        Value::Null => Err(NULL.to_string()),
        Value::Array(items) => items.iter().map(parse_pk).collect(),
        other => Err(format!(
            "Expected a list of items but got type \"{}\".",
            type_name(other)
        )),
    }
}

pub fn parse_uuid<T: FromStr>(value: &Value) -> Result<T, String> {
    match value {
        Value::Null => Err(NULL.to_string()),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("\"{}\" is not a valid UUID.", s.trim())),
        other => Err(format!("\"{other}\" is not a valid UUID.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myshop_core::ManufacturerId;
    use myshop_products::{decimal, Speed};
    use serde_json::json;

    #[test]
    fn char_field_trims_and_checks_blank_and_length() {
        let field = CharField::required(5);
        assert_eq!(field.parse(&json!("  abc ")).unwrap(), "abc");
        assert_eq!(field.parse(&json!("   ")).unwrap_err(), BLANK);
        assert_eq!(field.parse(&json!(null)).unwrap_err(), NULL);
        assert_eq!(
            field.parse(&json!("abcdef")).unwrap_err(),
            "Ensure this field has no more than 5 characters."
        );
        assert_eq!(field.parse(&json!(true)).unwrap_err(), INVALID_STRING);
        assert_eq!(CharField::text().parse(&json!("")).unwrap(), "");
    }

    #[test]
    fn slug_allows_only_url_safe_characters() {
        assert_eq!(parse_slug(&json!("galaxy-s_9")).unwrap(), "galaxy-s_9");
        assert_eq!(parse_slug(&json!("galaxy s9")).unwrap_err(), INVALID_SLUG);
    }

    #[test]
    fn integers_accept_numbers_and_numeric_strings() {
        assert_eq!(parse_u32(&json!(64)).unwrap(), 64);
        assert_eq!(parse_u32(&json!("128")).unwrap(), 128);
        assert_eq!(parse_u32(&json!(32.0)).unwrap(), 32);
        assert_eq!(parse_u32(&json!(1.5)).unwrap_err(), INVALID_INTEGER);
        assert_eq!(parse_u32(&json!("lots")).unwrap_err(), INVALID_INTEGER);
        assert_eq!(parse_u32(&json!("32.00")).unwrap(), 32);
        assert_eq!(parse_u32(&json!("1e3")).unwrap_err(), INVALID_INTEGER);
        assert_eq!(parse_u32(&json!("1.5")).unwrap_err(), INVALID_INTEGER);
        assert_eq!(
            parse_u32(&json!(-1)).unwrap_err(),
            "Ensure this value is greater than or equal to 0."
        );
        assert_eq!(parse_u32(&json!(3_000_000_000u64)).unwrap_err(), max_value_message());
    }

    #[test]
    fn booleans_accept_common_spellings() {
        assert!(parse_bool(&json!("yes")).unwrap());
        assert!(!parse_bool(&json!(0)).unwrap());
        assert_eq!(parse_bool(&json!("maybe")).unwrap_err(), INVALID_BOOLEAN);
    }

    #[test]
    fn decimals_are_checked_and_quantized() {
        let width = parse_decimal(&json!(70.9), decimal::LENGTH_MM).unwrap();
        assert_eq!(width.to_string(), "70.9");

        let price = parse_decimal(&json!("12.99"), decimal::MONEY).unwrap();
        assert_eq!(price.to_string(), "12.990");

        assert_eq!(
            parse_decimal(&json!(12345), decimal::LENGTH_MM).unwrap_err(),
            "Ensure that there are no more than 4 digits in total."
        );
        assert_eq!(parse_decimal(&json!("abc"), decimal::MONEY).unwrap_err(), INVALID_NUMBER);
        assert_eq!(parse_decimal(&json!("1e2"), decimal::MONEY).unwrap().to_string(), "100.000");
    }

    #[test]
    fn out_of_range_decimals_report_the_precision_rule() {
        assert_eq!(
            parse_decimal(&json!(1e-30), decimal::MONEY).unwrap_err(),
            "Ensure that there are no more than 3 decimal places."
        );
        assert_eq!(
            parse_decimal(&json!("1e40"), decimal::LENGTH_MM).unwrap_err(),
            "Ensure that there are no more than 4 digits in total."
        );
        assert_eq!(significand("-12.50e-3"), Some((3, -4)));
        assert_eq!(significand("1200"), Some((2, 2)));
        assert_eq!(significand("e5"), None);
    }

    #[test]
    fn decimals_render_as_string_or_number() {
        let price = Decimal::new(1299, 2);
        assert_eq!(render_decimal(price, decimal::MONEY, true), json!("12.990"));
        assert_eq!(render_decimal(price, decimal::MONEY, false), json!(12.99));
    }

    #[test]
    fn choices_match_numbers_by_text() {
        assert_eq!(parse_choice::<Speed>(&json!(95)).unwrap(), Speed::Mb95);
        assert_eq!(parse_choice::<Speed>(&json!("95")).unwrap(), Speed::Mb95);
        assert_eq!(
            parse_choice::<Speed>(&json!(96)).unwrap_err(),
            "\"96\" is not a valid choice."
        );
    }

    #[test]
    fn pk_fields_report_type_errors() {
        let id = ManufacturerId::new();
        assert_eq!(parse_pk::<ManufacturerId>(&json!(id.to_string())).unwrap(), id);
        assert_eq!(
            parse_pk::<ManufacturerId>(&json!(7)).unwrap_err(),
            "Incorrect type. Expected pk value, received int."
        );
        assert_eq!(
            parse_pk_list::<ManufacturerId>(&json!("x")).unwrap_err(),
            "Expected a list of items but got type \"str\"."
        );
    }
}
