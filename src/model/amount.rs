//! Handling of monetary amounts as they arrive from the spreadsheet proxy.
//!
//! The spreadsheet renders numbers using the `pt-BR` locale, so an amount may arrive either as a
//! JSON number or as a string such as `"1.234,56"`, where `.` separates thousands and `,` is the
//! decimal mark. In memory, amounts are always `f64`.

use serde_json::Value;
use tracing::debug;

/// Parses a locale-formatted amount string. Thousands separators (`.`) are removed and the decimal
/// comma becomes a decimal point. Anything that cannot be parsed is `0.0`.
///
/// Note that a string like `"50.00"` is read as `5000`, since every `.` is a thousands separator in
/// this locale.
///
/// ```
/// # use sheetbook::model::parse_amount;
/// assert_eq!(parse_amount("1.234,56"), 1234.56);
/// assert_eq!(parse_amount("abc"), 0.0);
/// ```
pub fn parse_amount(s: &str) -> f64 {
    let trimmed = s.trim();
    let trimmed = trimmed
        .strip_prefix("R$")
        .map(str::trim_start)
        .unwrap_or(trimmed);
    let normalized = trimmed.replace('.', "").replacen(',', ".", 1);
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            debug!("Unable to parse amount '{s}', using 0");
            0.0
        }
    }
}

/// Normalizes the `amount` field of a raw record. Numbers are taken as-is, strings are parsed with
/// `parse_amount`, and everything else (missing, null, bool, ...) is `0.0`. Negative values are
/// folded to their magnitude because the sign of a transaction is carried by its type.
pub fn normalize_amount(value: Option<&Value>) -> f64 {
    let amount = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => parse_amount(s),
        _ => 0.0,
    };
    if amount < 0.0 {
        debug!("Folding negative amount {amount} to its magnitude");
        amount.abs()
    } else {
        amount
    }
}

/// Formats an amount the way the `pt-BR` locale does, with two decimal places, e.g. `1.234,56`.
///
/// ```
/// # use sheetbook::model::format_amount;
/// assert_eq!(format_amount(1234.5), "1.234,50");
/// assert_eq!(format_amount(-60000.0), "-60.000,00");
/// ```
pub fn format_amount(value: f64) -> String {
    let (sign, num) = if value < 0.0 {
        ("-", value.abs())
    } else {
        ("", value)
    };
    // format_num produces `1,234.56`; swap the separators for the locale.
    let en = format_num::format_num!(",.2", num);
    let localized: String = en
        .chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            other => other,
        })
        .collect();
    format!("{sign}{localized}")
}

/// Formats an amount with the currency symbol, e.g. `R$ 1.234,56`.
pub fn format_currency(value: f64) -> String {
    format!("R$ {}", format_amount(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_thousands_and_decimal_comma() {
        assert_eq!(parse_amount("1.234,56"), 1234.56);
    }

    #[test]
    fn test_parse_millions() {
        assert_eq!(parse_amount("1.234.567,89"), 1234567.89);
    }

    #[test]
    fn test_parse_plain_integer() {
        assert_eq!(parse_amount("100"), 100.0);
    }

    #[test]
    fn test_parse_decimal_comma_only() {
        assert_eq!(parse_amount("50,5"), 50.5);
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("1,2,3"), 0.0);
    }

    #[test]
    fn test_parse_with_currency_symbol() {
        assert_eq!(parse_amount("R$ 2.500,00"), 2500.0);
    }

    #[test]
    fn test_parse_dot_is_thousands_separator() {
        assert_eq!(parse_amount("50.00"), 5000.0);
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        assert_eq!(parse_amount("inf"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
    }

    #[test]
    fn test_normalize_number() {
        assert_eq!(normalize_amount(Some(&json!(42.5))), 42.5);
        assert_eq!(normalize_amount(Some(&json!(7))), 7.0);
    }

    #[test]
    fn test_normalize_string() {
        assert_eq!(normalize_amount(Some(&json!("1.234,56"))), 1234.56);
    }

    #[test]
    fn test_normalize_other_shapes() {
        assert_eq!(normalize_amount(None), 0.0);
        assert_eq!(normalize_amount(Some(&Value::Null)), 0.0);
        assert_eq!(normalize_amount(Some(&json!(true))), 0.0);
        assert_eq!(normalize_amount(Some(&json!({"v": 1}))), 0.0);
    }

    #[test]
    fn test_normalize_negative_folds() {
        assert_eq!(normalize_amount(Some(&json!(-12.0))), 12.0);
        assert_eq!(normalize_amount(Some(&json!("-1.000,00"))), 1000.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0,00");
        assert_eq!(format_amount(1234.56), "1.234,56");
        assert_eq!(format_amount(1234567.891), "1.234.567,89");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(87.4), "R$ 87,40");
    }
}
