//! Value coercion from heterogeneous upstream values to numbers.
//!
//! Two flavours exist and must not be mixed:
//! - [`coerce_numeric`] / [`coerce_numeric_with_presence`] collapse absent and
//!   unparseable input to `0.0`. Display code uses these.
//! - [`coerce_numeric_strict`] keeps absent and invalid input distinct from a
//!   true zero. Condition evaluation uses this one.
//!
//! Condition thresholds go through [`coerce_threshold`], which also checks
//! that the text's decorations fit the parameter's [`ValueType`].

use crate::domain::parameter::ValueType;
use serde::{Deserialize, Serialize};

const CURRENCY_GLYPHS: &[char] = &['₹', '$', '€', '£', '¥', '¢'];
const CURRENCY_PREFIXES: &[&str] = &["rs.", "rs", "inr", "usd"];
const ABSENT_SENTINELS: &[&str] = &["", "n/a", "na", "-", "--", "---", "null"];

/// A raw scalar as delivered by an upstream feed or typed by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Scalar view of a JSON value. Null, booleans and containers have none.
    pub fn from_json(value: &serde_json::Value) -> Option<RawValue> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(RawValue::Number),
            serde_json::Value::String(s) => Some(RawValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CoercionFailure {
    #[error("value is absent")]
    Absent,
    #[error("value is not a number")]
    Invalid,
}

/// Lenient coercion result: `value` is `0.0` whenever `is_absent` is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericReading {
    pub value: f64,
    pub is_absent: bool,
}

pub fn coerce_numeric(raw: Option<&RawValue>) -> f64 {
    coerce_numeric_with_presence(raw).value
}

pub fn coerce_numeric_with_presence(raw: Option<&RawValue>) -> NumericReading {
    match coerce_numeric_strict(raw) {
        Ok(value) => NumericReading {
            value,
            is_absent: false,
        },
        Err(_) => NumericReading {
            value: 0.0,
            is_absent: true,
        },
    }
}

pub fn coerce_numeric_strict(raw: Option<&RawValue>) -> Result<f64, CoercionFailure> {
    match raw {
        None => Err(CoercionFailure::Absent),
        Some(RawValue::Number(v)) if v.is_finite() => Ok(*v),
        Some(RawValue::Number(_)) => Err(CoercionFailure::Invalid),
        Some(RawValue::Text(s)) => coerce_str_strict(s),
    }
}

/// Strict coercion of text: sentinels are absent, anything unparseable is invalid.
pub fn coerce_str_strict(raw: &str) -> Result<f64, CoercionFailure> {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();
    if ABSENT_SENTINELS.contains(&lowered.as_str()) {
        return Err(CoercionFailure::Absent);
    }

    let cleaned = strip_decorations(trimmed);
    if cleaned.is_empty() {
        return Err(CoercionFailure::Invalid);
    }

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(CoercionFailure::Invalid),
    }
}

/// Strict coercion of a user-typed threshold for a parameter of `value_type`.
///
/// `%` is accepted only for percentages, currency glyphs and codes only for
/// currency amounts. Numbers and ratios take plain numbers.
pub fn coerce_threshold(raw: &str, value_type: ValueType) -> Result<f64, CoercionFailure> {
    let has_percent = raw.contains('%');
    let has_currency = has_currency_marker(raw);
    let fits = match value_type {
        ValueType::Percentage => !has_currency,
        ValueType::Currency => !has_percent,
        ValueType::Number | ValueType::Ratio => !has_percent && !has_currency,
    };
    if !fits {
        return Err(CoercionFailure::Invalid);
    }
    coerce_str_strict(raw)
}

fn has_currency_marker(raw: &str) -> bool {
    if raw.chars().any(|c| CURRENCY_GLYPHS.contains(&c)) {
        return true;
    }
    let unsigned = raw.trim().trim_start_matches(['+', '-']).trim_start();
    strip_currency_prefix(unsigned).len() != unsigned.len()
}

/// Removes currency glyphs and codes, percent signs, grouping separators
/// and whitespace, keeping sign, digits, decimal point and exponent.
fn strip_decorations(input: &str) -> String {
    let compact: String = input
        .chars()
        .filter(|c| !CURRENCY_GLYPHS.contains(c))
        .filter(|c| !matches!(c, '%' | ',' | '_' | '\''))
        .filter(|c| !c.is_whitespace())
        .collect();

    let (negative, unsigned) = match compact.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, compact.strip_prefix('+').unwrap_or(compact.as_str())),
    };
    let body = strip_currency_prefix(unsigned);

    if negative {
        format!("-{body}")
    } else {
        body.to_string()
    }
}

fn strip_currency_prefix(s: &str) -> &str {
    for prefix in CURRENCY_PREFIXES {
        if let Some(head) = s.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return &s[prefix.len()..];
            }
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn strict_parses_currency_with_grouping() {
        assert_relative_eq!(coerce_numeric_strict(Some(&text("₹1,234.50"))).unwrap(), 1234.50);
        assert_relative_eq!(coerce_numeric_strict(Some(&text("$ 12,000"))).unwrap(), 12000.0);
        assert_relative_eq!(coerce_numeric_strict(Some(&text("Rs. 99.5"))).unwrap(), 99.5);
    }

    #[test]
    fn strict_parses_signed_and_percent() {
        assert_relative_eq!(coerce_numeric_strict(Some(&text("+12.30"))).unwrap(), 12.30);
        assert_relative_eq!(coerce_numeric_strict(Some(&text("+1.01%"))).unwrap(), 1.01);
        assert_relative_eq!(coerce_numeric_strict(Some(&text("-0.75 %"))).unwrap(), -0.75);
        assert_relative_eq!(coerce_numeric_strict(Some(&text("-₹5.00"))).unwrap(), -5.0);
    }

    #[test]
    fn strict_passes_numbers_through() {
        assert_relative_eq!(coerce_numeric_strict(Some(&RawValue::Number(15.0))).unwrap(), 15.0);
        assert_eq!(coerce_numeric_strict(Some(&RawValue::Number(0.0))), Ok(0.0));
    }

    #[test]
    fn strict_distinguishes_absent_from_invalid() {
        assert_eq!(coerce_numeric_strict(None), Err(CoercionFailure::Absent));
        assert_eq!(coerce_numeric_strict(Some(&text(""))), Err(CoercionFailure::Absent));
        assert_eq!(coerce_numeric_strict(Some(&text("  N/A "))), Err(CoercionFailure::Absent));
        assert_eq!(coerce_numeric_strict(Some(&text("abc"))), Err(CoercionFailure::Invalid));
        assert_eq!(coerce_numeric_strict(Some(&text("₹"))), Err(CoercionFailure::Invalid));
        assert_eq!(coerce_numeric_strict(Some(&text("inf"))), Err(CoercionFailure::Invalid));
        assert_eq!(
            coerce_numeric_strict(Some(&RawValue::Number(f64::NAN))),
            Err(CoercionFailure::Invalid)
        );
    }

    #[test]
    fn threshold_percent_only_for_percentages() {
        assert_relative_eq!(coerce_threshold("15%", ValueType::Percentage).unwrap(), 15.0);
        assert_relative_eq!(coerce_threshold("15", ValueType::Percentage).unwrap(), 15.0);
        assert_eq!(coerce_threshold("15%", ValueType::Currency), Err(CoercionFailure::Invalid));
        assert_eq!(coerce_threshold("50%", ValueType::Ratio), Err(CoercionFailure::Invalid));
        assert_eq!(coerce_threshold("5%", ValueType::Number), Err(CoercionFailure::Invalid));
    }

    #[test]
    fn threshold_currency_only_for_currency() {
        assert_relative_eq!(coerce_threshold("₹1,000", ValueType::Currency).unwrap(), 1000.0);
        assert_relative_eq!(coerce_threshold("Rs. 99.5", ValueType::Currency).unwrap(), 99.5);
        assert_relative_eq!(coerce_threshold("-$5", ValueType::Currency).unwrap(), -5.0);
        assert_eq!(coerce_threshold("₹20", ValueType::Number), Err(CoercionFailure::Invalid));
        assert_eq!(coerce_threshold("USD 2", ValueType::Ratio), Err(CoercionFailure::Invalid));
        assert_eq!(coerce_threshold("$3", ValueType::Percentage), Err(CoercionFailure::Invalid));
    }

    #[test]
    fn threshold_plain_numbers_fit_every_type() {
        for value_type in [
            ValueType::Number,
            ValueType::Percentage,
            ValueType::Currency,
            ValueType::Ratio,
        ] {
            assert_relative_eq!(coerce_threshold(" 0.5 ", value_type).unwrap(), 0.5);
            assert_eq!(coerce_threshold("", value_type), Err(CoercionFailure::Absent));
        }
    }

    #[test]
    fn lenient_collapses_to_zero_and_flags_absence() {
        let reading = coerce_numeric_with_presence(Some(&text("n/a")));
        assert_eq!(reading.value, 0.0);
        assert!(reading.is_absent);

        let reading = coerce_numeric_with_presence(Some(&text("garbage")));
        assert_eq!(reading.value, 0.0);
        assert!(reading.is_absent);

        let reading = coerce_numeric_with_presence(Some(&text("0")));
        assert_eq!(reading.value, 0.0);
        assert!(!reading.is_absent);

        assert_eq!(coerce_numeric(None), 0.0);
        assert_relative_eq!(coerce_numeric(Some(&text("42%"))), 42.0);
    }

    #[test]
    fn raw_value_from_json() {
        use serde_json::json;
        assert_eq!(RawValue::from_json(&json!(1.5)), Some(RawValue::Number(1.5)));
        assert_eq!(RawValue::from_json(&json!("x")), Some(text("x")));
        assert_eq!(RawValue::from_json(&json!(null)), None);
        assert_eq!(RawValue::from_json(&json!(true)), None);
        assert_eq!(RawValue::from_json(&json!({"a": 1})), None);
    }
}
