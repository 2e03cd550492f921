//! Presentation strings derived from canonical records.

use crate::domain::instrument::InstrumentRecord;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";
pub const NOT_AVAILABLE: &str = "N/A";

/// Two decimals, thousands-grouped, with the default currency glyph prefix.
pub fn format_currency(value: Option<f64>) -> String {
    format_currency_with(value, DEFAULT_CURRENCY_SYMBOL)
}

pub fn format_currency_with(value: Option<f64>, symbol: &str) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let sign = if v < 0.0 { "-" } else { "" };
            format!("{sign}{symbol}{}", group_thousands(v.abs()))
        }
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Change column text, e.g. `+12.30 (+1.01%)`, or `N/A` when both are null.
pub fn format_change(record: &InstrumentRecord) -> String {
    match (record.net_change(), record.percent_change()) {
        (Some(net), Some(pct)) => format!("{} ({}%)", signed(net), signed(pct)),
        (Some(net), None) => signed(net),
        (None, Some(pct)) => format!("{}%", signed(pct)),
        (None, None) => NOT_AVAILABLE.to_string(),
    }
}

fn signed(v: f64) -> String {
    if v >= 0.0 {
        format!("+{v:.2}")
    } else {
        format!("{v:.2}")
    }
}

fn group_thousands(v: f64) -> String {
    let fixed = format!("{v:.2}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }
    format!("{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instrument::{NewInstrument, SourceTag};

    fn record(net: Option<f64>, pct: Option<f64>) -> InstrumentRecord {
        InstrumentRecord::new(
            SourceTag::List,
            NewInstrument {
                instrument_id: "X".into(),
                navigation_key: "X".into(),
                net_change: net,
                percent_change: pct,
                ..NewInstrument::default()
            },
        )
    }

    #[test]
    fn currency_grouping() {
        assert_eq!(format_currency(Some(1234.5)), "₹1,234.50");
        assert_eq!(format_currency(Some(0.0)), "₹0.00");
        assert_eq!(format_currency(Some(999.999)), "₹1,000.00");
        assert_eq!(format_currency(Some(1234567.891)), "₹1,234,567.89");
        assert_eq!(format_currency(Some(-42.1)), "-₹42.10");
    }

    #[test]
    fn currency_absent_renders_na() {
        assert_eq!(format_currency(None), "N/A");
        assert_eq!(format_currency(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn currency_custom_symbol() {
        assert_eq!(format_currency_with(Some(100.0), "$"), "$100.00");
    }

    #[test]
    fn change_display_variants() {
        assert_eq!(format_change(&record(Some(12.3), Some(1.01))), "+12.30 (+1.01%)");
        assert_eq!(format_change(&record(Some(-3.0), None)), "-3.00");
        assert_eq!(format_change(&record(None, Some(-0.5))), "-0.50%");
        assert_eq!(format_change(&record(None, None)), "N/A");
    }
}
