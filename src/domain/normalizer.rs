//! Instrument normalizer: upstream payloads to canonical records.
//!
//! Upstream endpoints disagree on field names. Each canonical field has one
//! resolver with an explicit priority list of source names; the only shape
//! knowledge taken from the caller is the [`SourceTag`].
//!
//! Items that cannot be keyed (no id, no navigation key) are dropped and
//! reported as data-quality events. A payload that is not an array at all is a
//! [`DataShapeError`] for the whole collection.

use crate::domain::coercion::{coerce_numeric_strict, CoercionFailure, RawValue};
use crate::domain::error::DataShapeError;
use crate::domain::instrument::{InstrumentRecord, NewInstrument, SourceTag};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const ID_FIELDS: &[&str] = &["ticker_id", "id"];
const NAME_FIELDS: &[&str] = &["company_name", "name", "companyName", "index_name"];
const SYMBOL_FIELDS: &[&str] = &["symbol", "trading_symbol", "ric", "RIC", "ticker"];
const PRICE_FIELDS: &[&str] = &["price", "current_price", "last_price", "ltp"];
const NET_CHANGE_FIELDS: &[&str] = &["net_change", "change"];
const PERCENT_CHANGE_FIELDS: &[&str] = &["percent_change", "changePercent", "percentChange"];
const ERROR_FIELDS: &[&str] = &["error", "error_message"];

pub const SYMBOL_PLACEHOLDER: &str = "---";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<InstrumentRecord>,
    pub dropped: Vec<DroppedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedItem {
    pub index: usize,
    pub reason: DropReason,
}

/// Why an item was left out. Ids always resolve, at worst to `"{tag}-{index}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotAnObject,
    MissingNavigationKey,
}

/// Normalizes a whole endpoint response.
pub fn normalize(
    source_tag: SourceTag,
    payload: &Value,
) -> Result<NormalizedBatch, DataShapeError> {
    match payload {
        Value::Array(items) => Ok(normalize_items(source_tag, items)),
        other => Err(shape_error(other)),
    }
}

/// Parses response text, then normalizes it. Unparseable text is a shape error.
pub fn normalize_json_str(
    source_tag: SourceTag,
    text: &str,
) -> Result<NormalizedBatch, DataShapeError> {
    let payload: Value = serde_json::from_str(text).map_err(|e| DataShapeError {
        message: format!("response is not valid JSON: {e}"),
    })?;
    normalize(source_tag, &payload)
}

pub fn normalize_items(source_tag: SourceTag, items: &[Value]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (index, item) in items.iter().enumerate() {
        match normalize_item(source_tag, index, item) {
            Ok(record) => batch.records.push(record),
            Err(reason) => {
                tracing::warn!(
                    target: "data_quality",
                    source = %source_tag,
                    index,
                    ?reason,
                    "dropping upstream item"
                );
                batch.dropped.push(DroppedItem { index, reason });
            }
        }
    }

    tracing::debug!(
        source = %source_tag,
        kept = batch.records.len(),
        dropped = batch.dropped.len(),
        "normalized payload"
    );
    batch
}

fn normalize_item(
    source_tag: SourceTag,
    index: usize,
    item: &Value,
) -> Result<InstrumentRecord, DropReason> {
    let obj = item.as_object().ok_or(DropReason::NotAnObject)?;

    let symbol = first_text(obj, SYMBOL_FIELDS);
    let name = first_text(obj, NAME_FIELDS);

    let instrument_id = first_text(obj, ID_FIELDS)
        .or_else(|| name.clone())
        .unwrap_or_else(|| format!("{source_tag}-{index}"));

    let navigation_key = match source_tag {
        SourceTag::Watchlist => symbol.clone().or_else(|| name.clone()),
        _ => name.clone(),
    }
    .ok_or(DropReason::MissingNavigationKey)?;

    let error_message = item_error(obj);
    let errored = error_message.is_some();

    let (price, net_change, percent_change, metrics) = if errored {
        (None, None, None, BTreeMap::new())
    } else {
        (
            first_number(obj, PRICE_FIELDS),
            first_number(obj, NET_CHANGE_FIELDS),
            first_number(obj, PERCENT_CHANGE_FIELDS),
            scalar_metrics(obj),
        )
    };

    Ok(InstrumentRecord::new(
        source_tag,
        NewInstrument {
            instrument_id,
            navigation_key,
            display_symbol: symbol.unwrap_or_else(|| SYMBOL_PLACEHOLDER.to_string()),
            display_name: name.unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
            price,
            net_change,
            percent_change,
            error_message,
            metrics,
        },
    ))
}

/// First field holding a non-blank string or a number, rendered as text.
fn first_text(obj: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match obj.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First field that is not absent, coerced strictly; an unparseable value yields `None`.
fn first_number(obj: &Map<String, Value>, fields: &[&str]) -> Option<f64> {
    for field in fields {
        let raw = obj.get(*field).and_then(RawValue::from_json);
        match coerce_numeric_strict(raw.as_ref()) {
            Ok(v) => return Some(v),
            Err(CoercionFailure::Absent) => continue,
            Err(CoercionFailure::Invalid) => return None,
        }
    }
    None
}

fn item_error(obj: &Map<String, Value>) -> Option<String> {
    for field in ERROR_FIELDS {
        match obj.get(*field) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Bool(true)) => {
                let message = obj
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or("upstream error");
                return Some(message.to_string());
            }
            Some(Value::Object(inner)) => {
                let message = inner
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("upstream error");
                return Some(message.to_string());
            }
            _ => {}
        }
    }
    None
}

fn scalar_metrics(obj: &Map<String, Value>) -> BTreeMap<String, RawValue> {
    obj.iter()
        .filter_map(|(k, v)| RawValue::from_json(v).map(|raw| (k.clone(), raw)))
        .collect()
}

fn shape_error(payload: &Value) -> DataShapeError {
    if let Value::Object(obj) = payload {
        for field in ["error", "message"] {
            if let Some(text) = obj.get(field).and_then(Value::as_str) {
                return DataShapeError {
                    message: text.to_string(),
                };
            }
        }
    }
    let kind = match payload {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    DataShapeError {
        message: format!("expected an array of items, found {kind}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn normalizes_list_item() {
        let payload = json!([{
            "ticker_id": "INF1",
            "company_name": "Acme Ltd",
            "price": "₹1,234.50",
            "net_change": "+12.30",
            "percent_change": "+1.01%"
        }]);
        let batch = normalize(SourceTag::List, &payload).unwrap();
        assert_eq!(batch.records.len(), 1);
        let r = &batch.records[0];
        assert_eq!(r.instrument_id(), "INF1");
        assert_eq!(r.navigation_key(), "Acme Ltd");
        assert_relative_eq!(r.price().unwrap(), 1234.50);
        assert_relative_eq!(r.net_change().unwrap(), 12.30);
        assert_relative_eq!(r.percent_change().unwrap(), 1.01);
        assert!(r.is_positive());
        assert_eq!(r.display_symbol(), SYMBOL_PLACEHOLDER);
        assert!(!r.has_error());
    }

    #[test]
    fn drops_item_without_any_key() {
        let payload = json!([
            {"ticker_id": "A", "company_name": "Alpha"},
            {"price": 10},
            {"id": 7, "name": "Gamma"}
        ]);
        let batch = normalize(SourceTag::Gainers, &payload).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(
            batch.dropped,
            vec![DroppedItem {
                index: 1,
                reason: DropReason::MissingNavigationKey
            }]
        );
        assert_eq!(batch.records[1].instrument_id(), "7");
    }

    #[test]
    fn drops_non_object_items() {
        let batch = normalize(SourceTag::List, &json!(["oops", {"name": "Beta"}])).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.dropped[0].reason, DropReason::NotAnObject);
    }

    #[test]
    fn error_object_is_data_shape_error() {
        let err = normalize(SourceTag::List, &json!({"error": "rate limited"})).unwrap_err();
        assert_eq!(err.message, "rate limited");

        let err = normalize(SourceTag::List, &json!({"message": "maintenance"})).unwrap_err();
        assert_eq!(err.message, "maintenance");

        let err = normalize(SourceTag::List, &json!(null)).unwrap_err();
        assert!(err.message.contains("null"));
    }

    #[test]
    fn empty_array_is_empty_batch() {
        let batch = normalize(SourceTag::Losers, &json!([])).unwrap();
        assert!(batch.records.is_empty());
        assert!(batch.dropped.is_empty());
    }

    #[test]
    fn instrument_id_fallback_order() {
        let payload = json!([
            {"id": "X1", "company_name": "Ex"},
            {"company_name": "Named Only"},
            {"name": "Short Name"}
        ]);
        let batch = normalize(SourceTag::List, &payload).unwrap();
        let ids: Vec<&str> = batch.records.iter().map(|r| r.instrument_id()).collect();
        assert_eq!(ids, vec!["X1", "Named Only", "Short Name"]);
    }

    #[test]
    fn blank_ids_fall_back_instead_of_dropping() {
        let payload = json!([
            {"ticker_id": "   ", "company_name": "Acme"},
            {"ticker_id": "", "id": " ", "symbol": "ZZZ"}
        ]);
        let batch = normalize(SourceTag::Watchlist, &payload).unwrap();
        let ids: Vec<&str> = batch.records.iter().map(|r| r.instrument_id()).collect();
        assert_eq!(ids, vec!["Acme", "watchlist-1"]);
        assert!(batch.dropped.is_empty());
    }

    #[test]
    fn watchlist_generates_id_and_prefers_symbol() {
        let payload = json!([{"symbol": "ACME.NS", "change": "-2", "changePercent": "-0.4%"}]);
        let batch = normalize(SourceTag::Watchlist, &payload).unwrap();
        let r = &batch.records[0];
        assert_eq!(r.instrument_id(), "watchlist-0");
        assert_eq!(r.navigation_key(), "ACME.NS");
        assert_eq!(r.display_symbol(), "ACME.NS");
        assert_eq!(r.display_name(), UNKNOWN_COMPANY);
        assert_relative_eq!(r.net_change().unwrap(), -2.0);
        assert!(!r.is_positive());
    }

    #[test]
    fn watchlist_falls_back_to_name_for_navigation() {
        let payload = json!([{"ticker_id": "W1", "company_name": "Beta Corp"}]);
        let batch = normalize(SourceTag::Watchlist, &payload).unwrap();
        assert_eq!(batch.records[0].navigation_key(), "Beta Corp");
    }

    #[test]
    fn non_watchlist_ignores_symbol_for_navigation() {
        let payload = json!([{"ticker_id": "L1", "symbol": "LONE"}]);
        let batch = normalize(SourceTag::MostActive, &payload).unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.dropped[0].reason, DropReason::MissingNavigationKey);
    }

    #[test]
    fn missing_price_is_not_an_error() {
        let payload = json!([{"ticker_id": "A", "company_name": "Alpha", "price": "N/A"}]);
        let r = &normalize(SourceTag::List, &payload).unwrap().records[0];
        assert_eq!(r.price(), None);
        assert!(!r.has_error());
        assert_eq!(r.net_change(), None);
        assert_eq!(r.percent_change(), None);
        assert!(!r.is_positive());
    }

    #[test]
    fn errored_row_is_listed_with_nulls() {
        let payload = json!([{
            "ticker_id": "E1",
            "company_name": "Err Corp",
            "symbol": "ERR",
            "price": "100",
            "net_change": "5",
            "error": "quote unavailable"
        }]);
        let r = &normalize(SourceTag::Watchlist, &payload).unwrap().records[0];
        assert!(r.has_error());
        assert_eq!(r.error_message(), Some("quote unavailable"));
        assert_eq!(r.price(), None);
        assert_eq!(r.net_change(), None);
        assert_eq!(r.display_name(), "Err Corp");
        assert_eq!(r.display_symbol(), "ERR");
        assert!(r.metrics().is_empty());
    }

    #[test]
    fn boolean_error_flag_uses_message() {
        let payload = json!([{"name": "Flagged", "error": true, "message": "stale"}]);
        let r = &normalize(SourceTag::Index, &payload).unwrap().records[0];
        assert_eq!(r.error_message(), Some("stale"));
    }

    #[test]
    fn alternate_change_field_names() {
        let payload = json!([{"name": "Nifty 50", "change": 120.5, "changePercent": 0.55}]);
        let r = &normalize(SourceTag::Index, &payload).unwrap().records[0];
        assert_relative_eq!(r.net_change().unwrap(), 120.5);
        assert_relative_eq!(r.percent_change().unwrap(), 0.55);
    }

    #[test]
    fn scalar_fields_become_metrics() {
        let payload = json!([{"name": "Alpha", "pe_ratio": "18.2", "tags": ["a"], "roe": 21}]);
        let r = &normalize(SourceTag::List, &payload).unwrap().records[0];
        assert_eq!(r.metric("pe_ratio"), Some(&RawValue::Text("18.2".into())));
        assert_eq!(r.metric("roe"), Some(&RawValue::Number(21.0)));
        assert_eq!(r.metric("tags"), None);
    }

    #[test]
    fn json_text_that_does_not_parse_is_shape_error() {
        let err = normalize_json_str(SourceTag::List, "<html>502</html>").unwrap_err();
        assert!(err.message.contains("not valid JSON"));
        let batch = normalize_json_str(SourceTag::List, r#"[{"name":"A"}]"#).unwrap();
        assert_eq!(batch.records.len(), 1);
    }
}
