#![allow(dead_code)]

use screener::domain::condition::Condition;
use screener::domain::instrument::{InstrumentRecord, NewInstrument, SourceTag};
use screener::domain::parameter::Operator;
use screener::domain::screen::ScreenDefinition;
use serde_json::{json, Value};
use std::io::Write;

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// One upstream row in the shape the list endpoints return.
pub fn list_row(id: &str, name: &str, price: f64, pe: Value) -> Value {
    json!({
        "ticker_id": id,
        "company_name": name,
        "symbol": id,
        "price": price,
        "net_change": 1.0,
        "percent_change": 0.5,
        "pe_ratio": pe,
    })
}

pub fn sample_list_payload() -> Value {
    json!([
        list_row("AAA", "Alpha Ltd", 120.0, json!(18.0)),
        list_row("BBB", "Beta Ltd", 80.0, json!(22.0)),
        list_row("CCC", "Gamma Ltd", 300.0, json!("12")),
        list_row("DDD", "Delta Ltd", 45.0, Value::Null),
    ])
}

pub fn record(id: &str, pe: Option<f64>, price: Option<f64>) -> InstrumentRecord {
    let mut parts = NewInstrument {
        instrument_id: id.into(),
        navigation_key: format!("{id} Ltd"),
        display_symbol: id.into(),
        display_name: format!("{id} Ltd"),
        price,
        ..NewInstrument::default()
    };
    if let Some(pe) = pe {
        parts.metrics.insert("pe_ratio".into(), pe.into());
    }
    InstrumentRecord::new(SourceTag::List, parts)
}

pub fn pe_screen(op: Operator, value: &str) -> ScreenDefinition {
    ScreenDefinition::with_id("pe", "P/E screen", Condition::new("P/E", op, value)).unwrap()
}

pub const SCREEN_INI: &str = "[screen]
id = value-picks
name = Value picks
conditions = P/E < 20 | Current Price > 50

[display]
currency_symbol = $
";
