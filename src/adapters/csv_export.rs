//! CSV export of screen results.

use crate::domain::display::format_change;
use crate::domain::error::ScreenerError;
use crate::domain::instrument::InstrumentRecord;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 12] = [
    "instrument_id",
    "navigation_key",
    "symbol",
    "name",
    "price",
    "net_change",
    "percent_change",
    "change",
    "is_positive",
    "source",
    "has_error",
    "error_message",
];

fn csv_error(e: csv::Error) -> ScreenerError {
    ScreenerError::Io(std::io::Error::other(e))
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_records<W: Write>(
    writer: W,
    records: &[InstrumentRecord],
) -> Result<(), ScreenerError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER).map_err(csv_error)?;

    for r in records {
        wtr.write_record([
            r.instrument_id().to_string(),
            r.navigation_key().to_string(),
            r.display_symbol().to_string(),
            r.display_name().to_string(),
            optional(r.price()),
            optional(r.net_change()),
            optional(r.percent_change()),
            format_change(r),
            r.is_positive().to_string(),
            r.source_tag().to_string(),
            r.has_error().to_string(),
            r.error_message().unwrap_or_default().to_string(),
        ])
        .map_err(csv_error)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_to_path<P: AsRef<Path>>(
    path: P,
    records: &[InstrumentRecord],
) -> Result<(), ScreenerError> {
    let file = std::fs::File::create(path)?;
    write_records(file, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instrument::{NewInstrument, SourceTag};

    fn record(id: &str, price: Option<f64>, error: Option<&str>) -> InstrumentRecord {
        InstrumentRecord::new(
            SourceTag::Gainers,
            NewInstrument {
                instrument_id: id.into(),
                navigation_key: format!("{id} Ltd"),
                display_symbol: id.into(),
                display_name: format!("{id} Ltd"),
                price,
                net_change: price.map(|_| 1.5),
                error_message: error.map(str::to_string),
                ..NewInstrument::default()
            },
        )
    }

    #[test]
    fn writes_header_and_rows() {
        let mut out = Vec::new();
        write_records(&mut out, &[record("AAA", Some(10.0), None)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("instrument_id,navigation_key,symbol"));
        assert_eq!(lines[1], "AAA,AAA Ltd,AAA,AAA Ltd,10,1.5,,+1.50,true,gainers,false,");
    }

    #[test]
    fn errored_rows_leave_numbers_blank() {
        let mut out = Vec::new();
        write_records(&mut out, &[record("ERR", None, Some("stale, retry"))]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert_eq!(row, "ERR,ERR Ltd,ERR,ERR Ltd,,,,N/A,false,gainers,true,\"stale, retry\"");
    }

    #[test]
    fn export_to_path_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        export_to_path(&path, &[record("A", Some(1.0), None)]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
