//! Canonical instrument record shared by every data-displaying surface.

use crate::domain::coercion::RawValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Upstream endpoint a record was normalized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    List,
    Gainers,
    Losers,
    Watchlist,
    MostActive,
    Index,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::List => "list",
            SourceTag::Gainers => "gainers",
            SourceTag::Losers => "losers",
            SourceTag::Watchlist => "watchlist",
            SourceTag::MostActive => "most_active",
            SourceTag::Index => "index",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "list" => Ok(SourceTag::List),
            "gainers" => Ok(SourceTag::Gainers),
            "losers" => Ok(SourceTag::Losers),
            "watchlist" => Ok(SourceTag::Watchlist),
            "most_active" | "mostactive" => Ok(SourceTag::MostActive),
            "index" => Ok(SourceTag::Index),
            other => Err(format!("unknown source: {other}")),
        }
    }
}

/// Field values for building an [`InstrumentRecord`].
#[derive(Debug, Clone, Default)]
pub struct NewInstrument {
    pub instrument_id: String,
    pub navigation_key: String,
    pub display_symbol: String,
    pub display_name: String,
    pub price: Option<f64>,
    pub net_change: Option<f64>,
    pub percent_change: Option<f64>,
    pub error_message: Option<String>,
    pub metrics: BTreeMap<String, RawValue>,
}

/// One tradable instrument in canonical, source-agnostic form.
///
/// Records are immutable. `is_positive` is derived at construction: the sign
/// of `net_change` when present, else of `percent_change`, else `false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentRecord {
    instrument_id: String,
    navigation_key: String,
    display_symbol: String,
    display_name: String,
    price: Option<f64>,
    net_change: Option<f64>,
    percent_change: Option<f64>,
    is_positive: bool,
    source_tag: SourceTag,
    has_error: bool,
    error_message: Option<String>,
    metrics: BTreeMap<String, RawValue>,
}

impl InstrumentRecord {
    pub fn new(source_tag: SourceTag, parts: NewInstrument) -> Self {
        let is_positive = derive_is_positive(parts.net_change, parts.percent_change);
        Self {
            instrument_id: parts.instrument_id,
            navigation_key: parts.navigation_key,
            display_symbol: parts.display_symbol,
            display_name: parts.display_name,
            price: parts.price,
            net_change: parts.net_change,
            percent_change: parts.percent_change,
            is_positive,
            source_tag,
            has_error: parts.error_message.is_some(),
            error_message: parts.error_message,
            metrics: parts.metrics,
        }
    }

    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }

    pub fn navigation_key(&self) -> &str {
        &self.navigation_key
    }

    pub fn display_symbol(&self) -> &str {
        &self.display_symbol
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn net_change(&self) -> Option<f64> {
        self.net_change
    }

    pub fn percent_change(&self) -> Option<f64> {
        self.percent_change
    }

    pub fn is_positive(&self) -> bool {
        self.is_positive
    }

    pub fn source_tag(&self) -> SourceTag {
        self.source_tag
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Raw upstream metric by field name, e.g. `pe_ratio`.
    pub fn metric(&self, name: &str) -> Option<&RawValue> {
        self.metrics.get(name)
    }

    pub fn metrics(&self) -> &BTreeMap<String, RawValue> {
        &self.metrics
    }
}

fn derive_is_positive(net_change: Option<f64>, percent_change: Option<f64>) -> bool {
    match (net_change, percent_change) {
        (Some(net), _) => net >= 0.0,
        (None, Some(pct)) => pct >= 0.0,
        (None, None) => false,
    }
}
