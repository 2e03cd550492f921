//! Parameter registry: the static catalogue of screenable metrics.
//!
//! Each [`Parameter`] carries a semantic [`ValueType`], the set of
//! [`Operator`]s it accepts and a [`MetricSource`] describing where the
//! metric lives on an [`InstrumentRecord`](crate::domain::instrument::InstrumentRecord).
//! The registry is read-only and built once per process; see
//! [`ParameterRegistry::global`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Basic,
    Growth,
    Quality,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Basic => "Basic",
            Category::Growth => "Growth",
            Category::Quality => "Quality",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Number,
    Percentage,
    Currency,
    Ratio,
}

/// Comparison operator of a condition.
///
/// `Eq` is an exact floating-point compare; no epsilon is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "GT")]
    Gt,
    #[serde(rename = "LT")]
    Lt,
    #[serde(rename = "EQ")]
    Eq,
    #[serde(rename = "GTE")]
    Gte,
    #[serde(rename = "LTE")]
    Lte,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::Gt,
        Operator::Lt,
        Operator::Eq,
        Operator::Gte,
        Operator::Lte,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Eq => "=",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
        }
    }

    #[allow(clippy::float_cmp)]
    pub fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Operator::Gt => lhs > rhs,
            Operator::Lt => lhs < rhs,
            Operator::Eq => lhs == rhs,
            Operator::Gte => lhs >= rhs,
            Operator::Lte => lhs <= rhs,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            ">" | "GT" => Ok(Operator::Gt),
            "<" | "LT" => Ok(Operator::Lt),
            "=" | "==" | "EQ" => Ok(Operator::Eq),
            ">=" | "GTE" => Ok(Operator::Gte),
            "<=" | "LTE" => Ok(Operator::Lte),
            other => Err(format!("unknown operator: {other}")),
        }
    }
}

/// Where a parameter's value is read from on a canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSource {
    Price,
    NetChange,
    PercentChange,
    /// Upstream metric field names, in priority order; first present wins.
    Metric(&'static [&'static str]),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub key: &'static str,
    pub category: Category,
    pub value_type: ValueType,
    pub allowed_operators: &'static [Operator],
    pub source: MetricSource,
}

impl Parameter {
    pub fn allows(&self, operator: Operator) -> bool {
        self.allowed_operators.contains(&operator)
    }
}

const ALL_OPS: &[Operator] = &Operator::ALL;
const ORDERING_OPS: &[Operator] = &[Operator::Gt, Operator::Lt, Operator::Gte, Operator::Lte];

const fn param(
    key: &'static str,
    category: Category,
    value_type: ValueType,
    allowed_operators: &'static [Operator],
    source: MetricSource,
) -> Parameter {
    Parameter {
        key,
        category,
        value_type,
        allowed_operators,
        source,
    }
}

fn builtin_parameters() -> Vec<Parameter> {
    use Category::*;
    use MetricSource::*;
    use ValueType::*;

    vec![
        param("Market Cap", Basic, Currency, ALL_OPS, Metric(&["market_cap", "marketCap", "mcap"])),
        param("Current Price", Basic, Currency, ALL_OPS, Price),
        param("P/E", Basic, Number, ALL_OPS, Metric(&["pe_ratio", "pe", "peRatio", "P/E"])),
        param("Book Value", Basic, Currency, ALL_OPS, Metric(&["book_value", "bookValue"])),
        param(
            "Dividend Yield",
            Basic,
            Percentage,
            ALL_OPS,
            Metric(&["dividend_yield", "dividendYield"]),
        ),
        param("ROCE", Basic, Percentage, ALL_OPS, Metric(&["roce", "ROCE"])),
        param("ROE", Basic, Percentage, ALL_OPS, Metric(&["roe", "ROE"])),
        param(
            "Sales Growth 3Y",
            Growth,
            Percentage,
            ALL_OPS,
            Metric(&["sales_growth_3y", "salesGrowth3Y"]),
        ),
        param(
            "Profit Growth 3Y",
            Growth,
            Percentage,
            ALL_OPS,
            Metric(&["profit_growth_3y", "profitGrowth3Y"]),
        ),
        param(
            "Sales Growth TTM",
            Growth,
            Percentage,
            ALL_OPS,
            Metric(&["sales_growth_ttm", "salesGrowthTTM"]),
        ),
        param(
            "Profit Growth TTM",
            Growth,
            Percentage,
            ALL_OPS,
            Metric(&["profit_growth_ttm", "profitGrowthTTM"]),
        ),
        param(
            "Promoter Holding",
            Quality,
            Percentage,
            ALL_OPS,
            Metric(&["promoter_holding", "promoterHolding"]),
        ),
        param(
            "Debt to Equity",
            Quality,
            Ratio,
            ORDERING_OPS,
            Metric(&["debt_to_equity", "debtToEquity", "de_ratio"]),
        ),
        param(
            "Current Ratio",
            Quality,
            Ratio,
            ORDERING_OPS,
            Metric(&["current_ratio", "currentRatio"]),
        ),
        param(
            "Interest Coverage",
            Quality,
            Ratio,
            ORDERING_OPS,
            Metric(&["interest_coverage", "interestCoverage"]),
        ),
        param(
            "Profit Margin",
            Quality,
            Percentage,
            ALL_OPS,
            Metric(&["profit_margin", "profitMargin", "npm"]),
        ),
        param("Net Change", Basic, Currency, ALL_OPS, NetChange),
        param("Percent Change", Basic, Percentage, ALL_OPS, PercentChange),
    ]
}

static GLOBAL: LazyLock<ParameterRegistry> = LazyLock::new(ParameterRegistry::builtin);

/// Read-only catalogue of parameters, looked up by key.
#[derive(Debug, Clone)]
pub struct ParameterRegistry {
    parameters: Vec<Parameter>,
    by_key: HashMap<&'static str, usize>,
}

impl ParameterRegistry {
    /// The process-wide registry with the built-in catalogue.
    pub fn global() -> &'static ParameterRegistry {
        &GLOBAL
    }

    pub fn builtin() -> Self {
        Self::from_parameters(builtin_parameters())
    }

    /// Build a registry from an explicit list. Later duplicates of a key are ignored.
    pub fn from_parameters(parameters: Vec<Parameter>) -> Self {
        let mut kept = Vec::with_capacity(parameters.len());
        let mut by_key = HashMap::with_capacity(parameters.len());
        for p in parameters {
            if by_key.contains_key(p.key) {
                continue;
            }
            by_key.insert(p.key, kept.len());
            kept.push(p);
        }
        Self {
            parameters: kept,
            by_key,
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&Parameter> {
        self.by_key.get(key).map(|&i| &self.parameters[i])
    }

    /// Parameters grouped by category, in catalogue order within each group.
    pub fn list_by_category(&self) -> BTreeMap<Category, Vec<&Parameter>> {
        let mut groups: BTreeMap<Category, Vec<&Parameter>> = BTreeMap::new();
        for p in &self.parameters {
            groups.entry(p.category).or_default().push(p);
        }
        groups
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}
