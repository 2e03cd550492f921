//! Screen evaluation engine.
//!
//! # Evaluation Semantics
//!
//! - A record passes iff every *valid* condition matches (logical AND)
//! - Invalid conditions are skipped; with none left the universe passes unchanged
//! - An absent metric makes its condition `false` for that record
//! - Output keeps the universe's order; ranking is a separate step, see [`rank_by`]

use crate::domain::condition::{validate, ValidCondition};
use crate::domain::instrument::InstrumentRecord;
use crate::domain::parameter::ParameterRegistry;
use crate::domain::screen::ScreenDefinition;
use std::cmp::Ordering;
use std::str::FromStr;

/// A screen reduced to its valid conditions, thresholds already coerced.
#[derive(Debug, Clone)]
pub struct CompiledScreen<'r> {
    conditions: Vec<ValidCondition<'r>>,
    skipped: usize,
}

impl<'r> CompiledScreen<'r> {
    pub fn compile(screen: &ScreenDefinition, registry: &'r ParameterRegistry) -> Self {
        let mut conditions = Vec::with_capacity(screen.len());
        let mut skipped = 0;
        for (index, condition) in screen.conditions().enumerate() {
            match validate(condition, registry) {
                Ok(valid) => conditions.push(valid),
                Err(err) => {
                    tracing::debug!(
                        screen = screen.id(),
                        index,
                        %err,
                        "skipping invalid condition"
                    );
                    skipped += 1;
                }
            }
        }
        Self {
            conditions,
            skipped,
        }
    }

    pub fn matches(&self, record: &InstrumentRecord) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    pub fn filter(&self, universe: &[InstrumentRecord]) -> Vec<InstrumentRecord> {
        universe
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }

    /// Number of conditions that take part in evaluation.
    pub fn active(&self) -> usize {
        self.conditions.len()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Evaluates against the process-wide parameter registry.
pub fn evaluate(screen: &ScreenDefinition, universe: &[InstrumentRecord]) -> Vec<InstrumentRecord> {
    evaluate_with(ParameterRegistry::global(), screen, universe)
}

pub fn evaluate_with(
    registry: &ParameterRegistry,
    screen: &ScreenDefinition,
    universe: &[InstrumentRecord],
) -> Vec<InstrumentRecord> {
    CompiledScreen::compile(screen, registry).filter(universe)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKey {
    Price,
    NetChange,
    PercentChange,
    DisplayName,
}

impl FromStr for RankKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "price" => Ok(RankKey::Price),
            "net_change" | "change" => Ok(RankKey::NetChange),
            "percent_change" | "pct" => Ok(RankKey::PercentChange),
            "name" | "display_name" => Ok(RankKey::DisplayName),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Stable sort by `key`. Records without a value for `key` always come last.
pub fn rank_by(
    records: &[InstrumentRecord],
    key: RankKey,
    direction: SortDirection,
) -> Vec<InstrumentRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| match key {
        RankKey::DisplayName => directed(a.display_name().cmp(b.display_name()), direction),
        _ => match (numeric_key(a, key), numeric_key(b, key)) {
            (Some(x), Some(y)) => directed(x.total_cmp(&y), direction),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    });
    ranked
}

fn numeric_key(record: &InstrumentRecord, key: RankKey) -> Option<f64> {
    match key {
        RankKey::Price => record.price(),
        RankKey::NetChange => record.net_change(),
        RankKey::PercentChange => record.percent_change(),
        RankKey::DisplayName => None,
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}
