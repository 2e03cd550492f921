//! Condition model: one predicate of a screen.
//!
//! A [`Condition`] is stored exactly as the user typed it. It only takes part
//! in evaluation once [`validate`] turns it into a [`ValidCondition`], which
//! holds the resolved [`Parameter`] and the coerced threshold.
//!
//! Missing-data policy: when the record has no usable value for the
//! parameter, the condition is `false` for that record.

use crate::domain::coercion::{coerce_numeric_strict, coerce_threshold, CoercionFailure};
use crate::domain::error::{ParseError, ValidationError};
use crate::domain::instrument::InstrumentRecord;
use crate::domain::parameter::{MetricSource, Operator, Parameter, ParameterRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub parameter_key: String,
    pub operator: Operator,
    pub raw_value: String,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            parameter_key: String::new(),
            operator: Operator::Gt,
            raw_value: String::new(),
        }
    }
}

impl Condition {
    pub fn new(
        parameter_key: impl Into<String>,
        operator: Operator,
        raw_value: impl Into<String>,
    ) -> Self {
        Self {
            parameter_key: parameter_key.into(),
            operator,
            raw_value: raw_value.into(),
        }
    }

    /// Returns a copy with one field replaced.
    pub fn with_edit(&self, edit: ConditionEdit) -> Condition {
        let mut next = self.clone();
        match edit {
            ConditionEdit::Parameter(key) => next.parameter_key = key,
            ConditionEdit::Operator(op) => next.operator = op,
            ConditionEdit::Value(value) => next.raw_value = value,
        }
        next
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.parameter_key, self.operator, self.raw_value)
    }
}

/// A single-field change to a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionEdit {
    Parameter(String),
    Operator(Operator),
    Value(String),
}

/// A condition that passed validation against a registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCondition<'r> {
    pub parameter: &'r Parameter,
    pub operator: Operator,
    pub threshold: f64,
}

impl ValidCondition<'_> {
    pub fn matches(&self, record: &InstrumentRecord) -> bool {
        match resolve_metric(self.parameter.source, record) {
            Ok(value) => self.operator.apply(value, self.threshold),
            Err(_) => false,
        }
    }
}

pub fn validate<'r>(
    condition: &Condition,
    registry: &'r ParameterRegistry,
) -> Result<ValidCondition<'r>, ValidationError> {
    let key = condition.parameter_key.as_str();
    let parameter = registry
        .lookup(key)
        .ok_or_else(|| ValidationError::UnknownParameter {
            key: key.to_string(),
        })?;

    if !parameter.allows(condition.operator) {
        return Err(ValidationError::OperatorNotAllowed {
            key: key.to_string(),
            operator: condition.operator,
        });
    }

    let threshold = coerce_threshold(&condition.raw_value, parameter.value_type).map_err(|_| {
        ValidationError::ValueNotCoercible {
            key: key.to_string(),
            value: condition.raw_value.clone(),
        }
    })?;

    Ok(ValidCondition {
        parameter,
        operator: condition.operator,
        threshold,
    })
}

/// Evaluates one condition against one record. Invalid conditions never match.
pub fn evaluate_single(
    condition: &Condition,
    record: &InstrumentRecord,
    registry: &ParameterRegistry,
) -> bool {
    match validate(condition, registry) {
        Ok(valid) => valid.matches(record),
        Err(_) => false,
    }
}

/// Reads a parameter's value from a record with strict coercion.
pub fn resolve_metric(
    source: MetricSource,
    record: &InstrumentRecord,
) -> Result<f64, CoercionFailure> {
    match source {
        MetricSource::Price => record.price().ok_or(CoercionFailure::Absent),
        MetricSource::NetChange => record.net_change().ok_or(CoercionFailure::Absent),
        MetricSource::PercentChange => record.percent_change().ok_or(CoercionFailure::Absent),
        MetricSource::Metric(names) => {
            let mut outcome = Err(CoercionFailure::Absent);
            for name in names {
                match coerce_numeric_strict(record.metric(name)) {
                    Err(CoercionFailure::Absent) => continue,
                    other => {
                        outcome = other;
                        break;
                    }
                }
            }
            outcome
        }
    }
}

const OPERATOR_TOKENS: &[&str] = &["<=", ">=", "==", "<", ">", "="];

/// Parses `KEY OP VALUE`, e.g. `P/E < 20` or `Debt to Equity <= 0.5`.
///
/// The key may contain spaces and `/`; the first operator token splits it
/// from the value. Only the syntax is checked here.
pub fn parse_condition(input: &str) -> Result<Condition, ParseError> {
    let (op_pos, token) = find_operator(input).ok_or_else(|| ParseError {
        message: "expected comparison operator (<, <=, >, >=, =)".into(),
        position: input.len(),
    })?;

    let key = input[..op_pos].trim();
    if key.is_empty() {
        return Err(ParseError {
            message: "expected parameter name before operator".into(),
            position: op_pos,
        });
    }

    let value_start = op_pos + token.len();
    let value = input[value_start..].trim();
    if value.is_empty() {
        return Err(ParseError {
            message: "expected value after operator".into(),
            position: input.len(),
        });
    }

    let operator = token.parse::<Operator>().map_err(|message| ParseError {
        message,
        position: op_pos,
    })?;

    Ok(Condition::new(key, operator, value))
}

fn find_operator(input: &str) -> Option<(usize, &'static str)> {
    for (pos, _) in input.char_indices() {
        let rest = &input[pos..];
        if let Some(token) = OPERATOR_TOKENS.iter().copied().find(|t| rest.starts_with(*t)) {
            return Some((pos, token));
        }
    }
    None
}
