//! Screen and display configuration.
//!
//! A screen file carries a `[screen]` section with `name`, an optional `id`
//! and `conditions`, a `|`-separated list of `KEY OP VALUE` predicates.
//! Syntax is checked here; parameter and value validity is left to
//! evaluation, which skips invalid conditions.

use crate::domain::condition::{parse_condition, Condition};
use crate::domain::display::DEFAULT_CURRENCY_SYMBOL;
use crate::domain::error::ScreenerError;
use crate::domain::screen::ScreenDefinition;
use crate::ports::config_port::ConfigPort;

pub const CONDITION_SEPARATOR: char = '|';

const SECTION: &str = "screen";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    pub currency_symbol: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

impl DisplaySettings {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        match config.get_string("display", "currency_symbol") {
            Some(symbol) if !symbol.trim().is_empty() => Self {
                currency_symbol: symbol.trim().to_string(),
            },
            _ => Self::default(),
        }
    }
}

pub fn validate_screen_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_name(config)?;
    parse_conditions(config)?;
    Ok(())
}

/// Builds a screen from config. Conditions keep their listed order.
pub fn build_screen(config: &dyn ConfigPort) -> Result<ScreenDefinition, ScreenerError> {
    let name = validate_name(config)?;
    let mut conditions = parse_conditions(config)?.into_iter();

    let first = conditions.next().ok_or_else(no_conditions)?;
    let mut screen = match config.get_string(SECTION, "id") {
        Some(id) if !id.trim().is_empty() => ScreenDefinition::with_id(id.trim(), &name, first)?,
        _ => ScreenDefinition::new(&name, first)?,
    };
    for condition in conditions {
        screen = screen.add_condition(condition);
    }
    Ok(screen)
}

fn validate_name(config: &dyn ConfigPort) -> Result<String, ScreenerError> {
    match config.get_string(SECTION, "name") {
        Some(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        Some(_) => Err(ScreenerError::ConfigInvalid {
            section: SECTION.into(),
            key: "name".into(),
            reason: "name must not be empty".into(),
        }),
        None => Err(ScreenerError::ConfigMissing {
            section: SECTION.into(),
            key: "name".into(),
        }),
    }
}

fn parse_conditions(config: &dyn ConfigPort) -> Result<Vec<Condition>, ScreenerError> {
    let raw = config
        .get_string(SECTION, "conditions")
        .ok_or_else(|| ScreenerError::ConfigMissing {
            section: SECTION.into(),
            key: "conditions".into(),
        })?;

    let mut conditions = Vec::new();
    for text in raw.split(CONDITION_SEPARATOR) {
        if text.trim().is_empty() {
            continue;
        }
        let condition = parse_condition(text).map_err(|e| ScreenerError::ConfigInvalid {
            section: SECTION.into(),
            key: "conditions".into(),
            reason: e.display_with_context(text),
        })?;
        conditions.push(condition);
    }

    if conditions.is_empty() {
        return Err(no_conditions());
    }
    Ok(conditions)
}

fn no_conditions() -> ScreenerError {
    ScreenerError::ConfigInvalid {
        section: SECTION.into(),
        key: "conditions".into(),
        reason: "at least one condition is required".into(),
    }
}
