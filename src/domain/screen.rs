//! Screen definition: a named, ordered conjunction of conditions.
//!
//! Every editing operation borrows the current definition and returns a new
//! one, so renders holding an older value never see it change. Conditions
//! carry a [`ConditionId`] that stays fixed across edits; list order only
//! matters for display.

use crate::domain::condition::{validate, Condition, ConditionEdit};
use crate::domain::error::{InvariantViolation, ScreenError, ValidationError};
use crate::domain::parameter::ParameterRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEntry {
    pub id: ConditionId,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredScreen")]
pub struct ScreenDefinition {
    id: String,
    name: String,
    conditions: Vec<ConditionEntry>,
    next_condition_id: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Outcome of [`ScreenDefinition::update_condition`]: the edited screen plus
/// the validation result of the touched condition only.
#[derive(Debug, Clone)]
pub struct ConditionUpdate {
    pub screen: ScreenDefinition,
    pub validation: Result<(), ValidationError>,
}

impl ScreenDefinition {
    /// Creates a screen with a generated id.
    pub fn new(name: &str, first: Condition) -> Result<Self, ScreenError> {
        Self::with_id(uuid::Uuid::new_v4().to_string(), name, first)
    }

    pub fn with_id(
        id: impl Into<String>,
        name: &str,
        first: Condition,
    ) -> Result<Self, ScreenError> {
        let name = clean_name(name)?;
        let now = Utc::now();
        Ok(Self {
            id: id.into(),
            name,
            conditions: vec![ConditionEntry {
                id: ConditionId(0),
                condition: first,
            }],
            next_condition_id: 1,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn entries(&self) -> &[ConditionEntry] {
        &self.conditions
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter().map(|e| &e.condition)
    }

    pub fn condition(&self, index: usize) -> Option<&Condition> {
        self.conditions.get(index).map(|e| &e.condition)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Always `false`: a screen holds at least one condition.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn index_of(&self, id: ConditionId) -> Option<usize> {
        self.conditions.iter().position(|e| e.id == id)
    }

    pub fn add_condition(&self, condition: Condition) -> ScreenDefinition {
        let mut next = self.touched();
        next.conditions.push(ConditionEntry {
            id: ConditionId(next.next_condition_id),
            condition,
        });
        next.next_condition_id = next.next_condition_id.saturating_add(1);
        next
    }

    /// Appends the blank `{"", >, ""}` condition an editor starts from.
    pub fn add_default_condition(&self) -> ScreenDefinition {
        self.add_condition(Condition::default())
    }

    pub fn update_condition(
        &self,
        index: usize,
        edit: ConditionEdit,
        registry: &ParameterRegistry,
    ) -> Result<ConditionUpdate, ScreenError> {
        self.check_index(index)?;
        let mut next = self.touched();
        let entry = &mut next.conditions[index];
        entry.condition = entry.condition.with_edit(edit);
        let validation = validate(&entry.condition, registry).map(|_| ());
        Ok(ConditionUpdate {
            screen: next,
            validation,
        })
    }

    pub fn remove_condition(&self, index: usize) -> Result<ScreenDefinition, ScreenError> {
        self.check_index(index)?;
        if self.conditions.len() == 1 {
            return Err(InvariantViolation::LastCondition.into());
        }
        let mut next = self.touched();
        next.conditions.remove(index);
        Ok(next)
    }

    pub fn rename(&self, name: &str) -> Result<ScreenDefinition, ScreenError> {
        let name = clean_name(name)?;
        let mut next = self.touched();
        next.name = name;
        Ok(next)
    }

    /// Every condition that would be skipped by evaluation, with its position.
    pub fn invalid_conditions(
        &self,
        registry: &ParameterRegistry,
    ) -> Vec<(usize, ValidationError)> {
        self.conditions
            .iter()
            .enumerate()
            .filter_map(|(i, e)| validate(&e.condition, registry).err().map(|err| (i, err)))
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<(), ScreenError> {
        if index >= self.conditions.len() {
            return Err(ScreenError::IndexOutOfRange {
                index,
                len: self.conditions.len(),
            });
        }
        Ok(())
    }

    fn touched(&self) -> ScreenDefinition {
        let mut next = self.clone();
        next.updated_at = Utc::now().max(self.updated_at);
        next
    }
}

fn clean_name(name: &str) -> Result<String, ScreenError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ScreenError::EmptyName);
    }
    Ok(trimmed.to_string())
}

#[derive(Deserialize)]
struct StoredScreen {
    id: String,
    name: String,
    conditions: Vec<ConditionEntry>,
    #[serde(default)]
    next_condition_id: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoredScreen> for ScreenDefinition {
    type Error = ScreenError;

    fn try_from(stored: StoredScreen) -> Result<Self, Self::Error> {
        if stored.conditions.is_empty() {
            return Err(InvariantViolation::LastCondition.into());
        }
        let name = clean_name(&stored.name)?;
        let mut next_condition_id = stored.next_condition_id;
        for entry in &stored.conditions {
            let after = entry
                .id
                .0
                .checked_add(1)
                .ok_or(ScreenError::ConditionIdExhausted { id: entry.id.0 })?;
            next_condition_id = next_condition_id.max(after);
        }
        Ok(Self {
            id: stored.id,
            name,
            conditions: stored.conditions,
            next_condition_id,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }
}
