//! In-process screen store.

use crate::domain::error::ScreenerError;
use crate::domain::screen::ScreenDefinition;
use crate::ports::screen_store::ScreenStore;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryScreenStore {
    screens: RwLock<BTreeMap<String, ScreenDefinition>>,
}

impl MemoryScreenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> ScreenerError {
        ScreenerError::Database {
            reason: "screen store lock poisoned".into(),
        }
    }
}

impl ScreenStore for MemoryScreenStore {
    fn save(&self, screen: &ScreenDefinition) -> Result<(), ScreenerError> {
        let mut screens = self.screens.write().map_err(|_| Self::poisoned())?;
        screens.insert(screen.id().to_string(), screen.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<ScreenDefinition, ScreenerError> {
        let screens = self.screens.read().map_err(|_| Self::poisoned())?;
        screens
            .get(id)
            .cloned()
            .ok_or_else(|| ScreenerError::NotFound { id: id.to_string() })
    }

    fn list(&self) -> Result<Vec<ScreenDefinition>, ScreenerError> {
        let screens = self.screens.read().map_err(|_| Self::poisoned())?;
        let mut all: Vec<ScreenDefinition> = screens.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));
        Ok(all)
    }

    fn delete(&self, id: &str) -> Result<(), ScreenerError> {
        let mut screens = self.screens.write().map_err(|_| Self::poisoned())?;
        screens
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ScreenerError::NotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::condition::Condition;
    use crate::domain::parameter::Operator;

    fn screen(id: &str, name: &str) -> ScreenDefinition {
        ScreenDefinition::with_id(id, name, Condition::new("P/E", Operator::Lt, "20")).unwrap()
    }

    #[test]
    fn save_then_load() {
        let store = MemoryScreenStore::new();
        store.save(&screen("a", "Alpha")).unwrap();
        assert_eq!(store.load("a").unwrap().name(), "Alpha");
    }

    #[test]
    fn save_replaces_existing() {
        let store = MemoryScreenStore::new();
        let s = screen("a", "Alpha");
        store.save(&s).unwrap();
        store.save(&s.rename("Renamed").unwrap()).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.load("a").unwrap().name(), "Renamed");
    }

    #[test]
    fn list_is_sorted_by_name() {
        let store = MemoryScreenStore::new();
        store.save(&screen("1", "Zeta")).unwrap();
        store.save(&screen("2", "Alpha")).unwrap();
        let names: Vec<String> =
            store.list().unwrap().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn missing_ids_are_not_found() {
        let store = MemoryScreenStore::new();
        assert!(matches!(store.load("nope"), Err(ScreenerError::NotFound { .. })));
        assert!(matches!(store.delete("nope"), Err(ScreenerError::NotFound { .. })));
    }

    #[test]
    fn delete_removes() {
        let store = MemoryScreenStore::new();
        store.save(&screen("a", "Alpha")).unwrap();
        store.delete("a").unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
