//! Screen persistence port trait.

use crate::domain::error::ScreenerError;
use crate::domain::screen::ScreenDefinition;

/// Key-value persistence of screen definitions, keyed by screen id.
pub trait ScreenStore {
    /// Inserts or replaces the screen with the same id.
    fn save(&self, screen: &ScreenDefinition) -> Result<(), ScreenerError>;

    /// Fails with [`ScreenerError::NotFound`] for an unknown id.
    fn load(&self, id: &str) -> Result<ScreenDefinition, ScreenerError>;

    /// All stored screens, ordered by name then id.
    fn list(&self) -> Result<Vec<ScreenDefinition>, ScreenerError>;

    /// Fails with [`ScreenerError::NotFound`] for an unknown id.
    fn delete(&self, id: &str) -> Result<(), ScreenerError>;
}
