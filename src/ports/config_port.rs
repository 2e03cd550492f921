//! Configuration access port trait.
//!
//! Screens and display settings are read through this trait so the domain
//! never depends on a file format.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    /// Falls back to `default` when the key is missing or not an integer.
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
}
