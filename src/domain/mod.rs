//! Core domain types and logic.

pub mod parameter;
pub mod coercion;
pub mod display;
pub mod condition;
pub mod screen;
pub mod screen_eval;
pub mod screen_config;
pub mod instrument;
pub mod normalizer;
pub mod refresh;
pub mod error;
