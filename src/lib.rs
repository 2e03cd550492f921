//! screener: stock screening engine and instrument normalization.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].
//!
//! Rendering surfaces use three entry points:
//! [`domain::normalizer::normalize`], [`domain::screen_eval::evaluate`] and
//! [`domain::parameter::ParameterRegistry::list_by_category`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
