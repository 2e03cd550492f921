//! Port traits: the boundaries the domain consumes.

pub mod config_port;
pub mod screen_store;
