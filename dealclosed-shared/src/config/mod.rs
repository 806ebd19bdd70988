//! Client configuration: defaults, optional file, environment overrides.

pub mod client;

pub use client::{Config, ConfigError};
