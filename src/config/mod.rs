//! Configuration Module
//!
//! Operator-tunable settings loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `DEGRADIX_CONFIG` environment variable (path to TOML file)
//! 2. `degradix.toml` in the current working directory
//! 3. Built-in defaults ([`defaults`])
//!
//! The loaded [`DegradixConfig`] is passed explicitly to the pipeline and the
//! API at construction; nothing reads configuration from a global.

mod degradix_config;
pub mod defaults;
pub mod validation;

pub use degradix_config::*;
