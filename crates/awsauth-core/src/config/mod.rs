//! Provider configuration
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! The configuration mirrors a provider block: optional explicit keys, a
//! shared-credentials profile, custom endpoints, account guard lists and the
//! switches that skip parts of identity establishment.
//!
//! # Features
//!
//! - TOML file in the platform config directory or an explicit path
//! - Environment variable expansion in config files
//! - Metadata endpoint override read only at the process-entry boundary

pub mod config;
pub mod error;

pub use config::{Config, Endpoints};
pub use error::{ConfigError, Result};
