//! Configuration utilities
//!
//! - [`toml_config`] - `ares-research.toml` loading, validation and the
//!   lock-free configuration manager
//! - [`credentials`] - presence checks for data-source access keys

/// Data-source access credentials resolved from the environment.
pub mod credentials;
/// TOML configuration and its manager.
pub mod toml_config;
