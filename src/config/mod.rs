//! Configuration management for the tutor-match service
//!
//! This module handles all configuration loading from environment variables,
//! optional TOML files, validation, and default values.

pub mod app;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, AuditSettings, ServerSettings, ServiceSettings};
