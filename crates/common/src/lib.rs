//! nfvis-declare Common Library
//!
//! Shared vocabulary for the reconciliation engine and the CLI: resource
//! kinds and their wire layout, outcome reports, errors and connection
//! configuration.

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{ConnectionConfig, ConnectionOverrides};
pub use error::{Error, Result};
pub use types::*;

/// nfvis-declare version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default directory for local settings
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".nfvis")
}

/// Default connection configuration file
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
