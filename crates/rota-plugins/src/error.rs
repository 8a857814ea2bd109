//! Error types for plugin construction.

use thiserror::Error;

/// Errors raised while configuring a service client plugin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// A required setting is missing or invalid.
    #[error("invalid plugin configuration: {reason}")]
    Config {
        /// What is wrong with the configuration.
        reason: String,
    },
}

/// Result type alias for plugin construction.
pub type Result<T> = std::result::Result<T, PluginError>;
