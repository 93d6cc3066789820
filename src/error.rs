//! Error types.
//!
//! Almost nothing in the pipeline fails: unbound signals and events for unknown
//! actions are dropped silently. What remains are the ways a rebind capture can end
//! without a match ([`RebindError`]) and configuration loading ([`ConfigError`]).
use thiserror::Error;

/// Why a pending capture was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebindError {
    /// Another `capture_next` call replaced this one.
    #[error("rebind superseded by a newer capture request")]
    Superseded,

    /// The capture's timeout elapsed before a matching input arrived.
    #[error("rebind timed out")]
    TimedOut,

    /// `cancel()` was called while the capture was pending.
    #[error("rebind cancelled")]
    Cancelled,
}

/// Configuration and profile loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A binding table key that should name a numeric control index did not parse.
    #[error("invalid {device} binding key {key:?}: expected a control index")]
    InvalidKey { device: &'static str, key: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
