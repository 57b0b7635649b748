//! Error types for sora-battery-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HID subsystem failure (init, enumeration, open).
    #[error("HID error: {0}")]
    Hid(String),

    /// Feature report write or read failed.
    #[error("feature report exchange failed: {0}")]
    ExchangeFailed(String),

    /// Response too short to hold every status offset.
    #[error("malformed response: {len} bytes (minimum {min})")]
    MalformedResponse { len: usize, min: usize },

    /// Poll cycle did not return within its bound.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Settings file missing, unparsable, or invalid.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
