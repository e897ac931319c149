//! Proxy errors.

use thiserror::Error;

/// Errors raised when naming or configuring proxies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// Name does not match any known proxy
    #[error("Unknown proxy: {0}")]
    UnknownProxy(String),

    /// Par value must be strictly positive
    #[error("Invalid par value: {0}")]
    InvalidParValue(String),
}
