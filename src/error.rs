//! Startup error types.
//!
//! Per-request failures never surface here; they become HTTP statuses.

use std::fmt;
use std::net::SocketAddr;

/// Fatal errors that stop the server before (or instead of) serving.
#[derive(Debug)]
pub enum ServerError {
    /// The listening socket could not be bound (port in use, permission denied).
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    /// Settings could not be assembled.
    Config(config::ConfigError),
    /// Working directory or runtime setup failure.
    Io(std::io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind { source, .. } | Self::Io(source) => Some(source),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
