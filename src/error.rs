//! Crate-level error types.

use std::fmt;

use crate::render::BackendError;

/// Errors produced by the orrery crate.
#[derive(Debug)]
pub enum OrreryError {
    /// Invalid construction parameters (orbit period, camera planes, viewport, ...).
    Configuration(String),
    /// Invalid argument to a per-frame operation, e.g. a negative time step.
    InvalidInput(String),
    /// The camera forward vector is parallel to world-up, so no right vector exists.
    DegenerateBasis,
    /// The rendering backend rejected a call.
    Backend(BackendError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// Malformed scene or options file.
    Parse(String),
}

impl fmt::Display for OrreryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::DegenerateBasis => {
                write!(f, "camera forward vector is parallel to world up")
            }
            Self::Backend(e) => write!(f, "backend error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for OrreryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BackendError> for OrreryError {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

impl From<std::io::Error> for OrreryError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for OrreryError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
