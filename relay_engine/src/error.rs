//! Error types for the Relay engine
//!
//! This module defines the error types used by the dispatch core and the
//! subsystems that consume commands.

use std::fmt;

/// Result type for Relay engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Relay engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Subsystem-side failure while applying a command
    BackendError(String),

    /// A queue could not grow to hold a new command
    OutOfMemory,

    /// Invalid resource reference (texture, track, light, etc.)
    InvalidResource(String),

    /// Composition root misuse (manager taken twice, missing manager)
    InitializationFailed(String),

    /// Command rejected by its precondition check
    MalformedCommand(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of memory while enqueuing command"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::MalformedCommand(msg) => write!(f, "Malformed command: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error and build an `Error::BackendError` from it
///
/// # Example
///
/// ```ignore
/// let body = bodies.get(key)
///     .ok_or_else(|| engine_err!("relay::PhysicsWorld", "Body {:?} vanished", key))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::relay::Error::BackendError(message)
    }};
}

/// Log an error and return it as `Err(Error::BackendError)`
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
