//! Error types for the Galaxy3D GPU resource layer
//!
//! Only recoverable failures live here. Caller contract violations (cleaning
//! the mips of a texture that has none, sampling dirty mips) are not errors:
//! they abort when diagnostics are enabled and go unchecked otherwise.

use std::fmt;

/// Result type for GPU resource operations
pub type Result<T> = std::result::Result<T, Error>;

/// GPU resource layer errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource or resource descriptor
    InvalidResource(String),

    /// Initialization failed (engine, context, backend)
    InitializationFailed(String),

    /// The GPU context was abandoned and accepts no new work
    ContextAbandoned,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ContextAbandoned => write!(f, "GPU context was abandoned"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
