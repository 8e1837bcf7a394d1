//! Error types for the terminal interface layer
//!
//! This module provides the structured error types used across the crate.
//! Terminal I/O failures are fatal to the caller by contract; they are
//! surfaced as errors so the binary can terminate cleanly rather than
//! panicking inside the render or decode path.

use std::fmt;
use std::io;

/// Result alias used throughout the terminal layer
pub type TermResult<T> = Result<T, TermError>;

/// Top-level error type for terminal operations
#[derive(Debug)]
pub enum TermError {
    /// Output-device I/O failure. There is no recovery contract in this
    /// layer; callers are expected to treat this as fatal.
    Io(io::Error),
    /// The controlling terminal could not be placed in raw mode or its
    /// geometry could not be queried.
    Device { message: String },
    /// The print-screen output command could not be spawned or fed.
    Print { command: String, message: String },
}

impl fmt::Display for TermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermError::Io(e) => write!(f, "terminal I/O failure: {}", e),
            TermError::Device { message } => {
                write!(f, "terminal device error: {}", message)
            }
            TermError::Print { command, message } => {
                write!(f, "print screen via '{}' failed: {}", command, message)
            }
        }
    }
}

impl std::error::Error for TermError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TermError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TermError {
    fn from(e: io::Error) -> Self {
        TermError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = TermError::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
        assert!(err.to_string().contains("terminal I/O failure"));
    }

    #[test]
    fn test_print_error_display() {
        let err = TermError::Print {
            command: "lpr".to_string(),
            message: "not found".to_string(),
        };
        assert!(err.to_string().contains("lpr"));
    }
}
