//! Error handling for the ledvis runtime
//!
//! This module defines the error taxonomy and a Result alias used
//! throughout the crate. Recovery policy per variant:
//!
//! - [`LedVisError::Config`] — invalid topology or run configuration.
//!   Fatal at startup; the animation loop is never entered.
//! - [`LedVisError::Compile`] — the compiler subprocess failed. Recoverable
//!   during watch: the previous module stays active and the diagnostics are
//!   surfaced. Fatal only for the initial compile.
//! - [`LedVisError::Link`] — a required symbol was missing after a
//!   successful compile. Treated exactly like a compile failure.
//! - [`LedVisError::Hardware`] — a pixel sink failed to claim a resource.
//!   Fatal for startup; partially claimed resources are released first.
//!
//! Out-of-range program or palette selection at runtime is not an error
//! value at all: it is logged and ignored at the call site, never fatal.

use thiserror::Error;

/// Main error type for ledvis operations
#[derive(Error, Debug)]
pub enum LedVisError {
    /// Invalid topology or run configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// The compiler toolchain subprocess exited nonzero
    #[error("compile failed (exit status {status}):\n{diagnostics}")]
    Compile {
        /// Exit status of the compiler subprocess (-1 when killed by a signal)
        status: i32,
        /// Captured stdout + stderr of the compiler
        diagnostics: String,
    },

    /// A compiled module could not be loaded or is missing required symbols
    #[error("module link error: {0}")]
    Link(String),

    /// A pixel sink failed to initialize or lost its backing resource
    #[error("hardware error: {0}")]
    Hardware(String),

    /// IO errors (source file access, work directory setup)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ledvis operations
pub type Result<T> = std::result::Result<T, LedVisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_carries_diagnostics() {
        let err = LedVisError::Compile {
            status: 1,
            diagnostics: "programs.c:12: error: expected ';'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exit status 1"));
        assert!(msg.contains("expected ';'"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LedVisError = io.into();
        assert!(matches!(err, LedVisError::Io(_)));
    }
}
