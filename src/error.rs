//! Error types for the query-evaluation kernel.
//!
//! The kernel almost never raises: invalid input, timeouts, and internal
//! matcher failures are folded into `false`/absent results and counters (see
//! [`crate::metrics`]). The one exception is regex compilation, which happens
//! at a distinct boundary ([`crate::engine::Engine::compile_term`]) and
//! surfaces a typed error so a host can show the user a specific message
//! instead of silently matching nothing.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors the kernel can surface.
///
/// Only [`Error::InvalidRegex`] is ever returned from a public entry point;
/// the other variants exist for completeness and for internal logging context
/// (see `is_recoverable`/`category`), mirroring the error taxonomy the host
/// crate documents even though most of it is absorbed internally here.
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied regex term failed to compile.
    ///
    /// This is the only error variant returned through the public API: term
    /// compilation happens once, at the boundary, and the compiled artifact
    /// is reused afterwards.
    #[error("invalid regex /{pattern}/{flags}: {reason}")]
    InvalidRegex {
        /// The regex source pattern that failed to compile.
        pattern: String,
        /// The flags string supplied alongside the pattern.
        flags: String,
        /// The underlying compiler error message.
        reason: String,
    },

    /// Caller supplied invalid input (empty content, negative distance, ...).
    ///
    /// Never returned to a caller: evaluation functions fold this into
    /// `false` and bump the early-termination counter instead. Kept as a
    /// variant for internal bookkeeping and tests.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An internal matcher failure occurred.
    ///
    /// Never returned to a caller: `search` downgrades these to
    /// `isMatch=false` so a single pathological file can't crash a
    /// file-level pipeline.
    #[error("internal matcher failure: {0}")]
    Internal(String),
}

impl Error {
    /// Returns a short category tag for logging/metrics grouping.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRegex { .. } => "invalid_regex",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether retrying the same operation might succeed.
    ///
    /// None of the kernel's errors are transient: a bad regex stays bad, bad
    /// input stays bad, and an internal failure is downgraded before it ever
    /// reaches a caller as an `Error`.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_regex_is_not_recoverable() {
        let err = Error::InvalidRegex {
            pattern: "(".to_string(),
            flags: String::new(),
            reason: "unclosed group".to_string(),
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.category(), "invalid_regex");
    }

    #[test]
    fn display_includes_pattern_and_reason() {
        let err = Error::InvalidRegex {
            pattern: "a(".to_string(),
            flags: "i".to_string(),
            reason: "unclosed group".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("a("));
        assert!(message.contains("unclosed group"));
    }
}
