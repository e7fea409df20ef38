//! The term representation and shared match options.
//!
//! A term is either a plain string or a compiled regex, represented as a
//! tagged variant rather than dynamically typed at the call site, so
//! [`Term::Pattern`] carries an already-compiled [`regex::Regex`] and
//! [`Error::InvalidRegex`](crate::Error) is the only place compilation can
//! fail.

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// A search term: either a literal string or a compiled regular expression.
#[derive(Debug, Clone)]
pub enum Term {
    /// A literal string, matched via substring/whole-word scanning.
    Literal(String),
    /// A compiled regular expression. `source`/`flags` are retained for
    /// cache-key and display purposes; `regex` is the reusable compiled
    /// artifact.
    Pattern {
        /// Original pattern source text.
        source: String,
        /// Flags string the pattern was compiled with (e.g. `"i"`).
        flags: String,
        /// The compiled regex.
        regex: Arc<Regex>,
    },
}

impl Term {
    /// Construct a literal term.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Compile `source` with `flags` (currently only `"i"` for
    /// case-insensitive is recognized; unknown flag characters are ignored,
    /// matching a permissive host-normalized-input contract).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegex`] if `source` fails to compile.
    pub fn pattern(source: impl Into<String>, flags: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let flags = flags.into();
        let mut builder = RegexBuilder::new(&source);
        builder.case_insensitive(flags.contains('i'));
        builder.multi_line(flags.contains('m'));
        builder.dot_matches_new_line(flags.contains('s'));
        let regex = builder.build().map_err(|e| Error::InvalidRegex {
            pattern: source.clone(),
            flags: flags.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::Pattern {
            source,
            flags,
            regex: Arc::new(regex),
        })
    }

    /// A stable string representation usable as part of a cache key.
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Self::Literal(text) => format!("L:{text}"),
            Self::Pattern { source, flags, .. } => format!("P:{source}/{flags}"),
        }
    }

    /// Whether this term is a regex pattern.
    #[must_use]
    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Pattern { .. })
    }

    /// The literal text, if this is [`Term::Literal`].
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(text) => Some(text),
            Self::Pattern { .. } => None,
        }
    }

    /// Character length of the term's textual representation (the pattern
    /// source for regex terms), used for fuzzy-matching thresholds.
    #[must_use]
    pub fn char_len(&self) -> usize {
        match self {
            Self::Literal(text) => text.chars().count(),
            Self::Pattern { source, .. } => source.chars().count(),
        }
    }
}

/// Options shared by `search`/`evaluate_near`.
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Case-fold matching across the board.
    pub case_sensitive: bool,
    /// Require `\bterm\b` boundaries.
    pub whole_word: bool,
    /// Permit the fuzzy matcher as a fallback when exact matching fails.
    pub fuzzy_enabled: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            whole_word: false,
            fuzzy_enabled: false,
        }
    }
}
