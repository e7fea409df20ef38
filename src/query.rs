//! Compiled query tree: boolean composition of terms and NEAR clauses over a
//! single content blob.
//!
//! Building a [`Node`] never touches an [`Engine`]; evaluating one always
//! does, so the same compiled tree can be run against many different content
//! blobs without recompiling regexes each time.

use crate::engine::Engine;
use crate::fuzzy::FuzzyOptions;
use crate::term::{MatchOptions, Term};

/// One node of a compiled query.
#[derive(Debug, Clone)]
pub enum Node {
    /// All children must match.
    And(Vec<Node>),
    /// At least one child must match.
    Or(Vec<Node>),
    /// The inner node must not match.
    Not(Box<Node>),
    /// A single term, matched via [`Engine::search`].
    Term {
        /// The term to search for.
        term: Term,
        /// Options controlling case sensitivity, whole-word, and fuzzy fallback.
        options: MatchOptions,
    },
    /// Two terms within `distance` words of each other, via [`Engine::evaluate_near`].
    Near {
        /// The first term.
        term1: Term,
        /// The second term.
        term2: Term,
        /// Maximum word distance between matches of `term1` and `term2`.
        distance: i64,
        /// Options controlling case sensitivity, whole-word, and fuzzy fallback.
        options: MatchOptions,
    },
}

impl Node {
    /// Construct a leaf matching a single term.
    #[must_use]
    pub fn term(term: Term, options: MatchOptions) -> Self {
        Self::Term { term, options }
    }

    /// Construct a leaf matching two terms within `distance` words.
    #[must_use]
    pub fn near(term1: Term, term2: Term, distance: i64, options: MatchOptions) -> Self {
        Self::Near {
            term1,
            term2,
            distance,
            options,
        }
    }
}

fn fuzzy_options_for(engine: &Engine, options: MatchOptions) -> FuzzyOptions {
    FuzzyOptions {
        threshold: engine.config().match_threshold,
        case_sensitive: options.case_sensitive,
        include_score: false,
        whole_word: options.whole_word,
    }
}

/// Evaluate `node` against `content`, short-circuiting AND/OR the way a
/// boolean expression normally would: an AND stops at the first failing
/// child, an OR stops at the first matching one.
///
/// `path`, if given, is forwarded to every NEAR clause's circuit-breaker
/// bookkeeping.
#[must_use]
pub fn evaluate(node: &Node, content: &str, engine: &Engine, path: Option<&str>) -> bool {
    match node {
        Node::And(children) => children.iter().all(|child| evaluate(child, content, engine, path)),
        Node::Or(children) => children.iter().any(|child| evaluate(child, content, engine, path)),
        Node::Not(inner) => !evaluate(inner, content, engine, path),
        Node::Term { term, options } => {
            if !options.fuzzy_enabled {
                match term {
                    Term::Literal(text) => {
                        if options.whole_word {
                            !crate::fuzzy::whole_word_positions(content, text, options.case_sensitive).is_empty()
                        } else {
                            let content_chars: Vec<char> = content.chars().collect();
                            let term_chars: Vec<char> = text.chars().collect();
                            !crate::fuzzy::exact_positions(&content_chars, &term_chars, options.case_sensitive).is_empty()
                        }
                    }
                    Term::Pattern { regex, .. } => regex.is_match(content),
                }
            } else {
                engine.search(content, term, fuzzy_options_for(engine, *options)).is_match
            }
        }
        Node::Near {
            term1,
            term2,
            distance,
            options,
        } => engine.evaluate_near(content, term1, term2, *distance, *options, path),
    }
}
