//! Proximity evaluation: decide whether two terms co-occur within a maximum
//! word distance in a content blob.
//!
//! Orchestrates content fingerprinting, per-term offset resolution (exact
//! scan, with a fuzzy fallback when enabled), a cheap character-distance
//! prefilter, and a two-pointer scan over word indices. Content past
//! `max_full_content_size` is evaluated in overlapping chunks instead of as
//! one pass, trading completeness at chunk borders (mitigated by the
//! overlap) for bounded memory and time.

use crate::cache::BoundedCache;
use crate::circuit_breaker::CircuitBreaker;
use crate::config::EngineConfig;
use crate::deadline::Deadline;
use crate::fingerprint::fingerprint;
use crate::fuzzy::{self, FuzzyOptions};
use crate::memory_pool::MemoryPool;
use crate::metrics::Metrics;
use crate::term::{MatchOptions, Term};
use crate::word_index::{boundaries, word_index_of_in, Span};
use regex::Regex;
use std::sync::Arc;

fn term_cache_key(fingerprint: &str, term: &Term, options: MatchOptions) -> String {
    format!(
        "{fingerprint}|{}|{}|{}|{}",
        term.repr(),
        options.case_sensitive,
        term.is_regex(),
        options.whole_word
    )
}

fn proximity_cache_key(
    fingerprint: &str,
    term1: &Term,
    term2: &Term,
    distance: i64,
    options: MatchOptions,
) -> String {
    format!(
        "{fingerprint}|{}|{}|{distance}|{}|{}|{}",
        term1.repr(),
        term2.repr(),
        options.case_sensitive,
        options.fuzzy_enabled,
        options.whole_word
    )
}

fn exact_offsets(content: &str, content_chars: &[char], term: &Term, options: MatchOptions) -> Vec<usize> {
    match term {
        Term::Literal(text) => {
            if options.whole_word {
                fuzzy::whole_word_positions(content, text, options.case_sensitive)
            } else {
                let term_chars: Vec<char> = text.chars().collect();
                fuzzy::exact_positions(content_chars, &term_chars, options.case_sensitive)
            }
        }
        Term::Pattern { regex, .. } => regex_offsets(content, regex),
    }
}

/// Offsets of every regex match, mapped from byte to character offsets. The
/// `regex` crate's `find_iter` already advances past zero-width matches by
/// one byte so the scan can never stall.
fn regex_offsets(content: &str, regex: &Regex) -> Vec<usize> {
    let byte_to_char = crate::word_index::byte_to_char_offsets(content);
    regex
        .find_iter(content)
        .map(|m| byte_to_char[m.start()])
        .collect()
}

fn is_sorted_ascending(values: &[usize]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

fn two_pointer_i64(a: &[i64], b: &[i64], distance: i64) -> bool {
    let (mut i, mut j) = (0usize, 0usize);
    while i < a.len() && j < b.len() {
        if (a[i] - b[j]).abs() <= distance {
            return true;
        }
        if a[i] < b[j] {
            i += 1;
        } else {
            j += 1;
        }
    }
    false
}

/// Cheap pre-check over character offsets (not word indices): if neither
/// list has more than 5 entries the check is skipped (not worth the
/// overhead); otherwise bail out early if no pair of offsets is within
/// `distance * 6 * 2` characters (6 approximates average word length).
fn prefilter_possible(offsets1: &[usize], offsets2: &[usize], distance: i64) -> bool {
    if offsets1.len() <= 5 || offsets2.len() <= 5 {
        return true;
    }
    let a: Vec<i64> = offsets1.iter().map(|&o| o as i64).collect();
    let b: Vec<i64> = offsets2.iter().map(|&o| o as i64).collect();
    two_pointer_i64(&a, &b, distance * 6 * 2)
}

fn word_indices(content: &str, spans: &[Span], offsets: &[usize], pool: &MemoryPool) -> Vec<i64> {
    let mut pooled = pool.acquire(offsets.len());
    {
        let buf = pooled.as_mut();
        for &offset in offsets {
            if let Some(idx) = word_index_of_in(offset, content, spans) {
                buf.push(idx as i64);
            }
        }
    }
    pooled.as_slice().to_vec()
}

/// Borrows the shared caches, pool, breaker and metrics an [`crate::engine::Engine`]
/// owns, and runs one proximity evaluation against them.
pub struct NearEvaluator<'a> {
    pub term_indices: &'a BoundedCache<String, Arc<Vec<usize>>>,
    pub proximity: &'a BoundedCache<String, bool>,
    pub fuzzy_results: &'a BoundedCache<String, fuzzy::FuzzyResult>,
    pub pool: &'a MemoryPool,
    pub breaker: &'a CircuitBreaker,
    pub metrics: &'a Metrics,
    pub config: &'a EngineConfig,
}

impl<'a> NearEvaluator<'a> {
    fn term_offsets(&self, content: &str, content_chars: &[char], fp: &str, term: &Term, options: MatchOptions) -> Vec<usize> {
        let key = term_cache_key(fp, term, options);
        if let Some(cached) = self.term_indices.get(&key) {
            return (*cached).clone();
        }
        let offsets = exact_offsets(content, content_chars, term, options);
        self.term_indices.set(key, Arc::new(offsets.clone()));
        offsets
    }

    fn fuzzy_fallback(&self, content: &str, fp: &str, term: &Term, options: MatchOptions) -> Option<Vec<usize>> {
        let text = term.as_literal()?;
        if text.chars().count() < 3 {
            return None;
        }
        let fuzzy_opts = FuzzyOptions {
            threshold: self.config.match_threshold,
            case_sensitive: options.case_sensitive,
            include_score: true,
            whole_word: options.whole_word,
        };
        let key = format!(
            "{fp}|{text}|{}|{}|{}",
            fuzzy_opts.case_sensitive, fuzzy_opts.whole_word, fuzzy_opts.include_score
        );
        let result = if let Some(cached) = self.fuzzy_results.get(&key) {
            cached
        } else {
            let computed = fuzzy::search(
                content,
                text,
                fuzzy_opts,
                self.config.min_term_length,
                self.config.max_full_content_size,
                self.config.chunk_size,
                self.config.chunk_overlap,
            );
            self.fuzzy_results.set(key, computed.clone());
            computed
        };
        self.metrics.record_fuzzy_fallback();
        result.match_positions
    }

    /// Run the two-pointer check for one window of content (the whole blob
    /// for the non-chunked path, or a single sliding window for the chunked
    /// path).
    fn proximity_in_window(&self, window_content: &str, offsets1: &[usize], offsets2: &[usize], distance: i64) -> bool {
        let spans = boundaries(window_content);
        let idx1 = word_indices(window_content, &spans, offsets1, self.pool);
        let idx2 = word_indices(window_content, &spans, offsets2, self.pool);
        if idx1.is_empty() || idx2.is_empty() {
            return false;
        }
        two_pointer_i64(&idx1, &idx2, distance)
    }

    fn chunked_evaluate(&self, content_chars: &[char], offsets1: &[usize], offsets2: &[usize], distance: i64, deadline: &Deadline, path: Option<&str>) -> bool {
        let chunk_size = self.config.chunk_size;
        let step = chunk_size.saturating_sub(self.config.chunk_overlap).max(1);
        let mut start = 0usize;
        self.metrics.record_near_chunked_evaluation();

        loop {
            if start >= content_chars.len() {
                break;
            }
            if deadline.is_expired() {
                self.record_timeout(path);
                return false;
            }
            let end = (start + chunk_size).min(content_chars.len());
            let local1: Vec<usize> = offsets1
                .iter()
                .filter(|&&o| o >= start && o < end)
                .map(|&o| o - start)
                .collect();
            let local2: Vec<usize> = offsets2
                .iter()
                .filter(|&&o| o >= start && o < end)
                .map(|&o| o - start)
                .collect();

            if !local1.is_empty() && !local2.is_empty() {
                let window: String = content_chars[start..end].iter().collect();
                if self.proximity_in_window(&window, &local1, &local2, distance) {
                    return true;
                }
            }

            if end >= content_chars.len() {
                break;
            }
            start += step;
        }
        false
    }

    fn record_timeout(&self, path: Option<&str>) {
        if let Some(path) = path {
            self.breaker.record_timeout(path);
        }
        self.metrics.record_near_timeout();
    }

    /// Decide whether `term1` and `term2` co-occur within `distance` words in
    /// `content`, under `options`.
    pub fn evaluate(&self, content: &str, term1: &Term, term2: &Term, distance: i64, options: MatchOptions, path: Option<&str>) -> bool {
        self.metrics.record_near_evaluation();

        if content.is_empty() || distance < 0 {
            self.metrics.record_near_empty_short_circuit();
            return false;
        }
        let content_chars: Vec<char> = content.chars().collect();
        if content_chars.len() < 10 {
            self.metrics.record_near_empty_short_circuit();
            return false;
        }

        let fp = fingerprint(content);
        let prox_key = proximity_cache_key(&fp, term1, term2, distance, options);
        if let Some(cached) = self.proximity.get(&prox_key) {
            return cached;
        }

        let deadline = Deadline::start(self.config.max_execution_time);

        let mut offsets1 = self.term_offsets(content, &content_chars, &fp, term1, options);
        if options.fuzzy_enabled && offsets1.is_empty() {
            if let Some(positions) = self.fuzzy_fallback(content, &fp, term1, options) {
                offsets1 = positions;
            }
        }

        let term1_viable = !offsets1.is_empty() || term1.is_regex();

        let mut offsets2 = self.term_offsets(content, &content_chars, &fp, term2, options);
        if options.fuzzy_enabled && offsets2.is_empty() && term1_viable {
            if let Some(positions) = self.fuzzy_fallback(content, &fp, term2, options) {
                offsets2 = positions;
            }
        }

        if offsets1.is_empty() || offsets2.is_empty() {
            self.proximity.set(prox_key, false);
            self.metrics.record_near_empty_short_circuit();
            return false;
        }

        if !is_sorted_ascending(&offsets1) {
            offsets1.sort_unstable();
        }
        if !is_sorted_ascending(&offsets2) {
            offsets2.sort_unstable();
        }

        if deadline.is_expired() {
            self.record_timeout(path);
            return false;
        }

        if !prefilter_possible(&offsets1, &offsets2, distance) {
            self.proximity.set(prox_key, false);
            return false;
        }

        if deadline.is_expired() {
            self.record_timeout(path);
            return false;
        }

        let result = if content_chars.len() > self.config.max_full_content_size {
            self.chunked_evaluate(&content_chars, &offsets1, &offsets2, distance, &deadline, path)
        } else {
            self.proximity_in_window(content, &offsets1, &offsets2, distance)
        };

        if deadline.is_expired() {
            self.record_timeout(path);
            return false;
        }

        self.proximity.set(prox_key, result);
        result
    }
}
