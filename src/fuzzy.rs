//! Approximate substring matching.
//!
//! Exact matches are always tried first and short-circuit the more expensive
//! fuzzy passes. For bounded-length content a sliding character window is
//! scored against the term with an edit-distance envelope; for content past
//! the full-scan threshold, a chunked word-level fallback keeps the work
//! linear in content length instead of quadratic.

use crate::word_index::byte_to_char_offsets;
use regex::RegexBuilder;
use serde::Serialize;
use std::time::Instant;

/// Options accepted by [`search`].
#[derive(Debug, Clone, Copy)]
pub struct FuzzyOptions {
    /// Upper bound on the accepted similarity score, in `[0, 1]`. Kept for
    /// API parity with the engine-level `threshold` option; the fuzzy pass's
    /// own acceptance cutoff is a fixed constant (see [`FUZZY_ACCEPT_SCORE`]).
    pub threshold: f64,
    /// Case-fold matching.
    pub case_sensitive: bool,
    /// Whether to compute and return match positions and a score.
    pub include_score: bool,
    /// Require `\bterm\b` boundaries.
    pub whole_word: bool,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            case_sensitive: false,
            include_score: true,
            whole_word: false,
        }
    }
}

/// Result of a [`search`] call.
#[derive(Debug, Clone, Serialize)]
pub struct FuzzyResult {
    /// Whether the term was found, exactly or approximately.
    pub is_match: bool,
    /// Normalized edit-distance score; `Some(0.0)` for exact matches.
    /// Only populated when `include_score` is set.
    pub score: Option<f64>,
    /// Character offsets at which matches begin. Only populated when
    /// `include_score` is set.
    pub match_positions: Option<Vec<usize>>,
    /// Wall-clock time spent in this call.
    pub processing_time_ms: u64,
}

impl FuzzyResult {
    fn no_match(elapsed_ms: u64) -> Self {
        Self {
            is_match: false,
            score: None,
            match_positions: None,
            processing_time_ms: elapsed_ms,
        }
    }
}

/// The fixed acceptance cutoff for the bounded-content fuzzy pass. Distinct
/// from `FuzzyOptions::threshold`, which the fuzzy pass does not consult.
pub const FUZZY_ACCEPT_SCORE: f64 = 0.6;

fn case_fold(chars: &[char], case_sensitive: bool) -> Vec<char> {
    if case_sensitive {
        chars.to_vec()
    } else {
        chars.iter().flat_map(|c| c.to_lowercase()).collect()
    }
}

/// Every non-overlapping occurrence of `term` in `content`, advancing the
/// cursor by the term's length on a match and by one character otherwise.
pub(crate) fn exact_positions(content: &[char], term: &[char], case_sensitive: bool) -> Vec<usize> {
    if term.is_empty() || content.len() < term.len() {
        return Vec::new();
    }
    let folded_content = case_fold(content, case_sensitive);
    let folded_term = case_fold(term, case_sensitive);
    let mut positions = Vec::new();
    let mut i = 0;
    while i + folded_term.len() <= folded_content.len() {
        if folded_content[i..i + folded_term.len()] == folded_term[..] {
            positions.push(i);
            i += folded_term.len();
        } else {
            i += 1;
        }
    }
    positions
}

/// Every occurrence of `\bterm\b` in `content`, as character offsets.
pub(crate) fn whole_word_positions(content: &str, term: &str, case_sensitive: bool) -> Vec<usize> {
    if term.is_empty() {
        return Vec::new();
    }
    let pattern = format!(r"\b{}\b", regex::escape(term));
    let Ok(re) = RegexBuilder::new(&pattern)
        .case_insensitive(!case_sensitive)
        .build()
    else {
        return Vec::new();
    };
    let byte_to_char = byte_to_char_offsets(content);
    re.find_iter(content)
        .map(|m| byte_to_char[m.start()])
        .collect()
}

fn whole_word_matches_anywhere(content: &str, term: &str, case_sensitive: bool) -> bool {
    !whole_word_positions(content, term, case_sensitive).is_empty()
}

fn exact_search(content: &str, content_chars: &[char], term: &str, term_chars: &[char], whole_word: bool, case_sensitive: bool) -> Vec<usize> {
    if whole_word {
        whole_word_positions(content, term, case_sensitive)
    } else {
        exact_positions(content_chars, term_chars, case_sensitive)
    }
}

/// Single-row rolling-buffer Levenshtein distance, bailing out early once the
/// length gap alone exceeds `max_distance` or once every value in a row
/// exceeds it (the edit distance can only grow from there).
fn levenshtein(a: &[char], b: &[char], max_distance: usize) -> Option<usize> {
    let (la, lb) = (a.len(), b.len());
    if la.abs_diff(lb) > max_distance {
        return None;
    }
    if la == 0 {
        return Some(lb);
    }
    if lb == 0 {
        return Some(la);
    }

    let mut prev: Vec<usize> = (0..=lb).collect();
    let mut curr = vec![0usize; lb + 1];
    for i in 1..=la {
        curr[0] = i;
        let mut row_min = curr[0];
        for j in 1..=lb {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            row_min = row_min.min(curr[j]);
        }
        if row_min > max_distance {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    Some(prev[lb])
}

/// Edit-distance envelope for the bounded-content fuzzy pass:
/// `clamp(floor(2 * term_len), 10, 100)`.
fn edit_distance_envelope(term_len: usize) -> usize {
    (2 * term_len).clamp(10, 100)
}

/// Minimum matched-character length: `max(2, floor(0.6 * term_len))`.
fn min_matched_length(term_len: usize) -> usize {
    ((term_len as f64 * 0.6).floor() as usize).max(2)
}

/// Slide a window across `content_chars` looking for a substring within the
/// edit-distance envelope of `term_chars`. Returns on the first acceptable
/// candidate (`score < `[`FUZZY_ACCEPT_SCORE`]).
fn fuzzy_scan(content_chars: &[char], term_chars: &[char], case_sensitive: bool) -> Option<(usize, f64, usize)> {
    let term_len = term_chars.len();
    let content_len = content_chars.len();
    if term_len == 0 || content_len == 0 {
        return None;
    }

    let envelope = edit_distance_envelope(term_len);
    let min_len = min_matched_length(term_len).min(content_len);
    // Bound the window-length search space around the term's own length
    // rather than the full envelope, keeping the scan close to linear.
    let slop = envelope.min(4);
    let max_len = (term_len + slop).min(content_len).max(min_len);

    let norm_term = case_fold(term_chars, case_sensitive);

    for start in 0..content_len {
        let widest = (content_len - start).min(max_len);
        if widest < min_len {
            continue;
        }
        for w in min_len..=widest {
            let window = &content_chars[start..start + w];
            let norm_window = case_fold(window, case_sensitive);
            if let Some(distance) = levenshtein(&norm_window, &norm_term, envelope) {
                let score = distance as f64 / term_len.max(w) as f64;
                if score < FUZZY_ACCEPT_SCORE {
                    return Some((start, score, w));
                }
            }
        }
    }
    None
}

struct Word {
    start: usize,
    chars: Vec<char>,
}

fn split_words(chars: &[char]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        words.push(Word {
            start,
            chars: chars[start..i].to_vec(),
        });
    }
    words
}

/// Chunked, word-level fallback used once content exceeds the full-scan
/// threshold: splits into overlapping windows, then into whitespace-
/// delimited words, filters by length and a first/last character check,
/// and accepts the first word within `floor(0.3 * term_len)` edits.
fn chunked_fuzzy_scan(
    content_chars: &[char],
    term_chars: &[char],
    chunk_size: usize,
    chunk_overlap: usize,
    case_sensitive: bool,
) -> Option<(usize, f64, usize)> {
    let term_len = term_chars.len();
    if term_len == 0 || content_chars.is_empty() {
        return None;
    }
    let max_edit = (term_len as f64 * 0.3).floor() as usize;
    let min_word_len = (term_len as f64 * 0.7).floor() as usize;
    let max_word_len = (term_len as f64 * 1.3).ceil() as usize;
    let norm_term = case_fold(term_chars, case_sensitive);
    let first = norm_term.first().copied();
    let last = norm_term.last().copied();

    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut chunk_start = 0usize;
    loop {
        if chunk_start >= content_chars.len() {
            break;
        }
        let chunk_end = (chunk_start + chunk_size).min(content_chars.len());
        let chunk = &content_chars[chunk_start..chunk_end];

        for word in split_words(chunk) {
            if word.chars.len() < min_word_len || word.chars.len() > max_word_len {
                continue;
            }
            let norm_word = case_fold(&word.chars, case_sensitive);
            let edge_matches = norm_word.first().copied() == first || norm_word.last().copied() == last;
            if !edge_matches {
                continue;
            }
            if let Some(distance) = levenshtein(&norm_word, &norm_term, max_edit) {
                if distance <= max_edit {
                    let score = distance as f64 / term_len.max(word.chars.len()) as f64;
                    return Some((chunk_start + word.start, score, word.chars.len()));
                }
            }
        }

        if chunk_end >= content_chars.len() {
            break;
        }
        chunk_start += step;
    }
    None
}

/// Report whether `term` approximately occurs in `content`.
///
/// Degrades to exact substring search when `term` is shorter than
/// `min_term_length`; otherwise tries an exact short-circuit first, then
/// falls back to a bounded-content fuzzy scan or, for content past
/// `max_full_content_size`, a chunked word-level scan.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn search(
    content: &str,
    term: &str,
    options: FuzzyOptions,
    min_term_length: usize,
    max_full_content_size: usize,
    chunk_size: usize,
    chunk_overlap: usize,
) -> FuzzyResult {
    let started = Instant::now();
    let elapsed_ms = |started: Instant| started.elapsed().as_millis() as u64;

    if term.is_empty() || content.is_empty() {
        return FuzzyResult::no_match(elapsed_ms(started));
    }

    let content_chars: Vec<char> = content.chars().collect();
    let term_chars: Vec<char> = term.chars().collect();

    if term_chars.len() < min_term_length {
        let positions = exact_search(content, &content_chars, term, &term_chars, options.whole_word, options.case_sensitive);
        return if positions.is_empty() {
            FuzzyResult::no_match(elapsed_ms(started))
        } else {
            FuzzyResult {
                is_match: true,
                score: options.include_score.then_some(0.0),
                match_positions: options.include_score.then_some(positions),
                processing_time_ms: elapsed_ms(started),
            }
        };
    }

    let exact = exact_search(content, &content_chars, term, &term_chars, options.whole_word, options.case_sensitive);
    if !exact.is_empty() {
        return FuzzyResult {
            is_match: true,
            score: options.include_score.then_some(0.0),
            match_positions: options.include_score.then_some(exact),
            processing_time_ms: elapsed_ms(started),
        };
    }

    let candidate = if content_chars.len() <= max_full_content_size {
        fuzzy_scan(&content_chars, &term_chars, options.case_sensitive)
    } else {
        chunked_fuzzy_scan(&content_chars, &term_chars, chunk_size, chunk_overlap, options.case_sensitive)
    };

    let Some((start, score, _width)) = candidate else {
        return FuzzyResult::no_match(elapsed_ms(started));
    };

    if options.whole_word && !whole_word_matches_anywhere(content, term, options.case_sensitive) {
        return FuzzyResult::no_match(elapsed_ms(started));
    }

    FuzzyResult {
        is_match: true,
        score: options.include_score.then_some(score),
        match_positions: options.include_score.then_some(vec![start]),
        processing_time_ms: elapsed_ms(started),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN_TERM_LENGTH: usize = 3;
    const MAX_FULL_CONTENT_SIZE: usize = 2 * 1024 * 1024;
    const CHUNK_SIZE: usize = 64 * 1024;
    const CHUNK_OVERLAP: usize = 1024;

    fn search_defaults(content: &str, term: &str, options: FuzzyOptions) -> FuzzyResult {
        search(content, term, options, MIN_TERM_LENGTH, MAX_FULL_CONTENT_SIZE, CHUNK_SIZE, CHUNK_OVERLAP)
    }

    #[test]
    fn empty_term_or_content_never_matches() {
        assert!(!search_defaults("", "term", FuzzyOptions::default()).is_match);
        assert!(!search_defaults("content", "", FuzzyOptions::default()).is_match);
    }

    #[test]
    fn exact_match_scores_zero_and_reports_all_positions() {
        let result = search_defaults("database user database user", "database", FuzzyOptions::default());
        assert!(result.is_match);
        assert_eq!(result.score, Some(0.0));
        assert_eq!(result.match_positions, Some(vec![0, 14]));
    }

    #[test]
    fn whole_word_restricts_to_boundary_aligned_occurrences() {
        let result = search_defaults(
            "foobar foo bar",
            "foo",
            FuzzyOptions {
                whole_word: true,
                ..Default::default()
            },
        );
        assert!(result.is_match);
        assert_eq!(result.match_positions, Some(vec![7]));
    }

    #[test]
    fn short_term_degrades_to_exact_search() {
        let result = search_defaults("ab cd ab", "ab", FuzzyOptions::default());
        assert!(result.is_match);
        assert_eq!(result.match_positions, Some(vec![0, 6]));
    }

    #[test]
    fn fuzzy_pass_accepts_small_edit_distance_deviation() {
        // "alpa" is not a substring of "alpha" (the length-4 substrings are
        // "alph" and "lpha"), so this only matches through the fuzzy pass.
        let result = search_defaults(
            "alpha beta gamma delta epsilon",
            "alpa",
            FuzzyOptions::default(),
        );
        assert!(result.is_match);
        assert!(result.score.unwrap() < FUZZY_ACCEPT_SCORE);
    }

    #[test]
    fn unrelated_term_does_not_match() {
        let result = search_defaults("alpha beta gamma delta epsilon", "zzzzzzzz", FuzzyOptions::default());
        assert!(!result.is_match);
    }

    #[test]
    fn chunked_path_finds_needle_far_into_large_content() {
        let mut content = "a".repeat(200_000);
        content.push_str(" needle ");
        content.push_str(&"b".repeat(200_000));
        let result = search(
            &content,
            "needle",
            FuzzyOptions::default(),
            MIN_TERM_LENGTH,
            1_000, // force the chunked path for this test
            CHUNK_SIZE,
            CHUNK_OVERLAP,
        );
        assert!(result.is_match);
    }

    #[test]
    fn levenshtein_matches_known_distances() {
        let a: Vec<char> = "kitten".chars().collect();
        let b: Vec<char> = "sitting".chars().collect();
        assert_eq!(levenshtein(&a, &b, 10), Some(3));
        assert_eq!(levenshtein(&a, &a, 10), Some(0));
    }

    #[test]
    fn levenshtein_bails_out_past_max_distance() {
        let a: Vec<char> = "abc".chars().collect();
        let b: Vec<char> = "xyz".chars().collect();
        assert_eq!(levenshtein(&a, &b, 1), None);
    }
}
