//! Word-boundary index.
//!
//! Produces the ordered list of `\b\w+\b` word spans for a content blob and
//! resolves a character offset back to the word index that "owns" it,
//! including offsets that land in trailing whitespace — needed so the NEAR
//! evaluator has a well-defined word distance even when a match's start
//! position sits on punctuation.

use regex::Regex;
use std::sync::OnceLock;

/// One word occurrence: `start`/`end` are inclusive character offsets into
/// the content string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// The matched word text.
    pub word: String,
    /// Inclusive start offset (character index, not byte index).
    pub start: usize,
    /// Inclusive end offset (character index, not byte index).
    pub end: usize,
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w+").expect("static word pattern is valid"))
}

/// Sentinel returned by [`word_index_of`] when no span can be resolved.
pub const NONE: Option<usize> = None;

/// Compute every word span in `content`, in ascending order.
///
/// `start` is strictly increasing across the returned list, `start <= end`
/// for every span, and spans never overlap.
#[must_use]
pub fn boundaries(content: &str) -> Vec<Span> {
    let byte_to_char = byte_to_char_offsets(content);
    let char_count = byte_to_char.len().saturating_sub(1);
    let mut spans = Vec::new();

    for m in word_pattern().find_iter(content) {
        let start = byte_to_char[m.start()];
        // `m.end()` is an exclusive byte offset one past the match; map it
        // to the char index one past the match, then step back one char for
        // the inclusive `end` this API reports.
        let end_exclusive_char = *byte_to_char.get(m.end()).unwrap_or(&char_count);
        let end = end_exclusive_char.saturating_sub(1);
        spans.push(Span {
            word: m.as_str().to_string(),
            start,
            end,
        });
    }
    spans
}

/// Map every byte offset that can appear as a `regex` match boundary in
/// `content` to its character index, so matches reported in byte offsets
/// (the `regex` crate's native unit) can be translated to the character
/// offsets this crate works in everywhere else. The returned slice's last
/// entry corresponds to `content.len()` (one past the final character).
pub(crate) fn byte_to_char_offsets(content: &str) -> Vec<usize> {
    let mut byte_to_char = Vec::with_capacity(content.len() + 1);
    let mut char_count = 0usize;
    for (byte_idx, _) in content.char_indices() {
        while byte_to_char.len() <= byte_idx {
            byte_to_char.push(char_count);
        }
        char_count += 1;
    }
    byte_to_char.push(char_count);
    byte_to_char
}

/// Resolve a character offset to the index of the span that owns it: first
/// by containment, then by anchoring across a whitespace-only gap to the
/// preceding word, falling back to `None` if neither resolves it.
#[must_use]
pub fn word_index_of(char_offset: usize, content: &str) -> Option<usize> {
    let spans = boundaries(content);
    word_index_of_in(char_offset, content, &spans)
}

/// Same as [`word_index_of`] but reuses an already-computed span list, to
/// avoid recomputation when callers (like the NEAR evaluator) already have
/// it cached.
#[must_use]
pub fn word_index_of_in(char_offset: usize, content: &str, spans: &[Span]) -> Option<usize> {
    // Step 1: offset falls within an existing span.
    if let Some((idx, _)) = spans
        .iter()
        .enumerate()
        .find(|(_, s)| char_offset >= s.start && char_offset <= s.end)
    {
        return Some(idx);
    }

    // Step 2: anchor to the preceding word if everything between it and the
    // offset is whitespace.
    let chars: Vec<char> = content.chars().collect();
    let mut best: Option<usize> = None;
    for (idx, span) in spans.iter().enumerate() {
        if span.end >= char_offset {
            continue;
        }
        let gap_start = span.end + 1;
        let gap_end = (char_offset + 1).min(chars.len());
        if gap_start > gap_end {
            continue;
        }
        let only_whitespace = chars[gap_start..gap_end].iter().all(|c| c.is_whitespace());
        if only_whitespace {
            best = Some(idx);
        }
    }
    if best.is_some() {
        return best;
    }

    // Step 3: unresolved.
    None
}
