//! Content fingerprinting.
//!
//! Short blobs get a cheap rolling hash; long blobs get a cryptographic
//! digest over three fixed-size slices so fingerprinting stays O(1) in the
//! content length regardless of how large the file is.

use sha2::{Digest, Sha256};

const SMALL_CONTENT_THRESHOLD: usize = 1_000;
const SLICE_LEN: usize = 500;

/// Deterministic short identifier for a content blob, used as a cache key
/// throughout the kernel.
#[must_use]
pub fn fingerprint(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() < SMALL_CONTENT_THRESHOLD {
        rolling_hash(&chars)
    } else {
        digest_hash(&chars)
    }
}

/// 32-bit polynomial rolling hash (`h <- 31*h + c`), rendered in base-36.
fn rolling_hash(chars: &[char]) -> String {
    let mut h: u32 = 0;
    for &c in chars {
        h = h.wrapping_mul(31).wrapping_add(c as u32);
    }
    to_base36(h)
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).expect("base36 alphabet is ASCII")
}

/// Cryptographic digest over three 500-character slices (start, middle, end)
/// truncated to 16 hex characters.
fn digest_hash(chars: &[char]) -> String {
    let len = chars.len();
    let start: String = chars[..SLICE_LEN.min(len)].iter().collect();
    let mid_start = len / 2 - SLICE_LEN.min(len) / 2;
    let mid_end = (mid_start + SLICE_LEN).min(len);
    let middle: String = chars[mid_start..mid_end].iter().collect();
    let end_start = len.saturating_sub(SLICE_LEN);
    let end: String = chars[end_start..].iter().collect();

    let mut hasher = Sha256::new();
    hasher.update(start.as_bytes());
    hasher.update(middle.as_bytes());
    hasher.update(end.as_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(16);
    for byte in &digest[..8] {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
