//! Fingerprint helpers: SHA-256 over ordered parts, rendered as lowercase hex.

use sha2::{Digest, Sha256};

/// Length in hex characters of every fingerprint produced here.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Hash the parts in order (concatenated as bytes, SHA-256) and return lowercase hex.
pub fn fingerprint(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p);
    }
    hex::encode(hasher.finalize())
}

/// Fingerprint of a single textual value.
pub fn fingerprint_str(text: &str) -> String {
    fingerprint(&[text.as_bytes()])
}

/// True if `candidate` starts with `difficulty` zero hex characters.
pub fn has_zero_prefix(candidate: &str, difficulty: usize) -> bool {
    candidate.len() >= difficulty && candidate.bytes().take(difficulty).all(|b| b == b'0')
}
