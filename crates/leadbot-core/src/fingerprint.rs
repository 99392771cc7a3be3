use sha2::{Digest, Sha256};

/// Short, stable, non-reversible tag for an email address or client IP, so
/// logs can correlate events without recording the value itself.
///
/// Input is trimmed and lowercased first; the result is the first 12 hex
/// characters of its SHA-256 digest.
#[must_use]
pub fn fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.trim().to_lowercase().as_bytes());
    digest.iter().take(6).map(|b| format!("{b:02x}")).collect()
}
