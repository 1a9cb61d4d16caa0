use crate::consts::FINGERPRINT_LEN;
use crate::models::Digest;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest as _, Sha256};

/// Replace the base64 characters that are awkward in URLs and file names:
/// `/` becomes `_`, `+` and `=` both become `-`.
///
/// ```
/// use thumbmap_extract::normalize_base64;
/// assert_eq!(normalize_base64("ab/c+d=="), "ab_c-d--");
/// ```
pub fn normalize_base64(base64: &str) -> String {
    base64.replace('/', "_").replace('+', "-").replace('=', "-")
}

impl Digest {
    /// Compute the content digest of raw file bytes.
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        let full = normalize_base64(&STANDARD.encode(Sha256::digest(bytes.as_ref())));
        let short = full.chars().take(FINGERPRINT_LEN).collect();
        Self { full, short }
    }
}
