/// Content digest of an image file.
///
/// Both values are derived from the SHA-256 of the raw file bytes, base64
/// encoded and then made safe for URLs and file names (see
/// [`normalize_base64`](crate::normalize_base64)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// Full normalized digest.
    pub full: String,
    /// First [`FINGERPRINT_LEN`](crate::FINGERPRINT_LEN) characters of
    /// [`full`](Self::full).
    pub short: String,
}

/// Low-resolution placeholder computed from decoded pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// Binary thumbhash, standard base64.
    pub data_base64: String,
    /// PNG rendered back from the thumbhash, as a `data:` URI.
    pub data_url: String,
    /// Width of the downscaled image the hash was computed from.
    pub width: u32,
    /// Height of the downscaled image the hash was computed from.
    pub height: u32,
    pub original_width: u32,
    pub original_height: u32,
}

/// Everything derived from one image's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub digest: Digest,
    pub thumbnail: Thumbnail,
}
