/// Longest edge, in pixels, of the image fed to the thumbhash encoder. The
/// encoder itself refuses anything larger.
pub const MAX_EDGE: u32 = 100;

/// Length of the short fingerprint taken from the front of the normalized
/// content digest.
pub const FINGERPRINT_LEN: usize = 10;

pub(crate) const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";
