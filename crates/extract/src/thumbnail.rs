use crate::consts::{MAX_EDGE, PNG_DATA_URL_PREFIX};
use crate::error::{ErrorKind, Result};
use crate::models::Thumbnail;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use exn::{OptionExt, ResultExt};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

/// Dimensions an image is scaled to before hashing: the longer edge becomes
/// [`MAX_EDGE`], the aspect ratio is kept, and neither side drops below one
/// pixel. Images smaller than [`MAX_EDGE`] are scaled up.
///
/// ```
/// use thumbmap_extract::resized_dimensions;
/// assert_eq!(resized_dimensions(1920, 1080), (100, 56));
/// ```
pub fn resized_dimensions(width: u32, height: u32) -> (u32, u32) {
    let (width, height) = (width.max(1), height.max(1));
    let scale = f64::from(MAX_EDGE) / f64::from(width.max(height));
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, MAX_EDGE);
    (scaled(width), scaled(height))
}

impl Thumbnail {
    /// Decode an image (PNG or JPEG) and compute its thumbhash placeholder.
    pub fn from_image_bytes(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let image = image::load_from_memory(bytes.as_ref()).or_raise(|| ErrorKind::Decode)?;
        let (original_width, original_height) = (image.width(), image.height());
        let (width, height) = resized_dimensions(original_width, original_height);
        let rgba = image.resize_exact(width, height, FilterType::Lanczos3).into_rgba8();
        let (width, height) = rgba.dimensions();
        let hash = thumbhash::rgba_to_thumb_hash(width as usize, height as usize, rgba.as_raw());
        Ok(Self {
            data_base64: STANDARD.encode(&hash),
            data_url: data_url(&hash)?,
            width,
            height,
            original_width,
            original_height,
        })
    }
}

/// Render a binary thumbhash back into pixels and return it as a PNG
/// `data:` URI, ready to drop into an `<img src>`.
pub fn data_url(hash: &[u8]) -> Result<String> {
    let (width, height, rgba) = thumbhash::thumb_hash_to_rgba(hash).map_err(|_| ErrorKind::InvalidHash)?;
    let width = u32::try_from(width).or_raise(|| ErrorKind::InvalidHash)?;
    let height = u32::try_from(height).or_raise(|| ErrorKind::InvalidHash)?;
    let preview = RgbaImage::from_raw(width, height, rgba).ok_or_raise(|| ErrorKind::InvalidHash)?;
    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(preview).write_to(&mut png, ImageFormat::Png).or_raise(|| ErrorKind::Encode)?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png.into_inner())))
}
