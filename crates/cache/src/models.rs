use crate::location::Location;
use serde::{Deserialize, Serialize};
use thumbmap_extract::Extracted;
use thumbmap_storage::FileInfo;

/// One entry of the cache map, as consumed by the front-end.
///
/// Field names are serialized in camelCase to match what the placeholder
/// component reads at runtime. `assetMtimeMs`/`assetSize` are optional when
/// reading so that maps written before change detection existed still load;
/// such entries simply never count as fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub data_base64: String,
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    pub original_width: u32,
    pub original_height: u32,
    /// The key this record is stored under (one of the path variants).
    pub asset_file_name: String,
    pub asset_full_file_name: String,
    pub asset_full_hash: String,
    pub asset_file_hash: String,
    pub asset_url: String,
    pub asset_url_with_base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_mtime_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_size: Option<u64>,
}

impl Record {
    /// Build a record from freshly extracted image data.
    pub fn generated(extracted: Extracted, location: Location, file: &FileInfo) -> Self {
        let Extracted { digest, thumbnail } = extracted;
        Self {
            data_base64: thumbnail.data_base64,
            data_url: thumbnail.data_url,
            width: thumbnail.width,
            height: thumbnail.height,
            original_width: thumbnail.original_width,
            original_height: thumbnail.original_height,
            asset_file_name: location.key,
            asset_full_file_name: location.full_file_name,
            asset_full_hash: digest.full,
            asset_file_hash: digest.short,
            asset_url: location.url,
            asset_url_with_base: location.url_with_base,
            asset_mtime_ms: Some(file.modified_ms()),
            asset_size: Some(file.size),
        }
    }

    /// Carry a previous record forward: hash and dimension data are kept,
    /// everything derived from the path or the stat is replaced.
    pub fn refreshed(self, location: Location, file: &FileInfo) -> Self {
        Self {
            asset_file_name: location.key,
            asset_full_file_name: location.full_file_name,
            asset_url: location.url,
            asset_url_with_base: location.url_with_base,
            asset_mtime_ms: Some(file.modified_ms()),
            asset_size: Some(file.size),
            ..self
        }
    }

    /// `true` if the recorded modification time and size both match `file`
    /// exactly.
    ///
    /// This is the only validity signal by default. A file rewritten with the
    /// same size and a preserved timestamp is (wrongly) considered fresh.
    pub fn is_fresh_for(&self, file: &FileInfo) -> bool {
        self.asset_mtime_ms == Some(file.modified_ms()) && self.asset_size == Some(file.size)
    }

    /// `true` if `other` carries the same image data (everything except the
    /// path-derived fields and the stat pair).
    pub fn same_image_as(&self, other: &Self) -> bool {
        self.data_base64 == other.data_base64
            && self.data_url == other.data_url
            && (self.width, self.height) == (other.width, other.height)
            && (self.original_width, self.original_height) == (other.original_width, other.original_height)
            && self.asset_full_hash == other.asset_full_hash
            && self.asset_file_hash == other.asset_file_hash
    }
}
