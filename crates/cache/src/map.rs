use crate::error::{ErrorKind, Result};
use crate::models::Record;
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every key a record is published under: the canonical key, `/`-prefixed,
/// with spaces escaped as `%20`, and both at once. Documents reference images
/// in all of these forms.
///
/// The records differ only in `assetFileName`. For keys without spaces the
/// escaped variants are identical to the raw ones.
///
/// ```
/// use thumbmap_cache::{Record, derive_variants};
/// # let record: Record = serde_json::from_str(r#"{
/// #     "dataBase64": "", "dataUrl": "", "width": 1, "height": 1,
/// #     "originalWidth": 1, "originalHeight": 1, "assetFileName": "public/a b.png",
/// #     "assetFullFileName": "/srv/docs/public/a b.png", "assetFullHash": "", "assetFileHash": "",
/// #     "assetUrl": "assets/public/a b.png", "assetUrlWithBase": "/assets/public/a b.png"
/// # }"#).unwrap();
/// let variants = derive_variants("public/a b.png", &record);
/// let keys: Vec<_> = variants.iter().map(|(k, _)| k.as_str()).collect();
/// assert_eq!(keys, ["public/a b.png", "/public/a b.png", "public/a%20b.png", "/public/a%20b.png"]);
/// assert_eq!(variants[2].1.asset_file_name, "public/a%20b.png");
/// ```
pub fn derive_variants(key: &str, record: &Record) -> [(String, Record); 4] {
    let escaped = key.replace(' ', "%20");
    [key.to_string(), format!("/{key}"), escaped.clone(), format!("/{escaped}")].map(|variant| {
        let record = Record { asset_file_name: variant.clone(), ..record.clone() };
        (variant, record)
    })
}

/// The persisted lookup map: path variant → [`Record`].
///
/// Backed by a [`BTreeMap`] so serialization is ordered and two builds over
/// identical inputs produce byte-identical files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheMap(BTreeMap<String, Record>);

impl CacheMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the final map from canonical entries, expanding each into its
    /// path variants.
    pub fn assemble(entries: impl IntoIterator<Item = (String, Record)>) -> Self {
        let mut map = BTreeMap::new();
        for (key, record) in entries {
            map.extend(derive_variants(&key, &record));
        }
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.0.get(key)
    }

    /// Find the record for a reference as written in a document. Exact
    /// variant keys are tried first, then the reference with any leading
    /// `./` removed.
    pub fn lookup(&self, reference: &str) -> Option<&Record> {
        self.get(reference).or_else(|| self.get(reference.trim_start_matches("./")))
    }

    /// Number of keys (not images: each image has up to four keys).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Record)> {
        self.0.iter()
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).or_raise(|| ErrorKind::Serialize)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).or_raise(|| ErrorKind::InvalidData)
    }
}
