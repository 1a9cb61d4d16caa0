//! Layered configuration for a thumbmap build.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults (see [`defaults`]).
//! 2. A config file: the one passed explicitly, otherwise `thumbmap.toml` in
//!    the user config directory if it exists. TOML, YAML and JSON are
//!    accepted, chosen by extension.
//! 3. `THUMBMAP_*` environment variables.
//! 4. `VITEPRESS_THUMB_HASH`, which only ever switches hashing on or off.
//!
//! Command-line overrides are applied by the caller on top of the result.

pub mod defaults;
pub mod error;

use crate::defaults::*;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thumbmap_cache::FreshnessPolicy;

/// Everything a build needs to know that isn't discovered from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site source root. Relative paths resolve against the working directory.
    pub root: PathBuf,
    /// Cache directory holding the map. Relative paths resolve against `root`.
    pub cache_dir: PathBuf,
    pub assets_dir: String,
    pub base: String,
    /// Directories under `root` that are searched for images.
    pub content_roots: Vec<String>,
    /// Image extensions, without the dot; matched case-insensitively.
    pub extensions: Vec<String>,
    /// Path patterns excluded from discovery.
    pub ignore: Vec<String>,
    pub enabled: bool,
    pub policy: FreshnessPolicy,
    /// Images hashed at the same time.
    pub concurrency: usize,
    /// Seconds a recently written map is trusted as-is.
    pub fresh_for: u64,
}

impl Default for Config {
    fn default() -> Self {
        let owned = |values: &[&str]| -> Vec<String> { values.iter().map(ToString::to_string).collect() };
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            assets_dir: DEFAULT_ASSETS_DIR.to_string(),
            base: DEFAULT_BASE.to_string(),
            content_roots: owned(DEFAULT_CONTENT_ROOTS),
            extensions: owned(DEFAULT_EXTENSIONS),
            ignore: owned(DEFAULT_IGNORE),
            enabled: true,
            policy: FreshnessPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
            fresh_for: DEFAULT_FRESH_FOR,
        }
    }
}

impl Config {
    /// Load from every source and validate.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let figment = Self::figment(file)?.merge(Env::prefixed(ENV_PREFIX));
        let mut config = Self::from_figment(figment)?;
        if let Ok(value) = std::env::var(TOGGLE_ENV) {
            config.enabled = hashing_enabled(Some(&value));
            tracing::debug!(value = %value, enabled = config.enabled, "{TOGGLE_ENV} set");
        }
        Ok(config)
    }

    /// Defaults merged with the config file, without any environment
    /// variables.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let file = match file {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_file().filter(|path| path.is_file()),
        };
        let Some(file) = file else {
            return Ok(figment);
        };
        tracing::debug!(path = %file.display(), "Reading configuration file");
        let extension = file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_raise(|| ErrorKind::UnsupportedFormat(file.clone()))?;
        Ok(match extension.as_str() {
            "toml" => figment.merge(Toml::file(&file)),
            "yaml" | "yml" => figment.merge(Yaml::file(&file)),
            "json" => figment.merge(Json::file(&file)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(file)),
        })
    }

    /// Extract and validate a config from an already assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.content_roots.is_empty() {
            exn::bail!(ErrorKind::Invalid("at least one content root is required".to_string()));
        }
        if self.extensions.is_empty() {
            exn::bail!(ErrorKind::Invalid("at least one image extension is required".to_string()));
        }
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("concurrency must be at least 1".to_string()));
        }
        for content_root in &self.content_roots {
            thumbmap_storage::validate_path(content_root)
                .or_raise(|| ErrorKind::Invalid(format!("content root {content_root:?} escapes the site root")))?;
        }
        Ok(())
    }

    /// Absolute site root, relative to `cwd` if configured relatively.
    pub fn root_in(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.root)
    }

    /// Absolute cache directory for a resolved site `root`.
    pub fn cache_dir_in(&self, root: &Path) -> PathBuf {
        root.join(&self.cache_dir)
    }
}

/// Interpret the value of the build toggle: unset or anything other than
/// `0`/`false` leaves hashing on.
pub fn hashing_enabled(value: Option<&str>) -> bool {
    !matches!(value, Some("0" | "false"))
}

fn default_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "thumbmap").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
