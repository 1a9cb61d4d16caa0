//! Default values for every configuration option, kept in one place.

pub const DEFAULT_ROOT: &str = ".";
pub const DEFAULT_CACHE_DIR: &str = ".vitepress/cache";
pub const DEFAULT_ASSETS_DIR: &str = "assets";
pub const DEFAULT_BASE: &str = "/";
pub const DEFAULT_CONTENT_ROOTS: &[&str] = &["public", "笔记", "视图", ".vitepress"];
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
pub const DEFAULT_IGNORE: &[&str] = &["node_modules", ".git", ".vitepress/dist", ".vitepress/cache"];
pub const DEFAULT_CONCURRENCY: usize = 8;
/// Seconds a freshly written map is trusted without scanning. Zero disables
/// the window.
pub const DEFAULT_FRESH_FOR: u64 = 0;

/// Environment variable prefix for overrides, e.g. `THUMBMAP_BASE=/docs/`.
pub const ENV_PREFIX: &str = "THUMBMAP_";
/// Build-level toggle; `0` or `false` turns hashing off.
pub const TOGGLE_ENV: &str = "VITEPRESS_THUMB_HASH";
/// File name looked up in the user config directory.
pub const CONFIG_FILE_NAME: &str = "thumbmap.toml";
