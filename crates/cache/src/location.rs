//! Where an asset lives, from the point of view of the built site.

use std::path::{Path, PathBuf};

/// Join URL path fragments the way `path.posix.join` followed by a
/// normalization would: empty and `.` segments vanish, `..` drops the
/// previous segment, and the result is absolute only if the first non-empty
/// fragment was.
///
/// ```
/// use thumbmap_cache::join_url;
/// assert_eq!(join_url(&["/docs/", "assets", "public/a.png"]), "/docs/assets/public/a.png");
/// assert_eq!(join_url(&["assets", "./img//a.png"]), "assets/img/a.png");
/// ```
pub fn join_url<S: AsRef<str>>(parts: &[S]) -> String {
    let absolute = parts.iter().map(AsRef::as_ref).find(|p| !p.is_empty()).is_some_and(|p| p.starts_with('/'));
    let mut segments: Vec<&str> = Vec::new();
    for segment in parts.iter().flat_map(|p| p.as_ref().split('/')) {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            s => segments.push(s),
        }
    }
    let joined = segments.join("/");
    if absolute { format!("/{joined}") } else { joined }
}

/// Site-level settings that turn a canonical key into URLs.
///
/// None of these affect the hash of an image, which is why reused records
/// always get their location refreshed: the base path or output directory
/// can change between builds while the image stays the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Absolute site source root.
    pub root: PathBuf,
    /// Directory (relative to the output root) assets are emitted to.
    pub assets_dir: String,
    /// Public base path the site is served under, e.g. `/docs/`.
    pub base: String,
}
impl Site {
    pub fn new(root: impl Into<PathBuf>, assets_dir: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            assets_dir: assets_dir.into(),
            base: base.into(),
        }
    }

    pub fn locate(&self, key: impl Into<String>) -> Location {
        let key = key.into();
        let full_file_name = format!("{}/{}", normalize_separators(&self.root).trim_end_matches('/'), key);
        let url = join_url(&[self.assets_dir.as_str(), key.as_str()]);
        let mut url_with_base = join_url(&[self.base.as_str(), self.assets_dir.as_str(), key.as_str()]);
        if !url_with_base.starts_with('/') {
            url_with_base.insert(0, '/');
        }
        Location { key, full_file_name, url, url_with_base }
    }
}

/// Path-derived fields of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Canonical key (root-relative, `/`-separated).
    pub key: String,
    /// Absolute source path, `/`-separated.
    pub full_file_name: String,
    pub url: String,
    /// [`url`](Self::url) under the site base; always starts with `/`.
    pub url_with_base: String,
}

fn normalize_separators(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["assets", "public/a.png"], "assets/public/a.png")]
    #[case(&["/", "assets", "public/a.png"], "/assets/public/a.png")]
    #[case(&["/docs/", "assets", "public/a.png"], "/docs/assets/public/a.png")]
    #[case(&["docs", "/assets/", "/x.png"], "docs/assets/x.png")]
    #[case(&["", "", "a.png"], "a.png")]
    #[case(&["", "/a", "b.png"], "/a/b.png")]
    #[case(&["/a/b", "../c.png"], "/a/c.png")]
    #[case(&["/"], "/")]
    fn test_join_url(#[case] parts: &[&str], #[case] expected: &str) {
        assert_eq!(join_url(parts), expected);
    }

    #[test]
    fn test_locate_with_base() {
        let site = Site::new("/srv/docs", "assets", "/docs/");
        let location = site.locate("public/a.png");
        assert_eq!(location.key, "public/a.png");
        assert_eq!(location.full_file_name, "/srv/docs/public/a.png");
        assert_eq!(location.url, "assets/public/a.png");
        assert_eq!(location.url_with_base, "/docs/assets/public/a.png");
        assert_eq!(location.url_with_base.matches("docs").count(), 1);
    }

    #[rstest]
    #[case("/", "/assets/public/a.png")]
    #[case("", "/assets/public/a.png")]
    #[case("docs", "/docs/assets/public/a.png")]
    #[case("/docs", "/docs/assets/public/a.png")]
    fn test_url_with_base_is_rooted(#[case] base: &str, #[case] expected: &str) {
        let site = Site::new("/srv/docs/", "assets", base);
        assert_eq!(site.locate("public/a.png").url_with_base, expected);
    }

    #[test]
    fn test_locate_keeps_spaces() {
        let site = Site::new("/srv/docs", "assets", "/");
        let location = site.locate("笔记/my photo.png");
        assert_eq!(location.url, "assets/笔记/my photo.png");
        assert_eq!(location.full_file_name, "/srv/docs/笔记/my photo.png");
    }
}
