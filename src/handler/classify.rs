//! Path classification
//!
//! Maps the part of a URL after the route prefix onto the served directory and
//! decides, with a single metadata lookup, whether it names a file, a directory
//! or nothing at all.

use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    NotFound,
    File,
    Directory,
}

/// Classify `path` by one `stat`-equivalent lookup.
///
/// Every lookup failure (absence, permissions, dangling link) is `NotFound`.
/// Anything that is neither a regular file nor a directory is `NotFound` as well.
pub fn classify(path: &Path) -> PathKind {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => PathKind::File,
        Ok(meta) if meta.is_dir() => PathKind::Directory,
        _ => PathKind::NotFound,
    }
}

/// Strip the route prefix from a URL path.
///
/// Only matches on a segment boundary: with prefix `/fs`, both `/fs` and
/// `/fs/docs` match, `/fsx` does not.
pub fn strip_route_prefix<'a>(url_path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = url_path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// A request path resolved against the served root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Path after the prefix, exactly as it appeared in the URL
    pub raw: String,
    /// Percent-decoded path shown in listings; "/" for an empty request path
    pub display: String,
    pub fs_path: PathBuf,
}

impl Target {
    /// Resolve the prefix-stripped, still percent-encoded `raw` path under `root`.
    ///
    /// Returns `None` when the path does not decode to UTF-8 or tries to climb
    /// out of the root with `..`.
    pub fn resolve(root: &Path, raw: &str) -> Option<Self> {
        let decoded = urlencoding::decode(raw).ok()?;
        let display = if decoded.is_empty() {
            "/".to_string()
        } else {
            decoded.into_owned()
        };

        let relative = Path::new(display.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return None;
        }

        Some(Self {
            raw: raw.to_string(),
            fs_path: root.join(relative),
            display,
        })
    }

    /// Directory paths must end in a separator before they are listed
    pub fn is_canonical_dir(&self) -> bool {
        self.display.ends_with('/')
    }
}
