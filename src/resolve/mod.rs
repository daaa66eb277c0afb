// src/resolve/mod.rs

//! Path resolution helpers: glob expansion and URI-to-path conversion.

pub mod packages;

use std::path::{Path, PathBuf};

use globset::Glob;
use tracing::debug;
use url::Url;

use crate::errors::{ReloadError, Result};
use crate::fs::FileSystem;

pub use packages::{ManifestPackageResolver, PackageResolver};

/// Collect all entries under `root` matching `pattern`.
///
/// The pattern is evaluated against paths relative to `root`, with forward
/// slashes. Both files and directories can match. Unreadable directories are
/// skipped.
pub fn expand_glob(fs: &dyn FileSystem, root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let glob = Glob::new(pattern)
        .map_err(|err| ReloadError::Config(format!("invalid glob pattern '{pattern}': {err}")))?;
    let matcher = glob.compile_matcher();

    let mut matches = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = ?dir, error = %err, "skipping unreadable directory");
                continue;
            }
        };
        for path in entries {
            if fs.is_dir(&path) {
                stack.push(path.clone());
            }
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if matcher.is_match(&rel_str) {
                matches.push(path);
            }
        }
    }

    matches.sort();
    Ok(matches)
}

/// Convert a `file:` URI into a filesystem path.
pub fn file_uri_to_path(uri: &str) -> Result<PathBuf> {
    let parsed = Url::parse(uri).map_err(|err| ReloadError::InvalidUri {
        uri: uri.to_string(),
        reason: err.to_string(),
    })?;
    parsed.to_file_path().map_err(|_| ReloadError::InvalidUri {
        uri: uri.to_string(),
        reason: "not a file URI".to_string(),
    })
}
