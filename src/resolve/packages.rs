// src/resolve/packages.rs

//! Package-URI resolution over a JSON package manifest.
//!
//! The manifest maps package names to their root directories and direct
//! dependencies, e.g.:
//!
//! ```json
//! {
//!   "root": "app",
//!   "packages": [
//!     { "name": "app", "root": "/work/app", "deps": ["util"] },
//!     { "name": "util", "root": "/work/util" }
//!   ]
//! }
//! ```

use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::errors::{ReloadError, Result};
use crate::fs::FileSystem;

pub const PACKAGE_SCHEME: &str = "package";

/// Resolves `package:` URIs and package dependency sets.
pub trait PackageResolver: Send + Sync {
    /// Resolve `package:<name>/<rest>` into a filesystem path.
    fn resolve_uri(&self, uri: &str) -> Result<PathBuf>;

    /// Root directories of the root package's transitive dependencies.
    fn transitive_dependency_roots(&self) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageManifest {
    pub root: String,
    pub packages: Vec<PackageEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageEntry {
    pub name: String,
    pub root: PathBuf,
    #[serde(default)]
    pub deps: Vec<String>,
}

/// [`PackageResolver`] backed by a JSON manifest file.
///
/// The manifest is re-read on each resolution; these are rare, caller-driven
/// operations and a stale cache would be worse than the extra read.
pub struct ManifestPackageResolver {
    fs: Arc<dyn FileSystem>,
    manifest_path: Option<PathBuf>,
}

impl std::fmt::Debug for ManifestPackageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestPackageResolver")
            .field("manifest_path", &self.manifest_path)
            .finish_non_exhaustive()
    }
}

impl ManifestPackageResolver {
    pub fn new(fs: Arc<dyn FileSystem>, manifest_path: Option<PathBuf>) -> Self {
        Self { fs, manifest_path }
    }

    fn load(&self, wanted: &str) -> Result<PackageManifest> {
        let Some(path) = &self.manifest_path else {
            // No manifest configured means nothing can resolve.
            return Err(ReloadError::PackageNotFound(wanted.to_string()));
        };
        let contents = self
            .fs
            .read_to_string(path)
            .map_err(|_| ReloadError::PackageNotFound(wanted.to_string()))?;
        let manifest: PackageManifest = serde_json::from_str(&contents)
            .map_err(|err| ReloadError::Config(format!("invalid package manifest: {err}")))?;
        Ok(manifest)
    }
}

impl PackageResolver for ManifestPackageResolver {
    fn resolve_uri(&self, uri: &str) -> Result<PathBuf> {
        let parsed =
            Url::parse(uri).map_err(|_| ReloadError::NotAPackageUri(uri.to_string()))?;
        if parsed.scheme() != PACKAGE_SCHEME {
            return Err(ReloadError::NotAPackageUri(uri.to_string()));
        }

        let raw_path = parsed.path();
        let (name, rest) = match raw_path.split_once('/') {
            Some((name, rest)) => (name, Some(rest)),
            None => (raw_path, None),
        };
        if name.is_empty() {
            return Err(ReloadError::NotAPackageUri(uri.to_string()));
        }

        let manifest = self.load(name)?;
        let entry = manifest
            .packages
            .iter()
            .find(|package| package.name == name)
            .ok_or_else(|| ReloadError::PackageNotFound(name.to_string()))?;

        Ok(match rest {
            Some(rest) => entry.root.join(rest),
            None => entry.root.clone(),
        })
    }

    fn transitive_dependency_roots(&self) -> Result<Vec<PathBuf>> {
        let manifest = self.load("<root>")?;

        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(&manifest.root);
        visited.insert(manifest.root.clone());

        let mut roots = Vec::new();
        while let Some(name) = queue.pop_front() {
            let Some(entry) = manifest.packages.iter().find(|p| p.name == name) else {
                warn!(package = %name, "package named in manifest but not defined");
                continue;
            };
            // The root package itself is not one of its dependencies.
            if entry.name != manifest.root {
                roots.push(entry.root.clone());
            }
            for dep in &entry.deps {
                if visited.insert(dep.clone()) {
                    queue.push_back(dep);
                }
            }
        }

        roots.sort();
        Ok(roots)
    }
}
