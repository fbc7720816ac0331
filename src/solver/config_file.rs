// src/solver/config_file.rs

//! Solver configuration file generation
//!
//! The solver reads a `cabal.config` that points every package index at a
//! local cache and pins versions:
//!
//! ```text
//! remote-repo-cache: /tmp/depsolve-XXXX
//! remote-repo: Hackage:http://0.0.0.0/fake-url
//! constraint: aeson==0.8.0.2
//! ```
//!
//! The index URLs are unroutable so the solver can only use the staged
//! local copies.

use crate::error::{Error, Result};
use crate::package::ConstraintSet;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// URL given to every index; never contacted
pub const PLACEHOLDER_URL: &str = "http://0.0.0.0/fake-url";

/// File name of an index tarball inside the cache
pub const INDEX_TARBALL: &str = "00-index.tar";

/// A package index and the local copy of its tarball
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIndex {
    pub name: String,
    pub path: PathBuf,
}

impl PackageIndex {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Copy an index tarball into `<cache_dir>/<name>/00-index.tar`
pub fn stage_index(cache_dir: &Path, index: &PackageIndex) -> io::Result<PathBuf> {
    if index.name.is_empty() || index.name.contains(['/', '\\']) || index.name.starts_with('.') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unusable index name '{}'", index.name),
        ));
    }

    let dst_dir = cache_dir.join(&index.name);
    fs::create_dir_all(&dst_dir)?;
    let dst = dst_dir.join(INDEX_TARBALL);
    fs::copy(&index.path, &dst)?;
    Ok(dst)
}

/// Render the solver configuration, staging index caches under `cache_dir`
///
/// Fails only when `cache_dir` itself cannot be created. An index whose
/// tarball cannot be staged still gets its `remote-repo` line.
pub fn build_constraint_file(
    cache_dir: &Path,
    indices: &[PackageIndex],
    constraints: &ConstraintSet,
) -> Result<String> {
    fs::create_dir_all(cache_dir).map_err(|e| {
        Error::IoError(format!(
            "Failed to create solver cache directory {}: {}",
            cache_dir.display(),
            e
        ))
    })?;

    let mut out = String::new();
    let _ = writeln!(out, "remote-repo-cache: {}", cache_dir.display());

    for index in indices {
        match stage_index(cache_dir, index) {
            Ok(dst) => debug!("Staged index {} at {}", index.name, dst.display()),
            // Ignored: the solver just sees fewer packages from this index
            Err(e) => warn!(
                "Could not stage index {} from {}: {}",
                index.name,
                index.path.display(),
                e
            ),
        }
        let _ = writeln!(out, "remote-repo: {}:{}", index.name, PLACEHOLDER_URL);
    }

    for (name, version) in constraints {
        let _ = writeln!(out, "constraint: {}=={}", name, version);
    }

    Ok(out)
}
