// src/resolver/buildplan.rs

//! Snapshot build plans read from YAML files
//!
//! Named snapshots live as `<snapshots_dir>/<id>.yaml`:
//!
//! ```yaml
//! system-info:
//!   ghc-version: 7.10.2
//! packages:
//!   aeson:
//!     version: 0.8.0.2
//! ```
//!
//! Custom snapshots list their compiler and package identifiers directly:
//!
//! ```yaml
//! compiler: ghc-7.10.2
//! packages:
//!   - aeson-0.8.0.2
//! ```
//!
//! They are loaded from a path relative to the project configuration, a
//! `file://` URL, or fetched over HTTP(S).

use super::{BuildPlan, BuildPlanLookup, SnapshotId};
use crate::compiler::CompilerVersion;
use crate::error::{Error, Result};
use crate::package::{ConstraintSet, PackageIdentifier, PackageName};
use crate::version::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(rename = "system-info", default)]
    system_info: Option<SystemInfo>,
    #[serde(default)]
    compiler: Option<CompilerVersion>,
    #[serde(default)]
    packages: BTreeMap<PackageName, SnapshotPackage>,
}

#[derive(Debug, Deserialize)]
struct SystemInfo {
    #[serde(rename = "ghc-version")]
    ghc_version: Version,
}

#[derive(Debug, Deserialize)]
struct SnapshotPackage {
    version: Version,
}

#[derive(Debug, Deserialize)]
struct CustomSnapshotFile {
    compiler: CompilerVersion,
    #[serde(default)]
    packages: Vec<PackageIdentifier>,
}

/// Build plans stored on the local filesystem (custom snapshots may be remote)
#[derive(Debug, Clone)]
pub struct LocalBuildPlans {
    snapshots_dir: PathBuf,
}

impl LocalBuildPlans {
    pub fn new(snapshots_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshots_dir: snapshots_dir.into(),
        }
    }

    /// Path where a named snapshot is expected
    pub fn snapshot_path(&self, id: &SnapshotId) -> PathBuf {
        self.snapshots_dir.join(format!("{}.yaml", id))
    }

    fn read_location(base_dir: &Path, location: &str) -> Result<String> {
        if location.starts_with("http://") || location.starts_with("https://") {
            info!("Downloading custom snapshot from {}", location);
            let response = reqwest::blocking::get(location)
                .and_then(|r| r.error_for_status())
                .map_err(|e| Error::SnapshotLookupFailed(format!("{}: {}", location, e)))?;
            return response
                .text()
                .map_err(|e| Error::SnapshotLookupFailed(format!("{}: {}", location, e)));
        }

        let path = if location.starts_with("file://") {
            url::Url::parse(location)
                .ok()
                .and_then(|u| u.to_file_path().ok())
                .ok_or_else(|| {
                    Error::SnapshotLookupFailed(format!("Invalid file URL: {}", location))
                })?
        } else {
            base_dir.join(location)
        };

        debug!("Reading custom snapshot from {}", path.display());
        fs::read_to_string(&path)
            .map_err(|e| Error::SnapshotLookupFailed(format!("{}: {}", path.display(), e)))
    }
}

/// Parse the contents of a named snapshot file
pub(crate) fn parse_snapshot(content: &str, origin: &str) -> Result<BuildPlan> {
    let file: SnapshotFile = serde_yaml::from_str(content)
        .map_err(|e| Error::SnapshotLookupFailed(format!("{}: {}", origin, e)))?;

    let compiler = match (file.compiler, file.system_info) {
        (Some(compiler), _) => compiler,
        (None, Some(info)) => CompilerVersion::Ghc(info.ghc_version),
        (None, None) => {
            return Err(Error::SnapshotLookupFailed(format!(
                "{}: snapshot does not declare a compiler",
                origin
            )));
        }
    };

    let packages = file
        .packages
        .into_iter()
        .map(|(name, pkg)| (name, pkg.version))
        .collect();

    Ok(BuildPlan { compiler, packages })
}

/// Parse the contents of a custom snapshot file
pub(crate) fn parse_custom_snapshot(content: &str, origin: &str) -> Result<BuildPlan> {
    let file: CustomSnapshotFile = serde_yaml::from_str(content)
        .map_err(|e| Error::SnapshotLookupFailed(format!("{}: {}", origin, e)))?;

    let mut packages = ConstraintSet::new();
    for ident in file.packages {
        packages.insert(ident.name, ident.version);
    }

    Ok(BuildPlan {
        compiler: file.compiler,
        packages,
    })
}

impl BuildPlanLookup for LocalBuildPlans {
    fn lookup_snapshot(&self, id: &SnapshotId) -> Result<BuildPlan> {
        let path = self.snapshot_path(id);
        let content = fs::read_to_string(&path).map_err(|e| {
            Error::SnapshotLookupFailed(format!(
                "Build plan for {} not available at {}: {}",
                id,
                path.display(),
                e
            ))
        })?;
        parse_snapshot(&content, &path.display().to_string())
    }

    fn lookup_custom_snapshot(&self, base_dir: &Path, location: &str) -> Result<BuildPlan> {
        let content = Self::read_location(base_dir, location)?;
        parse_custom_snapshot(&content, location)
    }
}
