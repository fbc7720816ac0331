// src/config.rs

//! Tool configuration
//!
//! Read from `$XDG_CONFIG_HOME/depsolve/config.toml` unless another file is
//! given. Every field is optional; paths default to locations under `root`.
//!
//! ```toml
//! root = "/home/me/.depsolve"
//! solver = "cabal"
//! snapshots-dir = "/home/me/.depsolve/build-plan"
//!
//! [[indices]]
//! name = "Hackage"
//! path = "/home/me/.depsolve/indices/Hackage/00-index.tar"
//!
//! [install]
//! system-ghc = true
//! compiler-check = "match-minor"
//! ```

use crate::error::{Error, Result};
use crate::solver::{INDEX_TARBALL, PackageIndex};
use crate::toolchain::InstallPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default solver executable
pub const DEFAULT_SOLVER: &str = "cabal";

/// Index used when none are configured
pub const DEFAULT_INDEX_NAME: &str = "Hackage";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct DepsolveConfig {
    /// State directory; defaults to `~/.depsolve`
    pub root: Option<PathBuf>,
    pub solver: Option<String>,
    pub indices: Option<Vec<PackageIndex>>,
    /// Named snapshot build plans
    pub snapshots_dir: Option<PathBuf>,
    /// Managed compiler installations
    pub programs_dir: Option<PathBuf>,
    pub install: InstallPolicy,
}

impl DepsolveConfig {
    /// Conventional location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("depsolve").join("config.toml"))
    }

    /// Load configuration
    ///
    /// An explicitly given file must exist. A missing file at the default
    /// location yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No configuration file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = Self::parse(&text)
            .map_err(|e| Error::ParseError(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::ParseError(e.to_string()))
    }

    pub fn root(&self) -> PathBuf {
        match &self.root {
            Some(root) => root.clone(),
            None => dirs::home_dir()
                .map(|home| home.join(".depsolve"))
                .unwrap_or_else(|| PathBuf::from(".depsolve")),
        }
    }

    pub fn solver(&self) -> &str {
        self.solver.as_deref().unwrap_or(DEFAULT_SOLVER)
    }

    pub fn indices(&self) -> Vec<PackageIndex> {
        match &self.indices {
            Some(indices) => indices.clone(),
            None => vec![PackageIndex::new(
                DEFAULT_INDEX_NAME,
                self.root().join("indices").join(DEFAULT_INDEX_NAME).join(INDEX_TARBALL),
            )],
        }
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.snapshots_dir
            .clone()
            .unwrap_or_else(|| self.root().join("build-plan"))
    }

    pub fn programs_dir(&self) -> PathBuf {
        self.programs_dir
            .clone()
            .unwrap_or_else(|| self.root().join("programs"))
    }

    /// Lock files guarding project configuration rewrites
    pub fn locks_dir(&self) -> PathBuf {
        self.root().join("locks")
    }
}
