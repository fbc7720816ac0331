// src/toolchain/managed.rs

//! Compilers found on the system or in a managed programs directory
//!
//! Layout of the programs directory:
//!
//! ```text
//! <programs_dir>/ghc-7.10.2/bin/ghc
//! <programs_dir>/ghcjs-0.1.0_ghc-7.10.2/bin/ghcjs
//! ```
//!
//! Downloading and unpacking compilers is left to an external installer;
//! this provisioner only locates what is already there.

use super::{CompilerProvisioner, InstallPolicy, SearchPath, detect_compiler};
use crate::compiler::CompilerVersion;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Locates compilers on the ambient search path or under `programs_dir`
#[derive(Debug, Clone)]
pub struct ManagedCompilers {
    programs_dir: PathBuf,
    system_path: SearchPath,
    cwd: PathBuf,
}

impl ManagedCompilers {
    pub fn new(programs_dir: impl Into<PathBuf>, system_path: SearchPath, cwd: impl Into<PathBuf>) -> Self {
        Self {
            programs_dir: programs_dir.into(),
            system_path,
            cwd: cwd.into(),
        }
    }

    /// Directory holding the binaries of a managed compiler
    pub fn bin_dir(&self, compiler: &CompilerVersion) -> PathBuf {
        self.programs_dir.join(compiler.to_string()).join("bin")
    }

    fn system_compiler_matches(&self, wanted: &CompilerVersion, policy: &InstallPolicy) -> bool {
        match detect_compiler(wanted.kind(), &self.system_path, &self.cwd) {
            Ok(found) if found.satisfies(wanted, policy.compiler_check) => {
                info!("Using system compiler {}", found);
                true
            }
            Ok(found) => {
                debug!(
                    "System compiler {} does not satisfy {} ({})",
                    found, wanted, policy.compiler_check
                );
                false
            }
            Err(e) => {
                debug!("No usable system compiler: {}", e);
                false
            }
        }
    }

    fn managed_install(&self, wanted: &CompilerVersion) -> Option<PathBuf> {
        let bin = self.bin_dir(wanted);
        is_file(&bin.join(wanted.kind().executable())).then_some(bin)
    }
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}

impl CompilerProvisioner for ManagedCompilers {
    fn ensure_compiler(&self, wanted: &CompilerVersion, policy: &InstallPolicy) -> Result<Vec<PathBuf>> {
        if policy.prefer_system && self.system_compiler_matches(wanted, policy) {
            return Ok(Vec::new());
        }

        if let Some(bin) = self.managed_install(wanted) {
            debug!("Found managed {} in {}", wanted, bin.display());
            return Ok(vec![bin]);
        }

        let reason = if policy.allow_install {
            format!(
                "{} is not installed; install it so that {} exists",
                wanted,
                self.bin_dir(wanted).join(wanted.kind().executable()).display()
            )
        } else {
            format!("{} is not installed and compiler installation is disabled", wanted)
        };
        Err(Error::EnvironmentProvisionFailed(reason))
    }
}
