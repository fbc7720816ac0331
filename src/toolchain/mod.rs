// src/toolchain/mod.rs

//! Compiler environment provisioning
//!
//! Before the solver can run, the wanted compiler must be reachable and the
//! solver executable must be on the search path. Provisioning never touches
//! the process environment: the augmented search path is carried in a
//! [`SolverEnvironment`] and applied to each spawned command.

mod managed;

pub use managed::ManagedCompilers;

use crate::compiler::{CompilerCheck, CompilerKind, CompilerVersion};
use crate::error::{Error, Result};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Variables that let ambient package databases leak into a solve
pub const HASKELL_ENV_VARS: &[&str] = &[
    "GHC_PACKAGE_PATH",
    "GHC_ENVIRONMENT",
    "HASKELL_PACKAGE_SANDBOX",
    "HASKELL_PACKAGE_SANDBOXES",
    "HASKELL_DIST_DIR",
];

/// How a compiler may be obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstallPolicy {
    /// Allow installing the compiler when it is missing
    #[serde(rename = "install-ghc")]
    pub allow_install: bool,
    /// Use a compiler already on the search path when it matches
    #[serde(rename = "system-ghc")]
    pub prefer_system: bool,
    /// How closely an existing compiler must match
    pub compiler_check: CompilerCheck,
}

impl Default for InstallPolicy {
    fn default() -> Self {
        Self {
            allow_install: true,
            prefer_system: false,
            compiler_check: CompilerCheck::default(),
        }
    }
}

/// Service that makes a compiler available
pub trait CompilerProvisioner {
    /// Ensure `wanted` is usable; returns directories to prepend to the search path
    fn ensure_compiler(&self, wanted: &CompilerVersion, policy: &InstallPolicy) -> Result<Vec<PathBuf>>;
}

/// An executable search path, applied explicitly to spawned commands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Split a `PATH`-style value
    pub fn from_env_value(value: Option<&OsStr>) -> Self {
        let dirs = value
            .map(|v| std::env::split_paths(v).collect())
            .unwrap_or_default();
        Self { dirs }
    }

    /// A new search path with `extra` in front
    pub fn prepend(&self, extra: &[PathBuf]) -> Self {
        let mut dirs = extra.to_vec();
        dirs.extend(self.dirs.iter().cloned());
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Join back into a `PATH` value
    pub fn to_os_string(&self) -> Result<OsString> {
        std::env::join_paths(&self.dirs)
            .map_err(|e| Error::IoError(format!("Invalid search path entry: {}", e)))
    }

    /// Locate an executable on this search path
    pub fn find(&self, program: &str, cwd: &Path) -> Option<PathBuf> {
        let path = self.to_os_string().ok()?;
        which::which_in(program, Some(path), cwd).ok()
    }

    /// A command for `program` running with this search path and no
    /// Haskell package-database overrides
    pub fn command(&self, program: &Path) -> Result<Command> {
        let mut cmd = Command::new(program);
        cmd.env("PATH", self.to_os_string()?);
        for var in HASKELL_ENV_VARS {
            cmd.env_remove(var);
        }
        Ok(cmd)
    }
}

/// Everything needed to run the solver against a provisioned compiler
#[derive(Debug, Clone)]
pub struct SolverEnvironment {
    pub search_path: SearchPath,
    /// Resolved path of the solver executable
    pub solver: PathBuf,
    /// Compiler found on the search path
    pub compiler: CompilerVersion,
}

impl SolverEnvironment {
    /// A command running the solver in this environment
    pub fn solver_command(&self) -> Result<Command> {
        self.search_path.command(&self.solver)
    }
}

/// Provision an environment for solving against `wanted`
///
/// `ambient_path` is the caller's `PATH`; `cwd` is used to resolve relative
/// search path entries.
pub fn provision(
    wanted: &CompilerVersion,
    policy: &InstallPolicy,
    provisioner: &dyn CompilerProvisioner,
    solver_program: &str,
    ambient_path: Option<&OsStr>,
    cwd: &Path,
) -> Result<SolverEnvironment> {
    let extra = provisioner
        .ensure_compiler(wanted, policy)
        .map_err(|e| match e {
            Error::EnvironmentProvisionFailed(_) => e,
            other => Error::EnvironmentProvisionFailed(other.to_string()),
        })?;

    for dir in &extra {
        debug!("Adding {} to the search path", dir.display());
    }
    let search_path = SearchPath::from_env_value(ambient_path).prepend(&extra);

    let solver = search_path
        .find(solver_program, cwd)
        .ok_or_else(|| Error::MissingSolverExecutable(solver_program.to_string()))?;
    debug!("Using solver executable {}", solver.display());

    let compiler = detect_compiler(wanted.kind(), &search_path, cwd)?;
    info!("Using compiler: {}", compiler);

    if !compiler.satisfies(wanted, policy.compiler_check) {
        warn!(
            "Compiler {} does not match wanted {} ({})",
            compiler, wanted, policy.compiler_check
        );
    }

    Ok(SolverEnvironment {
        search_path,
        solver,
        compiler,
    })
}

/// Query the compiler of `kind` found on `search_path`
pub fn detect_compiler(kind: CompilerKind, search_path: &SearchPath, cwd: &Path) -> Result<CompilerVersion> {
    let program = search_path.find(kind.executable(), cwd).ok_or_else(|| {
        Error::CompilerDetectionFailed(format!("{} not found on the search path", kind))
    })?;

    match kind {
        CompilerKind::Ghc => Ok(CompilerVersion::Ghc(numeric_version(
            search_path,
            &program,
            "--numeric-version",
        )?)),
        CompilerKind::Ghcjs => Ok(CompilerVersion::Ghcjs {
            ghcjs: numeric_version(search_path, &program, "--numeric-ghcjs-version")?,
            ghc: numeric_version(search_path, &program, "--numeric-ghc-version")?,
        }),
    }
}

/// Run `program flag` and parse the leading version number it prints
fn numeric_version(search_path: &SearchPath, program: &Path, flag: &str) -> Result<Version> {
    let output = search_path
        .command(program)?
        .arg(flag)
        .output()
        .map_err(|e| {
            Error::CompilerDetectionFailed(format!("Failed to run {} {}: {}", program.display(), flag, e))
        })?;

    if !output.status.success() {
        return Err(Error::CompilerDetectionFailed(format!(
            "{} {} failed: {}",
            program.display(),
            flag,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_numeric_version(&output.stdout).ok_or_else(|| {
        Error::CompilerDetectionFailed(format!(
            "Could not parse version from {} {}: {:?}",
            program.display(),
            flag,
            String::from_utf8_lossy(&output.stdout)
        ))
    })
}

/// Leading `digits.digits...` of a version query's output
pub(crate) fn parse_numeric_version(stdout: &[u8]) -> Option<Version> {
    let text = String::from_utf8_lossy(stdout);
    let numeric: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    Version::parse(numeric.trim_end_matches('.')).ok()
}
