// src/solver/invoke.rs

//! Running the external solver
//!
//! Each run gets a private temporary directory holding the generated
//! `cabal.config` and the index cache. The directory is removed when the
//! run finishes, whatever the outcome.

use super::config_file::{PackageIndex, build_constraint_file};
use super::output::{SolverResult, has_plan_marker, parse_solver_output};
use crate::error::{Error, Result};
use crate::package::{ConstraintSet, UserFlagMap};
use crate::toolchain::SolverEnvironment;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tracing::{debug, info, warn};

/// Name of the generated solver configuration file
pub const CONFIG_FILE_NAME: &str = "cabal.config";

/// Arguments following `--config-file`, always passed in this order
pub const FIXED_ARGS: &[&str] = &[
    "install",
    "--enable-tests",
    "--enable-benchmarks",
    "-v",
    "--dry-run",
    "--only-dependencies",
    "--reorder-goals",
    "--max-backjumps=-1",
    "--package-db=clear",
    "--package-db=global",
];

/// Inputs for one solver run
#[derive(Debug, Clone, Default)]
pub struct SolverRequest {
    /// Project package directories, passed as trailing arguments
    pub package_dirs: Vec<PathBuf>,
    pub constraints: ConstraintSet,
    pub user_flags: UserFlagMap,
    /// Inserted after the fixed arguments
    pub extra_args: Vec<String>,
    pub indices: Vec<PackageIndex>,
}

/// Captured result of a solver process
#[derive(Debug)]
pub struct SolverRun {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// `--constraint=<pkg> <+|-><flag>` for every user flag, in (package, flag) order
pub fn flag_constraint_args(user_flags: &UserFlagMap) -> Vec<String> {
    user_flags
        .iter()
        .flat_map(|(pkg, flags)| {
            flags.iter().map(move |(flag, enabled)| {
                format!("--constraint={} {}{}", pkg, if *enabled { '+' } else { '-' }, flag)
            })
        })
        .collect()
}

/// Full argument list for a solver run using `config_file`
pub fn solver_args(config_file: &Path, request: &SolverRequest) -> Vec<OsString> {
    let mut config_arg = OsString::from("--config-file=");
    config_arg.push(config_file);

    let mut args = vec![config_arg];
    args.extend(FIXED_ARGS.iter().map(OsString::from));
    args.extend(request.extra_args.iter().map(OsString::from));
    args.extend(flag_constraint_args(&request.user_flags).into_iter().map(OsString::from));
    args.extend(request.package_dirs.iter().map(|dir| dir.as_os_str().to_os_string()));
    args
}

/// Spawn the solver and capture its output
///
/// A non-zero exit status is returned to the caller, not treated as failure.
pub fn invoke(env: &SolverEnvironment, request: &SolverRequest) -> Result<SolverRun> {
    let temp_dir = tempfile::Builder::new()
        .prefix("depsolve-")
        .tempdir()
        .map_err(|e| Error::IoError(format!("Failed to create solver work directory: {}", e)))?;

    let config_text = build_constraint_file(temp_dir.path(), &request.indices, &request.constraints)?;
    let config_file = temp_dir.path().join(CONFIG_FILE_NAME);
    fs::write(&config_file, config_text).map_err(|e| {
        Error::IoError(format!("Failed to write {}: {}", config_file.display(), e))
    })?;

    let args = solver_args(&config_file, request);
    debug!("Running {} {:?}", env.solver.display(), args);

    let output = env
        .solver_command()?
        .args(&args)
        .current_dir(temp_dir.path())
        .output()
        .map_err(|e| Error::CommandFailed(format!("Failed to run {}: {}", env.solver.display(), e)))?;

    if !output.status.success() {
        debug!("Solver exited with {}", output.status);
    }

    Ok(SolverRun {
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Run the solver and parse its plan
///
/// Fails with [`Error::SolverPlanMissing`] when the solver exited non-zero
/// without printing a plan.
pub fn run_solver(env: &SolverEnvironment, request: &SolverRequest) -> Result<SolverResult> {
    info!("Asking {} to solve {} package(s)", env.solver.display(), request.package_dirs.len());

    let run = invoke(env, request)?;

    if !has_plan_marker(&run.stdout) {
        if !run.status.success() {
            let mut output = String::from_utf8_lossy(&run.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&run.stdout);
            if !stdout.trim().is_empty() {
                if !output.is_empty() {
                    output.push('\n');
                }
                output.push_str(stdout.trim());
            }
            return Err(Error::SolverPlanMissing {
                status: run.status.to_string(),
                output,
            });
        }
        debug!("Solver printed no install plan");
    } else if !run.status.success() {
        warn!("Solver exited with {} but printed a plan; using it", run.status);
    }

    parse_solver_output(&run.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{FlagAssignment, FlagName, PackageName};

    fn flags(entries: &[(&str, &[(&str, bool)])]) -> UserFlagMap {
        entries
            .iter()
            .map(|(pkg, fs)| {
                let assignment: FlagAssignment = fs
                    .iter()
                    .map(|(f, on)| (FlagName::parse(f).unwrap(), *on))
                    .collect();
                (PackageName::parse(pkg).unwrap(), assignment)
            })
            .collect()
    }

    #[test]
    fn test_flag_constraint_args_ordered() {
        let user_flags = flags(&[
            ("zlib", &[("pkg-config", false)]),
            ("aeson", &[("fast", true), ("developer", false)]),
        ]);
        assert_eq!(
            flag_constraint_args(&user_flags),
            vec![
                "--constraint=aeson -developer",
                "--constraint=aeson +fast",
                "--constraint=zlib -pkg-config",
            ]
        );
    }

    #[test]
    fn test_solver_args_order() {
        let request = SolverRequest {
            package_dirs: vec![PathBuf::from("/work/app"), PathBuf::from("/work/lib")],
            user_flags: flags(&[("foo", &[("bar", true)])]),
            extra_args: vec!["--ghcjs".to_string()],
            ..SolverRequest::default()
        };

        let args = solver_args(Path::new("/tmp/x/cabal.config"), &request);
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        let mut expected = vec!["--config-file=/tmp/x/cabal.config".to_string()];
        expected.extend(FIXED_ARGS.iter().map(|s| s.to_string()));
        expected.extend([
            "--ghcjs".to_string(),
            "--constraint=foo +bar".to_string(),
            "/work/app".to_string(),
            "/work/lib".to_string(),
        ]);
        assert_eq!(args, expected);
    }

    #[test]
    fn test_no_flags_no_constraint_args() {
        assert!(flag_constraint_args(&UserFlagMap::new()).is_empty());

        let mut empty = UserFlagMap::new();
        empty.insert(PackageName::parse("foo").unwrap(), FlagAssignment::new());
        assert!(flag_constraint_args(&empty).is_empty());
    }
}
