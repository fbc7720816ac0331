// tests/common/mod.rs

//! Shared test utilities for the solve workflow tests.
//!
//! The pipeline is driven against shell-script stand-ins for `ghc`,
//! `ghcjs` and the solver. The fake solver records its arguments, working
//! directory and configuration file under `record_dir`, then prints
//! whatever the test asked it to.

#![allow(dead_code)]

use depsolve::{
    BuildPlan, BuildPlanLookup, CompilerProvisioner, CompilerVersion, ConfigDocument,
    InstallPolicy, PackageIndex, SnapshotId, SolveContext, SolveRequest,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name the fake solver is installed under, so a real `cabal` is never picked up
pub const FAKE_SOLVER: &str = "fake-cabal";

pub const PLAN_HEADER: &str =
    "Resolving dependencies...\nIn order, the following would be installed (use -v for more details):\n";

/// A scratch project with a directory of fake tools
pub struct SolveFixture {
    /// Keep alive to prevent cleanup
    pub dir: TempDir,
    pub bin_dir: PathBuf,
    pub record_dir: PathBuf,
    pub project_file: PathBuf,
    pub index: PackageIndex,
}

impl SolveFixture {
    /// Create a project whose configuration is `stack_yaml`
    pub fn new(stack_yaml: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bin_dir = dir.path().join("bin");
        let record_dir = dir.path().join("record");
        let project_dir = dir.path().join("project");
        fs::create_dir_all(&bin_dir).unwrap();
        fs::create_dir_all(&record_dir).unwrap();
        fs::create_dir_all(&project_dir).unwrap();

        let project_file = project_dir.join("stack.yaml");
        fs::write(&project_file, stack_yaml).unwrap();

        let index_path = dir.path().join("hackage-index.tar");
        fs::write(&index_path, b"not really a tarball").unwrap();

        Self {
            dir,
            bin_dir,
            record_dir,
            project_file,
            index: PackageIndex::new("Hackage", index_path),
        }
    }

    fn write_script(&self, name: &str, body: &str) {
        let path = self.bin_dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    pub fn install_ghc(&self, version: &str) {
        self.write_script(
            "ghc",
            &format!("case \"$1\" in\n  --numeric-version) echo {} ;;\n  *) exit 1 ;;\nesac\n", version),
        );
    }

    pub fn install_ghcjs(&self, ghcjs: &str, ghc: &str) {
        self.write_script(
            "ghcjs",
            &format!(
                "case \"$1\" in\n  --numeric-ghcjs-version) echo {} ;;\n  --numeric-ghc-version) echo {} ;;\n  *) exit 1 ;;\nesac\n",
                ghcjs, ghc
            ),
        );
    }

    /// Install a solver that prints `stdout` and exits with `exit_code`
    pub fn install_solver(&self, stdout: &str, exit_code: i32) {
        fs::write(self.record_dir.join("stdout"), stdout).unwrap();
        let record = self.record_dir.display();
        self.write_script(
            FAKE_SOLVER,
            &format!(
                "record='{record}'\n\
                 : > \"$record/args\"\n\
                 for arg in \"$@\"; do printf '%s\\n' \"$arg\" >> \"$record/args\"; done\n\
                 pwd > \"$record/cwd\"\n\
                 cp \"${{1#--config-file=}}\" \"$record/cabal.config\"\n\
                 cat \"$record/stdout\"\n\
                 exit {exit_code}\n"
            ),
        );
    }

    /// Arguments the fake solver was called with
    pub fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(self.record_dir.join("args"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Working directory the fake solver ran in
    pub fn recorded_cwd(&self) -> PathBuf {
        PathBuf::from(fs::read_to_string(self.record_dir.join("cwd")).unwrap().trim())
    }

    /// Configuration file the fake solver was given
    pub fn recorded_config(&self) -> String {
        fs::read_to_string(self.record_dir.join("cabal.config")).unwrap()
    }

    pub fn solver_ran(&self) -> bool {
        self.record_dir.join("args").exists()
    }

    pub fn project_text(&self) -> String {
        fs::read_to_string(&self.project_file).unwrap()
    }

    pub fn document(&self) -> ConfigDocument {
        ConfigDocument::load(&self.project_file).unwrap()
    }

    pub fn request(&self, update_config: bool) -> SolveRequest {
        SolveRequest {
            project_file: self.project_file.clone(),
            update_config,
            extra_solver_args: Vec::new(),
        }
    }

    pub fn context<'a>(
        &self,
        build_plans: &'a dyn BuildPlanLookup,
        provisioner: &'a dyn CompilerProvisioner,
    ) -> SolveContext<'a> {
        SolveContext {
            build_plans,
            provisioner,
            policy: InstallPolicy::default(),
            indices: vec![self.index.clone()],
            solver_program: FAKE_SOLVER.to_string(),
            ambient_path: Some("/usr/bin:/bin".into()),
            cwd: self.dir.path().to_path_buf(),
            locks_dir: self.dir.path().join("locks"),
        }
    }
}

/// Provisioner that always hands back the same directories
pub struct FixedProvisioner(pub Vec<PathBuf>);

impl FixedProvisioner {
    pub fn bin(dir: &Path) -> Self {
        Self(vec![dir.to_path_buf()])
    }
}

impl CompilerProvisioner for FixedProvisioner {
    fn ensure_compiler(
        &self,
        _wanted: &CompilerVersion,
        _policy: &InstallPolicy,
    ) -> depsolve::Result<Vec<PathBuf>> {
        Ok(self.0.clone())
    }
}

/// Lookup for projects that only use explicit compiler resolvers
pub struct NoSnapshots;

impl BuildPlanLookup for NoSnapshots {
    fn lookup_snapshot(&self, id: &SnapshotId) -> depsolve::Result<BuildPlan> {
        Err(depsolve::Error::SnapshotLookupFailed(format!("no snapshot {}", id)))
    }

    fn lookup_custom_snapshot(&self, _base_dir: &Path, location: &str) -> depsolve::Result<BuildPlan> {
        Err(depsolve::Error::SnapshotLookupFailed(format!("no snapshot at {}", location)))
    }
}
