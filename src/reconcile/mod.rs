// src/reconcile/mod.rs

//! Solving a project's extra dependencies
//!
//! The engine ties the pipeline together:
//!
//! 1. read the project configuration and resolve its compiler
//! 2. provision an environment with that compiler and the solver
//! 3. pin everything already declared and run the solver
//! 4. diff the plan against the pins
//! 5. optionally merge the new pins and flags back into the configuration

mod diff;

pub use diff::ReconciliationOutcome;

use crate::compiler::CompilerVersion;
use crate::error::Result;
use crate::project::{self, ConfigDocument};
use crate::resolver::{BuildPlanLookup, resolve_build_plan};
use crate::solver::{PackageIndex, SolverRequest, run_solver};
use crate::toolchain::{CompilerProvisioner, InstallPolicy, provision};
use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::{debug, info};

/// Message reported when the plan adds nothing
pub const NO_CHANGES_MESSAGE: &str = "No needed changes found";

/// What the caller asked for
#[derive(Debug, Clone)]
pub struct SolveRequest {
    /// Project configuration document
    pub project_file: PathBuf,
    /// Merge the outcome into `project_file`
    pub update_config: bool,
    /// Passed to the solver after its fixed arguments
    pub extra_solver_args: Vec<String>,
}

/// Services and settings the engine runs with
pub struct SolveContext<'a> {
    pub build_plans: &'a dyn BuildPlanLookup,
    pub provisioner: &'a dyn CompilerProvisioner,
    pub policy: InstallPolicy,
    pub indices: Vec<PackageIndex>,
    /// Solver executable name, looked up on the provisioned search path
    pub solver_program: String,
    /// The caller's `PATH`
    pub ambient_path: Option<OsString>,
    /// Relative paths, including `SolveRequest::project_file`, resolve against this
    pub cwd: PathBuf,
    /// Where configuration locks are kept
    pub locks_dir: PathBuf,
}

/// Result of a solve
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Compiler the solver ran against
    pub compiler: CompilerVersion,
    pub outcome: ReconciliationOutcome,
    /// Whether the project configuration was rewritten
    pub config_updated: bool,
}

impl SolveReport {
    /// Human-readable summary of the outcome
    pub fn render(&self) -> Result<String> {
        if self.outcome.is_empty() {
            return Ok(format!("{}\n", NO_CHANGES_MESSAGE));
        }

        let mut out = String::new();
        let _ = writeln!(out, "This may be resolved by:");
        for line in self.outcome.to_yaml()?.lines() {
            let _ = writeln!(out, "    {}", line);
        }
        Ok(out)
    }
}

/// Find the dependencies and flags a project is missing
pub fn solve_extra_deps(request: &SolveRequest, ctx: &SolveContext<'_>) -> Result<SolveReport> {
    // The solver runs in a scratch directory, so every path it sees must be absolute
    let project_file = ctx.cwd.join(&request.project_file);
    info!("Using configuration file: {}", project_file.display());
    let document = ConfigDocument::load(&project_file)?;
    let project = document.project()?;

    let plan = resolve_build_plan(&project.resolver, ctx.build_plans, &project.dir)?;
    info!("Using resolver: {}", project.resolver);

    let env = provision(
        &plan.compiler,
        &ctx.policy,
        ctx.provisioner,
        &ctx.solver_program,
        ctx.ambient_path.as_deref(),
        &ctx.cwd,
    )?;

    // Declared extra-deps override snapshot versions
    let mut constraints = plan.packages;
    constraints.extend(project.extra_deps.clone());
    debug!(
        "{} pinned package(s), {} from extra-deps",
        constraints.len(),
        project.extra_deps.len()
    );

    let mut extra_args = Vec::new();
    if plan.compiler.is_ghcjs() {
        extra_args.push("--ghcjs".to_string());
    }
    extra_args.extend(request.extra_solver_args.iter().cloned());

    let solver_request = SolverRequest {
        package_dirs: project.package_dirs.clone(),
        constraints,
        user_flags: project.flags.clone(),
        extra_args,
        indices: ctx.indices.clone(),
    };
    let result = run_solver(&env, &solver_request)?;

    let outcome = ReconciliationOutcome::compute(&result, &solver_request.constraints);

    if outcome.is_empty() {
        info!("{}", NO_CHANGES_MESSAGE);
        return Ok(SolveReport {
            compiler: env.compiler,
            outcome,
            config_updated: false,
        });
    }

    info!(
        "Solver found {} new dependency(ies) and flags for {} package(s)",
        outcome.new_dependencies.len(),
        outcome.new_flags.len()
    );

    let config_updated = if request.update_config {
        project::persist_outcome(&project_file, &ctx.locks_dir, &outcome)?
    } else {
        false
    };

    Ok(SolveReport {
        compiler: env.compiler,
        outcome,
        config_updated,
    })
}
