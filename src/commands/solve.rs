// src/commands/solve.rs

//! Solve command
//!
//! Wires the tool configuration and command-line overrides into the
//! reconciliation engine and prints its report.

use crate::cli::{Cli, SolveArgs};
use anyhow::{Context, Result, anyhow};
use clap::CommandFactory;
use clap_complete::Shell;
use depsolve::{
    DepsolveConfig, LocalBuildPlans, ManagedCompilers, SearchPath, SolveContext, SolveRequest,
    find_project_file, solve_extra_deps,
};
use std::env;
use std::io;
use std::path::Path;
use tracing::info;

/// Find missing extra-deps and flags, optionally recording them
pub fn cmd_solve(args: SolveArgs, config_path: Option<&Path>) -> Result<()> {
    let config = DepsolveConfig::load(config_path).context("Failed to load depsolve configuration")?;
    let cwd = env::current_dir().context("Failed to determine the current directory")?;

    let project_file = match args.stack_yaml {
        Some(path) => path,
        None => find_project_file(&cwd).ok_or_else(|| {
            anyhow!(
                "No stack.yaml found in {} or its parents; use --stack-yaml to name one",
                cwd.display()
            )
        })?,
    };

    let mut policy = config.install;
    if args.system_ghc {
        policy.prefer_system = true;
    }
    if args.no_install_ghc {
        policy.allow_install = false;
    }
    if let Some(check) = args.compiler_check {
        policy.compiler_check = check;
    }

    let ambient_path = env::var_os("PATH");
    let build_plans = LocalBuildPlans::new(config.snapshots_dir());
    let provisioner = ManagedCompilers::new(
        config.programs_dir(),
        SearchPath::from_env_value(ambient_path.as_deref()),
        &cwd,
    );

    let ctx = SolveContext {
        build_plans: &build_plans,
        provisioner: &provisioner,
        policy,
        indices: config.indices(),
        solver_program: args.solver.unwrap_or_else(|| config.solver().to_string()),
        ambient_path,
        cwd,
        locks_dir: config.locks_dir(),
    };
    let request = SolveRequest {
        project_file: project_file.clone(),
        update_config: args.update_config,
        extra_solver_args: args.solver_args,
    };

    let report = solve_extra_deps(&request, &ctx)
        .with_context(|| format!("Failed to solve dependencies for {}", project_file.display()))?;
    info!("Solved with {}", report.compiler);

    print!("{}", report.render()?);

    if report.config_updated {
        println!("Updated {}", project_file.display());
    } else if !report.outcome.is_empty() && !args.update_config {
        println!(
            "To automatically update {}, rerun with '--update-config'",
            project_file.display()
        );
    }

    Ok(())
}

/// Print a completion script for `shell`
pub fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
