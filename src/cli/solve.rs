// src/cli/solve.rs
//! Arguments for `depsolve solve`

use clap::Args;
use depsolve::CompilerCheck;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    /// Project configuration file (default: nearest stack.yaml)
    #[arg(long, value_name = "PATH")]
    pub stack_yaml: Option<PathBuf>,

    /// Write the new dependencies and flags into the project configuration
    #[arg(long)]
    pub update_config: bool,

    /// Extra argument passed to the solver (repeatable)
    #[arg(long = "solver-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub solver_args: Vec<String>,

    /// Solver executable to run instead of the configured one
    #[arg(long, value_name = "PROGRAM")]
    pub solver: Option<String>,

    /// Use a compiler already on PATH when it matches the resolver
    #[arg(long)]
    pub system_ghc: bool,

    /// Never install a missing compiler
    #[arg(long)]
    pub no_install_ghc: bool,

    /// How closely a compiler must match: match-minor, match-exact, newer-minor
    #[arg(long, value_name = "CHECK")]
    pub compiler_check: Option<CompilerCheck>,
}
