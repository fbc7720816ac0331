// src/cli/mod.rs
//! CLI definitions for depsolve
//!
//! Command implementations live in the `commands` module.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

mod solve;

pub use solve::SolveArgs;

#[derive(Parser)]
#[command(name = "depsolve")]
#[command(author = "Depsolve Contributors")]
#[command(version)]
#[command(about = "Find the extra dependencies and flags a Haskell project needs", long_about = None)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Tool configuration file (default: ~/.config/depsolve/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Solve for extra dependencies missing from the project configuration
    ///
    /// Runs the external solver against every local package with the
    /// project's resolver and extra-deps pinned, then reports the
    /// dependencies and flags that still need to be declared.
    Solve(SolveArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
