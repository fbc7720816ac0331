// src/solver/mod.rs

//! External dependency solver
//!
//! The solver is treated as a batch oracle: we write its configuration,
//! run it in dry-run mode and read back the install plan it prints.

pub mod config_file;
pub mod invoke;
pub mod output;

pub use config_file::{INDEX_TARBALL, PLACEHOLDER_URL, PackageIndex, build_constraint_file};
pub use invoke::{SolverRequest, SolverRun, invoke, run_solver};
pub use output::{PLAN_MARKER, SolverResult, parse_solver_output};
