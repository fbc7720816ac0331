// src/lib.rs

//! depsolve
//!
//! Finds the extra dependencies and build flags a multi-package Haskell
//! project needs by driving an external solver (`cabal`) against the
//! compiler and package set of the project's resolver.
//!
//! # Architecture
//!
//! - `resolver`: resolver specifications and the build plans they name
//! - `toolchain`: compiler provisioning and the solver's search path
//! - `solver`: solver configuration, invocation and output parsing
//! - `reconcile`: diffing a plan against declared dependencies
//! - `project`: reading and rewriting `stack.yaml`

pub mod compiler;
pub mod config;
mod error;
pub mod package;
pub mod project;
pub mod reconcile;
pub mod resolver;
pub mod solver;
pub mod toolchain;
pub mod version;

pub use compiler::{CompilerCheck, CompilerKind, CompilerVersion};
pub use config::DepsolveConfig;
pub use error::{Error, Result};
pub use package::{
    ConstraintSet, FlagAssignment, FlagName, PackageIdentifier, PackageName, UserFlagMap,
};
pub use project::{ConfigDocument, ProjectConfig, find_project_file, persist_outcome};
pub use reconcile::{
    ReconciliationOutcome, SolveContext, SolveReport, SolveRequest, solve_extra_deps,
};
pub use resolver::{BuildPlan, BuildPlanLookup, LocalBuildPlans, ResolverSpec, SnapshotId};
pub use solver::{PackageIndex, SolverResult, parse_solver_output};
pub use toolchain::{
    CompilerProvisioner, InstallPolicy, ManagedCompilers, SearchPath, SolverEnvironment,
};
pub use version::Version;
