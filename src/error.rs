// src/error.rs

//! Error types for the solving pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving, solving and reconciling dependencies
#[derive(Error, Debug)]
pub enum Error {
    /// The external solver could not be found on the augmented search path
    #[error("Solver executable '{0}' not found on the search path")]
    MissingSolverExecutable(String),

    /// The compiler in the provisioned environment could not be queried
    #[error("Failed to determine compiler version: {0}")]
    CompilerDetectionFailed(String),

    /// The provisioning service could not supply the wanted compiler
    #[error("Failed to provision compiler environment: {0}")]
    EnvironmentProvisionFailed(String),

    /// Lines of the solver's install plan that could not be understood
    #[error("Could not parse solver output:\n{}", .0.join("\n"))]
    UnparseableOutputLines(Vec<String>),

    /// The solver failed before printing an install plan
    #[error("Solver exited with {status} without producing an install plan:\n{output}")]
    SolverPlanMissing { status: String, output: String },

    /// The project configuration document could not be read or decoded
    #[error("Failed to read configuration document {}: {reason}", .path.display())]
    ConfigDocumentUnreadable { path: PathBuf, reason: String },

    #[error("Snapshot lookup failed: {0}")]
    SnapshotLookupFailed(String),

    #[error("Invalid {kind} '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("Invalid resolver: {0}")]
    InvalidResolver(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;
