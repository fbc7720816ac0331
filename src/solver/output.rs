// src/solver/output.rs

//! Parser for the solver's install plan
//!
//! The solver prints diagnostics, then a marker line, then one line per
//! package it would install:
//!
//! ```text
//! Resolving dependencies...
//! In order, the following would be installed:
//! aeson-0.8.0.2 (new package)
//! zlib-0.5.4.2 -pkg-config +non-blocking-ffi (new version)
//! ```
//!
//! Everything from the first `(` on a line is an annotation and dropped.
//! Flag tokens are `-flag` (off), `+flag` (on) or bare `flag` (on).
//! A plan with any line that does not fit this grammar is rejected as a
//! whole, listing every offending line.

use crate::error::{Error, Result};
use crate::package::{FlagAssignment, FlagName, PackageIdentifier, PackageName};
use crate::version::Version;
use std::collections::BTreeMap;

/// Start of the plan section
pub const PLAN_MARKER: &str = "In order, the following would be installed";

/// Resolved version and flags for every package in a plan
pub type SolverResult = BTreeMap<PackageName, (Version, FlagAssignment)>;

/// Whether the output contains a plan section at all
pub fn has_plan_marker(output: &[u8]) -> bool {
    String::from_utf8_lossy(output)
        .lines()
        .any(|line| line.starts_with(PLAN_MARKER))
}

/// Parse raw solver output into a [`SolverResult`]
///
/// Output without a marker line yields an empty result.
pub fn parse_solver_output(output: &[u8]) -> Result<SolverResult> {
    let text = String::from_utf8_lossy(output);
    let plan_lines = text
        .lines()
        .skip_while(|line| !line.starts_with(PLAN_MARKER))
        .skip(1);

    let mut result = SolverResult::new();
    let mut errors = Vec::new();

    for line in plan_lines {
        if line.trim().is_empty() {
            continue;
        }
        match parse_plan_line(line) {
            Some((name, entry)) => {
                result.insert(name, entry);
            }
            None => errors.push(line.to_string()),
        }
    }

    if !errors.is_empty() {
        return Err(Error::UnparseableOutputLines(errors));
    }

    Ok(result)
}

/// Parse one plan line into a package and its resolved version and flags
pub fn parse_plan_line(line: &str) -> Option<(PackageName, (Version, FlagAssignment))> {
    let content = match line.find('(') {
        Some(pos) => &line[..pos],
        None => line,
    };

    let mut tokens = content.split_whitespace();
    let ident = PackageIdentifier::parse(tokens.next()?).ok()?;

    let mut flags = FlagAssignment::new();
    for token in tokens {
        let (flag, enabled) = parse_flag_token(token)?;
        flags.insert(flag, enabled);
    }

    Some((ident.name, (ident.version, flags)))
}

/// Parse `-flag`, `+flag` or `flag`
///
/// A bare flag counts as enabled, matching how the solver prints them.
pub fn parse_flag_token(token: &str) -> Option<(FlagName, bool)> {
    let (name, enabled) = if let Some(rest) = token.strip_prefix('-') {
        (rest, false)
    } else if let Some(rest) = token.strip_prefix('+') {
        (rest, true)
    } else {
        (token, true)
    };

    FlagName::parse(name).ok().map(|flag| (flag, enabled))
}
