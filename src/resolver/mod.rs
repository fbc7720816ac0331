// src/resolver/mod.rs

//! Resolver specifications and compiler lookup
//!
//! A project's `resolver` names where its compiler (and, for snapshots,
//! its baseline package set) comes from:
//!
//! - `ghc-7.10.2` - an explicit compiler, no inherited packages
//! - `lts-3.7`, `nightly-2015-10-12` - a named snapshot
//! - `./snapshot.yaml`, `https://example.com/custom.yaml`, or
//!   `{ name: ..., location: ... }` - a custom snapshot
//!
//! Snapshot contents come from a [`BuildPlanLookup`] implementation.

mod buildplan;

pub use buildplan::LocalBuildPlans;

use crate::compiler::CompilerVersion;
use crate::error::{Error, Result};
use crate::package::ConstraintSet;
use serde_yaml::Value;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Identifier of a named snapshot (e.g. `lts-3.7`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotId(String);

impl SnapshotId {
    pub fn parse(s: &str) -> Result<Self> {
        let valid = !s.is_empty()
            && s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
            && !s.starts_with('.');

        if !valid {
            return Err(Error::InvalidIdentifier {
                kind: "snapshot name",
                value: s.to_string(),
            });
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a project's compiler and baseline packages come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverSpec {
    ExplicitCompiler(CompilerVersion),
    NamedSnapshot(SnapshotId),
    /// Location of a custom snapshot file, relative to the project config
    CustomSnapshot(String),
}

impl ResolverSpec {
    /// Parse the string form of a resolver
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidResolver("empty resolver".to_string()));
        }

        if s.starts_with("ghc-") || s.starts_with("ghcjs-") {
            return Ok(Self::ExplicitCompiler(CompilerVersion::parse(s)?));
        }

        if s.contains("://") || s.ends_with(".yaml") || s.ends_with(".yml") {
            return Ok(Self::CustomSnapshot(s.to_string()));
        }

        Ok(Self::NamedSnapshot(SnapshotId::parse(s)?))
    }

    /// Read the `resolver` value of a project configuration document
    pub fn from_yaml(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Mapping(map) => match map.get("location") {
                Some(Value::String(location)) if !location.is_empty() => {
                    Ok(Self::CustomSnapshot(location.clone()))
                }
                _ => Err(Error::InvalidResolver(
                    "custom resolver needs a 'location' string".to_string(),
                )),
            },
            other => Err(Error::InvalidResolver(format!(
                "expected a string or mapping, found {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for ResolverSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExplicitCompiler(c) => write!(f, "{}", c),
            Self::NamedSnapshot(id) => write!(f, "{}", id),
            Self::CustomSnapshot(url) => write!(f, "{}", url),
        }
    }
}

/// Compiler and package set declared by a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub compiler: CompilerVersion,
    pub packages: ConstraintSet,
}

/// Source of snapshot build plans
pub trait BuildPlanLookup {
    /// Load a named snapshot
    fn lookup_snapshot(&self, id: &SnapshotId) -> Result<BuildPlan>;

    /// Load a custom snapshot; relative locations resolve against `base_dir`
    fn lookup_custom_snapshot(&self, base_dir: &Path, location: &str) -> Result<BuildPlan>;
}

/// Resolve a resolver specification to its compiler and inherited packages
///
/// `config_dir` is the directory containing the project configuration.
pub fn resolve_build_plan(
    spec: &ResolverSpec,
    lookup: &dyn BuildPlanLookup,
    config_dir: &Path,
) -> Result<BuildPlan> {
    let plan = match spec {
        ResolverSpec::ExplicitCompiler(compiler) => BuildPlan {
            compiler: compiler.clone(),
            packages: ConstraintSet::new(),
        },
        ResolverSpec::NamedSnapshot(id) => lookup.lookup_snapshot(id)?,
        ResolverSpec::CustomSnapshot(location) => {
            lookup.lookup_custom_snapshot(config_dir, location)?
        }
    };

    debug!(
        "Resolver {} uses {} with {} snapshot package(s)",
        spec,
        plan.compiler,
        plan.packages.len()
    );
    Ok(plan)
}

/// Resolve only the compiler a resolver implies
pub fn resolve_compiler(
    spec: &ResolverSpec,
    lookup: &dyn BuildPlanLookup,
    config_dir: &Path,
) -> Result<CompilerVersion> {
    Ok(resolve_build_plan(spec, lookup, config_dir)?.compiler)
}
