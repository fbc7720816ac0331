// src/reconcile/diff.rs

//! Diff between a solver plan and the declared dependencies
//!
//! Only packages the project does not already pin become new dependencies.
//! Flags are reported for every planned package that has any, declared or
//! not, so they can be recorded next to the pins.

use crate::error::{Error, Result};
use crate::package::{ConstraintSet, PackageName, UserFlagMap, identifier_strings};
use crate::solver::SolverResult;
use serde::Serialize;

/// Changes needed to make the project configuration match a solver plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationOutcome {
    /// Planned packages that are not yet declared
    pub new_dependencies: ConstraintSet,
    /// Flag assignments from the plan; never holds an empty assignment
    pub new_flags: UserFlagMap,
}

#[derive(Serialize)]
struct ReportDocument {
    #[serde(rename = "extra-deps")]
    extra_deps: Vec<String>,
    #[serde(skip_serializing_if = "UserFlagMap::is_empty")]
    flags: UserFlagMap,
}

impl ReconciliationOutcome {
    /// Diff `result` against the packages in `already_declared`
    pub fn compute(result: &SolverResult, already_declared: &ConstraintSet) -> Self {
        let new_dependencies = result
            .iter()
            .filter(|(name, _)| !already_declared.contains_key(*name))
            .map(|(name, (version, _))| (name.clone(), version.clone()))
            .collect();

        let new_flags = result
            .iter()
            .filter(|(_, (_, flags))| !flags.is_empty())
            .map(|(name, (_, flags))| (name.clone(), flags.clone()))
            .collect();

        Self {
            new_dependencies,
            new_flags,
        }
    }

    /// True when there are no new dependencies to record
    ///
    /// Flags alone do not count as a needed change.
    pub fn is_empty(&self) -> bool {
        self.new_dependencies.is_empty()
    }

    /// Whether a package appears in the outcome at all
    pub fn mentions(&self, name: &PackageName) -> bool {
        self.new_dependencies.contains_key(name) || self.new_flags.contains_key(name)
    }

    /// YAML snippet with `extra-deps` and `flags` in project config form
    pub fn to_yaml(&self) -> Result<String> {
        let doc = ReportDocument {
            extra_deps: identifier_strings(&self.new_dependencies),
            flags: self.new_flags.clone(),
        };
        serde_yaml::to_string(&doc)
            .map_err(|e| Error::ParseError(format!("Failed to render solver report: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{FlagAssignment, FlagName};
    use crate::version::Version;

    fn name(s: &str) -> PackageName {
        PackageName::parse(s).unwrap()
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn plan(entries: &[(&str, &str, &[(&str, bool)])]) -> SolverResult {
        entries
            .iter()
            .map(|(pkg, version, flags)| {
                let assignment: FlagAssignment = flags
                    .iter()
                    .map(|(f, on)| (FlagName::parse(f).unwrap(), *on))
                    .collect();
                (name(pkg), (v(version), assignment))
            })
            .collect()
    }

    #[test]
    fn test_new_package_becomes_dependency() {
        let result = plan(&[("foo", "1.2.0", &[])]);
        let outcome = ReconciliationOutcome::compute(&result, &ConstraintSet::new());

        let expected: ConstraintSet = [(name("foo"), v("1.2.0"))].into_iter().collect();
        assert_eq!(outcome.new_dependencies, expected);
        assert!(outcome.new_flags.is_empty());
        assert!(!outcome.is_empty());
    }

    #[test]
    fn test_declared_package_keeps_flags_only() {
        let result = plan(&[("bar", "2.0.0", &[("useFast", true)])]);
        let declared: ConstraintSet = [(name("bar"), v("2.0.0"))].into_iter().collect();
        let outcome = ReconciliationOutcome::compute(&result, &declared);

        assert!(outcome.new_dependencies.is_empty());
        assert_eq!(outcome.new_flags.len(), 1);
        assert_eq!(outcome.new_flags[&name("bar")][&FlagName::parse("useFast").unwrap()], true);
        assert!(outcome.is_empty());
        assert!(outcome.mentions(&name("bar")));
    }

    #[test]
    fn test_declared_version_mismatch_is_not_new() {
        // Declared pins win; the plan's version for a declared package is ignored
        let result = plan(&[("text", "1.2.1.3", &[])]);
        let declared: ConstraintSet = [(name("text"), v("1.1.0"))].into_iter().collect();
        assert!(ReconciliationOutcome::compute(&result, &declared).is_empty());
    }

    #[test]
    fn test_diff_properties() {
        let result = plan(&[
            ("aeson", "0.8.0.2", &[]),
            ("bar", "2.0.0", &[("useFast", true)]),
            ("zlib", "0.5.4.2", &[("pkg-config", false)]),
            ("mtl", "2.2.1", &[]),
        ]);
        let declared: ConstraintSet = [(name("mtl"), v("2.2.1")), (name("zlib"), v("0.5.4.2"))]
            .into_iter()
            .collect();
        let outcome = ReconciliationOutcome::compute(&result, &declared);

        for key in outcome.new_dependencies.keys() {
            assert!(!declared.contains_key(key));
        }
        for key in result.keys() {
            assert!(outcome.new_dependencies.contains_key(key) || declared.contains_key(key));
        }
        assert!(outcome.new_flags.values().all(|flags| !flags.is_empty()));
        assert_eq!(
            outcome.new_flags.keys().cloned().collect::<Vec<_>>(),
            vec![name("bar"), name("zlib")]
        );
    }

    #[test]
    fn test_yaml_report() {
        let result = plan(&[("foo", "1.2.0", &[]), ("bar", "2.0.0", &[("useFast", true)])]);
        let outcome = ReconciliationOutcome::compute(&result, &ConstraintSet::new());
        let yaml = outcome.to_yaml().unwrap();

        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["extra-deps"][0].as_str(), Some("bar-2.0.0"));
        assert_eq!(parsed["extra-deps"][1].as_str(), Some("foo-1.2.0"));
        assert_eq!(parsed["flags"]["bar"]["useFast"].as_bool(), Some(true));
    }

    #[test]
    fn test_yaml_report_omits_empty_flags() {
        let result = plan(&[("foo", "1.2.0", &[])]);
        let yaml = ReconciliationOutcome::compute(&result, &ConstraintSet::new())
            .to_yaml()
            .unwrap();
        assert!(!yaml.contains("flags"));
    }
}
