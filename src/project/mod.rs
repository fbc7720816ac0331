// src/project/mod.rs

//! Project configuration document (`stack.yaml`)
//!
//! The document is kept as an untyped YAML mapping so that fields this
//! crate does not know about survive a rewrite, in their original order.
//! Typed views are read out of it on demand.
//!
//! ```yaml
//! resolver: lts-3.7
//! packages:
//! - .
//! - location: vendor/http-client
//! extra-deps:
//! - aeson-0.8.0.2
//! flags:
//!   zlib:
//!     pkg-config: false
//! ```

mod lock;

pub use lock::ConfigLock;

use crate::error::{Error, Result};
use crate::package::{ConstraintSet, FlagAssignment, FlagName, PackageIdentifier, PackageName, UserFlagMap};
use crate::reconcile::ReconciliationOutcome;
use crate::resolver::ResolverSpec;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Conventional file name of the project configuration
pub const DEFAULT_CONFIG_FILE: &str = "stack.yaml";

const RESOLVER_KEY: &str = "resolver";
const PACKAGES_KEY: &str = "packages";
const EXTRA_DEPS_KEY: &str = "extra-deps";
const FLAGS_KEY: &str = "flags";

/// Typed view of the fields the solving pipeline needs
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub resolver: ResolverSpec,
    /// Local package directories, resolved against `dir`
    pub package_dirs: Vec<PathBuf>,
    pub extra_deps: ConstraintSet,
    pub flags: UserFlagMap,
    /// Directory holding the configuration file
    pub dir: PathBuf,
}

/// A project configuration file and its parsed contents
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: PathBuf,
    root: Mapping,
}

impl ConfigDocument {
    /// Read and parse the document at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::ConfigDocumentUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(path, &text)
    }

    /// Parse document text that was read from `path`
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text).map_err(|e| Error::ConfigDocumentUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let root = match value {
            Value::Mapping(map) => map,
            // An empty file parses as null
            Value::Null => Mapping::new(),
            other => {
                return Err(Error::ConfigDocumentUnreadable {
                    path: path.to_path_buf(),
                    reason: format!("expected a mapping at the top level, found {}", type_name(&other)),
                });
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory relative paths in the document are resolved against
    pub fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn unreadable(&self, reason: impl Into<String>) -> Error {
        Error::ConfigDocumentUnreadable {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    pub fn resolver(&self) -> Result<ResolverSpec> {
        let value = self
            .root
            .get(RESOLVER_KEY)
            .ok_or_else(|| Error::InvalidResolver(format!("no resolver in {}", self.path.display())))?;
        ResolverSpec::from_yaml(value)
    }

    /// Local package directories; defaults to the document's own directory
    pub fn package_dirs(&self) -> Result<Vec<PathBuf>> {
        let dir = self.dir();
        let entries = match self.root.get(PACKAGES_KEY) {
            None | Some(Value::Null) => return Ok(vec![dir.join(".")]),
            Some(Value::Sequence(entries)) => entries,
            Some(other) => {
                return Err(self.unreadable(format!("'packages' must be a list, found {}", type_name(other))));
            }
        };

        let mut dirs = Vec::new();
        for entry in entries {
            match entry {
                Value::String(location) => dirs.push(dir.join(location)),
                Value::Mapping(map) => {
                    if map.get("extra-dep").and_then(Value::as_bool) == Some(true) {
                        debug!("Skipping package entry marked as extra-dep: {:?}", map.get("location"));
                        continue;
                    }
                    match map.get("location") {
                        Some(Value::String(location)) => dirs.push(dir.join(location)),
                        Some(Value::Mapping(_)) => {
                            warn!("Skipping remote package location in {}", self.path.display())
                        }
                        _ => return Err(self.unreadable("package entry without a 'location'")),
                    }
                }
                other => {
                    return Err(self.unreadable(format!("unexpected package entry {}", type_name(other))));
                }
            }
        }
        Ok(dirs)
    }

    /// Pinned `extra-deps`; later duplicates override earlier ones
    pub fn extra_deps(&self) -> Result<ConstraintSet> {
        let entries = match self.root.get(EXTRA_DEPS_KEY) {
            None | Some(Value::Null) => return Ok(ConstraintSet::new()),
            Some(Value::Sequence(entries)) => entries,
            Some(other) => {
                return Err(self.unreadable(format!("'extra-deps' must be a list, found {}", type_name(other))));
            }
        };

        let mut deps = ConstraintSet::new();
        for entry in entries {
            let raw = entry
                .as_str()
                .ok_or_else(|| self.unreadable(format!("extra-dep entry {} is not a string", type_name(entry))))?;
            let ident = PackageIdentifier::parse(raw).map_err(|e| self.unreadable(e.to_string()))?;
            deps.insert(ident.name, ident.version);
        }
        Ok(deps)
    }

    /// Per-package flag overrides
    pub fn flags(&self) -> Result<UserFlagMap> {
        let packages = match self.root.get(FLAGS_KEY) {
            None | Some(Value::Null) => return Ok(UserFlagMap::new()),
            Some(Value::Mapping(packages)) => packages,
            Some(other) => {
                return Err(self.unreadable(format!("'flags' must be a mapping, found {}", type_name(other))));
            }
        };

        let mut result = UserFlagMap::new();
        for (pkg, flags) in packages {
            let pkg = pkg
                .as_str()
                .ok_or_else(|| self.unreadable("flag section keys must be package names"))?;
            let pkg = PackageName::parse(pkg).map_err(|e| self.unreadable(e.to_string()))?;

            let Value::Mapping(flags) = flags else {
                return Err(self.unreadable(format!("flags for {} must be a mapping", pkg)));
            };

            let mut assignment = FlagAssignment::new();
            for (flag, enabled) in flags {
                let flag = flag
                    .as_str()
                    .ok_or_else(|| self.unreadable(format!("flag names for {} must be strings", pkg)))?;
                let flag = FlagName::parse(flag).map_err(|e| self.unreadable(e.to_string()))?;
                let enabled = enabled
                    .as_bool()
                    .ok_or_else(|| self.unreadable(format!("flag {}:{} must be true or false", pkg, flag)))?;
                assignment.insert(flag, enabled);
            }
            result.insert(pkg, assignment);
        }
        Ok(result)
    }

    /// Read every field the pipeline uses
    pub fn project(&self) -> Result<ProjectConfig> {
        Ok(ProjectConfig {
            resolver: self.resolver()?,
            package_dirs: self.package_dirs()?,
            extra_deps: self.extra_deps()?,
            flags: self.flags()?,
            dir: self.dir(),
        })
    }

    /// Union a reconciliation outcome into `extra-deps` and `flags`
    ///
    /// Existing entries are never replaced. `extra-deps` is rewritten as a
    /// sorted list; flag sections keep their order with new entries appended.
    /// Returns whether the document changed.
    pub fn merge_outcome(&mut self, outcome: &ReconciliationOutcome) -> Result<bool> {
        let mut deps = self.extra_deps()?;
        let mut changed = false;
        for (name, version) in &outcome.new_dependencies {
            if !deps.contains_key(name) {
                deps.insert(name.clone(), version.clone());
                changed = true;
            }
        }

        // Validates the existing section before it is edited in place
        self.flags()?;
        let mut flag_section = match self.root.get(FLAGS_KEY) {
            Some(Value::Mapping(map)) => map.clone(),
            _ => Mapping::new(),
        };
        for (pkg, flags) in &outcome.new_flags {
            let key = Value::String(pkg.to_string());
            let mut pkg_section = match flag_section.get(&key) {
                Some(Value::Mapping(map)) => map.clone(),
                _ => Mapping::new(),
            };
            for (flag, enabled) in flags {
                let flag_key = Value::String(flag.to_string());
                if !pkg_section.contains_key(&flag_key) {
                    pkg_section.insert(flag_key, Value::Bool(*enabled));
                    changed = true;
                }
            }
            flag_section.insert(key, Value::Mapping(pkg_section));
        }

        if !changed {
            return Ok(false);
        }

        let dep_list = deps
            .into_iter()
            .map(|(name, version)| Value::String(PackageIdentifier::new(name, version).to_string()))
            .collect();
        self.root.insert(Value::String(EXTRA_DEPS_KEY.to_string()), Value::Sequence(dep_list));
        if !flag_section.is_empty() {
            self.root.insert(Value::String(FLAGS_KEY.to_string()), Value::Mapping(flag_section));
        }
        Ok(true)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.root)
            .map_err(|e| Error::ParseError(format!("Failed to serialize {}: {}", self.path.display(), e)))
    }

    /// Replace the file on disk with this document
    ///
    /// The new contents are written to a temporary file in the same
    /// directory and renamed over the original.
    pub fn write_atomic(&self) -> Result<()> {
        let text = self.to_yaml_string()?;
        let dir = self.dir();

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| {
            Error::IoError(format!("Failed to create temporary file in {}: {}", dir.display(), e))
        })?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;

        if let Ok(meta) = fs::metadata(&self.path) {
            fs::set_permissions(tmp.path(), meta.permissions())?;
        }

        tmp.persist(&self.path).map_err(|e| {
            Error::IoError(format!("Failed to replace {}: {}", self.path.display(), e.error))
        })?;
        Ok(())
    }
}

/// Merge `outcome` into the document at `path` under an exclusive lock
///
/// The lock file is kept in `locks_dir`. The document is re-read after the
/// lock is taken so that concurrent writers never lose each other's changes.
pub fn persist_outcome(path: &Path, locks_dir: &Path, outcome: &ReconciliationOutcome) -> Result<bool> {
    let _lock = ConfigLock::acquire(&ConfigLock::path_for(locks_dir, path))?;

    let mut doc = ConfigDocument::load(path)?;
    if !doc.merge_outcome(outcome)? {
        debug!("{} already contains every change", path.display());
        return Ok(false);
    }

    doc.write_atomic()?;
    info!("Updated {}", path.display());
    Ok(true)
}

/// Nearest `stack.yaml` in `start` or one of its ancestors
pub fn find_project_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(DEFAULT_CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;
    use tempfile::TempDir;

    fn name(s: &str) -> PackageName {
        PackageName::parse(s).unwrap()
    }

    fn doc(text: &str) -> ConfigDocument {
        ConfigDocument::parse(Path::new("/work/stack.yaml"), text).unwrap()
    }

    fn outcome(deps: &[(&str, &str)], flags: &[(&str, &str, bool)]) -> ReconciliationOutcome {
        let mut result = ReconciliationOutcome::default();
        for (pkg, version) in deps {
            result.new_dependencies.insert(name(pkg), Version::parse(version).unwrap());
        }
        for (pkg, flag, enabled) in flags {
            result
                .new_flags
                .entry(name(pkg))
                .or_default()
                .insert(FlagName::parse(flag).unwrap(), *enabled);
        }
        result
    }

    #[test]
    fn test_project_view() {
        let d = doc("resolver: lts-3.7\n\
                     packages:\n- .\n- location: vendor/lib\n- location: dep\n  extra-dep: true\n\
                     extra-deps:\n- aeson-0.8.0.2\n\
                     flags:\n  zlib:\n    pkg-config: false\n");
        let project = d.project().unwrap();

        assert_eq!(project.resolver.to_string(), "lts-3.7");
        assert_eq!(
            project.package_dirs,
            vec![PathBuf::from("/work/."), PathBuf::from("/work/vendor/lib")]
        );
        assert_eq!(project.extra_deps[&name("aeson")].to_string(), "0.8.0.2");
        assert_eq!(project.flags[&name("zlib")][&FlagName::parse("pkg-config").unwrap()], false);
        assert_eq!(project.dir, PathBuf::from("/work"));
    }

    #[test]
    fn test_packages_default_to_dot() {
        let d = doc("resolver: ghc-7.10.2\n");
        assert_eq!(d.package_dirs().unwrap(), vec![PathBuf::from("/work/.")]);
        assert!(d.extra_deps().unwrap().is_empty());
        assert!(d.flags().unwrap().is_empty());
    }

    #[test]
    fn test_missing_resolver() {
        assert!(matches!(doc("packages: [.]\n").resolver(), Err(Error::InvalidResolver(_))));
    }

    #[test]
    fn test_unreadable_documents() {
        let path = Path::new("/work/stack.yaml");
        assert!(matches!(
            ConfigDocument::parse(path, "resolver: [unclosed"),
            Err(Error::ConfigDocumentUnreadable { .. })
        ));
        assert!(matches!(
            ConfigDocument::parse(path, "- just\n- a list\n"),
            Err(Error::ConfigDocumentUnreadable { .. })
        ));
        assert!(matches!(
            doc("extra-deps:\n- not a package\n").extra_deps(),
            Err(Error::ConfigDocumentUnreadable { .. })
        ));
        assert!(matches!(
            doc("flags:\n  zlib:\n    pkg-config: maybe\n").flags(),
            Err(Error::ConfigDocumentUnreadable { .. })
        ));
    }

    #[test]
    fn test_merge_preserves_unknown_fields_and_order() {
        let mut d = doc("resolver: lts-3.7\n\
                         image:\n  container:\n    base: fpco/stack-build\n\
                         extra-deps:\n- zlib-0.5.4.2\n\
                         packages:\n- .\n");
        let changed = d.merge_outcome(&outcome(&[("aeson", "0.8.0.2")], &[])).unwrap();
        assert!(changed);

        let text = d.to_yaml_string().unwrap();
        let keys: Vec<String> = serde_yaml::from_str::<Mapping>(&text)
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["resolver", "image", "extra-deps", "packages"]);

        let reparsed = ConfigDocument::parse(Path::new("/work/stack.yaml"), &text).unwrap();
        let deps: Vec<String> = reparsed.root[EXTRA_DEPS_KEY]
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert_eq!(deps, vec!["aeson-0.8.0.2", "zlib-0.5.4.2"]);
        assert_eq!(reparsed.root["image"]["container"]["base"].as_str(), Some("fpco/stack-build"));
    }

    #[test]
    fn test_merge_existing_entries_win() {
        let mut d = doc("resolver: lts-3.7\n\
                         extra-deps:\n- aeson-0.8.0.2\n\
                         flags:\n  zlib:\n    pkg-config: false\n");
        let changed = d
            .merge_outcome(&outcome(
                &[("aeson", "0.9.0.0")],
                &[("zlib", "pkg-config", true), ("zlib", "non-blocking-ffi", true)],
            ))
            .unwrap();
        assert!(changed);

        assert_eq!(d.extra_deps().unwrap()[&name("aeson")].to_string(), "0.8.0.2");
        let flags = d.flags().unwrap();
        assert_eq!(flags[&name("zlib")][&FlagName::parse("pkg-config").unwrap()], false);
        assert_eq!(flags[&name("zlib")][&FlagName::parse("non-blocking-ffi").unwrap()], true);
    }

    #[test]
    fn test_merge_without_changes() {
        let mut d = doc("resolver: lts-3.7\nextra-deps:\n- aeson-0.8.0.2\n");
        let before = d.to_yaml_string().unwrap();
        assert!(!d.merge_outcome(&outcome(&[("aeson", "0.8.0.2")], &[])).unwrap());
        assert_eq!(d.to_yaml_string().unwrap(), before);
    }

    #[test]
    fn test_persist_outcome_rewrites_file() {
        let tmp = TempDir::new().unwrap();
        let project_dir = tmp.path().join("project");
        let locks_dir = tmp.path().join("locks");
        fs::create_dir_all(&project_dir).unwrap();
        let path = project_dir.join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "resolver: lts-3.7\nuser-field: kept\n").unwrap();

        let changed = persist_outcome(
            &path,
            &locks_dir,
            &outcome(&[("foo", "1.2.0")], &[("bar", "useFast", true)]),
        )
        .unwrap();
        assert!(changed);

        // Only the document itself is left in the project
        let entries: Vec<_> = fs::read_dir(&project_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(DEFAULT_CONFIG_FILE)]);
        assert!(ConfigLock::path_for(&locks_dir, &path).exists());

        let d = ConfigDocument::load(&path).unwrap();
        assert_eq!(d.extra_deps().unwrap()[&name("foo")].to_string(), "1.2.0");
        assert_eq!(d.flags().unwrap()[&name("bar")][&FlagName::parse("useFast").unwrap()], true);
        assert_eq!(d.root["user-field"].as_str(), Some("kept"));
    }

    #[test]
    fn test_find_project_file_walks_up() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("app").join("src");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_file(&nested), None);

        fs::write(tmp.path().join(DEFAULT_CONFIG_FILE), "resolver: lts-3.7\n").unwrap();
        assert_eq!(find_project_file(&nested), Some(tmp.path().join(DEFAULT_CONFIG_FILE)));
    }

    #[test]
    fn test_persist_outcome_rejects_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "resolver: [oops").unwrap();

        let err = persist_outcome(&path, &tmp.path().join("locks"), &outcome(&[("foo", "1.2.0")], &[])).unwrap_err();
        assert!(matches!(err, Error::ConfigDocumentUnreadable { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "resolver: [oops");
    }
}
