// src/package.rs

//! Package and flag identifiers
//!
//! Identifiers are validated on construction so the rest of the pipeline
//! can treat them as opaque, well-formed values.
//!
//! - Package names are dash-separated components of ASCII alphanumerics,
//!   each containing at least one letter (`aeson`, `http-client`, `base64-bytestring`).
//! - Flag names are ASCII alphanumerics, `-` and `_`, not starting with `-`.
//! - A package identifier is `name-version`, split on the last dash.

use crate::error::{Error, Result};
use crate::version::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Flag overrides for one package (flag -> enabled)
pub type FlagAssignment = BTreeMap<FlagName, bool>;

/// Pinned versions fed to the solver as equality constraints
pub type ConstraintSet = BTreeMap<PackageName, Version>;

/// Per-package flag overrides
pub type UserFlagMap = BTreeMap<PackageName, FlagAssignment>;

/// Implements Display, FromStr and string-based serde for an identifier newtype
macro_rules! string_identifier {
    ($ty:ident) => {
        impl $ty {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// A validated package name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    pub fn parse(s: &str) -> Result<Self> {
        let valid = !s.is_empty()
            && s.split('-').all(|component| {
                !component.is_empty()
                    && component.chars().all(|c| c.is_ascii_alphanumeric())
                    && component.chars().any(|c| c.is_ascii_alphabetic())
            });

        if !valid {
            return Err(Error::InvalidIdentifier {
                kind: "package name",
                value: s.to_string(),
            });
        }

        Ok(Self(s.to_string()))
    }
}

string_identifier!(PackageName);

/// A validated build flag name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlagName(String);

impl FlagName {
    pub fn parse(s: &str) -> Result<Self> {
        let valid = !s.starts_with('-')
            && !s.is_empty()
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid {
            return Err(Error::InvalidIdentifier {
                kind: "flag name",
                value: s.to_string(),
            });
        }

        Ok(Self(s.to_string()))
    }
}

string_identifier!(FlagName);

/// A package name together with a concrete version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageIdentifier {
    pub name: PackageName,
    pub version: Version,
}

impl PackageIdentifier {
    pub fn new(name: PackageName, version: Version) -> Self {
        Self { name, version }
    }

    /// Parse `name-version`, e.g. `http-client-0.4.24`
    pub fn parse(s: &str) -> Result<Self> {
        let (name, version) = s.rsplit_once('-').ok_or_else(|| Error::InvalidIdentifier {
            kind: "package identifier",
            value: s.to_string(),
        })?;

        Ok(Self {
            name: PackageName::parse(name)?,
            version: Version::parse(version)?,
        })
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

impl FromStr for PackageIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for PackageIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Render a constraint set as a sorted list of `name-version` strings
pub fn identifier_strings(constraints: &ConstraintSet) -> Vec<String> {
    constraints
        .iter()
        .map(|(name, version)| PackageIdentifier::new(name.clone(), version.clone()).to_string())
        .collect()
}
