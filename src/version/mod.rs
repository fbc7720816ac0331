// src/version/mod.rs

//! Package version handling
//!
//! Versions are dot-separated runs of non-negative integers (`1.2.0`,
//! `0.8.0.2`). Ordering compares components left to right, and a version
//! that is a strict prefix of another sorts first (`1.2 < 1.2.0`).

use crate::error::{Error, Result};
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A parsed package version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(Vec<u64>);

impl Version {
    /// Parse a version string
    ///
    /// Examples:
    /// - "1.2.3" → [1, 2, 3]
    /// - "0.8.0.2" → [0, 8, 0, 2]
    /// - "7" → [7]
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidIdentifier {
            kind: "version",
            value: s.to_string(),
        };

        if s.is_empty() {
            return Err(invalid());
        }

        let components = s
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                part.parse::<u64>().map_err(|_| invalid())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self(components))
    }

    /// Build a version directly from its components
    pub fn from_components(components: Vec<u64>) -> Self {
        Self(components)
    }

    /// Numeric components, most significant first
    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(VersionVisitor)
    }
}

/// Accepts strings and the numeric scalars YAML produces for unquoted
/// versions (`version: 1`, `version: 1.0`)
struct VersionVisitor;

impl<'de> Visitor<'de> for VersionVisitor {
    type Value = Version;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a dotted version such as 1.2.0")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Version, E> {
        Version::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Version, E> {
        Ok(Version(vec![v]))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Version, E> {
        u64::try_from(v)
            .map(|v| Version(vec![v]))
            .map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Version, E> {
        // Debug keeps the fractional part of integral floats ("1.0")
        Version::parse(&format!("{:?}", v)).map_err(|_| E::invalid_value(Unexpected::Float(v), &self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v.components(), &[1, 2, 3]);
        assert_eq!(v.to_string(), "1.2.3");

        let v = Version::parse("0.8.0.2").unwrap();
        assert_eq!(v.components(), &[0, 8, 0, 2]);
    }

    #[test]
    fn test_invalid_versions() {
        for bad in ["", "1..2", ".1", "1.", "1.a", "v1.0", "1.0-rc1", " 1.0"] {
            assert!(Version::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_version_ordering() {
        let v = |s: &str| Version::parse(s).unwrap();
        assert!(v("1.2") < v("1.2.0"));
        assert!(v("1.2.0") < v("1.10"));
        assert!(v("0.9.9.9") < v("1"));
        assert_eq!(v("2.0.0"), v("2.0.0"));
    }

    #[test]
    fn test_deserialize_unquoted_scalars() {
        let v = |text: &str| serde_yaml::from_str::<Version>(text);
        assert_eq!(v("\"0.8.0.2\"").unwrap().to_string(), "0.8.0.2");
        assert_eq!(v("1").unwrap().to_string(), "1");
        assert_eq!(v("1.0").unwrap().to_string(), "1.0");
        assert_eq!(v("0.5").unwrap().to_string(), "0.5");
        assert_eq!(v("1.2.3").unwrap().to_string(), "1.2.3");
        assert!(v("-1").is_err());
        assert!(v("true").is_err());
    }

    #[test]
    fn test_leading_zeros_normalize() {
        assert_eq!(Version::parse("01.002").unwrap().to_string(), "1.2");
    }
}
