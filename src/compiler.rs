// src/compiler.rs

//! Compiler identities and version checks
//!
//! A compiler is written the way resolvers and snapshots name it:
//! `ghc-7.10.2` for GHC, `ghcjs-0.1.0_ghc-7.10.2` for GHCJS (which carries
//! the GHC version it is built against).

use crate::error::{Error, Result};
use crate::version::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Which compiler family a version belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerKind {
    Ghc,
    Ghcjs,
}

impl CompilerKind {
    /// Name of the compiler executable
    pub fn executable(&self) -> &'static str {
        match self {
            Self::Ghc => "ghc",
            Self::Ghcjs => "ghcjs",
        }
    }
}

impl fmt::Display for CompilerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable())
    }
}

/// A concrete compiler version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompilerVersion {
    Ghc(Version),
    /// GHCJS emits JavaScript, the solver must be told about it
    Ghcjs { ghcjs: Version, ghc: Version },
}

impl CompilerVersion {
    /// Parse `ghc-X.Y.Z` or `ghcjs-A.B.C_ghc-X.Y.Z`
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidIdentifier {
            kind: "compiler version",
            value: s.to_string(),
        };

        if let Some(rest) = s.strip_prefix("ghcjs-") {
            let (ghcjs, ghc) = rest.split_once("_ghc-").ok_or_else(invalid)?;
            return Ok(Self::Ghcjs {
                ghcjs: Version::parse(ghcjs).map_err(|_| invalid())?,
                ghc: Version::parse(ghc).map_err(|_| invalid())?,
            });
        }

        if let Some(rest) = s.strip_prefix("ghc-") {
            return Ok(Self::Ghc(Version::parse(rest).map_err(|_| invalid())?));
        }

        Err(invalid())
    }

    pub fn kind(&self) -> CompilerKind {
        match self {
            Self::Ghc(_) => CompilerKind::Ghc,
            Self::Ghcjs { .. } => CompilerKind::Ghcjs,
        }
    }

    /// Whether solving must target JavaScript output
    pub fn is_ghcjs(&self) -> bool {
        self.kind() == CompilerKind::Ghcjs
    }

    /// The GHC version this compiler corresponds to
    pub fn ghc_version(&self) -> &Version {
        match self {
            Self::Ghc(v) => v,
            Self::Ghcjs { ghc, .. } => ghc,
        }
    }

    /// Check whether this (installed) compiler is acceptable for `wanted`
    pub fn satisfies(&self, wanted: &CompilerVersion, check: CompilerCheck) -> bool {
        match (wanted, self) {
            (Self::Ghc(w), Self::Ghc(a)) => check.accepts(w, a),
            (
                Self::Ghcjs { ghcjs: wj, ghc: wg },
                Self::Ghcjs { ghcjs: aj, ghc: ag },
            ) => check.accepts(wj, aj) && check.accepts(wg, ag),
            _ => false,
        }
    }
}

impl fmt::Display for CompilerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ghc(v) => write!(f, "ghc-{}", v),
            Self::Ghcjs { ghcjs, ghc } => write!(f, "ghcjs-{}_ghc-{}", ghcjs, ghc),
        }
    }
}

impl FromStr for CompilerVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for CompilerVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CompilerVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// How strictly an installed compiler must match the wanted one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilerCheck {
    /// First three components agree (7.10.2 accepts 7.10.2.1)
    #[default]
    MatchMinor,
    /// Identical versions only
    MatchExact,
    /// Same major version, minor version at least the wanted one
    NewerMinor,
}

impl CompilerCheck {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MatchMinor => "match-minor",
            Self::MatchExact => "match-exact",
            Self::NewerMinor => "newer-minor",
        }
    }

    /// Compare a wanted version against an actual one
    pub fn accepts(&self, wanted: &Version, actual: &Version) -> bool {
        let wanted = wanted.components();
        let actual = actual.components();
        let agree = |n: usize| wanted.iter().zip(actual).take(n).all(|(w, a)| w == a);

        match self {
            Self::MatchMinor => agree(3),
            Self::MatchExact => wanted == actual,
            Self::NewerMinor => {
                let newer = match (wanted.get(2), actual.get(2)) {
                    (None, _) => true,
                    (Some(_), None) => false,
                    (Some(w), Some(a)) => a >= w,
                };
                agree(2) && newer
            }
        }
    }
}

impl fmt::Display for CompilerCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompilerCheck {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "match-minor" => Ok(Self::MatchMinor),
            "match-exact" => Ok(Self::MatchExact),
            "newer-minor" => Ok(Self::NewerMinor),
            other => Err(Error::ParseError(format!(
                "unknown compiler check '{}' (expected match-minor, match-exact or newer-minor)",
                other
            ))),
        }
    }
}
