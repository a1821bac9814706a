//! Package specs and target triplets.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error parsing a package spec or triplet.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecParseError {
    #[error("expected `<name>:<triplet>`, got `{0}`")]
    MissingTriplet(String),
    #[error("package name must not be empty")]
    EmptyName,
    #[error("expected `<arch>-<system>` triplet, got `{0}`")]
    MalformedTriplet(String),
}

/// Target triplet: CPU architecture plus operating-system class.
///
/// The `uwp` system class identifies the restricted Windows Store target,
/// which carries extra binary requirements (the App Container bit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triplet {
    arch: String,
    system: String,
}

impl Triplet {
    /// Expected architecture of every produced binary (e.g. "x64").
    pub fn architecture(&self) -> &str {
        &self.arch
    }

    /// Operating-system class (e.g. "windows", "uwp").
    pub fn system(&self) -> &str {
        &self.system
    }
}

impl FromStr for Triplet {
    type Err = SpecParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((arch, system)) if !arch.is_empty() && !system.is_empty() => Ok(Triplet {
                arch: arch.to_string(),
                system: system.to_string(),
            }),
            _ => Err(SpecParseError::MalformedTriplet(s.to_string())),
        }
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.arch, self.system)
    }
}

/// A package name bound to the triplet it was built for.
///
/// Immutable for the duration of a validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    name: String,
    triplet: Triplet,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>, triplet: Triplet) -> Self {
        PackageSpec {
            name: name.into(),
            triplet,
        }
    }

    /// Port name (e.g. "zlib").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target triplet this package was built for.
    pub fn target_triplet(&self) -> &Triplet {
        &self.triplet
    }

    /// Install subdirectory name under the packages root
    /// (e.g. "zlib_x64-windows").
    pub fn dir(&self) -> String {
        format!("{}_{}", self.name, self.triplet)
    }
}

impl FromStr for PackageSpec {
    type Err = SpecParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, triplet) = s
            .split_once(':')
            .ok_or_else(|| SpecParseError::MissingTriplet(s.to_string()))?;
        if name.is_empty() {
            return Err(SpecParseError::EmptyName);
        }
        Ok(PackageSpec {
            name: name.to_string(),
            triplet: triplet.parse()?,
        })
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.triplet)
    }
}
