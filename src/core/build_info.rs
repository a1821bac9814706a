//! The build-info descriptor written by the build step.
//!
//! After a port builds and installs, the build step persists a small
//! `Key: value` record (`BUILD_INFO`) declaring what kind of artifacts it
//! intended to produce. Validation reads it once per run and branches on it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use thiserror::Error;

/// Error parsing a BUILD_INFO record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildInfoParseError {
    #[error("line {0} is not a `Key: value` pair")]
    MalformedLine(usize),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

/// Declared linkage of a package's artifacts.
///
/// An unrecognized value is carried verbatim rather than guessed at; for
/// `LibraryLinkage` it is a lint finding in its own right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkageType {
    Dynamic,
    Static,
    Unknown(String),
}

impl LinkageType {
    fn parse(s: &str) -> Self {
        match s {
            "dynamic" => LinkageType::Dynamic,
            "static" => LinkageType::Static,
            other => LinkageType::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for LinkageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkageType::Dynamic => write!(f, "dynamic"),
            LinkageType::Static => write!(f, "static"),
            LinkageType::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// Build configuration half of a [`BuildType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationType {
    Debug,
    Release,
}

impl fmt::Display for ConfigurationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationType::Debug => write!(f, "debug"),
            ConfigurationType::Release => write!(f, "release"),
        }
    }
}

/// One of the four runtime-linkage buckets: configuration crossed with
/// CRT linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildType {
    DebugStatic,
    DebugDynamic,
    ReleaseStatic,
    ReleaseDynamic,
}

impl BuildType {
    /// Combine a configuration with a definite CRT linkage.
    ///
    /// Fails on an unknown linkage; a build descriptor that cannot name its
    /// CRT linkage cannot be checked against one.
    pub fn value_of(config: ConfigurationType, crt_linkage: &LinkageType) -> Result<Self> {
        match (config, crt_linkage) {
            (ConfigurationType::Debug, LinkageType::Static) => Ok(BuildType::DebugStatic),
            (ConfigurationType::Debug, LinkageType::Dynamic) => Ok(BuildType::DebugDynamic),
            (ConfigurationType::Release, LinkageType::Static) => Ok(BuildType::ReleaseStatic),
            (ConfigurationType::Release, LinkageType::Dynamic) => Ok(BuildType::ReleaseDynamic),
            (_, LinkageType::Unknown(raw)) => {
                anyhow::bail!("unknown CRTLinkage value: [ {} ]", raw)
            }
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildType::DebugStatic => write!(f, "debug static"),
            BuildType::DebugDynamic => write!(f, "debug dynamic"),
            BuildType::ReleaseStatic => write!(f, "release static"),
            BuildType::ReleaseDynamic => write!(f, "release dynamic"),
        }
    }
}

/// Intended linkage declared by the build step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub library_linkage: LinkageType,
    pub crt_linkage: LinkageType,
}

impl BuildInfo {
    /// Read and parse the BUILD_INFO file at `path`.
    ///
    /// A missing or malformed file is fatal; validation cannot choose a
    /// linkage branch without it.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read build info: {}", path.display()))?;
        contents
            .parse()
            .with_context(|| format!("failed to parse build info: {}", path.display()))
    }
}

impl FromStr for BuildInfo {
    type Err = BuildInfoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut library_linkage = None;
        let mut crt_linkage = None;

        for (idx, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or(BuildInfoParseError::MalformedLine(idx + 1))?;
            match key.trim() {
                "LibraryLinkage" => library_linkage = Some(LinkageType::parse(value.trim())),
                "CRTLinkage" => crt_linkage = Some(LinkageType::parse(value.trim())),
                // Unknown keys are tolerated; the build step records more
                // than validation consumes.
                _ => {}
            }
        }

        Ok(BuildInfo {
            library_linkage: library_linkage
                .ok_or(BuildInfoParseError::MissingField("LibraryLinkage"))?,
            crt_linkage: crt_linkage.ok_or(BuildInfoParseError::MissingField("CRTLinkage"))?,
        })
    }
}
