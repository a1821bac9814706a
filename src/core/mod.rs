//! Core data model: package specs, install layout, build descriptors.

pub mod build_info;
pub mod paths;
pub mod spec;

pub use build_info::{BuildInfo, BuildType, ConfigurationType, LinkageType};
pub use paths::PortPaths;
pub use spec::{PackageSpec, Triplet};
