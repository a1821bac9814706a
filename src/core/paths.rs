//! The directory layout validation operates over.

use std::path::{Path, PathBuf};

use crate::core::spec::PackageSpec;

/// Root directories of a vcpkg-style installation, plus the per-spec paths
/// derived from them.
#[derive(Debug, Clone)]
pub struct PortPaths {
    /// Installed package trees, one subdirectory per spec.
    pub packages: PathBuf,
    /// Per-port build trees (source checkouts live at `<name>/src`).
    pub buildtrees: PathBuf,
    /// Port recipes (`<name>/portfile.cmake`).
    pub ports: PathBuf,
}

impl PortPaths {
    pub fn new(
        packages: impl Into<PathBuf>,
        buildtrees: impl Into<PathBuf>,
        ports: impl Into<PathBuf>,
    ) -> Self {
        PortPaths {
            packages: packages.into(),
            buildtrees: buildtrees.into(),
            ports: ports.into(),
        }
    }

    /// Derive all three roots from a single vcpkg-style root directory.
    pub fn from_root(root: &Path) -> Self {
        PortPaths::new(
            root.join("packages"),
            root.join("buildtrees"),
            root.join("ports"),
        )
    }

    /// Root of the installed package tree for `spec`.
    pub fn package_dir(&self, spec: &PackageSpec) -> PathBuf {
        self.packages.join(spec.dir())
    }

    /// The BUILD_INFO descriptor written by the build step.
    pub fn build_info_file(&self, spec: &PackageSpec) -> PathBuf {
        self.package_dir(spec).join("BUILD_INFO")
    }

    /// Source checkout root under the port's build tree.
    pub fn buildtrees_src_dir(&self, spec: &PackageSpec) -> PathBuf {
        self.buildtrees.join(spec.name()).join("src")
    }

    /// The recipe file diagnostics point at when validation rejects.
    pub fn portfile(&self, spec: &PackageSpec) -> PathBuf {
        self.ports.join(spec.name()).join("portfile.cmake")
    }
}
