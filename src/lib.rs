//! Portlint - post-build validation for vcpkg-style package trees
//!
//! After a port builds and installs, this crate inspects the installed
//! tree and the produced binaries for structural and binary-compatibility
//! mistakes: misplaced files, missing licenses, wrong-architecture
//! artifacts, export-less DLLs, mismatched CRT linkage.

pub mod coff;
pub mod core;
pub mod lint;
pub mod util;

pub use core::{BuildInfo, LinkageType, PackageSpec, PortPaths, Triplet};
pub use lint::report::{LintStatus, Reporter};
pub use lint::{perform_all_checks, LintContext, Verdict};
pub use util::Config;
