//! The post-build lint pass.
//!
//! Runs a fixed catalogue of independent rules against one installed
//! package: universal structure rules first, then the rules for the
//! declared library linkage, then a closing sweep. Rule verdicts fold into
//! a run-local error count; the caller decides what a rejection means for
//! the surrounding build.
//!
//! Two error channels never mix: rule findings accumulate and always let
//! the remaining rules run, while environment failures (malformed
//! binaries, a failing dumpbin) propagate as `anyhow::Error` and abort the
//! pass with no verdict.

pub mod binaries;
pub mod crt;
pub mod report;
pub mod structure;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::{BuildInfo, BuildType, ConfigurationType, LinkageType, PackageSpec, PortPaths};
use crate::lint::report::{total_errors, LintStatus, Reporter};
use crate::util::config::Config;
use crate::util::dumpbin::Dumpbin;
use crate::util::fs::find_files_with_extension;

/// Everything a rule may consult: the spec under validation, the directory
/// layout, and the run configuration.
pub struct LintContext {
    pub spec: PackageSpec,
    pub paths: PortPaths,
    pub config: Config,
}

impl LintContext {
    /// Root of the installed tree being validated.
    pub fn package_dir(&self) -> PathBuf {
        self.paths.package_dir(&self.spec)
    }
}

/// Terminal outcome of a lint pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected { error_count: usize },
}

/// Universal rules with the uniform shape, in report order.
const STRUCTURE_RULES: &[fn(&LintContext, &mut Reporter) -> LintStatus] = &[
    structure::check_include_directory,
    structure::check_debug_include_directory,
    structure::check_debug_share_directory,
    structure::check_lib_cmake_folder,
    structure::check_misplaced_cmake_files,
    structure::check_debug_lib_cmake_folder,
    structure::check_dlls_in_lib_dirs,
    structure::check_copyright_file,
    structure::check_exes,
];

/// Run every applicable rule once and fold the verdicts.
///
/// Emits the full diagnostic transcript to `reporter` as rules run, plus
/// the rejection summary naming the error count and the portfile to fix.
pub fn perform_all_checks(ctx: &LintContext, reporter: &mut Reporter) -> Result<Verdict> {
    reporter.plain("-- Performing post-build validation");

    let build_info_path = ctx.paths.build_info_file(&ctx.spec);
    let build_info = BuildInfo::read(&build_info_path)?;
    tracing::debug!(
        "build info for {}: library={}, crt={}",
        ctx.spec,
        build_info.library_linkage,
        build_info.crt_linkage
    );

    let package_dir = ctx.package_dir();
    let mut statuses: Vec<LintStatus> = Vec::new();

    for rule in STRUCTURE_RULES {
        statuses.push(rule(ctx, reporter));
    }

    let debug_libs = find_files_with_extension(&package_dir.join("debug").join("lib"), ".lib");
    let release_libs = find_files_with_extension(&package_dir.join("lib"), ".lib");

    statuses.push(structure::check_matching_debug_and_release_binaries(
        &debug_libs,
        &release_libs,
        reporter,
    ));

    let libs: Vec<PathBuf> = debug_libs
        .iter()
        .chain(release_libs.iter())
        .cloned()
        .collect();
    statuses.push(binaries::check_lib_architecture(
        ctx.spec.target_triplet().architecture(),
        &libs,
        reporter,
    )?);

    match &build_info.library_linkage {
        LinkageType::Dynamic => {
            let debug_dlls =
                find_files_with_extension(&package_dir.join("debug").join("bin"), ".dll");
            let release_dlls = find_files_with_extension(&package_dir.join("bin"), ".dll");

            statuses.push(structure::check_matching_debug_and_release_binaries(
                &debug_dlls,
                &release_dlls,
                reporter,
            ));

            let dlls: Vec<PathBuf> = debug_dlls
                .iter()
                .chain(release_dlls.iter())
                .cloned()
                .collect();

            // The tool is only resolved once something actually needs
            // inspecting, so a dll-less tree validates on hosts without it.
            if !dlls.is_empty() {
                let dumpbin = Dumpbin::locate(&ctx.config)?;
                statuses.push(binaries::check_dll_exports(&dumpbin, &dlls, reporter)?);
                statuses.push(binaries::check_uwp_bit_of_dlls(
                    &dumpbin,
                    ctx.spec.target_triplet().system(),
                    &dlls,
                    reporter,
                )?);
            }

            statuses.push(binaries::check_dll_architecture(
                ctx.spec.target_triplet().architecture(),
                &dlls,
                reporter,
            )?);
        }
        LinkageType::Static => {
            let dlls = find_files_with_extension(&package_dir, ".dll");
            statuses.push(binaries::check_no_dlls_present(&dlls, reporter));
            statuses.push(structure::check_bin_folders_absent(ctx, reporter));

            if ctx.config.experimental.crt_linkage_check && !libs.is_empty() {
                let dumpbin = Dumpbin::locate(&ctx.config)?;
                let expected_debug =
                    BuildType::value_of(ConfigurationType::Debug, &build_info.crt_linkage)
                        .context("cannot check crt linkage")?;
                let expected_release =
                    BuildType::value_of(ConfigurationType::Release, &build_info.crt_linkage)
                        .context("cannot check crt linkage")?;
                statuses.push(crt::check_crt_linkage_of_libs(
                    &dumpbin,
                    expected_debug,
                    &debug_libs,
                    reporter,
                )?);
                statuses.push(crt::check_crt_linkage_of_libs(
                    &dumpbin,
                    expected_release,
                    &release_libs,
                    reporter,
                )?);
            }
        }
        LinkageType::Unknown(raw) => {
            reporter.warn(format!("Unknown library_linkage architecture: [ {} ]", raw));
            statuses.push(LintStatus::ErrorDetected);
        }
    }

    if ctx.config.experimental.lib_subdirectory_check {
        statuses.push(structure::check_no_subdirectories(
            &package_dir.join("lib"),
            reporter,
        ));
        statuses.push(structure::check_no_subdirectories(
            &package_dir.join("debug").join("lib"),
            reporter,
        ));
    }

    statuses.push(structure::check_no_empty_folders(&package_dir, reporter));

    let error_count = total_errors(statuses);
    if error_count != 0 {
        let portfile = ctx.paths.portfile(&ctx.spec);
        reporter.error(format!(
            "Found {} error(s). Please correct the portfile:\n    {}",
            error_count,
            portfile.display()
        ));
        return Ok(Verdict::Rejected { error_count });
    }

    reporter.plain("-- Performing post-build validation done");
    Ok(Verdict::Accepted)
}
