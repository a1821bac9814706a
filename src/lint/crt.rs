//! CRT-linkage classification of static libraries.
//!
//! Each `.lib` is classified into one of the four runtime-linkage buckets
//! by matching its `/directives` dump against four independent signatures.
//! Matching zero or several signatures is itself an error condition, never
//! a silent tie-break. Disabled by default; see
//! `ExperimentalConfig::crt_linkage_check`.

use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::core::BuildType;
use crate::lint::report::{LintStatus, Reporter};
use crate::util::dumpbin::{DumpMode, Dumpbin};

static DEBUG_STATIC_CRT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/DEFAULTLIB:LIBCMTD").unwrap());
static DEBUG_DYNAMIC_CRT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/DEFAULTLIB:MSVCRTD").unwrap());
static RELEASE_STATIC_CRT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/DEFAULTLIB:LIBCMT[^D]").unwrap());
static RELEASE_DYNAMIC_CRT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/DEFAULTLIB:MSVCRT[^D]").unwrap());

/// Outcome of matching one directives dump against the four signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrtDetection {
    /// No signature matched.
    Undetectable,
    /// More than one signature matched.
    Ambiguous,
    /// Exactly one signature matched.
    Classified(BuildType),
}

/// Classify a `/directives` dump. Pure; testable with canned text.
pub fn classify_crt(directives_dump: &str) -> CrtDetection {
    let found = [
        (BuildType::DebugStatic, &*DEBUG_STATIC_CRT),
        (BuildType::DebugDynamic, &*DEBUG_DYNAMIC_CRT),
        (BuildType::ReleaseStatic, &*RELEASE_STATIC_CRT),
        (BuildType::ReleaseDynamic, &*RELEASE_DYNAMIC_CRT),
    ]
    .into_iter()
    .filter(|(_, signature)| signature.is_match(directives_dump))
    .map(|(build_type, _)| build_type)
    .collect::<Vec<_>>();

    match found.as_slice() {
        [] => CrtDetection::Undetectable,
        [build_type] => CrtDetection::Classified(*build_type),
        _ => CrtDetection::Ambiguous,
    }
}

/// Check that every lib links the CRT the build descriptor declared.
///
/// Three error buckets report independently: undetectable, ambiguous, and
/// classified-but-mismatched (one list per wrong bucket).
pub fn check_crt_linkage_of_libs(
    dumpbin: &Dumpbin,
    expected_build_type: BuildType,
    libs: &[PathBuf],
    reporter: &mut Reporter,
) -> Result<LintStatus> {
    let mut output_status = LintStatus::Ok;

    let mut libs_with_no_crts = Vec::new();
    let mut libs_with_multiple_crts = Vec::new();
    let mut groups: [(BuildType, Vec<PathBuf>); 4] = [
        (BuildType::DebugStatic, Vec::new()),
        (BuildType::DebugDynamic, Vec::new()),
        (BuildType::ReleaseStatic, Vec::new()),
        (BuildType::ReleaseDynamic, Vec::new()),
    ];

    for lib in libs {
        let output = dumpbin.dump(DumpMode::Directives, lib)?;
        match classify_crt(&output) {
            CrtDetection::Undetectable => libs_with_no_crts.push(lib.clone()),
            CrtDetection::Ambiguous => libs_with_multiple_crts.push(lib.clone()),
            CrtDetection::Classified(build_type) => {
                let group = groups
                    .iter_mut()
                    .find(|(candidate, _)| *candidate == build_type)
                    .expect("every build type has a group");
                group.1.push(lib.clone());
            }
        }
    }

    if !libs_with_no_crts.is_empty() {
        reporter.warn("Could not detect the crt linkage in the following libs:");
        reporter.file_list(&libs_with_no_crts);
        output_status = LintStatus::ErrorDetected;
    }

    if !libs_with_multiple_crts.is_empty() {
        reporter.warn("Detected multiple crt linkages for the following libs:");
        reporter.file_list(&libs_with_multiple_crts);
        output_status = LintStatus::ErrorDetected;
    }

    for (build_type, files) in &groups {
        if !files.is_empty() && *build_type != expected_build_type {
            reporter.warn(format!(
                "Expected {} crt linkage, but the following libs had {} crt linkage:",
                expected_build_type, build_type
            ));
            reporter.file_list(files);
            output_status = LintStatus::ErrorDetected;
        }
    }

    if output_status == LintStatus::ErrorDetected {
        reporter.warn("To inspect the lib files, use:\n    dumpbin.exe /directives mylibfile.lib");
    }

    Ok(output_status)
}
