//! Install-tree structure rules.
//!
//! Each rule inspects the installed package tree (and, for the copyright
//! rule, the port's build tree) and returns a soft verdict. Diagnostics
//! include copy-pasteable portfile snippets wherever a fix is mechanical.

use std::path::{Path, PathBuf};

use crate::lint::report::{LintStatus, Reporter};
use crate::lint::LintContext;
use crate::util::fs::{
    find_empty_directories, find_files_with_extension, find_matching, find_matching_with_depth,
    is_missing_or_empty,
};

const COPYRIGHT_CANDIDATE_NAMES: &[&str] = &["LICENSE", "LICENSE.txt", "COPYING"];

/// /include must exist and be non-empty.
pub fn check_include_directory(ctx: &LintContext, reporter: &mut Reporter) -> LintStatus {
    let include_dir = ctx.package_dir().join("include");
    if is_missing_or_empty(&include_dir) {
        reporter.warn(
            "The folder /include is empty. This indicates the library was not correctly installed.",
        );
        return LintStatus::ErrorDetected;
    }

    LintStatus::Ok
}

/// /debug/include may only hold compiled module interfaces.
pub fn check_debug_include_directory(ctx: &LintContext, reporter: &mut Reporter) -> LintStatus {
    let debug_include_dir = ctx.package_dir().join("debug").join("include");
    let files_found = find_matching(&debug_include_dir, |entry| {
        !entry.file_type().is_dir() && entry.path().extension().is_none_or(|ext| ext != "ifc")
    });

    if !files_found.is_empty() {
        reporter.warn(
            "Include files should not be duplicated into the /debug/include directory. \
             If this cannot be disabled in the project cmake, use",
        );
        reporter.plain("    file(REMOVE_RECURSE ${CURRENT_PACKAGES_DIR}/debug/include)");
        return LintStatus::ErrorDetected;
    }

    LintStatus::Ok
}

/// /debug/share must not exist with content.
pub fn check_debug_share_directory(ctx: &LintContext, reporter: &mut Reporter) -> LintStatus {
    let debug_share = ctx.package_dir().join("debug").join("share");
    if debug_share.exists() && !is_missing_or_empty(&debug_share) {
        reporter.warn("No files should be present in /debug/share");
        return LintStatus::ErrorDetected;
    }

    LintStatus::Ok
}

/// CMake configs belong in /cmake, not /lib/cmake.
pub fn check_lib_cmake_folder(ctx: &LintContext, reporter: &mut Reporter) -> LintStatus {
    let lib_cmake = ctx.package_dir().join("lib").join("cmake");
    if lib_cmake.exists() {
        reporter.warn("The /lib/cmake folder should be moved to just /cmake");
        return LintStatus::ErrorDetected;
    }

    LintStatus::Ok
}

/// CMake configs belong in /debug/cmake, not /debug/lib/cmake.
pub fn check_debug_lib_cmake_folder(ctx: &LintContext, reporter: &mut Reporter) -> LintStatus {
    let lib_cmake_debug = ctx.package_dir().join("debug").join("lib").join("cmake");
    if lib_cmake_debug.exists() {
        reporter.warn("The /debug/lib/cmake folder should be moved to just /debug/cmake");
        return LintStatus::ErrorDetected;
    }

    LintStatus::Ok
}

/// `.cmake` files must live under /share/<name>.
pub fn check_misplaced_cmake_files(ctx: &LintContext, reporter: &mut Reporter) -> LintStatus {
    let package_dir = ctx.package_dir();
    let mut misplaced = Vec::new();
    for dir in [
        package_dir.join("cmake"),
        package_dir.join("debug").join("cmake"),
        package_dir.join("lib").join("cmake"),
        package_dir.join("debug").join("lib").join("cmake"),
    ] {
        misplaced.extend(find_files_with_extension(&dir, ".cmake"));
    }
    misplaced.sort();

    if !misplaced.is_empty() {
        let name = ctx.spec.name();
        reporter.warn(format!(
            "The following cmake files were found outside /share/{}. Please place cmake files in /share/{}.",
            name, name
        ));
        reporter.file_list(&misplaced);
        return LintStatus::ErrorDetected;
    }

    LintStatus::Ok
}

/// DLLs belong in /bin, never in /lib.
pub fn check_dlls_in_lib_dirs(ctx: &LintContext, reporter: &mut Reporter) -> LintStatus {
    let package_dir = ctx.package_dir();
    let mut dlls = find_files_with_extension(&package_dir.join("lib"), ".dll");
    dlls.extend(find_files_with_extension(
        &package_dir.join("debug").join("lib"),
        ".dll",
    ));
    dlls.sort();

    if !dlls.is_empty() {
        reporter.warn(
            "The following dlls were found in /lib and /debug/lib. \
             Please move them to /bin or /debug/bin, respectively.",
        );
        reporter.file_list(&dlls);
        return LintStatus::ErrorDetected;
    }

    LintStatus::Ok
}

/// The license must be installed at /share/<name>/copyright.
///
/// When it is missing, the port's source checkout is scanned (one level
/// deep) for the usual license filenames; a single candidate yields a
/// ready-to-paste relocation snippet.
pub fn check_copyright_file(ctx: &LintContext, reporter: &mut Reporter) -> LintStatus {
    let name = ctx.spec.name();
    let package_dir = ctx.package_dir();
    let copyright_file = package_dir.join("share").join(name).join("copyright");
    if copyright_file.exists() {
        return LintStatus::Ok;
    }

    let buildtrees_dir = ctx.paths.buildtrees.join(name);
    let src_dir = ctx.paths.buildtrees_src_dir(&ctx.spec);
    let candidates = find_matching_with_depth(&src_dir, 2, |entry| {
        !entry.file_type().is_dir()
            && COPYRIGHT_CANDIDATE_NAMES
                .iter()
                .any(|candidate| entry.file_name() == *candidate)
    });

    reporter.warn(format!(
        "The software license must be available at ${{CURRENT_PACKAGES_DIR}}/share/{}/copyright .",
        name
    ));

    if let [found_file] = candidates.as_slice() {
        let relative = found_file
            .strip_prefix(&buildtrees_dir)
            .unwrap_or(found_file);
        let filename = found_file
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        reporter.plain("");
        reporter.plain(format!(
            "    file(COPY ${{CURRENT_BUILDTREES_DIR}}/{} DESTINATION ${{CURRENT_PACKAGES_DIR}}/share/{})",
            relative.display(),
            name
        ));
        reporter.plain(format!(
            "    file(RENAME ${{CURRENT_PACKAGES_DIR}}/share/{}/{} ${{CURRENT_PACKAGES_DIR}}/share/{}/copyright)",
            name, filename, name
        ));
        return LintStatus::ErrorDetected;
    }

    if candidates.len() > 1 {
        reporter.warn("The following files are potential copyright files:");
        reporter.file_list(&candidates);
    }

    reporter.plain(format!(
        "    {}/share/{}/copyright",
        package_dir.display(),
        name
    ));

    LintStatus::ErrorDetected
}

/// Executables are not valid distribution targets.
pub fn check_exes(ctx: &LintContext, reporter: &mut Reporter) -> LintStatus {
    let package_dir = ctx.package_dir();
    let mut exes = find_files_with_extension(&package_dir.join("bin"), ".exe");
    exes.extend(find_files_with_extension(
        &package_dir.join("debug").join("bin"),
        ".exe",
    ));
    exes.sort();

    if !exes.is_empty() {
        reporter.warn(
            "The following EXEs were found in /bin and /debug/bin. \
             EXEs are not valid distribution targets.",
        );
        reporter.file_list(&exes);
        return LintStatus::ErrorDetected;
    }

    LintStatus::Ok
}

/// Debug and release must ship the same number of binaries.
pub fn check_matching_debug_and_release_binaries(
    debug_binaries: &[PathBuf],
    release_binaries: &[PathBuf],
    reporter: &mut Reporter,
) -> LintStatus {
    let debug_count = debug_binaries.len();
    let release_count = release_binaries.len();
    if debug_count == release_count {
        return LintStatus::Ok;
    }

    reporter.warn(format!(
        "Mismatching number of debug and release binaries. Found {} for debug but {} for release.",
        debug_count, release_count
    ));
    reporter.plain("Debug binaries");
    reporter.file_list(debug_binaries);
    reporter.plain("Release binaries");
    reporter.file_list(release_binaries);

    if debug_count == 0 {
        reporter.warn("Debug binaries were not found");
    }
    if release_count == 0 {
        reporter.warn("Release binaries were not found");
    }
    reporter.plain("");

    LintStatus::ErrorDetected
}

/// A static build must not install /bin or /debug/bin at all.
pub fn check_bin_folders_absent(ctx: &LintContext, reporter: &mut Reporter) -> LintStatus {
    let package_dir = ctx.package_dir();
    let bin = package_dir.join("bin");
    let debug_bin = package_dir.join("debug").join("bin");

    if !bin.exists() && !debug_bin.exists() {
        return LintStatus::Ok;
    }

    if bin.exists() {
        reporter.warn(format!(
            r"There should be no bin\ directory in a static build, but {} is present.",
            bin.display()
        ));
    }
    if debug_bin.exists() {
        reporter.warn(format!(
            r"There should be no debug\bin\ directory in a static build, but {} is present.",
            debug_bin.display()
        ));
    }

    reporter.warn(
        r"If the creation of bin\ and/or debug\bin\ cannot be disabled, use this in the portfile to remove them",
    );
    reporter.plain("");
    reporter.plain("    if(VCPKG_LIBRARY_LINKAGE STREQUAL static)");
    reporter.plain(
        "        file(REMOVE_RECURSE ${CURRENT_PACKAGES_DIR}/bin ${CURRENT_PACKAGES_DIR}/debug/bin)",
    );
    reporter.plain("    endif()");
    reporter.plain("");

    LintStatus::ErrorDetected
}

/// No directory under the package may be empty.
pub fn check_no_empty_folders(dir: &Path, reporter: &mut Reporter) -> LintStatus {
    let empty_directories = find_empty_directories(dir);

    if !empty_directories.is_empty() {
        reporter.warn(format!(
            "There should be no empty directories in {}",
            dir.display()
        ));
        reporter.plain("The following empty directories were found: ");
        reporter.file_list(&empty_directories);
        reporter.warn(
            "If a directory should be populated but is not, this might indicate an error in the portfile.\n\
             If the directories are not needed and their creation cannot be disabled, \
             use something like this in the portfile to remove them",
        );
        reporter.plain("");
        reporter.plain(
            "    file(REMOVE_RECURSE ${CURRENT_PACKAGES_DIR}/a/dir ${CURRENT_PACKAGES_DIR}/some/other/dir)",
        );
        reporter.plain("");
        return LintStatus::ErrorDetected;
    }

    LintStatus::Ok
}

/// Library directories must stay flat. Disabled by default; see
/// `ExperimentalConfig::lib_subdirectory_check`.
pub fn check_no_subdirectories(dir: &Path, reporter: &mut Reporter) -> LintStatus {
    let subdirectories = find_matching(dir, |entry| entry.file_type().is_dir());

    if !subdirectories.is_empty() {
        reporter.warn(format!(
            "Directory {} should have no subdirectories",
            dir.display()
        ));
        reporter.plain("The following subdirectories were found: ");
        reporter.file_list(&subdirectories);
        return LintStatus::ErrorDetected;
    }

    LintStatus::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    use crate::core::{PackageSpec, PortPaths};
    use crate::util::config::Config;

    fn context(tmp: &TempDir) -> LintContext {
        let spec: PackageSpec = "zlib:x64-windows".parse().unwrap();
        LintContext {
            spec,
            paths: PortPaths::from_root(tmp.path()),
            config: Config::default(),
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_empty_include_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        fs::create_dir_all(ctx.package_dir().join("include")).unwrap();

        let mut reporter = Reporter::buffered();
        let status = check_include_directory(&ctx, &mut reporter);
        assert_eq!(status, LintStatus::ErrorDetected);
        assert!(reporter.contains("library was not correctly installed"));
    }

    #[test]
    fn test_populated_include_passes() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        touch(&ctx.package_dir().join("include").join("zlib.h"));

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_include_directory(&ctx, &mut reporter),
            LintStatus::Ok
        );
        assert!(reporter.transcript().is_empty());
    }

    #[test]
    fn test_debug_include_ignores_module_interfaces() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        touch(&ctx.package_dir().join("debug/include/zlib.ifc"));

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_debug_include_directory(&ctx, &mut reporter),
            LintStatus::Ok
        );

        touch(&ctx.package_dir().join("debug/include/zlib.h"));
        assert_eq!(
            check_debug_include_directory(&ctx, &mut reporter),
            LintStatus::ErrorDetected
        );
        assert!(reporter.contains("file(REMOVE_RECURSE ${CURRENT_PACKAGES_DIR}/debug/include)"));
    }

    #[test]
    fn test_debug_share_must_be_absent_or_empty() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_debug_share_directory(&ctx, &mut reporter),
            LintStatus::Ok
        );

        touch(&ctx.package_dir().join("debug/share/zlib/copyright"));
        assert_eq!(
            check_debug_share_directory(&ctx, &mut reporter),
            LintStatus::ErrorDetected
        );
    }

    #[test]
    fn test_lib_cmake_folders() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        fs::create_dir_all(ctx.package_dir().join("lib/cmake")).unwrap();

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_lib_cmake_folder(&ctx, &mut reporter),
            LintStatus::ErrorDetected
        );
        assert_eq!(
            check_debug_lib_cmake_folder(&ctx, &mut reporter),
            LintStatus::Ok
        );
        assert!(reporter.contains("/lib/cmake folder should be moved"));
    }

    #[test]
    fn test_misplaced_cmake_files() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        touch(&ctx.package_dir().join("lib/cmake/zlib/zlibConfig.cmake"));

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_misplaced_cmake_files(&ctx, &mut reporter),
            LintStatus::ErrorDetected
        );
        assert!(reporter.contains("Please place cmake files in /share/zlib."));
        assert!(reporter.contains("zlibConfig.cmake"));
    }

    #[test]
    fn test_dlls_in_lib_dirs() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        touch(&ctx.package_dir().join("debug/lib/zlibd.dll"));

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_dlls_in_lib_dirs(&ctx, &mut reporter),
            LintStatus::ErrorDetected
        );
        assert!(reporter.contains("move them to /bin or /debug/bin"));
    }

    #[test]
    fn test_copyright_single_candidate_gets_relocation_snippet() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        fs::create_dir_all(ctx.package_dir()).unwrap();
        touch(&tmp.path().join("buildtrees/zlib/src/zlib-1.3/LICENSE.txt"));

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_copyright_file(&ctx, &mut reporter),
            LintStatus::ErrorDetected
        );
        assert!(reporter.contains(
            "file(COPY ${CURRENT_BUILDTREES_DIR}/src/zlib-1.3/LICENSE.txt \
             DESTINATION ${CURRENT_PACKAGES_DIR}/share/zlib)"
        ));
        assert!(reporter.contains(
            "file(RENAME ${CURRENT_PACKAGES_DIR}/share/zlib/LICENSE.txt \
             ${CURRENT_PACKAGES_DIR}/share/zlib/copyright)"
        ));
    }

    #[test]
    fn test_copyright_multiple_candidates_are_listed() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        fs::create_dir_all(ctx.package_dir()).unwrap();
        touch(&tmp.path().join("buildtrees/zlib/src/LICENSE"));
        touch(&tmp.path().join("buildtrees/zlib/src/COPYING"));

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_copyright_file(&ctx, &mut reporter),
            LintStatus::ErrorDetected
        );
        assert!(reporter.contains("potential copyright files"));
        assert!(reporter.contains("LICENSE"));
        assert!(reporter.contains("COPYING"));
    }

    #[test]
    fn test_copyright_candidates_only_one_level_deep() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        fs::create_dir_all(ctx.package_dir()).unwrap();
        touch(&tmp.path().join("buildtrees/zlib/src/pkg/vendor/deep/LICENSE"));

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_copyright_file(&ctx, &mut reporter),
            LintStatus::ErrorDetected
        );
        // Too deep to be a candidate, so no relocation snippet.
        assert!(!reporter.contains("file(COPY"));
    }

    #[test]
    fn test_copyright_present_passes() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        touch(&ctx.package_dir().join("share/zlib/copyright"));

        let mut reporter = Reporter::buffered();
        assert_eq!(check_copyright_file(&ctx, &mut reporter), LintStatus::Ok);
    }

    #[test]
    fn test_exes_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        touch(&ctx.package_dir().join("bin/minigzip.exe"));

        let mut reporter = Reporter::buffered();
        assert_eq!(check_exes(&ctx, &mut reporter), LintStatus::ErrorDetected);
        assert!(reporter.contains("EXEs are not valid distribution targets"));
    }

    #[test]
    fn test_matching_binary_counts() {
        let debug = vec![PathBuf::from("debug/bin/a.dll"), PathBuf::from("debug/bin/b.dll")];
        let release = vec![PathBuf::from("bin/a.dll")];

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_matching_debug_and_release_binaries(&debug, &release, &mut reporter),
            LintStatus::ErrorDetected
        );
        assert!(reporter.contains("Found 2 for debug but 1 for release."));

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_matching_debug_and_release_binaries(&debug, &debug, &mut reporter),
            LintStatus::Ok
        );
    }

    #[test]
    fn test_zero_counts_get_named() {
        let release = vec![PathBuf::from("bin/a.dll")];

        let mut reporter = Reporter::buffered();
        check_matching_debug_and_release_binaries(&[], &release, &mut reporter);
        assert!(reporter.contains("Debug binaries were not found"));
    }

    #[test]
    fn test_bin_folders_absent_in_static_build() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_bin_folders_absent(&ctx, &mut reporter),
            LintStatus::Ok
        );

        fs::create_dir_all(ctx.package_dir().join("debug/bin")).unwrap();
        assert_eq!(
            check_bin_folders_absent(&ctx, &mut reporter),
            LintStatus::ErrorDetected
        );
        assert!(reporter.contains("file(REMOVE_RECURSE ${CURRENT_PACKAGES_DIR}/bin"));
    }

    #[test]
    fn test_no_empty_folders() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("lib/empty")).unwrap();
        touch(&tmp.path().join("include/zlib.h"));

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_no_empty_folders(tmp.path(), &mut reporter),
            LintStatus::ErrorDetected
        );
        assert!(reporter.contains("There should be no empty directories"));
    }

    #[test]
    fn test_no_subdirectories() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("lib/zlib.lib"));

        let mut reporter = Reporter::buffered();
        assert_eq!(
            check_no_subdirectories(&tmp.path().join("lib"), &mut reporter),
            LintStatus::Ok
        );

        touch(&tmp.path().join("lib/manual-link/zlib.lib"));
        assert_eq!(
            check_no_subdirectories(&tmp.path().join("lib"), &mut reporter),
            LintStatus::ErrorDetected
        );
    }
}
