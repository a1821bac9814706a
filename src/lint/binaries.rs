//! Rules over the built artifacts themselves.
//!
//! Architecture checks read COFF headers directly; export-table and
//! App-Container checks pattern-match dumpbin output. The text matchers are
//! split out as pure functions so they can be exercised with canned dumps.

use std::path::PathBuf;

use anyhow::{ensure, Result};

use crate::coff::{self, Architecture};
use crate::lint::report::{LintStatus, Reporter};
use crate::util::dumpbin::{DumpMode, Dumpbin};

/// Header line dumpbin prints above a non-empty export table.
const EXPORT_TABLE_MARKER: &str = "ordinal hint RVA      name";

/// Characteristics line dumpbin prints for store-capable images.
const APP_CONTAINER_MARKER: &str = "App Container";

/// A file paired with the architecture it was actually built for.
#[derive(Debug, Clone)]
pub struct FileArchitecture {
    pub file: PathBuf,
    pub actual_arch: Architecture,
}

fn print_invalid_architecture_files(
    expected_architecture: &str,
    mismatches: &[FileArchitecture],
    reporter: &mut Reporter,
) {
    reporter.warn("The following files were built for an incorrect architecture:");
    reporter.plain("");
    for mismatch in mismatches {
        reporter.plain(format!("    {}", mismatch.file.display()));
        reporter.plain(format!(
            "Expected {}, but was: {}",
            expected_architecture, mismatch.actual_arch
        ));
        reporter.plain("");
    }
}

/// Every `.lib` must be built for the triplet's architecture.
///
/// A malformed archive, or one mixing machine types, is fatal.
pub fn check_lib_architecture(
    expected_architecture: &str,
    files: &[PathBuf],
    reporter: &mut Reporter,
) -> Result<LintStatus> {
    let mut mismatches = Vec::new();

    for file in files {
        ensure!(
            file.extension().is_some_and(|ext| ext == "lib"),
            "The file extension was not .lib: {}",
            file.display()
        );
        let info = coff::read_lib_info(file)?;
        ensure!(
            info.machine_types.len() == 1,
            "Found more than 1 architecture in file {}",
            file.display()
        );

        let machine_type = *info.machine_types.iter().next().unwrap();
        let actual_arch = Architecture::of(machine_type);
        if !actual_arch.matches(expected_architecture) {
            mismatches.push(FileArchitecture {
                file: file.clone(),
                actual_arch,
            });
        }
    }

    if !mismatches.is_empty() {
        print_invalid_architecture_files(expected_architecture, &mismatches, reporter);
        return Ok(LintStatus::ErrorDetected);
    }

    Ok(LintStatus::Ok)
}

/// Every `.dll` must be built for the triplet's architecture.
pub fn check_dll_architecture(
    expected_architecture: &str,
    files: &[PathBuf],
    reporter: &mut Reporter,
) -> Result<LintStatus> {
    let mut mismatches = Vec::new();

    for file in files {
        ensure!(
            file.extension().is_some_and(|ext| ext == "dll"),
            "The file extension was not .dll: {}",
            file.display()
        );
        let info = coff::read_dll_info(file)?;
        let actual_arch = Architecture::of(info.machine_type);
        if !actual_arch.matches(expected_architecture) {
            mismatches.push(FileArchitecture {
                file: file.clone(),
                actual_arch,
            });
        }
    }

    if !mismatches.is_empty() {
        print_invalid_architecture_files(expected_architecture, &mismatches, reporter);
        return Ok(LintStatus::ErrorDetected);
    }

    Ok(LintStatus::Ok)
}

/// Whether an `/exports` dump shows a non-empty export table.
pub fn has_export_table(exports_dump: &str) -> bool {
    exports_dump.contains(EXPORT_TABLE_MARKER)
}

/// Whether a `/headers` dump shows the App Container characteristic.
pub fn has_app_container_bit(headers_dump: &str) -> bool {
    headers_dump.contains(APP_CONTAINER_MARKER)
}

/// A DLL without exports is almost always a build-script bug.
pub fn check_dll_exports(
    dumpbin: &Dumpbin,
    dlls: &[PathBuf],
    reporter: &mut Reporter,
) -> Result<LintStatus> {
    let mut dlls_with_no_exports = Vec::new();
    for dll in dlls {
        let output = dumpbin.dump(DumpMode::Exports, dll)?;
        if !has_export_table(&output) {
            dlls_with_no_exports.push(dll.clone());
        }
    }

    if !dlls_with_no_exports.is_empty() {
        reporter.warn("The following DLLs have no exports:");
        reporter.file_list(&dlls_with_no_exports);
        reporter.warn("DLLs without any exports are likely a bug in the build script.");
        return Ok(LintStatus::ErrorDetected);
    }

    Ok(LintStatus::Ok)
}

/// Store targets require the App Container bit on every DLL.
///
/// A no-op for every system class other than `uwp`.
pub fn check_uwp_bit_of_dlls(
    dumpbin: &Dumpbin,
    expected_system_name: &str,
    dlls: &[PathBuf],
    reporter: &mut Reporter,
) -> Result<LintStatus> {
    if expected_system_name != "uwp" {
        return Ok(LintStatus::Ok);
    }

    let mut dlls_without_bit = Vec::new();
    for dll in dlls {
        let output = dumpbin.dump(DumpMode::Headers, dll)?;
        if !has_app_container_bit(&output) {
            dlls_without_bit.push(dll.clone());
        }
    }

    if !dlls_without_bit.is_empty() {
        reporter.warn("The following DLLs do not have the App Container bit set:");
        reporter.file_list(&dlls_without_bit);
        reporter.warn("This bit is required for Windows Store apps.");
        return Ok(LintStatus::ErrorDetected);
    }

    Ok(LintStatus::Ok)
}

/// A static build must produce no DLLs at all.
pub fn check_no_dlls_present(dlls: &[PathBuf], reporter: &mut Reporter) -> LintStatus {
    if dlls.is_empty() {
        return LintStatus::Ok;
    }

    reporter
        .warn("DLLs should not be present in a static build, but the following DLLs were found:");
    reporter.file_list(dlls);
    LintStatus::ErrorDetected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    use crate::coff::MachineType;

    // Minimal PE image with the given machine type.
    fn write_pe(dir: &Path, name: &str, machine: u16) -> PathBuf {
        let mut bytes = vec![0u8; 0x40];
        bytes[0] = b'M';
        bytes[1] = b'Z';
        bytes[0x3c..0x40].copy_from_slice(&0x40u32.to_le_bytes());
        bytes.extend_from_slice(b"PE\0\0");
        bytes.extend_from_slice(&machine.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 18]);

        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    // Minimal archive holding one object member per machine type.
    fn write_archive(dir: &Path, name: &str, machines: &[u16]) -> PathBuf {
        let mut bytes = b"!<arch>\n".to_vec();
        for (i, machine) in machines.iter().enumerate() {
            let mut body = machine.to_le_bytes().to_vec();
            body.extend_from_slice(&[0u8; 18]);

            let mut header = vec![b' '; 60];
            let member_name = format!("{}.obj/", i);
            header[..member_name.len()].copy_from_slice(member_name.as_bytes());
            let size = body.len().to_string();
            header[48..48 + size.len()].copy_from_slice(size.as_bytes());
            header[58] = b'`';
            header[59] = b'\n';
            bytes.extend_from_slice(&header);
            bytes.extend_from_slice(&body);
        }
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_lib_architecture_mismatch_is_reported() {
        let tmp = TempDir::new().unwrap();
        let lib = write_archive(tmp.path(), "zlib.lib", &[MachineType::ARM.0]);

        let mut reporter = Reporter::buffered();
        let status = check_lib_architecture("x64", &[lib.clone()], &mut reporter).unwrap();
        assert_eq!(status, LintStatus::ErrorDetected);
        assert!(reporter.contains("built for an incorrect architecture"));
        assert!(reporter.contains(&format!("    {}", lib.display())));
        assert!(reporter.contains("Expected x64, but was: arm"));
    }

    #[test]
    fn test_lib_architecture_match_passes() {
        let tmp = TempDir::new().unwrap();
        let lib = write_archive(tmp.path(), "zlib.lib", &[MachineType::AMD64.0]);

        let mut reporter = Reporter::buffered();
        let status = check_lib_architecture("x64", &[lib], &mut reporter).unwrap();
        assert_eq!(status, LintStatus::Ok);
    }

    #[test]
    fn test_mixed_architecture_lib_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let lib = write_archive(
            tmp.path(),
            "mixed.lib",
            &[MachineType::I386.0, MachineType::AMD64.0],
        );

        let mut reporter = Reporter::buffered();
        let err = check_lib_architecture("x64", &[lib], &mut reporter).unwrap_err();
        assert!(err.to_string().contains("more than 1 architecture"));
    }

    #[test]
    fn test_dll_architecture_mismatch_is_reported() {
        let tmp = TempDir::new().unwrap();
        let dll = write_pe(tmp.path(), "zlib.dll", MachineType::ARM.0);

        let mut reporter = Reporter::buffered();
        let status = check_dll_architecture("x64", &[dll], &mut reporter).unwrap();
        assert_eq!(status, LintStatus::ErrorDetected);
        assert!(reporter.contains("Expected x64, but was: arm"));
    }

    #[test]
    fn test_dll_architecture_match_passes() {
        let tmp = TempDir::new().unwrap();
        let dll = write_pe(tmp.path(), "zlib.dll", MachineType::AMD64.0);

        let mut reporter = Reporter::buffered();
        let status = check_dll_architecture("x64", &[dll], &mut reporter).unwrap();
        assert_eq!(status, LintStatus::Ok);
    }

    #[test]
    fn test_wrong_extension_is_fatal_not_a_finding() {
        let mut reporter = Reporter::buffered();
        let err = check_dll_architecture("x64", &[PathBuf::from("zlib.lib")], &mut reporter)
            .unwrap_err();
        assert!(err.to_string().contains("was not .dll"));
        assert!(reporter.transcript().is_empty());
    }

    #[test]
    fn test_export_table_marker() {
        let with_exports = "\
  Section contains the following exports for zlib1.dll

    ordinal hint RVA      name

          1    0 00001000 adler32
";
        let without_exports = "  Summary\n        1000 .data\n";
        assert!(has_export_table(with_exports));
        assert!(!has_export_table(without_exports));
    }

    #[test]
    fn test_app_container_marker() {
        assert!(has_app_container_bit(
            "            8160 characteristics\n                   App Container\n"
        ));
        assert!(!has_app_container_bit("            2022 characteristics\n"));
    }

    // Fake dumpbin printing a fixed dump regardless of mode.
    fn fake_dumpbin(dir: &Path, output: &str) -> PathBuf {
        let script = dir.join("fake-dumpbin.sh");
        std::fs::write(&script, format!("#!/bin/sh\nprintf '{}\\n'\n", output)).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        script
    }

    #[test]
    fn test_dlls_without_exports_are_reported() {
        let tmp = TempDir::new().unwrap();
        // A summary-only dump: no export table header.
        let script = fake_dumpbin(tmp.path(), "  Summary\\n        1000 .data");
        let dumpbin = Dumpbin::with_exe(&script);
        let dlls = vec![PathBuf::from("bin/zlib1.dll")];

        let mut reporter = Reporter::buffered();
        let status = check_dll_exports(&dumpbin, &dlls, &mut reporter).unwrap();
        assert_eq!(status, LintStatus::ErrorDetected);
        assert!(reporter.contains("The following DLLs have no exports:"));
        assert!(reporter.contains("    bin/zlib1.dll"));
        assert!(reporter.contains("likely a bug in the build script"));
    }

    #[test]
    fn test_dlls_with_exports_pass() {
        let tmp = TempDir::new().unwrap();
        let script = fake_dumpbin(tmp.path(), "    ordinal hint RVA      name");
        let dumpbin = Dumpbin::with_exe(&script);
        let dlls = vec![PathBuf::from("bin/zlib1.dll")];

        let mut reporter = Reporter::buffered();
        let status = check_dll_exports(&dumpbin, &dlls, &mut reporter).unwrap();
        assert_eq!(status, LintStatus::Ok);
        assert!(reporter.transcript().is_empty());
    }

    #[test]
    fn test_uwp_dll_without_container_bit_is_reported() {
        let tmp = TempDir::new().unwrap();
        // Desktop-style characteristics: no App Container line.
        let script = fake_dumpbin(tmp.path(), "            2022 characteristics");
        let dumpbin = Dumpbin::with_exe(&script);
        let dlls = vec![PathBuf::from("bin/zlib1.dll")];

        let mut reporter = Reporter::buffered();
        let status = check_uwp_bit_of_dlls(&dumpbin, "uwp", &dlls, &mut reporter).unwrap();
        assert_eq!(status, LintStatus::ErrorDetected);
        assert!(reporter.contains("The following DLLs do not have the App Container bit set:"));
        assert!(reporter.contains("    bin/zlib1.dll"));
        assert!(reporter.contains("required for Windows Store apps"));
    }

    #[test]
    fn test_uwp_dll_with_container_bit_passes() {
        let tmp = TempDir::new().unwrap();
        let script = fake_dumpbin(
            tmp.path(),
            "            8160 characteristics\\n                   App Container",
        );
        let dumpbin = Dumpbin::with_exe(&script);
        let dlls = vec![PathBuf::from("bin/zlib1.dll")];

        let mut reporter = Reporter::buffered();
        let status = check_uwp_bit_of_dlls(&dumpbin, "uwp", &dlls, &mut reporter).unwrap();
        assert_eq!(status, LintStatus::Ok);
    }

    #[test]
    fn test_no_dlls_present() {
        let mut reporter = Reporter::buffered();
        assert_eq!(check_no_dlls_present(&[], &mut reporter), LintStatus::Ok);

        let dlls = vec![PathBuf::from("bin/zlib.dll")];
        assert_eq!(
            check_no_dlls_present(&dlls, &mut reporter),
            LintStatus::ErrorDetected
        );
        assert!(reporter.contains("should not be present in a static build"));
    }

    #[test]
    fn test_uwp_check_skipped_off_store_targets() {
        let dumpbin = Dumpbin::with_exe("false");
        let mut reporter = Reporter::buffered();
        // Never spawns the tool for non-uwp systems, so the failing exe
        // stand-in is not reached.
        let status = check_uwp_bit_of_dlls(
            &dumpbin,
            "windows",
            &[PathBuf::from("a.dll")],
            &mut reporter,
        )
        .unwrap();
        assert_eq!(status, LintStatus::Ok);
    }
}
