//! Bridge to the `dumpbin.exe` binary-inspection utility.
//!
//! Rules that need export tables, image header flags, or linker directives
//! go through here. The bridge spawns one process per artifact, requires a
//! zero exit status (a failing tool means the environment is broken, not
//! that the package is bad) and hands the full stdout back as opaque text
//! for the caller to pattern-match.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::util::config::Config;
use crate::util::process::{find_executable, ProcessBuilder};

/// Inspection modes understood by dumpbin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpMode {
    /// `/exports`: the export table of a DLL.
    Exports,
    /// `/headers`: the image and optional headers.
    Headers,
    /// `/directives`: the linker directives of an object or archive.
    Directives,
}

impl DumpMode {
    fn flag(self) -> &'static str {
        match self {
            DumpMode::Exports => "/exports",
            DumpMode::Headers => "/headers",
            DumpMode::Directives => "/directives",
        }
    }
}

/// A located dumpbin executable.
#[derive(Debug, Clone)]
pub struct Dumpbin {
    exe: PathBuf,
}

impl Dumpbin {
    /// Locate dumpbin: config override, then `DUMPBIN` env var, then PATH,
    /// then the Visual Studio common-tools layout.
    pub fn locate(config: &Config) -> Result<Self> {
        if let Some(path) = &config.tools.dumpbin {
            return Ok(Dumpbin { exe: path.clone() });
        }

        if let Some(path) = std::env::var_os("DUMPBIN") {
            return Ok(Dumpbin {
                exe: PathBuf::from(path),
            });
        }

        if let Some(path) = find_executable("dumpbin") {
            tracing::debug!("found dumpbin in PATH: {}", path.display());
            return Ok(Dumpbin { exe: path });
        }

        if let Some(tools_dir) = std::env::var_os("VS140COMNTOOLS") {
            let exe = PathBuf::from(tools_dir)
                .join("..")
                .join("..")
                .join("VC")
                .join("bin")
                .join("dumpbin.exe");
            if exe.exists() {
                return Ok(Dumpbin { exe });
            }
        }

        bail!(
            "could not locate dumpbin.exe; set [tools] dumpbin in portlint.toml \
             or the DUMPBIN environment variable"
        )
    }

    /// Construct a bridge around a known executable path. Used by tests.
    pub fn with_exe(exe: impl Into<PathBuf>) -> Self {
        Dumpbin { exe: exe.into() }
    }

    /// Run one inspection pass against `artifact` and capture its stdout.
    ///
    /// A non-zero exit status aborts the whole validation run.
    pub fn dump(&self, mode: DumpMode, artifact: &Path) -> Result<String> {
        let output = ProcessBuilder::new(&self.exe)
            .arg(mode.flag())
            .arg(artifact)
            .exec_and_check()
            .with_context(|| format!("dumpbin failed on {}", artifact.display()))?;

        String::from_utf8(output.stdout)
            .with_context(|| format!("dumpbin produced non-UTF-8 output for {}", artifact.display()))
    }
}
