//! COFF header inspection for built artifacts.
//!
//! Reads just enough of a PE image or a static archive to attribute a
//! target machine type to it, without spawning any external tool. A file
//! that is not well-formed for its kind is a fatal condition for the
//! validation run, never a lint finding.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use thiserror::Error;

const PE_SIGNATURE_OFFSET_OFFSET: u64 = 0x3c;
const ARCHIVE_MAGIC: &[u8] = b"!<arch>\n";
const ARCHIVE_MEMBER_HEADER_LEN: usize = 60;

/// Malformed-artifact errors. These abort the run.
#[derive(Debug, Error)]
pub enum CoffError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a PE image (missing MZ signature)")]
    MissingDosSignature(PathBuf),
    #[error("{0} is not a PE image (missing PE signature)")]
    MissingPeSignature(PathBuf),
    #[error("{0} is not a static library archive (missing !<arch> signature)")]
    MissingArchiveSignature(PathBuf),
    #[error("{path} has a malformed archive member at offset {offset}")]
    MalformedArchiveMember { path: PathBuf, offset: usize },
}

/// A raw machine-type code from a COFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MachineType(pub u16);

impl MachineType {
    pub const UNKNOWN: MachineType = MachineType(0x0);
    pub const I386: MachineType = MachineType(0x14c);
    pub const IA64: MachineType = MachineType(0x200);
    pub const ARM: MachineType = MachineType(0x1c0);
    pub const ARMNT: MachineType = MachineType(0x1c4);
    pub const AMD64: MachineType = MachineType(0x8664);
}

/// Canonical architecture family of a machine-type code.
///
/// Unrecognized codes keep their code visible instead of being folded into
/// a guessed family, so a mismatch diagnostic never lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86,
    X64,
    Arm,
    UnknownCode(u16),
}

impl Architecture {
    /// Map a machine-type code to its architecture family.
    pub fn of(machine_type: MachineType) -> Self {
        match machine_type {
            MachineType::AMD64 | MachineType::IA64 => Architecture::X64,
            MachineType::I386 => Architecture::X86,
            MachineType::ARM | MachineType::ARMNT => Architecture::Arm,
            MachineType(code) => Architecture::UnknownCode(code),
        }
    }

    /// Whether this matches a triplet's declared architecture name.
    ///
    /// An unknown code matches nothing.
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            Architecture::UnknownCode(_) => false,
            known => known.to_string() == expected,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::X86 => write!(f, "x86"),
            Architecture::X64 => write!(f, "x64"),
            Architecture::Arm => write!(f, "arm"),
            Architecture::UnknownCode(code) => write!(f, "Machine Type Code = {}", code),
        }
    }
}

/// Header facts extracted from a dynamic library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DllInfo {
    pub machine_type: MachineType,
}

/// Header facts extracted from a static library archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibInfo {
    /// Distinct machine types declared by the archive's object members.
    pub machine_types: BTreeSet<MachineType>,
}

/// Read the machine type of a PE image (DLL).
pub fn read_dll_info(path: &Path) -> Result<DllInfo, CoffError> {
    let io_err = |source| CoffError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;

    let mut dos_magic = [0u8; 2];
    file.read_exact(&mut dos_magic).map_err(io_err)?;
    if &dos_magic != b"MZ" {
        return Err(CoffError::MissingDosSignature(path.to_path_buf()));
    }

    file.seek(SeekFrom::Start(PE_SIGNATURE_OFFSET_OFFSET))
        .map_err(io_err)?;
    let mut lfanew = [0u8; 4];
    file.read_exact(&mut lfanew).map_err(io_err)?;

    file.seek(SeekFrom::Start(u32::from_le_bytes(lfanew) as u64))
        .map_err(io_err)?;
    let mut pe_header = [0u8; 6];
    file.read_exact(&mut pe_header).map_err(io_err)?;
    if &pe_header[..4] != b"PE\0\0" {
        return Err(CoffError::MissingPeSignature(path.to_path_buf()));
    }

    let machine = u16::from_le_bytes([pe_header[4], pe_header[5]]);
    Ok(DllInfo {
        machine_type: MachineType(machine),
    })
}

/// Read the machine types declared by a static library archive's members.
///
/// The linker-member and longnames pseudo-members carry no machine type and
/// are skipped. Import members store theirs in the import header instead of
/// the COFF header proper.
pub fn read_lib_info(path: &Path) -> Result<LibInfo, CoffError> {
    let data = std::fs::read(path).map_err(|source| CoffError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if !data.starts_with(ARCHIVE_MAGIC) {
        return Err(CoffError::MissingArchiveSignature(path.to_path_buf()));
    }

    let malformed = |offset| CoffError::MalformedArchiveMember {
        path: path.to_path_buf(),
        offset,
    };

    let mut machine_types = BTreeSet::new();
    let mut offset = ARCHIVE_MAGIC.len();

    while offset < data.len() {
        let header = data
            .get(offset..offset + ARCHIVE_MEMBER_HEADER_LEN)
            .ok_or_else(|| malformed(offset))?;
        if &header[58..60] != b"`\n" {
            return Err(malformed(offset));
        }

        let name = std::str::from_utf8(&header[..16])
            .map_err(|_| malformed(offset))?
            .trim_end();
        let size: usize = std::str::from_utf8(&header[48..58])
            .ok()
            .map(str::trim_end)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed(offset))?;

        let body_start = offset + ARCHIVE_MEMBER_HEADER_LEN;
        let body = data
            .get(body_start..body_start + size)
            .ok_or_else(|| malformed(offset))?;

        if name != "/" && name != "//" {
            machine_types.insert(member_machine_type(body).ok_or_else(|| malformed(offset))?);
        }

        // Member bodies are two-byte aligned.
        offset = body_start + size + size % 2;
    }

    Ok(LibInfo { machine_types })
}

/// Machine type of one archive member body.
fn member_machine_type(body: &[u8]) -> Option<MachineType> {
    let sig1 = u16::from_le_bytes([*body.first()?, *body.get(1)?]);
    let sig2 = u16::from_le_bytes([*body.get(2)?, *body.get(3)?]);
    if sig1 == MachineType::UNKNOWN.0 && sig2 == 0xFFFF {
        // Import member: IMPORT_OBJECT_HEADER stores the machine after the
        // version field.
        let machine = u16::from_le_bytes([*body.get(6)?, *body.get(7)?]);
        Some(MachineType(machine))
    } else {
        Some(MachineType(sig1))
    }
}
