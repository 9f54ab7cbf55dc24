//! CRC-32 checksums for file verification.
//!
//! The patch list records one CRC-32 per file as eight hex digits. This module
//! parses that representation and computes the same value for local files,
//! streaming them in fixed-size blocks so large `.pak` files never have to be
//! held in memory.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::manifest::ManifestEntry;

/// Buffer size for reading files during checksum calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// A CRC-32 value as written in the patch list.
///
/// Parsing is case-insensitive; display is always eight uppercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crc32(pub u32);

/// Error parsing a checksum token.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid checksum '{input}' - expected 8 hex digits")]
pub struct ChecksumParseError {
    input: String,
}

impl FromStr for Crc32 {
    type Err = ChecksumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ChecksumParseError {
                input: s.to_string(),
            });
        }
        u32::from_str_radix(s, 16)
            .map(Crc32)
            .map_err(|_| ChecksumParseError {
                input: s.to_string(),
            })
    }
}

impl fmt::Display for Crc32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// Calculate the CRC-32 of a file's contents.
pub fn crc32_file(path: &Path) -> io::Result<Crc32> {
    let mut file = File::open(path)?;
    let mut hasher = crc32fast::Hasher::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(Crc32(hasher.finalize()))
}

/// Outcome of comparing a local file against its manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Size and checksum both match.
    Valid,
    /// Local size differs; the checksum was not computed.
    SizeMismatch { local: u64, expected: u64 },
    /// Size matches but the content hashes differently, or the expected
    /// checksum could not be parsed (`expected: None`).
    ChecksumMismatch {
        local: Crc32,
        expected: Option<Crc32>,
    },
}

impl Validation {
    /// Whether the file can be kept as is.
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validation::Valid => write!(f, "valid"),
            Validation::SizeMismatch { local, expected } => {
                write!(f, "size mismatch: local={} expected={}", local, expected)
            }
            Validation::ChecksumMismatch {
                local,
                expected: Some(expected),
            } => write!(f, "CRC mismatch: local={} expected={}", local, expected),
            Validation::ChecksumMismatch {
                local,
                expected: None,
            } => write!(f, "CRC mismatch: local={} expected=<unparseable>", local),
        }
    }
}

/// Validate the file at `path` against a manifest entry.
///
/// The size is compared first so that stale files of a different length never
/// pay for a full read.
pub fn validate_file(path: &Path, entry: &ManifestEntry) -> io::Result<Validation> {
    let local = path.metadata()?.len();
    if local != entry.size {
        return Ok(Validation::SizeMismatch {
            local,
            expected: entry.size,
        });
    }

    let crc = crc32_file(path)?;
    if entry.checksum != Some(crc) {
        return Ok(Validation::ChecksumMismatch {
            local: crc,
            expected: entry.checksum,
        });
    }

    Ok(Validation::Valid)
}
