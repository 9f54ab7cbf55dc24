//! Patch list (manifest) model and parser.
//!
//! The remote patch list is newline-delimited text, one file per line:
//!
//! ```text
//! Mist/Content/Paks/pakchunk1.pak 0D4A1185 1048576
//! ```
//!
//! Fields are the forward-slash relative path, the CRC-32 as eight hex digits
//! and the size in bytes. Paths containing whitespace cannot be represented.
//!
//! A line is rejected only for the wrong token count or a non-integer size. A
//! checksum token that is not a valid CRC-32 keeps the entry, which then never
//! validates and is reported as outdated.

use std::collections::HashMap;

use thiserror::Error;

use crate::checksum::Crc32;

/// One file the remote side expects to exist locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Relative path, forward-slash separated. Unique within a manifest.
    pub path: String,
    /// Expected CRC-32 of the file contents; `None` when the patch list
    /// token was not eight hex digits.
    pub checksum: Option<Crc32>,
    /// Expected size in bytes.
    pub size: u64,
}

impl ManifestEntry {
    /// Last path segment, used for compact progress labels.
    pub fn file_name(&self) -> &str {
        file_name(&self.path)
    }
}

/// Last segment of a forward-slash path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Why a patch list line was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineError {
    /// Line did not split into exactly three tokens.
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),

    /// Size token is not a non-negative integer.
    #[error("invalid size '{0}'")]
    Size(String),
}

/// Parse one non-empty patch list line.
pub fn parse_line(line: &str) -> Result<ManifestEntry, LineError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [path, checksum, size] = fields.as_slice() else {
        return Err(LineError::FieldCount(fields.len()));
    };

    let checksum = checksum.parse::<Crc32>().ok();
    let size = size
        .parse::<u64>()
        .map_err(|_| LineError::Size(size.to_string()))?;

    Ok(ManifestEntry {
        path: path.to_string(),
        checksum,
        size,
    })
}

/// Remote file list keyed by path, iterated in patch list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    index: HashMap<String, usize>,
    rejected: usize,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse patch list text, logging and skipping malformed lines.
    pub fn parse(content: &str) -> Self {
        let mut manifest = Self::new();

        for (line_no, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            match parse_line(line) {
                Ok(entry) => {
                    if entry.checksum.is_none() {
                        tracing::warn!(line = line_no + 1, content = %line, "Unparseable checksum; file will never validate");
                    }
                    manifest.insert(entry)
                }
                Err(e) => {
                    tracing::warn!(line = line_no + 1, content = %line, "Malformed patch list line: {}", e);
                    manifest.rejected += 1;
                }
            }
        }

        manifest
    }

    /// Insert an entry.
    ///
    /// A path seen before keeps its original position and takes the new values.
    pub fn insert(&mut self, entry: ManifestEntry) {
        match self.index.get(&entry.path) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(entry.path.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Look up an entry by path.
    pub fn get(&self, path: &str) -> Option<&ManifestEntry> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    /// Whether the manifest tracks `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Entries in patch list order.
    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    /// Paths in patch list order.
    pub fn paths(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no files are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lines skipped as malformed during [`Manifest::parse`].
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Sum of the expected sizes of `paths`. Unknown paths count as zero.
    pub fn total_size<'a>(&self, paths: impl IntoIterator<Item = &'a String>) -> u64 {
        paths
            .into_iter()
            .filter_map(|p| self.get(p))
            .map(|e| e.size)
            .sum()
    }
}
