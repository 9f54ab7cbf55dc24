//! Tracked-file list: every patch list path ever seen for an installation.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

/// Ordered, duplicate-free list of tracked paths.
///
/// Grows with [`add_missing`](Self::add_missing) on every fetched patch list
/// and shrinks only through [`remove`](Self::remove) after a clear. It is
/// never replaced wholesale, so files dropped from the current patch list are
/// still cleaned up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedFiles {
    paths: Vec<String>,
    seen: HashSet<String>,
}

impl TrackedFiles {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the list from `path`, one entry per line. A missing file is empty.
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e),
        };

        let mut tracked = Self::new();
        tracked.add_missing(content.lines().map(str::trim).filter(|l| !l.is_empty()));
        Ok(tracked)
    }

    /// Write the list to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut content = self.paths.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(path, content)
    }

    /// Append every path not already tracked, keeping first-seen order.
    ///
    /// Returns how many were added.
    pub fn add_missing<I, S>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for path in paths {
            let path = path.as_ref();
            if self.seen.insert(path.to_string()) {
                self.paths.push(path.to_string());
                added += 1;
            }
        }
        added
    }

    /// Drop the given paths. Returns how many were tracked.
    pub fn remove<I, S>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let doomed: HashSet<String> = paths
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .filter(|p| self.seen.contains(p))
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        self.paths.retain(|p| !doomed.contains(p));
        self.seen.retain(|p| !doomed.contains(p));
        doomed.len()
    }

    /// Whether `path` is tracked.
    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    /// Tracked paths in order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
