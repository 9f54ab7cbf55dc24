//! Directory-traversal guard for paths taken from the patch list.
//!
//! Every path is resolved the way the OS would resolve it (symlinks followed
//! for the part that exists, `.` and `..` applied in order) before it is
//! compared with the installation root. Checking the raw joined string is not
//! enough: `a/../../etc/passwd` joins cleanly but points outside the root.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` to an absolute, symlink-free form.
///
/// Unlike [`std::fs::canonicalize`] the path does not have to exist. Components
/// are applied one at a time; each prefix that exists on disk is canonicalized
/// so a later `..` climbs out of the real directory rather than the link.
pub fn resolve(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                if resolved.symlink_metadata().is_ok() {
                    resolved = resolved.canonicalize()?;
                }
            }
        }
    }

    Ok(resolved)
}

/// Whether `candidate` resolves to `root` or somewhere beneath it.
///
/// Resolution failures count as unsafe.
pub fn is_safe(root: &Path, candidate: &Path) -> bool {
    match (resolve(root), resolve(candidate)) {
        (Ok(root), Ok(candidate)) => candidate.starts_with(&root),
        _ => false,
    }
}

/// Join a patch list path onto `root`, returning the destination only if it
/// stays inside the root.
///
/// The returned path is the lexical join, not the resolved one, so callers
/// report the path the user expects to see.
pub fn resolve_within(root: &Path, relative: &str) -> Option<PathBuf> {
    let candidate = root.join(relative);
    is_safe(root, &candidate).then_some(candidate)
}
