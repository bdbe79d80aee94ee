//! Path validation against the managed root

use anyhow::{bail, Result};
use std::path::{Component, Path, PathBuf};

/// Resolve `requested` against `root` and reject paths escaping it
///
/// Resolution is lexical (the target may not exist yet, e.g. a regression
/// test about to be written), so `..` components are folded before the
/// prefix check.
pub fn validate_path(root: &Path, requested: &str) -> Result<PathBuf> {
    let requested_path = Path::new(requested);
    let joined = if requested_path.is_absolute() {
        requested_path.to_path_buf()
    } else {
        root.join(requested_path)
    };

    let resolved = normalize(&joined);
    let root = normalize(root);

    if resolved == root || resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        bail!(
            "Access denied: path '{}' is outside the managed root {}",
            requested,
            root.display()
        );
    }
}

/// Fold `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
