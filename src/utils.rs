//! Path helpers

use path_clean::PathClean;
use std::io;
use std::path::{Path, PathBuf};

/// Resolve `path` against the current directory and clean it lexically,
/// the way `path.resolve` does for a single segment.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.clean())
    } else {
        Ok(std::env::current_dir()?.join(path).clean())
    }
}

/// Resolve a symlink target relative to the directory holding the link.
pub fn resolve_link_target(link: &Path, target: &Path) -> PathBuf {
    match link.parent() {
        Some(dir) => dir.join(target).clean(),
        None => target.clean(),
    }
}
