//! Locating `rn-cli.config.js` in the directory hierarchy

use crate::types::Result;
use crate::utils::absolutize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The reserved configuration filename.
pub const RN_CLI_CONFIG: &str = "rn-cli.config.js";

/// Find the nearest directory, starting at `start` and moving up one level at
/// a time, that contains a file named `file_name`.
///
/// The filesystem root is only tested when `start` is the root itself.
/// Returns `Ok(None)` when no directory on the chain has the file.
pub fn find_parent_directory(start: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    let start = absolutize(start)?;

    for dir in start.ancestors() {
        if dir.parent().is_none() && dir != start.as_path() {
            break;
        }

        let candidate = dir.join(file_name);
        debug!("Checking {}", candidate.display());
        if candidate.exists() {
            return Ok(Some(dir.to_path_buf()));
        }
    }

    Ok(None)
}

/// Path to the nearest `rn-cli.config.js` at or above `start`.
pub fn find_config_path(start: &Path) -> Result<Option<PathBuf>> {
    Ok(find_parent_directory(start, RN_CLI_CONFIG)?.map(|dir| dir.join(RN_CLI_CONFIG)))
}
