//! Default values supplied by the rest of the packager toolchain
//!
//! These are the pieces the configuration does not compute itself: the
//! module blacklist, the polyfill list, the haste node modules and the
//! transformer location.

use crate::config::locate::find_parent_directory;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Patterns every blacklist includes.
const SHARED_BLACKLIST: [&str; 4] = [
    r"node_modules[/\\]react[/\\]dist[/\\].*",
    r"website/node_modules/.*",
    r"heapCapture/bundle\.js",
    r".*/__tests__/.*",
];

/// Node modules scanned for `@providesModule` declarations.
pub const PROVIDES_MODULE_NODE_MODULES: [&str; 2] = ["react-native", "react-native-windows"];

const POLYFILLS: [&str; 9] = [
    "Object.es6.js",
    "console.js",
    "error-guard.js",
    "Number.es6.js",
    "String.prototype.es6.js",
    "Array.prototype.es6.js",
    "Array.es6.js",
    "Object.es7.js",
    "babelHelpers.js",
];

const TRANSFORMER: &str = "node_modules/metro-bundler/src/transformer.js";

/// Build the module blacklist, anchored at the end of the path.
/// `additional` patterns come before the shared ones.
pub fn blacklist(additional: &[&str]) -> Result<Regex, regex::Error> {
    let alternatives: Vec<&str> = additional
        .iter()
        .copied()
        .chain(SHARED_BLACKLIST.iter().copied())
        .collect();
    Regex::new(&format!("({})$", alternatives.join("|")))
}

/// Polyfills prepended to every bundle.
pub fn polyfills(package_root: &Path, _platform: Option<&str>) -> Vec<String> {
    let dir = package_root.join("Libraries").join("polyfills");
    POLYFILLS
        .iter()
        .map(|name| dir.join(name).to_string_lossy().into_owned())
        .collect()
}

pub fn provides_module_node_modules() -> Vec<String> {
    PROVIDES_MODULE_NODE_MODULES.iter().map(|s| s.to_string()).collect()
}

/// Resolve the default transformer the way node resolves a bare import:
/// the nearest `node_modules/metro-bundler` at or above `package_root`.
pub fn transformer_path(package_root: &Path) -> PathBuf {
    match find_parent_directory(package_root, TRANSFORMER) {
        Ok(Some(dir)) => dir.join(TRANSFORMER),
        _ => {
            debug!("metro-bundler not found above {}", package_root.display());
            package_root.join(TRANSFORMER)
        }
    }
}
