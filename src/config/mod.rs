//! Packager configuration
//!
//! Resolution order:
//! 1. Nearest `rn-cli.config.js` at or above the starting directory
//! 2. Built-in defaults for every field the file does not export

mod defaults;
mod descriptor;
mod loader;
pub mod locate;
mod snapshot;

pub use defaults::{DefaultConfigProvider, APP_ROOT_ENV};
pub use descriptor::{
    constant, ready_transform_options, Accessor, BundleSourcemap, CodeWithMap, Config,
    ConfigOverrides, GetPolyfills, GetTransformOptions, HasteImpl, Hook, ModuleTransport,
    PostProcessBundleSourcemap, TransformOptions, TransformRequest,
};
pub use loader::{ConfigLoader, ProjectResolution};
pub use locate::{find_config_path, find_parent_directory, RN_CLI_CONFIG};
