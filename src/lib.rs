//! rn-cli-config - React Native packager configuration
//!
//! Locates `rn-cli.config.js` by walking up from a starting directory,
//! merges it over the built-in defaults, and expands project roots with
//! packages symlinked into `node_modules`.

pub mod config;
pub mod evaluator;
pub mod install;
pub mod roots;
pub mod toolchain;
pub mod types;
pub mod utils;

pub use config::{Config, ConfigLoader, ProjectResolution};
pub use evaluator::{ModuleEvaluator, NodeEvaluator};
pub use install::{InstallLayout, InstallLocation};
pub use types::{ConfigError, Result};
