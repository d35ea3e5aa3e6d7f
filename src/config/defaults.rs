//! Built-in default configuration
//!
//! Every field has a default so a project without `rn-cli.config.js` still
//! gets a complete configuration.

use super::descriptor::{
    constant, ready_transform_options, BundleSourcemap, CodeWithMap, Config, ModuleTransport,
    TransformOptions,
};
use crate::install::InstallLocation;
use crate::roots::{resolve_symlinks_for_roots, NodeModulesSymlinkFinder, SymlinkFinder};
use crate::toolchain;
use crate::types::Result;
use crate::utils::absolutize;
use serde_json::{json, Map};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Environment variable naming an alternate project root.
pub const APP_ROOT_ENV: &str = "REACT_NATIVE_APP_ROOT";

/// Builds the default [`Config`].
#[derive(Clone)]
pub struct DefaultConfigProvider {
    install: InstallLocation,
    symlinks: Arc<dyn SymlinkFinder>,
    app_root: Option<PathBuf>,
}

impl DefaultConfigProvider {
    pub fn new(install: InstallLocation, symlinks: Arc<dyn SymlinkFinder>) -> Self {
        Self {
            install,
            symlinks,
            app_root: None,
        }
    }

    /// Defaults for `install`, reading `REACT_NATIVE_APP_ROOT` once.
    pub fn from_env(install: InstallLocation) -> Self {
        let app_root = std::env::var_os(APP_ROOT_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        if let Some(root) = &app_root {
            debug!("{} is set to {}", APP_ROOT_ENV, root.display());
        }

        Self {
            app_root,
            ..Self::new(install, Arc::new(NodeModulesSymlinkFinder))
        }
    }

    /// Seed the project roots with `root` instead of the install location.
    pub fn with_app_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.app_root = Some(root.into());
        self
    }

    /// The single root that project root resolution starts from.
    pub fn seed_root(&self) -> PathBuf {
        match &self.app_root {
            Some(root) => absolutize(root).unwrap_or_else(|e| {
                warn!("Cannot resolve {}: {}", root.display(), e);
                root.clone()
            }),
            None => self.install.project_path(),
        }
    }

    /// A fresh default configuration.
    pub fn defaults(&self) -> Result<Config> {
        let blacklist = toolchain::blacklist(&[])?;
        let seed = self.seed_root();
        let symlinks = Arc::clone(&self.symlinks);
        let package_root = self.install.package_root();
        let polyfill_root = package_root.clone();

        Ok(Config {
            extra_node_modules: BTreeMap::new(),
            get_asset_exts: constant(Vec::new()),
            get_blacklist_re: constant(blacklist),
            get_enable_babel_rc_lookup: constant(false),
            get_platforms: constant(Vec::new()),
            get_polyfill_module_names: constant(Vec::new()),
            get_project_roots: Arc::new(move || {
                resolve_symlinks_for_roots(std::slice::from_ref(&seed), symlinks.as_ref())
            }),
            get_provides_module_node_modules: Arc::new(toolchain::provides_module_node_modules),
            get_source_exts: constant(Vec::new()),
            get_transform_module_path: Arc::new(move || toolchain::transformer_path(&package_root)),
            get_transform_options: ready_transform_options(TransformOptions::default()),
            get_worker_path: constant(None),
            get_polyfills: Arc::new(move |platform: Option<&str>| {
                toolchain::polyfills(&polyfill_root, platform)
            }),
            post_minify_process: Arc::new(|input: CodeWithMap| input),
            post_process_modules: Arc::new(|modules: Vec<ModuleTransport>| modules),
            post_process_modules_for_buck: Arc::new(|modules: Vec<ModuleTransport>| modules),
            post_process_bundle_sourcemap: Arc::new(|bundle: BundleSourcemap| CodeWithMap {
                code: bundle.code,
                map: bundle.map,
            }),
            haste_impl: None,
            transform_variants: constant(BTreeMap::from([("default".to_string(), json!({}))])),
            extra: Map::new(),
        })
    }
}
