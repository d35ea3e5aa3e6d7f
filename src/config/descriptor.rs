//! The packager configuration and its partial override form

use crate::types::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type Accessor<T> = Arc<dyn Fn() -> T + Send + Sync>;
pub type Hook<T> = Arc<dyn Fn(T) -> T + Send + Sync>;
pub type GetPolyfills = Arc<dyn Fn(Option<&str>) -> Vec<String> + Send + Sync>;
pub type PostProcessBundleSourcemap = Arc<dyn Fn(BundleSourcemap) -> CodeWithMap + Send + Sync>;
pub type GetTransformOptions = Arc<
    dyn Fn(&[String], &TransformRequest) -> BoxFuture<'static, Result<TransformOptions>> + Send + Sync,
>;

/// Options the packager passes when asking for transform options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
    pub dev: bool,
    pub hot: bool,
    pub minify: bool,
    pub platform: Option<String>,
}

/// Transform options returned by `getTransformOptions`. Empty means no
/// special transform behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preloaded_modules: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_groups: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeWithMap {
    pub code: String,
    pub map: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BundleSourcemap {
    pub code: String,
    pub map: Option<Value>,
    pub out_file_name: PathBuf,
}

/// A module as it is handed to the post-processing hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleTransport {
    pub name: String,
    pub source_path: PathBuf,
    pub code: String,
    pub map: Option<Value>,
}

/// Maps a file to its haste module name, if it is a haste module.
pub trait HasteImpl: Send + Sync {
    fn get_haste_name(&self, file_path: &Path) -> Option<String>;
}

/// Fully-populated packager configuration.
///
/// Every field is always present. Accessor fields are shared `Arc`s so a
/// `Config` is cheap to clone and never changes once built.
#[derive(Clone)]
pub struct Config {
    pub extra_node_modules: BTreeMap<String, PathBuf>,
    pub get_asset_exts: Accessor<Vec<String>>,
    pub get_blacklist_re: Accessor<Regex>,
    pub get_enable_babel_rc_lookup: Accessor<bool>,
    pub get_platforms: Accessor<Vec<String>>,
    pub get_polyfill_module_names: Accessor<Vec<String>>,
    pub get_project_roots: Accessor<Vec<PathBuf>>,
    pub get_provides_module_node_modules: Accessor<Vec<String>>,
    pub get_source_exts: Accessor<Vec<String>>,
    pub get_transform_module_path: Accessor<PathBuf>,
    pub get_transform_options: GetTransformOptions,
    pub get_worker_path: Accessor<Option<PathBuf>>,
    pub get_polyfills: GetPolyfills,
    pub post_minify_process: Hook<CodeWithMap>,
    pub post_process_modules: Hook<Vec<ModuleTransport>>,
    pub post_process_modules_for_buck: Hook<Vec<ModuleTransport>>,
    pub post_process_bundle_sourcemap: PostProcessBundleSourcemap,
    pub haste_impl: Option<Arc<dyn HasteImpl>>,
    pub transform_variants: Accessor<BTreeMap<String, Value>>,
    /// Exported fields this crate does not know about, passed through as-is.
    pub extra: Map<String, Value>,
}

/// A partial [`Config`]; present fields replace the default wholesale.
#[derive(Clone, Default)]
pub struct ConfigOverrides {
    pub extra_node_modules: Option<BTreeMap<String, PathBuf>>,
    pub get_asset_exts: Option<Accessor<Vec<String>>>,
    pub get_blacklist_re: Option<Accessor<Regex>>,
    pub get_enable_babel_rc_lookup: Option<Accessor<bool>>,
    pub get_platforms: Option<Accessor<Vec<String>>>,
    pub get_polyfill_module_names: Option<Accessor<Vec<String>>>,
    pub get_project_roots: Option<Accessor<Vec<PathBuf>>>,
    pub get_provides_module_node_modules: Option<Accessor<Vec<String>>>,
    pub get_source_exts: Option<Accessor<Vec<String>>>,
    pub get_transform_module_path: Option<Accessor<PathBuf>>,
    pub get_transform_options: Option<GetTransformOptions>,
    pub get_worker_path: Option<Accessor<Option<PathBuf>>>,
    pub get_polyfills: Option<GetPolyfills>,
    pub post_minify_process: Option<Hook<CodeWithMap>>,
    pub post_process_modules: Option<Hook<Vec<ModuleTransport>>>,
    pub post_process_modules_for_buck: Option<Hook<Vec<ModuleTransport>>>,
    pub post_process_bundle_sourcemap: Option<PostProcessBundleSourcemap>,
    pub haste_impl: Option<Arc<dyn HasteImpl>>,
    pub transform_variants: Option<Accessor<BTreeMap<String, Value>>>,
    pub extra: Map<String, Value>,
}

/// Wrap a value in an accessor that hands out clones of it.
pub fn constant<T: Clone + Send + Sync + 'static>(value: T) -> Accessor<T> {
    Arc::new(move || value.clone())
}

/// Transform options that resolve immediately to `options`.
pub fn ready_transform_options(options: TransformOptions) -> GetTransformOptions {
    Arc::new(
        move |_entry_points: &[String], _request: &TransformRequest| -> BoxFuture<'static, Result<TransformOptions>> {
            let options = options.clone();
            async move { Ok(options) }.boxed()
        },
    )
}

impl Config {
    /// Shallow merge: each field set in `overrides` replaces the one in
    /// `defaults`; nothing is merged recursively.
    pub fn merged(defaults: Config, overrides: ConfigOverrides) -> Config {
        let mut extra = defaults.extra;
        extra.extend(overrides.extra);

        Config {
            extra_node_modules: overrides
                .extra_node_modules
                .unwrap_or(defaults.extra_node_modules),
            get_asset_exts: overrides.get_asset_exts.unwrap_or(defaults.get_asset_exts),
            get_blacklist_re: overrides.get_blacklist_re.unwrap_or(defaults.get_blacklist_re),
            get_enable_babel_rc_lookup: overrides
                .get_enable_babel_rc_lookup
                .unwrap_or(defaults.get_enable_babel_rc_lookup),
            get_platforms: overrides.get_platforms.unwrap_or(defaults.get_platforms),
            get_polyfill_module_names: overrides
                .get_polyfill_module_names
                .unwrap_or(defaults.get_polyfill_module_names),
            get_project_roots: overrides.get_project_roots.unwrap_or(defaults.get_project_roots),
            get_provides_module_node_modules: overrides
                .get_provides_module_node_modules
                .unwrap_or(defaults.get_provides_module_node_modules),
            get_source_exts: overrides.get_source_exts.unwrap_or(defaults.get_source_exts),
            get_transform_module_path: overrides
                .get_transform_module_path
                .unwrap_or(defaults.get_transform_module_path),
            get_transform_options: overrides
                .get_transform_options
                .unwrap_or(defaults.get_transform_options),
            get_worker_path: overrides.get_worker_path.unwrap_or(defaults.get_worker_path),
            get_polyfills: overrides.get_polyfills.unwrap_or(defaults.get_polyfills),
            post_minify_process: overrides
                .post_minify_process
                .unwrap_or(defaults.post_minify_process),
            post_process_modules: overrides
                .post_process_modules
                .unwrap_or(defaults.post_process_modules),
            post_process_modules_for_buck: overrides
                .post_process_modules_for_buck
                .unwrap_or(defaults.post_process_modules_for_buck),
            post_process_bundle_sourcemap: overrides
                .post_process_bundle_sourcemap
                .unwrap_or(defaults.post_process_bundle_sourcemap),
            haste_impl: overrides.haste_impl.or(defaults.haste_impl),
            transform_variants: overrides
                .transform_variants
                .unwrap_or(defaults.transform_variants),
            extra,
        }
    }

    /// Evaluate every synchronous accessor and render the result with the
    /// field names used in `rn-cli.config.js`.
    ///
    /// Hooks and the async transform options are not called.
    pub fn describe(&self) -> Value {
        let mut out = Map::new();
        out.insert("extraNodeModules".into(), json!(self.extra_node_modules));
        out.insert("getAssetExts".into(), json!((self.get_asset_exts)()));
        out.insert("getBlacklistRE".into(), json!((self.get_blacklist_re)().as_str()));
        out.insert(
            "getEnableBabelRCLookup".into(),
            json!((self.get_enable_babel_rc_lookup)()),
        );
        out.insert("getPlatforms".into(), json!((self.get_platforms)()));
        out.insert(
            "getPolyfillModuleNames".into(),
            json!((self.get_polyfill_module_names)()),
        );
        out.insert("getProjectRoots".into(), json!((self.get_project_roots)()));
        out.insert(
            "getProvidesModuleNodeModules".into(),
            json!((self.get_provides_module_node_modules)()),
        );
        out.insert("getSourceExts".into(), json!((self.get_source_exts)()));
        out.insert(
            "getTransformModulePath".into(),
            json!((self.get_transform_module_path)()),
        );
        out.insert("getWorkerPath".into(), json!((self.get_worker_path)()));
        out.insert("getPolyfills".into(), json!((self.get_polyfills)(None)));
        out.insert("hasteImpl".into(), json!(self.haste_impl.is_some()));
        out.insert("transformVariants".into(), json!((self.transform_variants)()));
        for (key, value) in &self.extra {
            out.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(out)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("extra_node_modules", &self.extra_node_modules)
            .field("haste_impl", &self.haste_impl.is_some())
            .field("extra", &self.extra)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("extra_node_modules", &self.extra_node_modules)
            .field("extra", &self.extra)
            .finish_non_exhaustive()
    }
}
