//! Turning captured module exports into typed overrides

use super::descriptor::{constant, ready_transform_options, ConfigOverrides, TransformOptions};
use crate::evaluator::ModuleExports;
use crate::types::{ConfigError, Result};
use regex::{Regex, RegexBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

fn parse<T: DeserializeOwned>(field: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ConfigError::InvalidField {
        field: field.to_string(),
        message: e.to_string(),
    })
}

/// Fields whose value is behavior rather than data. A snapshot of them is
/// meaningless, so they always keep their default.
const BEHAVIOR_FIELDS: &[&str] = &[
    "hasteImpl",
    "postMinifyProcess",
    "postProcessBundleSourcemap",
    "postProcessModules",
    "postProcessModulesForBuck",
];

/// A blacklist pattern as exported: a bare source string, or a `RegExp`
/// captured with its flags.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PatternExport {
    Source(String),
    RegExp {
        source: String,
        #[serde(default)]
        flags: String,
    },
}

fn compile_pattern(field: &str, value: Value) -> Result<Regex> {
    let (source, flags) = match parse::<PatternExport>(field, value)? {
        PatternExport::Source(source) => (source, String::new()),
        PatternExport::RegExp { source, flags } => (source, flags),
    };

    let mut builder = RegexBuilder::new(&source);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            // No effect on which inputs match.
            'g' | 'u' | 'd' => &mut builder,
            other => {
                return Err(ConfigError::InvalidField {
                    field: field.to_string(),
                    message: format!("unsupported regular expression flag `{}`", other),
                })
            }
        };
    }
    Ok(builder.build()?)
}

fn skip(name: &str, reason: &str) {
    warn!(
        "`{}` {} and cannot be loaded from the config file; using the default",
        name, reason
    );
}

impl ConfigOverrides {
    /// Map each captured export onto its typed field. Unknown exports are
    /// kept in `extra`; skipped exports and behavior fields leave the
    /// default in place.
    pub fn from_exports(exports: ModuleExports) -> Result<Self> {
        for name in &exports.skipped {
            skip(name, "takes arguments");
        }

        let mut overrides = ConfigOverrides::default();
        for (key, value) in exports.values {
            if BEHAVIOR_FIELDS.contains(&key.as_str()) {
                skip(&key, "holds behavior, not data,");
                continue;
            }

            debug!("Override for `{}`", key);
            match key.as_str() {
                "extraNodeModules" => {
                    overrides.extra_node_modules =
                        Some(parse::<BTreeMap<String, PathBuf>>(&key, value)?)
                }
                "getAssetExts" => overrides.get_asset_exts = Some(constant(parse(&key, value)?)),
                "getBlacklistRE" => {
                    overrides.get_blacklist_re = Some(constant(compile_pattern(&key, value)?))
                }
                "getEnableBabelRCLookup" => {
                    overrides.get_enable_babel_rc_lookup = Some(constant(parse(&key, value)?))
                }
                "getPlatforms" => overrides.get_platforms = Some(constant(parse(&key, value)?)),
                "getPolyfillModuleNames" => {
                    overrides.get_polyfill_module_names = Some(constant(parse(&key, value)?))
                }
                "getProjectRoots" => {
                    overrides.get_project_roots = Some(constant(parse(&key, value)?))
                }
                "getProvidesModuleNodeModules" => {
                    overrides.get_provides_module_node_modules = Some(constant(parse(&key, value)?))
                }
                "getSourceExts" => overrides.get_source_exts = Some(constant(parse(&key, value)?)),
                "getTransformModulePath" => {
                    overrides.get_transform_module_path = Some(constant(parse(&key, value)?))
                }
                "getTransformOptions" => {
                    let options: TransformOptions = parse(&key, value)?;
                    overrides.get_transform_options = Some(ready_transform_options(options));
                }
                "getWorkerPath" => overrides.get_worker_path = Some(constant(parse(&key, value)?)),
                "getPolyfills" => {
                    let list: Vec<String> = parse(&key, value)?;
                    overrides.get_polyfills = Some(Arc::new(move |_: Option<&str>| list.clone()));
                }
                "transformVariants" => {
                    overrides.transform_variants = Some(constant(parse(&key, value)?))
                }
                _ => {
                    overrides.extra.insert(key, value);
                }
            }
        }

        Ok(overrides)
    }
}
