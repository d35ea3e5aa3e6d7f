//! Running `rn-cli.config.js`
//!
//! A config file is a JavaScript module. Loading it executes arbitrary
//! project code, so it must only ever be done for trusted projects.

use crate::types::{ConfigError, Result};
use crate::utils::absolutize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// What a config module exported, captured as plain data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleExports {
    /// Plain exports, and the resolved results of zero-argument functions.
    #[serde(default)]
    pub values: Map<String, Value>,
    /// Exports that cannot be captured as data, such as functions taking
    /// arguments.
    #[serde(default)]
    pub skipped: Vec<String>,
}

/// Executes a configuration module and reports its exports.
pub trait ModuleEvaluator: Send + Sync {
    /// Load and execute untrusted project code at `path`.
    ///
    /// Whatever the module does at load time happens here. Errors it raises
    /// are returned as-is to the caller.
    fn evaluate_untrusted(&self, path: &Path) -> Result<ModuleExports>;
}

/// Writes the snapshot to the file named by `argv[2]`; stdout and stderr
/// belong to the module.
const SNAPSHOT_SCRIPT: &str = r#"
const fs = require('fs');
const [target, snapshotPath] = process.argv.slice(1);
(async () => {
  const exported = require(target);
  const source = exported !== null && typeof exported === 'object' ? exported : {};
  const values = {};
  const skipped = [];
  for (const key of Object.keys(source)) {
    let value = source[key];
    if (typeof value === 'function') {
      if (value.length > 0) {
        skipped.push(key);
        continue;
      }
      value = await value();
    }
    if (value instanceof RegExp) {
      value = {source: value.source, flags: value.flags};
    }
    values[key] = value === undefined ? null : value;
  }
  fs.writeFileSync(snapshotPath, JSON.stringify({values, skipped}));
})().catch(err => {
  process.stderr.write(String((err && err.stack) || err));
  process.exit(1);
});
"#;

/// Evaluates config modules with a Node.js subprocess.
#[derive(Debug, Clone)]
pub struct NodeEvaluator {
    node: PathBuf,
}

impl Default for NodeEvaluator {
    fn default() -> Self {
        Self::new("node")
    }
}

impl NodeEvaluator {
    pub fn new(node: impl Into<PathBuf>) -> Self {
        Self { node: node.into() }
    }
}

impl ModuleEvaluator for NodeEvaluator {
    fn evaluate_untrusted(&self, path: &Path) -> Result<ModuleExports> {
        // `require` treats bare relative paths as package names.
        let path = absolutize(path)?;
        debug!("Evaluating {} with {}", path.display(), self.node.display());

        let snapshot = tempfile::NamedTempFile::new()?;
        let output = Command::new(&self.node)
            .arg("-e")
            .arg(SNAPSHOT_SCRIPT)
            .arg(&path)
            .arg(snapshot.path())
            .output()?;

        if !output.status.success() {
            return Err(ConfigError::Evaluation {
                path,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&fs::read(snapshot.path())?)?)
    }
}
