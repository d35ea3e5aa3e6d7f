//! Configuration loader
//!
//! Finds the nearest `rn-cli.config.js`, runs it, and shallow-merges its
//! exports over the built-in defaults.

use crate::config::defaults::DefaultConfigProvider;
use crate::config::descriptor::{Config, ConfigOverrides};
use crate::config::locate::{find_config_path, RN_CLI_CONFIG};
use crate::evaluator::{ModuleEvaluator, NodeEvaluator};
use crate::install::InstallLocation;
use crate::types::{ConfigError, Result};
use crate::utils::absolutize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// A loaded configuration and the directory its file was found in.
#[derive(Debug, Clone)]
pub struct ProjectResolution {
    pub config: Config,
    pub project_path: PathBuf,
}

pub struct ConfigLoader {
    defaults: DefaultConfigProvider,
    evaluator: Arc<dyn ModuleEvaluator>,
}

impl ConfigLoader {
    pub fn new(defaults: DefaultConfigProvider, evaluator: Arc<dyn ModuleEvaluator>) -> Self {
        Self {
            defaults,
            evaluator,
        }
    }

    /// Loader for a CLI installed at `install`, honoring
    /// `REACT_NATIVE_APP_ROOT` and evaluating config files with `node`.
    pub fn from_env(install: InstallLocation) -> Self {
        info!(
            "Using {:?} install layout at {}",
            install.layout,
            install.dir.display()
        );
        Self::new(
            DefaultConfigProvider::from_env(install),
            Arc::new(NodeEvaluator::default()),
        )
    }

    /// Replace the module evaluator.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ModuleEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// A fresh copy of the default configuration.
    pub fn defaults(&self) -> Result<Config> {
        self.defaults.defaults()
    }

    /// Load the nearest config file at or above `start_dir`; fail if none.
    pub fn find(&self, start_dir: &Path) -> Result<Config> {
        Ok(self.find_with_path(start_dir)?.config)
    }

    /// Like [`find`](Self::find), also returning the project directory.
    pub fn find_with_path(&self, start_dir: &Path) -> Result<ProjectResolution> {
        let config_path =
            find_config_path(start_dir)?.ok_or_else(|| ConfigError::NotFound {
                start_dir: start_dir.to_path_buf(),
                file_name: RN_CLI_CONFIG.to_string(),
            })?;

        let project_path = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config_path.clone());
        info!("Found {}", config_path.display());

        Ok(ProjectResolution {
            config: self.load_file(&config_path)?,
            project_path,
        })
    }

    /// Load the nearest config file if there is one, else the defaults.
    pub fn find_optional(&self, start_dir: &Path) -> Result<Config> {
        match find_config_path(start_dir)? {
            Some(config_path) => {
                info!("Found {}", config_path.display());
                self.load_file(&config_path)
            }
            None => {
                debug!(
                    "No {} above {}, using defaults",
                    RN_CLI_CONFIG,
                    start_dir.display()
                );
                self.defaults()
            }
        }
    }

    /// Execute the config module at `path` and merge its exports over the
    /// defaults. The module is untrusted project code.
    pub fn load_file(&self, path: &Path) -> Result<Config> {
        let path = absolutize(path)?;
        let exports = self.evaluator.evaluate_untrusted(&path)?;
        debug!(
            "{} exported {} values ({} skipped)",
            path.display(),
            exports.values.len(),
            exports.skipped.len()
        );

        let overrides = ConfigOverrides::from_exports(exports)?;
        Ok(Config::merged(self.defaults()?, overrides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ModuleExports;
    use crate::install::InstallLayout;
    use crate::roots::SymlinkFinder;
    use serde_json::{json, Value};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Reads the config file as a JSON object of already-evaluated exports.
    #[derive(Default)]
    struct JsonEvaluator {
        loaded: Mutex<Vec<PathBuf>>,
    }

    impl ModuleEvaluator for JsonEvaluator {
        fn evaluate_untrusted(&self, path: &Path) -> Result<ModuleExports> {
            self.loaded.lock().unwrap().push(path.to_path_buf());
            let values: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
            Ok(ModuleExports {
                values: serde_json::from_value(values)?,
                skipped: Vec::new(),
            })
        }
    }

    struct Failing;

    impl ModuleEvaluator for Failing {
        fn evaluate_untrusted(&self, path: &Path) -> Result<ModuleExports> {
            Err(ConfigError::Evaluation {
                path: path.to_path_buf(),
                stderr: "SyntaxError: Unexpected token".to_string(),
            })
        }
    }

    struct NoLinks;

    impl SymlinkFinder for NoLinks {
        fn find_symlinked_modules(&self, _root: &Path, _roots: &[PathBuf]) -> Vec<PathBuf> {
            Vec::new()
        }
    }

    fn loader_with(evaluator: Arc<dyn ModuleEvaluator>) -> ConfigLoader {
        let install = InstallLocation::new(
            "/home/u/app/node_modules/react-native/local-cli/util",
            InstallLayout::NodeModules,
        );
        ConfigLoader::new(
            DefaultConfigProvider::new(install, Arc::new(NoLinks)),
            evaluator,
        )
    }

    fn loader() -> ConfigLoader {
        loader_with(Arc::new(JsonEvaluator::default()))
    }

    /// `<tmp>/home/u/app/src`, with the config written to `app` when given.
    fn app_tree(config: Option<&str>) -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("home").join("u").join("app");
        let src = app.join("src");
        fs::create_dir_all(&src).unwrap();
        if let Some(contents) = config {
            fs::write(app.join(RN_CLI_CONFIG), contents).unwrap();
        }
        (temp, app, src)
    }

    #[test]
    fn test_strict_find_merges_over_defaults() {
        let (_temp, app, src) = app_tree(Some(r#"{"getPlatforms": ["ios"]}"#));
        let loader = loader();

        let resolution = loader.find_with_path(&src).unwrap();
        assert_eq!(resolution.project_path, app);
        assert_eq!((resolution.config.get_platforms)(), vec!["ios"]);

        let mut expected = loader.defaults().unwrap().describe();
        expected["getPlatforms"] = json!(["ios"]);
        assert_eq!(resolution.config.describe(), expected);

        let config = loader.find(&src).unwrap();
        assert_eq!((config.get_platforms)(), vec!["ios"]);
    }

    #[test]
    fn test_strict_find_not_found() {
        let (_temp, _app, src) = app_tree(None);
        let err = loader().find(&src).unwrap_err();

        match &err {
            ConfigError::NotFound {
                start_dir,
                file_name,
            } => {
                assert_eq!(start_dir, &src);
                assert_eq!(file_name, RN_CLI_CONFIG);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
        let message = err.to_string();
        assert!(message.contains(&src.display().to_string()));
        assert!(message.contains(RN_CLI_CONFIG));
    }

    #[test]
    fn test_lenient_find_without_file_returns_defaults() {
        let (_temp, _app, src) = app_tree(None);
        let evaluator = Arc::new(JsonEvaluator::default());
        let loader = loader_with(evaluator.clone());

        let config = loader.find_optional(&src).unwrap();
        assert_eq!(config.describe(), loader.defaults().unwrap().describe());
        assert!(evaluator.loaded.lock().unwrap().is_empty());
    }

    #[test]
    fn test_lenient_find_with_file() {
        let (_temp, app, src) = app_tree(Some(r#"{"getSourceExts": ["ts"]}"#));
        let evaluator = Arc::new(JsonEvaluator::default());
        let loader = loader_with(evaluator.clone());

        let config = loader.find_optional(&src).unwrap();
        assert_eq!((config.get_source_exts)(), vec!["ts"]);
        assert_eq!(*evaluator.loaded.lock().unwrap(), vec![app.join(RN_CLI_CONFIG)]);
    }

    #[test]
    fn test_nearest_config_is_loaded() {
        let (_temp, app, src) = app_tree(Some(r#"{"getPlatforms": ["outer"]}"#));
        fs::write(src.join(RN_CLI_CONFIG), r#"{"getPlatforms": ["inner"]}"#).unwrap();

        let resolution = loader().find_with_path(&src).unwrap();
        assert_eq!(resolution.project_path, src);
        assert_eq!((resolution.config.get_platforms)(), vec!["inner"]);

        let resolution = loader().find_with_path(&app).unwrap();
        assert_eq!((resolution.config.get_platforms)(), vec!["outer"]);
    }

    #[test]
    fn test_load_file_empty_exports() {
        let (_temp, app, _src) = app_tree(Some("{}"));
        let loader = loader();

        let config = loader.load_file(&app.join(RN_CLI_CONFIG)).unwrap();
        assert_eq!(config.describe(), loader.defaults().unwrap().describe());
    }

    #[test]
    fn test_load_file_relative_path_is_absolutized() {
        let result = loader_with(Arc::new(Failing)).load_file(Path::new(RN_CLI_CONFIG));

        match result {
            Err(ConfigError::Evaluation { path, .. }) => {
                assert!(path.is_absolute());
                assert_eq!(path, std::env::current_dir().unwrap().join(RN_CLI_CONFIG));
            }
            other => panic!("expected Evaluation error, got {:?}", other),
        }
    }

    #[test]
    fn test_project_roots_override_is_not_expanded() {
        let (_temp, app, _src) = app_tree(Some(r#"{"getProjectRoots": ["/repo/app", "/repo/lib"]}"#));

        let config = loader().load_file(&app.join(RN_CLI_CONFIG)).unwrap();
        assert_eq!(
            (config.get_project_roots)(),
            vec![PathBuf::from("/repo/app"), PathBuf::from("/repo/lib")]
        );
    }

    #[test]
    fn test_evaluation_errors_propagate() {
        let (_temp, app, src) = app_tree(Some("module.exports = {"));
        let loader = loader_with(Arc::new(Failing));

        for result in [loader.find(&src), loader.find_optional(&src)] {
            match result {
                Err(ConfigError::Evaluation { path, stderr }) => {
                    assert_eq!(path, app.join(RN_CLI_CONFIG));
                    assert!(stderr.contains("SyntaxError"));
                }
                other => panic!("expected Evaluation error, got {:?}", other),
            }
        }
    }
}
