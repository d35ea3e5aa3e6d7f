use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rn_cli_config::config::{find_parent_directory, TransformRequest, RN_CLI_CONFIG};
use rn_cli_config::{ConfigError, ConfigLoader, InstallLayout, InstallLocation, NodeEvaluator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Locate and print React Native packager configuration
///
/// Walks up from a directory to the nearest rn-cli.config.js, runs it with
/// node, and merges its exports over the built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "rn-cli-config")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Node.js binary used to evaluate rn-cli.config.js
    #[arg(long, default_value = "node", global = true)]
    node: PathBuf,

    /// Directory the CLI is installed in (defaults to the executable's directory)
    #[arg(long, global = true)]
    install_dir: Option<PathBuf>,

    /// Install layout (node-modules, cocoa-pods, checkout); detected if omitted
    #[arg(long, global = true)]
    layout: Option<InstallLayout>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the directory containing the nearest rn-cli.config.js
    Locate {
        /// Directory to start from (defaults to the current directory)
        dir: Option<PathBuf>,
    },

    /// Print the resolved configuration as JSON
    Show {
        /// Directory to start from (defaults to the current directory)
        dir: Option<PathBuf>,

        /// Fall back to the defaults when no config file exists
        #[arg(long)]
        optional: bool,
    },

    /// Print the resolved project roots, one per line
    Roots {
        /// Directory to start from (defaults to the current directory)
        dir: Option<PathBuf>,
    },
}

fn setup_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn install_location(dir: Option<PathBuf>, layout: Option<InstallLayout>) -> Result<InstallLocation> {
    let dir = match dir {
        Some(dir) => dir,
        None => {
            let exe = std::env::current_exe().context("Cannot determine executable path")?;
            exe.parent()
                .map(Path::to_path_buf)
                .context("Executable has no parent directory")?
        }
    };

    Ok(match layout {
        Some(layout) => InstallLocation::new(dir, layout),
        None => InstallLocation::detect(dir),
    })
}

fn start_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => Ok(std::env::current_dir()?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level);

    let install = install_location(args.install_dir, args.layout)?;
    let loader =
        ConfigLoader::from_env(install).with_evaluator(Arc::new(NodeEvaluator::new(args.node)));

    match args.command {
        Command::Locate { dir } => {
            let start = start_dir(dir)?;
            match find_parent_directory(&start, RN_CLI_CONFIG)? {
                Some(project) => println!("{}", project.display()),
                None => {
                    return Err(ConfigError::NotFound {
                        start_dir: start,
                        file_name: RN_CLI_CONFIG.to_string(),
                    }
                    .into())
                }
            }
        }
        Command::Show { dir, optional } => {
            let start = start_dir(dir)?;
            let config = if optional {
                loader.find_optional(&start)?
            } else {
                let resolution = loader.find_with_path(&start)?;
                info!("Project path: {}", resolution.project_path.display());
                resolution.config
            };

            let transform_options =
                (config.get_transform_options)(&[], &TransformRequest::default()).await?;

            let mut described = config.describe();
            described["getTransformOptions"] = serde_json::to_value(transform_options)?;
            println!("{}", serde_json::to_string_pretty(&described)?);
        }
        Command::Roots { dir } => {
            let start = start_dir(dir)?;
            let config = loader.find_optional(&start)?;
            for root in (config.get_project_roots)() {
                println!("{}", root.display());
            }
        }
    }

    Ok(())
}
