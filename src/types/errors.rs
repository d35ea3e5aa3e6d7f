use thiserror::Error;
use std::path::PathBuf;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Can't find \"{file_name}\" file in any parent folder of \"{}\"", .start_dir.display())]
    NotFound { start_dir: PathBuf, file_name: String },

    #[error("Failed to evaluate {}: {stderr}", .path.display())]
    Evaluation { path: PathBuf, stderr: String },

    #[error("Invalid value for `{field}`: {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid blacklist pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
