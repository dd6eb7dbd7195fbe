//! Runtime configuration.
//!
//! Values come from environment variables (a `.env` file is loaded first if
//! present) and fall back to the defaults below. CLI flags override both.
//!
//! | Variable                         | Default              |
//! |----------------------------------|----------------------|
//! | `ORDERSPLIT_COST_TABLE`          | `./cost_lookup.csv`  |
//! | `ORDERSPLIT_UPLOAD_DIR`          | `./orders/`          |
//! | `ORDERSPLIT_PORT`                | `3000`               |
//! | `ORDERSPLIT_ALLOWED_EXTENSIONS`  | `csv`                |

use std::env;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Cost table read by every run.
pub const DEFAULT_COST_TABLE: &str = "./cost_lookup.csv";

/// Where uploads and their outputs are stored.
pub const DEFAULT_UPLOAD_DIR: &str = "./orders/";

pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["csv"];

/// Maximum upload size (in bytes).
pub const MAX_UPLOAD_SIZE: usize = 20 * 1024 * 1024;

/// Settings shared by the CLI and the server.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub cost_table: PathBuf,
    pub upload_dir: PathBuf,
    pub port: u16,
    /// Lowercase, without the dot
    pub allowed_extensions: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cost_table: PathBuf::from(DEFAULT_COST_TABLE),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            port: DEFAULT_PORT,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Read settings through an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup("ORDERSPLIT_COST_TABLE") {
            config.cost_table = PathBuf::from(path);
        }
        if let Some(dir) = lookup("ORDERSPLIT_UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(port) = lookup("ORDERSPLIT_PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "ORDERSPLIT_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(list) = lookup("ORDERSPLIT_ALLOWED_EXTENSIONS") {
            let extensions: Vec<String> = list
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
            if extensions.is_empty() {
                return Err(ConfigError::InvalidValue {
                    var: "ORDERSPLIT_ALLOWED_EXTENSIONS",
                    value: list,
                });
            }
            config.allowed_extensions = extensions;
        }

        Ok(config)
    }

    /// Whether a file name has an allowed extension (case-insensitive).
    pub fn allows(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}
