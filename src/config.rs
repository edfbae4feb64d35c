use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default deadline for a single proxy request in milliseconds (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Default time allowed for in-flight requests at shutdown in milliseconds (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5_000;

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Server configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Directory holding `<module>@<version>` directories
    pub mod_dir: Option<PathBuf>,
    /// Address to listen on (e.g., "127.0.0.1:8080")
    pub addr: Option<String>,
    /// Deadline for a single request in milliseconds
    pub request_timeout_ms: u64,
    /// Time allowed for in-flight requests at shutdown in milliseconds
    pub shutdown_timeout_ms: u64,
    pub log: LogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mod_dir: None,
            addr: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            log: LogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Creates a configuration serving `mod_dir` with default settings
    pub fn new(mod_dir: impl Into<PathBuf>) -> Self {
        Self {
            mod_dir: Some(mod_dir.into()),
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns the module directory, checking that it is an existing directory
    pub fn validated_mod_dir(&self) -> Result<&Path, ConfigError> {
        let mod_dir = self
            .mod_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| ConfigError::Invalid("modDir must be provided".to_string()))?;

        if !mod_dir.is_dir() {
            return Err(ConfigError::Invalid(format!(
                "modDir {:?} is not a directory",
                mod_dir
            )));
        }
        Ok(mod_dir)
    }

    /// Returns the listen address
    pub fn validated_addr(&self) -> Result<&str, ConfigError> {
        self.addr
            .as_deref()
            .filter(|addr| !addr.is_empty())
            .ok_or_else(|| ConfigError::Invalid("addr must be provided".to_string()))
    }
}

/// Output format of log records
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter directives in `RUST_LOG` syntax
    pub filter: String,
    /// Write logs to a file instead of stderr
    pub to_file: bool,
    /// Log file location; defaults to [`log_path`]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_LOG_FILTER.to_string(),
            to_file: false,
            file: None,
        }
    }
}

impl LogConfig {
    /// Returns the file logs are written to, if file logging is enabled
    pub fn log_file(&self) -> Option<PathBuf> {
        match (&self.file, self.to_file) {
            (Some(file), _) => Some(file.clone()),
            (None, true) => Some(log_path()),
            (None, false) => None,
        }
    }
}

/// Returns the path to the data directory for modserver.
/// Uses $XDG_DATA_HOME/modserver if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/modserver,
/// or ./modserver if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("modserver.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("modserver")
}
