//! Configuration loading for livecap.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, tables merge key by key):
//! 1. `/etc/livecap/config.toml` (system)
//! 2. `~/.config/livecap/config.toml` (user)
//! 3. `./livecap.toml` or the `--config` path (local override)
//! 4. Environment variables (`LIVECAP_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [output]
//! dir = "~/Videos/live"
//! max_segment_bytes = 1073741824   # 0 = one file per capture
//! chunk_bytes = 1048576
//!
//! [http]
//! connect_timeout_ms = 10000
//! proxy = "http://127.0.0.1:7890"
//! accept_invalid_certs = false
//! preset = "bilibili"
//!
//! [headers]
//! origin = "https://live.bilibili.com"
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{HttpConfig, OutputConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete livecap configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LiveConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub http: HttpConfig,

    /// Extra request headers; these win over preset headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl LiveConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` taking the place of `./livecap.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and variables contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path);
        let (mut config, mut sources) = Self::from_files(&files)?;

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Layer the given files over the defaults, without env overrides.
    pub fn from_files(files: &[PathBuf]) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in files {
            let table = loader::load_table(path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path.clone());
        }

        let origin = files.last().map(PathBuf::as_path).unwrap_or(Path::new("<defaults>"));
        let config = loader::into_config(merged, origin)?;

        Ok((config, sources))
    }

    /// Parse a single TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let origin = Path::new("<string>");
        let table = loader::parse_table(contents, origin)?;
        loader::into_config(table, origin)
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let body =
            toml::to_string_pretty(self).unwrap_or_else(|e| format!("# unserializable: {e}\n"));
        format!("# livecap configuration\n\n{body}")
    }
}
