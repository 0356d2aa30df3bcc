//! Config file sections.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use crate::loader::expand_path;

fn expanded_path<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PathBuf, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(expand_path(&raw))
}

/// Where and how segments are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory relative output names are resolved against.
    /// Default: current directory
    #[serde(default = "OutputConfig::default_dir", deserialize_with = "expanded_path")]
    pub dir: PathBuf,

    /// Rotation threshold in bytes, 0 for a single file.
    /// Default: 1 GiB
    #[serde(default = "OutputConfig::default_max_segment_bytes")]
    pub max_segment_bytes: u64,

    /// Read buffer size.
    /// Default: 1 MiB
    #[serde(default = "OutputConfig::default_chunk_bytes")]
    pub chunk_bytes: usize,
}

impl OutputConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from(".")
    }

    fn default_max_segment_bytes() -> u64 {
        1024 * 1024 * 1024
    }

    fn default_chunk_bytes() -> usize {
        1024 * 1024
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            max_segment_bytes: Self::default_max_segment_bytes(),
            chunk_bytes: Self::default_chunk_bytes(),
        }
    }
}

/// HTTP client settings for the live source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Default: 10000
    #[serde(default = "HttpConfig::default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default)]
    pub proxy: Option<String>,

    /// Skip TLS certificate verification (some CDNs serve broken chains).
    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Named header preset, e.g. "bilibili".
    #[serde(default)]
    pub preset: Option<String>,
}

impl HttpConfig {
    fn default_connect_timeout_ms() -> u64 {
        10_000
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: Self::default_connect_timeout_ms(),
            proxy: None,
            accept_invalid_certs: false,
            user_agent: None,
            preset: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Log level or full `EnvFilter` directive.
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
