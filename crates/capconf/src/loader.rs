//! Config file discovery, layering, and environment variable overlay.

use crate::{ConfigError, LiveConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/livecap/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("livecap/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("livecap.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read one config file as a raw table.
///
/// The table is also deserialized on its own so type errors point at the
/// file that caused them.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_table(&contents, path)
}

pub(crate) fn parse_table(contents: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    into_config(table.clone(), path)?;
    Ok(table)
}

pub(crate) fn into_config(table: toml::Table, path: &Path) -> Result<LiveConfig, ConfigError> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Merge `overlay` into `base`. Nested tables merge key by key, everything
/// else (scalars, arrays) is replaced.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut LiveConfig, sources: &mut ConfigSources) {
    apply_env_overrides_from(config, sources, env::vars());
}

/// Apply overrides from an explicit list of variables.
pub fn apply_env_overrides_from<I>(config: &mut LiveConfig, sources: &mut ConfigSources, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut rust_log = None;

    for (key, value) in vars {
        let applied = match key.as_str() {
            "LIVECAP_OUTPUT_DIR" => {
                config.output.dir = expand_path(&value);
                true
            }
            "LIVECAP_MAX_SEGMENT_BYTES" => match value.parse() {
                Ok(bytes) => {
                    config.output.max_segment_bytes = bytes;
                    true
                }
                Err(_) => false,
            },
            "LIVECAP_CHUNK_BYTES" => match value.parse() {
                Ok(bytes) => {
                    config.output.chunk_bytes = bytes;
                    true
                }
                Err(_) => false,
            },
            "LIVECAP_CONNECT_TIMEOUT_MS" => match value.parse() {
                Ok(ms) => {
                    config.http.connect_timeout_ms = ms;
                    true
                }
                Err(_) => false,
            },
            "LIVECAP_PROXY" => {
                config.http.proxy = Some(value).filter(|v| !v.is_empty());
                true
            }
            "LIVECAP_PRESET" => {
                config.http.preset = Some(value).filter(|v| !v.is_empty());
                true
            }
            "LIVECAP_LOG_LEVEL" => {
                config.telemetry.log_level = value;
                true
            }
            // Applied last so it wins over LIVECAP_LOG_LEVEL regardless of order.
            "RUST_LOG" => {
                rust_log = Some(value);
                false
            }
            _ => match header_name_from_env(&key) {
                Some(name) => {
                    config.headers.insert(name, value);
                    true
                }
                None => false,
            },
        };

        if applied {
            sources.env_overrides.push(key);
        }
    }

    if let Some(value) = rust_log {
        config.telemetry.log_level = value;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

/// `LIVECAP_HEADER_USER_AGENT` → `user-agent`.
pub fn header_name_from_env(key: &str) -> Option<String> {
    key.strip_prefix("LIVECAP_HEADER_")
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.to_ascii_lowercase().replace('_', "-"))
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/test/path");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_absolute() {
        let expanded = expand_path("/absolute/path");
        assert_eq!(expanded, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_discover_with_cli_override() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(&path, "[output]\nmax_segment_bytes = 5\n").unwrap();

        let files = discover_config_files_with_override(Some(&path));
        assert_eq!(files.last(), Some(&path));
        assert!(!files.contains(&PathBuf::from("livecap.toml")));

        // A missing override is skipped rather than reported.
        let missing = temp_dir.path().join("missing.toml");
        let files = discover_config_files_with_override(Some(&missing));
        assert!(!files.contains(&missing));
    }

    #[test]
    fn test_header_name_from_env() {
        assert_eq!(
            header_name_from_env("LIVECAP_HEADER_USER_AGENT"),
            Some("user-agent".to_string())
        );
        assert_eq!(
            header_name_from_env("LIVECAP_HEADER_REFERER"),
            Some("referer".to_string())
        );
        assert_eq!(header_name_from_env("LIVECAP_HEADER_"), None);
        assert_eq!(header_name_from_env("LIVECAP_PROXY"), None);
    }

    #[test]
    fn test_merge_tables_is_deep() {
        let mut base: toml::Table = r#"
[output]
dir = "/base"
max_segment_bytes = 100

[headers]
referer = "https://a.example/"
"#
        .parse()
        .unwrap();

        let overlay: toml::Table = r#"
[output]
max_segment_bytes = 200

[headers]
origin = "https://b.example"
"#
        .parse()
        .unwrap();

        merge_tables(&mut base, overlay);

        let output = base["output"].as_table().unwrap();
        assert_eq!(output["dir"].as_str(), Some("/base"));
        assert_eq!(output["max_segment_bytes"].as_integer(), Some(200));

        let headers = base["headers"].as_table().unwrap();
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = LiveConfig::default();
        let mut sources = ConfigSources::default();

        apply_env_overrides_from(
            &mut config,
            &mut sources,
            vars(&[
                ("RUST_LOG", "livecap=trace"),
                ("LIVECAP_LOG_LEVEL", "warn"),
                ("LIVECAP_MAX_SEGMENT_BYTES", "2048"),
                ("LIVECAP_CHUNK_BYTES", "not-a-number"),
                ("LIVECAP_PROXY", "socks5://127.0.0.1:1080"),
                ("LIVECAP_HEADER_REFERER", "https://live.example/"),
                ("HOME", "/home/someone"),
            ]),
        );

        assert_eq!(config.output.max_segment_bytes, 2048);
        assert_eq!(config.output.chunk_bytes, 1024 * 1024);
        assert_eq!(config.http.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert_eq!(config.headers["referer"], "https://live.example/");
        assert_eq!(config.telemetry.log_level, "livecap=trace");

        assert!(sources.env_overrides.contains(&"LIVECAP_MAX_SEGMENT_BYTES".to_string()));
        assert!(!sources.env_overrides.contains(&"LIVECAP_CHUNK_BYTES".to_string()));
        assert!(!sources.env_overrides.contains(&"HOME".to_string()));
        assert_eq!(sources.env_overrides.last().map(String::as_str), Some("RUST_LOG"));
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        let err = parse_table("[output]\nmax_segment_bytes = \"big\"\n", Path::new("bad.toml"))
            .unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, PathBuf::from("bad.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
