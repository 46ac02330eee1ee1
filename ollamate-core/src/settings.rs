//! Runtime settings read from the environment.
//!
//! # Environment Variables
//!
//! - `OLLAMA_HOST`: Ollama base URL - default: "http://localhost:11434"
//! - `OLLAMATE_CONFIG`: path of the persisted configuration - default: "system_config.json"
//! - `OLLAMATE_TIMEOUT_SECS`: generation timeout in seconds - default: "300"
//! - `OLLAMATE_LOG_LEVEL`: log level when `RUST_LOG` is unset - default: "warn"
//!
//! Values that fail to parse fall back to the default with a warning.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::config::DEFAULT_CONFIG_FILE;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub ollama_host: String,
    pub config_path: PathBuf,
    pub request_timeout: Duration,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let ollama_host = non_empty("OLLAMA_HOST")
            .map(|host| normalize_host(&host))
            .unwrap_or(defaults.ollama_host);

        let config_path = non_empty("OLLAMATE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or(defaults.config_path);

        let request_timeout = match non_empty("OLLAMATE_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(
                        "could not parse OLLAMATE_TIMEOUT_SECS='{raw}', using {DEFAULT_TIMEOUT_SECS}s"
                    );
                    defaults.request_timeout
                }
            },
            None => defaults.request_timeout,
        };

        let log_level = non_empty("OLLAMATE_LOG_LEVEL").unwrap_or(defaults.log_level);

        Self {
            ollama_host,
            config_path,
            request_timeout,
            log_level,
        }
    }
}

/// Accept `host:port` and bare hosts the way the ollama CLI does.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(settings(&[]), Settings::default());
    }

    #[test]
    fn test_reads_overrides() {
        let s = settings(&[
            ("OLLAMA_HOST", "gpu-box:11434"),
            ("OLLAMATE_CONFIG", "/etc/ollamate/system_config.json"),
            ("OLLAMATE_TIMEOUT_SECS", "60"),
            ("OLLAMATE_LOG_LEVEL", "debug"),
        ]);
        assert_eq!(s.ollama_host, "http://gpu-box:11434");
        assert_eq!(
            s.config_path,
            PathBuf::from("/etc/ollamate/system_config.json")
        );
        assert_eq!(s.request_timeout, Duration::from_secs(60));
        assert_eq!(s.log_level, "debug");
    }

    #[test]
    fn test_bad_timeout_falls_back() {
        let s = settings(&[("OLLAMATE_TIMEOUT_SECS", "soon")]);
        assert_eq!(s.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let s = settings(&[("OLLAMATE_TIMEOUT_SECS", "0")]);
        assert_eq!(s.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let s = settings(&[("OLLAMA_HOST", "  "), ("OLLAMATE_CONFIG", "")]);
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("localhost:11434"), "http://localhost:11434");
        assert_eq!(normalize_host("https://ollama.lan/"), "https://ollama.lan");
        assert_eq!(normalize_host("http://127.0.0.1:11434"), "http://127.0.0.1:11434");
    }
}
