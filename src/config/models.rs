// src/config/models.rs
use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// TCP port the relay listens on, bound on all interfaces.
    pub listen_port: u16,

    /// Ordered list of backend base URLs. The locator probes them in order
    /// at startup and picks the first one that answers.
    pub backend_candidates: Vec<Url>,

    /// Path prefix that routes a request to the backend instead of the
    /// static file tree.
    pub forward_prefix: String,

    /// Root directory for static files.
    pub static_root: PathBuf,

    /// Timeout applied to each startup probe.
    pub probe_timeout_secs: u64,

    /// Timeout applied to every forwarded request. Expiry surfaces to the
    /// client as the usual 500 backend-error response.
    pub forward_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: 9425,
            backend_candidates: vec![
                Url::parse("http://172.17.0.8:11434").unwrap(),
                Url::parse("http://localhost:11434").unwrap(),
            ],
            forward_prefix: "/proxy-ollama/".to_string(),
            static_root: PathBuf::from("."),
            probe_timeout_secs: 3,
            forward_timeout_secs: 120,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.backend_candidates.is_empty() {
            bail!("backend_candidates must list at least one base URL");
        }
        if !self.forward_prefix.starts_with('/') || !self.forward_prefix.ends_with('/') {
            bail!(
                "forward_prefix must start and end with '/', got {:?}",
                self.forward_prefix
            );
        }
        if self.probe_timeout_secs == 0 {
            bail!("probe_timeout_secs must be non-zero");
        }
        if self.forward_timeout_secs == 0 {
            bail!("forward_timeout_secs must be non-zero");
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_port, 9425);
        assert_eq!(config.forward_prefix, "/proxy-ollama/");
        assert_eq!(config.backend_candidates.len(), 2);
    }

    #[test]
    fn rejects_empty_candidate_list() {
        let config = Config {
            backend_candidates: vec![],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_prefix_without_slashes() {
        let config = Config {
            forward_prefix: "proxy-ollama".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeouts() {
        let config = Config {
            forward_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let config: Config = serde_yaml::from_str(
            "listen_port: 8080\nbackend_candidates:\n  - http://localhost:11434\n",
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.backend_candidates.len(), 1);
        assert_eq!(config.forward_prefix, "/proxy-ollama/");
        assert_eq!(config.forward_timeout_secs, 120);
    }
}
