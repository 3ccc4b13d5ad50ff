//! Daemon configuration
//!
//! Every setting comes from a `NINHYDRIN_*` environment variable and falls
//! back to a built-in default.

use anyhow::{Context, Result};
use ::config::{Config, Environment};
use ninhydrin_core::application::reaper::DEFAULT_REAPER_INTERVAL_MS;
use ninhydrin_core::domain::LeasePolicy;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "NINHYDRIN";
const DEFAULT_DB_PATH: &str = "~/.ninhydrin/ninhydrin.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    pub db_path: String,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub log_format: LogFormat,
    pub default_timeout_secs: u32,
    pub default_retries: u32,
    pub max_capture_batch: u32,
    pub requeue_on_failure: bool,
    pub reaper_interval_ms: u64,
}

impl DaemonConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an explicit variable map, as if it were the environment
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(env: Environment) -> Result<Self> {
        let defaults = LeasePolicy::default();

        let mut config: DaemonConfig = Config::builder()
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("rpc_host", "127.0.0.1")?
            .set_default("rpc_port", 8080_i64)?
            .set_default("log_format", "pretty")?
            .set_default("default_timeout_secs", i64::from(defaults.default_timeout_secs))?
            .set_default("default_retries", i64::from(defaults.default_retries))?
            .set_default("max_capture_batch", i64::from(defaults.max_capture_batch))?
            .set_default("requeue_on_failure", defaults.requeue_on_failure)?
            .set_default("reaper_interval_ms", DEFAULT_REAPER_INTERVAL_MS as i64)?
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.db_path = shellexpand::tilde(&config.db_path).into_owned();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_timeout_secs == 0 {
            anyhow::bail!("NINHYDRIN_DEFAULT_TIMEOUT_SECS must be greater than 0");
        }
        if self.max_capture_batch == 0 {
            anyhow::bail!("NINHYDRIN_MAX_CAPTURE_BATCH must be greater than 0");
        }
        if self.reaper_interval_ms == 0 {
            anyhow::bail!("NINHYDRIN_REAPER_INTERVAL_MS must be greater than 0");
        }
        Ok(())
    }

    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.db_path)
    }

    /// Directory that must exist before the database file can be created
    pub fn db_dir(&self) -> Option<PathBuf> {
        PathBuf::from(&self.db_path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
    }

    pub fn lease_policy(&self) -> LeasePolicy {
        LeasePolicy {
            default_timeout_secs: self.default_timeout_secs,
            default_retries: self.default_retries,
            max_capture_batch: self.max_capture_batch,
            requeue_on_failure: self.requeue_on_failure,
        }
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_millis(self.reaper_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = DaemonConfig::from_map(HashMap::new()).unwrap();

        assert!(config.db_path.ends_with(".ninhydrin/ninhydrin.db"));
        assert_eq!(config.rpc_host, "127.0.0.1");
        assert_eq!(config.rpc_port, 8080);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.reaper_interval(), Duration::from_secs(1));

        let policy = config.lease_policy();
        assert_eq!(policy.default_timeout_secs, 60);
        assert_eq!(policy.default_retries, 3);
        assert_eq!(policy.max_capture_batch, 1000);
        assert!(policy.requeue_on_failure);
    }

    #[test]
    fn test_environment_overrides() {
        let config = DaemonConfig::from_map(vars(&[
            ("NINHYDRIN_DB_PATH", "/tmp/q.db"),
            ("NINHYDRIN_RPC_PORT", "9000"),
            ("NINHYDRIN_LOG_FORMAT", "json"),
            ("NINHYDRIN_REQUEUE_ON_FAILURE", "false"),
            ("NINHYDRIN_MAX_CAPTURE_BATCH", "50"),
        ]))
        .unwrap();

        assert_eq!(config.database_url(), "sqlite:///tmp/q.db");
        assert_eq!(config.db_dir(), Some(PathBuf::from("/tmp")));
        assert_eq!(config.rpc_port, 9000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.lease_policy().requeue_on_failure);
        assert_eq!(config.lease_policy().max_capture_batch, 50);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(DaemonConfig::from_map(vars(&[("NINHYDRIN_RPC_PORT", "not-a-port")])).is_err());
        assert!(DaemonConfig::from_map(vars(&[("NINHYDRIN_LOG_FORMAT", "xml")])).is_err());
        assert!(
            DaemonConfig::from_map(vars(&[("NINHYDRIN_DEFAULT_TIMEOUT_SECS", "0")])).is_err()
        );
    }
}
