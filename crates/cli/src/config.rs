//! Layered configuration
//!
//! Precedence (lowest first): built-in defaults, TOML file, `AEGIS_*`
//! environment variables, command-line flags.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use aegis_core::application::constants::{
    DEFAULT_ENV_ALLOWLIST, DEFAULT_MAX_CONCURRENCY, DEFAULT_PROBE_TIMEOUT,
};
use aegis_core::application::AuditOptions;
use aegis_core::domain::registry::DEFAULT_MAX_IDLE_SECS;
use aegis_core::domain::{RegistryOptions, UnsetKeyPolicy};
use aegis_core::AppError;

const ENV_PREFIX: &str = "AEGIS";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AegisConfig {
    pub probe_timeout_ms: u64,
    pub max_concurrency: usize,
    pub audit_deadline_ms: Option<u64>,
    pub unset_key_policy: UnsetKeyPolicy,
    pub max_idle_secs: i64,
    pub env_allowlist: Vec<String>,
}

impl Default for AegisConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT.as_millis() as u64,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            audit_deadline_ms: None,
            unset_key_policy: UnsetKeyPolicy::default(),
            max_idle_secs: DEFAULT_MAX_IDLE_SECS,
            env_allowlist: DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AegisConfig {
    /// Load from an explicit file (must exist) or the platform config dir (optional),
    /// then the process environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(p) => Some((PathBuf::from(shellexpand::tilde(p).into_owned()), true)),
            None => default_config_path().map(|p| (p, false)),
        };

        Self::load_from(file, environment()).context("Failed to load configuration")
    }

    fn load_from(file: Option<(PathBuf, bool)>, env: Environment) -> aegis_core::Result<Self> {
        let mut builder = Config::builder();

        if let Some((path, required)) = file {
            tracing::debug!(path = %path.display(), required, "Reading config file");
            builder = builder.add_source(File::from(path).required(required));
        }

        builder
            .add_source(env)
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn audit_options(&self) -> AuditOptions {
        AuditOptions {
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            max_concurrency: self.max_concurrency,
            audit_deadline: self.audit_deadline_ms.map(Duration::from_millis),
        }
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            unset_key_policy: self.unset_key_policy,
            max_idle_secs: self.max_idle_secs,
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("env_allowlist")
}

/// `<config_dir>/aegis/config.toml`, when the platform has a config dir
fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "aegis")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
