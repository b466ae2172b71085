use crate::adapters::{AuthMode, SinkKind};
use crate::config::{PartialConfig, RunConfig};
use crate::core::load::{FailurePolicy, ItemSelection};
use crate::utils::error::{LoadGenError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub provision: ProvisionSection,
    #[serde(default)]
    pub load: LoadSection,
    pub monitoring: Option<MonitoringSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    pub url: Option<String>,
    pub token: Option<String>,
    pub auth: Option<AuthMode>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionSection {
    pub server: Option<String>,
    pub hosts: Option<usize>,
    pub items: Option<usize>,
    pub group: Option<String>,
    pub host_prefix: Option<String>,
    pub key_prefix: Option<String>,
    pub agent_port: Option<u16>,
    pub only: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadSection {
    pub duration_seconds: Option<u64>,
    pub iterations: Option<u64>,
    pub forever: Option<bool>,
    pub delay_ms: Option<u64>,
    pub sink: Option<SinkKind>,
    pub sender_bin: Option<String>,
    pub on_send_failure: Option<FailurePolicy>,
    pub items_mode: Option<ItemSelection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitoringSection {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| LoadGenError::ConfigError {
            message: format!("cannot read config file '{}': {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads, validates and resolves a file that must hold every required value.
    pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
        let file = Self::from_file(path)?;
        file.validate()?;
        file.into_partial().resolve()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        toml::from_str(&processed).map_err(|e| LoadGenError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| {
            LoadGenError::ConfigError {
                message: format!("invalid substitution pattern: {}", e),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn into_partial(self) -> PartialConfig {
        PartialConfig {
            url: self.api.url,
            token: self.api.token,
            auth: self.api.auth,
            username: self.api.username,
            password: self.api.password,
            timeout_secs: self.api.timeout_seconds,
            server: self.provision.server,
            hosts: self.provision.hosts,
            items: self.provision.items,
            group: self.provision.group,
            host_prefix: self.provision.host_prefix,
            key_prefix: self.provision.key_prefix,
            agent_port: self.provision.agent_port,
            provision_only: self.provision.only,
            duration_secs: self.load.duration_seconds,
            iterations: self.load.iterations,
            forever: self.load.forever,
            delay_ms: self.load.delay_ms,
            sink: self.load.sink,
            sender_bin: self.load.sender_bin,
            on_send_failure: self.load.on_send_failure,
            items_mode: self.load.items_mode,
            monitor: self.monitoring.map(|m| m.enabled),
        }
    }
}

impl Validate for TomlConfig {
    /// Checks only what is present; required values are enforced after merging.
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.api.url {
            validation::validate_url("api.url", url)?;
        }
        if let Some(server) = &self.provision.server {
            validation::validate_non_empty_string("provision.server", server)?;
        }
        if let Some(prefix) = &self.provision.key_prefix {
            validation::validate_key_prefix("provision.key_prefix", prefix)?;
        }
        if let Some(timeout) = self.api.timeout_seconds {
            validation::validate_range("api.timeout_seconds", timeout, 1, 3600)?;
        }
        Ok(())
    }
}
