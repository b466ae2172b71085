#[cfg(feature = "cli")]
pub mod cli;
pub mod prompt;
pub mod toml_config;

use crate::adapters::client::DEFAULT_TIMEOUT_SECS;
use crate::adapters::sinks::DEFAULT_SENDER_BIN;
use crate::adapters::{AuthMode, SinkKind};
use crate::core::load::{FailurePolicy, ItemSelection, LoadOptions, StopCondition, DEFAULT_DELAY_MS};
use crate::core::provision::ProvisionPlan;
use crate::utils::error::{LoadGenError, Result};
use crate::utils::validation::{self, Validate};
use prompt::Prompter;
use std::fmt;
use std::io::{BufRead, Write};
use std::time::Duration;

/// One year; longer runs should use `forever`.
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Settings from one source (flags, file). Every field is optional; sources
/// are layered with [`PartialConfig::or`] and the gaps filled by prompting.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PartialConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub auth: Option<AuthMode>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
    pub server: Option<String>,
    pub hosts: Option<usize>,
    pub items: Option<usize>,
    pub group: Option<String>,
    pub host_prefix: Option<String>,
    pub key_prefix: Option<String>,
    pub agent_port: Option<u16>,
    pub provision_only: Option<bool>,
    pub duration_secs: Option<u64>,
    pub iterations: Option<u64>,
    pub forever: Option<bool>,
    pub delay_ms: Option<u64>,
    pub sink: Option<SinkKind>,
    pub sender_bin: Option<String>,
    pub on_send_failure: Option<FailurePolicy>,
    pub items_mode: Option<ItemSelection>,
    pub monitor: Option<bool>,
}

impl PartialConfig {
    /// Field-wise `self` first, then `fallback`. Duration, iterations and
    /// forever are one setting: if `self` picks any of them, `fallback`'s
    /// stop mode is ignored entirely.
    pub fn or(self, fallback: PartialConfig) -> PartialConfig {
        let (duration_secs, iterations, forever) = if self.has_stop_condition() {
            (self.duration_secs, self.iterations, self.forever)
        } else {
            (fallback.duration_secs, fallback.iterations, fallback.forever)
        };

        PartialConfig {
            url: self.url.or(fallback.url),
            token: self.token.or(fallback.token),
            auth: self.auth.or(fallback.auth),
            username: self.username.or(fallback.username),
            password: self.password.or(fallback.password),
            timeout_secs: self.timeout_secs.or(fallback.timeout_secs),
            server: self.server.or(fallback.server),
            hosts: self.hosts.or(fallback.hosts),
            items: self.items.or(fallback.items),
            group: self.group.or(fallback.group),
            host_prefix: self.host_prefix.or(fallback.host_prefix),
            key_prefix: self.key_prefix.or(fallback.key_prefix),
            agent_port: self.agent_port.or(fallback.agent_port),
            provision_only: self.provision_only.or(fallback.provision_only),
            duration_secs,
            iterations,
            forever,
            delay_ms: self.delay_ms.or(fallback.delay_ms),
            sink: self.sink.or(fallback.sink),
            sender_bin: self.sender_bin.or(fallback.sender_bin),
            on_send_failure: self.on_send_failure.or(fallback.on_send_failure),
            items_mode: self.items_mode.or(fallback.items_mode),
            monitor: self.monitor.or(fallback.monitor),
        }
    }

    fn provision_only(&self) -> bool {
        self.provision_only.unwrap_or(false)
    }

    fn has_stop_condition(&self) -> bool {
        self.duration_secs.is_some() || self.iterations.is_some() || self.forever.unwrap_or(false)
    }

    fn has_login(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Asks for every required value that is still missing, in the order
    /// the questions make sense to a person at a terminal.
    pub fn prompt_missing<R: BufRead, W: Write>(&mut self, prompter: &mut Prompter<R, W>) -> Result<()> {
        if self.url.is_none() {
            self.url = Some(prompter.ask(
                "url",
                "API URL (e.g. https://127.0.0.1/zabbix/api_jsonrpc.php)",
            )?);
        }
        if self.server.is_none() {
            self.server = Some(prompter.ask("server", "Zabbix server address (e.g. 127.0.0.1)")?);
        }
        if self.token.is_none() && !self.has_login() {
            self.token = Some(prompter.ask_secret("token", "API token")?);
        }
        if self.hosts.is_none() {
            self.hosts = Some(prompter.ask_parsed("hosts", "Number of test hosts")?);
        }
        if self.items.is_none() {
            self.items = Some(prompter.ask_parsed("items", "Number of items per host")?);
        }
        if !self.provision_only() && !self.has_stop_condition() {
            self.duration_secs = Some(prompter.ask_parsed("duration", "Test duration in seconds")?);
        }
        Ok(())
    }

    /// Builds the final configuration; any required value still missing is an error.
    pub fn resolve(self) -> Result<RunConfig> {
        let url = validation::validate_required_field("url", &self.url)?.clone();
        let server = validation::validate_required_field("server", &self.server)?.clone();
        let hosts = *validation::validate_required_field("hosts", &self.hosts)?;
        let items = *validation::validate_required_field("items", &self.items)?;

        let credential = match (&self.token, &self.username, &self.password) {
            (_, Some(username), Some(password)) => Credential::Login {
                username: username.clone(),
                password: password.clone(),
            },
            (Some(token), _, _) => Credential::Token(token.clone()),
            (None, Some(_), None) => {
                return Err(LoadGenError::MissingConfigError {
                    field: "password".to_string(),
                })
            }
            (None, _, _) => {
                return Err(LoadGenError::MissingConfigError {
                    field: "token".to_string(),
                })
            }
        };

        let mut plan = ProvisionPlan::new(server, hosts, items);
        if let Some(group) = self.group.clone() {
            plan.group_name = group;
        }
        if let Some(prefix) = self.host_prefix.clone() {
            plan.host_prefix = prefix;
        }
        if let Some(prefix) = self.key_prefix.clone() {
            plan.key_prefix = prefix;
        }
        if let Some(port) = self.agent_port {
            plan.agent_port = port;
        }

        let load = if self.provision_only() {
            None
        } else {
            Some(LoadConfig {
                options: LoadOptions {
                    stop: self.stop_condition()?,
                    delay: Duration::from_millis(self.delay_ms.unwrap_or(DEFAULT_DELAY_MS)),
                    failure_policy: self.on_send_failure.unwrap_or_default(),
                    items: self.items_mode.unwrap_or_default(),
                },
                sink: self.sink.unwrap_or_default(),
                sender_bin: self
                    .sender_bin
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SENDER_BIN.to_string()),
            })
        };

        let config = RunConfig {
            api: ApiConfig {
                url,
                credential,
                auth: self.auth.unwrap_or_default(),
                timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            },
            plan,
            load,
            monitor: self.monitor.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }

    fn stop_condition(&self) -> Result<StopCondition> {
        let forever = self.forever.unwrap_or(false);
        match (self.duration_secs, self.iterations, forever) {
            (Some(secs), None, false) => Ok(StopCondition::Duration(Duration::from_secs(secs))),
            (None, Some(n), false) => Ok(StopCondition::Iterations(n)),
            (None, None, true) => Ok(StopCondition::Unbounded),
            (None, None, false) => Err(LoadGenError::MissingConfigError {
                field: "duration".to_string(),
            }),
            _ => Err(LoadGenError::ConfigError {
                message: "choose only one of duration, iterations or forever".to_string(),
            }),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Token(String),
    Login { username: String, password: String },
}

/// Shows whether a secret is set without showing it.
pub(crate) fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "***")
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Token(_) => f.debug_tuple("Token").field(&"***").finish(),
            Credential::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

impl fmt::Debug for PartialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialConfig")
            .field("url", &self.url)
            .field("token", &redact(&self.token))
            .field("auth", &self.auth)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("timeout_secs", &self.timeout_secs)
            .field("server", &self.server)
            .field("hosts", &self.hosts)
            .field("items", &self.items)
            .field("group", &self.group)
            .field("host_prefix", &self.host_prefix)
            .field("key_prefix", &self.key_prefix)
            .field("agent_port", &self.agent_port)
            .field("provision_only", &self.provision_only)
            .field("duration_secs", &self.duration_secs)
            .field("iterations", &self.iterations)
            .field("forever", &self.forever)
            .field("delay_ms", &self.delay_ms)
            .field("sink", &self.sink)
            .field("sender_bin", &self.sender_bin)
            .field("on_send_failure", &self.on_send_failure)
            .field("items_mode", &self.items_mode)
            .field("monitor", &self.monitor)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub url: String,
    pub credential: Credential,
    pub auth: AuthMode,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    pub options: LoadOptions,
    pub sink: SinkKind,
    pub sender_bin: String,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub api: ApiConfig,
    pub plan: ProvisionPlan,
    /// `None` for provision-only runs.
    pub load: Option<LoadConfig>,
    pub monitor: bool,
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("url", &self.api.url)?;
        validation::validate_non_empty_string("server", &self.plan.server_address)?;
        validation::validate_positive_number("hosts", self.plan.host_count, 1)?;
        validation::validate_non_empty_string("group", &self.plan.group_name)?;
        validation::validate_non_empty_string("host_prefix", &self.plan.host_prefix)?;
        validation::validate_key_prefix("key_prefix", &self.plan.key_prefix)?;
        validation::validate_range("agent_port", self.plan.agent_port, 1, u16::MAX)?;
        validation::validate_range("timeout", self.api.timeout.as_secs(), 1, 3600)?;

        if let Credential::Token(token) = &self.api.credential {
            validation::validate_non_empty_string("token", token)?;
        }

        if let Some(load) = &self.load {
            if let StopCondition::Duration(d) = load.options.stop {
                validation::validate_range("duration", d.as_secs(), 1, MAX_DURATION_SECS)?;
            }
            if load.sink == SinkKind::Sender {
                validation::validate_non_empty_string("sender_bin", &load.sender_bin)?;
            }
        }
        Ok(())
    }
}
