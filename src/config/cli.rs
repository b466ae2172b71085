use crate::adapters::{AuthMode, SinkKind};
use crate::config::PartialConfig;
use crate::core::load::{FailurePolicy, ItemSelection};
use clap::Parser;

#[derive(Clone, Default, Parser)]
#[command(name = "zbx-loadgen")]
#[command(about = "Provision test hosts and items in Zabbix, then flood them with trapper values")]
#[command(version)]
pub struct CliConfig {
    /// API endpoint, e.g. https://127.0.0.1/zabbix/api_jsonrpc.php
    #[arg(long)]
    pub url: Option<String>,

    /// Zabbix server address, used for host interfaces and by the sender
    #[arg(long)]
    pub server: Option<String>,

    /// API token (or session id with --auth body)
    #[arg(long)]
    pub token: Option<String>,

    /// Where the credential is sent
    #[arg(long, value_enum)]
    pub auth: Option<AuthMode>,

    /// Log in with a username instead of a token (needs --password)
    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// HTTP timeout per API call
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Number of test hosts
    #[arg(long)]
    pub hosts: Option<usize>,

    /// Number of trapper items per host
    #[arg(long)]
    pub items: Option<usize>,

    /// Host group name
    #[arg(long)]
    pub group: Option<String>,

    /// Hosts are named <prefix>-<n>
    #[arg(long)]
    pub host_prefix: Option<String>,

    /// Item keys are <prefix>[<n>]
    #[arg(long)]
    pub key_prefix: Option<String>,

    /// Agent port on the created host interfaces
    #[arg(long)]
    pub agent_port: Option<u16>,

    /// Stop after provisioning
    #[arg(long)]
    pub provision_only: bool,

    /// Send values for this many seconds
    #[arg(long, conflicts_with_all = ["iterations", "forever"])]
    pub duration: Option<u64>,

    /// Send this many values per host and item
    #[arg(long, conflicts_with = "forever")]
    pub iterations: Option<u64>,

    /// Send until interrupted with Ctrl-C
    #[arg(long)]
    pub forever: bool,

    /// Pause after each iteration, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// How values are delivered
    #[arg(long, value_enum)]
    pub sink: Option<SinkKind>,

    /// Path or name of the sender binary
    #[arg(long)]
    pub sender_bin: Option<String>,

    /// What to do when a value cannot be delivered
    #[arg(long, value_enum)]
    pub on_send_failure: Option<FailurePolicy>,

    /// Send to the first item of each host or to all of them
    #[arg(long, value_enum)]
    pub items_mode: Option<ItemSelection>,

    /// TOML file with defaults for any of the above
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log process CPU and memory between phases
    #[arg(long)]
    pub monitor: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Flags left at their defaults do not override the config file.
    pub fn to_partial(&self) -> PartialConfig {
        PartialConfig {
            url: self.url.clone(),
            token: self.token.clone(),
            auth: self.auth,
            username: self.user.clone(),
            password: self.password.clone(),
            timeout_secs: self.timeout_secs,
            server: self.server.clone(),
            hosts: self.hosts,
            items: self.items,
            group: self.group.clone(),
            host_prefix: self.host_prefix.clone(),
            key_prefix: self.key_prefix.clone(),
            agent_port: self.agent_port,
            provision_only: self.provision_only.then_some(true),
            duration_secs: self.duration,
            iterations: self.iterations,
            forever: self.forever.then_some(true),
            delay_ms: self.delay_ms,
            sink: self.sink,
            sender_bin: self.sender_bin.clone(),
            on_send_failure: self.on_send_failure,
            items_mode: self.items_mode,
            monitor: self.monitor.then_some(true),
        }
    }
}
