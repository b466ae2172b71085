use crate::domain::model::{HostLoadReport, LoadReport, ProvisionedHost};
use crate::domain::ports::ValueSink;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

pub const DEFAULT_DELAY_MS: u64 = 10;

/// When a per-host worker stops sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Until this much wall-clock time has passed since the worker started.
    Duration(Duration),
    /// After this many iterations.
    Iterations(u64),
    /// Until the process is interrupted.
    Unbounded,
}

impl std::fmt::Display for StopCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopCondition::Duration(d) => write!(f, "for {:?}", d),
            StopCondition::Iterations(n) => write!(f, "for {} iterations", n),
            StopCondition::Unbounded => write!(f, "until interrupted"),
        }
    }
}

/// What a worker does when the sink rejects a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Count it and move on without a log line.
    Ignore,
    /// Count it, log a warning and move on.
    #[default]
    Log,
    /// Stop this host's worker.
    Abort,
}

/// Which of a host's item keys receive a value each iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ItemSelection {
    #[default]
    First,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub stop: StopCondition,
    pub delay: Duration,
    pub failure_policy: FailurePolicy,
    pub items: ItemSelection,
}

impl LoadOptions {
    pub fn new(stop: StopCondition) -> Self {
        Self {
            stop,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            failure_policy: FailurePolicy::default(),
            items: ItemSelection::default(),
        }
    }
}

/// Fans out one worker per host and waits for all of them.
pub struct LoadGenerator {
    sink: Arc<dyn ValueSink>,
    options: LoadOptions,
}

impl LoadGenerator {
    pub fn new(sink: Arc<dyn ValueSink>, options: LoadOptions) -> Self {
        Self { sink, options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub async fn run(&self, hosts: &[ProvisionedHost]) -> LoadReport {
        let started = Instant::now();
        tracing::info!(
            "🚀 Sending values for {} hosts via {} sink {}",
            hosts.len(),
            self.sink.name(),
            self.options.stop
        );

        let mut workers = JoinSet::new();
        for host in hosts {
            let keys: Vec<String> = match self.options.items {
                ItemSelection::First => host.item_keys.iter().take(1).cloned().collect(),
                ItemSelection::All => host.item_keys.clone(),
            };
            if keys.is_empty() {
                tracing::warn!("⚠️ Host '{}' has no items, nothing to send", host.name);
                continue;
            }

            workers.spawn(run_host(
                Arc::clone(&self.sink),
                host.name.clone(),
                keys,
                self.options,
            ));
        }

        let mut reports = Vec::with_capacity(workers.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!("❌ Load worker did not finish: {}", e),
            }
        }
        reports.sort_by(|a, b| a.host.cmp(&b.host));

        let report = LoadReport {
            hosts: reports,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "📊 Load finished: {} values sent, {} failed, {:.1} values/s",
            report.total_sent(),
            report.total_failed(),
            report.values_per_second()
        );
        report
    }
}

async fn run_host(
    sink: Arc<dyn ValueSink>,
    host: String,
    keys: Vec<String>,
    options: LoadOptions,
) -> HostLoadReport {
    tracing::info!("▶️ Host '{}': sending to {} item(s) {}", host, keys.len(), options.stop);

    let started = Instant::now();
    // A deadline past what Instant can represent never arrives.
    let deadline = match options.stop {
        StopCondition::Duration(d) => started.checked_add(d),
        _ => None,
    };

    let mut iteration: u64 = 0;
    let mut sent: u64 = 0;
    let mut failed: u64 = 0;
    let mut aborted_by = None;

    'run: loop {
        let done = match options.stop {
            StopCondition::Duration(_) => deadline.is_some_and(|d| Instant::now() >= d),
            StopCondition::Iterations(n) => iteration >= n,
            StopCondition::Unbounded => false,
        };
        if done {
            break;
        }

        iteration += 1;
        let value = iteration.to_string();
        for key in &keys {
            match sink.send(&host, key, &value).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    failed += 1;
                    match options.failure_policy {
                        FailurePolicy::Ignore => {}
                        FailurePolicy::Log => tracing::warn!("⚠️ {}", e),
                        FailurePolicy::Abort => {
                            tracing::error!("❌ Stopping host '{}': {}", host, e);
                            aborted_by = Some(e.to_string());
                            break 'run;
                        }
                    }
                }
            }
        }

        tokio::time::sleep(options.delay).await;
    }

    let elapsed = started.elapsed();
    tracing::info!(
        "⏹️ Host '{}' done: {} sent, {} failed in {:?}",
        host,
        sent,
        failed,
        elapsed
    );
    HostLoadReport {
        host,
        sent,
        failed,
        elapsed,
        aborted_by,
    }
}
