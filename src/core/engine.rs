use crate::core::load::LoadGenerator;
use crate::core::provision::Provisioner;
use crate::domain::model::RunReport;
use crate::domain::ports::ApiTransport;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::time::Instant;

/// Provisioning followed by load generation. Without a load generator the
/// run ends after provisioning.
pub struct RunEngine<T: ApiTransport> {
    provisioner: Provisioner<T>,
    load: Option<LoadGenerator>,
    monitor: SystemMonitor,
}

impl<T: ApiTransport> RunEngine<T> {
    pub fn new(provisioner: Provisioner<T>, load: Option<LoadGenerator>) -> Self {
        Self::new_with_monitoring(provisioner, load, false)
    }

    pub fn new_with_monitoring(
        provisioner: Provisioner<T>,
        load: Option<LoadGenerator>,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            provisioner,
            load,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();
        self.monitor.log_phase("Start");

        let plan = self.provisioner.plan();
        tracing::info!(
            "🏗️ Provisioning group '{}' with {} hosts x {} items",
            plan.group_name,
            plan.host_count,
            plan.items_per_host
        );
        let provision = self.provisioner.provision().await?;
        self.monitor.log_phase("Provisioning");

        let load = match &self.load {
            Some(generator) => {
                let report = generator.run(&provision.hosts).await;
                self.monitor.log_phase("Load");
                Some(report)
            }
            None => {
                tracing::info!("⏭️ Provision-only run, skipping load generation");
                None
            }
        };

        Ok(RunReport {
            provision,
            load,
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::NullSink;
    use crate::core::load::{LoadOptions, StopCondition};
    use crate::core::provision::tests::FakeZabbix;
    use crate::core::provision::ProvisionPlan;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_run_provisions_then_loads() {
        let fake = FakeZabbix::default();
        let provisioner = Provisioner::new(&fake, ProvisionPlan::new("127.0.0.1", 2, 3));
        let load = LoadGenerator::new(
            Arc::new(NullSink),
            LoadOptions::new(StopCondition::Iterations(3)),
        );
        let engine = RunEngine::new(provisioner, Some(load));

        let report = engine.run().await.unwrap();

        assert_eq!(report.provision.hosts.len(), 2);
        let load = report.load.unwrap();
        assert_eq!(load.total_sent(), 6);
    }

    #[tokio::test]
    async fn test_provision_only() {
        let fake = FakeZabbix::default();
        let provisioner = Provisioner::new(&fake, ProvisionPlan::new("127.0.0.1", 1, 1));
        let engine = RunEngine::new(provisioner, None);

        let report = engine.run().await.unwrap();

        assert!(report.load.is_none());
        assert_eq!(fake.item_count(), 1);
    }

    #[tokio::test]
    async fn test_provision_failure_skips_load() {
        let fake = FakeZabbix::default();
        fake.fail_at(1);
        let provisioner = Provisioner::new(&fake, ProvisionPlan::new("127.0.0.1", 1, 1));
        let load = LoadGenerator::new(
            Arc::new(NullSink),
            LoadOptions::new(StopCondition::Iterations(1)),
        );
        let engine = RunEngine::new(provisioner, Some(load));

        assert!(engine.run().await.is_err());
        assert_eq!(fake.calls(), vec!["hostgroup.get".to_string()]);
    }
}
