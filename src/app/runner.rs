use crate::adapters::{ApiSink, NullSink, SenderSink, SinkKind, ZabbixClient};
use crate::config::{ApiConfig, Credential, LoadConfig, RunConfig};
use crate::core::engine::RunEngine;
use crate::core::load::LoadGenerator;
use crate::core::provision::Provisioner;
use crate::domain::model::RunReport;
use crate::domain::ports::ValueSink;
use crate::utils::error::Result;
use std::sync::Arc;

/// 建立 API 客戶端，必要時先登入
pub async fn connect(api: &ApiConfig) -> Result<ZabbixClient> {
    let token = match &api.credential {
        Credential::Token(token) => token.as_str(),
        Credential::Login { .. } => "",
    };
    let mut client = ZabbixClient::with_timeout(&api.url, token, api.auth, api.timeout)?;

    match client.api_version().await {
        Ok(version) => tracing::info!("🔗 Connected to {} (API {})", api.url, version),
        Err(e) => tracing::warn!("⚠️ Could not read API version from {}: {}", api.url, e),
    }

    if let Credential::Login { username, password } = &api.credential {
        client.login(username, password).await?;
    }
    Ok(client)
}

/// 依設定選擇送值方式
pub fn build_sink(load: &LoadConfig, server: &str, client: &ZabbixClient) -> Arc<dyn ValueSink> {
    match load.sink {
        SinkKind::Sender => Arc::new(SenderSink::new(&load.sender_bin, server)),
        SinkKind::Api => Arc::new(ApiSink::new(client.clone())),
        SinkKind::None => Arc::new(NullSink),
    }
}

pub async fn run(config: &RunConfig) -> Result<RunReport> {
    let client = connect(&config.api).await?;

    let load = config.load.as_ref().map(|load| {
        let sink = build_sink(load, &config.plan.server_address, &client);
        LoadGenerator::new(sink, load.options)
    });

    let provisioner = Provisioner::new(client, config.plan.clone());
    let engine = RunEngine::new_with_monitoring(provisioner, load, config.monitor);
    engine.run().await
}

pub fn print_summary(report: &RunReport) {
    let provision = &report.provision;
    println!(
        "✅ Group {} ({}), {} hosts ({} new), {} items ({} new)",
        provision.group_id,
        if provision.group_created { "created" } else { "reused" },
        provision.hosts.len(),
        provision.hosts_created,
        provision.total_items(),
        provision.items_created
    );

    if let Some(load) = &report.load {
        for host in &load.hosts {
            match &host.aborted_by {
                Some(reason) => println!(
                    "  {}: {} sent, {} failed, stopped early: {}",
                    host.host, host.sent, host.failed, reason
                ),
                None => println!(
                    "  {}: {} sent, {} failed in {:.1?}",
                    host.host, host.sent, host.failed, host.elapsed
                ),
            }
        }
        println!(
            "📊 {} values sent, {} failed, {:.1} values/s",
            load.total_sent(),
            load.total_failed(),
            load.values_per_second()
        );
    }
    println!("⏱️ Total time: {:.1?}", report.elapsed);
}
