//! Unattended runner: every setting comes from a TOML file, nothing is prompted.

use clap::Parser;
use zbx_loadgen::app::runner;
use zbx_loadgen::config::toml_config::TomlConfig;
use zbx_loadgen::utils::logger;
use zbx_loadgen::LoadGenError;

#[derive(Parser)]
#[command(name = "toml-loadgen")]
#[command(about = "Zabbix load generator driven entirely by a TOML file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "configs/loadgen.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn fail(e: &LoadGenError) -> ! {
    tracing::error!("❌ {}", e);
    eprintln!("❌ {}", e);
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match TomlConfig::load_run_config(&args.config) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    tracing::info!(
        "✅ Configuration loaded: {} hosts x {} items against {}",
        config.plan.host_count,
        config.plan.items_per_host,
        config.api.url
    );

    tokio::select! {
        result = runner::run(&config) => match result {
            Ok(report) => runner::print_summary(&report),
            Err(e) => fail(&e),
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("🛑 Interrupted, stopping load generation");
        }
    }
}
