use clap::Parser;
use zbx_loadgen::app::runner;
use zbx_loadgen::config::prompt::Prompter;
use zbx_loadgen::config::toml_config::TomlConfig;
use zbx_loadgen::utils::logger;
use zbx_loadgen::utils::validation::Validate;
use zbx_loadgen::{CliConfig, LoadGenError, PartialConfig, RunConfig};

fn load_config(cli: &CliConfig) -> Result<RunConfig, LoadGenError> {
    let mut partial = cli.to_partial();

    if let Some(path) = &cli.config {
        tracing::info!("📁 Loading configuration from: {}", path);
        let file = TomlConfig::from_file(path)?;
        file.validate()?;
        partial = partial.or(file.into_partial());
    }

    // 缺少的值由終端機詢問
    let mut prompter = Prompter::stdio();
    partial.prompt_missing(&mut prompter)?;
    PartialConfig::resolve(partial)
}

fn fail(e: &LoadGenError) -> ! {
    tracing::error!("❌ {}", e);
    eprintln!("❌ {}", e);
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(cli.verbose, cli.json_logs);
    tracing::info!("Starting zbx-loadgen");
    if cli.verbose {
        tracing::debug!("CLI flags: {:?}", cli.to_partial());
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    tokio::select! {
        result = runner::run(&config) => match result {
            Ok(report) => runner::print_summary(&report),
            Err(e) => fail(&e),
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("🛑 Interrupted, stopping load generation");
            println!("🛑 Interrupted");
        }
    }
}
