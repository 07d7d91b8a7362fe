use anyhow::Context;
use clap::Parser;
use world_in_flux::core::ConfigProvider;
use world_in_flux::utils::{logger, validation::Validate};
use world_in_flux::{CliConfig, EtlEngine, FluxPipeline, LocalStorage, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let toml_config = match &cli.config {
        Some(path) => Some(
            TomlConfig::from_file(path)
                .with_context(|| format!("failed to load configuration from {}", path))?,
        ),
        None => None,
    };

    // 日誌層級可由 TOML 的 [monitoring] 指定
    let verbose = cli.verbose
        || toml_config
            .as_ref()
            .and_then(|c| c.log_level())
            .is_some_and(|level| level.eq_ignore_ascii_case("debug"));
    if cli.log_json {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("Starting world-in-flux CLI");

    let exit_code = match toml_config {
        Some(config) => {
            tracing::info!("Using configuration file {}", cli.config.as_deref().unwrap_or_default());
            let monitor = cli.monitor || config.monitoring_enabled();
            execute(config, monitor, cli.dry_run).await
        }
        None => {
            if cli.verbose {
                tracing::debug!("CLI config: {:?}", cli);
            }
            let (monitor, dry_run) = (cli.monitor, cli.dry_run);
            execute(cli, monitor, dry_run).await
        }
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

async fn execute<C: ConfigProvider + Validate>(config: C, monitor: bool, dry_run: bool) -> i32 {
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        return 1;
    }

    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(".");
    let engine = EtlEngine::new_with_monitoring(FluxPipeline::new(storage, config), monitor);

    let outcome = if dry_run {
        engine.dry_run().await.map(|artifacts| {
            println!("🔍 Dry run: {} files would be written", artifacts.len());
            for (name, size) in artifacts {
                println!("   {} ({} bytes)", name, size);
            }
        })
    } else {
        engine.run().await.map(|output_path| {
            tracing::info!("✅ World in Flux completed successfully!");
            println!("✅ World in Flux completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        })
    };

    match outcome {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            e.exit_code()
        }
    }
}
