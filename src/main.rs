use clap::Parser;
use std::time::Duration;
use tirana_index::utils::{logger, validation::Validate};
use tirana_index::{
    CliConfig, IndexEngine, LocalStorage, Neighborhood, ScrapePipeline, ScrapeSettings,
    WebDriverFactory,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting tirana-index");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let settings = match ScrapeSettings::load(config.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Could not load settings: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    // Environment-level failure: without the input list there is no run.
    let neighborhoods = Neighborhood::load_from_csv(&config.neighborhoods)?;
    if neighborhoods.is_empty() {
        tracing::warn!(file = %config.neighborhoods, "input file contains no neighborhoods");
    }
    tracing::info!("Loaded {} neighborhoods", neighborhoods.len());

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let factory = WebDriverFactory::new(
        config.webdriver_url.clone(),
        Duration::from_secs(settings.site.settle_seconds),
        Duration::from_secs(settings.site.render_timeout_seconds),
    );
    let pipeline = ScrapePipeline::new(storage, config, settings, factory, neighborhoods);

    let engine = IndexEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Crawl completed");
            println!("✅ Crawl completed");
            println!("📁 Historical index: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                tirana_index::utils::error::ErrorSeverity::Low => 0,
                tirana_index::utils::error::ErrorSeverity::Medium => 2,
                tirana_index::utils::error::ErrorSeverity::High => 1,
                tirana_index::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
