use clap::Parser;
use order_etl::utils::{logger, validation::Validate};
use order_etl::{CliConfig, FileCache, LocalStorage, OrderPipeline, ScrapeEngine};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting order-etl");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let cache = Arc::new(FileCache::new(config.cache_path.clone()));
    let storage = LocalStorage::new(config.output_path.clone());
    let monitor_enabled = config.monitor;

    let pipeline = match OrderPipeline::new(cache, storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("❌ Could not initialize the pipeline: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let engine = ScrapeEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Scrape completed");
            println!("✅ Scrape completed: {} orders, {} item rows", report.orders, report.items);
            for path in &report.exports_written {
                println!("📁 Wrote {}", path);
            }
            for (path, reason) in &report.exports_failed {
                eprintln!("⚠️ Could not write {}: {}", path, reason);
            }
            if !report.failed_order_ids.is_empty() {
                eprintln!(
                    "⚠️ {} orders could not be fetched: {}",
                    report.failed_order_ids.len(),
                    report.failed_order_ids.join(", ")
                );
                eprintln!("   Re-run to retry them; cached data will not be refetched.");
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Scrape failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                order_etl::utils::error::ErrorSeverity::Low => 0,
                order_etl::utils::error::ErrorSeverity::Medium => 2,
                order_etl::utils::error::ErrorSeverity::High => 1,
                order_etl::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
