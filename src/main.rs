use clap::Parser;
use tweetgraph_etl::utils::{logger, validation::Validate};
use tweetgraph_etl::{AggregateEngine, CliConfig, LocalStorage};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting tweetgraph-etl CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }
    let verbose = config.verbose;

    let storage = LocalStorage::new(config.cache_dir.clone(), config.save_dir.clone());
    let engine = AggregateEngine::new_with_monitoring(storage, config, monitor_enabled);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Aggregation completed successfully!");
            println!("✅ Aggregation completed successfully!");
            println!(
                "📁 Parsed {}/{} files into {} batches in {:.2}s",
                summary.files_parsed,
                summary.files_seen,
                summary.batches_written,
                summary.elapsed_secs
            );
            if !summary.not_loaded.is_empty() {
                println!("⚠️ {} files could not be loaded:", summary.not_loaded.len());
                for file in &summary.not_loaded {
                    println!("  {}", file);
                }
            }
            if verbose {
                println!("📊 Run summary:");
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Aggregation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                tweetgraph_etl::utils::error::ErrorSeverity::Low => 0,
                tweetgraph_etl::utils::error::ErrorSeverity::Medium => 2,
                tweetgraph_etl::utils::error::ErrorSeverity::High => 1,
                tweetgraph_etl::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
