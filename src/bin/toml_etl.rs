use clap::Parser;
use tweetgraph_etl::config::toml_config::{AggregationConfig, TomlConfig};
use tweetgraph_etl::core::{ConfigProvider, Storage};
use tweetgraph_etl::utils::{logger, validation::Validate};
use tweetgraph_etl::AggregateEngine;
use tweetgraph_etl::LocalStorage;

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Tweet aggregation driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "tweetgraph.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override debug mode setting from config
    #[arg(long)]
    debug: Option<bool>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // The config decides the log format, so the subscriber comes up after
    // the file is read.
    if config.log_json() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based aggregation");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    if let Some(debug_override) = args.debug {
        config
            .aggregation
            .get_or_insert_with(AggregationConfig::default)
            .debug_mode = Some(debug_override);
        tracing::info!("🔧 Debug mode overridden to: {}", debug_override);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No batches will be written");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(
        config.cache_dir().to_string(),
        config.save_dir().to_string(),
    );
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
            if args.verbose {
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

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name,
        config.pipeline.version.as_deref().unwrap_or("0")
    );
    println!("  Cache: {}", config.cache_dir());
    println!("  Output: {}", config.save_dir());
    println!("  Format: {}", config.sink_format());
    println!("  Flush every: {} files", config.agg_interval());
    println!("  Debug Mode: {}", config.debug_mode());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Dry Run Analysis:");
    println!();

    let storage = LocalStorage::new(
        config.cache_dir().to_string(),
        config.save_dir().to_string(),
    );
    let mut files = storage.list_files().await?;
    files.retain(|name| name.ends_with(".json"));

    println!("📡 Cache Analysis:");
    println!("  Directory: {}", config.cache_dir());
    println!("  Response files: {}", files.len());
    for file in files.iter().take(5) {
        println!("    {}", file);
    }
    if files.len() > 5 {
        println!("    ... and {} more", files.len() - 5);
    }

    println!();
    println!("⚙️ Processing Mode:");
    if config.debug_mode() {
        println!("  🎯 Debug Mode: Will process at most 10 files");
    } else {
        println!("  📊 Normal Mode: Will process all {} files", files.len());
    }
    let flushes = files.len().div_ceil(config.agg_interval());
    println!("  📊 Expected flush windows: {}", flushes);

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.save_dir());
    println!("  Format: {}", config.sink_format());
    println!("  Batches per flush: tweets, users, media, ref, edges");

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
