use clap::Parser;
use kospi_exec_etl::config::toml_config::TomlConfig;
use kospi_exec_etl::core::ConfigProvider;
use kospi_exec_etl::utils::validation::mask_secret;
use kospi_exec_etl::utils::{logger, validation::Validate};
use kospi_exec_etl::{DartClient, DisclosurePipeline, EtlEngine, LocalStorage};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "KOSPI executive disclosure ETL driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "etl-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the business year from config
    #[arg(long)]
    bsns_year: Option<i32>,

    /// Dry run - show what would be processed without calling OPENDART
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置 (日誌格式由配置決定，因此先載入)
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_logger(args.verbose, config.json_logs());

    tracing::info!("🚀 Starting TOML-based disclosure ETL");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(year) = args.bsns_year {
        config.report.bsns_year = Some(year);
        tracing::info!("🔧 Business year overridden to: {}", year);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No API requests will be sent");
        perform_dry_run(&config);
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let client = match DartClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.severity().exit_code().max(1));
        }
    };

    let storage = LocalStorage::new(config.output_path().to_string());
    tracing::info!("📡 OPENDART: {}", client.base_url());
    tracing::info!("💾 Output directory: {}", storage.base_path().display());
    let pipeline = DisclosurePipeline::new(storage, config, client);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ ETL process completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ ETL process completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = e.severity().exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  API: {} (key {})", config.api_base_url(), mask_secret(config.api_key()));
    println!(
        "  Report: {} / {} ({:?})",
        config.bsns_year(),
        config.report_code().code(),
        config.report_code()
    );
    println!("  Market: {} ({})", config.market(), config.market().code());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", format_list(config));

    if let Some(max) = config.max_corporations() {
        println!("  Max Corporations: {}", max);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn format_list(config: &TomlConfig) -> String {
    config
        .output_formats()
        .iter()
        .map(|format| format.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn perform_dry_run(config: &TomlConfig) {
    let policy = config.request_policy();

    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Request Plan:");
    println!("  1. corpCode.xml (corporation code list, ZIP)");
    println!("  2. company.json for each listed corporation, keep corp_cls = {}", config.market().code());
    println!("  3. Per {} corporation:", config.market());
    println!("     exctvSttus, hmvAuditIndvdlBySttus, indvdlByPay, hmvAuditAllSttus,");
    println!("     unrstExctvMendngSttus, outcmpnyDrctrNdChangeSttus, fnlttSinglAcnt");
    if config.include_holdings() {
        println!("     elestock (executive share holdings)");
    } else {
        println!("     elestock skipped");
    }
    println!(
        "  Throttle: {} ms between requests, timeout {} s, {} retries every {} s",
        policy.min_interval.as_millis(),
        policy.timeout.as_secs(),
        policy.retry_attempts,
        policy.retry_delay.as_secs()
    );

    println!();
    println!("🎯 Corporation Filter:");
    if config.corp_codes().is_empty() {
        println!("  All listed {} corporations", config.market());
    } else {
        println!("  Only: {}", config.corp_codes().join(", "));
    }
    if let Some(max) = config.max_corporations() {
        println!("  Stop after {} corporations", max);
    }

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Formats: {}", format_list(config));
    println!(
        "  Tables: executives, corporation_summary, listed_corp_codes, {}_company_info, run_report.json",
        config.market().label().to_lowercase()
    );
    if let Some(archive) = config.archive_name() {
        println!("  Compression: {} (ZIP)", archive);
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
