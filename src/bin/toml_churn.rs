use anyhow::Context;
use churn_etl::config::cli::absolute_path;
use churn_etl::core::batch_submitter::batch_count;
use churn_etl::core::churn_pipeline::SUMMARY_FILENAME;
use churn_etl::core::csv_decoder::decode_csv;
use churn_etl::domain::ports::ConfigProvider;
use churn_etl::utils::{logger, validation::Validate};
use churn_etl::{ChurnPipeline, EtlEngine, EtlError, LocalStorage, TomlConfig};
use clap::Parser;
use std::path::Path;

#[derive(Parser)]
#[command(name = "toml-churn")]
#[command(about = "Churn prediction ETL driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "churn-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the batch size from config
    #[arg(long)]
    batch_size: Option<usize>,

    /// Override the number of batches in flight from config
    #[arg(long)]
    concurrency: Option<usize>,

    /// Dry run - show what would be sent without calling the API
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based churn ETL");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(batch_size) = args.batch_size {
        config.submit.batch_size = batch_size;
        tracing::info!("🔧 Batch size overridden to: {}", batch_size);
    }
    if let Some(concurrency) = args.concurrency {
        config.submit.concurrency = concurrency;
        tracing::info!("🔧 Concurrency overridden to: {}", concurrency);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    config.input.path = absolute_path(&config.input.path)
        .with_context(|| format!("resolving input path {}", config.input.path))?;

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No requests will be sent");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let summary_path = Path::new(config.output_path()).join(SUMMARY_FILENAME);

    // 創建存儲和管道
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = ChurnPipeline::new(storage, config).context("building HTTP client")?;

    // 創建 ETL 引擎並運行
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(outcome) => {
            let aggregates = &outcome.result.aggregates;
            tracing::info!("✅ ETL process completed successfully!");
            println!("✅ ETL process completed successfully!");
            println!(
                "📊 {} customers scored: {} churned, {} stayed",
                aggregates.total, aggregates.churned, aggregates.stayed
            );
            println!("📁 Output saved to: {}", outcome.output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            if matches!(e, EtlError::EmptyExport) {
                eprintln!("📄 Per-batch failures: {}", summary_path.display());
            }

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
    match &config.pipeline.version {
        Some(version) => println!("  Pipeline: {} v{}", config.pipeline.name, version),
        None => println!("  Pipeline: {}", config.pipeline.name),
    }
    if let Some(description) = &config.pipeline.description {
        println!("  Description: {}", description);
    }
    println!("  Endpoint: {}", config.api_endpoint());
    println!("  Input: {}", config.input_path());
    println!("  Output: {}", config.output_path());
    println!(
        "  Batches: {} records each, {} in flight",
        config.batch_size(),
        config.concurrency()
    );
    println!("  Schema Mapping: {}", config.apply_schema_mapping());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");
    println!();

    let bytes = tokio::fs::read(config.input_path())
        .await
        .with_context(|| format!("reading input file {}", config.input_path()))?;
    let records = decode_csv(&String::from_utf8_lossy(&bytes)).context("decoding input CSV")?;

    println!("📥 Input:");
    println!("  Records: {}", records.len());
    if let Some(first) = records.first() {
        let columns: Vec<&str> = first.keys().collect();
        println!("  Columns: {}", columns.join(", "));
    }

    println!();
    println!("📡 Submission:");
    println!("  Endpoint: {}", config.api_endpoint());
    println!(
        "  Batches: {} of up to {} records",
        batch_count(records.len(), config.batch_size()),
        config.batch_size()
    );
    if let Some(timeout) = config.request_timeout() {
        println!("  Timeout: {}s per request", timeout.as_secs());
    }

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Export: {}", config.export_filename());
    if config.bundle_report() {
        println!("  Bundle: churn_report.zip");
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
