use churn_etl::config::cli::absolute_path;
use churn_etl::core::churn_pipeline::SUMMARY_FILENAME;
use churn_etl::presentation::DataGrid;
use churn_etl::utils::{logger, validation::Validate};
use churn_etl::{ChurnPipeline, CliConfig, EtlEngine, EtlError, LocalStorage};
use clap::Parser;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose, config.log_json);

    tracing::info!("Starting churn-etl CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e, 1);
    }

    // 輸入檔以工作目錄為準，不受輸出目錄影響
    config.input = match absolute_path(&config.input) {
        Ok(path) => path,
        Err(e) => exit_with(&e, e.severity().exit_code()),
    };

    let search = config.search.clone().unwrap_or_default();
    let (page, page_size) = (config.page, config.page_size);
    let summary_path = Path::new(&config.output_path).join(SUMMARY_FILENAME);

    // 創建存儲和管道
    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = match ChurnPipeline::new(storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => exit_with(&e, e.severity().exit_code()),
    };

    // 創建ETL引擎並運行
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(outcome) => {
            let grid = DataGrid::new(outcome.result.store.records());
            let page = grid.page(&search, page, page_size);
            println!("{}", grid.render(&page));
            println!();

            let submission = &outcome.result.submission;
            if submission.failed_batches() > 0 {
                println!(
                    "🔶 {} of {} batches failed:",
                    submission.failed_batches(),
                    submission.total_batches
                );
                for failure in &submission.failures {
                    println!(
                        "  batch {} ({} records): {}",
                        failure.batch_number, failure.records, failure.reason
                    );
                }
            }

            tracing::info!("✅ ETL process completed successfully!");
            println!("✅ ETL process completed successfully!");
            println!("📁 Output saved to: {}", outcome.output_path);
        }
        Err(e) => {
            report_error(&e);

            // 所有批次都失敗時，失敗清單只記錄在 summary.json
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

fn report_error(e: &EtlError) {
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
}

fn exit_with(e: &EtlError, code: i32) -> ! {
    report_error(e);
    std::process::exit(code.max(1));
}
