use clap::Parser;
use column_rewrite::core::{ConfigProvider, Storage};
use column_rewrite::utils::{logger, validation::Validate};
use column_rewrite::{ColumnRewritePipeline, EtlEngine, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-rewrite")]
#[command(about = "Column rewrite driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "rewrite-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override concurrency.batch_size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Override concurrency.max_concurrent
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Load and inspect the input without calling the API
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置 (日誌尚未初始化，錯誤直接輸出)
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if args.batch_size.is_some() || args.max_concurrent.is_some() {
        let concurrency = config.concurrency.get_or_insert_with(Default::default);
        if let Some(batch_size) = args.batch_size {
            concurrency.batch_size = Some(batch_size);
            tracing::info!("🔧 batch_size overridden to: {}", batch_size);
        }
        if let Some(max_concurrent) = args.max_concurrent {
            concurrency.max_concurrent = Some(max_concurrent);
            tracing::info!("🔧 max_concurrent overridden to: {}", max_concurrent);
        }
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.severity().exit_code());
    }

    display_config_summary(&config, &args);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let pipeline = ColumnRewritePipeline::new(LocalStorage::default(), config)?;

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No API requests will be made");
        perform_dry_run(&pipeline).await?;
        return Ok(());
    }

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Column rewrite completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Column rewrite failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            std::process::exit(e.severity().exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    let run = config.run_configuration();

    println!("📋 Configuration Summary:");
    println!(
        "  Input: {} (column {}, sheet {})",
        config.input_path(),
        config.source_column(),
        config.sheet_name()
    );
    println!("  Output: {} (column {})", config.output_path(), config.target_column());
    println!("  Endpoint: {} ({})", run.endpoint, run.model);
    println!(
        "  Batches: {} rows, max {} concurrent requests, {:?} pause",
        run.batch_size, run.max_concurrent, run.pacing_delay
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run<S, C>(pipeline: &ColumnRewritePipeline<S, C>) -> anyhow::Result<()>
where
    S: Storage,
    C: ConfigProvider,
{
    let report = pipeline.dry_run().await?;

    println!("🔍 Dry Run Analysis:");
    println!("  Rows: {}", report.rows);
    if let Some(header) = &report.header {
        println!("  Header: {}", header.join(", "));
    }
    println!("  API requests needed: {}", report.requests);
    println!("  Blank cells passed through: {}", report.skipped());

    Ok(())
}
