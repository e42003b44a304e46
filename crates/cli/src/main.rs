use clap::{Parser, Subcommand};
use sentiment_core::config_loader::DEFAULT_CONFIG_PATH;
use sentiment_core::ConfigLoader;

mod commands;

use commands::{AnalyzeImpactArgs, CollectArgs, CorrelateArgs};

#[derive(Parser)]
#[command(name = "btc-sentiment")]
#[command(about = "Bitcoin sentiment, search interest, and event-impact analysis", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH, env = "SENTIMENT_CONFIG")]
    config: String,

    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect source data, reusing fresh cached files
    Collect(CollectArgs),
    /// Measure price movement around each event
    AnalyzeImpact(AnalyzeImpactArgs),
    /// Correlate sentiment, search interest, and price change
    Correlate(CorrelateArgs),
    /// Collect posts, trends, and prices, then correlate them
    Run,
}

fn init_logging(log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.as_deref())?;

    let config = ConfigLoader::load_from(&cli.config)?;
    tracing::debug!(config = %cli.config, "Loaded configuration");

    match cli.command {
        Commands::Collect(args) => {
            commands::run_collect(args, &config).await?;
        }
        Commands::AnalyzeImpact(args) => {
            commands::run_analyze_impact(args, &config)?;
        }
        Commands::Correlate(args) => {
            commands::run_correlate(args, &config)?;
        }
        Commands::Run => {
            commands::run_pipeline(&config).await?;
        }
    }

    Ok(())
}
