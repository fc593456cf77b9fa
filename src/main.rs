use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use swapwatch::config::Config;
use swapwatch::dashboard::{self, AppState};
use swapwatch::indexer::client::SubgraphClient;
use swapwatch::indexer::fetcher::FetchOptions;
use swapwatch::pipeline::FetchPipeline;
use swapwatch::report::{self, ReportOutcome};

#[derive(Parser)]
#[command(name = "swapwatch", version, about = "Uniswap swap snapshots and reports")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch recent swaps and replace the CSV file and database table
    Fetch {
        /// Override `subgraph.max_records`
        #[arg(long)]
        max_records: Option<usize>,
        /// Override `subgraph.batch_size`
        #[arg(long)]
        batch_size: Option<u32>,
    },
    /// Print statistics and write chart PNGs plus the landscape PDF
    Report,
    /// Serve the interactive dashboard
    Dashboard,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    dotenv::dotenv().ok();

    // Initialize structured logging (set RUST_LOG=debug for more output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    tracing::info!(
        table = %config.storage.table,
        "Configuration loaded from {}",
        cli.config
    );

    let pool = swapwatch::db::connect(&config.storage.database_url).await?;
    tracing::info!(url = %config.storage.database_url, "Database opened");

    match cli.command {
        Command::Fetch {
            max_records,
            batch_size,
        } => {
            if let Some(max_records) = max_records {
                config.subgraph.max_records = max_records;
            }
            if let Some(batch_size) = batch_size {
                config.subgraph.batch_size = batch_size;
            }
            config.validate()?;

            let client = SubgraphClient::from_config(&config.subgraph)?;
            tracing::info!(
                endpoint = %config.subgraph.display_target(),
                max_records = config.subgraph.max_records,
                batch = config.subgraph.batch_size,
                "Fetching swaps"
            );

            let pipeline =
                FetchPipeline::new(FetchOptions::from(&config.subgraph), config.storage.clone());
            let result = pipeline.run(&client, &pool).await?;
            tracing::info!(
                fetched = result.fetched,
                csv_rows = result.csv_rows,
                generation = result.generation,
                "Fetch complete"
            );
        }
        Command::Report => {
            match report::run_static_report(&pool, &config.storage, &config.report).await? {
                ReportOutcome::Empty => {}
                ReportOutcome::Written {
                    swaps,
                    pdf_path,
                    chart_paths,
                } => {
                    tracing::info!(
                        swaps,
                        pdf = %pdf_path.display(),
                        charts = chart_paths.len(),
                        "Report complete"
                    );
                }
            }
        }
        Command::Dashboard => {
            let shutdown = CancellationToken::new();
            let signal = shutdown.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        tracing::info!("Shutdown signal received, stopping dashboard...");
                        signal.cancel();
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to listen for Ctrl+C"),
                }
            });

            let state = AppState {
                pool: pool.clone(),
                storage: config.storage.clone(),
                report: config.report.clone(),
            };
            dashboard::serve(state, &config.dashboard.host, config.dashboard.port, shutdown)
                .await?;
        }
    }

    pool.close().await;
    Ok(())
}
