use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use disaster_response_pipeline::{
    config::PipelineConfig,
    metrics,
    observability,
    processing::EtlProcessor,
    state::SledStore,
};
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "Please provide the filepaths of the messages and categories \
datasets as the first and second argument respectively, as well as the filepath \
of the database to save the cleaned data to as the third argument.

Example: process-data disaster_messages.csv disaster_categories.csv DisasterResponse.db";

#[derive(Parser)]
#[command(name = "process-data")]
#[command(about = "Merge, clean and store disaster-response messages", long_about = None)]
#[command(version)]
struct Cli {
    /// Messages CSV (id,message,original,genre)
    #[arg(value_name = "MESSAGES_CSV")]
    messages: PathBuf,

    /// Categories CSV (id,categories)
    #[arg(value_name = "CATEGORIES_CSV")]
    categories: PathBuf,

    /// Destination database directory
    #[arg(value_name = "DATABASE")]
    database: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(());
        }
        Err(_) => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    let config = PipelineConfig::load().context("Failed to load configuration")?;
    observability::init_tracing(&config.observability)?;

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!("Failed to initialize metrics: {}", e);
    }

    println!(
        "Loading data...\n    MESSAGES: {}\n    CATEGORIES: {}",
        cli.messages.display(),
        cli.categories.display()
    );

    let store = SledStore::new(&cli.database)
        .with_context(|| format!("Failed to open database {}", cli.database.display()))?;
    let processor = EtlProcessor::new(Arc::new(store), config.etl.clone());

    let summary = processor
        .run(&cli.messages, &cli.categories)
        .context("ETL run failed")?;

    println!(
        "Saving data...\n    DATABASE: {}\n    TABLE: {} ({} rows, {} categories, {} duplicates removed)",
        cli.database.display(),
        config.etl.table_name,
        summary.rows_stored,
        summary.categories.len(),
        summary.duplicates_removed
    );
    println!("Cleaned data saved to database!");

    if let Some(path) = &config.observability.metrics_path {
        metrics::write_metrics(path)?;
    }

    Ok(())
}
