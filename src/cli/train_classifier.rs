use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use disaster_response_pipeline::{
    config::PipelineConfig,
    metrics,
    ml::TrainingService,
    nlp,
    observability,
    state::SledStore,
};
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "Please provide the arguments correctly:
Sample Script Execution:
    train-classifier DisasterResponse.db classifier.bin
Arguments Description:
    1) Path to the database written by process-data (e.g. DisasterResponse.db)
    2) Path of the file the trained model is saved to (e.g. classifier.bin)";

#[derive(Parser)]
#[command(name = "train-classifier")]
#[command(about = "Train and evaluate the disaster-response message classifier", long_about = None)]
#[command(version)]
struct Cli {
    /// Database directory written by process-data
    #[arg(value_name = "DATABASE")]
    database: PathBuf,

    /// Output path of the trained model
    #[arg(value_name = "MODEL")]
    model: PathBuf,
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

    let resources = nlp::init(&config.nlp).context("Failed to load language resources")?;

    println!("Loading data from {} ...", cli.database.display());
    let store = SledStore::new(&cli.database)
        .with_context(|| format!("Failed to open database {}", cli.database.display()))?;
    let service = TrainingService::new(config.clone(), resources, Arc::new(store));

    println!("Training the pipeline ...");
    let outcome = service
        .train_and_save(&cli.model)
        .context("Training failed")?;
    let report = &outcome.report;

    println!("Best parameters set:");
    println!(
        "    learning_rate: {}\n    n_estimators: {}\n    cv micro-F1: {:.4}",
        report.best_params.learning_rate, report.best_params.n_estimators, report.best_cv_score
    );

    println!("Evaluating model...");
    println!("Average overall accuracy {:.2}%", report.mean_accuracy * 100.0);
    println!("F1-score (custom definition) {}", report.fbeta.aggregate);
    for category_report in &report.classification_reports {
        println!("Model Performance with Category: {}", category_report.category);
        println!("{}", category_report);
    }

    println!("Trained model saved to {}!", cli.model.display());

    if let Some(path) = &config.observability.metrics_path {
        metrics::write_metrics(path)?;
    }

    Ok(())
}
