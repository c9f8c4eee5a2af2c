//! Prometheus metrics for the ETL and training stages.
//!
//! Both binaries run to completion, so nothing is scraped; the registry is
//! rendered with [`gather_metrics`] and optionally written to a file at the
//! end of a run.
//!
//! # Example
//! ```no_run
//! use disaster_response_pipeline::metrics::{self, RECORDS_LOADED_TOTAL};
//!
//! metrics::init_metrics().unwrap();
//! RECORDS_LOADED_TOTAL.with_label_values(&["messages"]).inc_by(120.0);
//! println!("{}", metrics::gather_metrics());
//! ```

use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use prometheus::{
    CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, IntCounter,
    IntCounterVec, Opts, Registry,
};

const NAMESPACE: &str = "disaster_response";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // ETL Metrics
    // ============================================================================

    /// Records read from the input CSVs
    ///
    /// Labels: source (messages, categories)
    pub static ref RECORDS_LOADED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("records_loaded_total", "Records read from input files")
            .namespace(NAMESPACE),
        &["source"]
    ).expect("Failed to create RECORDS_LOADED_TOTAL metric");

    /// Exact-duplicate rows removed after the category join
    pub static ref DUPLICATES_REMOVED_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("duplicates_removed_total", "Duplicate rows removed")
            .namespace(NAMESPACE)
    ).expect("Failed to create DUPLICATES_REMOVED_TOTAL metric");

    /// Rows written to the structured store
    pub static ref ROWS_STORED_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("rows_stored_total", "Rows written to the destination table")
            .namespace(NAMESPACE)
    ).expect("Failed to create ROWS_STORED_TOTAL metric");

    /// Stage wall-clock duration in seconds
    ///
    /// Labels: stage
    pub static ref STAGE_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("stage_duration_seconds", "Pipeline stage duration in seconds")
            .namespace(NAMESPACE)
            .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 1200.0, 3600.0]),
        &["stage"]
    ).expect("Failed to create STAGE_DURATION_SECONDS metric");

    // ============================================================================
    // Training Metrics
    // ============================================================================

    /// Grid-search (grid point, fold) tasks by outcome
    ///
    /// Labels: outcome (succeeded, failed)
    pub static ref GRID_TASKS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("grid_tasks_total", "Cross-validation tasks by outcome")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create GRID_TASKS_TOTAL metric");

    /// Micro-F1 of individual cross-validation folds
    pub static ref FOLD_SCORE: Histogram = Histogram::with_opts(
        HistogramOpts::new("fold_micro_f1", "Micro-averaged F1 per cross-validation fold")
            .namespace(NAMESPACE)
            .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0])
    ).expect("Failed to create FOLD_SCORE metric");

    /// Final evaluation scores on the held-out split
    ///
    /// Labels: metric (fbeta_gmean, mean_accuracy, best_cv_score)
    pub static ref EVALUATION_SCORE: GaugeVec = GaugeVec::new(
        Opts::new("evaluation_score", "Held-out evaluation scores")
            .namespace(NAMESPACE),
        &["metric"]
    ).expect("Failed to create EVALUATION_SCORE metric");

    /// Vocabulary size of the fitted vectorizer
    pub static ref VOCABULARY_SIZE: Gauge = Gauge::with_opts(
        Opts::new("vocabulary_size", "Terms in the fitted vocabulary")
            .namespace(NAMESPACE)
    ).expect("Failed to create VOCABULARY_SIZE metric");
}

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Register every metric with the global registry. Safe to call repeatedly.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    INITIALIZED
        .get_or_try_init(|| {
            PROMETHEUS_REGISTRY.register(Box::new(RECORDS_LOADED_TOTAL.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(DUPLICATES_REMOVED_TOTAL.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(ROWS_STORED_TOTAL.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(STAGE_DURATION_SECONDS.clone()))?;

            PROMETHEUS_REGISTRY.register(Box::new(GRID_TASKS_TOTAL.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(FOLD_SCORE.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(EVALUATION_SCORE.clone()))?;
            PROMETHEUS_REGISTRY.register(Box::new(VOCABULARY_SIZE.clone()))?;

            tracing::debug!("Prometheus metrics registered");
            Ok(())
        })
        .map(|_| ())
}

/// Render the registry in Prometheus text exposition format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

/// Write the rendered registry to `path`
pub fn write_metrics(path: &std::path::Path) -> crate::error::Result<()> {
    std::fs::write(path, gather_metrics())?;
    tracing::info!(path = %path.display(), "Metrics written");
    Ok(())
}
