use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::{Validate, ValidationError};

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    /// Language resources and tokenization
    #[serde(default)]
    pub nlp: NlpConfig,

    /// ETL stage configuration
    #[serde(default)]
    #[validate(nested)]
    pub etl: EtlConfig,

    /// Training stage configuration
    #[serde(default)]
    #[validate(nested)]
    pub training: TrainingConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl PipelineConfig {
    /// Load configuration from the embedded defaults, an optional file and
    /// the environment, then validate it.
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/pipeline.toml".to_string());

        let config: Self = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: DRP_)
            .add_source(
                config::Environment::with_prefix("DRP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("training.learning_rates")
                    .with_list_parse_key("training.n_estimators")
                    .with_list_parse_key("etl.excluded_categories")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlpConfig {
    /// External language resource file; the bundled English resources are
    /// used when unset
    pub resources_path: Option<PathBuf>,

    /// Token substituted for every URL before word splitting
    #[serde(default = "default_url_placeholder")]
    pub url_placeholder: String,
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            resources_path: None,
            url_placeholder: default_url_placeholder(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EtlConfig {
    /// Destination table, replaced on every run
    #[serde(default = "default_table_name")]
    #[validate(length(min = 1))]
    pub table_name: String,

    /// Constant categories dropped after de-duplication
    #[serde(default = "default_excluded_categories")]
    pub excluded_categories: Vec<String>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            table_name: default_table_name(),
            excluded_categories: default_excluded_categories(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrainingConfig {
    /// Fraction of rows held out for the final evaluation
    #[serde(default = "default_test_size")]
    #[validate(range(min = 0.01, max = 0.99))]
    pub test_size: f64,

    /// Seed for the train/test shuffle
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of cross-validation folds per grid point
    #[serde(default = "default_cv_folds")]
    #[validate(range(min = 2))]
    pub cv_folds: usize,

    /// Learning-rate candidates for the boosted base classifier
    #[serde(default = "default_learning_rates")]
    #[validate(length(min = 1), custom(function = "validate_learning_rates"))]
    pub learning_rates: Vec<f64>,

    /// Ensemble-size candidates for the boosted base classifier
    #[serde(default = "default_n_estimators")]
    #[validate(length(min = 1), custom(function = "validate_n_estimators"))]
    pub n_estimators: Vec<usize>,

    /// Beta of the reported F-beta aggregate
    #[serde(default = "default_beta")]
    #[validate(range(min = 0.0))]
    pub beta: f64,

    /// Worker threads for the grid search (0 = one per core)
    #[serde(default)]
    pub n_jobs: usize,

    /// Lowercase text before count vectorization
    #[serde(default = "default_true")]
    pub lowercase: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: default_test_size(),
            seed: default_seed(),
            cv_folds: default_cv_folds(),
            learning_rates: default_learning_rates(),
            n_estimators: default_n_estimators(),
            beta: default_beta(),
            n_jobs: 0,
            lowercase: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Write Prometheus text exposition here at the end of a run
    pub metrics_path: Option<PathBuf>,

    /// Write the evaluation report as JSON here
    pub report_path: Option<PathBuf>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            metrics_path: None,
            report_path: None,
        }
    }
}

fn validate_learning_rates(rates: &Vec<f64>) -> std::result::Result<(), ValidationError> {
    if rates.iter().all(|rate| rate.is_finite() && *rate > 0.0) {
        Ok(())
    } else {
        Err(ValidationError::new("learning_rates_must_be_positive"))
    }
}

fn validate_n_estimators(counts: &Vec<usize>) -> std::result::Result<(), ValidationError> {
    if counts.iter().all(|count| *count > 0) {
        Ok(())
    } else {
        Err(ValidationError::new("n_estimators_must_be_positive"))
    }
}

// Default value functions
fn default_url_placeholder() -> String {
    "urlplaceholder".to_string()
}

fn default_table_name() -> String {
    "DisasterResponse_table".to_string()
}

fn default_excluded_categories() -> Vec<String> {
    vec!["child_alone".to_string()]
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_cv_folds() -> usize {
    5
}

fn default_learning_rates() -> Vec<f64> {
    vec![0.01, 0.02, 0.05]
}

fn default_n_estimators() -> Vec<usize> {
    vec![10, 20, 40]
}

fn default_beta() -> f64 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.nlp.url_placeholder, "urlplaceholder");
        assert_eq!(config.etl.table_name, "DisasterResponse_table");
        assert_eq!(config.etl.excluded_categories, vec!["child_alone"]);
        assert_eq!(config.training.cv_folds, 5);
        assert_eq!(config.training.learning_rates, vec![0.01, 0.02, 0.05]);
        assert_eq!(config.training.n_estimators, vec![10, 20, 40]);
        assert!(config.training.lowercase);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let config: PipelineConfig = toml::from_str(include_str!("../config/default.toml")).unwrap();
        assert_eq!(config.training.test_size, 0.2);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_rejects_single_fold() {
        let mut config = PipelineConfig::default();
        config.training.cv_folds = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_learning_rate() {
        let mut config = PipelineConfig::default();
        config.training.learning_rates = vec![0.1, 0.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_grid() {
        let mut config = PipelineConfig::default();
        config.training.n_estimators.clear();
        assert!(config.validate().is_err());
    }
}
