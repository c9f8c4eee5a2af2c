use crate::ml::boosting::BoostingParams;
use serde::{Deserialize, Serialize};

/// Per-class evaluation metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Unique id of this training run
    pub id: uuid::Uuid,

    /// Model name
    pub name: String,

    /// Crate version that produced the model
    pub version: String,

    /// Model type
    pub model_type: ModelType,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Number of training samples
    pub n_training_samples: usize,

    /// Number of features
    pub n_features: usize,

    /// Selected hyperparameters
    pub params: BoostingParams,

    /// Mean cross-validated micro-F1 of the selected parameters
    pub cv_score: f64,
}

impl ModelMetadata {
    pub fn new(
        params: BoostingParams,
        cv_score: f64,
        n_training_samples: usize,
        n_features: usize,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: "Disaster Response Classifier".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model_type: ModelType::AdaBoost,
            trained_at: chrono::Utc::now(),
            n_training_samples,
            n_features,
            params,
            cv_score,
        }
    }
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Discrete AdaBoost over decision stumps, one ensemble per label
    AdaBoost,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::AdaBoost => write!(f, "AdaBoost (decision stumps)"),
        }
    }
}
