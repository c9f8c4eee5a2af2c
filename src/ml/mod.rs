/// Machine learning module for multi-label message classification
///
/// This module provides:
/// - TF-IDF text vectorization and a starting-verb feature
/// - Sparse CSR feature matrices
/// - AdaBoost over decision stumps, one ensemble per category
/// - Cross-validated grid search over boosting hyperparameters
/// - Multi-output evaluation (weighted F-beta, accuracy, classification reports)
/// - Persisted model artifacts and the training service

pub mod boosting;
pub mod classifier;
pub mod evaluation;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod service;
pub mod sparse;
pub mod transform;

pub use boosting::{AdaBoostClassifier, BoostingParams, DecisionStump};
pub use classifier::{Classifier, LabelModel, MultiLabelClassifier};
pub use evaluation::{AggregateScore, ClassificationReport, MultiLabelEvaluator, MultiOutputScore};
pub use features::{
    ComposedState, FeatureComposer, FeatureSettings, StartingVerbFeature, TextVectorizer,
    VectorizerState,
};
pub use models::{ClassMetrics, ModelMetadata, ModelType};
pub use pipeline::{FittedPipeline, TrainedPipeline, FORMAT_VERSION};
pub use search::{CvResult, GridSearch, GridSearchResult, KFold, ParamGrid};
pub use service::{EvaluationReport, TrainingOutcome, TrainingService};
pub use sparse::SparseMatrix;
pub use transform::Transformer;
