use crate::config::PipelineConfig;
use crate::error::{AppError, Result};
use crate::metrics::{EVALUATION_SCORE, STAGE_DURATION_SECONDS, VOCABULARY_SIZE};
use crate::ml::evaluation::{AggregateScore, ClassificationReport, MultiLabelEvaluator, MultiOutputScore};
use crate::ml::features::{FeatureComposer, FeatureSettings};
use crate::ml::models::ModelMetadata;
use crate::ml::pipeline::TrainedPipeline;
use crate::ml::search::{CvResult, GridSearch, ParamGrid};
use crate::ml::boosting::BoostingParams;
use crate::models::LabeledDataset;
use crate::nlp::LanguageResources;
use crate::state::MessageStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Evaluation of a trained model on the held-out split
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub model_id: uuid::Uuid,
    pub best_params: BoostingParams,
    pub best_cv_score: f64,
    pub cv_results: Vec<CvResult>,
    pub n_train: usize,
    pub n_test: usize,
    pub fbeta: MultiOutputScore,
    pub mean_accuracy: f64,
    pub classification_reports: Vec<ClassificationReport>,
}

impl EvaluationReport {
    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        info!(path = %path.display(), "Evaluation report written");
        Ok(())
    }
}

/// Trained artifact plus its evaluation
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub pipeline: TrainedPipeline,
    pub report: EvaluationReport,
}

/// Model training service: load, split, search, evaluate, persist
pub struct TrainingService {
    config: PipelineConfig,
    resources: Arc<LanguageResources>,
    store: Arc<dyn MessageStore>,
}

impl TrainingService {
    pub fn new(
        config: PipelineConfig,
        resources: Arc<LanguageResources>,
        store: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            config,
            resources,
            store,
        }
    }

    /// Load the configured table as a labeled dataset
    pub fn load_dataset(&self) -> Result<LabeledDataset> {
        let table = self.store.load_table(&self.config.etl.table_name)?;
        let dataset = LabeledDataset::from_rows(&table.schema, &table.rows)?;
        info!(
            table = %self.config.etl.table_name,
            rows = dataset.len(),
            categories = dataset.n_categories(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Train on the stored table, evaluate on a held-out split and save the model to `model_path`
    pub fn train_and_save(&self, model_path: &Path) -> Result<TrainingOutcome> {
        let dataset = self.load_dataset()?;
        let outcome = self.train(&dataset)?;

        let started = Instant::now();
        info!(path = %model_path.display(), "Saving model");
        outcome.pipeline.save(model_path)?;
        STAGE_DURATION_SECONDS
            .with_label_values(&["save_model"])
            .observe(started.elapsed().as_secs_f64());

        if let Some(path) = &self.config.observability.report_path {
            outcome.report.write_json(path)?;
        }
        Ok(outcome)
    }

    /// Split, search, refit and evaluate
    pub fn train(&self, dataset: &LabeledDataset) -> Result<TrainingOutcome> {
        let training = &self.config.training;
        if dataset.n_categories() == 0 {
            return Err(AppError::Validation(
                "dataset has no category columns".to_string(),
            ));
        }

        let (train, test) = dataset.train_test_split(training.test_size, training.seed)?;
        info!(train = train.len(), test = test.len(), "Dataset split");

        let settings = FeatureSettings::from_config(&self.config);
        let composer = FeatureComposer::new(self.resources.clone(), &settings)?;
        let grid = ParamGrid::from_config(training);

        let started = Instant::now();
        info!(
            grid_points = grid.points().len(),
            folds = training.cv_folds,
            "Building and training model"
        );
        let search = GridSearch::new(composer.clone(), grid, training.cv_folds)
            .with_n_jobs(training.n_jobs)
            .fit(&train.messages, &train.labels)?;
        STAGE_DURATION_SECONDS
            .with_label_values(&["train"])
            .observe(started.elapsed().as_secs_f64());

        info!(
            learning_rate = search.best_params.learning_rate,
            n_estimators = search.best_params.n_estimators,
            cv_score = search.best_score,
            "Best parameters selected"
        );

        let started = Instant::now();
        info!("Evaluating model");
        let predictions = search.best_estimator.predict(&composer, &test.messages)?;
        let fbeta = MultiLabelEvaluator::score(&test.labels, &predictions, training.beta)?;
        let mean_accuracy = MultiLabelEvaluator::mean_accuracy(&test.labels, &predictions)?;
        let classification_reports = MultiLabelEvaluator::classification_reports(
            &test.labels,
            &predictions,
            &test.category_names,
        )?;
        STAGE_DURATION_SECONDS
            .with_label_values(&["evaluate"])
            .observe(started.elapsed().as_secs_f64());

        match fbeta.aggregate {
            AggregateScore::Score(value) => {
                EVALUATION_SCORE.with_label_values(&["fbeta_gmean"]).set(value);
            }
            AggregateScore::Undefined => {
                warn!(
                    excluded = fbeta.n_excluded,
                    "Every category scored 1.0; aggregate F-beta is undefined"
                );
            }
        }
        EVALUATION_SCORE
            .with_label_values(&["mean_accuracy"])
            .set(mean_accuracy);
        EVALUATION_SCORE
            .with_label_values(&["best_cv_score"])
            .set(search.best_score);

        let feature_state = &search.best_estimator.feature_state;
        VOCABULARY_SIZE.set(feature_state.text.vocab_size() as f64);

        info!(
            mean_accuracy = %format!("{:.2}%", mean_accuracy * 100.0),
            fbeta = %fbeta.aggregate,
            excluded = fbeta.n_excluded,
            "Model evaluated"
        );

        let metadata = ModelMetadata::new(
            search.best_params,
            search.best_score,
            train.len(),
            feature_state.n_features(),
        );
        let report = EvaluationReport {
            model_id: metadata.id,
            best_params: search.best_params,
            best_cv_score: search.best_score,
            cv_results: search.cv_results,
            n_train: train.len(),
            n_test: test.len(),
            fbeta,
            mean_accuracy,
            classification_reports,
        };
        let pipeline = TrainedPipeline::new(
            metadata,
            settings,
            self.resources.fingerprint.clone(),
            search.best_estimator,
            dataset.category_names.clone(),
        )?;

        Ok(TrainingOutcome { pipeline, report })
    }
}
