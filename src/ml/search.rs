use crate::config::TrainingConfig;
use crate::error::{AppError, Result};
use crate::metrics::{FOLD_SCORE, GRID_TASKS_TOTAL};
use crate::ml::boosting::BoostingParams;
use crate::ml::classifier::{Classifier, MultiLabelClassifier};
use crate::ml::evaluation::MultiLabelEvaluator;
use crate::ml::features::{ComposedState, FeatureComposer};
use crate::ml::pipeline::FittedPipeline;
use crate::ml::sparse::SparseMatrix;
use crate::ml::transform::Transformer;
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Candidate hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub learning_rates: Vec<f64>,
    pub n_estimators: Vec<usize>,
}

impl ParamGrid {
    pub fn from_config(config: &TrainingConfig) -> Self {
        Self {
            learning_rates: config.learning_rates.clone(),
            n_estimators: config.n_estimators.clone(),
        }
    }

    /// Every combination, learning rate outer and estimator count inner
    pub fn points(&self) -> Vec<BoostingParams> {
        self.learning_rates
            .iter()
            .flat_map(|&learning_rate| {
                self.n_estimators.iter().map(move |&n_estimators| BoostingParams {
                    learning_rate,
                    n_estimators,
                })
            })
            .collect()
    }
}

/// Contiguous, unshuffled k-fold splitter
#[derive(Debug, Clone, Copy)]
pub struct KFold {
    n_splits: usize,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    /// (train indices, test indices) per fold. The first `n % k` folds hold
    /// one extra test row.
    pub fn split(&self, n_samples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.n_splits < 2 {
            return Err(AppError::Validation(format!(
                "cross-validation needs at least 2 folds, got {}",
                self.n_splits
            )));
        }
        if self.n_splits > n_samples {
            return Err(AppError::Validation(format!(
                "cannot split {} samples into {} folds",
                n_samples, self.n_splits
            )));
        }

        let base = n_samples / self.n_splits;
        let extra = n_samples % self.n_splits;
        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;

        for fold in 0..self.n_splits {
            let size = base + usize::from(fold < extra);
            let end = start + size;
            let test: Vec<usize> = (start..end).collect();
            let train: Vec<usize> = (0..start).chain(end..n_samples).collect();
            folds.push((train, test));
            start = end;
        }

        Ok(folds)
    }
}

/// Cross-validation outcome of one grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvResult {
    pub params: BoostingParams,

    /// Micro-F1 per fold; `None` where the fold task failed
    pub fold_scores: Vec<Option<f64>>,

    /// Mean micro-F1 when every fold succeeded
    pub mean_score: Option<f64>,

    /// Failure messages of this point's tasks
    pub errors: Vec<String>,
}

impl CvResult {
    pub fn is_viable(&self) -> bool {
        self.mean_score.is_some()
    }
}

/// Result of an exhaustive search
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub best_index: usize,
    pub best_params: BoostingParams,
    pub best_score: f64,
    pub cv_results: Vec<CvResult>,

    /// Pipeline refit on the whole training set with `best_params`
    pub best_estimator: FittedPipeline,
}

/// Feature matrices of one fold, computed once and shared by every grid point
struct FoldData {
    x_train: SparseMatrix,
    y_train: Array2<u8>,
    x_test: SparseMatrix,
    y_test: Array2<u8>,
}

/// Exhaustive cross-validated search over boosting hyperparameters
pub struct GridSearch {
    composer: FeatureComposer,
    param_grid: ParamGrid,
    cv_folds: usize,
    n_jobs: usize,
}

impl GridSearch {
    pub fn new(composer: FeatureComposer, param_grid: ParamGrid, cv_folds: usize) -> Self {
        Self {
            composer,
            param_grid,
            cv_folds,
            n_jobs: 0,
        }
    }

    /// Bound the worker pool; 0 uses rayon's default
    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// Run the search and refit the winner on all of `messages`
    pub fn fit(&self, messages: &[String], labels: &Array2<u8>) -> Result<GridSearchResult> {
        if messages.len() != labels.nrows() {
            return Err(AppError::ShapeMismatch(format!(
                "{} messages but {} label rows",
                messages.len(),
                labels.nrows()
            )));
        }

        if self.n_jobs == 0 {
            return self.run(messages, labels);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.n_jobs)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build thread pool: {}", e)))?;
        pool.install(|| self.run(messages, labels))
    }

    fn run(&self, messages: &[String], labels: &Array2<u8>) -> Result<GridSearchResult> {
        let points = self.param_grid.points();
        if points.is_empty() {
            return Err(AppError::Validation("parameter grid is empty".to_string()));
        }
        let folds = KFold::new(self.cv_folds).split(messages.len())?;

        info!(
            grid_points = points.len(),
            folds = folds.len(),
            samples = messages.len(),
            "Starting grid search"
        );

        let fold_data: Vec<std::result::Result<FoldData, String>> = folds
            .par_iter()
            .enumerate()
            .map(|(fold, (train, test))| {
                self.prepare_fold(messages, labels, train, test).map_err(|e| {
                    warn!(fold, error = %e, "Fold feature extraction failed");
                    e.to_string()
                })
            })
            .collect();

        let tasks: Vec<(usize, usize)> = (0..points.len())
            .flat_map(|grid| (0..folds.len()).map(move |fold| (grid, fold)))
            .collect();

        let outcomes: Vec<(usize, usize, std::result::Result<f64, String>)> = tasks
            .par_iter()
            .map(|&(grid, fold)| {
                let outcome = match &fold_data[fold] {
                    Ok(data) => Self::score_fold(data, points[grid]).map_err(|e| e.to_string()),
                    Err(message) => Err(format!("fold {} unavailable: {}", fold, message)),
                };
                (grid, fold, outcome)
            })
            .collect();

        let cv_results = Self::reduce(&points, folds.len(), outcomes);

        let (best_index, best_score) = cv_results
            .iter()
            .enumerate()
            .filter_map(|(index, result)| result.mean_score.map(|score| (index, score)))
            .fold(None, |best: Option<(usize, f64)>, (index, score)| match best {
                Some((_, best_score)) if score <= best_score => best,
                _ => Some((index, score)),
            })
            .ok_or_else(|| {
                AppError::NoViableConfiguration(format!(
                    "all {} grid points failed cross-validation",
                    points.len()
                ))
            })?;
        let best_params = points[best_index];

        info!(
            best_params = %best_params,
            best_score,
            "Grid search complete, refitting on full training set"
        );

        let best_estimator = self.refit(messages, labels, best_params)?;

        Ok(GridSearchResult {
            best_index,
            best_params,
            best_score,
            cv_results,
            best_estimator,
        })
    }

    fn prepare_fold(
        &self,
        messages: &[String],
        labels: &Array2<u8>,
        train: &[usize],
        test: &[usize],
    ) -> Result<FoldData> {
        let train_messages: Vec<String> = train.iter().map(|&i| messages[i].clone()).collect();
        let test_messages: Vec<String> = test.iter().map(|&i| messages[i].clone()).collect();

        let state: ComposedState = self.composer.fit(&train_messages)?;
        Ok(FoldData {
            x_train: self.composer.transform(&train_messages, &state)?,
            y_train: labels.select(Axis(0), train),
            x_test: self.composer.transform(&test_messages, &state)?,
            y_test: labels.select(Axis(0), test),
        })
    }

    fn score_fold(data: &FoldData, params: BoostingParams) -> Result<f64> {
        let mut classifier = MultiLabelClassifier::new(params);
        classifier.fit(&data.x_train, data.y_train.view())?;
        let predictions = classifier.predict(&data.x_test)?;
        MultiLabelEvaluator::micro_f1(&data.y_test, &predictions)
    }

    /// Collect task outcomes by grid index; completion order is irrelevant
    fn reduce(
        points: &[BoostingParams],
        n_folds: usize,
        outcomes: Vec<(usize, usize, std::result::Result<f64, String>)>,
    ) -> Vec<CvResult> {
        let mut results: Vec<CvResult> = points
            .iter()
            .map(|&params| CvResult {
                params,
                fold_scores: vec![None; n_folds],
                mean_score: None,
                errors: Vec::new(),
            })
            .collect();

        for (grid, fold, outcome) in outcomes {
            match outcome {
                Ok(score) => {
                    GRID_TASKS_TOTAL.with_label_values(&["succeeded"]).inc();
                    FOLD_SCORE.observe(score);
                    debug!(grid, fold, score, "Fold scored");
                    results[grid].fold_scores[fold] = Some(score);
                }
                Err(message) => {
                    GRID_TASKS_TOTAL.with_label_values(&["failed"]).inc();
                    warn!(grid, fold, error = %message, "Cross-validation task failed");
                    results[grid].errors.push(format!("fold {}: {}", fold, message));
                }
            }
        }

        for result in results.iter_mut() {
            let scores: Option<Vec<f64>> = result.fold_scores.iter().copied().collect();
            result.mean_score = scores
                .filter(|scores| !scores.is_empty())
                .map(|scores| scores.iter().sum::<f64>() / scores.len() as f64);
        }

        results
    }

    fn refit(
        &self,
        messages: &[String],
        labels: &Array2<u8>,
        params: BoostingParams,
    ) -> Result<FittedPipeline> {
        let (feature_state, features) = self.composer.fit_transform(messages)?;
        let mut classifier = MultiLabelClassifier::new(params);
        classifier.fit(&features, labels.view())?;
        Ok(FittedPipeline {
            feature_state,
            classifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::features::FeatureSettings;
    use crate::nlp::LanguageResources;
    use std::sync::Arc;

    fn composer() -> FeatureComposer {
        FeatureComposer::new(
            Arc::new(LanguageResources::bundled().unwrap()),
            &FeatureSettings::default(),
        )
        .unwrap()
    }

    fn training_data() -> (Vec<String>, Array2<u8>) {
        let texts = [
            ("We need water please", [1u8, 0]),
            ("Send food to the camp", [0, 1]),
            ("No clean water here", [1, 0]),
            ("Food supplies are gone", [0, 1]),
            ("Water and food needed", [1, 1]),
            ("The road is open", [0, 0]),
            ("Drinking water is scarce", [1, 0]),
            ("Rice and food please", [0, 1]),
            ("Thirsty, no water", [1, 0]),
            ("Weather is calm today", [0, 0]),
        ];
        let messages = texts.iter().map(|(text, _)| text.to_string()).collect();
        let mut labels = Array2::zeros((texts.len(), 2));
        for (row, (_, label)) in texts.iter().enumerate() {
            labels[[row, 0]] = label[0];
            labels[[row, 1]] = label[1];
        }
        (messages, labels)
    }

    #[test]
    fn test_grid_order_learning_rate_outer() {
        let grid = ParamGrid {
            learning_rates: vec![0.01, 0.05],
            n_estimators: vec![10, 20, 40],
        };
        let points = grid.points();
        assert_eq!(points.len(), 6);
        assert_eq!((points[0].learning_rate, points[0].n_estimators), (0.01, 10));
        assert_eq!((points[2].learning_rate, points[2].n_estimators), (0.01, 40));
        assert_eq!((points[3].learning_rate, points[3].n_estimators), (0.05, 10));
    }

    #[test]
    fn test_kfold_contiguous_with_larger_leading_folds() {
        let folds = KFold::new(3).split(8).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|(_, test)| test.len()).collect();
        assert_eq!(sizes, vec![3, 3, 2]);
        assert_eq!(folds[0].1, vec![0, 1, 2]);
        assert_eq!(folds[1].0, vec![0, 1, 2, 6, 7]);
        assert_eq!(folds[2].1, vec![6, 7]);
    }

    #[test]
    fn test_kfold_rejects_too_many_folds() {
        assert!(KFold::new(5).split(3).is_err());
        assert!(KFold::new(1).split(10).is_err());
    }

    #[test]
    fn test_reduce_requires_every_fold() {
        let points = vec![
            BoostingParams {
                learning_rate: 0.1,
                n_estimators: 5,
            },
            BoostingParams {
                learning_rate: 0.2,
                n_estimators: 5,
            },
        ];
        // delivered out of order
        let outcomes = vec![
            (1, 1, Ok(0.8)),
            (0, 0, Ok(0.5)),
            (1, 0, Ok(0.6)),
            (0, 1, Err("boom".to_string())),
        ];
        let results = GridSearch::reduce(&points, 2, outcomes);

        assert!(!results[0].is_viable());
        assert_eq!(results[0].errors.len(), 1);
        assert!((results[1].mean_score.unwrap() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_grid_search_selects_and_refits() {
        let (messages, labels) = training_data();
        let search = GridSearch::new(
            composer(),
            ParamGrid {
                learning_rates: vec![0.1, 0.5],
                n_estimators: vec![5, 10],
            },
            2,
        )
        .with_n_jobs(2);

        let result = search.fit(&messages, &labels).unwrap();

        assert_eq!(result.cv_results.len(), 4);
        assert!(result.cv_results.iter().all(CvResult::is_viable));
        assert_eq!(result.best_params, result.cv_results[result.best_index].params);
        // ties resolve to the lowest grid index
        let best = result.best_score;
        let first_best = result
            .cv_results
            .iter()
            .position(|r| r.mean_score == Some(best))
            .unwrap();
        assert_eq!(first_best, result.best_index);

        assert_eq!(result.best_estimator.classifier.n_labels(), 2);
        assert_eq!(result.best_estimator.classifier.params(), result.best_params);
    }

    #[test]
    fn test_no_viable_configuration() {
        let messages: Vec<String> = vec!["".to_string(); 4];
        let labels = Array2::zeros((4, 1));
        let search = GridSearch::new(
            composer(),
            ParamGrid {
                learning_rates: vec![0.1],
                n_estimators: vec![5],
            },
            2,
        );

        let err = search.fit(&messages, &labels).unwrap_err();
        assert_eq!(err.error_code(), "NO_VIABLE_CONFIGURATION");
    }
}
