use crate::error::{AppError, Result};
use crate::ml::boosting::{AdaBoostClassifier, BoostingParams, ColumnIndex};
use crate::ml::models::ModelType;
use crate::ml::sparse::SparseMatrix;
use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Trait for multi-label classifiers over sparse features
pub trait Classifier: Send + Sync {
    /// Train on a feature matrix and a 0/1 label matrix (rows × labels)
    fn fit(&mut self, features: &SparseMatrix, labels: ArrayView2<u8>) -> Result<()>;

    /// Predict a 0/1 label matrix with one column per trained label
    fn predict(&self, features: &SparseMatrix) -> Result<Array2<u8>>;

    /// Get model type
    fn model_type(&self) -> ModelType;

    /// Check if model is trained
    fn is_trained(&self) -> bool;
}

/// Per-label model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelModel {
    /// Training column held a single class
    Constant(u8),

    /// Boosted decision stumps
    Boosted(AdaBoostClassifier),
}

impl LabelModel {
    fn fit(index: &ColumnIndex, labels: &[u8], params: BoostingParams) -> Result<Self> {
        match labels.first() {
            Some(&first) if labels.iter().all(|&label| label == first) => {
                Ok(LabelModel::Constant(first))
            }
            Some(_) => Ok(LabelModel::Boosted(AdaBoostClassifier::fit(
                index, labels, params,
            )?)),
            None => Err(AppError::Validation(
                "cannot fit a label model on zero rows".to_string(),
            )),
        }
    }

    fn predict(&self, features: &SparseMatrix) -> Result<Vec<u8>> {
        match self {
            LabelModel::Constant(value) => Ok(vec![*value; features.n_rows()]),
            LabelModel::Boosted(model) => model.predict(features),
        }
    }
}

/// One independent boosted ensemble per label column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLabelClassifier {
    params: BoostingParams,
    models: Vec<LabelModel>,
    n_features: usize,
}

impl MultiLabelClassifier {
    pub fn new(params: BoostingParams) -> Self {
        Self {
            params,
            models: Vec::new(),
            n_features: 0,
        }
    }

    pub fn params(&self) -> BoostingParams {
        self.params
    }

    pub fn n_labels(&self) -> usize {
        self.models.len()
    }

    pub fn models(&self) -> &[LabelModel] {
        &self.models
    }
}

impl Classifier for MultiLabelClassifier {
    fn fit(&mut self, features: &SparseMatrix, labels: ArrayView2<u8>) -> Result<()> {
        if features.n_rows() != labels.nrows() {
            return Err(AppError::ShapeMismatch(format!(
                "{} feature rows but {} label rows",
                features.n_rows(),
                labels.nrows()
            )));
        }
        if labels.ncols() == 0 {
            return Err(AppError::Validation("no label columns to fit".to_string()));
        }

        let index = ColumnIndex::new(features);
        let params = self.params;
        let columns: Vec<Vec<u8>> = labels.axis_iter(Axis(1)).map(|column| column.to_vec()).collect();

        let models = columns
            .par_iter()
            .enumerate()
            .map(|(label, column)| {
                let model = LabelModel::fit(&index, column, params)?;
                tracing::trace!(label, constant = matches!(model, LabelModel::Constant(_)), "Label model fitted");
                Ok(model)
            })
            .collect::<Result<Vec<_>>>()?;

        self.models = models;
        self.n_features = features.n_cols();
        Ok(())
    }

    fn predict(&self, features: &SparseMatrix) -> Result<Array2<u8>> {
        if !self.is_trained() {
            return Err(AppError::NotFitted(
                "MultiLabelClassifier must be fitted before predict".to_string(),
            ));
        }
        if features.n_cols() != self.n_features {
            return Err(AppError::ShapeMismatch(format!(
                "classifier expects {} features, got {}",
                self.n_features,
                features.n_cols()
            )));
        }

        let columns = self
            .models
            .par_iter()
            .map(|model| model.predict(features))
            .collect::<Result<Vec<_>>>()?;

        let mut predictions = Array2::zeros((features.n_rows(), columns.len()));
        for (label, column) in columns.into_iter().enumerate() {
            for (row, value) in column.into_iter().enumerate() {
                predictions[[row, label]] = value;
            }
        }
        Ok(predictions)
    }

    fn model_type(&self) -> ModelType {
        ModelType::AdaBoost
    }

    fn is_trained(&self) -> bool {
        !self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_test_features() -> SparseMatrix {
        // feature 0 drives label 0, feature 1 drives label 1
        SparseMatrix::from_rows(
            vec![
                vec![(0, 1.0)],
                vec![(1, 1.0)],
                vec![(0, 1.0), (1, 1.0)],
                vec![],
                vec![(0, 1.0)],
                vec![(1, 1.0)],
            ],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_multilabel_fit_predict() {
        let x = create_test_features();
        let y = array![[1, 0, 0], [0, 1, 0], [1, 1, 0], [0, 0, 0], [1, 0, 0], [0, 1, 0]];

        let mut classifier = MultiLabelClassifier::new(BoostingParams {
            learning_rate: 0.5,
            n_estimators: 10,
        });
        assert!(!classifier.is_trained());
        classifier.fit(&x, y.view()).unwrap();

        assert!(classifier.is_trained());
        assert_eq!(classifier.n_labels(), 3);
        assert_eq!(classifier.models()[2], LabelModel::Constant(0));

        let predictions = classifier.predict(&x).unwrap();
        assert_eq!(predictions.dim(), (6, 3));
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_predictions_are_binary() {
        let x = create_test_features();
        let y = array![[1, 1], [0, 1], [1, 0], [0, 0], [1, 1], [1, 0]];
        let mut classifier = MultiLabelClassifier::new(BoostingParams::default());
        classifier.fit(&x, y.view()).unwrap();

        let predictions = classifier.predict(&x).unwrap();
        assert_eq!(predictions.ncols(), 2);
        assert!(predictions.iter().all(|&value| value == 0 || value == 1));
    }

    #[test]
    fn test_predict_before_fit() {
        let classifier = MultiLabelClassifier::new(BoostingParams::default());
        let err = classifier.predict(&create_test_features()).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FITTED");
    }

    #[test]
    fn test_row_mismatch() {
        let mut classifier = MultiLabelClassifier::new(BoostingParams::default());
        let y = array![[1u8], [0]];
        assert!(classifier.fit(&create_test_features(), y.view()).is_err());
    }
}
