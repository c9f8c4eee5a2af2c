use crate::error::{AppError, Result};
use crate::ml::sparse::SparseMatrix;
use serde::{Deserialize, Serialize};

/// Hyperparameters of the boosted base classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub learning_rate: f64,
    pub n_estimators: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            learning_rate: 1.0,
            n_estimators: 50,
        }
    }
}

impl std::fmt::Display for BoostingParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "learning_rate={}, n_estimators={}",
            self.learning_rate, self.n_estimators
        )
    }
}

/// Column-major copy of a feature matrix with each column sorted by value.
///
/// Built once per training matrix and shared by every label's ensemble.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    n_rows: usize,
    columns: Vec<Vec<(usize, f64)>>,
}

impl ColumnIndex {
    pub fn new(matrix: &SparseMatrix) -> Self {
        let mut columns = matrix.columns();
        for column in columns.iter_mut() {
            column.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        }
        Self {
            n_rows: matrix.n_rows(),
            columns,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }
}

/// One-level decision tree. Rows with `value <= threshold` get `left`, others
/// `right`; outputs are +1 / -1. A stump without a feature is constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionStump {
    feature: Option<usize>,
    threshold: f64,
    left: i8,
    right: i8,
}

impl DecisionStump {
    fn constant(output: i8) -> Self {
        Self {
            feature: None,
            threshold: 0.0,
            left: output,
            right: output,
        }
    }

    pub fn feature(&self) -> Option<usize> {
        self.feature
    }

    fn output_for(&self, value: f64) -> i8 {
        if value <= self.threshold {
            self.left
        } else {
            self.right
        }
    }

    /// Output for row `row` of `x`
    pub fn predict_row(&self, x: &SparseMatrix, row: usize) -> i8 {
        match self.feature {
            Some(feature) => self.output_for(x.get(row, feature)),
            None => self.left,
        }
    }

    /// Outputs for every training row, using the column index
    fn predict_index(&self, index: &ColumnIndex) -> Vec<i8> {
        match self.feature {
            Some(feature) => {
                let mut outputs = vec![self.output_for(0.0); index.n_rows];
                for &(row, value) in &index.columns[feature] {
                    outputs[row] = self.output_for(value);
                }
                outputs
            }
            None => vec![self.left; index.n_rows],
        }
    }

    /// Weighted-error-minimizing stump.
    ///
    /// `targets` are +1 / -1, `weights` sum to one. Candidates are visited in
    /// feature order, thresholds ascending, "left negative" before "left
    /// positive"; a candidate replaces the best only on strictly lower error,
    /// starting from the best constant stump.
    pub fn fit(index: &ColumnIndex, targets: &[i8], weights: &[f64]) -> (Self, f64) {
        let (total_pos, total_neg) = weight_split(0..targets.len(), targets, weights);

        let (mut best, mut best_error) = if total_pos >= total_neg {
            (Self::constant(1), total_neg)
        } else {
            (Self::constant(-1), total_pos)
        };

        let mut groups: Vec<(f64, f64, f64)> = Vec::new();
        for (feature, column) in index.columns.iter().enumerate() {
            if column.is_empty() {
                continue;
            }
            Self::value_groups(
                column,
                targets,
                weights,
                (total_pos, total_neg),
                index.n_rows,
                &mut groups,
            );

            let mut left_pos = 0.0;
            let mut left_neg = 0.0;
            for k in 0..groups.len().saturating_sub(1) {
                let (value, pos, neg) = groups[k];
                left_pos += pos;
                left_neg += neg;
                let threshold = (value + groups[k + 1].0) / 2.0;

                // left -1, right +1
                let error = left_pos + (total_neg - left_neg);
                if error < best_error {
                    best_error = error;
                    best = Self {
                        feature: Some(feature),
                        threshold,
                        left: -1,
                        right: 1,
                    };
                }

                // left +1, right -1
                let error = left_neg + (total_pos - left_pos);
                if error < best_error {
                    best_error = error;
                    best = Self {
                        feature: Some(feature),
                        threshold,
                        left: 1,
                        right: -1,
                    };
                }
            }
        }

        (best, best_error.max(0.0))
    }

    /// Distinct values of a sorted column with their positive and negative
    /// weight, including the implicit zeros of unstored rows.
    fn value_groups(
        column: &[(usize, f64)],
        targets: &[i8],
        weights: &[f64],
        totals: (f64, f64),
        n_rows: usize,
        groups: &mut Vec<(f64, f64, f64)>,
    ) {
        groups.clear();

        let (stored_pos, stored_neg) = weight_split(column.iter().map(|(row, _)| *row), targets, weights);
        let implicit_zero = (0.0, totals.0 - stored_pos, totals.1 - stored_neg);
        let mut zero_pending = column.len() < n_rows;

        for &(row, value) in column {
            if zero_pending && value > 0.0 {
                groups.push(implicit_zero);
                zero_pending = false;
            }
            let (pos, neg) = if targets[row] > 0 {
                (weights[row], 0.0)
            } else {
                (0.0, weights[row])
            };
            match groups.last_mut() {
                Some(last) if last.0 == value => {
                    last.1 += pos;
                    last.2 += neg;
                }
                _ => groups.push((value, pos, neg)),
            }
        }

        if zero_pending {
            groups.push(implicit_zero);
        }
    }
}

/// Total (positive, negative) weight of the given rows
fn weight_split(rows: impl Iterator<Item = usize>, targets: &[i8], weights: &[f64]) -> (f64, f64) {
    rows.fold((0.0, 0.0), |(pos, neg), row| {
        if targets[row] > 0 {
            (pos + weights[row], neg)
        } else {
            (pos, neg + weights[row])
        }
    })
}

/// Discrete AdaBoost (SAMME, two classes) over decision stumps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaBoostClassifier {
    params: BoostingParams,
    stumps: Vec<DecisionStump>,
    stump_weights: Vec<f64>,
    /// Prediction when no stump beat chance
    majority: u8,
    n_features: usize,
}

impl AdaBoostClassifier {
    /// Fit on the indexed training matrix and 0/1 labels
    pub fn fit(index: &ColumnIndex, labels: &[u8], params: BoostingParams) -> Result<Self> {
        let n = index.n_rows();
        if labels.len() != n {
            return Err(AppError::ShapeMismatch(format!(
                "{} labels for {} rows",
                labels.len(),
                n
            )));
        }
        if n == 0 {
            return Err(AppError::Validation(
                "cannot fit a classifier on zero rows".to_string(),
            ));
        }
        if params.n_estimators == 0 || !(params.learning_rate > 0.0) {
            return Err(AppError::Validation(format!(
                "invalid boosting parameters: {}",
                params
            )));
        }

        let targets: Vec<i8> = labels.iter().map(|&label| if label == 1 { 1 } else { -1 }).collect();
        let positives = targets.iter().filter(|&&target| target > 0).count();
        let majority = if positives * 2 > n { 1 } else { 0 };

        let mut weights = vec![1.0 / n as f64; n];
        let mut stumps = Vec::new();
        let mut stump_weights = Vec::new();

        for round in 0..params.n_estimators {
            let (stump, error) = DecisionStump::fit(index, &targets, &weights);

            if error <= 0.0 {
                stumps.push(stump);
                stump_weights.push(1.0);
                break;
            }
            if error >= 0.5 {
                tracing::trace!(round, error, "Boosting stopped: no stump better than chance");
                break;
            }

            let alpha = params.learning_rate * ((1.0 - error) / error).ln();
            let boost = alpha.exp();
            for (weight, (output, target)) in weights
                .iter_mut()
                .zip(stump.predict_index(index).into_iter().zip(&targets))
            {
                if output != *target {
                    *weight *= boost;
                }
            }
            stumps.push(stump);
            stump_weights.push(alpha);

            let total: f64 = weights.iter().sum();
            if !total.is_finite() || total <= 0.0 {
                break;
            }
            weights.iter_mut().for_each(|weight| *weight /= total);
        }

        Ok(Self {
            params,
            stumps,
            stump_weights,
            majority,
            n_features: index.n_cols(),
        })
    }

    pub fn params(&self) -> BoostingParams {
        self.params
    }

    pub fn n_stumps(&self) -> usize {
        self.stumps.len()
    }

    pub fn stump_weights(&self) -> &[f64] {
        &self.stump_weights
    }

    /// Weighted vote for one row; positive means class 1
    pub fn decision_function(&self, x: &SparseMatrix, row: usize) -> f64 {
        self.stumps
            .iter()
            .zip(&self.stump_weights)
            .map(|(stump, alpha)| alpha * f64::from(stump.predict_row(x, row)))
            .sum()
    }

    /// 0/1 prediction per row of `x`
    pub fn predict(&self, x: &SparseMatrix) -> Result<Vec<u8>> {
        if x.n_cols() != self.n_features {
            return Err(AppError::ShapeMismatch(format!(
                "classifier expects {} features, got {}",
                self.n_features,
                x.n_cols()
            )));
        }
        if self.stumps.is_empty() {
            return Ok(vec![self.majority; x.n_rows()]);
        }
        Ok((0..x.n_rows())
            .map(|row| if self.decision_function(x, row) > 0.0 { 1 } else { 0 })
            .collect())
    }
}
