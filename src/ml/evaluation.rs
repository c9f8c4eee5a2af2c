use crate::error::{AppError, Result};
use crate::ml::models::ClassMetrics;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Aggregate of the per-category F-beta scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum AggregateScore {
    /// Geometric mean of the non-perfect per-category scores
    Score(f64),

    /// Every category scored exactly 1.0, so nothing was left to aggregate
    Undefined,
}

impl AggregateScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            AggregateScore::Score(value) => Some(*value),
            AggregateScore::Undefined => None,
        }
    }
}

impl fmt::Display for AggregateScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateScore::Score(value) => write!(f, "{:.1}%", value * 100.0),
            AggregateScore::Undefined => write!(f, "undefined (all categories scored 1.0)"),
        }
    }
}

/// Multi-output F-beta score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiOutputScore {
    /// Weighted F-beta per category, in column order
    pub per_category: Vec<f64>,

    /// Number of categories excluded for scoring exactly 1.0
    pub n_excluded: usize,

    pub aggregate: AggregateScore,
}

/// Per-category classification report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub category: String,

    /// (class label, metrics) in ascending label order
    pub classes: Vec<(u8, ClassMetrics)>,

    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.category)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (label, metrics) in &self.classes {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, metrics.precision, metrics.recall, metrics.f1_score, metrics.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, metrics) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, metrics.precision, metrics.recall, metrics.f1_score, metrics.support
            )?;
        }
        Ok(())
    }
}

/// Scoring for multi-label 0/1 predictions
pub struct MultiLabelEvaluator;

impl MultiLabelEvaluator {
    /// Per-category weighted F-beta, then the geometric mean of the scores
    /// that are not exactly 1.0.
    pub fn score(y_true: &Array2<u8>, y_pred: &Array2<u8>, beta: f64) -> Result<MultiOutputScore> {
        check_shapes(y_true, y_pred)?;

        let per_category: Vec<f64> = y_true
            .axis_iter(Axis(1))
            .zip(y_pred.axis_iter(Axis(1)))
            .map(|(truth, pred)| weighted_fbeta(truth, pred, beta))
            .collect();

        let retained: Vec<f64> = per_category
            .iter()
            .copied()
            .filter(|&score| score != 1.0)
            .collect();
        let n_excluded = per_category.len() - retained.len();

        let aggregate = if retained.is_empty() {
            AggregateScore::Undefined
        } else {
            AggregateScore::Score(geometric_mean(&retained))
        };

        Ok(MultiOutputScore {
            per_category,
            n_excluded,
            aggregate,
        })
    }

    /// Micro-averaged F1 over every cell
    pub fn micro_f1(y_true: &Array2<u8>, y_pred: &Array2<u8>) -> Result<f64> {
        check_shapes(y_true, y_pred)?;

        let (mut tp, mut fp, mut fn_count) = (0usize, 0usize, 0usize);
        for (&truth, &pred) in y_true.iter().zip(y_pred.iter()) {
            match (truth == 1, pred == 1) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_count += 1,
                (false, false) => {}
            }
        }

        let denominator = 2 * tp + fp + fn_count;
        Ok(if denominator == 0 {
            0.0
        } else {
            2.0 * tp as f64 / denominator as f64
        })
    }

    /// Mean over categories of the per-category accuracy
    pub fn mean_accuracy(y_true: &Array2<u8>, y_pred: &Array2<u8>) -> Result<f64> {
        check_shapes(y_true, y_pred)?;
        if y_true.is_empty() {
            return Ok(0.0);
        }

        let total: f64 = y_true
            .axis_iter(Axis(1))
            .zip(y_pred.axis_iter(Axis(1)))
            .map(|(truth, pred)| accuracy(truth, pred))
            .sum();
        Ok(total / y_true.ncols() as f64)
    }

    /// One classification report per category
    pub fn classification_reports(
        y_true: &Array2<u8>,
        y_pred: &Array2<u8>,
        category_names: &[String],
    ) -> Result<Vec<ClassificationReport>> {
        check_shapes(y_true, y_pred)?;
        if category_names.len() != y_true.ncols() {
            return Err(AppError::ShapeMismatch(format!(
                "{} category names for {} columns",
                category_names.len(),
                y_true.ncols()
            )));
        }

        Ok(y_true
            .axis_iter(Axis(1))
            .zip(y_pred.axis_iter(Axis(1)))
            .zip(category_names)
            .map(|((truth, pred), name)| classification_report(name, truth, pred))
            .collect())
    }
}

fn check_shapes(y_true: &Array2<u8>, y_pred: &Array2<u8>) -> Result<()> {
    if y_true.dim() != y_pred.dim() {
        return Err(AppError::ShapeMismatch(format!(
            "truth is {:?}, prediction is {:?}",
            y_true.dim(),
            y_pred.dim()
        )));
    }
    Ok(())
}

/// Sorted union of the classes present in truth or prediction
fn present_labels(truth: ArrayView1<u8>, pred: ArrayView1<u8>) -> Vec<u8> {
    truth
        .iter()
        .chain(pred.iter())
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn class_metrics(truth: ArrayView1<u8>, pred: ArrayView1<u8>, label: u8, beta: f64) -> ClassMetrics {
    let (mut tp, mut fp, mut fn_count) = (0usize, 0usize, 0usize);
    for (&t, &p) in truth.iter().zip(pred.iter()) {
        match (t == label, p == label) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_count += 1,
            (false, false) => {}
        }
    }

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_count);
    let beta2 = beta * beta;
    let denominator = beta2 * precision + recall;
    let f_score = if denominator > 0.0 {
        (1.0 + beta2) * precision * recall / denominator
    } else {
        0.0
    };

    ClassMetrics {
        precision,
        recall,
        f1_score: f_score,
        support: tp + fn_count,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Support-weighted F-beta over the classes present in either column
pub fn weighted_fbeta(truth: ArrayView1<u8>, pred: ArrayView1<u8>, beta: f64) -> f64 {
    let metrics: Vec<ClassMetrics> = present_labels(truth, pred)
        .into_iter()
        .map(|label| class_metrics(truth, pred, label, beta))
        .collect();

    let total_support: usize = metrics.iter().map(|m| m.support).sum();
    if total_support == 0 {
        return 0.0;
    }
    metrics
        .iter()
        .map(|m| m.f1_score * m.support as f64)
        .sum::<f64>()
        / total_support as f64
}

/// Geometric mean; any zero makes it zero
pub fn geometric_mean(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|&value| value <= 0.0) {
        return 0.0;
    }
    (values.iter().map(|value| value.ln()).sum::<f64>() / values.len() as f64).exp()
}

fn accuracy(truth: ArrayView1<u8>, pred: ArrayView1<u8>) -> f64 {
    let correct = truth.iter().zip(pred.iter()).filter(|(t, p)| t == p).count();
    ratio(correct, truth.len())
}

fn classification_report(name: &str, truth: ArrayView1<u8>, pred: ArrayView1<u8>) -> ClassificationReport {
    let classes: Vec<(u8, ClassMetrics)> = present_labels(truth, pred)
        .into_iter()
        .map(|label| (label, class_metrics(truth, pred, label, 1.0)))
        .collect();

    let n_classes = classes.len().max(1) as f64;
    let total_support: usize = classes.iter().map(|(_, m)| m.support).sum();

    let macro_avg = ClassMetrics {
        precision: classes.iter().map(|(_, m)| m.precision).sum::<f64>() / n_classes,
        recall: classes.iter().map(|(_, m)| m.recall).sum::<f64>() / n_classes,
        f1_score: classes.iter().map(|(_, m)| m.f1_score).sum::<f64>() / n_classes,
        support: total_support,
    };

    let weighted = |field: fn(&ClassMetrics) -> f64| -> f64 {
        if total_support == 0 {
            return 0.0;
        }
        classes
            .iter()
            .map(|(_, m)| field(m) * m.support as f64)
            .sum::<f64>()
            / total_support as f64
    };
    let weighted_avg = ClassMetrics {
        precision: weighted(|m| m.precision),
        recall: weighted(|m| m.recall),
        f1_score: weighted(|m| m.f1_score),
        support: total_support,
    };

    ClassificationReport {
        category: name.to_string(),
        accuracy: accuracy(truth, pred),
        classes,
        macro_avg,
        weighted_avg,
    }
}
