use crate::error::{AppError, Result};
use crate::models::message::{CategorySchema, LabeledMessage};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

/// Messages with their label matrix (rows × categories)
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    pub ids: Vec<i64>,
    pub messages: Vec<String>,
    pub labels: Array2<u8>,
    pub category_names: Vec<String>,
}

impl LabeledDataset {
    /// Build a dataset from stored rows; every row must carry one label per schema column
    pub fn from_rows(schema: &CategorySchema, rows: &[LabeledMessage]) -> Result<Self> {
        let n_categories = schema.len();
        let mut labels = Array2::zeros((rows.len(), n_categories));

        for (i, row) in rows.iter().enumerate() {
            if row.labels.len() != n_categories {
                return Err(AppError::data_quality(
                    row.id,
                    format!(
                        "expected {} labels, found {}",
                        n_categories,
                        row.labels.len()
                    ),
                ));
            }
            for (j, &value) in row.labels.iter().enumerate() {
                labels[[i, j]] = value;
            }
        }

        Ok(Self {
            ids: rows.iter().map(|row| row.id).collect(),
            messages: rows.iter().map(|row| row.message.clone()).collect(),
            labels,
            category_names: schema.names().to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn n_categories(&self) -> usize {
        self.category_names.len()
    }

    /// Rows at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            ids: indices.iter().map(|&i| self.ids[i]).collect(),
            messages: indices.iter().map(|&i| self.messages[i].clone()).collect(),
            labels: self.labels.select(Axis(0), indices),
            category_names: self.category_names.clone(),
        }
    }

    /// Shuffle with a seeded RNG and split into (train, test).
    ///
    /// The test side holds `ceil(len * test_size)` rows; both sides must be non-empty.
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> Result<(Self, Self)> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(AppError::Validation(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }

        let n = self.len();
        let n_test = (n as f64 * test_size).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(AppError::Validation(format!(
                "cannot split {} rows with test_size {}",
                n, test_size
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let train_indices = indices.split_off(n_test);
        let test_indices = indices;

        debug!(
            train = train_indices.len(),
            test = test_indices.len(),
            seed,
            "Dataset split"
        );

        Ok((self.select(&train_indices), self.select(&test_indices)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::MessageRecord;

    fn create_test_dataset(n: usize) -> LabeledDataset {
        let schema = CategorySchema::new(vec!["related".to_string(), "water".to_string()]);
        let rows: Vec<LabeledMessage> = (0..n)
            .map(|i| {
                LabeledMessage::new(
                    MessageRecord {
                        id: i as i64,
                        message: format!("message {}", i),
                        original: None,
                        genre: None,
                    },
                    vec![(i % 2) as u8, 1],
                )
            })
            .collect();
        LabeledDataset::from_rows(&schema, &rows).unwrap()
    }

    #[test]
    fn test_from_rows_shape() {
        let dataset = create_test_dataset(5);
        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.labels.dim(), (5, 2));
        assert_eq!(dataset.labels[[1, 0]], 1);
        assert_eq!(dataset.labels[[2, 0]], 0);
    }

    #[test]
    fn test_from_rows_rejects_short_labels() {
        let schema = CategorySchema::new(vec!["related".to_string(), "water".to_string()]);
        let row = LabeledMessage {
            id: 9,
            message: "help".to_string(),
            original: None,
            genre: None,
            labels: vec![1],
        };
        let err = LabeledDataset::from_rows(&schema, &[row]).unwrap_err();
        assert_eq!(err.error_code(), "DATA_QUALITY_ERROR");
    }

    #[test]
    fn test_split_sizes() {
        let dataset = create_test_dataset(20);
        let (train, test) = dataset.train_test_split(0.2, 42).unwrap();
        assert_eq!(test.len(), 4);
        assert_eq!(train.len(), 16);
        assert_eq!(train.labels.nrows(), 16);
        assert_eq!(test.category_names, dataset.category_names);
    }

    #[test]
    fn test_split_rounds_test_side_up() {
        let dataset = create_test_dataset(11);
        let (train, test) = dataset.train_test_split(0.2, 42).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_split_is_deterministic_and_disjoint() {
        let dataset = create_test_dataset(30);
        let (train_a, test_a) = dataset.train_test_split(0.2, 7).unwrap();
        let (train_b, test_b) = dataset.train_test_split(0.2, 7).unwrap();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);

        let mut all: Vec<i64> = train_a.ids.iter().chain(&test_a.ids).copied().collect();
        all.sort();
        assert_eq!(all, (0..30).collect::<Vec<i64>>());
    }

    #[test]
    fn test_split_keeps_rows_aligned() {
        let dataset = create_test_dataset(10);
        let (train, _) = dataset.train_test_split(0.3, 1).unwrap();
        for (i, id) in train.ids.iter().enumerate() {
            assert_eq!(train.messages[i], format!("message {}", id));
            assert_eq!(train.labels[[i, 0]], (*id % 2) as u8);
        }
    }

    #[test]
    fn test_split_too_small() {
        let dataset = create_test_dataset(1);
        assert!(dataset.train_test_split(0.2, 42).is_err());
        assert!(create_test_dataset(10).train_test_split(1.5, 42).is_err());
    }
}
