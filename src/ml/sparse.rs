use crate::error::{AppError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Compressed sparse row matrix of `f64`.
///
/// Row `i` occupies `indices[indptr[i]..indptr[i + 1]]` (column indices,
/// strictly increasing) and the matching slice of `data`. Explicit zeros are
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl SparseMatrix {
    /// Matrix with `n_rows` empty rows
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            indptr: vec![0; n_rows + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Build from per-row `(column, value)` entries in any order
    pub fn from_rows(rows: Vec<Vec<(usize, f64)>>, n_cols: usize) -> Result<Self> {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for (row_idx, mut row) in rows.into_iter().enumerate() {
            row.sort_by_key(|(col, _)| *col);
            for window in row.windows(2) {
                if window[0].0 == window[1].0 {
                    return Err(AppError::ShapeMismatch(format!(
                        "duplicate column {} in row {}",
                        window[0].0, row_idx
                    )));
                }
            }
            for (col, value) in row {
                if col >= n_cols {
                    return Err(AppError::ShapeMismatch(format!(
                        "column {} out of bounds for {} columns",
                        col, n_cols
                    )));
                }
                if value != 0.0 {
                    indices.push(col);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
        }

        Ok(Self {
            n_rows: indptr.len() - 1,
            n_cols,
            indptr,
            indices,
            data,
        })
    }

    /// Single-column matrix from dense values
    pub fn from_column(values: &[f64]) -> Self {
        let mut indptr = Vec::with_capacity(values.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        for &value in values {
            if value != 0.0 {
                indices.push(0);
                data.push(value);
            }
            indptr.push(indices.len());
        }
        Self {
            n_rows: values.len(),
            n_cols: 1,
            indptr,
            indices,
            data,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Non-zero `(column, value)` entries of row `row`
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (start, end) = self.row_bounds(row);
        self.indices[start..end]
            .iter()
            .copied()
            .zip(self.data[start..end].iter().copied())
    }

    /// Value at (`row`, `col`); zero when not stored
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (start, end) = self.row_bounds(row);
        match self.indices[start..end].binary_search(&col) {
            Ok(offset) => self.data[start + offset],
            Err(_) => 0.0,
        }
    }

    fn row_bounds(&self, row: usize) -> (usize, usize) {
        if row >= self.n_rows {
            return (0, 0);
        }
        (self.indptr[row], self.indptr[row + 1])
    }

    /// Concatenate columns: `[self | other]`
    pub fn hstack(&self, other: &SparseMatrix) -> Result<SparseMatrix> {
        if self.n_rows != other.n_rows {
            return Err(AppError::ShapeMismatch(format!(
                "cannot stack {} rows with {} rows",
                self.n_rows, other.n_rows
            )));
        }

        let mut indptr = Vec::with_capacity(self.n_rows + 1);
        let mut indices = Vec::with_capacity(self.nnz() + other.nnz());
        let mut data = Vec::with_capacity(self.nnz() + other.nnz());
        indptr.push(0);

        for row in 0..self.n_rows {
            for (col, value) in self.row(row) {
                indices.push(col);
                data.push(value);
            }
            for (col, value) in other.row(row) {
                indices.push(self.n_cols + col);
                data.push(value);
            }
            indptr.push(indices.len());
        }

        Ok(SparseMatrix {
            n_rows: self.n_rows,
            n_cols: self.n_cols + other.n_cols,
            indptr,
            indices,
            data,
        })
    }

    /// New matrix holding the given rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Result<SparseMatrix> {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for &row in rows {
            if row >= self.n_rows {
                return Err(AppError::ShapeMismatch(format!(
                    "row {} out of bounds for {} rows",
                    row, self.n_rows
                )));
            }
            let (start, end) = self.row_bounds(row);
            indices.extend_from_slice(&self.indices[start..end]);
            data.extend_from_slice(&self.data[start..end]);
            indptr.push(indices.len());
        }

        Ok(SparseMatrix {
            n_rows: rows.len(),
            n_cols: self.n_cols,
            indptr,
            indices,
            data,
        })
    }

    /// Column-major view: for each column, its `(row, value)` entries
    pub fn columns(&self) -> Vec<Vec<(usize, f64)>> {
        let mut columns = vec![Vec::new(); self.n_cols];
        for row in 0..self.n_rows {
            for (col, value) in self.row(row) {
                columns[col].push((row, value));
            }
        }
        columns
    }

    /// Dense copy
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.n_rows, self.n_cols));
        for row in 0..self.n_rows {
            for (col, value) in self.row(row) {
                dense[[row, col]] = value;
            }
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SparseMatrix {
        SparseMatrix::from_rows(vec![vec![(2, 3.0), (0, 1.0)], vec![], vec![(1, 0.5)]], 3)
            .unwrap()
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = SparseMatrix::from_rows(vec![vec![(1, 0.5), (1, 0.5)]], 3).unwrap_err();
        assert_eq!(err.error_code(), "SHAPE_MISMATCH");
    }

    #[test]
    fn test_from_rows_sorts_and_reads_back() {
        let matrix = sample();
        assert_eq!(matrix.shape(), (3, 3));
        assert_eq!(matrix.nnz(), 3);
        assert_eq!(matrix.row(0).collect::<Vec<_>>(), vec![(0, 1.0), (2, 3.0)]);
        assert_eq!(matrix.get(0, 2), 3.0);
        assert_eq!(matrix.get(1, 1), 0.0);
        assert_eq!(matrix.get(2, 1), 0.5);
    }

    #[test]
    fn test_zero_values_not_stored() {
        let matrix = SparseMatrix::from_rows(vec![vec![(0, 0.0), (1, 2.0)]], 2).unwrap();
        assert_eq!(matrix.nnz(), 1);
    }

    #[test]
    fn test_out_of_bounds_column() {
        assert!(SparseMatrix::from_rows(vec![vec![(5, 1.0)]], 3).is_err());
    }

    #[test]
    fn test_hstack_appends_columns() {
        let left = sample();
        let right = SparseMatrix::from_column(&[1.0, 0.0, 1.0]);
        let stacked = left.hstack(&right).unwrap();

        assert_eq!(stacked.shape(), (3, 4));
        assert_eq!(stacked.get(0, 3), 1.0);
        assert_eq!(stacked.get(1, 3), 0.0);
        assert_eq!(stacked.get(2, 3), 1.0);
        assert_eq!(stacked.get(0, 2), 3.0);
    }

    #[test]
    fn test_hstack_row_mismatch() {
        let left = sample();
        let right = SparseMatrix::from_column(&[1.0]);
        assert!(left.hstack(&right).is_err());
    }

    #[test]
    fn test_select_rows_and_columns() {
        let matrix = sample();
        let selected = matrix.select_rows(&[2, 0]).unwrap();
        assert_eq!(selected.n_rows(), 2);
        assert_eq!(selected.get(0, 1), 0.5);
        assert_eq!(selected.get(1, 0), 1.0);

        let columns = matrix.columns();
        assert_eq!(columns[0], vec![(0, 1.0)]);
        assert_eq!(columns[1], vec![(2, 0.5)]);
        assert_eq!(columns[2], vec![(0, 3.0)]);
    }

    #[test]
    fn test_to_dense() {
        let dense = sample().to_dense();
        assert_eq!(dense[[0, 2]], 3.0);
        assert_eq!(dense[[1, 0]], 0.0);
    }
}
