//! # Event Matrix
//!
//! Dense events x channels buffer. Storage is column-major so a single
//! channel is a contiguous slice, matching the columnar layout of the store.

use crate::metadata::ValueRange;

/// Errors raised by matrix construction and selection
#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    /// Buffer length or column lengths disagree with the declared shape
    #[error("Shape mismatch: expected {expected} values, found {found}")]
    ShapeMismatch {
        /// Values implied by the shape
        expected: usize,
        /// Values supplied
        found: usize,
    },

    /// A row or column selection points past the matrix extent
    #[error("Index out of bounds: {axis} {index} >= {len}")]
    IndexOutOfBounds {
        /// "row" or "column"
        axis: &'static str,
        /// Offending index
        index: usize,
        /// Extent of that axis
        len: usize,
    },
}

/// Dense event matrix (rows are events, columns are channels)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl EventMatrix {
    /// A matrix of zeros
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            data: vec![0.0; n_rows * n_cols],
        }
    }

    /// Build from a column-major buffer
    pub fn from_column_major(n_rows: usize, n_cols: usize, data: Vec<f64>) -> Result<Self, MatrixError> {
        if data.len() != n_rows * n_cols {
            return Err(MatrixError::ShapeMismatch {
                expected: n_rows * n_cols,
                found: data.len(),
            });
        }
        Ok(Self { n_rows, n_cols, data })
    }

    /// Build from a row-major buffer
    pub fn from_row_major(n_rows: usize, n_cols: usize, data: &[f64]) -> Result<Self, MatrixError> {
        if data.len() != n_rows * n_cols {
            return Err(MatrixError::ShapeMismatch {
                expected: n_rows * n_cols,
                found: data.len(),
            });
        }
        let mut out = Vec::with_capacity(data.len());
        for c in 0..n_cols {
            out.extend((0..n_rows).map(|r| data[r * n_cols + c]));
        }
        Ok(Self {
            n_rows,
            n_cols,
            data: out,
        })
    }

    /// Build from equally long columns
    pub fn from_columns(n_rows: usize, columns: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let n_cols = columns.len();
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for column in columns {
            if column.len() != n_rows {
                return Err(MatrixError::ShapeMismatch {
                    expected: n_rows,
                    found: column.len(),
                });
            }
            data.extend(column);
        }
        Ok(Self { n_rows, n_cols, data })
    }

    /// Number of events
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of channels
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Value at `(row, col)`, `None` outside the extent
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.n_rows && col < self.n_cols {
            Some(self.data[col * self.n_rows + row])
        } else {
            None
        }
    }

    /// One channel as a contiguous slice
    pub fn column(&self, col: usize) -> Option<&[f64]> {
        if col < self.n_cols {
            Some(&self.data[col * self.n_rows..(col + 1) * self.n_rows])
        } else {
            None
        }
    }

    /// Iterate over channels in order
    pub fn columns(&self) -> impl Iterator<Item = &[f64]> {
        let n_rows = self.n_rows;
        (0..self.n_cols).map(move |c| &self.data[c * n_rows..(c + 1) * n_rows])
    }

    /// Copy out as a row-major buffer
    pub fn to_row_major(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.data.len());
        for r in 0..self.n_rows {
            out.extend((0..self.n_cols).map(|c| self.data[c * self.n_rows + r]));
        }
        out
    }

    /// The column-major buffer
    pub fn as_column_major(&self) -> &[f64] {
        &self.data
    }

    /// Min/max of the finite values in every column
    pub fn column_ranges(&self) -> Vec<ValueRange> {
        self.columns().map(ValueRange::of_values).collect()
    }

    /// New matrix with the selected rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Result<Self, MatrixError> {
        check_bounds("row", rows, self.n_rows)?;
        let mut data = Vec::with_capacity(rows.len() * self.n_cols);
        for column in self.columns() {
            data.extend(rows.iter().map(|&r| column[r]));
        }
        Ok(Self {
            n_rows: rows.len(),
            n_cols: self.n_cols,
            data,
        })
    }

    /// New matrix with the selected columns, in the given order
    pub fn select_cols(&self, cols: &[usize]) -> Result<Self, MatrixError> {
        check_bounds("column", cols, self.n_cols)?;
        let mut data = Vec::with_capacity(self.n_rows * cols.len());
        for &c in cols {
            data.extend_from_slice(&self.data[c * self.n_rows..(c + 1) * self.n_rows]);
        }
        Ok(Self {
            n_rows: self.n_rows,
            n_cols: cols.len(),
            data,
        })
    }

    /// Copy with every value rounded to `f32`, the precision a store keeps
    pub fn rounded_to_f32(&self) -> Self {
        Self {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            data: self.data.iter().map(|&v| f64::from(v as f32)).collect(),
        }
    }

    /// Apply optional row and column selections; `None` keeps the whole axis
    pub fn select(&self, rows: Option<&[usize]>, cols: Option<&[usize]>) -> Result<Self, MatrixError> {
        match (rows, cols) {
            (None, None) => Ok(self.clone()),
            (Some(rows), None) => self.select_rows(rows),
            (None, Some(cols)) => self.select_cols(cols),
            (Some(rows), Some(cols)) => self.select_cols(cols)?.select_rows(rows),
        }
    }
}

pub(crate) fn check_bounds(axis: &'static str, indices: &[usize], len: usize) -> Result<(), MatrixError> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&index) => Err(MatrixError::IndexOutOfBounds { axis, index, len }),
        None => Ok(()),
    }
}
