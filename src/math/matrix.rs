use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Dense row-major matrix of `f64`.
///
/// The buffer is contiguous, `data.len() == rows * cols`, and the linear
/// index of `(row, col)` is `row * cols + col`. Every constructor produces a
/// fully initialized buffer.
///
/// Shape mismatches and out-of-bounds access are programmer errors and
/// panic; they are never surfaced as recoverable errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wraps an existing row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Matrix {
        if data.len() != rows * cols {
            panic!(
                "Matrix::from_vec: buffer of length {} cannot fill a ({} {}) matrix",
                data.len(),
                rows,
                cols
            );
        }
        Matrix { rows, cols, data }
    }

    /// Packs column vectors (each `n x 1`) into one `n x k` matrix.
    /// Used to assemble a mini-batch where every sample is a column.
    pub fn from_columns(columns: &[&Matrix]) -> Matrix {
        if columns.is_empty() {
            panic!("Matrix::from_columns called with no columns");
        }
        let rows = columns[0].rows;
        for col in columns {
            if col.cols != 1 || col.rows != rows {
                panic!(
                    "Matrix::from_columns: expected ({} 1) columns, got ({} {})",
                    rows, col.rows, col.cols
                );
            }
        }

        let mut res = Matrix::zeros(rows, columns.len());
        for (j, col) in columns.iter().enumerate() {
            for i in 0..rows {
                res.data[i * res.cols + j] = col.data[i];
            }
        }
        res
    }

    pub fn element(&self, row: usize, col: usize) -> f64 {
        self.element_at(row * self.cols + col)
    }

    pub fn element_at(&self, idx: usize) -> f64 {
        if idx >= self.rows * self.cols {
            panic!(
                "Indexed matrix of size ({} {}) with index {}",
                self.rows, self.cols, idx
            );
        }
        self.data[idx]
    }

    pub fn set_element(&mut self, row: usize, col: usize, value: f64) {
        self.set_element_at(row * self.cols + col, value);
    }

    pub fn set_element_at(&mut self, idx: usize, value: f64) {
        if idx >= self.rows * self.cols {
            panic!(
                "Indexed matrix of size ({} {}) with index {}",
                self.rows, self.cols, idx
            );
        }
        self.data[idx] = value;
    }

    /// The underlying row-major buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Extracts column `j` as an `n x 1` matrix.
    pub fn column(&self, j: usize) -> Matrix {
        if j >= self.cols {
            panic!(
                "Matrix::column: index {} out of range for a ({} {}) matrix",
                j, self.rows, self.cols
            );
        }
        let mut res = Matrix::zeros(self.rows, 1);
        for i in 0..self.rows {
            res.data[i] = self.data[i * self.cols + j];
        }
        res
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i * res.cols + j] = self.data[j * self.cols + i];
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Like `map`, but the functor also receives the element's position.
    pub fn map_indexed<F>(&self, functor: F) -> Matrix
    where
        F: Fn(usize, usize, f64) -> f64,
    {
        let mut res = Matrix::zeros(self.rows, self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                let idx = i * self.cols + j;
                res.data[idx] = functor(i, j, self.data[idx]);
            }
        }
        res
    }

    /// Elementwise (Hadamard) product.
    pub fn hadamard(&self, other: &Matrix) -> Matrix {
        if self.rows != other.rows || self.cols != other.cols {
            panic!(
                "Called hadamard on incompatible matrices: ({} {}) and ({} {})",
                self.rows, self.cols, other.rows, other.cols
            );
        }
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| a * b)
                .collect(),
        }
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Adds an `n x 1` column vector to every column of an `n x k` matrix.
    /// This is the bias broadcast of the batched forward pass.
    pub fn add_broadcast(&self, column: &Matrix) -> Matrix {
        if column.cols != 1 || column.rows != self.rows {
            panic!(
                "Called add_broadcast on incompatible matrices: ({} {}) and ({} {})",
                self.rows, self.cols, column.rows, column.cols
            );
        }
        self.map_indexed(|i, _, x| x + column.data[i])
    }

    /// Per-row mean, collapsing an `n x k` matrix to `n x 1`.
    pub fn row_mean(&self) -> Matrix {
        let mut res = Matrix::zeros(self.rows, 1);
        let inv = 1.0 / self.cols as f64;
        for i in 0..self.rows {
            let mut sum = 0.0;
            for j in 0..self.cols {
                sum += self.data[i * self.cols + j];
            }
            res.data[i] = sum * inv;
        }
        res
    }

    /// Sum of squared entries.
    pub fn squared_norm(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum()
    }

    /// Serde can construct a matrix whose buffer disagrees with its declared
    /// shape; deserialization paths must check this before trusting it.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.rows * self.cols
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: &Matrix) -> Matrix {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!(
                "Called add on incompatible matrices: ({} {}) and ({} {})",
                self.rows, self.cols, rhs.rows, rhs.cols
            );
        }
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(rhs.data.iter())
                .map(|(a, b)| a + b)
                .collect(),
        }
    }
}

impl Sub for &Matrix {
    type Output = Matrix;

    fn sub(self, rhs: &Matrix) -> Matrix {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!(
                "Called sub on incompatible matrices: ({} {}) and ({} {})",
                self.rows, self.cols, rhs.rows, rhs.cols
            );
        }
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(rhs.data.iter())
                .map(|(a, b)| a - b)
                .collect(),
        }
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.rows {
            panic!(
                "Called mult on incompatible matrices: ({} {}) and ({} {})",
                self.rows, self.cols, rhs.rows, rhs.cols
            );
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.data[i * self.cols + k] * rhs.data[k * rhs.cols + j];
                }
                res.data[i * res.cols + j] = sum;
            }
        }
        res
    }
}
