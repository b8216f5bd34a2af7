//! Jacobian sized matrix used by the inversion strategies.
//!
//! The Jacobian of an N-joint chain is 6xN with N only known when the chain is loaded, so
//! this wraps a dynamically sized nalgebra matrix. Products, sums and transposes go straight
//! to nalgebra; only the inverse is our own Gauss-Jordan elimination, as it must report
//! degenerate pivots below [`DEGENERACY_THRESHOLD`] rather than return near-singular
//! garbage. Every operation returns a new matrix; inputs are never modified.

use std::fmt;
use std::ops::{Add, Index, IndexMut, Mul};

use nalgebra::{DMatrix, DVector};

use crate::kinematics_error::KinematicsError;

/// Pivots with a magnitude below this value make Gauss-Jordan inversion fail.
pub const DEGENERACY_THRESHOLD: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix(DMatrix<f64>);

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix(DMatrix::zeros(rows, cols))
    }

    pub fn identity(size: usize) -> Self {
        Matrix(DMatrix::identity(size, size))
    }

    /// Builds the matrix from values listed row after row.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != rows * cols`.
    pub fn from_row_slice(rows: usize, cols: usize, values: &[f64]) -> Self {
        assert_eq!(values.len(), rows * cols, "value count must equal rows * cols");
        Matrix(DMatrix::from_row_slice(rows, cols, values))
    }

    /// Builds the matrix from a slice of equally long rows.
    pub fn from_rows(rows: &[&[f64]]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        assert!(rows.iter().all(|r| r.len() == cols), "all rows must have the same length");
        let values: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::from_row_slice(rows.len(), cols, &values)
    }

    pub fn rows(&self) -> usize {
        self.0.nrows()
    }

    pub fn cols(&self) -> usize {
        self.0.ncols()
    }

    pub fn is_square(&self) -> bool {
        self.0.is_square()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.0[(row, col)] = value;
    }

    /// Row `row` copied into a vector.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.0.row(row).iter().copied().collect()
    }

    /// Column `col` copied into a vector.
    pub fn column(&self, col: usize) -> Vec<f64> {
        self.0.column(col).iter().copied().collect()
    }

    /// Matrix product `self * other`.
    ///
    /// # Panics
    ///
    /// Panics if `self.cols() != other.rows()`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.cols(), other.rows(), "inner dimensions must agree");
        Matrix(&self.0 * &other.0)
    }

    /// Matrix-vector product `self * v`.
    ///
    /// # Panics
    ///
    /// Panics if `v.len() != self.cols()`.
    pub fn multiply_vector(&self, v: &DVector<f64>) -> DVector<f64> {
        assert_eq!(v.len(), self.cols(), "vector length must equal column count");
        &self.0 * v
    }

    pub fn transpose(&self) -> Matrix {
        Matrix(self.0.transpose())
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        Matrix(&self.0 * factor)
    }

    /// Element-wise sum.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    pub fn add(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.0.shape(), other.0.shape(), "shapes must match");
        Matrix(&self.0 + &other.0)
    }

    /// Copy of the matrix with rows `a` and `b` exchanged.
    pub fn swap_rows(&self, a: usize, b: usize) -> Matrix {
        let mut m = self.0.clone();
        m.swap_rows(a, b);
        Matrix(m)
    }

    /// The first `count` rows as a new matrix (e.g. the linear part of a Jacobian).
    pub fn top_rows(&self, count: usize) -> Matrix {
        assert!(count <= self.rows(), "cannot take more rows than the matrix has");
        Matrix(self.0.rows(0, count).into_owned())
    }

    pub fn as_dmatrix(&self) -> &DMatrix<f64> {
        &self.0
    }

    pub fn as_dmatrix_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.0
    }

    /// Gauss-Jordan inverse with partial pivoting.
    ///
    /// For each column the row with the largest absolute value at or below the diagonal
    /// becomes the pivot. If that magnitude is below [`DEGENERACY_THRESHOLD`] the matrix
    /// is reported as degenerate instead of producing meaningless values.
    pub fn inverse(&self) -> Result<Matrix, KinematicsError> {
        if !self.is_square() {
            return Err(KinematicsError::NotSquare { rows: self.rows(), cols: self.cols() });
        }
        let n = self.rows();

        // Augmented [A | I], reduced to [I | A^-1]
        let mut work = DMatrix::<f64>::zeros(n, 2 * n);
        work.view_mut((0, 0), (n, n)).copy_from(&self.0);
        work.view_mut((0, n), (n, n)).fill_with_identity();

        for col in 0..n {
            let pivot_row = col + work.column(col).rows(col, n - col).iamax();
            let pivot = work[(pivot_row, col)].abs();
            if pivot < DEGENERACY_THRESHOLD {
                return Err(KinematicsError::DegenerateMatrix { column: col, pivot });
            }
            work.swap_rows(col, pivot_row);

            let diagonal = work[(col, col)];
            let mut pivot_view = work.row_mut(col);
            pivot_view /= diagonal;
            let pivot_values = work.row(col).clone_owned();

            for r in (0..n).filter(|&r| r != col) {
                let factor = work[(r, col)];
                if factor != 0.0 {
                    let mut row = work.row_mut(r);
                    row -= &pivot_values * factor;
                }
            }
        }
        Ok(Matrix(work.columns(n, n).into_owned()))
    }
}

impl From<DMatrix<f64>> for Matrix {
    fn from(matrix: DMatrix<f64>) -> Self {
        Matrix(matrix)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.0[index]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.0[index]
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        self.multiply(rhs)
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: &Matrix) -> Matrix {
        Matrix::add(self, rhs)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.0.row_iter() {
            let values: Vec<String> = row.iter().map(|v| format!("{:9.4}", v)).collect();
            writeln!(f, "[{}]", values.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_matrix_approx_eq(left: &Matrix, right: &Matrix, epsilon: f64) {
        assert_eq!((left.rows(), left.cols()), (right.rows(), right.cols()));
        for i in 0..left.rows() {
            for j in 0..left.cols() {
                assert!(
                    (left[(i, j)] - right[(i, j)]).abs() < epsilon,
                    "left[{0},{1}] = {2} is not approximately equal to right[{0},{1}] = {3}",
                    i, j, left[(i, j)], right[(i, j)]
                );
            }
        }
    }

    #[test]
    fn test_multiply_rectangular() {
        let a = Matrix::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let b = Matrix::from_rows(&[&[7.0, 8.0], &[9.0, 10.0], &[11.0, 12.0]]);
        let c = &a * &b;
        assert_eq!(c, Matrix::from_rows(&[&[58.0, 64.0], &[139.0, 154.0]]));
    }

    #[test]
    fn test_multiply_vector() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]);
        let product = a.multiply_vector(&DVector::from_vec(vec![1.0, -1.0]));
        assert_eq!(product, DVector::from_vec(vec![-1.0, -1.0, -1.0]));
    }

    #[test]
    fn test_transpose_scale_add() {
        let a = Matrix::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let t = a.transpose();
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t[(2, 1)], 6.0);
        let doubled = a.scale(2.0);
        assert_eq!(&a + &a, doubled);
        // Inputs stay untouched
        assert_eq!(a[(0, 0)], 1.0);
    }

    #[test]
    fn test_swap_rows_returns_copy() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let s = a.swap_rows(0, 1);
        assert_eq!(s.row(0), vec![3.0, 4.0]);
        assert_eq!(a.row(0), vec![1.0, 2.0]);
    }

    #[test]
    fn test_inverse_requires_pivoting() {
        // Zero on the diagonal, only solvable with row exchange
        let a = Matrix::from_rows(&[&[0.0, 1.0, 2.0], &[1.0, 0.0, 3.0], &[4.0, -3.0, 8.0]]);
        let inv = a.inverse().expect("matrix is invertible");
        assert_matrix_approx_eq(&(&a * &inv), &Matrix::identity(3), 1e-12);
        assert_matrix_approx_eq(&(&inv * &a), &Matrix::identity(3), 1e-12);
    }

    #[test]
    fn test_inverse_matches_nalgebra() {
        let a = Matrix::from_rows(&[
            &[4.0, -2.0, 1.0, 0.5],
            &[3.0, 6.0, -4.0, 2.0],
            &[2.0, 1.0, 8.0, -1.0],
            &[0.0, 1.5, -2.0, 5.0],
        ]);
        let expected = a.as_dmatrix().clone().try_inverse().expect("regular matrix");
        assert_matrix_approx_eq(&a.inverse().unwrap(), &Matrix::from(expected), 1e-12);
    }

    #[test]
    fn test_inverse_degenerate() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[2.0, 4.0]]);
        match a.inverse() {
            Err(KinematicsError::DegenerateMatrix { column, pivot }) => {
                assert_eq!(column, 1);
                assert!(pivot < DEGENERACY_THRESHOLD);
            }
            other => panic!("expected degenerate matrix, got {:?}", other),
        }
    }

    #[test]
    fn test_inverse_not_square() {
        let a = Matrix::zeros(2, 3);
        assert_eq!(a.inverse(), Err(KinematicsError::NotSquare { rows: 2, cols: 3 }));
    }

    #[test]
    fn test_top_rows() {
        let a = Matrix::from_row_slice(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let top = a.top_rows(2);
        assert_eq!(top, Matrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]));
        assert_abs_diff_eq!(a.column(1).iter().sum::<f64>(), 12.0);
    }
}
