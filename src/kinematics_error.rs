//! Errors reported by the numeric core (matrix inversion and the solvers built on it)

use thiserror::Error;

/// Failures of the linear algebra the solvers depend on. Non-convergence of the iterative
/// solver is not an error, it is reported through [`crate::kinematic_traits::IkSolution`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KinematicsError {
    /// Gauss-Jordan elimination found no pivot above the degeneracy threshold.
    #[error("degenerate matrix: largest pivot {pivot:e} in column {column} is below threshold")]
    DegenerateMatrix { column: usize, pivot: f64 },

    /// Direct inversion was requested for a matrix that is not square.
    #[error("matrix {rows}x{cols} is not square and cannot be inverted directly")]
    NotSquare { rows: usize, cols: usize },
}
