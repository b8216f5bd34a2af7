//! Jacobian inversion strategies. Each maps a 6xN (or 3xN for position only targets)
//! Jacobian to the Nx6 (Nx3) matrix that turns a Cartesian error into joint corrections.

use tracing::debug;

use crate::kinematics_error::KinematicsError;
use crate::matrix::Matrix;

/// The one capability the IK solvers need from an inversion strategy.
pub trait JacobianInverter {
    fn invert(&self, jacobian: &Matrix) -> Result<Matrix, KinematicsError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InversionStrategy {
    /// `J^T`. Cheap and least accurate, never fails.
    Transpose,

    /// `J^T (J J^T + lambda^2 I)^-1`. The damping keeps the inner matrix invertible near
    /// singular configurations at the price of a small bias.
    DampedLeastSquares { lambda: f64 },

    /// `(J^T J)^-1 J^T`. Falls back to `J^T` when `J^T J` is degenerate.
    PseudoInverse,

    /// Gauss-Jordan inverse of `J` itself. Only defined for square Jacobians (6 joints)
    /// and fails on singular configurations; useful as a baseline.
    UnstableInverse,
}

impl Default for InversionStrategy {
    fn default() -> Self {
        InversionStrategy::DampedLeastSquares { lambda: 0.01 }
    }
}

impl JacobianInverter for InversionStrategy {
    fn invert(&self, jacobian: &Matrix) -> Result<Matrix, KinematicsError> {
        match *self {
            InversionStrategy::Transpose => Ok(jacobian.transpose()),
            InversionStrategy::DampedLeastSquares { lambda } => damped_least_squares(jacobian, lambda),
            InversionStrategy::PseudoInverse => Ok(pseudo_inverse(jacobian)),
            InversionStrategy::UnstableInverse => jacobian.inverse(),
        }
    }
}

fn damped_least_squares(jacobian: &Matrix, lambda: f64) -> Result<Matrix, KinematicsError> {
    let jt = jacobian.transpose();
    let damping = Matrix::identity(jacobian.rows()).scale(lambda * lambda);
    let inner = (jacobian * &jt).add(&damping).inverse()?;
    Ok(&jt * &inner)
}

fn pseudo_inverse(jacobian: &Matrix) -> Matrix {
    let jt = jacobian.transpose();
    match (&jt * jacobian).inverse() {
        Ok(inner) => &inner * &jt,
        Err(e) => {
            // Always the case for position only targets on chains with more than 3 joints
            // and for chains with more than 6, so it is not worth a warning every iteration.
            debug!("pseudo-inverse unavailable ({}), falling back to transpose", e);
            jt
        }
    }
}

/// Damped least squares only stays invertible with a positive, finite lambda.
pub fn valid_damping(lambda: f64) -> bool {
    lambda.is_finite() && lambda > 0.0
}

impl std::str::FromStr for InversionStrategy {
    type Err = String;

    /// Parses `transpose`, `pseudo_inverse`, `unstable_inverse`, `damped_least_squares`
    /// (lambda 0.01) or `damped_least_squares:<lambda>`. Lambda must be positive, without
    /// damping the strategy fails at singular configurations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, argument) = match s.split_once(':') {
            Some((name, argument)) => (name.trim(), Some(argument.trim())),
            None => (s.trim(), None),
        };
        match (name, argument) {
            ("transpose", None) => Ok(InversionStrategy::Transpose),
            ("pseudo_inverse", None) => Ok(InversionStrategy::PseudoInverse),
            ("unstable_inverse", None) => Ok(InversionStrategy::UnstableInverse),
            ("damped_least_squares" | "dls", None) => Ok(InversionStrategy::default()),
            ("damped_least_squares" | "dls", Some(text)) => {
                let lambda = text.parse::<f64>().map_err(|e| format!("invalid damping '{}': {}", text, e))?;
                if !valid_damping(lambda) {
                    return Err(format!("damping must be positive, got {}", lambda));
                }
                Ok(InversionStrategy::DampedLeastSquares { lambda })
            }
            _ => Err(format!("unknown inversion strategy '{}'", s)),
        }
    }
}
