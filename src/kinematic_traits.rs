extern crate nalgebra as na;

use na::{Isometry3, UnitQuaternion, Vector3};
use crate::kinematics_error::KinematicsError;

/// Pose is used for the pose of any link and for the targets. It contains both Cartesian
/// position and rotation quaternion
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion, Vector3};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(1.0, 0.0, 0.0);
/// // The quaternion should be normalized to represent a valid rotation.
/// let rotation = UnitQuaternion::from_quaternion(na::Quaternion::new(1.0, 0.0, 0.0, 1.0).normalize());
/// let transform = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// Joint angles in radians, one per revolute joint of the chain.
pub type Joints = Vec<f64>;

/// What the pose solver should reach.
#[derive(Debug, Clone, PartialEq)]
pub enum IkTarget {
    /// Full pose: position and orientation (uses all 6 rows of the Jacobian).
    Pose(Pose),
    /// Position only (uses the 3 linear rows of the Jacobian, orientation is free).
    Position(Vector3<f64>),
}

impl IkTarget {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        IkTarget::Pose(Pose::from_parts(position.into(), orientation))
    }

    pub fn position(&self) -> Vector3<f64> {
        match self {
            IkTarget::Pose(pose) => pose.translation.vector,
            IkTarget::Position(position) => *position,
        }
    }

    pub fn orientation(&self) -> Option<UnitQuaternion<f64>> {
        match self {
            IkTarget::Pose(pose) => Some(pose.rotation),
            IkTarget::Position(_) => None,
        }
    }
}

/// Result of a pose solve. Not converging is not an error: the last estimate is
/// always returned and `converged` tells if it is within the tolerances.
#[derive(Debug, Clone, PartialEq)]
pub struct IkSolution {
    pub joints: Joints,
    pub converged: bool,
    /// Iterations spent before converging, or the full budget if exhausted.
    pub iterations: usize,
    /// Position error of the returned joints (meters).
    pub position_error: f64,
    /// Rotation error of the returned joints (radians), zero for position-only targets.
    pub rotation_error: f64,
}

/// Contract of a pose (position target) inverse kinematics solver. The Jacobian based
/// [`crate::iterative::IterativeSolver`] implements it; other solvers (for instance backed
/// by an external optimization library) can be used through the same contract.
pub trait PoseSolver {
    /// Solves for joints reaching the target, starting from the given joints.
    fn solve_target(&mut self, joints: &[f64], target: &IkTarget) -> Result<IkSolution, KinematicsError>;

    /// Checks if the given joints reach the target within the solver tolerances.
    fn check_goal_reached(&mut self, joints: &[f64], target: &IkTarget) -> bool;
}
