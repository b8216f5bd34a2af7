//! Single step inverse kinematics for small per tick motions (teleoperation).
//!
//! One forward kinematics pass linearizes the chain at the current joints, and the
//! requested Cartesian delta goes through the inverted Jacobian once. The caller keeps the
//! deltas small enough for the linearization to hold; there is no iteration and no
//! convergence test.

use std::sync::Arc;

use nalgebra::{DVector, UnitQuaternion, Vector3};
use tracing::debug;

use crate::forward::ForwardKinematics;
use crate::inversion::{InversionStrategy, JacobianInverter};
use crate::kinematic_traits::{Joints, Pose};
use crate::kinematics_error::KinematicsError;
use crate::parameters::dh_kinematics::Parameters;
use crate::utils::axis_angle;

#[derive(Debug, Clone)]
pub struct VelocitySolver<I: JacobianInverter = InversionStrategy> {
    fk: ForwardKinematics,
    inverter: I,
    /// End effector pose local deltas are expressed in, see [`VelocitySolver::reanchor`].
    anchor: Pose,
}

impl<I: JacobianInverter> VelocitySolver<I> {
    pub fn new(parameters: Arc<Parameters>, inverter: I) -> Self {
        let fk = ForwardKinematics::new(parameters);
        let anchor = fk.end_effector();
        VelocitySolver { fk, inverter, anchor }
    }

    /// Moves the end effector by `position_delta` (world frame) and rotates it by
    /// `orientation_delta` (world frame), returning the new joint angles.
    ///
    /// # Panics
    ///
    /// Panics if `joints.len()` differs from the number of joints of the chain.
    pub fn solve_velocity(&mut self, joints: &[f64], position_delta: &Vector3<f64>,
                          orientation_delta: &UnitQuaternion<f64>) -> Result<Joints, KinematicsError> {
        self.fk.solve(joints);
        let (rotation, _) = axis_angle(orientation_delta);
        let twist = DVector::from_iterator(6, position_delta.iter().chain(rotation.iter()).copied());
        let delta = self.inverter.invert(self.fk.jacobian())?.multiply_vector(&twist);
        Ok(joints.iter().zip(delta.iter()).map(|(q, d)| q + d).collect())
    }

    /// Takes the current end effector pose as the new local frame origin. Must be called
    /// when switching from another controller to velocity control, otherwise local deltas
    /// refer to a stale frame and the arm jumps.
    pub fn reanchor(&mut self, joints: &[f64]) -> Pose {
        self.anchor = self.fk.forward(joints);
        debug!(anchor = ?self.anchor.translation.vector, "velocity control re-anchored");
        self.anchor
    }

    pub fn anchor(&self) -> &Pose {
        &self.anchor
    }

    /// Same as [`VelocitySolver::solve_velocity`] with both deltas expressed in the anchor
    /// frame (e.g. "forward" of the operator is the anchor x axis).
    pub fn solve_local(&mut self, joints: &[f64], local_position_delta: &Vector3<f64>,
                       local_orientation_delta: &UnitQuaternion<f64>) -> Result<Joints, KinematicsError> {
        let frame = self.anchor.rotation;
        let position_delta = frame * local_position_delta;
        let orientation_delta = frame * local_orientation_delta * frame.inverse();
        self.solve_velocity(joints, &position_delta, &orientation_delta)
    }

    pub fn forward_kinematics(&self) -> &ForwardKinematics {
        &self.fk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Isometry3;

    fn planar(strategy: InversionStrategy) -> VelocitySolver {
        VelocitySolver::new(Arc::new(Parameters::planar_two_link()), strategy)
    }

    #[test]
    fn test_sideways_step_of_straight_arm() {
        let mut solver = planar(InversionStrategy::DampedLeastSquares { lambda: 0.01 });
        let joints = solver
            .solve_velocity(&[0.0, 0.0], &Vector3::new(0.0, 0.01, 0.0), &UnitQuaternion::identity())
            .unwrap();
        // Shoulder swings the 2 m arm, elbow undoes the swing of the tip orientation
        assert_abs_diff_eq!(joints[0], 0.01, epsilon = 1e-4);
        assert_abs_diff_eq!(joints[1], -0.01, epsilon = 1e-4);
    }

    #[test]
    fn test_step_follows_delta() {
        let mut solver = planar(InversionStrategy::PseudoInverse);
        let start = [0.4, 0.9];
        let mut fk = ForwardKinematics::new(Arc::new(Parameters::planar_two_link()));
        let before = fk.forward(&start);

        let delta = Vector3::new(-0.002, 0.003, 0.0);
        let joints = solver.solve_velocity(&start, &delta, &UnitQuaternion::identity()).unwrap();
        let after = fk.forward(&joints);

        let moved = after.translation.vector - before.translation.vector;
        // The planar arm cannot keep the tip orientation and move freely at once, the least
        // squares step trades both; the motion still goes along the request.
        assert!(moved.dot(&delta) > 0.0);
    }

    #[test]
    fn test_rotation_only_about_base_axis() {
        let mut solver = planar(InversionStrategy::PseudoInverse);
        let start = [0.0, 0.0];
        let turn = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.01);
        let tip_motion = Vector3::new(0.0, 0.02, 0.0); // 2 m arm turning by 0.01 rad
        let joints = solver.solve_velocity(&start, &tip_motion, &turn).unwrap();
        assert_abs_diff_eq!(joints[0], 0.01, epsilon = 1e-9);
        assert_abs_diff_eq!(joints[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reanchor_and_local_deltas() {
        let mut solver = planar(InversionStrategy::DampedLeastSquares { lambda: 0.01 });
        // Arm pointing along +y, so local x (tip forward) is world +y
        let joints = [std::f64::consts::FRAC_PI_2, 0.0];
        let anchor = solver.reanchor(&joints);
        assert_abs_diff_eq!(anchor.translation.vector.y, 2.0, epsilon = 1e-12);
        assert_eq!(solver.anchor(), &anchor);

        // Local sideways step (local y) is world -x
        let local = solver
            .solve_local(&joints, &Vector3::new(0.0, 0.01, 0.0), &UnitQuaternion::identity())
            .unwrap();
        let world = solver
            .solve_velocity(&joints, &Vector3::new(-0.01, 0.0, 0.0), &UnitQuaternion::identity())
            .unwrap();
        assert_abs_diff_eq!(local[0], world[0], epsilon = 1e-9);
        assert_abs_diff_eq!(local[1], world[1], epsilon = 1e-9);
        assert!(local[0] > 0.0);
    }

    #[test]
    fn test_anchor_defaults_to_zero_joints() {
        let solver = planar(InversionStrategy::Transpose);
        let expected = Isometry3::translation(2.0, 0.0, 0.0);
        assert_abs_diff_eq!(solver.anchor().translation.vector.x, expected.translation.vector.x);
    }
}
