//! Forward kinematics of a Denavit-Hartenberg chain: the world pose of every link and the
//! geometric Jacobian of the end effector.

use std::sync::Arc;

use nalgebra::{Matrix4, Rotation3, Translation3, UnitQuaternion, Vector3};

use crate::kinematic_traits::Pose;
use crate::matrix::Matrix;
use crate::parameters::dh_kinematics::{DhLink, Parameters};

/// Everything derived from one joint vector. Holds N + 1 entries per array, index 0 being
/// the fixed link 0 and index N the end effector.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicState {
    /// World homogeneous transform of each link frame.
    pub transforms: Vec<Matrix4<f64>>,
    /// World position of each link frame origin.
    pub positions: Vec<Vector3<f64>>,
    /// World orientation of each link frame.
    pub orientations: Vec<UnitQuaternion<f64>>,
    /// World z axis of each link frame. Joint i rotates about the axis of frame i - 1.
    pub axes: Vec<Vector3<f64>>,
}

impl KinematicState {
    fn with_links(count: usize) -> Self {
        KinematicState {
            transforms: vec![Matrix4::identity(); count],
            positions: vec![Vector3::zeros(); count],
            orientations: vec![UnitQuaternion::identity(); count],
            axes: vec![Vector3::z(); count],
        }
    }
}

/// Forward kinematics solver. Owns its kinematic state and Jacobian, which are overwritten
/// on every [`ForwardKinematics::solve`]; the chain parameters are shared read only.
/// Clone the solver to get an independent instance for the same chain.
#[derive(Debug, Clone)]
pub struct ForwardKinematics {
    parameters: Arc<Parameters>,
    state: KinematicState,
    jacobian: Matrix,
    /// Joint angles of the last solve, after clamping.
    joints: Vec<f64>,
}

impl ForwardKinematics {
    /// Creates the solver and evaluates it at all joints zero.
    pub fn new(parameters: Arc<Parameters>) -> Self {
        let n = parameters.dof();
        let mut fk = ForwardKinematics {
            state: KinematicState::with_links(n + 1),
            jacobian: Matrix::zeros(6, n),
            joints: vec![0.0; n],
            parameters,
        };
        fk.solve(&vec![0.0; n]);
        fk
    }

    pub fn parameters(&self) -> &Arc<Parameters> {
        &self.parameters
    }

    /// Number of revolute joints (N).
    pub fn dof(&self) -> usize {
        self.parameters.dof()
    }

    /// Recomputes the kinematic state and the Jacobian for the given joint angles.
    /// Angles are clamped into the joint limits first (unbounded joints pass through).
    ///
    /// # Panics
    ///
    /// Panics if `joints.len()` differs from the number of joints of the chain.
    pub fn solve(&mut self, joints: &[f64]) {
        assert_eq!(joints.len(), self.dof(), "joint vector length must equal chain DOF");
        let parameters = Arc::clone(&self.parameters);
        let links = &parameters.links;

        for (angle, (target, link)) in joints.iter().zip(self.joints.iter_mut().zip(&links[1..])) {
            *target = link.clamp(*angle);
        }

        let mut world = match &parameters.base {
            Some(base) => base.to_homogeneous(),
            None => Matrix4::identity(),
        };
        for (i, link) in links.iter().enumerate() {
            let theta = if i == 0 { 0.0 } else { self.joints[i - 1] };
            world *= link_transform(link, theta);
            self.store_link(i, &world);
        }
        self.update_jacobian();
    }

    fn store_link(&mut self, i: usize, world: &Matrix4<f64>) {
        let rotation = Rotation3::from_matrix_unchecked(world.fixed_view::<3, 3>(0, 0).into_owned());
        self.state.transforms[i] = *world;
        self.state.positions[i] = world.fixed_view::<3, 1>(0, 3).into_owned();
        self.state.axes[i] = world.fixed_view::<3, 1>(0, 2).into_owned();
        self.state.orientations[i] = UnitQuaternion::from_rotation_matrix(&rotation);
    }

    /// Column j: linear = axis x (end effector - joint origin), angular = axis, both taken
    /// from frame j, the frame joint j + 1 rotates in.
    fn update_jacobian(&mut self) {
        let n = self.dof();
        let end_effector = self.state.positions[n];
        let jacobian = self.jacobian.as_dmatrix_mut();
        for j in 0..n {
            let axis = &self.state.axes[j];
            let linear = axis.cross(&(end_effector - self.state.positions[j]));
            jacobian.fixed_view_mut::<3, 1>(0, j).copy_from(&linear);
            jacobian.fixed_view_mut::<3, 1>(3, j).copy_from(axis);
        }
    }

    /// Runs [`ForwardKinematics::solve`] and returns the end effector pose.
    pub fn forward(&mut self, joints: &[f64]) -> Pose {
        self.solve(joints);
        self.end_effector()
    }

    /// World pose of the given link (0..=N) from the last solve.
    pub fn pose(&self, link: usize) -> Pose {
        Pose::from_parts(
            Translation3::from(self.state.positions[link]),
            self.state.orientations[link],
        )
    }

    /// World poses of all links from the last solve.
    pub fn link_poses(&self) -> Vec<Pose> {
        (0..=self.dof()).map(|i| self.pose(i)).collect()
    }

    pub fn end_effector(&self) -> Pose {
        self.pose(self.dof())
    }

    /// The 6xN geometric Jacobian of the last solve, rows [vx, vy, vz, wx, wy, wz].
    pub fn jacobian(&self) -> &Matrix {
        &self.jacobian
    }

    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    /// Joint angles of the last solve, as clamped into the limits.
    pub fn joints(&self) -> &[f64] {
        &self.joints
    }
}

/// Standard DH transform `Rz(theta + angle_offset) * Tz(offset) * Tx(length) * Rx(twist)`.
pub fn link_transform(link: &DhLink, theta: f64) -> Matrix4<f64> {
    let (st, ct) = (theta + link.angle_offset).sin_cos();
    let (sa, ca) = link.twist.sin_cos();
    Matrix4::new(
        ct, -st * ca, st * sa, link.length * ct,
        st, ct * ca, -ct * sa, link.length * st,
        0.0, sa, ca, link.offset,
        0.0, 0.0, 0.0, 1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Isometry3;
    use std::f64::consts::FRAC_PI_2;

    const SMALL: f64 = 1e-9;

    fn planar() -> ForwardKinematics {
        ForwardKinematics::new(Arc::new(Parameters::planar_two_link()))
    }

    #[test]
    fn test_straight_arm() {
        let mut fk = planar();
        fk.solve(&[0.0, 0.0]);
        let expected = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)];
        for (i, (x, y)) in expected.iter().enumerate() {
            assert_abs_diff_eq!(fk.state().positions[i].x, *x, epsilon = SMALL);
            assert_abs_diff_eq!(fk.state().positions[i].y, *y, epsilon = SMALL);
        }
        assert!(fk.end_effector().rotation.angle() < SMALL);
    }

    #[test]
    fn test_elbow_bent() {
        let mut fk = planar();
        let pose = fk.forward(&[FRAC_PI_2, -FRAC_PI_2]);
        assert_abs_diff_eq!(pose.translation.vector.x, 1.0, epsilon = SMALL);
        assert_abs_diff_eq!(pose.translation.vector.y, 1.0, epsilon = SMALL);
        assert!(pose.rotation.angle() < SMALL);
    }

    #[test]
    fn test_jacobian_straight_arm() {
        let mut fk = planar();
        fk.solve(&[0.0, 0.0]);
        let j = fk.jacobian();
        assert_eq!((j.rows(), j.cols()), (6, 2));
        // Joint 1 is 2 m from the tip, joint 2 is 1 m from it
        assert_abs_diff_eq!(j[(1, 0)], 2.0, epsilon = SMALL);
        assert_abs_diff_eq!(j[(1, 1)], 1.0, epsilon = SMALL);
        assert_abs_diff_eq!(j[(0, 0)], 0.0, epsilon = SMALL);
        assert_eq!(j[(5, 0)], 1.0);
        assert_eq!(j[(5, 1)], 1.0);
    }

    #[test]
    fn test_clamps_to_limits() {
        let parameters = Parameters::from_table(
            &[[0.0; 4], [0.0, 1.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]],
            &[(0.0, 0.0), (-0.5, 0.5), (0.0, 0.0)],
            None,
        ).unwrap();
        let mut fk = ForwardKinematics::new(Arc::new(parameters));
        fk.solve(&[2.0, 3.0]);
        assert_eq!(fk.joints(), &[0.5, 3.0]);
        let expected_tip_angle = 3.5;
        let (scaled, _) = crate::utils::axis_angle(&fk.end_effector().rotation);
        assert_abs_diff_eq!(scaled.z, crate::utils::wrap_angle(expected_tip_angle), epsilon = SMALL);
    }

    #[test]
    fn test_base_is_applied_first() {
        let base = Isometry3::new(Vector3::new(0.0, 0.0, 0.5), Vector3::new(0.0, 0.0, FRAC_PI_2));
        let parameters = Parameters { base: Some(base), ..Parameters::planar_two_link() };
        let mut fk = ForwardKinematics::new(Arc::new(parameters));
        let pose = fk.forward(&[0.0, 0.0]);
        assert_abs_diff_eq!(pose.translation.vector.x, 0.0, epsilon = SMALL);
        assert_abs_diff_eq!(pose.translation.vector.y, 2.0, epsilon = SMALL);
        assert_abs_diff_eq!(pose.translation.vector.z, 0.5, epsilon = SMALL);
        assert_abs_diff_eq!(fk.state().positions[0].z, 0.5, epsilon = SMALL);
    }

    #[test]
    fn test_solve_is_idempotent() {
        let mut fk = ForwardKinematics::new(Arc::new(Parameters::ur5()));
        let joints = [0.3, -1.2, 0.8, 0.1, 1.4, -0.6];
        fk.solve(&joints);
        let (state, jacobian) = (fk.state().clone(), fk.jacobian().clone());
        fk.solve(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        fk.solve(&joints);
        assert_eq!(fk.state(), &state);
        assert_eq!(fk.jacobian(), &jacobian);
    }

    #[test]
    #[should_panic]
    fn test_wrong_length_is_precondition_violation() {
        planar().solve(&[0.0, 0.0, 0.0]);
    }
}
