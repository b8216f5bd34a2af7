//! Iterative Jacobian inverse kinematics for a single, possibly distant, target pose.
//!
//! Each iteration runs forward kinematics on the current estimate, measures the pose error,
//! maps it through the inverted Jacobian and corrects the estimate. The correction is scaled
//! by a factor decaying linearly over the iteration budget, so early iterations take large
//! steps and later ones settle without oscillating. The budget is also the real time bound
//! of one solve.

use std::sync::Arc;

use nalgebra::{DVector, UnitQuaternion, Vector3};
use tracing::{debug, trace};

use crate::forward::ForwardKinematics;
use crate::inversion::{InversionStrategy, JacobianInverter};
use crate::kinematic_traits::{IkSolution, IkTarget, Pose, PoseSolver};
use crate::kinematics_error::KinematicsError;
use crate::parameters::dh_kinematics::Parameters;
use crate::utils::axis_angle;

/// Configuration of the pose solver. Tolerances are part of the deployment of a chain and
/// should be documented with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Iteration budget (E).
    pub max_iterations: usize,
    /// Position tolerance, meters.
    pub position_tolerance: f64,
    /// Rotation tolerance, radians.
    pub rotation_tolerance: f64,
    /// Scale of the first correction step, decays linearly to zero over the budget.
    pub damping_base: f64,
    /// Jacobian inversion used by [`IterativeSolver::new`].
    pub strategy: InversionStrategy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_iterations: 30,
            position_tolerance: 1e-3,
            rotation_tolerance: 0.02,
            damping_base: 0.5,
            strategy: InversionStrategy::default(),
        }
    }
}

/// Step scale of iteration `iteration` out of `budget`: `(1 - iteration / budget) * base`.
/// Never increases with the iteration number.
pub fn damping_factor(iteration: usize, budget: usize, base: f64) -> f64 {
    if budget == 0 {
        return 0.0;
    }
    (1.0 - iteration as f64 / budget as f64) * base
}

/// Difference between the current end effector pose and the target, as "current - target".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseError {
    pub position: Vector3<f64>,
    /// Scaled axis of `current * target^-1`, `None` for position only targets.
    pub rotation: Option<Vector3<f64>>,
    /// Rotation angle wrapped into (-PI, PI], zero for position only targets.
    pub angle: f64,
}

impl PoseError {
    pub fn measure(current: &Pose, target: &IkTarget) -> Self {
        let position = current.translation.vector - target.position();
        match target.orientation() {
            Some(orientation) => {
                let (scaled, angle) = rotation_error(&current.rotation, &orientation);
                PoseError { position, rotation: Some(scaled), angle }
            }
            None => PoseError { position, rotation: None, angle: 0.0 },
        }
    }

    /// Number of Jacobian rows this error constrains (6, or 3 for position only).
    pub fn rows(&self) -> usize {
        if self.rotation.is_some() { 6 } else { 3 }
    }

    /// Error vector multiplied by `factor`, ready to go through the inverted Jacobian.
    pub fn scaled(&self, factor: f64) -> DVector<f64> {
        let mut v = DVector::zeros(self.rows());
        v.fixed_rows_mut::<3>(0).copy_from(&(self.position * factor));
        if let Some(rotation) = &self.rotation {
            v.fixed_rows_mut::<3>(3).copy_from(&(rotation * factor));
        }
        v
    }

    pub fn within(&self, position_tolerance: f64, rotation_tolerance: f64) -> bool {
        self.position.norm() < position_tolerance && self.angle.abs() < rotation_tolerance
    }
}

/// Scaled axis and wrapped angle of `current * target^-1`.
fn rotation_error(current: &UnitQuaternion<f64>, target: &UnitQuaternion<f64>) -> (Vector3<f64>, f64) {
    axis_angle(&(current * target.inverse()))
}

/// Iterative pose solver. Owns its forward kinematics instance, so a solver must only be
/// driven from one place at a time; clone it for independent concurrent use.
#[derive(Debug, Clone)]
pub struct IterativeSolver<I: JacobianInverter = InversionStrategy> {
    fk: ForwardKinematics,
    config: SolverConfig,
    inverter: I,
}

impl IterativeSolver<InversionStrategy> {
    /// Creates the solver, inverting Jacobians with `config.strategy`.
    pub fn new(parameters: Arc<Parameters>, config: SolverConfig) -> Self {
        let strategy = config.strategy;
        Self::with_inverter(parameters, config, strategy)
    }
}

impl<I: JacobianInverter> IterativeSolver<I> {
    /// Creates the solver with a custom inverter; `config.strategy` is ignored.
    pub fn with_inverter(parameters: Arc<Parameters>, config: SolverConfig, inverter: I) -> Self {
        IterativeSolver { fk: ForwardKinematics::new(parameters), config, inverter }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Forward kinematics state left by the last solve or check.
    pub fn forward_kinematics(&self) -> &ForwardKinematics {
        &self.fk
    }

    /// Solves for joints placing the end effector at the target position and orientation.
    ///
    /// # Panics
    ///
    /// Panics if `joints.len()` differs from the number of joints of the chain.
    pub fn solve(&mut self, joints: &[f64], target_position: &Vector3<f64>,
                 target_orientation: &UnitQuaternion<f64>) -> Result<IkSolution, KinematicsError> {
        self.solve_target(joints, &IkTarget::new(*target_position, *target_orientation))
    }

    fn iterate(&mut self, joints: &[f64], target: &IkTarget) -> Result<IkSolution, KinematicsError> {
        let budget = self.config.max_iterations;
        let mut estimate = joints.to_vec();

        for iteration in 0..budget {
            let error = self.evaluate(&mut estimate, target);
            trace!(iteration, position_error = error.position.norm(), angle = error.angle, "ik iteration");

            if error.within(self.config.position_tolerance, self.config.rotation_tolerance) {
                debug!(iterations = iteration, "ik converged");
                return Ok(solution(estimate, true, iteration, &error));
            }

            let factor = damping_factor(iteration, budget, self.config.damping_base);
            let jacobian = match error.rows() {
                6 => self.fk.jacobian().clone(),
                rows => self.fk.jacobian().top_rows(rows),
            };
            let delta = self.inverter.invert(&jacobian)?.multiply_vector(&error.scaled(factor));

            // The error is "current - target", so the correction is subtracted.
            for (q, d) in estimate.iter_mut().zip(delta.iter()) {
                *q -= d;
            }
        }

        // The last correction (or, with a zero budget, the seed itself) may already be good
        let error = self.evaluate(&mut estimate, target);
        let converged = error.within(self.config.position_tolerance, self.config.rotation_tolerance);
        debug!(iterations = budget, converged, position_error = error.position.norm(), angle = error.angle,
            "ik iteration budget exhausted");
        Ok(solution(estimate, converged, budget, &error))
    }

    /// Runs forward kinematics on the estimate, replacing it with its clamped version.
    fn evaluate(&mut self, estimate: &mut [f64], target: &IkTarget) -> PoseError {
        self.fk.solve(estimate);
        estimate.copy_from_slice(self.fk.joints());
        PoseError::measure(&self.fk.end_effector(), target)
    }
}

fn solution(joints: Vec<f64>, converged: bool, iterations: usize, error: &PoseError) -> IkSolution {
    IkSolution {
        joints,
        converged,
        iterations,
        position_error: error.position.norm(),
        rotation_error: error.angle.abs(),
    }
}

impl<I: JacobianInverter> PoseSolver for IterativeSolver<I> {
    fn solve_target(&mut self, joints: &[f64], target: &IkTarget) -> Result<IkSolution, KinematicsError> {
        assert_eq!(joints.len(), self.fk.dof(), "joint vector length must equal chain DOF");
        self.iterate(joints, target)
    }

    /// Runs forward kinematics once on the joints and applies the convergence test.
    fn check_goal_reached(&mut self, joints: &[f64], target: &IkTarget) -> bool {
        self.fk.solve(joints);
        PoseError::measure(&self.fk.end_effector(), target)
            .within(self.config.position_tolerance, self.config.rotation_tolerance)
    }
}
