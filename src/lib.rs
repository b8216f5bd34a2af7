//! Rust implementation of forward and inverse kinematics for serial manipulators described
//! with Denavit-Hartenberg parameters.
//!
//! The chain is a list of N + 1 links: link 0 is the fixed transform from the world (or an
//! optional base pose) to the first joint, links 1..=N belong to the revolute joints. From
//! joint angles the forward kinematics computes the world pose of every link and the 6xN
//! geometric Jacobian of the end effector. Inverse kinematics builds on the Jacobian in two
//! forms: an iterative solver for a single, possibly distant, target pose, and a single step
//! velocity solver for small per tick motions such as teleoperation.
//!
//! # Features
//!
//! - Works with any number of revolute joints; joint limits are respected by clamping.
//! - Four Jacobian inversion strategies: transpose, damped least squares, pseudo-inverse
//!   and direct (Gauss-Jordan) inverse. Own strategies plug in through
//!   [`inversion::JacobianInverter`].
//! - The iterative solver stops as soon as position and rotation tolerances are met and
//!   otherwise returns its best estimate within a fixed iteration budget, so it fits into
//!   a real time control tick.
//! - The velocity solver supports re-anchoring to the current end effector pose when
//!   switching controllers, avoiding jumps.
//! - Chains can be built in code, taken from presets (planar arm, UR5, PUMA 560) or read
//!   from YAML files.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use nalgebra::Vector3;
//! use rs_dh_kinematics::iterative::{IterativeSolver, SolverConfig};
//! use rs_dh_kinematics::kinematic_traits::{IkTarget, PoseSolver};
//! use rs_dh_kinematics::parameters::dh_kinematics::Parameters;
//!
//! let chain = Arc::new(Parameters::planar_two_link());
//! let mut solver = IterativeSolver::new(chain, SolverConfig::default());
//! let target = IkTarget::Position(Vector3::new(1.0, 1.0, 0.0));
//! let solution = solver.solve_target(&[0.0, 0.5], &target).expect("damped solve");
//! if solution.converged {
//!     println!("Joints: {:?}", solution.joints);
//! }
//! ```

pub mod parameters;
pub mod parameters_robots;

#[cfg(feature = "allow_filesystem")]
pub mod parameters_from_file;

pub mod parameter_error;
pub mod kinematics_error;

pub mod utils;
pub mod kinematic_traits;

pub mod matrix;
pub mod inversion;

pub mod forward;
pub mod iterative;
pub mod velocity;
