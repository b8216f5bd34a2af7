use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Parser, Subcommand};
use nalgebra::{UnitQuaternion, Vector3};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rs_dh_kinematics::forward::ForwardKinematics;
use rs_dh_kinematics::inversion::InversionStrategy;
use rs_dh_kinematics::iterative::{IterativeSolver, SolverConfig};
use rs_dh_kinematics::kinematic_traits::{IkTarget, PoseSolver};
use rs_dh_kinematics::parameters::dh_kinematics::Parameters;
use rs_dh_kinematics::utils::{as_radians, dump_joints, dump_pose};
use rs_dh_kinematics::velocity::VelocitySolver;

/// Forward and inverse kinematics of a DH chain from the command line.
#[derive(Parser, Debug)]
#[command(name = "rs-dh-kinematics", version, about)]
struct Cli {
    /// YAML file with the chain (and optionally the `solver` section).
    #[arg(long, conflicts_with = "preset")]
    chain: Option<PathBuf>,

    /// Built-in chain: planar_two_link, ur5 or puma560. Default is ur5.
    #[arg(long)]
    preset: Option<String>,

    /// Joint values and orientations are given in degrees.
    #[arg(long, global = true)]
    degrees: bool,

    /// -v info, -vv debug, -vvv trace. RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the poses of all links for the given joints.
    Fk {
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        joints: Vec<f64>,
    },
    /// Solve for joints reaching the position (and orientation, if given), starting
    /// from the given joints.
    Ik {
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        joints: Vec<f64>,
        /// x,y,z in meters.
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        position: Vec<f64>,
        /// roll,pitch,yaw. Without it only the position is solved for.
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        orientation: Option<Vec<f64>>,
        /// Overrides the strategy of the solver configuration (e.g. dls:0.05).
        #[arg(long)]
        strategy: Option<InversionStrategy>,
    },
    /// Single velocity step moving the end effector by x,y,z meters.
    Step {
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        joints: Vec<f64>,
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        delta: Vec<f64>,
    },
    /// Print the 6xN Jacobian for the given joints.
    Jacobian {
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        joints: Vec<f64>,
    },
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rs_dh_kinematics={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_chain(cli: &Cli) -> Result<(Parameters, SolverConfig)> {
    if let Some(path) = &cli.chain {
        let parameters = Parameters::from_yaml_file(path)
            .with_context(|| format!("Failed to read chain from {}", path.display()))?;
        let config = SolverConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to read solver section from {}", path.display()))?;
        info!(path = %path.display(), dof = parameters.dof(), "chain loaded");
        return Ok((parameters, config));
    }
    let name = cli.preset.as_deref().unwrap_or("ur5");
    let parameters = Parameters::preset(name).ok_or_else(|| anyhow!("Unknown preset '{}'", name))?;
    Ok((parameters, SolverConfig::default()))
}

fn vector3(values: &[f64], what: &str) -> Result<Vector3<f64>> {
    match values {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => bail!("{} needs 3 values, got {}", what, values.len()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (parameters, mut config) = load_chain(&cli)?;
    let parameters = Arc::new(parameters);
    let angles = |values: &[f64]| if cli.degrees { as_radians(values) } else { values.to_vec() };
    let checked = |values: &[f64]| -> Result<Vec<f64>> {
        if values.len() != parameters.dof() {
            bail!("The chain has {} joints, {} values given", parameters.dof(), values.len());
        }
        Ok(angles(values))
    };

    match &cli.command {
        Command::Fk { joints } => {
            let mut fk = ForwardKinematics::new(Arc::clone(&parameters));
            fk.solve(&checked(joints)?);
            for (link, pose) in fk.link_poses().iter().enumerate() {
                print!("link {}: ", link);
                dump_pose(pose);
            }
        }
        Command::Ik { joints, position, orientation, strategy } => {
            if let Some(strategy) = strategy {
                config.strategy = *strategy;
            }
            let position = vector3(position, "--position")?;
            let target = match orientation {
                Some(rpy) => {
                    let rpy = vector3(&angles(rpy), "--orientation")?;
                    IkTarget::new(position, UnitQuaternion::from_euler_angles(rpy.x, rpy.y, rpy.z))
                }
                None => IkTarget::Position(position),
            };
            let mut solver = IterativeSolver::new(Arc::clone(&parameters), config);
            let solution = solver.solve_target(&checked(joints)?, &target)
                .context("Jacobian inversion failed")?;
            println!("converged: {} after {} iterations (position error {:.6}, rotation error {:.6})",
                     solution.converged, solution.iterations, solution.position_error, solution.rotation_error);
            dump_joints(&solution.joints);
        }
        Command::Step { joints, delta } => {
            let delta = vector3(delta, "--delta")?;
            let mut solver = VelocitySolver::new(Arc::clone(&parameters), config.strategy);
            let joints = solver.solve_velocity(&checked(joints)?, &delta, &UnitQuaternion::identity())
                .context("Jacobian inversion failed")?;
            dump_joints(&joints);
        }
        Command::Jacobian { joints } => {
            let mut fk = ForwardKinematics::new(Arc::clone(&parameters));
            fk.solve(&checked(joints)?);
            println!("{}", fk.jacobian());
        }
    }
    Ok(())
}
