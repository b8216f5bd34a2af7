//! Supports extracting the DH chain and solver settings from YAML file (optional)

use std::path::Path;

use nalgebra::{Translation3, UnitQuaternion};
use yaml_rust2::{Yaml, YamlLoader};

use crate::inversion::{InversionStrategy, valid_damping};
use crate::iterative::SolverConfig;
use crate::kinematic_traits::Pose;
use crate::parameter_error::ParameterError;
use crate::parameters::dh_kinematics::{DhLink, Parameters};

const LINKS: &str = "dh_kinematics_links";
const LIMITS: &str = "dh_kinematics_limits";
const BASE: &str = "dh_kinematics_base";
const SOLVER: &str = "solver";

impl Parameters {
    /// Read the chain from YAML file. YAML file like this is supported:
    /// ```yaml
    /// # Planar arm with two 1 m links
    /// dh_kinematics_links:        # twist, length, offset, angle offset
    ///   - [0, 0, 0, 0]            # link 0, fixed
    ///   - [0, 1.0, 0, 0]
    ///   - [0, 1.0, 0, 0]
    /// dh_kinematics_limits:       # lower, upper; [0, 0] is unbounded
    ///   - [0, 0]
    ///   - [deg(-170), deg(170)]
    ///   - [0, 0]
    /// dh_kinematics_base:
    ///   translation: [0, 0, 0.5]
    ///   rotation: [0, 0, deg(90)] # roll, pitch, yaw
    /// ```
    /// Limits and base are optional. Angles (twist, angle offset, limits, base rotation) are
    /// radians unless written as `deg(angle)`.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let doc = first_document(contents)?;

        let links = sequence(&doc[LINKS], LINKS)?
            .iter()
            .enumerate()
            .map(|(i, row)| -> Result<DhLink, ParameterError> {
                let label = format!("{}[{}]", LINKS, i);
                let values = fixed_row::<4>(row, &label)?;
                Ok(DhLink::new(
                    angle(&values[0], &label)?,
                    number(&values[1], &label)?,
                    number(&values[2], &label)?,
                    angle(&values[3], &label)?,
                ))
            })
            .collect::<Result<Vec<_>, ParameterError>>()?;

        let links = match &doc[LIMITS] {
            Yaml::BadValue | Yaml::Null => links,
            limits => {
                let rows = sequence(limits, LIMITS)?;
                if rows.len() != links.len() {
                    return Err(ParameterError::InvalidLength { expected: links.len(), found: rows.len() });
                }
                links.into_iter().zip(rows).enumerate()
                    .map(|(i, (link, row))| -> Result<DhLink, ParameterError> {
                        let label = format!("{}[{}]", LIMITS, i);
                        let [lower, upper] = fixed_row::<2>(row, &label)?;
                        Ok(link.with_limits(angle(&lower, &label)?, angle(&upper, &label)?))
                    })
                    .collect::<Result<Vec<_>, ParameterError>>()?
            }
        };

        let base = match &doc[BASE] {
            Yaml::BadValue | Yaml::Null => None,
            base => Some(read_base(base)?),
        };

        Parameters::new(links, base)
    }
}

impl SolverConfig {
    /// Reads the optional `solver` section; anything not given keeps its default.
    /// ```yaml
    /// solver:
    ///   max_iterations: 30
    ///   position_tolerance: 0.001
    ///   rotation_tolerance: deg(1.0)
    ///   damping_base: 0.5
    ///   strategy: damped_least_squares  # transpose, pseudo_inverse, unstable_inverse
    ///   lambda: 0.01
    /// ```
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let doc = first_document(contents)?;
        let section = &doc[SOLVER];
        let mut config = SolverConfig::default();
        if matches!(section, Yaml::BadValue | Yaml::Null) {
            return Ok(config);
        }

        if let Some(value) = present(&section["max_iterations"]) {
            config.max_iterations = value.as_i64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| ParameterError::ParseError(format!(
                    "max_iterations must be a non-negative integer, got {:?}", value)))?;
        }
        if let Some(value) = present(&section["position_tolerance"]) {
            config.position_tolerance = number(value, "position_tolerance")?;
        }
        if let Some(value) = present(&section["rotation_tolerance"]) {
            config.rotation_tolerance = angle(value, "rotation_tolerance")?;
        }
        if let Some(value) = present(&section["damping_base"]) {
            config.damping_base = number(value, "damping_base")?;
        }
        if let Some(value) = present(&section["strategy"]) {
            let name = value.as_str().ok_or_else(|| ParameterError::ParseError(
                format!("strategy must be a string, got {:?}", value)))?;
            config.strategy = name.parse().map_err(ParameterError::ParseError)?;
        }
        if let Some(value) = present(&section["lambda"]) {
            let lambda = number(value, "lambda")?;
            if !valid_damping(lambda) {
                return Err(ParameterError::KinematicsConfigurationError(format!(
                    "lambda must be positive, got {}", lambda)));
            }
            match config.strategy {
                InversionStrategy::DampedLeastSquares { .. } => {
                    config.strategy = InversionStrategy::DampedLeastSquares { lambda };
                }
                other => {
                    return Err(ParameterError::KinematicsConfigurationError(format!(
                        "lambda is only used by damped_least_squares, strategy is {:?}", other)));
                }
            }
        }
        Ok(config)
    }
}

fn first_document(contents: &str) -> Result<Yaml, ParameterError> {
    let mut docs = YamlLoader::load_from_str(contents)
        .map_err(|e| ParameterError::ParseError(format!("{}", e)))?;
    if docs.is_empty() {
        return Err(ParameterError::ParseError("empty YAML document".to_string()));
    }
    Ok(docs.swap_remove(0))
}

fn present(value: &Yaml) -> Option<&Yaml> {
    match value {
        Yaml::BadValue | Yaml::Null => None,
        value => Some(value),
    }
}

fn sequence<'a>(value: &'a Yaml, field: &str) -> Result<&'a Vec<Yaml>, ParameterError> {
    match value {
        Yaml::Array(items) => Ok(items),
        Yaml::BadValue => Err(ParameterError::MissingField(field.to_string())),
        other => Err(ParameterError::ParseError(format!("{} must be a list, got {:?}", field, other))),
    }
}

fn fixed_row<const N: usize>(value: &Yaml, field: &str) -> Result<[Yaml; N], ParameterError> {
    let items = sequence(value, field)?;
    <[Yaml; N]>::try_from(items.clone())
        .map_err(|items| ParameterError::InvalidLength { expected: N, found: items.len() })
}

fn number(value: &Yaml, field: &str) -> Result<f64, ParameterError> {
    match value {
        Yaml::Integer(i) => Ok(*i as f64),
        Yaml::Real(_) => value.as_f64().ok_or_else(|| ParameterError::ParseError(format!(
            "{}: cannot read {:?} as a number", field, value))),
        Yaml::BadValue => Err(ParameterError::MissingField(field.to_string())),
        other => Err(ParameterError::ParseError(format!("{}: expected a number, got {:?}", field, other))),
    }
}

/// A number in radians, or `deg(x)` in degrees.
fn angle(value: &Yaml, field: &str) -> Result<f64, ParameterError> {
    let Yaml::String(text) = value else {
        return number(value, field);
    };
    text.trim()
        .strip_prefix("deg(")
        .and_then(|rest| rest.strip_suffix(')'))
        .and_then(|degrees| degrees.trim().parse::<f64>().ok())
        .map(f64::to_radians)
        .ok_or_else(|| ParameterError::WrongAngle(format!("{}: '{}'", field, text)))
}

fn read_base(base: &Yaml) -> Result<Pose, ParameterError> {
    let label = format!("{}.translation", BASE);
    let [x, y, z] = fixed_row::<3>(&base["translation"], &label)?;
    let translation = Translation3::new(number(&x, &label)?, number(&y, &label)?, number(&z, &label)?);

    let rotation = match &base["rotation"] {
        Yaml::BadValue | Yaml::Null => UnitQuaternion::identity(),
        rotation => {
            let label = format!("{}.rotation", BASE);
            let [roll, pitch, yaw] = fixed_row::<3>(rotation, &label)?;
            UnitQuaternion::from_euler_angles(angle(&roll, &label)?, angle(&pitch, &label)?, angle(&yaw, &label)?)
        }
    };
    Ok(Pose::from_parts(translation, rotation))
}
