//! Error handling for chain configuration and parameter extractors

use std::io;
use thiserror::Error;

/// Unified error to report failures while building a chain, either in code or from YAML.
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("IO Error: {0}")]
    IoError(#[from] io::Error),

    #[error("Parse Error: {0}")]
    ParseError(String),

    #[error("Missing Field: {0}")]
    MissingField(String),

    #[error("Wrong angle representation: {0}")]
    WrongAngle(String),

    #[error("Invalid Length: expected {expected}, found {found}")]
    InvalidLength { expected: usize, found: usize },

    #[error("Invalid limits for link {link}: lower {lower} is above upper {upper}")]
    InvalidLimits { link: usize, lower: f64, upper: f64 },

    #[error("Kinematics Configuration Error: {0}")]
    KinematicsConfigurationError(String),
}
