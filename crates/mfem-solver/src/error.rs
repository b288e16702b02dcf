//! Error types for mfem-solver

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FemError>;

#[derive(Error, Debug)]
pub enum FemError {
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Invalid material: {0}")]
    InvalidMaterial(String),

    #[error("Target coordinate ({x}, {y}) is not on a solid element")]
    PointOutsideDomain { x: f64, y: f64 },

    #[error("Ill-posed boundary condition: {0}")]
    IllPosedBoundary(String),

    #[error("Requested {requested} modes but only {available} free DOFs are available")]
    TooManyModes { requested: usize, available: usize },

    #[error("Eigensolver did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("Unsupported analysis: {0}")]
    UnsupportedAnalysis(String),
}
