use nalgebra::Vector3;
use thiserror::Error;
use crate::array::Kind;

/// Failure outcomes of the field core. Boundary validation errors (shape, schema, parameters)
/// are raised before any state is touched; OutOfBounds is the expected outcome of
/// queries near the domain edges and should be treated as a status by scan loops.
#[derive(Error, Debug)]
pub enum Error {

    #[error("Point ({}, {}, {}) lies outside the grid domain", point[0], point[1], point[2])]
    OutOfBounds { point : Vector3<f64> },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid binning schema: {0}")]
    InvalidSchema(String),

    #[error("Element kind mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch { expected : Kind, found : Kind },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid distribution parameter: {0}")]
    InvalidParameter(String),

    #[error("Index {index} outside array of length {len}")]
    IndexOutOfRange { index : usize, len : usize },

    #[error("Lattice index {index} outside axis {axis} of {dim} samples")]
    LatticeOutOfRange { axis : usize, index : usize, dim : usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error)

}

impl Error {

    /// True for the query-time status of a point outside the grid.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Error::OutOfBounds { .. })
    }

}

pub type Result<T> = std::result::Result<T, Error>;
