/// Random variables stored at grid samples (Gaussian, Gaussian mixture and histogram
/// families), their moments, sampling and the linear-combination algebra used
/// to interpolate them.
pub mod distr;

/// Multivariate empirical distributions over uniformly binned variables:
/// construction from raw samples, schema accessors, marginalization and conditioning.
pub mod joint;

/// Index-addressable element storage with raw or sampled resolution of distributions.
pub mod array;

/// Spatial index from physical coordinates to lattice cells and interpolation weights.
pub mod grid;

/// Grid and data array pairs supporting interpolated queries at physical points.
pub mod dataset;

/// Shape-checked buffer boundary for scripting and visualization adapters.
pub mod bind;

/// Flat raw-array and CSV sample loaders.
pub mod io;

/// JSON description of fields stored as raw arrays.
pub mod config;

mod error;

pub use error::{Error, Result};
