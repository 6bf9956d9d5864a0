use nalgebra::Vector3;
use serde::{Serialize, Deserialize};
use std::convert::TryFrom;
use tracing::trace;
use crate::error::{Error, Result};

/// Lattice cell enclosing a physical point: the linear indices of its eight corners
/// and their trilinear interpolation weights (non-negative, summing to one). Corner
/// order is x-fastest: (i,j,k), (i+1,j,k), (i,j+1,k), (i+1,j+1,k), then the same at k+1.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {

    pub corners : [usize; 8],

    pub weights : [f64; 8]
}

impl Cell {

    /// Corners that contribute to the interpolated value.
    pub fn contributing(&self) -> impl Iterator<Item=(usize, f64)> + '_ {
        self.corners.iter().cloned().zip(self.weights.iter().cloned()).filter(|(_, w)| *w > 0.0 )
    }

}

/// Spatial index mapping physical coordinates to lattice cells.
pub trait Grid {

    /// Number of samples along each axis.
    fn dims(&self) -> [usize; 3];

    fn len(&self) -> usize {
        let d = self.dims();
        d[0] * d[1] * d[2]
    }

    /// Lower and upper corners of the domain bounding box.
    fn bounds(&self) -> (Vector3<f64>, Vector3<f64>);

    /// Linear index of the lattice sample (i, j, k), or None outside the lattice.
    fn index(&self, i : usize, j : usize, k : usize) -> Option<usize>;

    /// Resolves the cell enclosing point. Points outside the bounding box are
    /// reported as Error::OutOfBounds; no clamping to the domain edge is performed.
    fn locate(&self, point : &Vector3<f64>) -> Result<Cell>;

}

/// Regular Cartesian lattice: sample (i, j, k) sits at origin + (i, j, k) * spacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridParams")]
pub struct RegularCartesianGrid {

    dims : [usize; 3],

    origin : Vector3<f64>,

    spacing : Vector3<f64>
}

#[derive(Deserialize)]
struct GridParams {

    dims : [usize; 3],

    origin : Vector3<f64>,

    spacing : Vector3<f64>
}

impl TryFrom<GridParams> for RegularCartesianGrid {

    type Error = Error;

    fn try_from(p : GridParams) -> Result<Self> {
        RegularCartesianGrid::new(p.dims, p.origin, p.spacing)
    }

}

impl RegularCartesianGrid {

    pub fn new(dims : [usize; 3], origin : Vector3<f64>, spacing : Vector3<f64>) -> Result<Self> {
        if dims.iter().any(|d| *d == 0 ) {
            return Err(Error::InvalidSchema(format!("Grid dimensions must be >= 1 (got {:?})", dims)));
        }
        if spacing.iter().any(|s| !(s.is_finite() && *s > 0.0) ) {
            return Err(Error::InvalidSchema(format!("Grid spacing must be positive (got {:?})", spacing.as_slice())));
        }
        if origin.iter().any(|o| !o.is_finite() ) {
            return Err(Error::InvalidSchema("Grid origin must be finite".into()));
        }
        Ok(Self{ dims, origin, spacing })
    }

    /// Unit-spaced lattice anchored at the origin.
    pub fn with_dims(nx : usize, ny : usize, nz : usize) -> Result<Self> {
        Self::new([nx, ny, nz], Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0))
    }

    pub fn origin(&self) -> &Vector3<f64> {
        &self.origin
    }

    pub fn spacing(&self) -> &Vector3<f64> {
        &self.spacing
    }

    /// Lower lattice index and fractional offset along one axis; None outside [0, dim - 1].
    fn axis(&self, axis : usize, coord : f64) -> Option<(usize, f64)> {
        let f = (coord - self.origin[axis]) / self.spacing[axis];
        let last = (self.dims[axis] - 1) as f64;
        if !(f >= 0.0 && f <= last) {
            return None;
        }
        if self.dims[axis] == 1 {
            return Some((0, 0.0));
        }
        let i = (f.floor() as usize).min(self.dims[axis] - 2);
        Some((i, f - i as f64))
    }

}

impl Grid for RegularCartesianGrid {

    fn dims(&self) -> [usize; 3] {
        self.dims
    }

    fn bounds(&self) -> (Vector3<f64>, Vector3<f64>) {
        let ext = Vector3::new(
            (self.dims[0] - 1) as f64,
            (self.dims[1] - 1) as f64,
            (self.dims[2] - 1) as f64
        );
        (self.origin, self.origin + ext.component_mul(&self.spacing))
    }

    fn index(&self, i : usize, j : usize, k : usize) -> Option<usize> {
        let [nx, ny, nz] = self.dims;
        if i >= nx || j >= ny || k >= nz {
            return None;
        }
        Some(i + nx * (j + ny * k))
    }

    fn locate(&self, point : &Vector3<f64>) -> Result<Cell> {
        let out = || Error::OutOfBounds { point : *point };
        let (i, fx) = self.axis(0, point[0]).ok_or_else(out)?;
        let (j, fy) = self.axis(1, point[1]).ok_or_else(out)?;
        let (k, fz) = self.axis(2, point[2]).ok_or_else(out)?;
        let [nx, ny, nz] = self.dims;

        // Degenerate axes repeat the lower index; their upper corners carry zero weight.
        let step = |n : usize, i : usize| if n > 1 { i + 1 } else { i };
        let (xs, ys, zs) = ([i, step(nx, i)], [j, step(ny, j)], [k, step(nz, k)]);
        let (wx, wy, wz) = ([1.0 - fx, fx], [1.0 - fy, fy], [1.0 - fz, fz]);
        let mut corners = [0; 8];
        let mut weights = [0.0; 8];
        for c in 0..8 {
            let (a, b, d) = (c & 1, (c >> 1) & 1, (c >> 2) & 1);
            corners[c] = xs[a] + nx * (ys[b] + ny * zs[d]);
            weights[c] = wx[a] * wy[b] * wz[d];
        }
        trace!(cell = ?[i, j, k], "point located");
        Ok(Cell{ corners, weights })
    }

}
