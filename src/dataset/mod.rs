use nalgebra::Vector3;
use rand::RngCore;
use std::convert::TryFrom;
use tracing::{debug, trace};
use crate::array::{DataArray, Kind, Value};
use crate::distr::{self, CombinePolicy, Distribution, DistrVector};
use crate::error::{Error, Result};
use crate::grid::Grid;

/// A grid bound to a data array of the same length. Queries at physical points
/// interpolate whatever the array yields at the enclosing cell corners: plain values
/// are blended numerically, distributions are blended through the distribution
/// algebra under the dataset CombinePolicy. Whether corners are sampled before
/// blending or the blended distribution is returned depends on the array Policy.
pub struct Dataset {

    grid : Box<dyn Grid>,

    array : Box<dyn DataArray>,

    policy : CombinePolicy
}

impl Dataset {

    pub fn new(grid : Box<dyn Grid>, array : Box<dyn DataArray>) -> Result<Self> {
        if grid.len() != array.len() {
            return Err(Error::ShapeMismatch(format!(
                "Grid of {} samples bound to array of {} elements",
                grid.len(),
                array.len()
            )));
        }
        debug!(dims = ?grid.dims(), kind = ?array.kind(), policy = ?array.policy(), "dataset created");
        Ok(Self { grid, array, policy : CombinePolicy::default() })
    }

    /// Sets the rule used to blend distribution-valued corners.
    pub fn with_policy(mut self, policy : CombinePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn combine_policy(&self) -> CombinePolicy {
        self.policy
    }

    pub fn grid(&self) -> &dyn Grid {
        self.grid.as_ref()
    }

    pub fn array(&self) -> &dyn DataArray {
        self.array.as_ref()
    }

    pub fn array_mut(&mut self) -> &mut dyn DataArray {
        self.array.as_mut()
    }

    /// Value at the informed physical point, using the thread-local generator.
    pub fn at_phys(&self, point : &Vector3<f64>) -> Result<Value> {
        self.at_phys_with(point, &mut rand::thread_rng())
    }

    /// Value at the informed physical point. Returns Error::OutOfBounds for points
    /// outside the grid domain.
    pub fn at_phys_with(&self, point : &Vector3<f64>, rng : &mut dyn RngCore) -> Result<Value> {
        let cell = self.grid.locate(point)?;
        let mut values = Vec::with_capacity(8);
        let mut weights = Vec::with_capacity(8);
        for (idx, w) in cell.contributing() {
            values.push(self.array.get_item_with(idx, rng)?);
            weights.push(w);
        }
        trace!(corners = values.len(), "interpolating");
        interpolate(values, &weights, self.policy, rng)
    }

    /// Typed form of at_phys; the element type must match the array kind.
    pub fn at_phys_as<T>(&self, point : &Vector3<f64>, rng : &mut dyn RngCore) -> Result<T>
    where
        T : TryFrom<Value, Error=Error>
    {
        T::try_from(self.at_phys_with(point, rng)?)
    }

    /// Value stored at lattice sample (i, j, k), without interpolation.
    pub fn at_comp(&self, i : usize, j : usize, k : usize) -> Result<Value> {
        self.at_comp_with(i, j, k, &mut rand::thread_rng())
    }

    /// Reports the first axis whose index falls outside the lattice.
    pub fn at_comp_with(&self, i : usize, j : usize, k : usize, rng : &mut dyn RngCore) -> Result<Value> {
        let idx = match self.grid.index(i, j, k) {
            Some(idx) => idx,
            None => {
                let d = self.grid.dims();
                let (axis, index, dim) = [(0, i, d[0]), (1, j, d[1]), (2, k, d[2])].iter()
                    .cloned()
                    .find(|(_, ix, n)| ix >= n )
                    .unwrap_or((0, i, d[0]));
                return Err(Error::LatticeOutOfRange { axis, index, dim });
            }
        };
        self.array.get_item_with(idx, rng)
    }

}

/// Blends corner values with the informed weights.
pub fn interpolate(
    values : Vec<Value>,
    weights : &[f64],
    policy : CombinePolicy,
    rng : &mut dyn RngCore
) -> Result<Value> {
    let kind = match values.first() {
        Some(v) => v.kind(),
        None => return Err(Error::ShapeMismatch("Interpolation requires at least one value".into()))
    };
    match kind {
        Kind::Scalar => {
            let mut acc = 0.0;
            for (v, w) in values.into_iter().zip(weights.iter()) {
                acc += w * f64::try_from(v)?;
            }
            Ok(Value::Scalar(acc))
        },
        Kind::Vector => {
            let mut acc = Vector3::<f64>::zeros();
            for (v, w) in values.into_iter().zip(weights.iter()) {
                acc += Vector3::<f64>::try_from(v)? * *w;
            }
            Ok(Value::Vector(acc))
        },
        Kind::Distr => {
            let items = values.into_iter().map(Distribution::try_from).collect::<Result<Vec<_>>>()?;
            Ok(Value::Distr(Distribution::combine(&items, weights, policy, rng)?))
        },
        Kind::DistrVector => {
            let items = values.into_iter().map(DistrVector::try_from).collect::<Result<Vec<_>>>()?;
            Ok(Value::DistrVector(distr::combine_vectors(&items, weights, policy, rng)?))
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::array::{DenseArray, SharedArray};
    use crate::distr::{Gaussian, Variate};
    use crate::grid::RegularCartesianGrid;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ramp(n : usize) -> Vec<f64> {
        let mut v = Vec::new();
        for k in 0..n {
            for j in 0..n {
                for i in 0..n {
                    v.push((i + 10 * j + 100 * k) as f64);
                }
            }
        }
        v
    }

    #[test]
    fn scalar_interpolation_is_linear() {
        let grid = RegularCartesianGrid::with_dims(3, 3, 3).unwrap();
        let ds = Dataset::new(Box::new(grid), Box::new(DenseArray::raw(ramp(3)))).unwrap();
        let v = ds.at_phys(&Vector3::new(0.5, 1.5, 0.25)).unwrap();
        assert_eq!(v.kind(), Kind::Scalar);
        let s = f64::try_from(v).unwrap();
        assert!((s - (0.5 + 15.0 + 25.0)).abs() < 1e-9);
        assert_eq!(ds.at_comp(2, 1, 0).unwrap(), Value::Scalar(12.0));
        assert!(matches!(ds.at_comp(3, 0, 0), Err(Error::LatticeOutOfRange { axis : 0, index : 3, dim : 3 })));
        assert!(matches!(ds.at_comp(0, 1, 5), Err(Error::LatticeOutOfRange { axis : 2, index : 5, dim : 3 })));
    }

    #[test]
    fn rejects_length_mismatch() {
        let grid = RegularCartesianGrid::with_dims(2, 2, 2).unwrap();
        assert!(Dataset::new(Box::new(grid), Box::new(DenseArray::raw(vec![0.0; 7]))).is_err());
    }

    #[test]
    fn out_of_bounds_status() {
        let grid = RegularCartesianGrid::with_dims(2, 2, 2).unwrap();
        let ds = Dataset::new(Box::new(grid), Box::new(DenseArray::raw(vec![0.0; 8]))).unwrap();
        assert!(ds.at_phys(&Vector3::new(1.5, 0.0, 0.0)).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn distribution_interpolation() {
        let mut rng = StdRng::seed_from_u64(4);
        let data : Vec<Distribution> = (0..8).map(|i| Gaussian::new(i as f64, 1.0).unwrap().into() ).collect();
        let shared = SharedArray::new(data);
        let grid = RegularCartesianGrid::with_dims(2, 2, 2).unwrap();
        let ds = Dataset::new(Box::new(grid.clone()), Box::new(DenseArray::raw(shared.clone()))).unwrap();
        let d : Distribution = ds.at_phys_as(&Vector3::new(0.5, 0.5, 0.5), &mut rng).unwrap();
        assert!((d.mean() - 3.5).abs() < 1e-12);
        // Eight independent unit variances, each scaled by 1/8.
        assert!((d.var() - 8.0 / 64.0).abs() < 1e-12);

        let sampled = Dataset::new(Box::new(grid), Box::new(DenseArray::sampled(shared))).unwrap();
        let s : f64 = sampled.at_phys_as(&Vector3::new(1.0, 1.0, 1.0), &mut rng).unwrap();
        assert!(s.is_finite());
        assert!(matches!(
            sampled.at_phys_as::<Distribution>(&Vector3::new(1.0, 1.0, 1.0), &mut rng),
            Err(Error::TypeMismatch { .. })
        ));
    }

}
