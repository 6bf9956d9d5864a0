use rand::RngCore;
use rand_distr::Distribution as _;
use std::any::Any;
use tracing::debug;
use crate::distr::{Component, Distribution, Gaussian, GaussianMixture, Variate};
use crate::error::{Error, Result};
use super::{DataArray, Kind, Policy, SharedArray, Value};

/// DataArray over a structure of parameter arrays, ordered as
/// mean0, var0, weight0, mean1, var1, weight1, ... Element i is the mixture
/// whose component c has mean arrays[3c][i], variance arrays[3c+1][i] and
/// weight arrays[3c+2][i].
#[derive(Debug, Clone)]
pub struct GmmArray {

    arrays : Vec<SharedArray<f64>>,

    len : usize,

    policy : Policy
}

impl GmmArray {

    pub fn new(arrays : Vec<SharedArray<f64>>, policy : Policy) -> Result<Self> {
        if arrays.is_empty() || arrays.len() % 3 != 0 {
            return Err(Error::ShapeMismatch(format!(
                "Mixture parameter arrays must come in (mean, variance, weight) triples (got {} arrays)",
                arrays.len()
            )));
        }
        let len = arrays[0].len();
        if let Some((i, a)) = arrays.iter().enumerate().find(|(_, a)| a.len() != len ) {
            return Err(Error::ShapeMismatch(format!("Array {} has length {}, expected {}", i, a.len(), len)));
        }
        debug!(len, components = arrays.len() / 3, ?policy, "mixture array created");
        Ok(Self { arrays, len, policy })
    }

    pub fn num_components(&self) -> usize {
        self.arrays.len() / 3
    }

    /// Mixture stored at idx. Variances must be finite and non-negative.
    fn mixture(&self, idx : usize) -> Result<GaussianMixture> {
        let components = self.arrays.chunks(3).map(|c| {
            let g = Gaussian::from_variance(c[0].read()[idx], c[1].read()[idx])?;
            Ok(Component { mean : g.mean(), std : g.std(), weight : c[2].read()[idx] })
        }).collect::<Result<Vec<_>>>()?;
        GaussianMixture::new(components)
    }

}

impl DataArray for GmmArray {

    fn len(&self) -> usize {
        self.len
    }

    fn kind(&self) -> Kind {
        match self.policy {
            Policy::Raw => Kind::Distr,
            Policy::Sampled => Kind::Scalar
        }
    }

    fn policy(&self) -> Policy {
        self.policy
    }

    fn get_item_with(&self, idx : usize, rng : &mut dyn RngCore) -> Result<Value> {
        if idx >= self.len {
            return Err(Error::IndexOutOfRange { index : idx, len : self.len });
        }
        let m = self.mixture(idx)?;
        Ok(match self.policy {
            Policy::Raw => Value::Distr(m.into()),
            Policy::Sampled => Value::Scalar(m.sample(rng))
        })
    }

    /// Accepts a mixture with the stored number of components, or a Gaussian
    /// when the array holds a single component.
    fn set_item(&mut self, idx : usize, value : Value) -> Result<()> {
        if idx >= self.len {
            return Err(Error::IndexOutOfRange { index : idx, len : self.len });
        }
        let found = value.kind();
        let components : Vec<Component> = match value {
            Value::Distr(Distribution::Mixture(m)) => m.components().to_vec(),
            Value::Distr(Distribution::Gaussian(g)) => {
                let m = GaussianMixture::from_gaussians(&[(1.0, g)])?;
                m.components().to_vec()
            },
            Value::Distr(Distribution::Histogram(_)) => {
                return Err(Error::Unsupported("Mixture arrays cannot store histograms".into()));
            },
            _ => return Err(Error::TypeMismatch { expected : Kind::Distr, found })
        };
        if components.len() != self.num_components() {
            return Err(Error::ShapeMismatch(format!(
                "Mixture with {} components informed to array of {} components",
                components.len(),
                self.num_components()
            )));
        }
        for (c, arrs) in components.iter().zip(self.arrays.chunks(3)) {
            arrs[0].write()[idx] = c.mean;
            arrs[1].write()[idx] = c.std.powf(2.);
            arrs[2].write()[idx] = c.weight;
        }
        Ok(())
    }

    fn raw_array(&self) -> &dyn Any {
        &self.arrays
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    fn two_component() -> GmmArray {
        let arrays = vec![
            vec![0.0, 1.0].into(),
            vec![1.0, 4.0].into(),
            vec![0.5, 1.0].into(),
            vec![2.0, 3.0].into(),
            vec![1.0, 1.0].into(),
            vec![0.5, 3.0].into()
        ];
        GmmArray::new(arrays, Policy::Raw).unwrap()
    }

    #[test]
    fn assembles_mixtures() {
        let arr = two_component();
        assert_eq!(arr.len(), 2);
        match arr.get_item(1).unwrap() {
            Value::Distr(Distribution::Mixture(m)) => {
                assert_eq!(m.len(), 2);
                assert!((m.components()[0].std - 2.0).abs() < 1e-12);
                assert!((m.mean() - (0.25 * 1.0 + 0.75 * 3.0)).abs() < 1e-12);
            },
            other => panic!("Unexpected {:?}", other)
        }
    }

    #[test]
    fn rejects_malformed_layout() {
        let arrays : Vec<SharedArray<f64>> = vec![vec![0.0].into(), vec![1.0].into()];
        assert!(GmmArray::new(arrays, Policy::Raw).is_err());
        let arrays : Vec<SharedArray<f64>> = vec![vec![0.0].into(), vec![1.0].into(), vec![1.0, 2.0].into()];
        assert!(GmmArray::new(arrays, Policy::Raw).is_err());
    }

    #[test]
    fn rejects_invalid_variances() {
        for var in [-4.0, f64::NAN, f64::INFINITY].iter() {
            let arrays = vec![vec![1.0].into(), vec![*var].into(), vec![1.0].into()];
            let arr = GmmArray::new(arrays, Policy::Raw).unwrap();
            assert!(matches!(arr.get_item(0), Err(Error::InvalidParameter(_))), "accepted variance {}", var);
        }
    }

    #[test]
    fn set_item_round_trip() {
        let mut arr = two_component();
        let m = GaussianMixture::from_gaussians(&[
            (1.0, Gaussian::new(5.0, 1.0).unwrap()),
            (1.0, Gaussian::new(7.0, 1.0).unwrap())
        ]).unwrap();
        arr.set_item(0, m.clone().into()).unwrap();
        assert_eq!(arr.get_item(0).unwrap(), Value::Distr(m.into()));
        assert!(matches!(arr.set_item(0, Value::Scalar(1.0)), Err(Error::TypeMismatch { .. })));
        assert!(matches!(arr.set_item(0, Gaussian::new(0.0, 1.0).unwrap().into()), Err(Error::ShapeMismatch(_))));
    }

}
