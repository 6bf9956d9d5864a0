use serde::{Serialize, Deserialize};
use rand::Rng;
use rand_distr::StandardNormal;
use std::convert::TryFrom;
use std::ops::{Add, Mul};
use std::fmt;
use crate::error::{Error, Result};
use super::Variate;

/// Univariate normal distribution, parametrized by its mean and standard deviation.
/// A zero standard deviation is accepted and represents a point mass at the mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GaussianParams")]
pub struct Gaussian {

    mean : f64,

    std : f64
}

impl Gaussian {

    pub fn new(mean : f64, std : f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(Error::InvalidParameter(format!("Gaussian mean must be finite (got {})", mean)));
        }
        if !std.is_finite() || std < 0.0 {
            return Err(Error::InvalidParameter(format!("Gaussian stddev must be finite and >= 0 (got {})", std)));
        }
        Ok(Self{ mean, std })
    }

    pub fn from_variance(mean : f64, var : f64) -> Result<Self> {
        if !(var.is_finite() && var >= 0.0) {
            return Err(Error::InvalidParameter(format!("Gaussian variance must be finite and >= 0 (got {})", var)));
        }
        Self::new(mean, var.sqrt())
    }

    /// Point mass at the informed value.
    pub fn degenerate(value : f64) -> Result<Self> {
        Self::new(value, 0.0)
    }

    /// Parameters must already satisfy the checks done by new.
    pub(crate) fn from_valid(mean : f64, std : f64) -> Self {
        Self{ mean, std }
    }

}

#[derive(Deserialize)]
struct GaussianParams {

    mean : f64,

    std : f64
}

impl TryFrom<GaussianParams> for Gaussian {

    type Error = Error;

    fn try_from(p : GaussianParams) -> Result<Self> {
        Gaussian::new(p.mean, p.std)
    }

}

impl Default for Gaussian {

    fn default() -> Self {
        Gaussian { mean : 0.0, std : 1.0 }
    }

}

impl Variate for Gaussian {

    fn mean(&self) -> f64 {
        self.mean
    }

    fn var(&self) -> f64 {
        self.std.powf(2.)
    }

    fn std(&self) -> f64 {
        self.std
    }

}

impl rand_distr::Distribution<f64> for Gaussian {

    fn sample<R>(&self, rng : &mut R) -> f64
    where
        R : Rng + ?Sized
    {
        if self.std == 0.0 {
            return self.mean;
        }
        let z : f64 = rng.sample(StandardNormal);
        self.mean + self.std * z
    }

}

/// Sum of two independent normal variables.
impl Add for Gaussian {

    type Output = Gaussian;

    fn add(self, other : Gaussian) -> Gaussian {
        Gaussian {
            mean : self.mean + other.mean,
            std : (self.var() + other.var()).sqrt()
        }
    }

}

impl Mul<f64> for Gaussian {

    type Output = Gaussian;

    fn mul(self, scale : f64) -> Gaussian {
        Gaussian { mean : self.mean * scale, std : self.std * scale.abs() }
    }

}

impl fmt::Display for Gaussian {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gaussian {{ Mean: {}; Std: {} }}", self.mean, self.std)
    }

}

#[cfg(test)]
mod tests {

    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::Distribution;

    #[test]
    fn zero_std_samples_mean() {
        let mut rng = StdRng::seed_from_u64(7);
        for mean in [-3.5, 0.0, 1e-9, 42.0, 1e6].iter() {
            let g = Gaussian::new(*mean, 0.0).unwrap();
            for _ in 0..1000 {
                assert_eq!(g.sample(&mut rng), *mean);
            }
        }
    }

    #[test]
    fn rejects_negative_std() {
        assert!(Gaussian::new(0.0, -1.0).is_err());
        assert!(Gaussian::new(f64::NAN, 1.0).is_err());
        assert!(Gaussian::from_variance(0.0, -0.1).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let g : Gaussian = serde_json::from_str(r#"{"mean":1.5,"std":0.5}"#).unwrap();
        assert_eq!(g, Gaussian::new(1.5, 0.5).unwrap());
        assert!(serde_json::from_str::<Gaussian>(r#"{"mean":0.0,"std":-2.0}"#).is_err());
    }

    #[test]
    fn arithmetic() {
        let a = Gaussian::new(1.0, 3.0).unwrap();
        let b = Gaussian::new(2.0, 4.0).unwrap();
        let s = a + b;
        assert_eq!(s.mean(), 3.0);
        assert!((s.std() - 5.0).abs() < 1e-12);
        let h = a * -0.5;
        assert_eq!(h.mean(), -0.5);
        assert_eq!(h.std(), 1.5);
    }

    #[test]
    fn sample_moments() {
        let mut rng = StdRng::seed_from_u64(11);
        let g = Gaussian::new(2.0, 0.5).unwrap();
        let n = 20_000;
        let draws : Vec<f64> = (0..n).map(|_| g.sample(&mut rng) ).collect();
        let m = draws.iter().sum::<f64>() / n as f64;
        let v = draws.iter().map(|d| (d - m).powf(2.) ).sum::<f64>() / n as f64;
        assert!((m - 2.0).abs() < 0.02);
        assert!((v - 0.25).abs() < 0.02);
    }

}
