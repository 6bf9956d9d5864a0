use serde::{Serialize, Deserialize};
use rand::Rng;
use rand::distributions::WeightedIndex;
use rand_distr::Distribution as _;
use nalgebra::Vector3;
use std::fmt;
use crate::error::{Error, Result};

mod gaussian;

pub use gaussian::*;

mod mixture;

pub use mixture::*;

/// Piecewise-uniform univariate empirical distribution.
mod histogram;

pub use histogram::*;

/// Linear combination of independent random variables (the interpolation algebra).
mod combine;

pub use combine::*;

/// Moment queries shared by every distribution family. Sampling is provided
/// by implementing rand_distr::Distribution<f64>, so any Rng (seeded or the
/// thread-local generator) can drive the draws.
pub trait Variate {

    fn mean(&self) -> f64;

    fn var(&self) -> f64;

    fn std(&self) -> f64 {
        self.var().sqrt()
    }

}

/// Closed family of random variables that can be stored at grid samples.
/// New families are added as variants here, so that every match over
/// sampling, moments and combination stays exhaustive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Distribution {
    Gaussian(Gaussian),
    Mixture(GaussianMixture),
    Histogram(Histogram)
}

/// Vector-valued element whose components are independent random variables.
pub type DistrVector = [Distribution; 3];

impl Distribution {

    /// Draws one realization using the thread-local generator. Use
    /// rand_distr::Distribution::sample to supply an explicit generator.
    pub fn draw(&self) -> f64 {
        rand_distr::Distribution::sample(self, &mut rand::thread_rng())
    }

    pub fn as_gaussian(&self) -> Option<&Gaussian> {
        match self {
            Distribution::Gaussian(g) => Some(g),
            _ => None
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            Distribution::Gaussian(_) => "gaussian",
            Distribution::Mixture(_) => "mixture",
            Distribution::Histogram(_) => "histogram"
        }
    }

}

impl Variate for Distribution {

    fn mean(&self) -> f64 {
        match self {
            Distribution::Gaussian(g) => g.mean(),
            Distribution::Mixture(m) => m.mean(),
            Distribution::Histogram(h) => h.mean()
        }
    }

    fn var(&self) -> f64 {
        match self {
            Distribution::Gaussian(g) => g.var(),
            Distribution::Mixture(m) => m.var(),
            Distribution::Histogram(h) => h.var()
        }
    }

}

impl rand_distr::Distribution<f64> for Distribution {

    fn sample<R>(&self, rng : &mut R) -> f64
    where
        R : Rng + ?Sized
    {
        match self {
            Distribution::Gaussian(g) => g.sample(rng),
            Distribution::Mixture(m) => m.sample(rng),
            Distribution::Histogram(h) => h.sample(rng)
        }
    }

}

impl From<Gaussian> for Distribution {

    fn from(g : Gaussian) -> Self {
        Distribution::Gaussian(g)
    }

}

impl From<GaussianMixture> for Distribution {

    fn from(m : GaussianMixture) -> Self {
        Distribution::Mixture(m)
    }

}

impl From<Histogram> for Distribution {

    fn from(h : Histogram) -> Self {
        Distribution::Histogram(h)
    }

}

impl fmt::Display for Distribution {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Gaussian(g) => g.fmt(f),
            Distribution::Mixture(m) => m.fmt(f),
            Distribution::Histogram(h) => h.fmt(f)
        }
    }

}

/// Draws one realization per component.
pub fn sample_vector<R>(v : &DistrVector, rng : &mut R) -> Vector3<f64>
where
    R : Rng + ?Sized
{
    Vector3::new(v[0].sample(rng), v[1].sample(rng), v[2].sample(rng))
}

pub fn mean_vector(v : &DistrVector) -> Vector3<f64> {
    Vector3::new(v[0].mean(), v[1].mean(), v[2].mean())
}

/// Index sampler over non-negative masses. Zero-mass entries are never drawn.
pub(crate) fn categorical<I>(masses : I) -> Result<WeightedIndex<f64>>
where
    I : IntoIterator<Item=f64>
{
    WeightedIndex::new(masses)
        .map_err(|e| Error::InvalidParameter(format!("Invalid probability masses: {}", e)) )
}
