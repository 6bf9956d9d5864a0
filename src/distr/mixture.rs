use serde::{Serialize, Deserialize};
use rand::Rng;
use rand::distributions::WeightedIndex;
use rand_distr::Distribution as _;
use std::convert::TryFrom;
use std::fmt;
use crate::error::{Error, Result};
use super::{Variate, Gaussian, categorical};

/// Single weighted normal term of a GaussianMixture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Component {

    pub weight : f64,

    pub mean : f64,

    pub std : f64
}

impl Component {

    pub fn gaussian(&self) -> Result<Gaussian> {
        Gaussian::new(self.mean, self.std)
    }

}

/// Finite mixture of univariate normals. Weights are normalized to sum to one
/// at construction, so the mixture is always a proper density.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MixtureParams")]
pub struct GaussianMixture {

    components : Vec<Component>,

    #[serde(skip_serializing)]
    picker : WeightedIndex<f64>
}

#[derive(Deserialize)]
struct MixtureParams {
    components : Vec<Component>
}

impl TryFrom<MixtureParams> for GaussianMixture {

    type Error = Error;

    fn try_from(p : MixtureParams) -> Result<Self> {
        GaussianMixture::new(p.components)
    }

}

impl PartialEq for GaussianMixture {

    fn eq(&self, other : &Self) -> bool {
        self.components == other.components
    }

}

impl GaussianMixture {

    pub fn new(components : Vec<Component>) -> Result<Self> {
        if components.is_empty() {
            return Err(Error::InvalidParameter("Mixture requires at least one component".into()));
        }
        for c in components.iter() {
            Gaussian::new(c.mean, c.std)?;
            if !c.weight.is_finite() || c.weight < 0.0 {
                return Err(Error::InvalidParameter(format!("Mixture weight must be finite and >= 0 (got {})", c.weight)));
            }
        }
        let total : f64 = components.iter().map(|c| c.weight ).sum();
        if total <= 0.0 {
            return Err(Error::InvalidParameter("Mixture weights must have a positive sum".into()));
        }
        let components : Vec<Component> = components.into_iter()
            .map(|c| Component { weight : c.weight / total, ..c })
            .collect();
        let picker = categorical(components.iter().map(|c| c.weight ))?;
        Ok(Self{ components, picker })
    }

    pub fn from_gaussians(terms : &[(f64, Gaussian)]) -> Result<Self> {
        Self::new(terms.iter().map(|(w, g)| Component { weight : *w, mean : g.mean(), std : g.std() }).collect())
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

}

impl Variate for GaussianMixture {

    fn mean(&self) -> f64 {
        self.components.iter().fold(0.0, |m, c| m + c.weight * c.mean )
    }

    /// Law of total variance over the latent component choice.
    fn var(&self) -> f64 {
        let mean = self.mean();
        let second = self.components.iter()
            .fold(0.0, |s, c| s + c.weight * (c.std.powf(2.) + c.mean.powf(2.)) );
        (second - mean.powf(2.)).max(0.0)
    }

}

impl rand_distr::Distribution<f64> for GaussianMixture {

    fn sample<R>(&self, rng : &mut R) -> f64
    where
        R : Rng + ?Sized
    {
        let c = &self.components[self.picker.sample(rng)];
        Gaussian::from_valid(c.mean, c.std).sample(rng)
    }

}

impl fmt::Display for GaussianMixture {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GaussianMixture {{ ")?;
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: N({}, {})", c.weight, c.mean, c.std)?;
        }
        write!(f, " }}")
    }

}
