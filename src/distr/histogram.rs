use serde::{Serialize, Deserialize};
use rand::Rng;
use rand::distributions::WeightedIndex;
use rand_distr::Distribution as _;
use std::convert::TryFrom;
use std::fmt;
use crate::error::{Error, Result};
use super::{Variate, categorical};

/// Univariate empirical distribution over equally-sized bins partitioning [min, max].
/// Probability mass is spread uniformly within each bin, which defines both the
/// sampling procedure and the closed-form moments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "HistogramParams")]
pub struct Histogram {

    min : f64,

    max : f64,

    // Normalized probability mass per bin
    masses : Vec<f64>,

    #[serde(skip_serializing)]
    picker : WeightedIndex<f64>
}

#[derive(Deserialize)]
struct HistogramParams {

    min : f64,

    max : f64,

    masses : Vec<f64>
}

impl TryFrom<HistogramParams> for Histogram {

    type Error = Error;

    fn try_from(p : HistogramParams) -> Result<Self> {
        Histogram::new(p.min, p.max, p.masses)
    }

}

impl PartialEq for Histogram {

    fn eq(&self, other : &Self) -> bool {
        self.min == other.min && self.max == other.max && self.masses == other.masses
    }

}

fn check_finite(sample : &[f64]) -> Result<()> {
    match sample.iter().find(|s| !s.is_finite() ) {
        Some(s) => Err(Error::InvalidParameter(format!("Histogram sample must be finite (got {})", s))),
        None => Ok(())
    }
}

/// Position of value within n bins of the given width starting at min, clamped to the valid bins.
pub(crate) fn bin_of(value : f64, min : f64, width : f64, n_bins : usize) -> usize {
    let b = ((value - min) / width).floor();
    if b <= 0.0 || b.is_nan() {
        0
    } else {
        (b as usize).min(n_bins - 1)
    }
}

impl Histogram {

    pub fn new(min : f64, max : f64, masses : Vec<f64>) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(Error::InvalidSchema(format!("Histogram range requires min < max (got [{}, {}])", min, max)));
        }
        if masses.is_empty() {
            return Err(Error::InvalidSchema("Histogram requires at least one bin".into()));
        }
        if masses.iter().any(|m| !m.is_finite() || *m < 0.0 ) {
            return Err(Error::InvalidParameter("Histogram masses must be finite and >= 0".into()));
        }
        let total : f64 = masses.iter().sum();
        if total <= 0.0 {
            return Err(Error::InvalidParameter("Histogram masses must have a positive sum".into()));
        }
        let masses : Vec<f64> = masses.iter().map(|m| m / total ).collect();
        let picker = categorical(masses.iter().cloned())?;
        Ok(Self{ min, max, masses, picker })
    }

    /// Builds a histogram over the observed sample range. A constant sample
    /// is centered in a unit-width range.
    pub fn from_samples(sample : &[f64], n_bins : usize) -> Result<Self> {
        check_finite(sample)?;
        let (mut min, mut max) = (f64::MAX, f64::MIN);
        for s in sample.iter() {
            min = min.min(*s);
            max = max.max(*s);
        }
        if sample.is_empty() {
            return Err(Error::ShapeMismatch("Cannot build histogram from an empty sample".into()));
        }
        if min == max {
            min -= 0.5;
            max += 0.5;
        }
        Self::from_samples_in(sample, min, max, n_bins)
    }

    /// Builds a histogram over a fixed range; values outside it are
    /// accumulated at the boundary bins. Non-finite values are rejected.
    pub fn from_samples_in(sample : &[f64], min : f64, max : f64, n_bins : usize) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::InvalidSchema("Histogram requires at least one bin".into()));
        }
        if sample.is_empty() {
            return Err(Error::ShapeMismatch("Cannot build histogram from an empty sample".into()));
        }
        check_finite(sample)?;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(Error::InvalidSchema(format!("Histogram range requires min < max (got [{}, {}])", min, max)));
        }
        let width = (max - min) / n_bins as f64;
        let mut counts = vec![0.0; n_bins];
        for s in sample.iter() {
            counts[bin_of(*s, min, width, n_bins)] += 1.0;
        }
        Self::new(min, max, counts)
    }

    pub fn num_bins(&self) -> usize {
        self.masses.len()
    }

    pub fn limits(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.masses.len() as f64
    }

    pub fn bounds(&self, pos : usize) -> Option<(f64, f64)> {
        if pos >= self.masses.len() {
            return None;
        }
        let low = self.min + self.bin_width() * pos as f64;
        Some((low, low + self.bin_width()))
    }

    /// Returns 0 if bin position is outside bounds.
    pub fn prob(&self, pos : usize) -> f64 {
        self.masses.get(pos).cloned().unwrap_or(0.0)
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    fn center(&self, pos : usize) -> f64 {
        self.min + self.bin_width() * (pos as f64 + 0.5)
    }

}

impl Variate for Histogram {

    fn mean(&self) -> f64 {
        self.masses.iter().enumerate().fold(0.0, |m, (i, p)| m + p * self.center(i) )
    }

    /// Variance of the piecewise-uniform density: bin-center spread plus the
    /// within-bin term width^2 / 12.
    fn var(&self) -> f64 {
        let mean = self.mean();
        let w = self.bin_width();
        let second = self.masses.iter().enumerate()
            .fold(0.0, |s, (i, p)| s + p * (self.center(i).powf(2.) + w.powf(2.) / 12.) );
        (second - mean.powf(2.)).max(0.0)
    }

}

impl rand_distr::Distribution<f64> for Histogram {

    fn sample<R>(&self, rng : &mut R) -> f64
    where
        R : Rng + ?Sized
    {
        let ix = self.picker.sample(rng);
        let u : f64 = rng.gen();
        self.min + self.bin_width() * (ix as f64 + u)
    }

}

impl fmt::Display for Histogram {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Histogram {{ Limits: [{} - {}]; Bins: {}; Mean: {}; Variance: {} }}",
            self.min,
            self.max,
            self.num_bins(),
            self.mean(),
            self.var()
        )
    }

}
