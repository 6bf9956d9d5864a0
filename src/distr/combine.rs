use serde::{Serialize, Deserialize};
use rand::Rng;
use rand_distr::Distribution as _;
use std::borrow::Borrow;
use tracing::trace;
use crate::error::{Error, Result};
use super::{Distribution, DistrVector, Gaussian, Histogram, Variate};

/// Rule used to form the linear combination sum(w_i X_i) of independent variables
/// when a closed form is not available for the operand families.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CombinePolicy {

    /// Closed form only. Defined for Gaussian operands; any other family is Unsupported.
    Exact,

    /// Closed form for Gaussian operands; otherwise a Gaussian matching the
    /// mean and variance of the combination.
    MomentMatch,

    /// Monte-Carlo estimate of the combination as an empirical histogram.
    Resample { samples : usize, bins : usize }
}

impl Default for CombinePolicy {

    fn default() -> Self {
        CombinePolicy::MomentMatch
    }

}

fn check_operands(n_items : usize, weights : &[f64]) -> Result<()> {
    if n_items == 0 {
        return Err(Error::ShapeMismatch("Combination requires at least one operand".into()));
    }
    if n_items != weights.len() {
        return Err(Error::ShapeMismatch(format!("{} operands informed with {} weights", n_items, weights.len())));
    }
    if let Some(w) = weights.iter().find(|w| !w.is_finite() ) {
        return Err(Error::InvalidParameter(format!("Combination weight must be finite (got {})", w)));
    }
    Ok(())
}

/// Closed-form combination, available only when every operand is Gaussian.
fn exact_gaussian<D>(items : &[D], weights : &[f64]) -> Option<Gaussian>
where
    D : Borrow<Distribution>
{
    let mut acc = Gaussian::degenerate(0.0).ok()?;
    for (d, w) in items.iter().zip(weights.iter()) {
        let d : &Distribution = d.borrow();
        acc = acc + *d.as_gaussian()? * *w;
    }
    Some(acc)
}

fn moment_match<D>(items : &[D], weights : &[f64]) -> Result<Gaussian>
where
    D : Borrow<Distribution>
{
    let (mut mean, mut var) = (0.0, 0.0);
    for (d, w) in items.iter().zip(weights.iter()) {
        let d : &Distribution = d.borrow();
        mean += w * d.mean();
        var += w.powf(2.) * d.var();
    }
    Gaussian::from_variance(mean, var)
}

fn resample<D, R>(items : &[D], weights : &[f64], samples : usize, bins : usize, rng : &mut R) -> Result<Distribution>
where
    D : Borrow<Distribution>,
    R : Rng + ?Sized
{
    if samples == 0 || bins == 0 {
        return Err(Error::InvalidParameter("Resampling requires a positive sample and bin count".into()));
    }
    let draws : Vec<f64> = (0..samples).map(|_| {
        items.iter().zip(weights.iter()).fold(0.0, |s, (d, w)| {
            let d : &Distribution = d.borrow();
            s + w * d.sample(rng)
        })
    }).collect();
    let first = draws[0];
    if draws.iter().all(|d| *d == first ) {
        return Ok(Gaussian::degenerate(first)?.into());
    }
    Ok(Histogram::from_samples(&draws, bins)?.into())
}

impl Distribution {

    /// Linear combination sum(w_i X_i) of independent random variables. Interpolation
    /// uses the cell weights as coefficients. The generator is only advanced under
    /// CombinePolicy::Resample.
    pub fn combine<D, R>(items : &[D], weights : &[f64], policy : CombinePolicy, rng : &mut R) -> Result<Distribution>
    where
        D : Borrow<Distribution>,
        R : Rng + ?Sized
    {
        check_operands(items.len(), weights)?;
        trace!(operands = items.len(), ?policy, "combining distributions");
        match policy {
            CombinePolicy::Exact => {
                exact_gaussian(items, weights)
                    .map(Distribution::from)
                    .ok_or_else(|| Error::Unsupported("Exact combination is only defined for Gaussian operands".into()) )
            },
            CombinePolicy::MomentMatch => {
                match exact_gaussian(items, weights) {
                    Some(g) => Ok(g.into()),
                    None => Ok(moment_match(items, weights)?.into())
                }
            },
            CombinePolicy::Resample { samples, bins } => {
                resample(items, weights, samples, bins, rng)
            }
        }
    }

    /// Binary form of combine: wa * self + wb * other.
    pub fn combine_with<R>(&self, other : &Distribution, weights : (f64, f64), policy : CombinePolicy, rng : &mut R) -> Result<Distribution>
    where
        R : Rng + ?Sized
    {
        Self::combine(&[self, other], &[weights.0, weights.1], policy, rng)
    }

}

/// Component-wise combination of distribution vectors.
pub fn combine_vectors<D, R>(items : &[D], weights : &[f64], policy : CombinePolicy, rng : &mut R) -> Result<DistrVector>
where
    D : Borrow<DistrVector>,
    R : Rng + ?Sized
{
    check_operands(items.len(), weights)?;
    let axis = |a : usize| -> Vec<&Distribution> {
        items.iter().map(|v| {
            let v : &DistrVector = v.borrow();
            &v[a]
        }).collect()
    };
    let x = Distribution::combine(&axis(0), weights, policy, rng)?;
    let y = Distribution::combine(&axis(1), weights, policy, rng)?;
    let z = Distribution::combine(&axis(2), weights, policy, rng)?;
    Ok([x, y, z])
}
