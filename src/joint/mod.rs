use std::collections::{BTreeMap, BTreeSet};
use rand::Rng;
use rand::distributions::WeightedIndex;
use rand_distr::Distribution as _;
use tracing::{debug, warn};
use crate::error::{Error, Result};
use crate::distr::{Histogram, bin_of, categorical};

/// Sparse probability mass over N-dimensional bin tuples. The ordered map keeps
/// iteration (and therefore seeded sampling) reproducible.
pub type BinMass = BTreeMap<Vec<usize>, f64>;

/// Multivariate empirical distribution over a uniform axis-aligned binning of N variables.
/// Each variable i is partitioned into num_bins[i] bins of width bin_widths[i] starting at
/// min_vals[i]. Only occupied bin tuples are stored. Masses are non-negative and sum to one.
/// Histograms derived by marginalization or conditioning are independent copies.
#[derive(Debug, Clone)]
pub struct JointHistogram {

    mins : Vec<f64>,

    maxs : Vec<f64>,

    widths : Vec<f64>,

    n_bins : Vec<usize>,

    distr : BinMass,

    // Occupied tuples in map order, and a sampler over their masses
    tuples : Vec<Vec<usize>>,

    picker : WeightedIndex<f64>
}

impl PartialEq for JointHistogram {

    fn eq(&self, other : &Self) -> bool {
        self.mins == other.mins &&
            self.maxs == other.maxs &&
            self.widths == other.widths &&
            self.n_bins == other.n_bins &&
            self.distr == other.distr
    }

}

/// Validates a full binning schema and returns the per-variable bin widths.
fn bin_widths(mins : &[f64], maxs : &[f64], n_bins : &[usize]) -> Result<Vec<f64>> {
    if mins.len() != maxs.len() || mins.len() != n_bins.len() {
        return Err(Error::ShapeMismatch(format!(
            "Schema lengths differ (mins: {}, maxs: {}, bins: {})",
            mins.len(),
            maxs.len(),
            n_bins.len()
        )));
    }
    let mut widths = Vec::with_capacity(mins.len());
    for (v, ((min, max), n)) in mins.iter().zip(maxs.iter()).zip(n_bins.iter()).enumerate() {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(Error::InvalidSchema(format!("Variable {} requires min < max (got [{}, {}])", v, min, max)));
        }
        if *n == 0 {
            return Err(Error::InvalidSchema(format!("Variable {} requires at least one bin", v)));
        }
        widths.push((max - min) / *n as f64);
    }
    Ok(widths)
}

fn check_len<T>(vals : &[T], n_vars : usize, what : &str) -> Result<()> {
    if vals.len() != n_vars {
        return Err(Error::ShapeMismatch(format!("Expected {} {} (one per variable), got {}", n_vars, what, vals.len())));
    }
    Ok(())
}

fn normalize(distr : &mut BinMass) {
    let total : f64 = distr.values().sum();
    for p in distr.values_mut() {
        *p /= total;
    }
}

impl JointHistogram {

    /// Bins the informed samples (one slice per variable, all of the same length) and
    /// normalizes the counts into probabilities. Finite samples outside a variable range are
    /// accumulated at its boundary bins; non-finite samples are rejected.
    pub fn new<S>(data : &[S], mins : &[f64], maxs : &[f64], n_bins : &[usize]) -> Result<Self>
    where
        S : AsRef<[f64]>
    {
        if data.is_empty() {
            return Err(Error::ShapeMismatch("Joint histogram requires at least one variable".into()));
        }
        let n_vars = data.len();
        let n = data[0].as_ref().len();
        if let Some((v, d)) = data.iter().enumerate().find(|(_, d)| d.as_ref().len() != n ) {
            return Err(Error::ShapeMismatch(format!(
                "Variable {} holds {} samples, but variable 0 holds {}",
                v,
                d.as_ref().len(),
                n
            )));
        }
        if n == 0 {
            return Err(Error::ShapeMismatch("Joint histogram requires at least one sample".into()));
        }
        check_len(mins, n_vars, "minimum values")?;
        check_len(maxs, n_vars, "maximum values")?;
        check_len(n_bins, n_vars, "bin counts")?;
        let widths = bin_widths(mins, maxs, n_bins)?;
        for (v, d) in data.iter().enumerate() {
            if let Some(val) = d.as_ref().iter().find(|x| !x.is_finite() ) {
                return Err(Error::InvalidParameter(format!("Variable {} holds a non-finite sample ({})", v, val)));
            }
        }

        let mut distr = BinMass::new();
        let mut clamped = 0;
        for e in 0..n {
            let mut key = Vec::with_capacity(n_vars);
            for v in 0..n_vars {
                let val = data[v].as_ref()[e];
                if !(val >= mins[v] && val <= maxs[v]) {
                    clamped += 1;
                }
                key.push(bin_of(val, mins[v], widths[v], n_bins[v]));
            }
            *distr.entry(key).or_insert(0.0) += 1.0;
        }
        if clamped > 0 {
            warn!(clamped, "sample values outside the binning range were assigned to boundary bins");
        }
        normalize(&mut distr);
        debug!(vars = n_vars, samples = n, occupied = distr.len(), "joint histogram built");
        Self::assemble(mins.to_vec(), maxs.to_vec(), widths, n_bins.to_vec(), distr)
    }

    /// Builds the histogram from an explicit bin-tuple to mass mapping, which is normalized.
    pub fn from_distr(mins : &[f64], maxs : &[f64], n_bins : &[usize], distr : BinMass) -> Result<Self> {
        let widths = bin_widths(mins, maxs, n_bins)?;
        if mins.is_empty() {
            return Err(Error::ShapeMismatch("Joint histogram requires at least one variable".into()));
        }
        for (key, p) in distr.iter() {
            check_len(key, mins.len(), "bin indices")?;
            if key.iter().zip(n_bins.iter()).any(|(b, n)| b >= n ) {
                return Err(Error::InvalidSchema(format!("Bin tuple {:?} outside schema {:?}", key, n_bins)));
            }
            if !p.is_finite() || *p < 0.0 {
                return Err(Error::InvalidParameter(format!("Bin mass must be finite and >= 0 (got {})", p)));
            }
        }
        let mut distr : BinMass = distr.into_iter().filter(|(_, p)| *p > 0.0 ).collect();
        if distr.is_empty() {
            return Err(Error::InvalidParameter("Joint histogram masses must have a positive sum".into()));
        }
        normalize(&mut distr);
        Self::assemble(mins.to_vec(), maxs.to_vec(), widths, n_bins.to_vec(), distr)
    }

    fn assemble(mins : Vec<f64>, maxs : Vec<f64>, widths : Vec<f64>, n_bins : Vec<usize>, distr : BinMass) -> Result<Self> {
        let tuples : Vec<Vec<usize>> = distr.keys().cloned().collect();
        let picker = categorical(distr.values().cloned())?;
        Ok(Self { mins, maxs, widths, n_bins, distr, tuples, picker })
    }

    pub fn num_vars(&self) -> usize {
        self.mins.len()
    }

    /// Reduces the histogram to its first n variables, summing out the others.
    /// Growing the variable count is rejected, since the new axes have no binning.
    pub fn set_num_vars(&mut self, n : usize) -> Result<()> {
        if n == 0 || n > self.num_vars() {
            return Err(Error::ShapeMismatch(format!("Cannot set {} variables on a histogram of {}", n, self.num_vars())));
        }
        if n < self.num_vars() {
            let keep : Vec<usize> = (0..n).collect();
            *self = self.marginalization(&keep)?;
        }
        Ok(())
    }

    pub fn min_vals(&self) -> &[f64] {
        &self.mins
    }

    /// Replaces the lower range limits, keeping bin counts (widths are recomputed).
    pub fn set_min_vals(&mut self, mins : &[f64]) -> Result<()> {
        check_len(mins, self.num_vars(), "minimum values")?;
        let widths = bin_widths(mins, &self.maxs, &self.n_bins)?;
        self.mins = mins.to_vec();
        self.widths = widths;
        Ok(())
    }

    pub fn max_vals(&self) -> &[f64] {
        &self.maxs
    }

    /// Replaces the upper range limits, keeping bin counts (widths are recomputed).
    pub fn set_max_vals(&mut self, maxs : &[f64]) -> Result<()> {
        check_len(maxs, self.num_vars(), "maximum values")?;
        let widths = bin_widths(&self.mins, maxs, &self.n_bins)?;
        self.maxs = maxs.to_vec();
        self.widths = widths;
        Ok(())
    }

    pub fn bin_widths(&self) -> &[f64] {
        &self.widths
    }

    /// Replaces bin widths, keeping minimum values and bin counts (maximum values are recomputed).
    pub fn set_bin_widths(&mut self, widths : &[f64]) -> Result<()> {
        check_len(widths, self.num_vars(), "bin widths")?;
        if let Some(w) = widths.iter().find(|w| !(w.is_finite() && **w > 0.0) ) {
            return Err(Error::InvalidSchema(format!("Bin width must be positive (got {})", w)));
        }
        let maxs : Vec<f64> = self.mins.iter().zip(widths.iter()).zip(self.n_bins.iter())
            .map(|((min, w), n)| min + w * *n as f64 )
            .collect();
        bin_widths(&self.mins, &maxs, &self.n_bins)?;
        self.maxs = maxs;
        self.widths = widths.to_vec();
        Ok(())
    }

    pub fn num_bins(&self) -> &[usize] {
        &self.n_bins
    }

    /// Replaces bin counts, keeping the value ranges (widths are recomputed). Bin tuples
    /// keep their masses under the new schema, so a count that would leave an occupied
    /// bin outside the schema is rejected. Zero or negative counts are rejected. On
    /// failure the schema is left untouched.
    pub fn set_num_bins(&mut self, n_bins : &[i64]) -> Result<()> {
        check_len(n_bins, self.num_vars(), "bin counts")?;
        if let Some(n) = n_bins.iter().find(|n| **n <= 0 ) {
            return Err(Error::InvalidSchema(format!("Bin count must be positive (got {})", n)));
        }
        let n_bins : Vec<usize> = n_bins.iter().map(|n| *n as usize ).collect();
        if let Some(key) = self.distr.keys().find(|k| k.iter().zip(n_bins.iter()).any(|(b, n)| b >= n ) ) {
            return Err(Error::InvalidSchema(format!("Occupied bin {:?} falls outside {:?}", key, n_bins)));
        }
        let widths = bin_widths(&self.mins, &self.maxs, &n_bins)?;
        self.n_bins = n_bins;
        self.widths = widths;
        Ok(())
    }

    pub fn distr(&self) -> &BinMass {
        &self.distr
    }

    /// Probability mass of the informed bin tuple (zero for unoccupied or invalid tuples).
    pub fn prob(&self, bins : &[usize]) -> f64 {
        self.distr.get(bins).cloned().unwrap_or(0.0)
    }

    fn center(&self, var : usize, bin : usize) -> f64 {
        self.mins[var] + self.widths[var] * (bin as f64 + 0.5)
    }

    /// Per-variable expectation of the bin centers under the joint mass.
    pub fn joint_mean(&self) -> Vec<f64> {
        let mut mean = vec![0.0; self.num_vars()];
        for (key, p) in self.distr.iter() {
            for (v, b) in key.iter().enumerate() {
                mean[v] += p * self.center(v, *b);
            }
        }
        mean
    }

    /// Draws a bin tuple according to its mass, then one value per variable uniformly
    /// within the bin extent.
    pub fn joint_sample<R>(&self, rng : &mut R) -> Vec<f64>
    where
        R : Rng + ?Sized
    {
        let key = &self.tuples[self.picker.sample(rng)];
        key.iter().enumerate()
            .map(|(v, b)| self.mins[v] + self.widths[v] * (*b as f64 + rng.gen::<f64>()) )
            .collect()
    }

    fn keep_set(&self, keep : &[usize]) -> Result<Vec<usize>> {
        let keep : BTreeSet<usize> = keep.iter().cloned().collect();
        if keep.is_empty() {
            return Err(Error::ShapeMismatch("Marginalization requires at least one kept variable".into()));
        }
        if let Some(v) = keep.iter().find(|v| **v >= self.num_vars() ) {
            return Err(Error::ShapeMismatch(format!("Variable {} outside histogram of {} variables", v, self.num_vars())));
        }
        Ok(keep.into_iter().collect())
    }

    fn project<T : Clone>(vals : &[T], keep : &[usize]) -> Vec<T> {
        keep.iter().map(|v| vals[*v].clone() ).collect()
    }

    /// Sums out every variable not in keep. The result carries the original binning
    /// of the kept variables, in ascending variable order.
    pub fn marginalization(&self, keep : &[usize]) -> Result<JointHistogram> {
        let keep = self.keep_set(keep)?;
        let mut distr = BinMass::new();
        for (key, p) in self.distr.iter() {
            *distr.entry(Self::project(key, &keep)).or_insert(0.0) += p;
        }
        debug!(kept = ?keep, occupied = distr.len(), "joint histogram marginalized");
        Self::assemble(
            Self::project(&self.mins, &keep),
            Self::project(&self.maxs, &keep),
            Self::project(&self.widths, &keep),
            Self::project(&self.n_bins, &keep),
            distr
        )
    }

    /// Univariate marginal of a single variable.
    pub fn marginal(&self, var : usize) -> Result<Histogram> {
        let m = self.marginalization(&[var])?;
        let mut masses = vec![0.0; m.n_bins[0]];
        for (key, p) in m.distr.iter() {
            masses[key[0]] += p;
        }
        Histogram::new(m.mins[0], m.maxs[0], masses)
    }

    /// Distribution of the remaining variables given that variable var falls
    /// in the bin containing value.
    pub fn conditional(&self, var : usize, value : f64) -> Result<JointHistogram> {
        if var >= self.num_vars() {
            return Err(Error::ShapeMismatch(format!("Variable {} outside histogram of {} variables", var, self.num_vars())));
        }
        if self.num_vars() == 1 {
            return Err(Error::Unsupported("Cannot condition a univariate histogram on its only variable".into()));
        }
        if !value.is_finite() {
            return Err(Error::InvalidParameter(format!("Conditioning value must be finite (got {})", value)));
        }
        let bin = bin_of(value, self.mins[var], self.widths[var], self.n_bins[var]);
        let keep : Vec<usize> = (0..self.num_vars()).filter(|v| *v != var ).collect();
        let mut distr = BinMass::new();
        for (key, p) in self.distr.iter().filter(|(k, _)| k[var] == bin ) {
            *distr.entry(Self::project(key, &keep)).or_insert(0.0) += p;
        }
        if distr.is_empty() {
            return Err(Error::Unsupported(format!("No mass at bin {} of variable {}", bin, var)));
        }
        normalize(&mut distr);
        Self::assemble(
            Self::project(&self.mins, &keep),
            Self::project(&self.maxs, &keep),
            Self::project(&self.widths, &keep),
            Self::project(&self.n_bins, &keep),
            distr
        )
    }

}
