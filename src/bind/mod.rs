use rand::Rng;
use crate::error::{Error, Result};
use crate::joint::JointHistogram;

/// Borrowed numeric buffer with an explicit shape, as handed over by scripting or
/// visualization adapters. Data is row-major.
#[derive(Debug, Clone)]
pub struct Buffer<'a, T> {

    data : &'a [T],

    shape : Vec<usize>
}

impl<'a, T> Buffer<'a, T> {

    pub fn new(data : &'a [T], shape : &[usize]) -> Result<Self> {
        let n : usize = shape.iter().product();
        if n != data.len() {
            return Err(Error::ShapeMismatch(format!("Shape {:?} does not describe {} values", shape, data.len())));
        }
        Ok(Self { data, shape : shape.to_vec() })
    }

    /// One-dimensional buffer over the whole slice.
    pub fn vector(data : &'a [T]) -> Self {
        Self { data, shape : vec![data.len()] }
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &'a [T] {
        self.data
    }

    fn expect_rank(&self, rank : usize, what : &str) -> Result<()> {
        if self.ndim() != rank {
            return Err(Error::ShapeMismatch(format!(
                "Number of dimensions for the {} array must be {} (got {})",
                what,
                rank,
                self.ndim()
            )));
        }
        Ok(())
    }

}

/// Rank-validating front of a JointHistogram. Every buffer is checked before the
/// histogram is constructed or modified.
#[derive(Debug, Clone)]
pub struct HistogramBinding {
    hist : JointHistogram
}

fn bin_counts(n_bins : &Buffer<'_, i64>) -> Result<Vec<usize>> {
    n_bins.expect_rank(1, "bin count")?;
    n_bins.data().iter().map(|n| {
        if *n <= 0 {
            Err(Error::InvalidSchema(format!("Bin count must be positive (got {})", n)))
        } else {
            Ok(*n as usize)
        }
    }).collect()
}

impl HistogramBinding {

    /// data must be two-dimensional: variables over rows, elements over columns.
    pub fn new(
        data : &Buffer<'_, f64>,
        mins : &Buffer<'_, f64>,
        maxs : &Buffer<'_, f64>,
        n_bins : &Buffer<'_, i64>
    ) -> Result<Self> {
        data.expect_rank(2, "data")?;
        mins.expect_rank(1, "mins")?;
        maxs.expect_rank(1, "maxs")?;
        let n_bins = bin_counts(n_bins)?;
        let n_elems = data.shape()[1];
        let vars : Vec<&[f64]> = if n_elems == 0 {
            vec![&[][..]; data.shape()[0]]
        } else {
            data.data().chunks(n_elems).collect()
        };
        let hist = JointHistogram::new(&vars, mins.data(), maxs.data(), &n_bins)?;
        Ok(Self { hist })
    }

    pub fn histogram(&self) -> &JointHistogram {
        &self.hist
    }

    pub fn into_inner(self) -> JointHistogram {
        self.hist
    }

    pub fn set_min_vals(&mut self, mins : &Buffer<'_, f64>) -> Result<()> {
        mins.expect_rank(1, "mins")?;
        self.hist.set_min_vals(mins.data())
    }

    pub fn min_vals(&self) -> Vec<f64> {
        self.hist.min_vals().to_vec()
    }

    pub fn set_max_vals(&mut self, maxs : &Buffer<'_, f64>) -> Result<()> {
        maxs.expect_rank(1, "maxs")?;
        self.hist.set_max_vals(maxs.data())
    }

    pub fn max_vals(&self) -> Vec<f64> {
        self.hist.max_vals().to_vec()
    }

    pub fn set_bin_widths(&mut self, widths : &Buffer<'_, f64>) -> Result<()> {
        widths.expect_rank(1, "bin width")?;
        self.hist.set_bin_widths(widths.data())
    }

    pub fn bin_widths(&self) -> Vec<f64> {
        self.hist.bin_widths().to_vec()
    }

    pub fn set_num_bins(&mut self, n_bins : &Buffer<'_, i64>) -> Result<()> {
        n_bins.expect_rank(1, "bin count")?;
        self.hist.set_num_bins(n_bins.data())
    }

    pub fn num_bins(&self) -> Vec<i64> {
        self.hist.num_bins().iter().map(|n| *n as i64 ).collect()
    }

    pub fn set_num_vars(&mut self, n : i64) -> Result<()> {
        if n <= 0 {
            return Err(Error::ShapeMismatch(format!("Variable count must be positive (got {})", n)));
        }
        self.hist.set_num_vars(n as usize)
    }

    pub fn num_vars(&self) -> i64 {
        self.hist.num_vars() as i64
    }

    pub fn joint_mean(&self) -> Vec<f64> {
        self.hist.joint_mean()
    }

    pub fn joint_sample<R : Rng + ?Sized>(&self, rng : &mut R) -> Vec<f64> {
        self.hist.joint_sample(rng)
    }

    /// vars lists the variables that are kept.
    pub fn marginalization(&self, vars : &Buffer<'_, i64>) -> Result<HistogramBinding> {
        vars.expect_rank(1, "marginalized variables")?;
        let keep = vars.data().iter().map(|v| {
            if *v < 0 {
                Err(Error::ShapeMismatch(format!("Variable index must be >= 0 (got {})", v)))
            } else {
                Ok(*v as usize)
            }
        }).collect::<Result<Vec<_>>>()?;
        Ok(HistogramBinding { hist : self.hist.marginalization(&keep)? })
    }

}
