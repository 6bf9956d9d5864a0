use nalgebra::Vector3;
use serde::{Serialize, Deserialize};
use serde_json;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use crate::array::{DenseArray, Policy, SharedArray};
use crate::dataset::Dataset;
use crate::distr::CombinePolicy;
use crate::error::Result;
use crate::grid::RegularCartesianGrid;
use crate::io;

/// Distribution family stored at each grid sample by the raw-array loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Gaussian,
    GaussianVector3
}

fn default_origin() -> [f64; 3] {
    [0.0, 0.0, 0.0]
}

fn default_spacing() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

/// Description of an uncertain field stored as a pair of flat mean/stddev files.
/// Relative file paths are resolved against the directory of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {

    pub dims : [usize; 3],

    #[serde(default = "default_origin")]
    pub origin : [f64; 3],

    #[serde(default = "default_spacing")]
    pub spacing : [f64; 3],

    pub mean_file : PathBuf,

    pub std_file : PathBuf,

    pub element : ElementKind,

    #[serde(default)]
    pub mode : Policy,

    #[serde(default)]
    pub policy : CombinePolicy,

    #[serde(default)]
    pub seed : Option<u64>
}

impl FieldConfig {

    pub fn load_from_path<P>(path : P) -> Result<Self>
    where
        P : AsRef<Path>
    {
        let f = File::open(path.as_ref())?;
        let mut cfg = Self::load(f)?;
        if let Some(dir) = path.as_ref().parent() {
            cfg.mean_file = dir.join(&cfg.mean_file);
            cfg.std_file = dir.join(&cfg.std_file);
        }
        Ok(cfg)
    }

    pub fn load<R>(mut reader : R) -> Result<Self>
    where
        R : Read
    {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let cfg : FieldConfig = serde_json::from_str(&content[..])?;
        Ok(cfg)
    }

    pub fn save_to_path<P>(&self, path : P) -> Result<()>
    where
        P : AsRef<Path>
    {
        let file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
        self.save(file)
    }

    pub fn save<W>(&self, mut writer : W) -> Result<()>
    where
        W : Write
    {
        let content = serde_json::to_string_pretty(&self)?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }

    pub fn grid(&self) -> Result<RegularCartesianGrid> {
        RegularCartesianGrid::new(
            self.dims,
            Vector3::from(self.origin),
            Vector3::from(self.spacing)
        )
    }

    /// Loads the raw arrays and binds them to the configured grid, with the
    /// configured element resolution mode.
    pub fn build_dataset(&self) -> Result<Dataset> {
        self.build_dataset_as(self.mode)
    }

    pub fn build_dataset_as(&self, mode : Policy) -> Result<Dataset> {
        let grid = self.grid()?;
        let n : usize = self.dims.iter().product();
        info!(mean = %self.mean_file.display(), std = %self.std_file.display(), n, ?mode, "loading field");
        let dataset = match self.element {
            ElementKind::Gaussian => {
                let data = SharedArray::new(io::load_gaussian_raw_array(&self.mean_file, &self.std_file, n)?);
                Dataset::new(Box::new(grid), Box::new(DenseArray::new(data, mode)))?
            },
            ElementKind::GaussianVector3 => {
                let data = SharedArray::new(io::load_vec3_gaussian_raw_array(&self.mean_file, &self.std_file, n)?);
                Dataset::new(Box::new(grid), Box::new(DenseArray::new(data, mode)))?
            }
        };
        Ok(dataset.with_policy(self.policy))
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn defaults_are_filled() {
        let json = r#"{
            "dims": [4, 4, 4],
            "mean_file": "mean.raw",
            "std_file": "std.raw",
            "element": "gaussian_vector3"
        }"#;
        let cfg = FieldConfig::load(json.as_bytes()).unwrap();
        assert_eq!(cfg.spacing, [1.0, 1.0, 1.0]);
        assert_eq!(cfg.mode, Policy::Raw);
        assert_eq!(cfg.policy, CombinePolicy::MomentMatch);
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn policy_from_json() {
        let json = r#"{
            "dims": [2, 2, 2],
            "mean_file": "m",
            "std_file": "s",
            "element": "gaussian",
            "mode": "sampled",
            "policy": { "kind": "resample", "samples": 100, "bins": 8 },
            "seed": 3
        }"#;
        let cfg = FieldConfig::load(json.as_bytes()).unwrap();
        assert_eq!(cfg.mode, Policy::Sampled);
        assert_eq!(cfg.policy, CombinePolicy::Resample { samples : 100, bins : 8 });
        let mut out = Vec::new();
        cfg.save(&mut out).unwrap();
        assert_eq!(FieldConfig::load(&out[..]).unwrap(), cfg);
    }

}
