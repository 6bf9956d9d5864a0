use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;
use crate::distr::{Distribution, DistrVector, Gaussian};
use crate::error::{Error, Result};

const F32_BYTES : usize = 4;

/// Reads a flat little-endian f32 file holding exactly count values.
pub fn load_raw_f32<P>(path : P, count : usize) -> Result<Vec<f32>>
where
    P : AsRef<Path>
{
    let bytes = fs::read(path.as_ref())?;
    if bytes.len() != count * F32_BYTES {
        return Err(Error::ShapeMismatch(format!(
            "{} holds {} bytes, expected {} values ({} bytes)",
            path.as_ref().display(),
            bytes.len(),
            count,
            count * F32_BYTES
        )));
    }
    let vals : Vec<f32> = bytes.chunks_exact(F32_BYTES)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) )
        .collect();
    debug!(path = %path.as_ref().display(), count, "raw array loaded");
    Ok(vals)
}

/// Writes values as a flat little-endian f32 file, replacing any previous content.
pub fn save_raw_f32<P>(path : P, vals : &[f32]) -> Result<()>
where
    P : AsRef<Path>
{
    let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
    let mut bytes = Vec::with_capacity(vals.len() * F32_BYTES);
    for v in vals.iter() {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    file.write_all(&bytes)?;
    Ok(())
}

fn gaussian(mean : f32, std : f32) -> Result<Distribution> {
    Ok(Gaussian::new(mean as f64, std as f64)?.into())
}

/// Loads n scalar Gaussians from a pair of flat files holding means and standard deviations.
pub fn load_gaussian_raw_array<P, Q>(mean_path : P, std_path : Q, n : usize) -> Result<Vec<Distribution>>
where
    P : AsRef<Path>,
    Q : AsRef<Path>
{
    let means = load_raw_f32(mean_path, n)?;
    let stds = load_raw_f32(std_path, n)?;
    means.iter().zip(stds.iter()).map(|(m, s)| gaussian(*m, *s) ).collect()
}

/// Loads n Gaussian 3-vectors from a pair of flat files, each holding interleaved
/// x, y, z values per element (3n floats).
pub fn load_vec3_gaussian_raw_array<P, Q>(mean_path : P, std_path : Q, n : usize) -> Result<Vec<DistrVector>>
where
    P : AsRef<Path>,
    Q : AsRef<Path>
{
    let means = load_raw_f32(mean_path, 3 * n)?;
    let stds = load_raw_f32(std_path, 3 * n)?;
    means.chunks_exact(3).zip(stds.chunks_exact(3)).map(|(m, s)| {
        Ok([gaussian(m[0], s[0])?, gaussian(m[1], s[1])?, gaussian(m[2], s[2])?])
    }).collect()
}

/// Reads a headed CSV sample table column-wise: one vector per variable.
pub fn load_csv_columns<R>(reader : R) -> Result<(Vec<String>, Vec<Vec<f64>>)>
where
    R : Read
{
    let mut csv_reader = csv::Reader::from_reader(reader);
    let header : Vec<String> = csv_reader.headers()?.iter().map(|h| h.to_string() ).collect();
    let mut cols = vec![Vec::new(); header.len()];
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        for (col, entry) in cols.iter_mut().zip(record.iter()) {
            let v : f64 = entry.trim().parse().map_err(|_| {
                Error::InvalidParameter(format!("Non-numeric entry '{}' at row {}", entry, row + 1))
            })?;
            col.push(v);
        }
    }
    debug!(columns = header.len(), rows = cols.first().map(|c| c.len() ).unwrap_or(0), "sample table loaded");
    Ok((header, cols))
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::distr::Variate;
    use std::env;

    fn tmp(name : &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("distfield-io-{}-{}", std::process::id(), name))
    }

    #[test]
    fn raw_round_trip() {
        let p = tmp("round.raw");
        save_raw_f32(&p, &[1.5, -2.0, 3.25]).unwrap();
        assert_eq!(load_raw_f32(&p, 3).unwrap(), vec![1.5, -2.0, 3.25]);
        assert!(matches!(load_raw_f32(&p, 4), Err(Error::ShapeMismatch(_))));
        fs::remove_file(&p).unwrap();
    }

    #[test]
    fn csv_columns() {
        let content = "a,b\n1.0,2.0\n3.0, 4.5\n";
        let (header, cols) = load_csv_columns(content.as_bytes()).unwrap();
        assert_eq!(header, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cols, vec![vec![1.0, 3.0], vec![2.0, 4.5]]);
        assert!(load_csv_columns("a\nx\n".as_bytes()).is_err());
    }

    #[test]
    fn missing_file() {
        assert!(matches!(load_raw_f32(tmp("missing.raw"), 1), Err(Error::Io(_))));
    }

    #[test]
    fn vector_gaussians() {
        let (pm, ps) = (tmp("vec-mean.raw"), tmp("vec-std.raw"));
        save_raw_f32(&pm, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        save_raw_f32(&ps, &[0.5; 6]).unwrap();
        let v = load_vec3_gaussian_raw_array(&pm, &ps, 2).unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v[1][2].mean(), 5.0);
        assert_eq!(v[0][1].std(), 0.5);
        save_raw_f32(&ps, &[-0.5; 6]).unwrap();
        assert!(matches!(load_vec3_gaussian_raw_array(&pm, &ps, 2), Err(Error::InvalidParameter(_))));
        fs::remove_file(&pm).unwrap();
        fs::remove_file(&ps).unwrap();
    }

}
