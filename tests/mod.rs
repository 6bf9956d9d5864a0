use approx::assert_relative_eq;
use nalgebra::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Distribution as _;
use distfield::Error;
use distfield::array::*;
use distfield::bind::*;
use distfield::config::*;
use distfield::dataset::*;
use distfield::distr::*;
use distfield::grid::*;
use distfield::io;
use distfield::joint::*;
use std::path::PathBuf;

const EPS : f64 = 10E-8;

fn scratch_dir(name : &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("distfield-it-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Vector field on a 10x10x10 unit lattice whose means are linear in the coordinates,
/// written to disk as interleaved raw float arrays.
fn write_linear_field(dir : &PathBuf) -> FieldConfig {
    let (nx, ny, nz) = (10, 10, 10);
    let mut means = Vec::new();
    let mut stds = Vec::new();
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                means.extend([i as f32, 2.0 * j as f32, -(k as f32)].iter());
                stds.extend([0.2 + 0.01 * i as f32, 0.1, 0.25].iter());
            }
        }
    }
    io::save_raw_f32(dir.join("mean.raw"), &means).unwrap();
    io::save_raw_f32(dir.join("std.raw"), &stds).unwrap();
    let cfg_json = r#"{
        "dims" : [10, 10, 10],
        "mean_file" : "mean.raw",
        "std_file" : "std.raw",
        "element" : "gaussian_vector3",
        "seed" : 7
    }"#;
    std::fs::write(dir.join("field.json"), cfg_json).unwrap();
    FieldConfig::load_from_path(dir.join("field.json")).unwrap()
}

#[test]
fn degenerate_gaussian_draws_mean() {
    let mut rng = StdRng::seed_from_u64(1);
    for m in [-3.5, 0.0, 1.0, 1e6].iter() {
        let d = Distribution::Gaussian(Gaussian::new(*m, 0.0).unwrap());
        for _ in 0..1000 {
            assert_eq!(d.sample(&mut rng), *m);
        }
    }
}

#[test]
fn joint_mean_tracks_sample_mean() {
    let n = 1000;
    let x : Vec<f64> = (0..n).map(|i| i as f64 / n as f64 ).collect();
    let y : Vec<f64> = (0..n).map(|i| (i as f64 / n as f64).powi(2) ).collect();
    let hist = JointHistogram::new(&[x.clone(), y.clone()], &[0.0, 0.0], &[1.0, 1.0], &[100, 100]).unwrap();
    let mean = hist.joint_mean();
    let sx = x.iter().sum::<f64>() / n as f64;
    let sy = y.iter().sum::<f64>() / n as f64;
    assert!((mean[0] - sx).abs() <= 0.5 * hist.bin_widths()[0] + EPS);
    assert!((mean[1] - sy).abs() <= 0.5 * hist.bin_widths()[1] + EPS);
    let total : f64 = hist.distr().values().sum();
    assert_relative_eq!(total, 1.0, epsilon = EPS);
}

#[test]
fn marginalization_composes() {
    let a = [0.1, 0.2, 0.8, 0.9, 0.5, 0.3];
    let b = [1.0, 2.0, 3.0, 1.5, 2.5, 3.5];
    let c = [-1.0, 0.0, 1.0, -0.5, 0.5, 0.9];
    let hist = JointHistogram::new(&[&a[..], &b[..], &c[..]], &[0.0, 1.0, -1.0], &[1.0, 4.0, 1.0], &[4, 3, 2]).unwrap();
    let direct = hist.marginalization(&[0]).unwrap();
    let staged = hist.marginalization(&[0, 2]).unwrap().marginalization(&[0]).unwrap();
    assert_eq!(direct.num_bins(), staged.num_bins());
    for (k, p) in direct.distr().iter() {
        assert_relative_eq!(*p, staged.prob(k), epsilon = EPS);
    }
    let reordered = hist.marginalization(&[2, 0]).unwrap();
    assert_eq!(reordered.num_bins(), &[4, 2]);
    assert!(hist.marginalization(&[3]).is_err());
}

#[test]
fn bin_count_changes() {
    let data = [vec![0.1, 0.4, 0.6], vec![0.2, 0.2, 0.9]];
    let mut hist = JointHistogram::new(&data, &[0.0, 0.0], &[1.0, 1.0], &[2, 2]).unwrap();
    let before = hist.clone();
    assert!(hist.set_num_bins(&[0, 2]).is_err());
    assert!(hist.set_num_bins(&[-3, 2]).is_err());
    assert!(hist.set_num_bins(&[1, 2]).is_err());
    assert_eq!(hist, before);
    hist.set_num_bins(&[4, 8]).unwrap();
    assert_eq!(hist.num_bins(), &[4, 8]);
    assert_relative_eq!(hist.bin_widths()[0], 0.25, epsilon = EPS);
    assert_relative_eq!(hist.bin_widths()[1], 0.125, epsilon = EPS);
}

#[test]
fn binding_checks_ranks() {
    let data = [0.1, 0.4, 0.6, 0.2, 0.2, 0.9];
    let n_bins = [2i64, 2];
    let mins = [0.0, 0.0];
    let maxs = [1.0, 1.0];
    let flat = Buffer::vector(&data[..]);
    let hist = HistogramBinding::new(
        &flat,
        &Buffer::vector(&mins[..]),
        &Buffer::vector(&maxs[..]),
        &Buffer::vector(&n_bins[..])
    );
    assert!(hist.is_err());
    let mut hist = HistogramBinding::new(
        &Buffer::new(&data[..], &[2, 3]).unwrap(),
        &Buffer::vector(&mins[..]),
        &Buffer::vector(&maxs[..]),
        &Buffer::vector(&n_bins[..])
    ).unwrap();
    assert_eq!(hist.num_vars(), 2);
    assert_eq!(hist.num_bins(), vec![2, 2]);
    let keep = [1i64];
    let m = hist.marginalization(&Buffer::vector(&keep[..])).unwrap();
    assert_eq!(m.num_vars(), 1);
    let neg = [-1i64];
    assert!(hist.marginalization(&Buffer::vector(&neg[..])).is_err());
    let grid = [0.0, 0.0, 1.0, 1.0];
    assert!(hist.set_min_vals(&Buffer::new(&grid[..], &[2, 2]).unwrap()).is_err());
}

#[test]
fn queries_outside_domain() {
    let dir = scratch_dir("bounds");
    let dataset = write_linear_field(&dir).build_dataset().unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    for p in [
        Vector3::new(-0.5, 4.0, 4.0),
        Vector3::new(4.0, 9.5, 4.0),
        Vector3::new(4.0, 4.0, 100.0),
        Vector3::new(std::f64::NAN, 1.0, 1.0)
    ].iter() {
        match dataset.at_phys_with(p, &mut rng) {
            Err(e) => assert!(e.is_out_of_bounds()),
            Ok(v) => panic!("Expected out of bounds at {:?}, got {}", p, v)
        }
    }
    for p in [Vector3::new(0.5, 0.5, 0.5), Vector3::new(8.9, 4.2, 0.1)].iter() {
        assert!(dataset.at_phys_with(p, &mut rng).is_ok());
    }
    let _ = std::fs::remove_dir_all(&dir);
}

fn mean_and_var(draws : &[Vector3<f64>]) -> (Vector3<f64>, Vector3<f64>) {
    let n = draws.len() as f64;
    let mean = draws.iter().fold(Vector3::zeros(), |acc : Vector3<f64>, d| acc + d ) / n;
    let var = draws.iter().fold(Vector3::zeros(), |acc : Vector3<f64>, d| {
        let e = d - mean;
        acc + e.component_mul(&e)
    }) / (n - 1.0);
    (mean, var)
}

/// Walks x = 0, 0.5, .. 9.5 through the field, drawing from the interpolated
/// distribution (raw mode) and from the interpolation of corner draws (sampled
/// mode). Per-component sample means must agree within three standard errors.
#[test]
fn interpolation_modes_agree_along_path() {
    let dir = scratch_dir("modes");
    let cfg = write_linear_field(&dir);
    let raw = cfg.build_dataset_as(Policy::Raw).unwrap();
    let sampled = cfg.build_dataset_as(Policy::Sampled).unwrap();
    let mut rng = StdRng::seed_from_u64(cfg.seed.unwrap());
    let n = 2000;
    let (y, z) = (4.5, 3.25);
    for step in 0..20 {
        let p = Vector3::new(0.5 * step as f64, y, z);
        if p[0] > 9.0 {
            assert!(raw.at_phys_with(&p, &mut rng).unwrap_err().is_out_of_bounds());
            assert!(sampled.at_phys_with(&p, &mut rng).unwrap_err().is_out_of_bounds());
            continue;
        }
        let v : DistrVector = raw.at_phys_as(&p, &mut rng).unwrap();
        assert_relative_eq!(mean_vector(&v), Vector3::new(p[0], 2.0 * y, -z), epsilon = 1E-5);

        let interp_then_sample : Vec<Vector3<f64>> = (0..n).map(|_| sample_vector(&v, &mut rng) ).collect();
        let sample_then_interp : Vec<Vector3<f64>> = (0..n)
            .map(|_| sampled.at_phys_as::<Vector3<f64>>(&p, &mut rng).unwrap() )
            .collect();
        let (ma, va) = mean_and_var(&interp_then_sample);
        let (mb, vb) = mean_and_var(&sample_then_interp);
        for c in 0..3 {
            let se = ((va[c] + vb[c]) / n as f64).sqrt();
            assert!(
                (ma[c] - mb[c]).abs() <= 3.0 * se,
                "x = {}, component {}: {} vs {} (se {})", p[0], c, ma[c], mb[c], se
            );
        }
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn lattice_queries_and_type_checks() {
    let grid = RegularCartesianGrid::with_dims(2, 2, 2).unwrap();
    let vals : Vec<f64> = (0..8).map(|i| i as f64 ).collect();
    let mut dataset = Dataset::new(Box::new(grid), Box::new(DenseArray::raw(vals))).unwrap();
    assert_eq!(dataset.at_comp(1, 1, 1).unwrap(), Value::Scalar(7.0));
    assert!(matches!(dataset.at_comp(2, 0, 0), Err(Error::LatticeOutOfRange { axis : 0, index : 2, dim : 2 })));
    let centre : f64 = dataset.at_phys_as(&Vector3::new(0.5, 0.5, 0.5), &mut StdRng::seed_from_u64(0)).unwrap();
    assert_relative_eq!(centre, 3.5, epsilon = EPS);
    match dataset.array_mut().set_item(0, Value::Vector(Vector3::zeros())) {
        Err(Error::TypeMismatch{ .. }) => { },
        other => panic!("Expected type mismatch, got {:?}", other)
    }
    let short = DenseArray::raw(vec![0.0; 7]);
    assert!(Dataset::new(Box::new(RegularCartesianGrid::with_dims(2, 2, 2).unwrap()), Box::new(short)).is_err());
}
