use distfield::array::{Policy, Value};
use distfield::config::FieldConfig;
use distfield::distr::{self, Variate};
use distfield::io;
use distfield::joint::JointHistogram;
use nalgebra::Vector3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{self, json};
use std::fs::File;
use structopt::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Query uncertain fields and build joint histograms from the command line
#[derive(StructOpt, Debug)]
pub enum DistField {

    /// Evaluates a field along a straight line, printing one JSON record per point.
    Probe {
        config : String,

        #[structopt(long, parse(try_from_str = parse_point))]
        from : Vector3<f64>,

        #[structopt(long, parse(try_from_str = parse_point))]
        to : Vector3<f64>,

        #[structopt(long, default_value = "10")]
        steps : usize,

        /// Overrides the configured mode (raw or sampled)
        #[structopt(short, long)]
        mode : Option<String>
    },

    /// Builds a joint histogram from the columns of a CSV sample table.
    Histogram {
        src : String,

        #[structopt(short, long, default_value = "16")]
        bins : usize,

        /// Comma-separated variables kept in the printed marginal
        #[structopt(short, long)]
        keep : Option<String>,

        #[structopt(long)]
        seed : Option<u64>
    }

}

fn parse_point(s : &str) -> Result<Vector3<f64>, String> {
    let vals = s.split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("Invalid coordinate '{}': {}", v, e)) )
        .collect::<Result<Vec<_>, _>>()?;
    if vals.len() != 3 {
        return Err(format!("Expected three coordinates, got {}", vals.len()));
    }
    Ok(Vector3::new(vals[0], vals[1], vals[2]))
}

fn parse_mode(s : &str) -> Result<Policy, String> {
    match s {
        "raw" => Ok(Policy::Raw),
        "sampled" => Ok(Policy::Sampled),
        m => Err(format!("Unknown mode: {}", m))
    }
}

fn rng_from(seed : Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy()
    }
}

fn probe(config : &str, from : Vector3<f64>, to : Vector3<f64>, steps : usize, mode : &Option<String>) -> Result<(), String> {
    let cfg = FieldConfig::load_from_path(config).map_err(|e| format!("{}", e) )?;
    let mode = match mode {
        Some(m) => parse_mode(m)?,
        None => cfg.mode
    };
    let dataset = cfg.build_dataset_as(mode).map_err(|e| format!("{}", e) )?;
    let mut rng = rng_from(cfg.seed);
    let steps = steps.max(1);
    for s in 0..=steps {
        let t = s as f64 / steps as f64;
        let point = from + (to - from) * t;
        let record = match dataset.at_phys_with(&point, &mut rng) {
            Ok(value) => {
                let draw = match &value {
                    Value::Distr(d) => json!(rand_distr::Distribution::sample(d, &mut rng)),
                    Value::DistrVector(v) => json!(distr::sample_vector(v, &mut rng).as_slice()),
                    _ => serde_json::Value::Null
                };
                json!({ "point" : point.as_slice(), "status" : "success", "value" : value, "draw" : draw })
            },
            Err(e) if e.is_out_of_bounds() => {
                json!({ "point" : point.as_slice(), "status" : "out_of_bounds" })
            },
            Err(e) => return Err(format!("{}", e))
        };
        println!("{}", record);
    }
    Ok(())
}

fn histogram(src : &str, bins : usize, keep : &Option<String>, seed : Option<u64>) -> Result<(), String> {
    let f = File::open(src).map_err(|e| format!("Error opening table: {}", e) )?;
    let (header, cols) = io::load_csv_columns(f).map_err(|e| format!("{}", e) )?;
    let mut mins = Vec::new();
    let mut maxs = Vec::new();
    for c in cols.iter() {
        let (lo, hi) = c.iter().fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)) );
        if lo < hi {
            mins.push(lo);
            maxs.push(hi);
        } else {
            warn!(value = lo, "constant column centered in a unit range");
            mins.push(lo - 0.5);
            maxs.push(lo + 0.5);
        }
    }
    let n_bins = vec![bins; cols.len()];
    let hist = JointHistogram::new(&cols, &mins, &maxs, &n_bins).map_err(|e| format!("{}", e) )?;
    info!(vars = hist.num_vars(), occupied = hist.distr().len(), "histogram built");
    let mut rng = rng_from(seed);
    let mut out = json!({
        "variables" : header,
        "joint_mean" : hist.joint_mean(),
        "joint_sample" : hist.joint_sample(&mut rng)
    });
    if let Some(keep) = keep {
        let keep = keep.split(',')
            .map(|v| v.trim().parse::<usize>().map_err(|e| format!("Invalid variable '{}': {}", v, e)) )
            .collect::<Result<Vec<_>, _>>()?;
        let m = hist.marginalization(&keep).map_err(|e| format!("{}", e) )?;
        let marginals = (0..m.num_vars()).map(|v| {
            m.marginal(v).map(|h| json!({ "mean" : h.mean(), "var" : h.var(), "masses" : h.masses() }) )
        }).collect::<Result<Vec<_>, _>>().map_err(|e| format!("{}", e) )?;
        out["marginal"] = json!({ "joint_mean" : m.joint_mean(), "variables" : marginals });
    }
    println!("{}", serde_json::to_string_pretty(&out).map_err(|e| format!("{}", e) )?);
    Ok(())
}

fn main() -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info") );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    let cmd = DistField::from_args();
    match &cmd {
        DistField::Probe { config, from, to, steps, mode } => probe(config, *from, *to, *steps, mode),
        DistField::Histogram { src, bins, keep, seed } => histogram(src, *bins, keep, *seed)
    }
}
