//! Synthetic FET sweep files.
//!
//! Writes header-less, whitespace-delimited `.dat` files in the column order
//! `No. Temp Mag Isd Vsd Vbg`, the layout the ingest step falls back to when a
//! file carries no header row. Two families are produced:
//!
//! - output sweeps: `Vsd` 0 → max → 0 at each `Vbg` step
//! - transfer sweeps: `Vbg` -max → +max → -max at each `Vsd` step
//!
//! The device is a square-law FET whose threshold shifts between the rising
//! and falling half of every sweep, so the branches show hysteresis.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::AppError;

/// Knobs for [`generate_sweep_files`].
#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub seed: u64,
    /// Samples per sweep (rising and falling half together).
    pub points: usize,
    /// Number of held-constant steps per family.
    pub steps: usize,
    /// Relative Gaussian noise on the current.
    pub noise: f64,
    pub vsd_max: f64,
    pub vbg_max: f64,
    pub device: DeviceModel,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            points: 51,
            steps: 5,
            noise: 0.02,
            vsd_max: 1.0,
            vbg_max: 20.0,
            device: DeviceModel::default(),
        }
    }
}

/// Square-law FET with a softened turn-on.
#[derive(Debug, Clone, Copy)]
pub struct DeviceModel {
    /// Transconductance parameter (A/V^2).
    pub k: f64,
    /// Threshold voltage on the rising half (V).
    pub vth: f64,
    /// Threshold shift on the falling half (V).
    pub hysteresis: f64,
    /// Subthreshold softening width (V).
    pub smoothing: f64,
    /// Leakage floor (A).
    pub i_off: f64,
    pub temperature: f64,
}

impl Default for DeviceModel {
    fn default() -> Self {
        Self {
            k: 2e-7,
            vth: 2.0,
            hysteresis: 1.5,
            smoothing: 0.8,
            i_off: 1e-12,
            temperature: 300.0,
        }
    }
}

impl DeviceModel {
    /// Drain current at `(vsd, vbg)`; `falling` selects the shifted threshold.
    pub fn current(&self, vsd: f64, vbg: f64, falling: bool) -> f64 {
        let vth = if falling { self.vth + self.hysteresis } else { self.vth };
        let vov = softplus(vbg - vth, self.smoothing);
        let v = vsd.abs();
        let on = if v < vov {
            self.k * (vov * v - 0.5 * v * v)
        } else {
            0.5 * self.k * vov * vov
        };
        (on + self.i_off * v).copysign(vsd)
    }
}

fn softplus(x: f64, width: f64) -> f64 {
    let z = x / width;
    // ln(1 + e^z) without overflow for large z.
    width * (z.max(0.0) + (-z.abs()).exp().ln_1p())
}

/// One sweep's values: `min → max → min` over `points` samples.
///
/// The peak appears once; `points` below 3 is rejected by the caller.
pub fn triangle_sweep(min: f64, max: f64, points: usize) -> Vec<f64> {
    let half = (points / 2).max(1) as f64;
    (0..points)
        .map(|i| {
            let up = (i as f64) <= half;
            let t = if up { i as f64 / half } else { (points - 1 - i) as f64 / half };
            min + (max - min) * t.min(1.0)
        })
        .collect()
}

/// Held-constant values for `steps` steps, evenly spaced over `[lo, hi]`.
fn step_values(lo: f64, hi: f64, steps: usize) -> Vec<f64> {
    if steps == 1 {
        return vec![(lo + hi) / 2.0];
    }
    (0..steps)
        .map(|k| lo + (hi - lo) * k as f64 / (steps - 1) as f64)
        .collect()
}

/// Write both sweep families to `dir` and return the created paths.
///
/// Files are named `output_NN.dat` and `transfer_NN.dat`; passing them back in
/// that order reproduces acquisition order.
pub fn generate_sweep_files(dir: &Path, options: &SampleOptions) -> Result<Vec<PathBuf>, AppError> {
    if options.points < 3 {
        return Err(AppError::new(2, "A sweep needs at least 3 points."));
    }
    if options.steps == 0 {
        return Err(AppError::new(2, "Step count must be > 0."));
    }
    if !(options.noise.is_finite() && options.noise >= 0.0) {
        return Err(AppError::new(2, "Noise must be a finite, non-negative number."));
    }
    if !(options.vsd_max > 0.0 && options.vbg_max > 0.0) {
        return Err(AppError::new(2, "Voltage ranges must be positive."));
    }

    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", dir.display())))?;

    let mut rng = StdRng::seed_from_u64(options.seed);
    let normal = Normal::new(0.0, options.noise.max(f64::MIN_POSITIVE))
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut paths = Vec::with_capacity(options.steps * 2);

    // Output family: Vsd swept at each Vbg step.
    let vsd_sweep = triangle_sweep(0.0, options.vsd_max, options.points);
    for (k, vbg) in step_values(-options.vbg_max, options.vbg_max, options.steps)
        .into_iter()
        .enumerate()
    {
        let rows = sweep_rows(&vsd_sweep, |vsd| (vsd, vbg), options, &normal, &mut rng);
        let path = dir.join(format!("output_{:02}.dat", k + 1));
        write_dat(&path, &rows, options.device.temperature)?;
        paths.push(path);
    }

    // Transfer family: Vbg swept at each Vsd step.
    let vbg_sweep = triangle_sweep(-options.vbg_max, options.vbg_max, options.points);
    for k in 0..options.steps {
        let vsd = options.vsd_max * (k + 1) as f64 / options.steps as f64;
        let rows = sweep_rows(&vbg_sweep, |vbg| (vsd, vbg), options, &normal, &mut rng);
        let path = dir.join(format!("transfer_{:02}.dat", k + 1));
        write_dat(&path, &rows, options.device.temperature)?;
        paths.push(path);
    }

    info!("wrote {} synthetic sweep file(s) to {}", paths.len(), dir.display());
    Ok(paths)
}

/// `(isd, vsd, vbg)` rows for one sweep.
fn sweep_rows(
    sweep: &[f64],
    bias: impl Fn(f64) -> (f64, f64),
    options: &SampleOptions,
    normal: &Normal<f64>,
    rng: &mut StdRng,
) -> Vec<(f64, f64, f64)> {
    let peak = sweep.len() / 2;
    sweep
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let (vsd, vbg) = bias(value);
            let ideal = options.device.current(vsd, vbg, i > peak);
            let isd = if options.noise > 0.0 {
                ideal * (1.0 + normal.sample(&mut *rng))
            } else {
                ideal
            };
            (isd, vsd, vbg)
        })
        .collect()
}

fn write_dat(path: &Path, rows: &[(f64, f64, f64)], temperature: f64) -> Result<(), AppError> {
    let wrap = |e: std::io::Error| AppError::new(4, format!("Failed to write '{}': {e}", path.display()));

    let file = File::create(path).map_err(wrap)?;
    let mut out = BufWriter::new(file);
    for (i, (isd, vsd, vbg)) in rows.iter().enumerate() {
        writeln!(out, "{} {temperature:.2} 0.0 {isd:.6e} {vsd:.4} {vbg:.4}", i + 1).map_err(wrap)?;
    }
    out.flush().map_err(wrap)?;
    Ok(())
}
