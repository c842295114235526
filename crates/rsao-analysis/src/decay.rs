//! Schroeder energy decay analysis.
//!
//! - [`energy_decay_curve`] - backward-integrated energy, linear and in dB
//! - [`reverberation_time`] - linear fit over a dB range, extrapolated to -60 dB
//! - [`fit_exponential`] - Levenberg-Marquardt fit of `A * exp(k * t)`
//!
//! Reference: M. R. Schroeder, "New Method of Measuring Reverberation Time",
//! JASA 37(3), 1965.

use crate::error::{Error, Result};

/// Added to every integrated energy sample so the dB curve stays finite.
const EDC_FLOOR: f64 = 1e-250;

/// Reverberation time is the time to decay by this many dB.
const RT_DECAY_DB: f64 = -60.0;

/// Backward-integrated energy of an impulse response.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyDecay {
    /// Integrated energy normalized to 1 at the start.
    pub linear: Vec<f64>,
    /// The same curve in dB (0 dB at the start).
    pub db: Vec<f64>,
}

/// Compute the Schroeder energy decay curve.
///
/// Both curves are monotonically non-increasing.
pub fn energy_decay_curve(ir: &[f64]) -> EnergyDecay {
    if ir.is_empty() {
        return EnergyDecay {
            linear: Vec::new(),
            db: Vec::new(),
        };
    }

    // Reverse cumulative sum (Schroeder integration)
    let mut edc = Vec::with_capacity(ir.len());
    let mut sum = 0.0f64;
    for &x in ir.iter().rev() {
        sum += x * x;
        edc.push(sum + EDC_FLOOR);
    }
    edc.reverse();

    let max_energy = edc.iter().copied().fold(f64::MIN_POSITIVE, f64::max);
    let linear: Vec<f64> = edc.iter().map(|e| e / max_energy).collect();
    let db = linear.iter().map(|e| 10.0 * e.log10()).collect();
    EnergyDecay { linear, db }
}

/// Least-squares line through `values` against their index: `(slope, intercept)`.
fn linear_regression(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    let mut sum_xy = 0.0f64;
    let mut sum_xx = 0.0f64;
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;
    (slope, intercept)
}

/// Reverberation time in seconds from a dB decay curve.
///
/// Fits a line to the curve from the first sample at or below `start_db` up to
/// (not including) the first sample at or below `end_db`, then extrapolates to
/// -60 dB. The extrapolated crossing is truncated to a whole sample.
pub fn reverberation_time(
    edc_db: &[f64],
    start_db: f64,
    end_db: f64,
    sample_rate: f64,
) -> Result<f64> {
    let start = edc_db.iter().position(|&e| e <= start_db);
    let end = edc_db.iter().position(|&e| e <= end_db);

    match (start, end) {
        (Some(s), Some(e)) if e >= s + 2 => {
            let (slope, intercept) = linear_regression(&edc_db[s..e]);
            if slope.is_nan() || slope >= 0.0 {
                return Err(Error::degenerate(format!(
                    "decay curve does not fall between {start_db} and {end_db} dB"
                )));
            }
            let y0 = intercept - slope * s as f64;
            let crossing = ((RT_DECAY_DB - y0) / slope).trunc();
            Ok(crossing / sample_rate)
        }
        _ => Err(Error::degenerate(format!(
            "decay curve never spans {start_db} to {end_db} dB"
        ))),
    }
}

/// Result of [`fit_exponential`]: `curve[t] ≈ amplitude * exp(rate * t)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialFit {
    /// Value at `t = 0`.
    pub amplitude: f64,
    /// Exponent per sample.
    pub rate: f64,
    /// Levenberg-Marquardt iterations used.
    pub iterations: usize,
}

const LM_MAX_ITERATIONS: usize = 200;
const LM_INITIAL_DAMPING: f64 = 1e-3;
const LM_MAX_DAMPING: f64 = 1e12;
const LM_TOLERANCE: f64 = 1e-10;

/// Sum of squared residuals of `amplitude * exp(rate * t)` against `curve`.
fn exponential_cost(curve: &[f64], amplitude: f64, rate: f64) -> f64 {
    curve
        .iter()
        .enumerate()
        .map(|(t, &y)| {
            let r = amplitude * (rate * t as f64).exp() - y;
            r * r
        })
        .sum()
}

/// Log-linear starting point for the exponential fit.
fn initial_guess(curve: &[f64]) -> (f64, f64) {
    let logs: Vec<f64> = curve.iter().map(|&y| y.ln()).collect();
    if curve.iter().all(|&y| y > 0.0) {
        let (slope, intercept) = linear_regression(&logs);
        if slope.is_finite() && intercept.is_finite() {
            return (intercept.exp(), slope);
        }
    }
    (curve[0], -0.5)
}

/// Fit `amplitude * exp(rate * t)`, with `t` in samples, to `curve` by
/// damped Gauss-Newton (Levenberg-Marquardt) least squares.
///
/// Returns `None` when the curve has fewer than two points, holds non-finite
/// values, no step ever improves on the log-linear starting point, or the
/// iteration does not settle.
pub fn fit_exponential(curve: &[f64]) -> Option<ExponentialFit> {
    if curve.len() < 2 || curve.iter().any(|y| !y.is_finite()) {
        return None;
    }
    let (amplitude, rate) = initial_guess(curve);
    refine(curve, amplitude, rate)
}

fn refine(curve: &[f64], mut amplitude: f64, mut rate: f64) -> Option<ExponentialFit> {
    let negligible = LM_TOLERANCE * LM_TOLERANCE * curve.iter().map(|y| y * y).sum::<f64>();
    let mut cost = exponential_cost(curve, amplitude, rate);
    let mut damping = LM_INITIAL_DAMPING;
    let mut accepted = false;

    for iteration in 1..=LM_MAX_ITERATIONS {
        if !cost.is_finite() {
            return None;
        }
        if cost <= negligible {
            return Some(ExponentialFit {
                amplitude,
                rate,
                iterations: iteration - 1,
            });
        }

        // Normal equations J^T J and J^T r for the two parameters
        let (mut jaa, mut jak, mut jkk, mut ga, mut gk) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (t, &y) in curve.iter().enumerate() {
            let t = t as f64;
            let e = (rate * t).exp();
            let da = e;
            let dk = amplitude * t * e;
            let r = amplitude * e - y;
            jaa += da * da;
            jak += da * dk;
            jkk += dk * dk;
            ga += da * r;
            gk += dk * r;
        }

        loop {
            let (maa, mkk) = (jaa * (1.0 + damping), jkk * (1.0 + damping));
            let det = maa * mkk - jak * jak;
            if det == 0.0 || !det.is_finite() {
                damping *= 10.0;
            } else {
                let step_a = -(mkk * ga - jak * gk) / det;
                let step_k = -(maa * gk - jak * ga) / det;
                let trial_cost = exponential_cost(curve, amplitude + step_a, rate + step_k);
                if trial_cost.is_finite() && trial_cost < cost {
                    amplitude += step_a;
                    rate += step_k;
                    accepted = true;
                    let improvement = cost - trial_cost;
                    cost = trial_cost;
                    damping = (damping / 10.0).max(f64::EPSILON);
                    let small_step = step_a.abs()
                        <= LM_TOLERANCE * (amplitude.abs() + LM_TOLERANCE)
                        && step_k.abs() <= LM_TOLERANCE * (rate.abs() + LM_TOLERANCE);
                    if improvement <= LM_TOLERANCE * cost || small_step {
                        return Some(ExponentialFit {
                            amplitude,
                            rate,
                            iterations: iteration,
                        });
                    }
                    break;
                }
                damping *= 10.0;
            }
            if damping > LM_MAX_DAMPING {
                // no downhill step left at machine precision
                return accepted.then_some(ExponentialFit {
                    amplitude,
                    rate,
                    iterations: iteration,
                });
            }
        }
    }

    None
}
