//! Integer-factor decimation and interpolation.
//!
//! Both directions use a windowed-sinc lowpass FIR with a Blackman window,
//! applied with linear-phase delay compensation so the output stays
//! time-aligned with the input.
//!
//! Reference: P. P. Vaidyanathan, *Multirate Systems and Filter Banks*, Prentice Hall,
//! 1993, Chapter 4.
//!
//! # Example
//!
//! ```rust
//! use rsao_dsp::resample::{decimate, interpolate};
//!
//! let signal: Vec<f64> = (0..4800).map(|i| (i as f64 * 0.01).sin()).collect();
//! let half = decimate(&signal, 2, 0);
//! assert_eq!(half.len(), 2400);
//! let restored = interpolate(&half, 2, 0);
//! assert_eq!(restored.len(), 4800);
//! ```

use std::f64::consts::PI;

/// Compute windowed-sinc lowpass FIR coefficients.
///
/// `h[n] = sinc(cutoff * (n - M/2)) * w_blackman[n]`, normalized to unity DC
/// gain.
///
/// # Arguments
///
/// * `num_taps` - Number of filter taps. Odd counts give a symmetric Type I filter.
/// * `cutoff` - Normalized cutoff in (0.0, 1.0), where 1.0 is Nyquist.
///
/// Reference: A. V. Oppenheim and R. W. Schafer, *Discrete-Time Signal Processing*,
/// 3rd ed., Prentice Hall, 2009, Section 7.6.
pub fn design_lowpass(num_taps: usize, cutoff: f64) -> Vec<f64> {
    if num_taps == 0 {
        return Vec::new();
    }

    let m = num_taps - 1;
    let mut coeffs: Vec<f64> = (0..num_taps)
        .map(|n| {
            let x = n as f64 - m as f64 / 2.0;
            let sinc = if x.abs() < 1e-12 {
                cutoff
            } else {
                (PI * cutoff * x).sin() / (PI * x)
            };
            let window = if m == 0 {
                1.0
            } else {
                let phase = 2.0 * PI * n as f64 / m as f64;
                0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
            };
            sinc * window
        })
        .collect();

    let sum: f64 = coeffs.iter().sum();
    if sum.abs() > 1e-12 {
        for c in &mut coeffs {
            *c /= sum;
        }
    }

    coeffs
}

/// Apply a linear-phase FIR with `(len - 1) / 2` samples of delay compensation.
fn apply_fir(signal: &[f64], coeffs: &[f64]) -> Vec<f64> {
    if coeffs.is_empty() || signal.is_empty() {
        return signal.to_vec();
    }

    let half_delay = (coeffs.len() - 1) / 2;
    (0..signal.len())
        .map(|i| {
            coeffs
                .iter()
                .enumerate()
                .filter_map(|(k, &c)| {
                    let j = i + k;
                    (j >= half_delay && j - half_delay < signal.len())
                        .then(|| c * signal[j - half_delay])
                })
                .sum()
        })
        .collect()
}

fn default_taps(factor: usize, filter_order: usize) -> usize {
    if filter_order == 0 {
        4 * factor * 10 + 1
    } else {
        filter_order
    }
}

/// Decimate a signal by an integer factor.
///
/// Anti-aliasing lowpass at `0.9 / factor` (normalized), then every
/// `factor`-th sample is kept.
///
/// # Arguments
///
/// * `signal` - Input samples
/// * `factor` - Decimation factor (must be ≥ 1)
/// * `filter_order` - FIR length; `0` selects `40 * factor + 1` taps
///
/// # Returns
///
/// Output of length `ceil(signal.len() / factor)`.
pub fn decimate(signal: &[f64], factor: usize, filter_order: usize) -> Vec<f64> {
    assert!(factor >= 1, "decimation factor must be >= 1");

    if factor == 1 {
        return signal.to_vec();
    }

    let coeffs = design_lowpass(default_taps(factor, filter_order), 0.9 / factor as f64);
    apply_fir(signal, &coeffs)
        .into_iter()
        .step_by(factor)
        .collect()
}

/// Interpolate a signal by an integer factor.
///
/// Zero-stuffs `factor - 1` samples between inputs, lowpass filters at
/// `0.9 / factor` and scales by `factor` to restore unity gain.
///
/// # Arguments
///
/// * `signal` - Input samples at the lower rate
/// * `factor` - Interpolation factor (must be ≥ 1)
/// * `filter_order` - FIR length; `0` selects `40 * factor + 1` taps
///
/// # Returns
///
/// Output of length `signal.len() * factor`.
pub fn interpolate(signal: &[f64], factor: usize, filter_order: usize) -> Vec<f64> {
    assert!(factor >= 1, "interpolation factor must be >= 1");

    if factor == 1 {
        return signal.to_vec();
    }

    let coeffs = design_lowpass(default_taps(factor, filter_order), 0.9 / factor as f64);

    let mut upsampled = vec![0.0; signal.len() * factor];
    for (i, &s) in signal.iter().enumerate() {
        upsampled[i * factor] = s;
    }

    apply_fir(&upsampled, &coeffs)
        .into_iter()
        .map(|x| x * factor as f64)
        .collect()
}
