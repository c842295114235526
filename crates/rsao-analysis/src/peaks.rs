//! Group-delay onset detection.
//!
//! Reflection onsets are located as negative-going zero crossings of the
//! energy-weighted average group delay, the DYPSA epoch-detection idea applied
//! to room impulse responses:
//!
//! 1. optionally pre-whiten with a linear-prediction matched filter, run at half
//!    the sample rate and realigned to the input's peak
//! 2. compute the windowed group delay of the squared signal and smooth it
//! 3. take its negative-going zero crossings with sub-sample positions
//! 4. drop crossings whose slope is shallower than the pruning threshold
//! 5. rate each survivor by the RMS of the peak-normalized rectified signal
//!    around it
//!
//! Reference: P. A. Naylor et al., "Estimation of Glottal Closure Instants in
//! Voiced Speech Using the DYPSA Algorithm", IEEE Trans. ASLP 15(1), 2007.
//!
//! # Example
//!
//! ```rust
//! use rsao_analysis::peaks::{PeakDetector, PeakDetectorConfig};
//!
//! let mut signal = vec![0.0; 4000];
//! signal[1000] = 1.0;
//!
//! let config = PeakDetectorConfig { use_lpc: false, ..Default::default() };
//! let peaks = PeakDetector::new(48000.0, config).detect(&signal).unwrap();
//! assert_eq!(peaks.onsets(), vec![1000]);
//! assert_eq!(peaks.strength(1000), 1.0);
//! ```

use rsao_dsp::{decimate, hamming, interpolate, lfilter, lpc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Group-delay analysis window length in seconds.
pub const GROUP_DELAY_WINDOW_SECS: f64 = 0.003;

/// Group-delay smoothing window length in seconds.
pub const SMOOTHING_WINDOW_SECS: f64 = 0.00045;

/// Half-width of the strength-rating window as a fraction of the sample rate.
const STRENGTH_HALF_WINDOW_FRACTION: f64 = 1.0 / 2000.0;

/// Floor for the group-delay denominator.
const DENOMINATOR_FLOOR: f64 = 1e-16;

/// Group-delay values below this magnitude are treated as exact zeros.
const ZERO_SNAP: f64 = 1e-5;

/// Settings for [`PeakDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakDetectorConfig {
    /// Crossings with a slope above this value are pruned.
    pub threshold: f64,
    /// Samples past this index are zeroed before analysis; `None` keeps the whole signal.
    pub truncation: Option<usize>,
    /// Pre-whiten with a linear-prediction matched filter.
    pub use_lpc: bool,
    /// Prediction order for the whitening filter.
    pub lpc_order: usize,
}

impl Default for PeakDetectorConfig {
    fn default() -> Self {
        Self {
            threshold: -0.05,
            truncation: None,
            use_lpc: true,
            lpc_order: 12,
        }
    }
}

/// A negative-going zero crossing of the group delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCandidate {
    /// Sub-sample position in the analysed signal.
    pub position: f64,
    /// Group-delay slope at the crossing (always negative).
    pub slope: f64,
}

/// Smoothed group delay and the sample offset that maps its indices back onto
/// the input.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDelay {
    /// Group-delay values.
    pub values: Vec<f64>,
    /// Add to an index into `values` to obtain the input sample position.
    pub offset: f64,
}

/// Onset strengths produced by [`PeakDetector::detect`].
///
/// A dense array the length of the input, zero everywhere except at retained
/// onsets, normalized so the strongest onset is 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakMap {
    strengths: Vec<f64>,
    candidates: Vec<PeakCandidate>,
}

impl PeakMap {
    /// Wrap a precomputed strength array.
    pub fn from_strengths(strengths: Vec<f64>) -> Self {
        Self {
            strengths,
            candidates: Vec::new(),
        }
    }

    /// Dense strength array.
    pub fn strengths(&self) -> &[f64] {
        &self.strengths
    }

    /// Strength at a sample index (zero out of range).
    pub fn strength(&self, index: usize) -> f64 {
        self.strengths.get(index).copied().unwrap_or(0.0)
    }

    /// Indices with nonzero strength, in time order.
    pub fn onsets(&self) -> Vec<usize> {
        self.strengths
            .iter()
            .enumerate()
            .filter(|(_, s)| **s != 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Crossings that survived slope pruning, positioned in the analysed
    /// (pre-shift) signal.
    pub fn candidates(&self) -> &[PeakCandidate] {
        &self.candidates
    }

    /// Length of the analysed signal.
    pub fn len(&self) -> usize {
        self.strengths.len()
    }

    /// True when the analysed signal was empty.
    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
    }
}

/// Group-delay onset detector for a single-channel signal.
#[derive(Debug, Clone)]
pub struct PeakDetector {
    sample_rate: f64,
    config: PeakDetectorConfig,
}

impl PeakDetector {
    /// Create a detector for the given sample rate.
    pub fn new(sample_rate: f64, config: PeakDetectorConfig) -> Self {
        Self {
            sample_rate,
            config,
        }
    }

    /// Detector settings.
    pub fn config(&self) -> &PeakDetectorConfig {
        &self.config
    }

    /// Locate onsets and rate their strength.
    ///
    /// Fails with [`Error::NumericDegeneracy`] for empty or silent input, or
    /// when no crossing survives pruning.
    ///
    /// Onsets closer to either end of the signal than the group-delay and
    /// smoothing half-windows together (82 samples at 48 kHz) are not found.
    pub fn detect(&self, signal: &[f64]) -> Result<PeakMap> {
        let len = signal.len();
        let cutoff = self.config.truncation.unwrap_or(len).min(len);
        let mut truncated = signal.to_vec();
        truncated[cutoff..].fill(0.0);

        let (reference_peak, peak_abs) = argmax_abs(&truncated)
            .ok_or_else(|| Error::degenerate("cannot detect peaks in an empty signal"))?;
        if peak_abs == 0.0 {
            return Err(Error::degenerate("cannot detect peaks in a silent signal"));
        }

        let analysed = if self.config.use_lpc {
            let whitened = self.whiten(&truncated);
            match argmax_abs(&whitened) {
                Some((peak, _)) => shift(&whitened, reference_peak as isize - peak as isize),
                None => whitened,
            }
        } else {
            truncated.clone()
        };

        let group_delay = group_delay(&analysed, self.sample_rate);
        let mut candidates: Vec<PeakCandidate> = negative_zero_crossings(&group_delay.values)
            .into_iter()
            .map(|c| PeakCandidate {
                position: c.position + group_delay.offset,
                ..c
            })
            .collect();
        if let Some(first) = candidates.first_mut() {
            first.position = first.position.max(0.0);
        }

        let mut markers = vec![0.0; len];
        for candidate in &candidates {
            if let Some(marker) = marker_index(candidate.position, len) {
                markers[marker] = 1.0;
            }
        }
        for candidate in candidates
            .iter()
            .filter(|c| c.slope > self.config.threshold)
        {
            if let Some(marker) = marker_index(candidate.position, len) {
                markers[marker] = 0.0;
            }
        }
        candidates.retain(|c| {
            c.slope <= self.config.threshold
                && marker_index(c.position, len).is_some_and(|i| markers[i] != 0.0)
        });
        tracing::debug!(
            crossings = candidates.len(),
            threshold = self.config.threshold,
            "group-delay crossings retained"
        );

        let half = (self.sample_rate * STRENGTH_HALF_WINDOW_FRACTION).round() as usize;
        let mut strengths = vec![0.0; len];
        for (i, _) in markers.iter().enumerate().filter(|(_, m)| **m != 0.0) {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(len);
            let window = &truncated[lo..hi];
            let mean_square = window
                .iter()
                .map(|x| (x.abs() / peak_abs).powi(2))
                .sum::<f64>()
                / window.len() as f64;
            strengths[i] = mean_square.sqrt();
        }

        let (strongest, max_strength) = argmax_abs(&strengths)
            .filter(|(_, s)| *s > 0.0)
            .ok_or_else(|| Error::degenerate("no peak candidates survived slope pruning"))?;
        for s in &mut strengths {
            *s /= max_strength;
        }
        strengths[..strongest].fill(0.0);
        let strengths = shift(&strengths, reference_peak as isize - strongest as isize);

        Ok(PeakMap {
            strengths,
            candidates,
        })
    }

    /// Linear-prediction matched filtering at half rate.
    fn whiten(&self, signal: &[f64]) -> Vec<f64> {
        let decimated = decimate(signal, 2, 0);
        let inverse = lpc(&decimated, self.config.lpc_order);
        let matched: Vec<f64> = inverse.iter().rev().copied().collect();
        let filtered = lfilter(&matched, &decimated);
        let mut restored = interpolate(&filtered, 2, 0);
        restored.resize(signal.len(), 0.0);
        restored
    }
}

/// Energy-weighted average group delay of `signal`, smoothed.
///
/// Returns an empty value list when the signal is shorter than the analysis
/// window.
pub fn group_delay(signal: &[f64], sample_rate: f64) -> GroupDelay {
    let gw = odd_window_len(GROUP_DELAY_WINDOW_SECS * sample_rate);
    let window = hamming(gw);
    let ramp: Vec<f64> = window
        .iter()
        .enumerate()
        .map(|(i, w)| w * ((gw - 1) as f64 - 2.0 * i as f64) / 2.0)
        .collect();

    let energy: Vec<f64> = signal.iter().map(|x| x * x).collect();
    let numerator = lfilter(&ramp, &energy);
    let denominator = lfilter(&window, &energy);
    let mut values: Vec<f64> = numerator
        .iter()
        .zip(&denominator)
        .skip(gw - 1)
        .map(|(&n, &d)| {
            let d = if d.abs() < DENOMINATOR_FLOOR {
                DENOMINATOR_FLOOR
            } else {
                d
            };
            n / d
        })
        .collect();
    let mut offset = (gw - 1) as f64 / 2.0;

    let fw = odd_window_len(SMOOTHING_WINDOW_SECS * sample_rate);
    if fw > 1 {
        let smoothing = hamming(fw);
        let total: f64 = smoothing.iter().sum();
        let smoothing: Vec<f64> = smoothing.iter().map(|w| w / total).collect();
        values = lfilter(&smoothing, &values);
        offset -= (fw - 1) as f64 / 2.0;
    }

    GroupDelay { values, offset }
}

/// Negative-going zero crossings of `values`, with linearly interpolated
/// positions in index units.
pub fn negative_zero_crossings(values: &[f64]) -> Vec<PeakCandidate> {
    let snapped: Vec<f64> = values
        .iter()
        .map(|&v| if v.abs() < ZERO_SNAP { 0.0 } else { v })
        .collect();
    snapped
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0] >= 0.0 && pair[1] < 0.0)
        .map(|(f, pair)| {
            let slope = pair[1] - pair[0];
            PeakCandidate {
                position: f as f64 - pair[0] / slope,
                slope,
            }
        })
        .collect()
}

/// `2 * floor(span / 2) + 1`.
fn odd_window_len(span: f64) -> usize {
    2 * (span / 2.0).floor() as usize + 1
}

fn marker_index(position: f64, len: usize) -> Option<usize> {
    let index = position.round();
    (index >= 0.0 && index < len as f64).then_some(index as usize)
}

/// Index and magnitude of the first largest absolute value.
pub(crate) fn argmax_abs(signal: &[f64]) -> Option<(usize, f64)> {
    signal
        .iter()
        .enumerate()
        .fold(None, |best, (i, x)| match best {
            Some((_, m)) if x.abs() <= m => best,
            _ => Some((i, x.abs())),
        })
}

/// Shift `signal` right by `offset` samples (left when negative) into a new
/// buffer of the same length; vacated samples are zero.
pub(crate) fn shift(signal: &[f64], offset: isize) -> Vec<f64> {
    let len = signal.len() as isize;
    let mut shifted = vec![0.0; signal.len()];
    for (i, &x) in signal.iter().enumerate() {
        let target = i as isize + offset;
        if (0..len).contains(&target) {
            shifted[target as usize] = x;
        }
    }
    shifted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse(len: usize, at: usize) -> Vec<f64> {
        let mut signal = vec![0.0; len];
        signal[at] = 1.0;
        signal
    }

    fn no_lpc() -> PeakDetectorConfig {
        PeakDetectorConfig {
            use_lpc: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_strict_threshold_prunes_everything() {
        let config = PeakDetectorConfig {
            threshold: -1e9,
            ..no_lpc()
        };
        let err = PeakDetector::new(48000.0, config)
            .detect(&impulse(4000, 1000))
            .unwrap_err();
        assert!(matches!(err, Error::NumericDegeneracy(_)));
    }

    #[test]
    fn test_threshold_drops_smeared_onset() {
        // an impulse followed by a wide gaussian burst: the burst's group
        // delay crosses zero far more slowly than the impulse's
        let mut signal = impulse(5000, 1000);
        for (i, x) in signal.iter_mut().enumerate() {
            let d = (i as f64 - 3000.0) / 200.0;
            *x += 0.1 * (-0.5 * d * d).exp();
        }

        let strict = PeakDetectorConfig {
            threshold: -0.3,
            ..no_lpc()
        };
        let peaks = PeakDetector::new(48000.0, strict).detect(&signal).unwrap();
        assert_eq!(peaks.onsets(), vec![1000]);
        assert!(peaks.candidates().iter().all(|c| c.slope <= -0.3));

        let permissive = PeakDetectorConfig {
            threshold: -0.001,
            ..no_lpc()
        };
        let peaks = PeakDetector::new(48000.0, permissive)
            .detect(&signal)
            .unwrap();
        let onsets = peaks.onsets();
        assert_eq!(onsets.len(), 2);
        assert_eq!(onsets[0], 1000);
        assert!(onsets[1].abs_diff(3000) <= 2, "onset {}", onsets[1]);
    }

    #[test]
    fn test_window_lengths_at_48k() {
        assert_eq!(odd_window_len(GROUP_DELAY_WINDOW_SECS * 48000.0), 145);
        assert_eq!(odd_window_len(SMOOTHING_WINDOW_SECS * 48000.0), 21);
    }

    #[test]
    fn test_group_delay_crossing_at_impulse() {
        let gd = group_delay(&impulse(3000, 1000), 48000.0);
        let crossings = negative_zero_crossings(&gd.values);
        assert_eq!(crossings.len(), 1);
        let position = crossings[0].position + gd.offset;
        assert!((position - 1000.0).abs() < 1e-6, "position {position}");
        assert!((crossings[0].slope + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_group_delay_short_signal() {
        let gd = group_delay(&[1.0; 10], 48000.0);
        assert!(gd.values.is_empty());
    }

    #[test]
    fn test_zero_crossing_interpolation() {
        let crossings = negative_zero_crossings(&[1.0, 0.5, -0.5, -1.0]);
        assert_eq!(crossings.len(), 1);
        assert!((crossings[0].position - 1.5).abs() < 1e-12);
        assert!((crossings[0].slope + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_crossing_ignores_rising_edges() {
        assert!(negative_zero_crossings(&[-1.0, 1.0, 2.0]).is_empty());
    }

    #[test]
    fn test_single_impulse() {
        let peaks = PeakDetector::new(48000.0, no_lpc())
            .detect(&impulse(4000, 1000))
            .unwrap();
        assert_eq!(peaks.onsets(), vec![1000]);
        assert_eq!(peaks.strength(1000), 1.0);
        assert_eq!(peaks.len(), 4000);
    }

    #[test]
    fn test_strongest_anchors_at_reference_peak() {
        let mut signal = vec![0.0; 6000];
        signal[1000] = 1.0;
        signal[1600] = 0.5;
        signal[2400] = -0.25;
        let peaks = PeakDetector::new(48000.0, no_lpc()).detect(&signal).unwrap();
        assert_eq!(peaks.onsets(), vec![1000, 1600, 2400]);
        assert!((peaks.strength(1600) - 0.5).abs() < 1e-9);
        assert!((peaks.strength(2400) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_candidates_before_strongest_are_dropped() {
        let mut signal = vec![0.0; 6000];
        signal[800] = 0.3;
        signal[1600] = 1.0;
        let peaks = PeakDetector::new(48000.0, no_lpc()).detect(&signal).unwrap();
        assert_eq!(peaks.onsets(), vec![1600]);
    }

    #[test]
    fn test_truncation_hides_late_peaks() {
        let mut signal = vec![0.0; 6000];
        signal[1000] = 1.0;
        signal[4000] = 0.8;
        let config = PeakDetectorConfig {
            truncation: Some(3000),
            ..no_lpc()
        };
        let peaks = PeakDetector::new(48000.0, config).detect(&signal).unwrap();
        assert_eq!(peaks.onsets(), vec![1000]);
    }

    #[test]
    fn test_silent_signal_is_degenerate() {
        let err = PeakDetector::new(48000.0, no_lpc())
            .detect(&[0.0; 2000])
            .unwrap_err();
        assert!(matches!(err, Error::NumericDegeneracy(_)));
    }

    #[test]
    fn test_empty_signal_is_degenerate() {
        let err = PeakDetector::new(48000.0, no_lpc()).detect(&[]).unwrap_err();
        assert!(matches!(err, Error::NumericDegeneracy(_)));
    }

    #[test]
    fn test_whitened_detection_keeps_main_peak() {
        let mut signal = vec![0.0; 8000];
        signal[2000] = 1.0;
        signal[3000] = 0.4;
        let peaks = PeakDetector::new(48000.0, PeakDetectorConfig::default())
            .detect(&signal)
            .unwrap();
        assert_eq!(peaks.strength(2000), 1.0);
        assert!(peaks.onsets().iter().all(|&i| i >= 2000));
    }

    #[test]
    fn test_detection_is_repeatable() {
        let signal: Vec<f64> = (0..6000)
            .map(|i| ((i as f64 * 0.37).sin() * (-(i as f64) / 1500.0).exp()))
            .collect();
        let detector = PeakDetector::new(48000.0, PeakDetectorConfig::default());
        assert_eq!(detector.detect(&signal), detector.detect(&signal));
    }

    #[test]
    fn test_shift() {
        assert_eq!(shift(&[1.0, 2.0, 3.0], 1), vec![0.0, 1.0, 2.0]);
        assert_eq!(shift(&[1.0, 2.0, 3.0], -2), vec![3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_argmax_abs_prefers_first() {
        assert_eq!(argmax_abs(&[0.5, -1.0, 1.0]), Some((1, 1.0)));
        assert_eq!(argmax_abs(&[]), None);
    }
}
