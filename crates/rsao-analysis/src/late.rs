//! Late reverberation: octave-band decay and level estimation.
//!
//! The late tail starts at the perceptual mixing time after the direct sound.
//! Each octave band of the W channel is zero-phase filtered and analysed
//! independently:
//!
//! - reverberation time from a linear fit to the Schroeder curve
//! - amplitude decay constant from an exponential fit to the early part of the
//!   Schroeder curve
//! - level from the filtered energy around the late onset
//!
//! Bands are processed in parallel; results keep band order.

use rayon::prelude::*;
use rsao_dsp::{Sos, bandpass_coefficients, filtfilt, highpass_coefficients, lowpass_coefficients};

use crate::decay::{energy_decay_curve, fit_exponential, reverberation_time};
use crate::error::{Error, Result};
use crate::params::LateParameters;

/// Samples added after the mixing time before the late tail starts.
pub const LATE_ONSET_MARGIN: f64 = 100.0;

/// Filter-bank bandwidth in octaves.
const BAND_WIDTH_OCTAVES: f64 = 1.0;

/// Reference frequency of the octave grid.
const REFERENCE_HZ: f64 = 1000.0;

/// Level weight applied to the lowest (low-pass) band.
const LOWEST_BAND_WEIGHT: f64 = 0.3;

/// Shape of an octave-band filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    /// Everything below the center frequency.
    LowPass,
    /// One octave around the center frequency.
    BandPass,
    /// Everything above the center frequency.
    HighPass,
}

/// One filter-bank band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctaveBand {
    /// One-based band number.
    pub band: usize,
    /// Center frequency in Hz.
    pub center_hz: f64,
    /// Filter shape.
    pub kind: BandKind,
    /// Level weight.
    pub weight: f64,
    /// Filter coefficients.
    pub sos: Sos,
}

/// Octave-spaced bank: a low-pass for the lowest band, a high-pass for the
/// highest, band-passes in between.
#[derive(Debug, Clone)]
pub struct OctaveFilterBank {
    bands: Vec<OctaveBand>,
}

impl OctaveFilterBank {
    /// Bands centered on `1000 * 2^k` for `k` in `lowest..=highest`.
    ///
    /// Fails when the range is empty or a center reaches the Nyquist frequency.
    pub fn new(sample_rate: f64, lowest: i32, highest: i32) -> Result<Self> {
        if lowest > highest {
            return Err(Error::configuration(format!(
                "octave band range {lowest}..={highest} is empty"
            )));
        }
        let nyquist = sample_rate / 2.0;
        let count = (highest - lowest + 1) as usize;

        let bands = (lowest..=highest)
            .enumerate()
            .map(|(index, k)| {
                let center_hz = REFERENCE_HZ * 2f64.powi(k);
                if center_hz >= nyquist {
                    return Err(Error::configuration(format!(
                        "band center {center_hz} Hz is at or above Nyquist ({nyquist} Hz)"
                    )));
                }
                let kind = match index {
                    0 => BandKind::LowPass,
                    i if i + 1 == count => BandKind::HighPass,
                    _ => BandKind::BandPass,
                };
                let sos = match kind {
                    BandKind::LowPass => {
                        lowpass_coefficients(center_hz, BAND_WIDTH_OCTAVES, sample_rate)
                    }
                    BandKind::BandPass => {
                        bandpass_coefficients(center_hz, BAND_WIDTH_OCTAVES, sample_rate)
                    }
                    BandKind::HighPass => {
                        highpass_coefficients(center_hz, BAND_WIDTH_OCTAVES, sample_rate)
                    }
                };
                Ok(OctaveBand {
                    band: index + 1,
                    center_hz,
                    kind,
                    weight: if index == 0 { LOWEST_BAND_WEIGHT } else { 1.0 },
                    sos,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { bands })
    }

    /// The bands, lowest first.
    pub fn bands(&self) -> &[OctaveBand] {
        &self.bands
    }

    /// Band center frequencies in Hz.
    pub fn center_frequencies(&self) -> Vec<f64> {
        self.bands.iter().map(|b| b.center_hz).collect()
    }
}

/// Decay and level of one band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayModel {
    /// Reverberation time in seconds.
    pub reverb_time: f64,
    /// Amplitude decay constant per sample.
    pub decay_rate: f64,
    /// Weighted absolute band level around the late onset.
    pub level: f64,
}

/// Direct-sound and first-reflection references for late estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LateReference {
    /// Direct-sound onset sample.
    pub direct_onset: usize,
    /// Absolute direct-sound level.
    pub direct_level: f64,
    /// First discrete reflection onset sample.
    pub first_reflection_onset: usize,
}

/// Estimates the late reverberation model from the W channel.
#[derive(Debug, Clone)]
pub struct LateReverbEstimator {
    sample_rate: f64,
    mixing_time_ms: f64,
    decay_region_db: [f64; 2],
    estimate_drop_db: f64,
    bank: OctaveFilterBank,
}

impl LateReverbEstimator {
    /// Create an estimator.
    ///
    /// `mixing_time_ms` places the late onset; `decay_region_db` bounds the
    /// reverberation-time fit; the exponential fit runs down to the point
    /// nearest `estimate_drop_db`.
    pub fn new(
        sample_rate: f64,
        mixing_time_ms: f64,
        decay_region_db: [f64; 2],
        estimate_drop_db: f64,
        bank: OctaveFilterBank,
    ) -> Self {
        Self {
            sample_rate,
            mixing_time_ms,
            decay_region_db,
            estimate_drop_db,
            bank,
        }
    }

    /// The filter bank in use.
    pub fn bank(&self) -> &OctaveFilterBank {
        &self.bank
    }

    /// Late onset in (fractional) samples.
    pub fn late_onset(&self, direct_onset: usize) -> f64 {
        self.mixing_time_ms * self.sample_rate / 1000.0 + direct_onset as f64 + LATE_ONSET_MARGIN
    }

    /// Estimate the late parameters from the full W channel.
    pub fn estimate(&self, w: &[f64], reference: &LateReference) -> Result<LateParameters> {
        let late_onset = self.late_onset(reference.direct_onset);
        let attack_ramp = (late_onset - reference.first_reflection_onset as f64).floor();
        let first_sample = late_onset.round() as usize;
        if first_sample >= w.len() {
            return Err(Error::degenerate(format!(
                "late onset at sample {first_sample} lies beyond the {}-sample impulse response",
                w.len()
            )));
        }
        if !(reference.direct_level > 0.0) {
            return Err(Error::degenerate("direct sound level is zero"));
        }
        let tail = &w[first_sample..];
        tracing::debug!(
            late_onset,
            attack_ramp,
            tail_samples = tail.len(),
            bands = self.bank.bands().len(),
            "late reverberation"
        );

        let models: Vec<Result<DecayModel>> = self
            .bank
            .bands()
            .par_iter()
            .map(|band| self.analyze_band(band, tail, w, first_sample))
            .collect();
        let models = models.into_iter().collect::<Result<Vec<_>>>()?;

        let attack_time = attack_ramp / self.sample_rate;
        Ok(LateParameters {
            toa: (late_onset - reference.direct_onset as f64 - attack_ramp) / self.sample_rate,
            onset_samples: late_onset,
            window_samples: tail.len(),
            bandcut: self.bank.center_frequencies(),
            level: models
                .iter()
                .map(|m| m.level / reference.direct_level)
                .collect(),
            expdecays: models
                .iter()
                .map(|m| m.decay_rate * self.sample_rate)
                .collect(),
            attacktimes: vec![attack_time; models.len()],
            reverb_times: models.iter().map(|m| m.reverb_time).collect(),
            refattackramplength: attack_ramp as i64,
        })
    }

    fn analyze_band(
        &self,
        band: &OctaveBand,
        tail: &[f64],
        full: &[f64],
        first_sample: usize,
    ) -> Result<DecayModel> {
        let filtered_tail = filtfilt(&band.sos, tail);
        let decay = energy_decay_curve(&filtered_tail);

        let [start_db, end_db] = self.decay_region_db;
        let reverb_time = reverberation_time(&decay.db, start_db, end_db, self.sample_rate)?;

        let stop = decay
            .db
            .iter()
            .enumerate()
            .min_by(|a, b| {
                (a.1 - self.estimate_drop_db)
                    .abs()
                    .total_cmp(&(b.1 - self.estimate_drop_db).abs())
            })
            .map_or(0, |(i, _)| i);
        let fit = fit_exponential(&decay.linear[..stop]).ok_or(Error::FitFailure {
            band: band.band,
            center_hz: band.center_hz,
        })?;

        let filtered_full = filtfilt(&band.sos, full);
        let half = ((2.0 * self.sample_rate / band.center_hz) as usize)
            .min((self.sample_rate / 100.0) as usize);
        let lo = first_sample.saturating_sub(half);
        let hi = (first_sample + half).min(full.len());
        let level = filtered_full[lo..hi]
            .iter()
            .map(|x| x * x)
            .sum::<f64>()
            .sqrt()
            * band.weight;

        tracing::debug!(
            band = band.band,
            center_hz = band.center_hz,
            reverb_time,
            decay_rate = fit.rate / 2.0,
            level,
            "band decay"
        );
        Ok(DecayModel {
            reverb_time,
            decay_rate: fit.rate / 2.0,
            level,
        })
    }
}
