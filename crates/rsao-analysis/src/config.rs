//! Encoder configuration.
//!
//! Every field has a default, so a configuration file only needs to name the
//! settings it changes.

use serde::{Deserialize, Serialize};

use crate::beamformer::ScanMode;
use crate::error::{Error, Result};
use crate::peaks::PeakDetectorConfig;
use crate::segment::{BoundaryPolicy, SelectionPolicy};

/// Settings for every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Discrete early reflections to estimate, direct sound excluded.
    pub n_discrete: usize,
    /// How onsets are selected.
    pub discrete_mode: SelectionPolicy,
    /// Group-delay crossings with a slope above this are pruned.
    pub groupdelay_threshold: f64,
    /// Pre-whiten before peak detection.
    pub use_lpc: bool,
    /// Prediction order of the whitening filter.
    pub lpc_order: usize,
    /// Samples of the W channel searched for onsets; `None` searches all of it.
    pub truncation_samples: Option<usize>,
    /// Beam directivity: 0 omni, 1 cardioid, 2 figure-of-eight.
    pub directivity: f64,
    /// Beam steering grid.
    pub scan: ScanMode,
    /// Half-width of the direct-sound window in samples.
    pub direct_half_window: usize,
    /// Half-width of each reflection window in samples.
    pub reflection_half_window: usize,
    /// Prediction order of the direct-sound coloration filter.
    pub direct_lpc_order: usize,
    /// Prediction order of each reflection's coloration filter.
    pub reflection_lpc_order: usize,
    /// Window handling at the signal edges.
    pub boundary: BoundaryPolicy,
    /// Decay curve range in dB used for the reverberation time fit.
    pub decay_region_db: [f64; 2],
    /// Exponential decay fit runs down to the point nearest this level in dB.
    pub estimate_drop_db: f64,
    /// Lowest octave band exponent (center `1000 * 2^k` Hz).
    pub lowest_band: i32,
    /// Highest octave band exponent.
    pub highest_band: i32,
    /// Estimate the late reverberation (requires room dimensions).
    pub estimate_late: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            n_discrete: 20,
            discrete_mode: SelectionPolicy::First,
            groupdelay_threshold: -0.05,
            use_lpc: true,
            lpc_order: 12,
            truncation_samples: None,
            directivity: 1.0,
            scan: ScanMode::Full,
            direct_half_window: 128,
            reflection_half_window: 64,
            direct_lpc_order: 16,
            reflection_lpc_order: 8,
            boundary: BoundaryPolicy::Truncate,
            decay_region_db: [-5.0, -35.0],
            estimate_drop_db: -20.0,
            lowest_band: -4,
            highest_band: 4,
            estimate_late: true,
        }
    }
}

impl EncoderConfig {
    /// Check ranges that no stage can recover from.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.directivity) {
            return Err(Error::configuration(format!(
                "directivity must lie in 0..=2, got {}",
                self.directivity
            )));
        }
        if self.lpc_order == 0 || self.direct_lpc_order == 0 || self.reflection_lpc_order == 0 {
            return Err(Error::configuration("prediction orders must be at least 1"));
        }
        if self.direct_half_window == 0 || self.reflection_half_window == 0 {
            return Err(Error::configuration("window half-widths must be at least 1"));
        }
        let [start, end] = self.decay_region_db;
        if !(start <= 0.0 && end < start) {
            return Err(Error::configuration(format!(
                "decay region must fall from a level at or below 0 dB, got [{start}, {end}]"
            )));
        }
        if !(self.estimate_drop_db < 0.0) {
            return Err(Error::configuration(format!(
                "exponential fit level must be negative, got {}",
                self.estimate_drop_db
            )));
        }
        if self.lowest_band > self.highest_band {
            return Err(Error::configuration(format!(
                "octave band range {}..={} is empty",
                self.lowest_band, self.highest_band
            )));
        }
        if self.estimate_late && self.n_discrete == 0 {
            return Err(Error::configuration(
                "late estimation needs at least one discrete reflection",
            ));
        }
        Ok(())
    }

    /// Peak detector settings.
    pub fn peak_detector(&self) -> PeakDetectorConfig {
        PeakDetectorConfig {
            threshold: self.groupdelay_threshold,
            truncation: self.truncation_samples,
            use_lpc: self.use_lpc,
            lpc_order: self.lpc_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        EncoderConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_directivity() {
        let config = EncoderConfig {
            directivity: 2.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_rejects_inverted_decay_region() {
        let config = EncoderConfig {
            decay_region_db: [-35.0, -5.0],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_late_needs_a_reflection() {
        let config = EncoderConfig {
            n_discrete: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let early_only = EncoderConfig {
            estimate_late: false,
            ..config
        };
        early_only.validate().unwrap();
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: EncoderConfig =
            serde_json::from_str(r#"{"n_discrete": 5, "discrete_mode": "strongest"}"#).unwrap();
        assert_eq!(config.n_discrete, 5);
        assert_eq!(config.discrete_mode, SelectionPolicy::Strongest);
        assert_eq!(config.lpc_order, 12);
        assert_eq!(config.boundary, BoundaryPolicy::Truncate);
    }

    #[test]
    fn test_peak_detector_settings() {
        let config = EncoderConfig {
            truncation_samples: Some(9600),
            use_lpc: false,
            ..Default::default()
        };
        let peaks = config.peak_detector();
        assert_eq!(peaks.truncation, Some(9600));
        assert!(!peaks.use_lpc);
        assert_eq!(peaks.threshold, -0.05);
    }
}
