//! The full analysis pipeline.

use rayon::prelude::*;

use crate::beamformer::Beamformer;
use crate::config::EncoderConfig;
use crate::early::{EarlyMeasurement, normalize_early};
use crate::error::{Error, Result};
use crate::late::{LateReference, LateReverbEstimator, OctaveFilterBank};
use crate::mixing_time::{MixingTimeModel, RoomDimensions};
use crate::params::{LateParameters, ParameterSet, ReflectionLabel};
use crate::peaks::PeakDetector;
use crate::segment::{ReflectionSegment, Segmenter};
use crate::signal::BFormat;
use crate::spectral::SpectralModel;

/// Estimates a [`ParameterSet`] from a B-format room impulse response.
///
/// # Example
///
/// ```rust,ignore
/// use rsao_analysis::{BFormat, Encoder, EncoderConfig, RoomDimensions};
///
/// let signal = BFormat::from_channels(channels, 48000.0)?;
/// let room = RoomDimensions::new(15.0, 25.0, 10.0)?;
/// let params = Encoder::new(EncoderConfig::default())?.encode(&signal, Some(&room))?;
/// println!("{} reflections", params.n_discrete());
/// ```
#[derive(Debug, Clone)]
pub struct Encoder {
    config: EncoderConfig,
    mixing_time: MixingTimeModel,
}

impl Encoder {
    /// Create an encoder, rejecting invalid settings up front.
    pub fn new(config: EncoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            mixing_time: MixingTimeModel::default(),
        })
    }

    /// Replace the mixing-time predictor coefficients.
    pub fn with_mixing_time_model(mut self, model: MixingTimeModel) -> Self {
        self.mixing_time = model;
        self
    }

    /// Current settings.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Run every stage and assemble the parameter set.
    ///
    /// `room` is required when late estimation is enabled.
    pub fn encode(&self, signal: &BFormat, room: Option<&RoomDimensions>) -> Result<ParameterSet> {
        let room = match (self.config.estimate_late, room) {
            (true, None) => {
                return Err(Error::configuration(
                    "room dimensions are required for late reverberation estimation",
                ));
            }
            (_, room) => room,
        };
        tracing::info!(
            samples = signal.len(),
            sample_rate = signal.sample_rate(),
            n_discrete = self.config.n_discrete,
            "encoding impulse response"
        );

        let onsets = self.detect_onsets(signal)?;
        let segments = self.segmenter().segment(signal, &onsets);
        let measurements = self.measure_early(&segments, signal.sample_rate());

        let late = match room {
            Some(room) if self.config.estimate_late => {
                Some(self.estimate_late(signal, room, &onsets, &measurements)?)
            }
            _ => None,
        };
        let early = normalize_early(measurements, signal.sample_rate())?;

        let params = ParameterSet::new(early, late);
        tracing::info!(
            labels = params.labels().len(),
            late = params.late().is_some(),
            "encoding finished"
        );
        Ok(params)
    }

    /// Detected and selected onsets, direct sound first.
    pub fn detect_onsets(&self, signal: &BFormat) -> Result<Vec<usize>> {
        let detector = PeakDetector::new(signal.sample_rate(), self.config.peak_detector());
        let peaks = detector.detect(signal.w())?;
        tracing::debug!(candidates = peaks.onsets().len(), "peak detection");
        self.segmenter().select(&peaks)
    }

    fn segmenter(&self) -> Segmenter {
        Segmenter {
            n_peaks: self.config.n_discrete + 1,
            policy: self.config.discrete_mode,
            direct_half_window: self.config.direct_half_window,
            reflection_half_window: self.config.reflection_half_window,
            boundary: self.config.boundary,
        }
    }

    /// Beamform and model every segment; one independent work unit each.
    fn measure_early(
        &self,
        segments: &[ReflectionSegment],
        sample_rate: f64,
    ) -> Vec<EarlyMeasurement> {
        let beamformer = Beamformer::new(self.config.directivity, self.config.scan);
        segments
            .par_iter()
            .map(|segment| {
                let direction = beamformer.steer(segment.channels());
                let order = match segment.label {
                    ReflectionLabel::DirectSound => self.config.direct_lpc_order,
                    _ => self.config.reflection_lpc_order,
                };
                let model = SpectralModel::fit(&direction.signal, order);
                let measurement = EarlyMeasurement {
                    label: segment.label,
                    onset: segment.onset,
                    level: direction.level(),
                    doa: direction.doa(),
                    window_samples: segment.len(),
                    filter_sections: model.cascade.into_sections(),
                };
                tracing::debug!(
                    label = %measurement.label,
                    onset_secs = measurement.onset as f64 / sample_rate,
                    azimuth = measurement.doa.azimuth,
                    elevation = measurement.doa.elevation,
                    level = measurement.level,
                    "early reflection"
                );
                measurement
            })
            .collect()
    }

    fn estimate_late(
        &self,
        signal: &BFormat,
        room: &RoomDimensions,
        onsets: &[usize],
        measurements: &[EarlyMeasurement],
    ) -> Result<LateParameters> {
        let (Some(&direct_onset), Some(&first_reflection_onset), Some(direct)) =
            (onsets.first(), onsets.get(1), measurements.first())
        else {
            return Err(Error::configuration(
                "late estimation needs the direct sound and at least one reflection",
            ));
        };

        let mixing = self.mixing_time.estimate(room);
        let bank = OctaveFilterBank::new(
            signal.sample_rate(),
            self.config.lowest_band,
            self.config.highest_band,
        )?;
        let estimator = LateReverbEstimator::new(
            signal.sample_rate(),
            mixing.tmp50_ms,
            self.config.decay_region_db,
            self.config.estimate_drop_db,
            bank,
        );
        estimator.estimate(
            signal.w(),
            &LateReference {
                direct_onset,
                direct_level: direct.level,
                first_reflection_onset,
            },
        )
    }
}
