//! rsao Analysis - room reflection parameters from B-format impulse responses
//!
//! Turns a measured first-order Ambisonic room impulse response into a compact
//! parametric model: the direct sound and the first N early reflections (time,
//! direction, level, spectral coloration) plus an octave-band model of the
//! late reverberation.
//!
//! Pipeline stages, leaves first:
//!
//! - [`peaks`] - Group-delay onset detection on the W channel
//! - [`segment`] - Onset selection and 4-channel windowing
//! - [`beamformer`] - Direction of arrival by first-order beam steering
//! - [`spectral`] - All-pole coloration filters as unit-noise-gain biquad cascades
//! - [`early`] - Direct-sound-relative times and levels
//! - [`mixing_time`] - Perceptual mixing time from room geometry
//! - [`decay`] - Schroeder decay curves, reverberation time, exponential fits
//! - [`late`] - Octave-band late reverberation model
//! - [`encoder`] - The driver that runs the stages and assembles a [`ParameterSet`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use rsao_analysis::{BFormat, Encoder, EncoderConfig, RoomDimensions};
//!
//! let signal = BFormat::from_channels(channels, 48000.0)?;
//! let room = RoomDimensions::new(15.0, 25.0, 10.0)?;
//! let params = Encoder::new(EncoderConfig::default())?.encode(&signal, Some(&room))?;
//!
//! for (label, early) in params.early() {
//!     println!("{label}: {:.4} s, az {} el {}", early.toa, early.doa.azimuth, early.doa.elevation);
//! }
//! ```

pub mod beamformer;
pub mod config;
pub mod decay;
pub mod early;
pub mod encoder;
pub mod error;
pub mod late;
pub mod mixing_time;
pub mod params;
pub mod peaks;
pub mod segment;
pub mod signal;
pub mod spectral;

pub use beamformer::{Beamformer, DirectionEstimate, ScanMode};
pub use config::EncoderConfig;
pub use decay::{
    EnergyDecay, ExponentialFit, energy_decay_curve, fit_exponential, reverberation_time,
};
pub use early::{EarlyMeasurement, normalize_early};
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use late::{
    BandKind, DecayModel, LateReference, LateReverbEstimator, OctaveBand, OctaveFilterBank,
};
pub use mixing_time::{MixingTime, MixingTimeModel, RoomDimensions};
pub use params::{Doa, EarlyParameters, LateParameters, ParameterSet, ReflectionLabel};
pub use peaks::{PeakCandidate, PeakDetector, PeakDetectorConfig, PeakMap};
pub use segment::{BoundaryPolicy, ReflectionSegment, Segmenter, SelectionPolicy};
pub use signal::BFormat;
pub use spectral::SpectralModel;
