//! First-order Ambisonic (B-format) impulse responses.

use crate::error::{Error, Result};

/// Number of channels in a first-order B-format signal.
pub const BFORMAT_CHANNELS: usize = 4;

/// A 4-channel B-format room impulse response (W, X, Y, Z).
///
/// All four channels have the same length, and the sample rate is finite and positive.
#[derive(Debug, Clone, PartialEq)]
pub struct BFormat {
    channels: [Vec<f64>; BFORMAT_CHANNELS],
    sample_rate: f64,
}

impl BFormat {
    /// Create a B-format signal from its four component channels.
    pub fn new(
        w: Vec<f64>,
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
        sample_rate: f64,
    ) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::configuration(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        let len = w.len();
        if [&x, &y, &z].iter().any(|c| c.len() != len) {
            return Err(Error::configuration(format!(
                "B-format channels differ in length (W={}, X={}, Y={}, Z={})",
                len,
                x.len(),
                y.len(),
                z.len()
            )));
        }
        if len == 0 {
            return Err(Error::configuration("impulse response is empty"));
        }
        Ok(Self {
            channels: [w, x, y, z],
            sample_rate,
        })
    }

    /// Create a B-format signal from a channel list, which must hold exactly four channels.
    pub fn from_channels(channels: Vec<Vec<f64>>, sample_rate: f64) -> Result<Self> {
        let count = channels.len();
        let [w, x, y, z]: [Vec<f64>; BFORMAT_CHANNELS] = channels.try_into().map_err(|_| {
            Error::configuration(format!(
                "expected {BFORMAT_CHANNELS} B-format channels, got {count}"
            ))
        })?;
        Self::new(w, x, y, z, sample_rate)
    }

    /// De-interleave frame-ordered samples into a B-format signal.
    pub fn from_interleaved(samples: &[f64], channels: usize, sample_rate: f64) -> Result<Self> {
        if channels != BFORMAT_CHANNELS {
            return Err(Error::configuration(format!(
                "expected {BFORMAT_CHANNELS} B-format channels, got {channels}"
            )));
        }
        if samples.len() % channels != 0 {
            return Err(Error::configuration(format!(
                "{} interleaved samples do not form whole {channels}-channel frames",
                samples.len()
            )));
        }
        let mut split: Vec<Vec<f64>> =
            vec![Vec::with_capacity(samples.len() / channels); channels];
        for frame in samples.chunks_exact(channels) {
            for (channel, &sample) in split.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::from_channels(split, sample_rate)
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Length of each channel in samples.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Always false for a constructed signal; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    /// Omnidirectional pressure channel.
    pub fn w(&self) -> &[f64] {
        &self.channels[0]
    }

    /// Front-back figure-of-eight channel.
    pub fn x(&self) -> &[f64] {
        &self.channels[1]
    }

    /// Left-right figure-of-eight channel.
    pub fn y(&self) -> &[f64] {
        &self.channels[2]
    }

    /// Up-down figure-of-eight channel.
    pub fn z(&self) -> &[f64] {
        &self.channels[3]
    }

    /// All four channels in W, X, Y, Z order.
    pub fn channels(&self) -> [&[f64]; BFORMAT_CHANNELS] {
        [
            &self.channels[0],
            &self.channels[1],
            &self.channels[2],
            &self.channels[3],
        ]
    }
}
