//! The encoder's output: early and late reflection parameters keyed by label.

use std::collections::BTreeMap;
use std::fmt;

use rsao_dsp::Sos;
use serde::{Serialize, Serializer};

/// Identity of one parameter block.
///
/// Ordering follows arrival: the direct sound, then reflections by index, then
/// the late reverberation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReflectionLabel {
    /// The first selected onset.
    DirectSound,
    /// The k-th discrete early reflection, starting at 1.
    Reflection(usize),
    /// The diffuse late reverberation.
    Late,
}

impl ReflectionLabel {
    /// Label of the `index`-th selected onset (0 is the direct sound).
    pub fn early(index: usize) -> Self {
        match index {
            0 => ReflectionLabel::DirectSound,
            k => ReflectionLabel::Reflection(k),
        }
    }
}

impl fmt::Display for ReflectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectionLabel::DirectSound => f.write_str("DirectSound"),
            ReflectionLabel::Reflection(k) => write!(f, "Reflection{k}"),
            ReflectionLabel::Late => f.write_str("Late"),
        }
    }
}

impl Serialize for ReflectionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Direction of arrival in degrees, rounded to whole degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Doa {
    /// Azimuth in degrees, 0..360.
    pub azimuth: f64,
    /// Elevation in degrees, -90..90.
    pub elevation: f64,
}

/// Parameters of the direct sound or one discrete reflection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarlyParameters {
    /// Arrival time in seconds after the direct sound (0 for the direct sound).
    pub toa: f64,
    /// Onset sample in the analysed impulse response.
    pub onset_samples: usize,
    /// Level relative to the direct sound; absolute for the direct sound.
    pub level: f64,
    /// Direction of arrival.
    pub doa: Doa,
    /// Length of the analysis window in samples.
    pub window_samples: usize,
    /// Unity-noise-gain coloration filter.
    pub filter_sections: Vec<Sos>,
}

/// Late reverberation model, one entry per filter-bank band in band order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LateParameters {
    /// Onset in seconds after the direct sound, less the attack ramp.
    pub toa: f64,
    /// Onset sample in the analysed impulse response.
    pub onset_samples: f64,
    /// Length of the analysed late tail in samples.
    pub window_samples: usize,
    /// Band center frequencies in Hz.
    pub bandcut: Vec<f64>,
    /// Band levels relative to the direct sound.
    pub level: Vec<f64>,
    /// Amplitude decay constants per second (negative for a decaying tail).
    pub expdecays: Vec<f64>,
    /// Attack ramp duration per band in seconds.
    pub attacktimes: Vec<f64>,
    /// Reverberation time per band in seconds.
    pub reverb_times: Vec<f64>,
    /// Samples between the first reflection and the late onset.
    pub refattackramplength: i64,
}

/// Everything the encoder estimated for one impulse response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSet {
    early: BTreeMap<ReflectionLabel, EarlyParameters>,
    late: Option<LateParameters>,
}

impl ParameterSet {
    /// Assemble a parameter set from its merged parts.
    pub fn new(
        early: BTreeMap<ReflectionLabel, EarlyParameters>,
        late: Option<LateParameters>,
    ) -> Self {
        Self { early, late }
    }

    /// Early parameters keyed by label, in arrival order.
    pub fn early(&self) -> &BTreeMap<ReflectionLabel, EarlyParameters> {
        &self.early
    }

    /// Late reverberation parameters, when estimated.
    pub fn late(&self) -> Option<&LateParameters> {
        self.late.as_ref()
    }

    /// Parameters for one early label.
    pub fn get(&self, label: ReflectionLabel) -> Option<&EarlyParameters> {
        self.early.get(&label)
    }

    /// Direct-sound parameters.
    pub fn direct_sound(&self) -> Option<&EarlyParameters> {
        self.get(ReflectionLabel::DirectSound)
    }

    /// Discrete reflections in arrival order, direct sound excluded.
    pub fn reflections(&self) -> impl Iterator<Item = (usize, &EarlyParameters)> {
        self.early.iter().filter_map(|(label, params)| match label {
            ReflectionLabel::Reflection(k) => Some((*k, params)),
            _ => None,
        })
    }

    /// Number of discrete reflections (direct sound excluded).
    pub fn n_discrete(&self) -> usize {
        self.early.len().saturating_sub(1)
    }

    /// All labels present, in arrival order.
    pub fn labels(&self) -> Vec<ReflectionLabel> {
        let mut labels: Vec<ReflectionLabel> = self.early.keys().copied().collect();
        if self.late.is_some() {
            labels.push(ReflectionLabel::Late);
        }
        labels
    }
}
