//! Conversion of absolute early measurements to direct-sound-relative values.

use std::collections::BTreeMap;

use rsao_dsp::Sos;

use crate::error::{Error, Result};
use crate::params::{Doa, EarlyParameters, ReflectionLabel};

/// Absolute measurement of one early reflection, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct EarlyMeasurement {
    /// Which reflection was measured.
    pub label: ReflectionLabel,
    /// Onset sample.
    pub onset: usize,
    /// Root energy of the steered signal.
    pub level: f64,
    /// Direction of arrival.
    pub doa: Doa,
    /// Analysis window length in samples.
    pub window_samples: usize,
    /// Coloration filter.
    pub filter_sections: Vec<Sos>,
}

/// Express every measurement relative to the direct sound.
///
/// Reflection times become seconds after the direct sound and levels become
/// ratios to the direct level. The direct sound keeps its absolute level and
/// gets a time of arrival of zero.
pub fn normalize_early(
    measurements: Vec<EarlyMeasurement>,
    sample_rate: f64,
) -> Result<BTreeMap<ReflectionLabel, EarlyParameters>> {
    let direct = measurements
        .iter()
        .find(|m| m.label == ReflectionLabel::DirectSound)
        .ok_or_else(|| Error::configuration("early measurements contain no direct sound"))?;
    let (direct_onset, direct_level) = (direct.onset as f64, direct.level);
    let has_reflections = measurements
        .iter()
        .any(|m| m.label != ReflectionLabel::DirectSound);
    if has_reflections && direct_level == 0.0 {
        return Err(Error::degenerate(
            "direct sound level is zero; reflection levels are undefined",
        ));
    }

    Ok(measurements
        .into_iter()
        .map(|m| {
            let (toa, level) = match m.label {
                ReflectionLabel::DirectSound => (0.0, m.level),
                _ => (
                    (m.onset as f64 - direct_onset) / sample_rate,
                    m.level / direct_level,
                ),
            };
            let params = EarlyParameters {
                toa,
                onset_samples: m.onset,
                level,
                doa: m.doa,
                window_samples: m.window_samples,
                filter_sections: m.filter_sections,
            };
            (m.label, params)
        })
        .collect())
}
