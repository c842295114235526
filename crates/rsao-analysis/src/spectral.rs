//! All-pole spectral coloration of a steered reflection.

use rsao_dsp::{Sos, SosCascade, allpole_to_sos, lpc};

/// Impulse-response span over which the coloration filter is normalized to
/// unit energy: the causal half of a 129-sample centered impulse.
pub const NOISE_GAIN_SPAN: usize = 65;

/// Linear-prediction model of one reflection and its biquad realization.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralModel {
    /// Predictor polynomial `[1, a1, ..., ap]`.
    pub coefficients: Vec<f64>,
    /// `1 / A(z)` as second-order sections with unit noise gain.
    pub cascade: SosCascade,
}

impl SpectralModel {
    /// Fit an all-pole model of the given order to `signal`.
    pub fn fit(signal: &[f64], order: usize) -> Self {
        let coefficients = lpc(signal, order);
        let cascade =
            SosCascade::new(allpole_to_sos(&coefficients)).normalize_energy(NOISE_GAIN_SPAN);
        Self {
            coefficients,
            cascade,
        }
    }

    /// The coloration filter's sections, first applied first.
    pub fn sections(&self) -> &[Sos] {
        self.cascade.sections()
    }
}
