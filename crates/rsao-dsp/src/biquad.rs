//! Biquad (bi-quadratic) sections and cascades.
//!
//! Provides a second-order IIR section, cascades of sections (SOS), zero-phase
//! forward-backward filtering, and RBJ Audio EQ Cookbook coefficients
//! parameterized by bandwidth in octaves.

use serde::{Deserialize, Serialize};
use std::f64::consts::{LN_2, PI};

/// Coefficients of one second-order section.
///
/// ```text
/// H(z) = (b0 + b1*z^-1 + b2*z^-2) / (a0 + a1*z^-1 + a2*z^-2)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sos {
    /// Feedforward coefficient for x[n]
    pub b0: f64,
    /// Feedforward coefficient for x[n-1]
    pub b1: f64,
    /// Feedforward coefficient for x[n-2]
    pub b2: f64,
    /// Feedback normalization coefficient
    pub a0: f64,
    /// Feedback coefficient for y[n-1]
    pub a1: f64,
    /// Feedback coefficient for y[n-2]
    pub a2: f64,
}

impl Sos {
    /// Passthrough section: `y[n] = x[n]`.
    pub const IDENTITY: Sos = Sos::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Create a section from raw coefficients.
    pub const fn new(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0,
            b1,
            b2,
            a0,
            a1,
            a2,
        }
    }

    /// Return the section with every coefficient divided by `a0`.
    pub fn normalized(&self) -> Self {
        let a0_inv = 1.0 / self.a0;
        Self::new(
            self.b0 * a0_inv,
            self.b1 * a0_inv,
            self.b2 * a0_inv,
            1.0,
            self.a1 * a0_inv,
            self.a2 * a0_inv,
        )
    }

    /// Coefficients in `(b0, b1, b2, a0, a1, a2)` order.
    pub fn to_array(&self) -> [f64; 6] {
        [self.b0, self.b1, self.b2, self.a0, self.a1, self.a2]
    }

    /// Return a copy with the numerator scaled by `gain`.
    pub fn with_numerator_gain(&self, gain: f64) -> Self {
        Self {
            b0: self.b0 * gain,
            b1: self.b1 * gain,
            b2: self.b2 * gain,
            ..*self
        }
    }
}

impl Default for Sos {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Biquad filter state running one [`Sos`].
///
/// Implements the Direct Form I structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    /// Input delay line: x[n-1], x[n-2]
    x1: f64,
    x2: f64,

    /// Output delay line: y[n-1], y[n-2]
    y1: f64,
    y2: f64,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self::from_sos(&Sos::IDENTITY)
    }

    /// Creates a biquad running the given section (normalized by `a0`).
    pub fn from_sos(sos: &Sos) -> Self {
        let mut biquad = Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        biquad.set_coefficients(sos.b0, sos.b1, sos.b2, sos.a0, sos.a1, sos.a2);
        biquad
    }

    /// Sets the biquad coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Clears the delay lines.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Loads the delay lines with the steady state reached after an infinitely
    /// long constant input of value `input`.
    ///
    /// Forward-backward filtering uses this so that the padded edges do not
    /// produce a start-up transient.
    pub fn prime(&mut self, input: f64) {
        let den = 1.0 + self.a1 + self.a2;
        let dc_gain = if den.abs() > f64::EPSILON {
            (self.b0 + self.b1 + self.b2) / den
        } else {
            0.0
        };
        self.x1 = input;
        self.x2 = input;
        self.y1 = dc_gain * input;
        self.y2 = dc_gain * input;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// A cascade of second-order sections applied in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SosCascade {
    sections: Vec<Sos>,
}

impl SosCascade {
    /// Create a cascade from its sections.
    pub fn new(sections: Vec<Sos>) -> Self {
        Self { sections }
    }

    /// The sections, first applied first.
    pub fn sections(&self) -> &[Sos] {
        &self.sections
    }

    /// Consume the cascade and return its sections.
    pub fn into_sections(self) -> Vec<Sos> {
        self.sections
    }

    /// Filter a signal through every section, starting from zero state.
    pub fn filter(&self, signal: &[f64]) -> Vec<f64> {
        let mut stages: Vec<Biquad> = self.sections.iter().map(Biquad::from_sos).collect();
        signal
            .iter()
            .map(|&x| stages.iter_mut().fold(x, |acc, stage| stage.process(acc)))
            .collect()
    }

    /// First `len` samples of the cascade's impulse response.
    pub fn impulse_response(&self, len: usize) -> Vec<f64> {
        let mut impulse = vec![0.0; len];
        if let Some(first) = impulse.first_mut() {
            *first = 1.0;
        }
        self.filter(&impulse)
    }

    /// Energy (sum of squares) of the first `len` impulse response samples.
    pub fn impulse_energy(&self, len: usize) -> f64 {
        self.impulse_response(len).iter().map(|&h| h * h).sum()
    }

    /// Return a cascade whose first `len` impulse response samples have unit energy.
    ///
    /// Only the leading section's numerator is rescaled, by `1 / sqrt(energy)`.
    /// A cascade with zero or non-finite energy is returned unchanged.
    pub fn normalize_energy(&self, len: usize) -> Self {
        let energy = self.impulse_energy(len);
        if !(energy.is_finite() && energy > 0.0) {
            return self.clone();
        }
        let gain = 1.0 / energy.sqrt();
        let mut sections = self.sections.clone();
        if let Some(first) = sections.first_mut() {
            *first = first.with_numerator_gain(gain);
        }
        Self { sections }
    }
}

/// Edge padding used by [`filtfilt`]: three times the section length.
const FILTFILT_PAD: usize = 9;

/// Zero-phase filtering: run `sos` forwards, then backwards over the result.
///
/// The signal is extended at both ends by odd reflection about the edge
/// samples, and each pass starts from the steady state for its first sample,
/// so the edges carry no start-up transient. The output has the input's
/// length; the effective magnitude response is `|H|^2`.
pub fn filtfilt(sos: &Sos, signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let pad = FILTFILT_PAD.min(n - 1);
    let first = signal[0];
    let last = signal[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
    extended.extend_from_slice(signal);
    extended.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));

    let mut biquad = Biquad::from_sos(sos);
    biquad.prime(extended[0]);
    let forward: Vec<f64> = extended.iter().map(|&x| biquad.process(x)).collect();

    biquad.clear();
    biquad.prime(forward[forward.len() - 1]);
    let mut backward: Vec<f64> = forward.iter().rev().map(|&x| biquad.process(x)).collect();
    backward.reverse();

    backward[pad..pad + n].to_vec()
}

/// RBJ bandwidth term: `alpha = sin(w0) * sinh(ln2/2 * BW * w0/sin(w0))`.
fn bandwidth_alpha(omega: f64, bandwidth: f64) -> f64 {
    let sin_omega = omega.sin();
    sin_omega * (LN_2 / 2.0 * bandwidth * omega / sin_omega).sinh()
}

/// Low-pass coefficients from the RBJ cookbook, normalized by `a0`.
///
/// # Arguments
///
/// * `frequency` - Cutoff frequency in Hz
/// * `bandwidth` - Bandwidth in octaves
/// * `sample_rate` - Sample rate in Hz
pub fn lowpass_coefficients(frequency: f64, bandwidth: f64, sample_rate: f64) -> Sos {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = omega.cos();
    let alpha = bandwidth_alpha(omega, bandwidth);

    Sos::new(
        (1.0 - cos_omega) / 2.0,
        1.0 - cos_omega,
        (1.0 - cos_omega) / 2.0,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
    .normalized()
}

/// High-pass coefficients from the RBJ cookbook, normalized by `a0`.
///
/// # Arguments
///
/// * `frequency` - Cutoff frequency in Hz
/// * `bandwidth` - Bandwidth in octaves
/// * `sample_rate` - Sample rate in Hz
pub fn highpass_coefficients(frequency: f64, bandwidth: f64, sample_rate: f64) -> Sos {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = omega.cos();
    let alpha = bandwidth_alpha(omega, bandwidth);

    Sos::new(
        (1.0 + cos_omega) / 2.0,
        -(1.0 + cos_omega),
        (1.0 + cos_omega) / 2.0,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
    .normalized()
}

/// Band-pass coefficients (constant 0 dB peak gain), normalized by `a0`.
///
/// # Arguments
///
/// * `frequency` - Center frequency in Hz
/// * `bandwidth` - Bandwidth in octaves
/// * `sample_rate` - Sample rate in Hz
pub fn bandpass_coefficients(frequency: f64, bandwidth: f64, sample_rate: f64) -> Sos {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = omega.cos();
    let alpha = bandwidth_alpha(omega, bandwidth);

    Sos::new(
        alpha,
        0.0,
        -alpha,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
    .normalized()
}
