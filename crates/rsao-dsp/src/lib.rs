//! rsao DSP primitives.
//!
//! Building blocks shared by the reflection analysis stages:
//!
//! - [`biquad`] - Second-order sections, SOS cascades, zero-phase filtering and
//!   bandwidth-parameterized RBJ coefficients
//! - [`fir`] - Hamming windows, causal FIR filtering and linear convolution
//! - [`resample`] - Integer decimation and interpolation
//! - [`lpc`] - Autocorrelation-method linear prediction and all-pole to SOS conversion
//!
//! All processing is `f64`; the analysis is offline and accumulates long
//! energy sums where single precision loses the tail of the decay.

pub mod biquad;
pub mod fir;
pub mod lpc;
pub mod resample;

pub use biquad::{
    Biquad, Sos, SosCascade, bandpass_coefficients, filtfilt, highpass_coefficients,
    lowpass_coefficients,
};
pub use fir::{convolve, hamming, lfilter};
pub use lpc::{allpole_to_sos, autocorrelation, levinson_durbin, lpc, polynomial_roots};
pub use resample::{decimate, design_lowpass, interpolate};

pub use num_complex::Complex64;
