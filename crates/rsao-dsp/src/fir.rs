//! FIR helpers: Hamming windows, causal filtering and linear convolution.

use std::f64::consts::PI;

/// Symmetric Hamming window of length `len`.
///
/// `w[n] = 0.54 - 0.46 * cos(2*pi*n / (len - 1))`. A length-1 window is `[1.0]`.
pub fn hamming(len: usize) -> Vec<f64> {
    match len {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let m = (len - 1) as f64;
            (0..len)
                .map(|n| 0.54 - 0.46 * (2.0 * PI * n as f64 / m).cos())
                .collect()
        }
    }
}

/// Causal FIR filter with zero initial state.
///
/// `y[n] = sum_k coeffs[k] * x[n - k]`, output the same length as the input.
pub fn lfilter(coeffs: &[f64], signal: &[f64]) -> Vec<f64> {
    (0..signal.len())
        .map(|n| {
            coeffs
                .iter()
                .take(n + 1)
                .enumerate()
                .map(|(k, &c)| c * signal[n - k])
                .sum()
        })
        .collect()
}

/// Full linear convolution, length `a.len() + b.len() - 1`.
pub fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut output = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &h) in b.iter().enumerate() {
            output[i + j] += x * h;
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hamming_endpoints_and_symmetry() {
        let w = hamming(145);
        assert_eq!(w.len(), 145);
        assert!((w[0] - 0.08).abs() < 1e-12);
        assert!((w[72] - 1.0).abs() < 1e-12);
        for i in 0..145 {
            assert!((w[i] - w[144 - i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_hamming_degenerate_lengths() {
        assert!(hamming(0).is_empty());
        assert_eq!(hamming(1), vec![1.0]);
    }

    #[test]
    fn test_lfilter_impulse_returns_coefficients() {
        let coeffs = [0.5, -0.25, 0.125];
        let mut impulse = vec![0.0; 5];
        impulse[0] = 1.0;
        assert_eq!(lfilter(&coeffs, &impulse), vec![0.5, -0.25, 0.125, 0.0, 0.0]);
    }

    #[test]
    fn test_lfilter_is_causal() {
        let mut signal = vec![0.0; 8];
        signal[4] = 1.0;
        let output = lfilter(&[1.0, 1.0], &signal);
        assert!(output[..4].iter().all(|&y| y == 0.0));
        assert_eq!(output[4], 1.0);
        assert_eq!(output[5], 1.0);
    }

    #[test]
    fn test_convolve() {
        assert_eq!(convolve(&[1.0, 2.0], &[1.0, 1.0, 1.0]), vec![1.0, 3.0, 3.0, 2.0]);
        assert!(convolve(&[], &[1.0]).is_empty());
    }
}
