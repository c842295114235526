//! Autocorrelation-method linear prediction and all-pole section conversion.
//!
//! The predictor polynomial uses the convention
//! `A(z) = 1 + a1*z^-1 + ... + ap*z^-p`, so the prediction error is
//! `e[n] = x[n] + sum_k a_k * x[n-k]` and `1/A(z)` is the all-pole model of
//! the signal's spectral envelope. The autocorrelation method guarantees a
//! minimum-phase `A(z)`, so every pole of `1/A(z)` lies inside the unit circle.

use crate::biquad::Sos;
use num_complex::Complex64;

/// Autocorrelation `R[k] = sum_n x[n] * x[n+k]` for lags `0..=max_lag`.
pub fn autocorrelation(signal: &[f64], max_lag: usize) -> Vec<f64> {
    (0..=max_lag)
        .map(|k| {
            signal
                .iter()
                .zip(signal.iter().skip(k))
                .map(|(&a, &b)| a * b)
                .sum()
        })
        .collect()
}

/// Levinson-Durbin recursion on autocorrelation values `r[0..=order]`.
///
/// Returns `(a, prediction_error)` where `a` holds `a1..ap`. A zero-energy
/// input yields all-zero coefficients; the recursion stops early if the
/// prediction error collapses, leaving higher coefficients at zero.
///
/// # Panics
///
/// Panics if `r.len() < order + 1`.
pub fn levinson_durbin(r: &[f64], order: usize) -> (Vec<f64>, f64) {
    assert!(
        r.len() > order,
        "autocorrelation must have at least order+1 elements"
    );

    let mut a = vec![0.0; order];
    if order == 0 || !(r[0] > f64::MIN_POSITIVE) {
        return (a, r[0].max(0.0));
    }

    let mut error = r[0];
    let mut previous = vec![0.0; order];

    for m in 0..order {
        let acc = r[m + 1]
            + previous[..m]
                .iter()
                .enumerate()
                .map(|(j, &aj)| aj * r[m - j])
                .sum::<f64>();

        let k = -acc / error;
        a[m] = k;
        for j in 0..m {
            a[j] = previous[j] + k * previous[m - 1 - j];
        }

        error *= 1.0 - k * k;
        if !(error > f64::MIN_POSITIVE) {
            error = 0.0;
            break;
        }
        previous[..=m].copy_from_slice(&a[..=m]);
    }

    (a, error)
}

/// Fit an all-pole model of the given order.
///
/// Returns the full predictor polynomial `[1, a1, ..., ap]`.
pub fn lpc(signal: &[f64], order: usize) -> Vec<f64> {
    let r = autocorrelation(signal, order);
    let (a, _) = levinson_durbin(&r, order);
    std::iter::once(1.0).chain(a).collect()
}

const ROOT_MAX_ITERATIONS: usize = 500;
const ROOT_TOLERANCE: f64 = 1e-14;

/// Roots of the polynomial `c[0]*z^n + c[1]*z^(n-1) + ... + c[n]`.
///
/// Uses the Aberth-Ehrlich simultaneous iteration. Trailing zero coefficients
/// are returned as exact roots at the origin. Leading zeros are skipped.
pub fn polynomial_roots(coeffs: &[f64]) -> Vec<Complex64> {
    let start = coeffs.iter().position(|&c| c != 0.0).unwrap_or(coeffs.len());
    let coeffs = &coeffs[start..];
    if coeffs.len() < 2 {
        return Vec::new();
    }

    let trailing_zeros = coeffs.iter().rev().take_while(|&&c| c == 0.0).count();
    let mut roots = vec![Complex64::new(0.0, 0.0); trailing_zeros];

    let lead = coeffs[0];
    let monic: Vec<f64> = coeffs[..coeffs.len() - trailing_zeros]
        .iter()
        .map(|&c| c / lead)
        .collect();
    let degree = monic.len() - 1;
    if degree == 0 {
        return roots;
    }

    // Start on a circle sized by the geometric mean of the root magnitudes,
    // rotated off the real axis so conjugate pairs can separate
    let radius = monic[degree].abs().powf(1.0 / degree as f64).max(1e-3);
    let mut z: Vec<Complex64> = (0..degree)
        .map(|k| {
            let angle = 2.0 * std::f64::consts::PI * k as f64 / degree as f64 + 0.4;
            Complex64::from_polar(radius, angle)
        })
        .collect();

    for _ in 0..ROOT_MAX_ITERATIONS {
        let mut max_step = 0.0f64;
        for i in 0..degree {
            let (p, dp) = horner(&monic, z[i]);
            if p.norm() == 0.0 {
                continue;
            }
            let ratio = p / dp;
            let repulsion: Complex64 = (0..degree)
                .filter(|&j| j != i)
                .map(|j| (z[i] - z[j]).inv())
                .sum();
            let step = ratio / (Complex64::new(1.0, 0.0) - ratio * repulsion);
            if step.is_finite() {
                z[i] -= step;
                max_step = max_step.max(step.norm() / (1.0 + z[i].norm()));
            }
        }
        if max_step < ROOT_TOLERANCE {
            break;
        }
    }

    roots.extend(z);
    roots
}

/// Evaluate a polynomial and its derivative at `z` (coefficients highest power first).
fn horner(coeffs: &[f64], z: Complex64) -> (Complex64, Complex64) {
    let mut p = Complex64::new(0.0, 0.0);
    let mut dp = Complex64::new(0.0, 0.0);
    for &c in coeffs {
        dp = dp * z + p;
        p = p * z + c;
    }
    (p, dp)
}

/// Imaginary-part threshold below which a root is treated as real.
const REAL_ROOT_TOLERANCE: f64 = 1e-9;

/// Convert the all-pole filter `1/A(z)` into second-order sections.
///
/// `a` is the denominator `[a0, a1, ..., ap]`. Complex-conjugate pole pairs
/// become one section each; real poles are paired in order of magnitude, with
/// a leftover real pole occupying a first-order section. Sections are ordered
/// by increasing pole radius, so the poles nearest the unit circle come last.
/// The overall gain `1/a0` sits on the first section's numerator; every other
/// numerator is `[1, 0, 0]`.
pub fn allpole_to_sos(a: &[f64]) -> Vec<Sos> {
    let a0 = a.first().copied().unwrap_or(1.0);
    let gain = 1.0 / a0;

    let roots = polynomial_roots(a);

    // (denominator section, largest pole radius)
    let mut sections: Vec<(Sos, f64)> = Vec::with_capacity(roots.len().div_ceil(2));

    let mut real: Vec<f64> = Vec::new();
    for root in &roots {
        if root.im.abs() <= REAL_ROOT_TOLERANCE * (1.0 + root.norm()) {
            real.push(root.re);
        } else if root.im > 0.0 {
            sections.push((
                Sos::new(1.0, 0.0, 0.0, 1.0, -2.0 * root.re, root.norm_sqr()),
                root.norm(),
            ));
        }
    }

    real.sort_by(|x, y| x.abs().total_cmp(&y.abs()));
    for pair in real.chunks(2) {
        match *pair {
            [p1, p2] => sections.push((
                Sos::new(1.0, 0.0, 0.0, 1.0, -(p1 + p2), p1 * p2),
                p1.abs().max(p2.abs()),
            )),
            [p] => sections.push((Sos::new(1.0, 0.0, 0.0, 1.0, -p, 0.0), p.abs())),
            _ => {}
        }
    }

    sections.sort_by(|x, y| x.1.total_cmp(&y.1));
    let mut sections: Vec<Sos> = sections.into_iter().map(|(sos, _)| sos).collect();

    match sections.first_mut() {
        Some(first) => *first = first.with_numerator_gain(gain),
        None => sections.push(Sos::IDENTITY.with_numerator_gain(gain)),
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Multiply out section denominators back into a polynomial.
    fn expand_denominators(sections: &[Sos]) -> Vec<f64> {
        sections.iter().fold(vec![1.0], |poly, sos| {
            crate::fir::convolve(&poly, &[sos.a0, sos.a1, sos.a2])
        })
    }

    fn ar2_process(a1: f64, a2: f64, len: usize) -> Vec<f64> {
        // Deterministic pseudo-random excitation
        let mut state = 0x2545_f491_u64;
        let mut y = vec![0.0; len];
        for n in 0..len {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let e = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            let y1 = if n >= 1 { y[n - 1] } else { 0.0 };
            let y2 = if n >= 2 { y[n - 2] } else { 0.0 };
            y[n] = e - a1 * y1 - a2 * y2;
        }
        y
    }

    #[test]
    fn test_autocorrelation_impulse() {
        let r = autocorrelation(&[1.0, 0.0, 0.0, 0.0], 3);
        assert_eq!(r, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_autocorrelation_lag_beyond_length() {
        let r = autocorrelation(&[1.0, 2.0], 4);
        assert_eq!(r, vec![5.0, 2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_levinson_first_order() {
        let (a, error) = levinson_durbin(&[1.0, 0.5], 1);
        assert!((a[0] + 0.5).abs() < 1e-12);
        assert!((error - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_levinson_zero_energy() {
        let (a, error) = levinson_durbin(&[0.0, 0.0, 0.0], 2);
        assert_eq!(a, vec![0.0, 0.0]);
        assert_eq!(error, 0.0);
    }

    #[test]
    fn test_lpc_recovers_ar2() {
        let signal = ar2_process(-1.3, 0.6, 20000);
        let a = lpc(&signal, 2);
        assert_eq!(a[0], 1.0);
        assert!((a[1] + 1.3).abs() < 0.05, "a1 = {}", a[1]);
        assert!((a[2] - 0.6).abs() < 0.05, "a2 = {}", a[2]);
    }

    #[test]
    fn test_polynomial_roots_real() {
        // (z - 1)(z - 2)(z - 3)
        let mut roots: Vec<f64> = polynomial_roots(&[1.0, -6.0, 11.0, -6.0])
            .iter()
            .map(|r| {
                assert!(r.im.abs() < 1e-9);
                r.re
            })
            .collect();
        roots.sort_by(f64::total_cmp);
        for (root, expected) in roots.iter().zip([1.0, 2.0, 3.0]) {
            assert!((root - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_polynomial_roots_complex_and_zero() {
        // z^3 + z = z (z - i)(z + i)
        let roots = polynomial_roots(&[1.0, 0.0, 1.0, 0.0]);
        assert_eq!(roots.len(), 3);
        assert!(roots.iter().any(|r| r.norm() < 1e-12));
        assert!(roots.iter().any(|r| (r - Complex64::new(0.0, 1.0)).norm() < 1e-9));
        assert!(roots.iter().any(|r| (r - Complex64::new(0.0, -1.0)).norm() < 1e-9));
    }

    #[test]
    fn test_allpole_to_sos_reconstructs_denominator() {
        let signal = ar2_process(-0.9, 0.2, 4000);
        let a = lpc(&signal, 8);
        let sections = allpole_to_sos(&a);
        assert_eq!(sections.len(), 4);

        let expanded = expand_denominators(&sections);
        for (x, y) in expanded.iter().zip(a.iter()) {
            assert!((x - y).abs() < 1e-8, "{x} vs {y}");
        }
    }

    #[test]
    fn test_allpole_to_sos_gain_on_first_section() {
        let sections = allpole_to_sos(&[2.0, -1.0, 0.5]);
        assert_eq!(sections.len(), 1);
        assert!((sections[0].b0 - 0.5).abs() < 1e-12);
        assert!((sections[0].a1 + 0.5).abs() < 1e-9);
        assert!((sections[0].a2 - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_allpole_to_sos_orders_by_radius() {
        // Poles at radius 0.5 (real pair) and 0.9 (complex pair)
        let inner = [1.0, -0.5 - 0.4, 0.5 * 0.4];
        let outer = [1.0, -2.0 * 0.9 * 0.6f64.cos(), 0.81];
        let a = crate::fir::convolve(&outer, &inner);
        let sections = allpole_to_sos(&a);
        assert_eq!(sections.len(), 2);
        assert!((sections[1].a2 - 0.81).abs() < 1e-9);
        assert!((sections[0].a2 - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_allpole_to_sos_trivial_polynomial() {
        let sections = allpole_to_sos(&[1.0]);
        assert_eq!(sections, vec![Sos::IDENTITY]);
    }
}
