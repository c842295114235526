//! Property-based tests for the analysis stages.

use proptest::prelude::*;
use rsao_analysis::decay::energy_decay_curve;
use rsao_analysis::early::{EarlyMeasurement, normalize_early};
use rsao_analysis::spectral::{NOISE_GAIN_SPAN, SpectralModel};
use rsao_analysis::{Doa, PeakDetector, PeakDetectorConfig, ReflectionLabel};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decay_curve_never_rises(ir in prop::collection::vec(-1.0f64..1.0, 1..2000)) {
        let decay = energy_decay_curve(&ir);
        prop_assert!(decay.db.windows(2).all(|w| w[1] <= w[0]));
        prop_assert!(decay.db.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn peak_detection_has_no_hidden_state(
        ir in prop::collection::vec(-1.0f64..1.0, 500..3000),
        use_lpc in any::<bool>(),
    ) {
        let config = PeakDetectorConfig { use_lpc, ..Default::default() };
        let detector = PeakDetector::new(48000.0, config);
        prop_assert_eq!(detector.detect(&ir), detector.detect(&ir));
    }

    #[test]
    fn detected_strengths_are_normalized(ir in prop::collection::vec(-1.0f64..1.0, 500..3000)) {
        let config = PeakDetectorConfig { use_lpc: false, ..Default::default() };
        if let Ok(peaks) = PeakDetector::new(48000.0, config).detect(&ir) {
            let max = peaks.strengths().iter().copied().fold(0.0, f64::max);
            prop_assert_eq!(max, 1.0);
            prop_assert!(peaks.strengths().iter().all(|s| (0.0..=1.0).contains(s)));
            prop_assert_eq!(peaks.len(), ir.len());
        }
    }

    #[test]
    fn coloration_filters_have_unit_noise_gain(
        segment in prop::collection::vec(-1.0f64..1.0, 128..256),
        order in prop_oneof![Just(8usize), Just(16usize)],
    ) {
        let model = SpectralModel::fit(&segment, order);
        let energy = model.cascade.impulse_energy(NOISE_GAIN_SPAN);
        prop_assert!((energy - 1.0).abs() < 1e-6, "energy {}", energy);
    }

    #[test]
    fn direct_sound_anchors_time_and_level(
        onsets in prop::collection::btree_set(0usize..40000, 2..12),
        levels in prop::collection::vec(0.01f64..2.0, 12),
    ) {
        let measurements: Vec<EarlyMeasurement> = onsets
            .iter()
            .enumerate()
            .map(|(i, &onset)| EarlyMeasurement {
                label: ReflectionLabel::early(i),
                onset,
                level: levels[i],
                doa: Doa::default(),
                window_samples: 128,
                filter_sections: Vec::new(),
            })
            .collect();
        let early = normalize_early(measurements, 48000.0).unwrap();
        let direct_onset = *onsets.iter().next().unwrap();

        prop_assert_eq!(early[&ReflectionLabel::DirectSound].toa, 0.0);
        prop_assert_eq!(early[&ReflectionLabel::DirectSound].level, levels[0]);
        for (i, &onset) in onsets.iter().enumerate().skip(1) {
            let params = &early[&ReflectionLabel::early(i)];
            let expected_toa = (onset - direct_onset) as f64 / 48000.0;
            prop_assert!((params.toa - expected_toa).abs() < 1e-12);
            prop_assert!((params.level - levels[i] / levels[0]).abs() < 1e-12);
        }
    }
}
