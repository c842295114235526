//! Integration tests for rsao-io file round trips.

use rsao_analysis::{BFormat, Encoder, EncoderConfig, RoomDimensions};
use rsao_io::{
    Error, RoomObject, load_config, read_bformat, save_config, write_bformat, write_room_object,
};
use tempfile::{NamedTempFile, tempdir};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Decaying impulse train, distinct per channel.
fn test_signal(len: usize, sample_rate: f64) -> BFormat {
    let channels = (0..4)
        .map(|c| {
            (0..len)
                .map(|i| {
                    let gain = 0.9 / (c + 1) as f64;
                    let decay = (-(i as f64) / 2000.0).exp();
                    if i % 97 == 0 { gain * decay } else { 0.01 * decay * (i as f64 * 0.3).sin() }
                })
                .collect()
        })
        .collect();
    BFormat::from_channels(channels, sample_rate).unwrap()
}

// ---------------------------------------------------------------------------
// WAV round trips
// ---------------------------------------------------------------------------

#[test]
fn bformat_roundtrip_float() {
    let signal = test_signal(4800, 48000.0);
    let file = NamedTempFile::new().unwrap();
    write_bformat(file.path(), &signal, 32).unwrap();

    let loaded = read_bformat(file.path()).unwrap();
    assert_eq!(loaded.len(), signal.len());
    assert_eq!(loaded.sample_rate(), 48000.0);
    for (original, restored) in signal.channels().iter().zip(loaded.channels()) {
        for (a, b) in original.iter().zip(restored) {
            assert!((a - b).abs() < 1e-6, "sample mismatch: {a} vs {b}");
        }
    }
}

#[test]
fn bformat_roundtrip_int24() {
    let signal = test_signal(2400, 44100.0);
    let file = NamedTempFile::new().unwrap();
    write_bformat(file.path(), &signal, 24).unwrap();

    let loaded = read_bformat(file.path()).unwrap();
    assert_eq!(loaded.sample_rate(), 44100.0);
    for (original, restored) in signal.channels().iter().zip(loaded.channels()) {
        for (a, b) in original.iter().zip(restored) {
            assert!((a - b).abs() < 1e-6, "sample mismatch: {a} vs {b}");
        }
    }
}

#[test]
fn stereo_file_is_rejected() {
    let file = NamedTempFile::new().unwrap();
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 48000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(file.path(), spec).unwrap();
    for _ in 0..100 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    let err = read_bformat(file.path()).unwrap_err();
    assert!(matches!(
        err,
        Error::Analysis(rsao_analysis::Error::Configuration(_))
    ));
}

#[test]
fn missing_wav_is_an_error() {
    assert!(matches!(
        read_bformat("/nonexistent/room.wav"),
        Err(Error::Wav(_))
    ));
}

// ---------------------------------------------------------------------------
// Configuration files
// ---------------------------------------------------------------------------

#[test]
fn config_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("encoder.toml");
    let config = EncoderConfig {
        n_discrete: 7,
        use_lpc: false,
        truncation_samples: Some(4800),
        ..Default::default()
    };
    save_config(&path, &config).unwrap();
    assert_eq!(load_config(&path).unwrap(), config);
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[test]
fn encode_and_write_room_object() {
    let dir = tempdir().unwrap();
    let wav = dir.path().join("room.wav");
    let json = dir.path().join("room.json");

    write_bformat(&wav, &test_signal(24000, 48000.0), 32).unwrap();
    let signal = read_bformat(&wav).unwrap();

    let config = EncoderConfig {
        n_discrete: 4,
        use_lpc: false,
        estimate_late: false,
        ..Default::default()
    };
    let params = Encoder::new(config).unwrap().encode(&signal, None).unwrap();
    let object = RoomObject::from_parameters(&params, "test_room", "extent").unwrap();
    write_room_object(&json, &object).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(written["name"], "test_room");
    assert_eq!(written["room"]["ereflect"].as_array().unwrap().len(), 4);
    assert!(written["room"].get("lreverb").is_none());
}

#[test]
fn room_dimensions_feed_late_estimation() {
    let signal = test_signal(48000, 48000.0);
    let room = RoomDimensions::new(6.0, 4.0, 3.0).unwrap();
    let config = EncoderConfig {
        n_discrete: 3,
        use_lpc: false,
        ..Default::default()
    };
    let params = Encoder::new(config).unwrap().encode(&signal, Some(&room)).unwrap();
    let object = RoomObject::from_parameters(&params, "small", "extent").unwrap();
    let late = object.room.lreverb.unwrap();
    assert_eq!(late.level.split(", ").count(), 9);
    assert_eq!(late.decayconst.split(", ").count(), 9);
}
