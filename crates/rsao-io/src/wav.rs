//! B-format WAV reading and writing.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};
use rsao_analysis::BFormat;
use rsao_analysis::signal::BFORMAT_CHANNELS;

use crate::Result;

/// Read a 4-channel WAV file (W, X, Y, Z order) as a B-format impulse response.
///
/// Integer files are scaled to `[-1, 1)`; float files are read as-is. Files
/// with any other channel count are rejected with a configuration error.
///
/// # Example
/// ```ignore
/// let signal = read_bformat("room.wav")?;
/// println!("{} samples at {} Hz", signal.len(), signal.sample_rate());
/// ```
pub fn read_bformat<P: AsRef<Path>>(path: P) -> Result<BFormat> {
    let reader = WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    if channels != BFORMAT_CHANNELS {
        return Err(rsao_analysis::Error::configuration(format!(
            "'{}' has {channels} channels; a B-format impulse response needs {BFORMAT_CHANNELS}",
            path.as_ref().display()
        ))
        .into());
    }

    let samples: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = f64::from(1u32 << (spec.bits_per_sample - 1));
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    tracing::debug!(
        path = %path.as_ref().display(),
        frames = samples.len() / channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        "loaded B-format impulse response"
    );
    Ok(BFormat::from_interleaved(
        &samples,
        channels,
        f64::from(spec.sample_rate),
    )?)
}

/// Write a B-format impulse response as a 4-channel WAV file.
///
/// 32-bit files are written as float; other bit depths as integer PCM.
pub fn write_bformat<P: AsRef<Path>>(
    path: P,
    signal: &BFormat,
    bits_per_sample: u16,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels: BFORMAT_CHANNELS as u16,
        sample_rate: signal.sample_rate().round() as u32,
        bits_per_sample,
        sample_format: if bits_per_sample == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let mut writer = WavWriter::create(path, spec)?;
    let channels = signal.channels();

    if bits_per_sample == 32 {
        for i in 0..signal.len() {
            for channel in &channels {
                writer.write_sample(channel[i] as f32)?;
            }
        }
    } else {
        let max_val = f64::from(1u32 << (bits_per_sample - 1));
        for i in 0..signal.len() {
            for channel in &channels {
                let int_sample = (channel[i] * max_val).clamp(-max_val, max_val - 1.0) as i32;
                writer.write_sample(int_sample)?;
            }
        }
    }

    writer.finalize()?;
    Ok(())
}
