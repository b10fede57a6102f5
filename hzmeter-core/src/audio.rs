//! WAV input
//!
//! Decodes WAV files into mono `f32` samples normalized to [-1, 1], the scale
//! the estimator's energy gate is calibrated for. Audio is analyzed at the
//! file's own sample rate; nothing is resampled.

use crate::{PitchError, Result};
use hound::{SampleFormat, WavReader};
use std::io::Read;
use std::path::Path;

/// Mono samples tagged with their sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioSignal {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Read a WAV file from disk
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<AudioSignal> {
    let reader = WavReader::open(path.as_ref())?;
    decode(reader)
}

/// Read WAV data from any reader
pub fn read_wav<R: Read>(reader: R) -> Result<AudioSignal> {
    decode(WavReader::new(reader)?)
}

fn decode<R: Read>(mut reader: WavReader<R>) -> Result<AudioSignal> {
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(PitchError::UnsupportedFormat("WAV file has no channels".to_string()));
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = match spec.bits_per_sample {
                8 => i8::MAX as f32,
                16 => i16::MAX as f32,
                24 => 8388607.0, // 2^23 - 1
                32 => i32::MAX as f32,
                bits => {
                    return Err(PitchError::UnsupportedFormat(format!(
                        "{}-bit integer samples",
                        bits
                    )))
                }
            };

            reader
                .samples::<i32>()
                .map(|sample| sample.map(|s| s as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let mono = if spec.channels == 1 {
        samples
    } else {
        samples
            .chunks(spec.channels as usize)
            .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
            .collect()
    };

    log::debug!(
        "decoded WAV: {} Hz, {} channel(s), {}-bit {:?}, {} mono samples",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format,
        mono.len()
    );

    Ok(AudioSignal {
        samples: mono,
        sample_rate: spec.sample_rate,
    })
}

/// Scale `samples` so that the absolute peak equals `target_level`
///
/// Silent input, or a target that is not a positive finite number, leaves the
/// samples unchanged.
pub fn normalize_peak(samples: &mut [f32], target_level: f32) {
    if !target_level.is_finite() || target_level <= 0.0 {
        return;
    }

    let peak = samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    if peak <= f32::EPSILON || !peak.is_finite() {
        return;
    }

    let gain = target_level / peak;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}
