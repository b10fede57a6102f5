//! Pitch contour extraction library
//!
//! This crate estimates the fundamental frequency of a mono audio signal frame by
//! frame with the YIN algorithm and turns the per-frame estimates into a stable
//! contour through median and moving-average smoothing.
//!
//! Input samples are expected to be normalized to roughly [-1, 1]; the energy
//! gate of the estimator is calibrated for that scale.

use thiserror::Error;

pub mod contour;
pub mod export;
pub mod frame;
pub mod pitch;
pub mod smoothing;

#[cfg(feature = "audio")]
pub mod audio;

pub use contour::*;
pub use export::*;
pub use frame::*;
pub use pitch::*;
pub use smoothing::*;

#[cfg(feature = "audio")]
pub use audio::*;

/// Errors that can occur during pitch analysis
#[derive(Error, Debug)]
pub enum PitchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Non-finite sample at index {index}")]
    NonFiniteSample { index: usize },

    #[error("Non-finite sample at index {index} of frame {frame}")]
    NonFiniteSampleInFrame { frame: usize, index: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "audio")]
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for pitch analysis operations
pub type Result<T> = std::result::Result<T, PitchError>;

/// Main analysis function
///
/// Runs the YIN estimator over every frame of `signal` and smooths the result.
///
/// # Arguments
/// * `signal` - Mono samples at `params.sample_rate`
/// * `params` - Framing, frequency range and threshold settings
/// * `smoothing` - Window lengths of the median and moving-average passes
///
/// # Returns
/// * Both the raw and the smoothed contour, one entry per frame
pub fn analyze_signal(
    signal: &[f32],
    params: &FrameParameters,
    smoothing: &SmoothingConfig,
) -> Result<PitchAnalysis> {
    smoothing.validate()?;

    let raw = build_raw_contour(signal, params)?;
    let smoothed = smooth_contour(&raw, smoothing)?;

    log::debug!(
        "analyzed {} samples: {} frames, {} voiced raw, {} voiced smoothed",
        signal.len(),
        raw.len(),
        raw.voiced_count(),
        smoothed.voiced_count()
    );

    Ok(PitchAnalysis { raw, smoothed })
}
