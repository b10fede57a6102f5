//! Contour building
//!
//! Runs the estimator over every frame of a signal, in order, and collects
//! one [`PitchEstimate`] per frame. Frames are analyzed independently; all
//! temporal continuity comes from the smoothing passes.

use crate::frame::frames;
use crate::pitch::{FrameParameters, PitchEstimate, YinEstimator};
use crate::{PitchError, Result};

/// Per-frame pitch estimates with the timing needed to place them
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    estimates: Vec<PitchEstimate>,
    hop_size: usize,
    sample_rate: f64,
}

impl Contour {
    pub fn new(estimates: Vec<PitchEstimate>, hop_size: usize, sample_rate: f64) -> Self {
        Self {
            estimates,
            hop_size,
            sample_rate,
        }
    }

    /// New contour with the same timing as this one
    pub fn with_estimates(&self, estimates: Vec<PitchEstimate>) -> Self {
        Self::new(estimates, self.hop_size, self.sample_rate)
    }

    pub fn estimates(&self) -> &[PitchEstimate] {
        &self.estimates
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Start time of frame `index` in seconds
    pub fn time_of(&self, index: usize) -> f64 {
        index as f64 * self.hop_size as f64 / self.sample_rate
    }

    /// `(time_seconds, estimate)` for every frame
    pub fn points(&self) -> impl Iterator<Item = (f64, PitchEstimate)> + '_ {
        self.estimates
            .iter()
            .enumerate()
            .map(|(i, &estimate)| (self.time_of(i), estimate))
    }

    /// Defined frequencies only, in frame order
    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        self.estimates.iter().filter_map(|e| e.frequency())
    }

    pub fn voiced_count(&self) -> usize {
        self.estimates.iter().filter(|e| e.is_present()).count()
    }
}

/// Raw and smoothed contours of one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct PitchAnalysis {
    pub raw: Contour,
    pub smoothed: Contour,
}

/// Estimate the pitch of every frame of `signal`
///
/// Parameters are validated before the first frame is touched. A NaN or
/// infinite sample aborts the run.
pub fn build_raw_contour(signal: &[f32], params: &FrameParameters) -> Result<Contour> {
    params.validate()?;

    let estimator = YinEstimator::new(params);
    let estimates = frames(signal, params.frame_size, params.hop_size)
        .map(|frame| -> Result<PitchEstimate> {
            let analysis = estimator.analyze_frame(frame.samples).map_err(|err| match err {
                PitchError::NonFiniteSample { index } => PitchError::NonFiniteSampleInFrame {
                    frame: frame.index,
                    index: frame.start + index,
                },
                other => other,
            })?;

            log::trace!(
                "frame {}: {:?}, rms {:.4}, lag {:?}, refined {:?}, cmnd {:?}, fallback {}, rejected {:?}",
                frame.index,
                analysis.estimate,
                analysis.rms,
                analysis.lag,
                analysis.refined_lag,
                analysis.cmnd,
                analysis.used_fallback,
                analysis.rejection
            );

            Ok(analysis.estimate)
        })
        .collect::<Result<Vec<_>>>()?;

    let contour = Contour::new(estimates, params.hop_size, params.sample_rate);
    log::debug!(
        "raw contour: {} frames, {} voiced",
        contour.len(),
        contour.voiced_count()
    );

    Ok(contour)
}

/// Statistics over the defined entries of a contour
#[derive(Debug, Clone, PartialEq)]
pub struct ContourSummary {
    pub frames: usize,
    pub voiced_frames: usize,
    /// Time span covered by the frame starts, in seconds
    pub duration_seconds: f64,
    pub mean_hz: Option<f64>,
    pub min_hz: Option<f64>,
    pub max_hz: Option<f64>,
    /// Population standard deviation
    pub std_dev_hz: Option<f64>,
}

impl ContourSummary {
    pub fn from_contour(contour: &Contour) -> Self {
        let values: Vec<f64> = contour.frequencies().collect();
        let duration_seconds = contour.len().checked_sub(1).map_or(0.0, |last| contour.time_of(last));

        if values.is_empty() {
            return Self {
                frames: contour.len(),
                voiced_frames: 0,
                duration_seconds,
                mean_hz: None,
                min_hz: None,
                max_hz: None,
                std_dev_hz: None,
            };
        }

        let count = values.len() as f64;
        let mean = values.iter().sum::<f64>() / count;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

        Self {
            frames: contour.len(),
            voiced_frames: values.len(),
            duration_seconds,
            mean_hz: Some(mean),
            min_hz: values.iter().copied().reduce(f64::min),
            max_hz: values.iter().copied().reduce(f64::max),
            std_dev_hz: Some(variance.sqrt()),
        }
    }
}
