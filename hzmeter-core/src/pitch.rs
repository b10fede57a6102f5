//! YIN pitch estimation
//!
//! This module implements the YIN fundamental frequency estimator
//! (A. de Cheveigné and H. Kawahara, 2002) for a single frame.
//!
//! Steps, in order:
//! - RMS energy gate on the mean-removed frame
//! - Squared difference function over a fixed comparison window
//! - Cumulative mean normalized difference (CMND)
//! - First threshold-crossing dip, falling back to the global minimum
//! - Parabolic interpolation for sub-sample accuracy
//! - Range, cycle-count and confidence validation
//!
//! The estimator keeps no state between frames; every call is a pure function
//! of the frame and the parameters.

use crate::{PitchError, Result};

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;
/// Default frame size in samples
pub const DEFAULT_FRAME_SIZE: usize = 2048;
/// Default hop size in samples
pub const DEFAULT_HOP_SIZE: usize = 512;
/// Default lowest accepted pitch in Hz
pub const DEFAULT_FMIN: f64 = 50.0;
/// Default CMND acceptance threshold
pub const DEFAULT_CMND_THRESHOLD: f64 = 0.15;
/// Default RMS silence gate for [-1, 1] normalized input
pub const DEFAULT_ENERGY_THRESHOLD: f64 = 0.01;

const MIN_CYCLES: f64 = 2.0;
const INTERPOLATION_EPSILON: f64 = 1e-12;

/// Upper frequency presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyRange {
    /// Voice and most melodic instruments, up to 2 kHz
    Low,
    /// Whistles and high instruments, up to 5 kHz
    Extended,
}

impl FrequencyRange {
    pub fn fmax(self) -> f64 {
        match self {
            FrequencyRange::Low => 2000.0,
            FrequencyRange::Extended => 5000.0,
        }
    }
}

/// Configuration for framing and per-frame pitch estimation
#[derive(Debug, Clone, PartialEq)]
pub struct FrameParameters {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Samples per analysis frame (default: 2048)
    pub frame_size: usize,
    /// Samples advanced between frames (default: 512)
    pub hop_size: usize,
    /// Lowest accepted fundamental in Hz (default: 50)
    pub fmin: f64,
    /// Highest accepted fundamental in Hz (default: 2000)
    pub fmax: f64,
    /// CMND threshold for accepting a lag (default: 0.15)
    pub cmnd_threshold: f64,
    /// RMS below which a frame is treated as silence (default: 0.01)
    pub energy_threshold: f64,
}

impl Default for FrameParameters {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
            hop_size: DEFAULT_HOP_SIZE,
            fmin: DEFAULT_FMIN,
            fmax: FrequencyRange::Low.fmax(),
            cmnd_threshold: DEFAULT_CMND_THRESHOLD,
            energy_threshold: DEFAULT_ENERGY_THRESHOLD,
        }
    }
}

impl FrameParameters {
    /// Default parameters for a given sample rate
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Default::default()
        }
    }

    /// Replace `fmax` with a preset
    pub fn with_range(mut self, range: FrequencyRange) -> Self {
        self.fmax = range.fmax();
        self
    }

    /// Seconds between the starts of consecutive frames
    pub fn hop_seconds(&self) -> f64 {
        self.hop_size as f64 / self.sample_rate
    }

    /// Check every invariant; called once before any frame is processed
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(invalid(format!("sample rate must be positive, got {}", self.sample_rate)));
        }
        if self.frame_size == 0 {
            return Err(invalid("frame size must be positive".to_string()));
        }
        if self.hop_size == 0 {
            return Err(invalid("hop size must be positive".to_string()));
        }
        if self.hop_size > self.frame_size {
            return Err(invalid(format!(
                "hop size {} exceeds frame size {}",
                self.hop_size, self.frame_size
            )));
        }
        if !self.fmin.is_finite() || self.fmin <= 0.0 {
            return Err(invalid(format!("fmin must be positive, got {}", self.fmin)));
        }
        if !self.fmax.is_finite() || self.fmin >= self.fmax {
            return Err(invalid(format!(
                "fmin ({}) must be below fmax ({})",
                self.fmin, self.fmax
            )));
        }
        if self.fmax > self.sample_rate / 2.0 {
            return Err(invalid(format!(
                "fmax {} Hz is above the Nyquist frequency {} Hz",
                self.fmax,
                self.sample_rate / 2.0
            )));
        }
        if !self.cmnd_threshold.is_finite() || self.cmnd_threshold <= 0.0 {
            return Err(invalid(format!(
                "CMND threshold must be positive, got {}",
                self.cmnd_threshold
            )));
        }
        if !self.energy_threshold.is_finite() || self.energy_threshold < 0.0 {
            return Err(invalid(format!(
                "energy threshold must be non-negative, got {}",
                self.energy_threshold
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> PitchError {
    PitchError::InvalidConfig(message)
}

/// Pitch of one frame, or no reliable pitch
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PitchEstimate {
    /// Fundamental frequency in Hz
    Present(f64),
    #[default]
    Absent,
}

impl PitchEstimate {
    pub fn frequency(self) -> Option<f64> {
        match self {
            PitchEstimate::Present(hz) => Some(hz),
            PitchEstimate::Absent => None,
        }
    }

    pub fn is_present(self) -> bool {
        matches!(self, PitchEstimate::Present(_))
    }

    pub fn is_absent(self) -> bool {
        !self.is_present()
    }
}

impl From<Option<f64>> for PitchEstimate {
    fn from(value: Option<f64>) -> Self {
        value.map_or(PitchEstimate::Absent, PitchEstimate::Present)
    }
}

/// Why a frame produced no pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// RMS below the energy threshold
    LowEnergy,
    /// Frame too short to search any lag in the frequency range
    FrameTooShort,
    /// Candidate frequency outside [fmin, fmax]
    OutOfRange,
    /// Fewer than two periods fit in the frame
    TooFewCycles,
    /// CMND at the candidate lag not below twice the threshold
    LowConfidence,
}

/// Estimate plus the intermediate values that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub estimate: PitchEstimate,
    /// RMS of the mean-removed frame
    pub rms: f64,
    /// Integer lag chosen by candidate selection
    pub lag: Option<usize>,
    /// Lag after parabolic interpolation
    pub refined_lag: Option<f64>,
    /// CMND value at the integer lag
    pub cmnd: Option<f64>,
    /// True if no lag cleared the threshold and the global minimum was used
    pub used_fallback: bool,
    pub rejection: Option<Rejection>,
}

impl FrameAnalysis {
    fn rejected(rms: f64, rejection: Rejection) -> Self {
        Self {
            estimate: PitchEstimate::Absent,
            rms,
            lag: None,
            refined_lag: None,
            cmnd: None,
            used_fallback: false,
            rejection: Some(rejection),
        }
    }
}

/// YIN estimator configured from [`FrameParameters`]
#[derive(Debug, Clone, PartialEq)]
pub struct YinEstimator {
    sample_rate: f64,
    fmin: f64,
    fmax: f64,
    threshold: f64,
    energy_threshold: f64,
}

impl YinEstimator {
    pub fn new(params: &FrameParameters) -> Self {
        Self {
            sample_rate: params.sample_rate,
            fmin: params.fmin,
            fmax: params.fmax,
            threshold: params.cmnd_threshold,
            energy_threshold: params.energy_threshold,
        }
    }

    /// Estimate the pitch of one frame
    pub fn estimate(&self, frame: &[f32]) -> Result<PitchEstimate> {
        Ok(self.analyze_frame(frame)?.estimate)
    }

    /// Estimate the pitch of one frame, keeping the diagnostics
    ///
    /// Fails only if the frame contains a NaN or infinite sample.
    pub fn analyze_frame(&self, frame: &[f32]) -> Result<FrameAnalysis> {
        if let Some(index) = frame.iter().position(|s| !s.is_finite()) {
            return Err(PitchError::NonFiniteSample { index });
        }
        if frame.is_empty() {
            return Ok(FrameAnalysis::rejected(0.0, Rejection::FrameTooShort));
        }

        let n = frame.len();
        let mean = frame.iter().map(|&s| s as f64).sum::<f64>() / n as f64;
        let centered: Vec<f64> = frame.iter().map(|&s| s as f64 - mean).collect();

        let rms = (centered.iter().map(|x| x * x).sum::<f64>() / n as f64).sqrt();
        if rms < self.energy_threshold {
            return Ok(FrameAnalysis::rejected(rms, Rejection::LowEnergy));
        }

        let tau_max = (n / 2).min((self.sample_rate / self.fmin) as usize);
        let tau_min = ((self.sample_rate / self.fmax) as usize).max(2);
        if tau_min >= tau_max {
            return Ok(FrameAnalysis::rejected(rms, Rejection::FrameTooShort));
        }

        let diff = difference_function(&centered, tau_max);
        let cmnd = cumulative_mean_normalized_difference(&diff);

        let (lag, used_fallback) = match first_threshold_dip(&cmnd, tau_min, self.threshold) {
            Some(lag) => (lag, false),
            None => (global_minimum(&cmnd, tau_min), true),
        };

        let refined_lag = parabolic_interpolation(&cmnd, lag);
        let frequency = self.sample_rate / refined_lag;
        let rejection = self.check_candidate(n, refined_lag, cmnd[lag]);

        Ok(FrameAnalysis {
            estimate: match rejection {
                None => PitchEstimate::Present(frequency),
                Some(_) => PitchEstimate::Absent,
            },
            rms,
            lag: Some(lag),
            refined_lag: Some(refined_lag),
            cmnd: Some(cmnd[lag]),
            used_fallback,
            rejection,
        })
    }

    /// Range, cycle-count and confidence checks for a candidate lag in a
    /// frame of `n` samples
    fn check_candidate(&self, n: usize, refined_lag: f64, cmnd: f64) -> Option<Rejection> {
        let frequency = self.sample_rate / refined_lag;
        if frequency < self.fmin || frequency > self.fmax {
            Some(Rejection::OutOfRange)
        } else if (n as f64) / refined_lag < MIN_CYCLES {
            Some(Rejection::TooFewCycles)
        } else if cmnd >= 2.0 * self.threshold {
            Some(Rejection::LowConfidence)
        } else {
            None
        }
    }
}

/// Estimate the pitch of a single frame with the default energy gate
///
/// # Arguments
/// * `frame` - Samples normalized to roughly [-1, 1]
/// * `sample_rate` - Sample rate in Hz
/// * `fmin`, `fmax` - Accepted pitch range in Hz
/// * `threshold` - CMND acceptance threshold (0.1-0.2 typical)
///
/// # Returns
/// * [`PitchEstimate::Absent`] for silence, noise or ambiguous frames
pub fn estimate(
    frame: &[f32],
    sample_rate: f64,
    fmin: f64,
    fmax: f64,
    threshold: f64,
) -> Result<PitchEstimate> {
    let estimator = YinEstimator {
        sample_rate,
        fmin,
        fmax,
        threshold,
        energy_threshold: DEFAULT_ENERGY_THRESHOLD,
    };
    estimator.estimate(frame)
}

/// d(tau) for tau in 0..=tau_max, every lag compared over the same
/// `frame.len() - tau_max` samples
fn difference_function(frame: &[f64], tau_max: usize) -> Vec<f64> {
    let window = frame.len() - tau_max;
    let mut diff = vec![0.0; tau_max + 1];

    for (tau, d) in diff.iter_mut().enumerate().skip(1) {
        *d = frame[..window]
            .iter()
            .zip(&frame[tau..tau + window])
            .map(|(a, b)| {
                let delta = a - b;
                delta * delta
            })
            .sum();
    }

    diff
}

fn cumulative_mean_normalized_difference(diff: &[f64]) -> Vec<f64> {
    let mut cmnd = vec![1.0; diff.len()];

    let mut running_sum = 0.0;
    for tau in 1..diff.len() {
        running_sum += diff[tau];
        if running_sum > 0.0 {
            cmnd[tau] = diff[tau] * tau as f64 / running_sum;
        }
    }

    cmnd
}

/// First lag at or after `tau_min` below `threshold` that is also a local
/// minimum. The last lag has no right neighbour and counts as a minimum.
fn first_threshold_dip(cmnd: &[f64], tau_min: usize, threshold: f64) -> Option<usize> {
    let tau_max = cmnd.len() - 1;
    (tau_min..=tau_max).find(|&tau| {
        cmnd[tau] < threshold && (tau == tau_max || cmnd[tau] <= cmnd[tau + 1])
    })
}

fn global_minimum(cmnd: &[f64], tau_min: usize) -> usize {
    let mut best = tau_min;
    for tau in tau_min + 1..cmnd.len() {
        if cmnd[tau] < cmnd[best] {
            best = tau;
        }
    }
    best
}

/// Vertex of the parabola through (tau-1, tau, tau+1)
fn parabolic_interpolation(cmnd: &[f64], tau: usize) -> f64 {
    if tau == 0 || tau + 1 >= cmnd.len() {
        return tau as f64;
    }

    let alpha = cmnd[tau - 1];
    let beta = cmnd[tau];
    let gamma = cmnd[tau + 1];

    let denominator = alpha - 2.0 * beta + gamma;
    if denominator.abs() < INTERPOLATION_EPSILON {
        return tau as f64;
    }

    let offset = (alpha - gamma) / (2.0 * denominator);
    if offset.abs() < 1.0 {
        tau as f64 + offset
    } else {
        tau as f64
    }
}
