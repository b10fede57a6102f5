//! Contour smoothing
//!
//! Two centered passes over a raw contour: a median filter that removes
//! single-frame spikes without blurring real steps, then a short moving
//! average for jitter. Both passes only ever combine defined frequencies;
//! an absent estimate is never averaged in as a number. Windows shrink at the
//! contour edges instead of padding.

use crate::contour::Contour;
use crate::pitch::PitchEstimate;
use crate::{PitchError, Result};

/// Window lengths for the smoothing passes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmoothingConfig {
    /// Median filter length in frames, odd (default: 5)
    pub median_window: usize,
    /// Moving average length in frames, odd (default: 3)
    pub average_window: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            median_window: 5,
            average_window: 3,
        }
    }
}

impl SmoothingConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, window) in [
            ("median window", self.median_window),
            ("average window", self.average_window),
        ] {
            if window == 0 || window % 2 == 0 {
                return Err(PitchError::InvalidConfig(format!(
                    "{} must be odd and positive, got {}",
                    name, window
                )));
            }
        }
        Ok(())
    }
}

/// Apply the median filter, then the moving average
///
/// Returns a new contour; `raw` is left untouched.
pub fn smooth_contour(raw: &Contour, config: &SmoothingConfig) -> Result<Contour> {
    config.validate()?;

    let despiked = median_filter(raw, config.median_window);
    Ok(moving_average(&despiked, config.average_window))
}

/// Centered median over the defined values in each window
pub fn median_filter(contour: &Contour, window: usize) -> Contour {
    contour.with_estimates(windowed(contour.estimates(), window, median))
}

/// Centered mean over the defined values in each window
pub fn moving_average(contour: &Contour, window: usize) -> Contour {
    contour.with_estimates(windowed(contour.estimates(), window, |values| {
        values.iter().sum::<f64>() / values.len() as f64
    }))
}

/// Reduce the defined values of every centered window. Windows with no
/// defined value produce `Absent`.
fn windowed<F>(estimates: &[PitchEstimate], window: usize, mut reduce: F) -> Vec<PitchEstimate>
where
    F: FnMut(&mut [f64]) -> f64,
{
    let half = window / 2;
    let mut values = Vec::with_capacity(window);

    (0..estimates.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(estimates.len());

            values.clear();
            values.extend(estimates[start..end].iter().filter_map(|e| e.frequency()));

            if values.is_empty() {
                PitchEstimate::Absent
            } else {
                PitchEstimate::Present(reduce(values.as_mut_slice()))
            }
        })
        .collect()
}

/// Median of a non-empty slice; mean of the middle pair for even lengths
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
