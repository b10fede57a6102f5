//! CSV export of pitch contours
//!
//! Writes one row per frame:
//!
//! ```text
//! time,raw_hz,smoothed_hz
//! 0.000000,,
//! 0.011610,440.112,440.087
//! ```
//!
//! Frames without a pitch leave the frequency cell empty.

use crate::contour::PitchAnalysis;
use crate::pitch::PitchEstimate;
use crate::{PitchError, Result};
use csv::WriterBuilder;
use std::io::Write;

/// Column names of the exported CSV
pub const CSV_HEADER: [&str; 3] = ["time", "raw_hz", "smoothed_hz"];

/// Write both contours of `analysis` as CSV rows
pub fn write_contour_csv<W: Write>(writer: W, analysis: &PitchAnalysis) -> Result<()> {
    if analysis.raw.len() != analysis.smoothed.len() {
        return Err(PitchError::InvalidConfig(format!(
            "raw contour has {} frames but smoothed contour has {}",
            analysis.raw.len(),
            analysis.smoothed.len()
        )));
    }

    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for ((time, raw), smoothed) in analysis.raw.points().zip(analysis.smoothed.estimates()) {
        csv_writer.write_record([
            format!("{:.6}", time),
            format_frequency(raw),
            format_frequency(*smoothed),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn format_frequency(estimate: PitchEstimate) -> String {
    estimate
        .frequency()
        .map(|hz| format!("{:.3}", hz))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::Contour;
    use crate::pitch::PitchEstimate::{Absent, Present};

    #[test]
    fn test_write_rows() {
        let raw = Contour::new(vec![Absent, Present(440.1234), Present(880.0)], 441, 44100.0);
        let smoothed = raw.with_estimates(vec![Present(440.5), Present(440.25), Absent]);
        let analysis = PitchAnalysis { raw, smoothed };

        let mut out = Vec::new();
        write_contour_csv(&mut out, &analysis).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "time,raw_hz,smoothed_hz");
        assert_eq!(lines[1], "0.000000,,440.500");
        assert_eq!(lines[2], "0.010000,440.123,440.250");
        assert_eq!(lines[3], "0.020000,880.000,");
    }

    #[test]
    fn test_empty_analysis_writes_header_only() {
        let raw = Contour::new(Vec::new(), 512, 44100.0);
        let analysis = PitchAnalysis {
            smoothed: raw.clone(),
            raw,
        };

        let mut out = Vec::new();
        write_contour_csv(&mut out, &analysis).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "time,raw_hz,smoothed_hz\n");
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let raw = Contour::new(vec![Absent, Absent], 512, 44100.0);
        let smoothed = raw.with_estimates(vec![Absent]);

        let result = write_contour_csv(Vec::new(), &PitchAnalysis { raw, smoothed });
        assert!(result.is_err());
    }
}
