//! Frame extraction
//!
//! Slices a signal into overlapping fixed-size frames. Frame `k` covers
//! samples `[k * hop_size, k * hop_size + frame_size)`; a trailing frame that
//! would read past the end of the signal is dropped rather than zero-padded.

use std::iter::FusedIterator;

/// One analysis frame borrowed from the signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame<'a> {
    /// Position of this frame in the sequence
    pub index: usize,
    /// Offset of the first sample in the signal
    pub start: usize,
    pub samples: &'a [f32],
}

/// Lazy iterator over the frames of a signal
///
/// Cloning the iterator (or calling [`frames`] again) restarts from the
/// beginning of the signal.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    signal: &'a [f32],
    frame_size: usize,
    hop_size: usize,
    next_index: usize,
    count: usize,
}

/// Create a frame iterator over `signal`
///
/// A zero `frame_size` or `hop_size` yields no frames.
pub fn frames(signal: &[f32], frame_size: usize, hop_size: usize) -> Frames<'_> {
    Frames {
        signal,
        frame_size,
        hop_size,
        next_index: 0,
        count: frame_count(signal.len(), frame_size, hop_size),
    }
}

/// Number of complete frames in a signal of `signal_len` samples
pub fn frame_count(signal_len: usize, frame_size: usize, hop_size: usize) -> usize {
    if frame_size == 0 || hop_size == 0 || signal_len < frame_size {
        return 0;
    }
    (signal_len - frame_size) / hop_size + 1
}

impl<'a> Iterator for Frames<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.count {
            return None;
        }

        let index = self.next_index;
        let start = index * self.hop_size;
        self.next_index += 1;

        Some(Frame {
            index,
            start,
            samples: &self.signal[start..start + self.frame_size],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next_index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}

impl FusedIterator for Frames<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_boundaries() {
        let signal: Vec<f32> = (0..10).map(|i| i as f32).collect();

        let collected: Vec<Frame> = frames(&signal, 4, 3).collect();

        assert_eq!(collected.len(), 3);
        assert_eq!(collected[0].samples, &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(collected[1].start, 3);
        assert_eq!(collected[2].index, 2);
        assert_eq!(collected[2].samples, &[6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_trailing_partial_frame_dropped() {
        let signal = vec![0.0f32; 11];

        let collected: Vec<Frame> = frames(&signal, 4, 3).collect();

        // A fourth frame would start at 9 and need samples up to 12.
        assert_eq!(collected.len(), 3);
        assert!(collected.iter().all(|f| f.samples.len() == 4));
    }

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(44100, 2048, 512), 83);
        assert_eq!(frame_count(2048, 2048, 512), 1);
        assert_eq!(frame_count(2047, 2048, 512), 0);
        assert_eq!(frame_count(100, 0, 10), 0);
        assert_eq!(frame_count(100, 10, 0), 0);
    }

    #[test]
    fn test_restartable_and_exact_size() {
        let signal = vec![0.25f32; 5000];
        let iter = frames(&signal, 1024, 256);

        assert_eq!(iter.len(), frame_count(5000, 1024, 256));

        let mut first_pass = iter.clone();
        first_pass.next();
        assert_eq!(first_pass.len(), iter.len() - 1);

        let starts: Vec<usize> = iter.clone().map(|f| f.start).collect();
        let again: Vec<usize> = frames(&signal, 1024, 256).map(|f| f.start).collect();
        assert_eq!(starts, again);
    }

    #[test]
    fn test_short_signal_yields_nothing() {
        let signal = vec![1.0f32; 100];
        assert_eq!(frames(&signal, 2048, 512).count(), 0);
    }
}
