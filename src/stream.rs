//! Robust temporal smoothing for scalar measurement streams.
//!
//! A `RobustStream` keeps a bounded FIFO window of accepted samples and
//! reports the window median. Once enough samples exist to form a baseline,
//! new samples are gated by a median/MAD outlier test: single-frame spikes
//! are rejected while slow drift passes through and gradually shifts the
//! median.

use crate::constants::{MAD_FLOOR, MAD_SCALE, MIN_BASELINE_SAMPLES};
use std::collections::VecDeque;

/// Median of a slice, or `None` if it is empty
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let len = sorted.len();
    if len % 2 == 0 {
        Some((sorted[len / 2 - 1] + sorted[len / 2]) / 2.0)
    } else {
        Some(sorted[len / 2])
    }
}

/// Outlier-rejecting running median over a scalar signal
pub struct RobustStream {
    win: usize,
    k: f64,
    buffer: VecDeque<f64>,
}

impl RobustStream {
    /// Create a new stream with the given window size and gate factor
    ///
    /// # Panics
    ///
    /// Panics if `win` is zero or `k` is negative
    #[must_use]
    pub fn new(win: usize, k: f64) -> Self {
        assert!(win > 0, "Window size must be greater than 0");
        assert!(k >= 0.0, "Gate factor must be non-negative, got {k}");
        Self {
            win,
            k,
            buffer: VecDeque::with_capacity(win),
        }
    }

    /// Feed one frame's sample and return the current smoothed value
    ///
    /// A missing sample leaves the buffer untouched and returns the previous
    /// smoothed value. A present sample is accepted unconditionally while the
    /// buffer is below the baseline size; after that it must pass the
    /// median/MAD gate. Rejected samples also leave the buffer untouched.
    pub fn add(&mut self, sample: Option<f64>) -> Option<f64> {
        let Some(x) = sample else {
            return self.last();
        };

        if self.buffer.len() >= MIN_BASELINE_SAMPLES {
            let window: Vec<f64> = self.buffer.iter().copied().collect();
            // Buffer is non-empty here, both medians exist
            let m = median(&window).unwrap_or(x);
            let deviations: Vec<f64> = window.iter().map(|v| (v - m).abs()).collect();
            let mad = MAD_SCALE * median(&deviations).unwrap_or(0.0);
            // The floor keeps the gate open after a run of identical samples,
            // where MAD collapses to zero
            let threshold = self.k * mad.max(MAD_FLOOR);

            if (x - m).abs() > threshold {
                log::debug!("Rejected outlier sample {x:.3} (median {m:.3}, threshold {threshold:.3})");
                return self.last();
            }
        }

        if self.buffer.len() >= self.win {
            self.buffer.pop_front();
        }
        self.buffer.push_back(x);
        self.last()
    }

    /// Current smoothed value: the buffer median, or `None` when empty
    #[must_use]
    pub fn last(&self) -> Option<f64> {
        let window: Vec<f64> = self.buffer.iter().copied().collect();
        median(&window)
    }

    /// Drop all accepted history
    ///
    /// Must be called whenever the underlying physical scale changes, so that
    /// stale pre-calibration samples never mix with post-calibration ones.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Number of accepted samples currently buffered
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[cfg(test)]
    fn buffered(&self) -> Vec<f64> {
        self.buffer.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_missing_sample_is_a_no_op() {
        let mut stream = RobustStream::new(21, 3.5);
        assert_eq!(stream.add(None), None);

        stream.add(Some(10.0));
        stream.add(Some(12.0));
        let before = stream.buffered();

        assert_eq!(stream.add(None), Some(11.0));
        assert_eq!(stream.buffered(), before);
    }

    #[test]
    fn test_early_samples_bypass_gate() {
        let mut stream = RobustStream::new(21, 3.5);
        stream.add(Some(1.0));
        stream.add(Some(100.0));
        stream.add(Some(2.0));

        // All accepted unconditionally below the baseline size
        assert_eq!(stream.last(), Some(2.0));
        assert_eq!(stream.len(), 3);
    }

    #[test]
    fn test_stable_signal_rejects_spike() {
        let mut stream = RobustStream::new(21, 3.5);
        for _ in 0..5 {
            stream.add(Some(10.0));
        }

        // MAD is zero, floored to 1.0; threshold 3.5
        assert_eq!(stream.add(Some(1000.0)), Some(10.0));
        assert_eq!(stream.len(), 5);
        assert_eq!(stream.last(), Some(10.0));
    }

    #[test]
    fn test_fifo_eviction() {
        let mut stream = RobustStream::new(3, 3.5);
        stream.add(Some(1.0));
        stream.add(Some(2.0));
        stream.add(Some(3.0));
        stream.add(Some(4.0));

        assert_eq!(stream.buffered(), vec![2.0, 3.0, 4.0]);
        assert_eq!(stream.last(), Some(3.0));
    }

    #[test]
    fn test_slow_drift_passes_gate() {
        let mut stream = RobustStream::new(21, 3.5);
        let mut value = 10.0;
        for _ in 0..30 {
            value += 0.5;
            stream.add(Some(value));
        }

        // Drift within the gate tracks the signal
        let smoothed = stream.last().unwrap();
        assert!(smoothed > 17.0, "smoothed value {smoothed} did not track drift");
    }

    #[test]
    fn test_clear_empties_buffer() {
        let mut stream = RobustStream::new(21, 3.5);
        for i in 0..10 {
            stream.add(Some(f64::from(i)));
        }
        stream.clear();

        assert!(stream.is_empty());
        assert_eq!(stream.last(), None);
    }

    #[test]
    #[should_panic(expected = "Window size")]
    fn test_zero_window_panics() {
        let _ = RobustStream::new(0, 3.5);
    }
}
