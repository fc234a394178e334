// ============================================================
// Layer 6 — Loss Tracking
// ============================================================
// Convergence summary of a training run. Every epoch's average
// loss is folded into a start window (first 20% of epochs) or an
// end window (last 20%), never both. When training finishes:
//
//   improvement = 100 − 100 · end_avg / start_avg   (percent)
//
// A zero start average or an empty window gives
// `Improvement::Undefined` instead of a division by zero.
//
// Everything here lives in memory for the length of one run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fraction of epochs in each comparison window.
const WINDOW_FRACTION: f64 = 0.2;

// ─── RunningAverage ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningAverage {
    sum:   f64,
    count: usize,
}

impl RunningAverage {
    pub fn add(&mut self, value: f64) {
        self.sum   += value;
        self.count += 1;
    }

    /// `None` until something was added.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

// ─── Improvement ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Improvement {
    Percent(f64),
    Undefined,
}

impl Improvement {
    pub fn between(start: Option<f64>, end: Option<f64>) -> Self {
        match (start, end) {
            (Some(start), Some(end)) if start != 0.0 => {
                Improvement::Percent(100.0 - 100.0 * end / start)
            }
            _ => Improvement::Undefined,
        }
    }
}

impl fmt::Display for Improvement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Improvement::Percent(p) => write!(f, "{p:.2}%"),
            Improvement::Undefined  => f.write_str("undefined"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceSummary {
    pub start_average: Option<f64>,
    pub end_average:   Option<f64>,
    pub improvement:   Improvement,
}

// ─── LossTracker ──────────────────────────────────────────────────────────────
/// Accumulates step losses per epoch and the start/end windows.
#[derive(Debug, Clone)]
pub struct LossTracker {
    epochs:       usize,
    current:      RunningAverage,
    epoch_losses: Vec<f64>,
    start:        RunningAverage,
    end:          RunningAverage,
}

impl LossTracker {
    pub fn new(epochs: usize) -> Self {
        Self {
            epochs,
            current:      RunningAverage::default(),
            epoch_losses: Vec::with_capacity(epochs),
            start:        RunningAverage::default(),
            end:          RunningAverage::default(),
        }
    }

    pub fn record_step(&mut self, loss: f64) {
        self.current.add(loss);
    }

    /// Close epoch `epoch` (0-based) and return its average loss.
    pub fn finish_epoch(&mut self, epoch: usize) -> Option<f64> {
        let average = self.current.mean();
        self.current = RunningAverage::default();

        if let Some(avg) = average {
            self.epoch_losses.push(avg);
            let e = epoch as f64;
            let n = self.epochs as f64;
            if e < WINDOW_FRACTION * n {
                self.start.add(avg);
            } else if e >= (1.0 - WINDOW_FRACTION) * n {
                self.end.add(avg);
            }
        }
        average
    }

    pub fn epoch_losses(&self) -> &[f64] {
        &self.epoch_losses
    }

    pub fn summary(&self) -> ConvergenceSummary {
        let start_average = self.start.mean();
        let end_average   = self.end.mean();
        ConvergenceSummary {
            start_average,
            end_average,
            improvement: Improvement::between(start_average, end_average),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn run(losses: &[f64]) -> LossTracker {
        let mut tracker = LossTracker::new(losses.len());
        for (epoch, &loss) in losses.iter().enumerate() {
            tracker.record_step(loss);
            tracker.finish_epoch(epoch);
        }
        tracker
    }

    #[test]
    fn test_linear_decrease_over_ten_epochs() {
        let losses: Vec<f64> = (0..10).map(|i| 1.0 - i as f64 / 9.0).collect();
        let summary = run(&losses).summary();

        // start = (1 + 8/9) / 2 = 17/18, end = (1/9 + 0) / 2 = 1/18
        let start = summary.start_average.unwrap();
        let end   = summary.end_average.unwrap();
        assert!((start - 17.0 / 18.0).abs() < 1e-12);
        assert!((end - 1.0 / 18.0).abs() < 1e-12);

        match summary.improvement {
            Improvement::Percent(p) => assert!((p - (100.0 - 100.0 / 17.0)).abs() < 1e-9),
            Improvement::Undefined  => panic!("improvement should be defined"),
        }
        assert_eq!(summary.improvement.to_string(), "94.12%");
    }

    #[test]
    fn test_zero_start_is_undefined() {
        let summary = run(&[0.0; 10]).summary();
        assert_eq!(summary.improvement, Improvement::Undefined);
        assert_eq!(summary.improvement.to_string(), "undefined");
    }

    #[test]
    fn test_window_averages_use_epoch_counts() {
        // 7 epochs: start window epochs 0, 1 (< 1.4), end window 6 (≥ 5.6)
        let summary = run(&[4.0, 2.0, 9.0, 9.0, 9.0, 9.0, 1.5]).summary();
        assert_eq!(summary.start_average, Some(3.0));
        assert_eq!(summary.end_average,   Some(1.5));
        assert_eq!(summary.improvement,   Improvement::Percent(50.0));
    }

    #[test]
    fn test_short_runs_have_no_end_window() {
        // below 5 epochs the last index is under 0.8 · epochs
        let summary = run(&[2.0, 1.0, 0.5]).summary();
        assert_eq!(summary.start_average, Some(2.0));
        assert_eq!(summary.end_average,   None);
        assert_eq!(summary.improvement,   Improvement::Undefined);
    }

    #[test]
    fn test_epoch_average_of_steps() {
        let mut tracker = LossTracker::new(1);
        for loss in [1.0, 2.0, 3.0] {
            tracker.record_step(loss);
        }
        assert_eq!(tracker.finish_epoch(0), Some(2.0));
        assert_eq!(tracker.epoch_losses(), &[2.0]);
        assert_eq!(tracker.finish_epoch(1), None);
    }
}
