//! Throttled progress and ETA reporting for long batches

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// One progress line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub completed: usize,
    pub total: usize,
    pub elapsed: Duration,
    /// `elapsed / completed * remaining`
    pub eta: Duration,
}

impl ProgressReport {
    pub fn new(completed: usize, total: usize, elapsed: Duration) -> Self {
        let remaining = total.saturating_sub(completed);
        let eta = if completed == 0 {
            Duration::ZERO
        } else {
            elapsed.mul_f64(remaining as f64 / completed as f64)
        };
        Self {
            completed,
            total,
            elapsed,
            eta,
        }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }
}

fn hms(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% ({}/{}), elapsed {}, ETA {}",
            self.percent(),
            self.completed,
            self.total,
            hms(self.elapsed),
            hms(self.eta)
        )
    }
}

/// Counts finished work items from any thread and logs at most once per
/// interval (plus once on completion)
#[derive(Debug)]
pub struct Progress {
    total: usize,
    completed: AtomicUsize,
    started: Instant,
    interval: Duration,
    last_report: Mutex<Option<Instant>>,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            started: Instant::now(),
            interval: Duration::from_secs(1),
            last_report: Mutex::new(None),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> ProgressReport {
        ProgressReport::new(self.completed(), self.total, self.started.elapsed())
    }

    /// Record one finished item; returns the report if one was due
    pub fn tick(&self) -> Option<ProgressReport> {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        let now = Instant::now();
        {
            let mut last = self.last_report.lock();
            let due = completed >= self.total
                || last.is_none_or(|at| now.duration_since(at) >= self.interval);
            if !due {
                return None;
            }
            *last = Some(now);
        }
        let report = ProgressReport::new(completed, self.total, now.duration_since(self.started));
        info!("{report}");
        Some(report)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn eta_scales_with_remaining_work() {
        let report = ProgressReport::new(25, 100, Duration::from_secs(10));
        assert_eq!(report.eta, Duration::from_secs(30));
        assert_relative_eq!(report.percent(), 25.0);
        assert_eq!(report.to_string(), "25.0% (25/100), elapsed 00:00:10, ETA 00:00:30");
    }

    #[test]
    fn nothing_done_has_no_eta() {
        let report = ProgressReport::new(0, 10, Duration::from_secs(3));
        assert_eq!(report.eta, Duration::ZERO);
    }

    #[test]
    fn ticks_are_throttled() {
        let progress = Progress::new(5).with_interval(Duration::from_secs(3600));
        // First tick always reports
        assert!(progress.tick().is_some());
        assert!(progress.tick().is_none());
        assert!(progress.tick().is_none());
        assert!(progress.tick().is_none());
        // Completion always reports
        let last = progress.tick().expect("final report");
        assert_eq!(last.completed, 5);
        assert_eq!(progress.completed(), 5);
    }

    #[test]
    fn hms_formatting() {
        assert_eq!(hms(Duration::from_secs(3725)), "01:02:05");
    }
}
