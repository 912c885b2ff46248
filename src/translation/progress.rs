/*!
 * Progress accounting and ETA estimation for running jobs.
 */

use std::time::{Duration, Instant};

/// Completion fraction and remaining time at one point of a job
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEstimate {
    /// Cues processed
    pub completed: usize,
    /// Cues in the document
    pub total: usize,
    /// `completed / total`, in `0.0..=1.0`
    pub fraction: f64,
    /// Estimated remaining time; `None` until at least one cue is done
    pub eta: Option<Duration>,
}

/// Throughput based estimator, pure and O(1)
pub struct ProgressEstimator;

impl ProgressEstimator {
    /// Estimate progress from the cues completed so far and the elapsed time.
    ///
    /// `completed` is clamped to `total`. An empty job is complete with no ETA.
    pub fn estimate(completed: usize, total: usize, elapsed: Duration) -> ProgressEstimate {
        if total == 0 {
            return ProgressEstimate {
                completed: 0,
                total: 0,
                fraction: 1.0,
                eta: None,
            };
        }

        let completed = completed.min(total);
        let fraction = completed as f64 / total as f64;
        let eta = if completed == 0 {
            None
        } else {
            let remaining = (total - completed) as u128;
            let nanos = elapsed.as_nanos() * remaining / completed as u128;
            Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
        };

        ProgressEstimate {
            completed,
            total,
            fraction,
            eta,
        }
    }
}

/// Transient state of a running job
#[derive(Debug)]
pub struct JobProgress {
    total: usize,
    completed: usize,
    started_at: Instant,
    last_original: Option<String>,
    last_translated: Option<String>,
}

impl JobProgress {
    /// Start tracking a job over `total` cues
    pub fn start(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            started_at: Instant::now(),
            last_original: None,
            last_translated: None,
        }
    }

    /// Record one processed cue and return the updated estimate
    pub fn record(&mut self, original: &str, translated: &str) -> ProgressEstimate {
        self.completed = (self.completed + 1).min(self.total);
        self.last_original = Some(original.to_string());
        self.last_translated = Some(translated.to_string());
        self.estimate()
    }

    pub fn estimate(&self) -> ProgressEstimate {
        ProgressEstimator::estimate(self.completed, self.total, self.started_at.elapsed())
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn last_original(&self) -> Option<&str> {
        self.last_original.as_deref()
    }

    pub fn last_translated(&self) -> Option<&str> {
        self.last_translated.as_deref()
    }
}

/// Format a duration as `H:MM:SS.mmm`
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, duration.subsec_millis())
}

/// Format an optional ETA, `unknown` when not yet estimable
pub fn format_eta(eta: Option<Duration>) -> String {
    eta.map(format_duration).unwrap_or_else(|| "unknown".to_string())
}
