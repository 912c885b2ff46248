/*!
 * Subtitle translation pipeline.
 *
 * - `job`: the per-document state machine and its event stream
 * - `progress`: completion fraction and ETA estimation
 */

// Re-export main types for easier usage
pub use self::job::{JobEvent, JobOutcome, JobState, ProgressEvent, TranslationJob, TranslationRequest};
pub use self::progress::{format_duration, format_eta, JobProgress, ProgressEstimate, ProgressEstimator};

// Submodules
pub mod job;
pub mod progress;
