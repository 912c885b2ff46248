/*!
 * # subtrans - subtitle translation with interchangeable backends
 *
 * A Rust library for translating SRT subtitles cue by cue.
 *
 * ## Features
 *
 * - Strict SRT parsing and writing that preserves cue order, indices and timing
 * - Translation through one of several backends behind a single trait:
 *   - Google Translate web endpoint
 *   - Microsoft Translator
 *   - OpenAI chat completions
 *   - PONS dictionary
 *   - Ollama (local LLM)
 * - Background jobs streaming progress and ETA events
 * - Persistent job history shared safely between jobs
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: Subtitle file handling and processing
 * - `providers`: The `TranslationBackend` trait, its adapters and the backend registry
 * - `translation`: Job orchestration:
 *   - `translation::job`: Per-document state machine and event stream
 *   - `translation::progress`: Progress and ETA estimation
 * - `history`: Persisted job history
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: Supported languages and code validation
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod history;
pub mod language_utils;
pub mod providers;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{BackendKind, Config};
pub use errors::{JobError, PersistenceError, ProviderError, SubtitleError};
pub use history::{HistoryEntry, HistoryStore};
pub use language_utils::{get_language_name, language_codes_match};
pub use providers::{BackendRegistry, TranslationBackend};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
pub use translation::{JobEvent, JobOutcome, JobState, TranslationJob, TranslationRequest};
