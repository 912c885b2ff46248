/*!
 * Error types for the subtrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when calling a translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Quota or rate limit exhausted
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider cannot translate between the requested languages
    #[error("Unsupported language pair: {0}")]
    UnsupportedLanguage(String),
}

impl ProviderError {
    /// Classify a transport-level reqwest failure
    pub fn from_transport(provider: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::ConnectionError(format!("{}: {}", provider, error))
        } else if error.is_decode() {
            Self::ParseError(format!("{}: {}", provider, error))
        } else {
            Self::RequestFailed(format!("{}: {}", provider, error))
        }
    }

    /// Classify a non-success HTTP status returned by a provider
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

/// Errors that can occur while reading or parsing a subtitle document
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The file is missing or could not be read
    #[error("Failed to read subtitle file {path}: {message}")]
    Unreadable {
        /// Path of the file
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// A timing line could not be parsed
    #[error("Invalid timestamp at line {line}: '{value}'")]
    InvalidTimestamp {
        /// 1-based line number
        line: usize,
        /// Offending text
        value: String,
    },

    /// A cue block does not follow the index / timing / text layout
    #[error("Malformed cue block at line {line}: {reason}")]
    MalformedBlock {
        /// 1-based line number
        line: usize,
        /// What was expected
        reason: String,
    },

    /// A cue ends before it starts
    #[error("Cue {index} ends before it starts ({start_ms} ms > {end_ms} ms)")]
    InvalidTimeRange {
        /// Cue index as written in the file
        index: usize,
        /// Start time in ms
        start_ms: u64,
        /// End time in ms
        end_ms: u64,
    },
}

/// Errors writing or reading durable state (output documents, history store)
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Writing a file failed
    #[error("Failed to write {path}: {message}")]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// Reading a persisted file failed
    #[error("Failed to read {path}: {message}")]
    Read {
        /// Source path
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// The persisted content could not be decoded
    #[error("Corrupt data in {path}: {message}")]
    Corrupt {
        /// Source path
        path: PathBuf,
        /// Decoder message
        message: String,
    },
}

/// Errors that terminate a translation job
#[derive(Error, Debug)]
pub enum JobError {
    /// Unknown backend or invalid language combination
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The source document could not be loaded
    #[error("Parse error: {0}")]
    Parse(#[from] SubtitleError),

    /// A backend call failed; `index` is the 1-based cue position
    #[error("Backend error at cue {index}: {source}")]
    Backend {
        /// 1-based position of the cue in the document
        index: usize,
        /// Provider failure
        #[source]
        source: ProviderError,
    },

    /// The output document or the history store could not be written
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}
