/*!
 * Translation job: load a document, translate every cue through one backend,
 * write the result and record the outcome in the history store.
 *
 * A job runs `Pending -> Running -> Completed | Failed`. It never lets an
 * error escape: every failure ends in a `Failed` outcome, a history entry
 * with `success = false` and a `Finished` event.
 */

use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::progress::{format_duration, JobProgress};
use crate::errors::{JobError, PersistenceError};
use crate::file_utils::FileManager;
use crate::history::{HistoryEntry, HistoryStore};
use crate::language_utils::{is_supported_target, language_codes_match, validate_source_language};
use crate::providers::{BackendRegistry, TranslationBackend};
use crate::subtitle_processor::{SubtitleCollection, SubtitleEncoding};

/// Parameters of one translation job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    /// Subtitle file to translate
    pub source_path: PathBuf,
    /// Source language code, or "auto"
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Backend identifier, resolved through the registry
    pub backend: String,
    /// File name (without extension) replacing `<stem>_<target>`
    pub output_name: Option<String>,
}

impl TranslationRequest {
    pub fn new(
        source_path: impl Into<PathBuf>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        backend: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            backend: backend.into(),
            output_name: None,
        }
    }

    /// Set the output name override
    pub fn with_output_name(mut self, output_name: impl Into<String>) -> Self {
        self.output_name = Some(output_name.into());
        self
    }

    /// File name used in summaries and logs
    pub fn display_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }
}

/// Lifecycle of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One processed cue
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// 1-based position of the cue, equal to the number of cues processed
    pub index: usize,
    /// Cues in the document
    pub total: usize,
    /// Text before translation
    pub original: String,
    /// Text after translation
    pub translated: String,
    /// Completion fraction
    pub fraction: f64,
    /// Estimated remaining time
    pub eta: Option<Duration>,
}

/// Messages streamed from a running job to its caller
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// The document is loaded and translation begins
    Started {
        source_file: PathBuf,
        total: usize,
        source_language: String,
        target_language: String,
    },
    /// A cue has been processed
    Progress(ProgressEvent),
    /// The job reached a terminal state
    Finished { summary: String, success: bool },
}

/// Final report of a job
#[derive(Debug)]
pub struct JobOutcome {
    /// `Completed` or `Failed`
    pub state: JobState,
    /// Where the translated document was written, if it was
    pub output_path: Option<PathBuf>,
    /// Cues processed
    pub translated: usize,
    /// Cues in the document, 0 when it never loaded
    pub total: usize,
    /// Wall-clock time of the job
    pub duration: Duration,
    /// Summary stored in the history entry
    pub summary: String,
    /// Cause of failure
    pub error: Option<JobError>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.state == JobState::Completed
    }
}

/// A single translation run over one document
pub struct TranslationJob {
    // @field: What to translate and how
    request: TranslationRequest,
    // @field: Backend lookup
    backends: Arc<BackendRegistry>,
    // @field: Shared history, the only state shared between jobs
    history: Arc<HistoryStore>,
    // @field: Directory receiving the translated document
    output_dir: PathBuf,
    // @field: Current lifecycle state
    state: JobState,
}

impl TranslationJob {
    pub fn new(
        request: TranslationRequest,
        backends: Arc<BackendRegistry>,
        history: Arc<HistoryStore>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            request,
            backends,
            history,
            output_dir: output_dir.into(),
            state: JobState::Pending,
        }
    }

    pub fn request(&self) -> &TranslationRequest {
        &self.request
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Path the translated document is written to
    pub fn output_path(&self) -> PathBuf {
        FileManager::generate_output_path(
            &self.request.source_path,
            &self.output_dir,
            self.request.target_language.trim(),
            self.request.output_name.as_deref(),
        )
    }

    /// Run the job on a Tokio task, returning its handle and the event stream
    pub fn spawn(self) -> (JoinHandle<JobOutcome>, UnboundedReceiver<JobEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move { self.run(&sender).await });
        (handle, receiver)
    }

    /// Run the job to completion, reporting through `events`.
    ///
    /// Send failures are ignored: a caller that stops listening does not stop the job.
    pub async fn run(mut self, events: &UnboundedSender<JobEvent>) -> JobOutcome {
        let started_at = Instant::now();
        info!(
            "Starting job for {} ({} -> {}, backend {})",
            self.request.source_path.display(),
            self.request.source_language,
            self.request.target_language,
            self.request.backend
        );

        let (backend, mut document) = match self.prepare() {
            Ok(prepared) => prepared,
            Err(e) => {
                self.transition(JobState::Failed);
                return self.finish(events, started_at, None, 0, 0, Some(e)).await;
            }
        };

        let total = document.len();
        self.transition(JobState::Running);
        let _ = events.send(JobEvent::Started {
            source_file: document.source_file().to_path_buf(),
            total,
            source_language: self.request.source_language.clone(),
            target_language: self.request.target_language.clone(),
        });

        let mut progress = JobProgress::start(total);
        let mut failure = self
            .translate_cues(backend.as_ref(), &mut document, &mut progress, events)
            .await
            .err();

        // The document is written even after a backend failure, keeping the cues done so far
        let written = match Self::save_document(document, self.output_path()).await {
            Ok(output_path) => {
                debug!("Wrote {}", output_path.display());
                Some(output_path)
            }
            Err(e) => {
                error!("Could not write translated document: {}", e);
                if failure.is_none() {
                    failure = Some(e.into());
                }
                None
            }
        };

        self.transition(if failure.is_none() {
            JobState::Completed
        } else {
            JobState::Failed
        });

        self.finish(events, started_at, written, progress.completed(), total, failure)
            .await
    }

    /// Resolve the backend, validate languages and output name, then load the document
    fn prepare(&self) -> Result<(Arc<dyn TranslationBackend>, SubtitleCollection), JobError> {
        let backend = self.backends.resolve(&self.request.backend)?;
        self.validate_languages()?;
        backend
            .supports(self.request.source_language.trim(), self.request.target_language.trim())
            .map_err(|e| JobError::Configuration(e.to_string()))?;
        if let Some(name) = &self.request.output_name {
            FileManager::validate_output_name(name).map_err(JobError::Configuration)?;
        }
        let document = SubtitleCollection::load(&self.request.source_path)?;
        Ok((backend, document))
    }

    fn validate_languages(&self) -> Result<(), JobError> {
        let source = self.request.source_language.trim();
        let target = self.request.target_language.trim();

        if !is_supported_target(target) {
            return Err(JobError::Configuration(format!("Unsupported target language: '{}'", target)));
        }
        validate_source_language(source).map_err(|e| JobError::Configuration(e.to_string()))?;
        if language_codes_match(source, target) {
            return Err(JobError::Configuration(format!(
                "Source and target languages are the same: '{}'",
                target
            )));
        }

        Ok(())
    }

    /// Translate every cue in order, stopping at the first backend failure
    async fn translate_cues(
        &self,
        backend: &dyn TranslationBackend,
        document: &mut SubtitleCollection,
        progress: &mut JobProgress,
        events: &UnboundedSender<JobEvent>,
    ) -> Result<(), JobError> {
        let total = document.len();
        let source_language = self.request.source_language.trim();
        let target_language = self.request.target_language.trim();
        let originals: Vec<String> = document.entries().iter().map(|entry| entry.text.clone()).collect();

        for (position, original) in originals.into_iter().enumerate() {
            let index = position + 1;

            let translated = if original.trim().is_empty() {
                original.clone()
            } else {
                backend
                    .translate(&original, source_language, target_language)
                    .await
                    .map_err(|source| JobError::Backend { index, source })?
            };

            debug!("[{}/{}] {} -> {}", index, total, original, translated);
            document.set_text(position, translated.clone());

            let estimate = progress.record(&original, &translated);
            let _ = events.send(JobEvent::Progress(ProgressEvent {
                index,
                total,
                original,
                translated,
                fraction: estimate.fraction,
                eta: estimate.eta,
            }));
        }

        Ok(())
    }

    /// Write the document off the async worker threads
    async fn save_document(document: SubtitleCollection, path: PathBuf) -> Result<PathBuf, PersistenceError> {
        let target = path.clone();
        tokio::task::spawn_blocking(move || document.save(&target, SubtitleEncoding::Utf8).map(|()| target))
            .await
            .unwrap_or_else(|e| {
                Err(PersistenceError::Write {
                    path,
                    message: e.to_string(),
                })
            })
    }

    /// Append to the history store off the async worker threads
    async fn record(&self, entry: HistoryEntry) -> Result<(), PersistenceError> {
        let history = Arc::clone(&self.history);
        tokio::task::spawn_blocking(move || history.append(entry))
            .await
            .unwrap_or_else(|e| {
                Err(PersistenceError::Write {
                    path: self.history.path().to_path_buf(),
                    message: e.to_string(),
                })
            })
    }

    /// Record the outcome in the history store and notify the caller
    async fn finish(
        &mut self,
        events: &UnboundedSender<JobEvent>,
        started_at: Instant,
        output_path: Option<PathBuf>,
        translated: usize,
        total: usize,
        mut failure: Option<JobError>,
    ) -> JobOutcome {
        let duration = started_at.elapsed();
        let mut summary = self.summarize(failure.as_ref(), duration);

        let entry = HistoryEntry::new(&self.request.source_path, summary.clone(), failure.is_none());
        if let Err(e) = self.record(entry).await {
            error!("Could not record job history in {}: {}", self.history.path().display(), e);
            if failure.is_none() {
                failure = Some(e.into());
                self.transition(JobState::Failed);
                summary = self.summarize(failure.as_ref(), duration);
            }
        }

        match &failure {
            None => info!("{}", summary),
            Some(_) => error!("{}", summary),
        }

        let success = failure.is_none();
        let _ = events.send(JobEvent::Finished {
            summary: summary.clone(),
            success,
        });

        JobOutcome {
            state: self.state,
            output_path,
            translated,
            total,
            duration,
            summary,
            error: failure,
        }
    }

    fn summarize(&self, failure: Option<&JobError>, duration: Duration) -> String {
        let outcome = match failure {
            None => "Success".to_string(),
            Some(e) => format!("Failure ({})", e),
        };

        format!(
            "{} - {} to {} - {} - Duration: {}",
            self.request.display_name(),
            self.request.source_language,
            self.request.target_language,
            outcome,
            format_duration(duration)
        )
    }

    fn transition(&mut self, next: JobState) {
        if self.state == next {
            return;
        }
        if next == JobState::Failed && self.state == JobState::Pending {
            warn!("Job for {} rejected before start", self.request.display_name());
        }
        debug!("Job state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

