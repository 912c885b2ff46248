use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::app_config::Config;
use crate::file_utils::{FileManager, SUBTITLE_EXTENSION};
use crate::history::HistoryStore;
use crate::providers::{truncate_text, BackendRegistry};
use crate::translation::{format_eta, JobEvent, JobOutcome, TranslationJob, TranslationRequest};

// @module: Application controller for subtitle translation jobs

/// Parameters shared by every job of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    // @field: Source language code, or "auto"
    pub source_language: String,
    // @field: Target language code
    pub target_language: String,
    // @field: Backend identifier
    pub backend: String,
    // @field: Output name override, single file only
    pub output_name: Option<String>,
}

impl RunOptions {
    /// Options taken from the configuration defaults
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            backend: config.backend.clone(),
            output_name: None,
        }
    }

    fn request_for(&self, source_path: &Path, output_name: Option<&str>) -> TranslationRequest {
        let request = TranslationRequest::new(
            source_path,
            self.source_language.clone(),
            self.target_language.clone(),
            self.backend.clone(),
        );
        match output_name {
            Some(name) => request.with_output_name(name),
            None => request,
        }
    }
}

/// Outcomes of every job started by one run, in processing order
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<JobOutcome>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Backends available to jobs
    backends: Arc<BackendRegistry>,
    // @field: Job history shared by all jobs
    history: Arc<HistoryStore>,
}

impl Controller {
    // @method: Create a controller with every configured backend and the persisted history
    pub fn with_config(config: Config) -> Result<Self> {
        let backends = BackendRegistry::from_config(&config.providers);
        let history = HistoryStore::load(&config.history_file)
            .with_context(|| format!("Failed to load translation history from {}", config.history_file))?;

        Ok(Self::with_parts(config, Arc::new(backends), Arc::new(history)))
    }

    /// Create a controller from already built parts
    pub fn with_parts(config: Config, backends: Arc<BackendRegistry>, history: Arc<HistoryStore>) -> Self {
        Self {
            config,
            backends,
            history,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Job history shared by all jobs
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Translate a subtitle file, or every subtitle file below a directory.
    ///
    /// Each file is an independent job; a failed job does not stop the others.
    pub async fn run(&self, input: &Path, options: &RunOptions) -> Result<RunSummary> {
        let (files, is_folder) = if input.is_file() {
            (vec![input.to_path_buf()], false)
        } else if input.is_dir() {
            let files = FileManager::find_files(input, SUBTITLE_EXTENSION)?;
            (files, true)
        } else {
            return Err(anyhow!("Input path does not exist: {:?}", input));
        };

        let output_name = match (&options.output_name, is_folder) {
            (Some(name), true) => {
                warn!("Ignoring output name '{}' for folder input, every file keeps its own name", name);
                None
            }
            (name, _) => name.as_deref(),
        };

        if files.is_empty() {
            warn!("No .{} files found in {:?}", SUBTITLE_EXTENSION, input);
            return Ok(RunSummary::default());
        }

        info!("Translating {} file(s) with {}", files.len(), options.backend);
        let multi_progress = MultiProgress::new();
        let folder_pb = if is_folder && files.len() > 1 {
            let pb = multi_progress.add(ProgressBar::new(files.len() as u64));
            pb.set_style(Self::bar_style("files"));
            pb.set_message("Processing files");
            Some(pb)
        } else {
            None
        };

        let mut summary = RunSummary::default();
        for file in &files {
            if let Some(pb) = &folder_pb {
                pb.set_message(format!("Processing: {}", Self::file_label(file)));
            }

            let request = options.request_for(file, output_name);
            summary.outcomes.push(self.run_job(request, &multi_progress).await?);

            if let Some(pb) = &folder_pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = folder_pb {
            pb.finish_with_message("Folder processing complete");
        }

        info!("{} of {} job(s) succeeded", summary.succeeded(), summary.outcomes.len());
        Ok(summary)
    }

    /// Run one job on a worker task, rendering its events until it finishes
    async fn run_job(&self, request: TranslationRequest, multi_progress: &MultiProgress) -> Result<JobOutcome> {
        let label = request.display_name();
        let job = TranslationJob::new(
            request,
            Arc::clone(&self.backends),
            Arc::clone(&self.history),
            &self.config.output_dir,
        );

        let (handle, mut events) = job.spawn();
        let progress_bar = multi_progress.add(ProgressBar::new(0));
        progress_bar.set_style(Self::bar_style("cues"));

        while let Some(event) = events.recv().await {
            match event {
                JobEvent::Started { total, .. } => {
                    progress_bar.set_length(total as u64);
                    progress_bar.set_message(label.clone());
                }
                JobEvent::Progress(progress) => {
                    progress_bar.set_position(progress.index as u64);
                    progress_bar.set_message(format!(
                        "{} | ETA {}",
                        truncate_text(&progress.translated.replace('\n', " "), 40),
                        format_eta(progress.eta)
                    ));
                }
                JobEvent::Finished { success, .. } => {
                    debug!("Job for {} finished, success: {}", label, success);
                    progress_bar.finish_and_clear();
                }
            }
        }

        handle.await.context("Translation worker stopped unexpectedly")
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    fn file_label(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}
