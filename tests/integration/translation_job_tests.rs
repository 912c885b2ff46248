/*!
 * End-to-end tests for the translation job state machine
 */

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use subtrans::app_config::PonsConfig;
use subtrans::errors::{JobError, PersistenceError, ProviderError};
use subtrans::history::HistoryStore;
use subtrans::providers::mock::MockBackend;
use subtrans::providers::pons::PonsBackend;
use subtrans::providers::BackendRegistry;
use subtrans::subtitle_processor::SubtitleCollection;
use subtrans::translation::{JobEvent, JobOutcome, JobState, TranslationJob, TranslationRequest};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::common;

/// Drain every event a finished job sent
fn drain(mut events: UnboundedReceiver<JobEvent>) -> Vec<JobEvent> {
    let mut collected = Vec::new();
    while let Ok(event) = events.try_recv() {
        collected.push(event);
    }
    collected
}

async fn run_job(
    mock: Arc<MockBackend>,
    request: TranslationRequest,
    history: Arc<HistoryStore>,
    output_dir: &Path,
) -> (JobOutcome, Vec<JobEvent>) {
    let job = TranslationJob::new(request, common::registry_with(mock), history, output_dir);
    let (handle, events) = job.spawn();
    let outcome = handle.await.expect("job task panicked");
    (outcome, drain(events))
}

#[tokio::test]
async fn test_job_withUppercaseReverseBackend_shouldTranslateEveryCue() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output_dir = temp_dir.path().join("translations");
    let history = common::create_history(temp_dir.path())?;
    let mock = Arc::new(MockBackend::uppercase_reverse());

    let request = TranslationRequest::new(&input, "en", "fr", "google");
    let (outcome, events) = run_job(Arc::clone(&mock), request, Arc::clone(&history), &output_dir).await;

    assert_eq!(outcome.state, JobState::Completed);
    assert!(outcome.error.is_none());
    assert_eq!((outcome.translated, outcome.total), (3, 3));

    let output_path = outcome.output_path.clone().unwrap();
    assert_eq!(output_path, output_dir.join("movie_fr.srt"));

    let source = SubtitleCollection::load(&input)?;
    let translated = SubtitleCollection::load(&output_path)?;
    let texts: Vec<&str> = translated.entries().iter().map(|entry| entry.text.as_str()).collect();
    assert_eq!(texts, vec!["OLLEH", "DLROW", "EYB"]);
    for (before, after) in source.entries().iter().zip(translated.entries()) {
        assert_eq!(before.seq_num, after.seq_num);
        assert_eq!(before.start_time_ms, after.start_time_ms);
        assert_eq!(before.end_time_ms, after.end_time_ms);
    }

    let entries = history.all();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].success);
    assert!(entries[0].summary.starts_with("movie.srt - en to fr - Success - Duration: "));

    assert!(matches!(events.first(), Some(JobEvent::Started { total: 3, .. })));
    assert!(matches!(events.last(), Some(JobEvent::Finished { success: true, .. })));
    Ok(())
}

#[tokio::test]
async fn test_job_withProgressEvents_shouldReportEachCueOnceInOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let history = common::create_history(temp_dir.path())?;
    let mock = Arc::new(MockBackend::echo());

    let request = TranslationRequest::new(&input, "en", "de", "google");
    let (_, events) = run_job(mock, request, history, &temp_dir.path().join("out")).await;

    let progress: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            JobEvent::Progress(progress) => Some(progress.clone()),
            _ => None,
        })
        .collect();

    let indices: Vec<usize> = progress.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert!(progress.iter().all(|p| p.total == 3));
    assert!(progress.windows(2).all(|pair| pair[0].fraction < pair[1].fraction));
    assert!(progress.iter().all(|p| p.eta.is_some()));
    assert_eq!(progress[1].original, "World");
    assert_eq!(progress.last().map(|p| p.fraction), Some(1.0));
    Ok(())
}

#[tokio::test]
async fn test_job_withFailureOnSecondCue_shouldFailFastAndKeepPartialOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let history = common::create_history(temp_dir.path())?;
    let mock = Arc::new(MockBackend::fail_on_call(2));

    let request = TranslationRequest::new(&input, "en", "fr", "google");
    let (outcome, events) = run_job(Arc::clone(&mock), request, Arc::clone(&history), temp_dir.path()).await;

    assert_eq!(outcome.state, JobState::Failed);
    assert!(matches!(
        outcome.error,
        Some(JobError::Backend {
            index: 2,
            source: ProviderError::RequestFailed(_)
        })
    ));
    assert_eq!(outcome.translated, 1);
    assert_eq!(mock.call_count(), 2);

    let written = SubtitleCollection::load(outcome.output_path.as_ref().unwrap())?;
    let texts: Vec<&str> = written.entries().iter().map(|entry| entry.text.as_str()).collect();
    assert_eq!(texts, vec!["OLLEH", "World", "Bye"]);

    let entries = history.all();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].success);
    assert!(entries[0].summary.contains("Failure (Backend error at cue 2"));

    assert!(matches!(events.last(), Some(JobEvent::Finished { success: false, .. })));
    Ok(())
}

#[tokio::test]
async fn test_job_withUnknownBackend_shouldRejectBeforeAnyCue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output_dir = temp_dir.path().join("translations");
    let history = common::create_history(temp_dir.path())?;
    let mock = Arc::new(MockBackend::uppercase_reverse());

    let request = TranslationRequest::new(&input, "en", "fr", "unknown_service");
    let (outcome, events) = run_job(Arc::clone(&mock), request, Arc::clone(&history), &output_dir).await;

    assert_eq!(outcome.state, JobState::Failed);
    assert!(matches!(outcome.error, Some(JobError::Configuration(_))));
    assert_eq!(mock.call_count(), 0);
    assert!(outcome.output_path.is_none());
    assert!(!output_dir.join("movie_fr.srt").exists());

    // Source untouched
    assert_eq!(std::fs::read_to_string(&input)?, common::HELLO_WORLD_SRT);

    let entries = history.all();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].success);
    assert!(entries[0].summary.contains("Invalid translation service: unknown_service"));

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], JobEvent::Finished { success: false, .. }));
    Ok(())
}

#[tokio::test]
async fn test_job_withInvalidLanguages_shouldReturnConfigurationError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let history = common::create_history(temp_dir.path())?;

    let cases = [("en", "klingon"), ("english", "fr"), ("fr", "fr")];
    for (source, target) in cases {
        let mock = Arc::new(MockBackend::echo());
        let request = TranslationRequest::new(&input, source, target, "google");
        let (outcome, _) = run_job(Arc::clone(&mock), request, Arc::clone(&history), temp_dir.path()).await;

        assert!(
            matches!(outcome.error, Some(JobError::Configuration(_))),
            "{} -> {} should be rejected",
            source,
            target
        );
        assert_eq!(mock.call_count(), 0);
    }

    assert_eq!(history.len(), cases.len());
    Ok(())
}

#[tokio::test]
async fn test_job_withMalformedSource_shouldFailWithParseError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "broken.srt", "1\nnot a timing line\nHello\n")?;
    let history = common::create_history(temp_dir.path())?;
    let mock = Arc::new(MockBackend::echo());

    let request = TranslationRequest::new(&input, "en", "fr", "google");
    let (outcome, _) = run_job(Arc::clone(&mock), request, Arc::clone(&history), temp_dir.path()).await;

    assert!(matches!(outcome.error, Some(JobError::Parse(_))));
    assert!(outcome.output_path.is_none());
    assert_eq!(mock.call_count(), 0);
    assert_eq!(history.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_job_withBlankCueAndOutputName_shouldSkipBackendAndRename() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let content = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:03,000 --> 00:00:04,000\n\n3\n00:00:05,000 --> 00:00:06,000\nBye\n";
    let input = common::create_test_file(temp_dir.path(), "movie.srt", content)?;
    let history = common::create_history(temp_dir.path())?;
    let mock = Arc::new(MockBackend::uppercase_reverse());

    let request = TranslationRequest::new(&input, "auto", "es", "google").with_output_name("custom");
    let (outcome, events) = run_job(Arc::clone(&mock), request, history, temp_dir.path()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.output_path, Some(temp_dir.path().join("custom.srt")));
    assert_eq!(mock.received_texts(), vec!["Hello", "Bye"]);

    let progress_count = events.iter().filter(|event| matches!(event, JobEvent::Progress(_))).count();
    assert_eq!(progress_count, 3);
    Ok(())
}

#[tokio::test]
async fn test_job_withUnwritableHistory_shouldReportFailureSummary() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let history = common::create_history(temp_dir.path())?;
    let mock = Arc::new(MockBackend::uppercase_reverse());

    // A directory in place of the history file makes every flush fail
    std::fs::create_dir_all(history.path().join("occupied"))?;

    let request = TranslationRequest::new(&input, "en", "fr", "google");
    let (outcome, events) = run_job(mock, request, Arc::clone(&history), temp_dir.path()).await;

    assert_eq!(outcome.state, JobState::Failed);
    assert!(matches!(
        outcome.error,
        Some(JobError::Persistence(PersistenceError::Write { .. }))
    ));
    assert!(outcome.summary.contains("Failure (Persistence error"));
    assert!(outcome.output_path.is_some());
    assert!(history.is_empty());

    match events.last() {
        Some(JobEvent::Finished { summary, success }) => {
            assert!(!success);
            assert_eq!(summary, &outcome.summary);
        }
        other => panic!("expected a finished event, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_job_withPairUnsupportedByBackend_shouldRejectWithoutOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output_dir = temp_dir.path().join("translations");
    let history = common::create_history(temp_dir.path())?;
    let registry = BackendRegistry::new().register("pons", Arc::new(PonsBackend::new(&PonsConfig::default())));

    let job = TranslationJob::new(
        TranslationRequest::new(&input, "auto", "fr", "pons"),
        Arc::new(registry),
        Arc::clone(&history),
        &output_dir,
    );
    let (handle, events) = job.spawn();
    let outcome = handle.await?;

    assert!(matches!(outcome.error, Some(JobError::Configuration(_))));
    assert!(outcome.output_path.is_none());
    assert!(!output_dir.exists());
    assert!(history.all()[0].summary.contains("source language must be explicit"));
    assert_eq!(drain(events).len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_job_withOutputNameOutsideOutputDir_shouldRejectBeforeAnyCue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output_dir = temp_dir.path().join("translations");
    let history = common::create_history(temp_dir.path())?;

    for name in ["../escape", "nested/name", ".."] {
        let mock = Arc::new(MockBackend::echo());
        let request = TranslationRequest::new(&input, "en", "fr", "google").with_output_name(name);
        let (outcome, _) = run_job(Arc::clone(&mock), request, Arc::clone(&history), &output_dir).await;

        assert!(
            matches!(outcome.error, Some(JobError::Configuration(_))),
            "'{}' should be rejected",
            name
        );
        assert_eq!(mock.call_count(), 0);
    }

    assert!(!temp_dir.path().join("escape.srt").exists());
    assert!(!output_dir.exists());
    Ok(())
}

#[tokio::test]
async fn test_job_withBlankOutputName_shouldUseDefaultName() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let history = common::create_history(temp_dir.path())?;
    let mock = Arc::new(MockBackend::echo());

    let request = TranslationRequest::new(&input, "en", "fr", "google").with_output_name("  ");
    let (outcome, _) = run_job(mock, request, history, temp_dir.path()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.output_path, Some(temp_dir.path().join("movie_fr.srt")));
    Ok(())
}

#[test]
fn test_job_run_withDroppedReceiver_shouldStillComplete() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let history = common::create_history(temp_dir.path())?;
    let mock = Arc::new(MockBackend::echo());

    let job = TranslationJob::new(
        TranslationRequest::new(&input, "en", "it", "google"),
        common::registry_with(mock),
        Arc::clone(&history),
        temp_dir.path(),
    );

    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
    drop(receiver);
    let outcome = tokio_test::block_on(job.run(&sender));

    assert!(outcome.is_success());
    assert_eq!(history.len(), 1);
    Ok(())
}
