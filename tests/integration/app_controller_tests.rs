/*!
 * Tests for the application controller driving file and folder runs
 */

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use subtrans::app_config::Config;
use subtrans::app_controller::{Controller, RunOptions};
use subtrans::providers::mock::MockBackend;

use crate::common;

fn controller_in(dir: &Path, mock: Arc<MockBackend>) -> Result<Controller> {
    let config = Config {
        output_dir: dir.join("translations").to_string_lossy().into_owned(),
        history_file: dir.join("history.json").to_string_lossy().into_owned(),
        log_file: None,
        ..Config::default()
    };
    let history = common::create_history(dir)?;
    Ok(Controller::with_parts(config, common::registry_with(mock), history))
}

#[tokio::test]
async fn test_run_withFolder_shouldTranslateEachFileIndependently() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("subs");
    common::create_test_subtitle(&input_dir, "a.srt")?;
    common::create_test_subtitle(&input_dir, "nested/b.srt")?;
    common::create_test_file(&input_dir, "readme.txt", "not a subtitle")?;

    let mock = Arc::new(MockBackend::uppercase_reverse());
    let controller = controller_in(temp_dir.path(), Arc::clone(&mock))?;

    let mut options = RunOptions::from_config(controller.config());
    options.output_name = Some("ignored".to_string());
    let summary = controller.run(&input_dir, &options).await?;

    assert_eq!(summary.outcomes.len(), 2);
    assert!(summary.is_success());
    assert_eq!(mock.call_count(), 6);

    let output_dir = temp_dir.path().join("translations");
    assert!(output_dir.join("a_fr.srt").exists());
    assert!(output_dir.join("b_fr.srt").exists());
    assert!(!output_dir.join("ignored.srt").exists());
    assert_eq!(controller.history().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_run_withSingleFileAndFailingBackend_shouldReportFailure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    let controller = controller_in(temp_dir.path(), Arc::new(MockBackend::failing()))?;
    let mut options = RunOptions::from_config(controller.config());
    options.output_name = Some("movie.french".to_string());

    let summary = controller.run(&input, &options).await?;

    assert_eq!(summary.failed(), 1);
    assert!(!summary.is_success());
    // Partial document is still written under the override name
    assert!(temp_dir.path().join("translations").join("movie.french.srt").exists());
    assert!(!controller.history().all()[0].success);
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingInput_shouldReturnError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = controller_in(temp_dir.path(), Arc::new(MockBackend::echo()))?;
    let options = RunOptions::from_config(controller.config());

    assert!(controller.run(&temp_dir.path().join("nope.srt"), &options).await.is_err());
    assert!(controller.history().is_empty());
    Ok(())
}

#[test]
fn test_with_config_withCorruptHistory_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let history_path = common::create_test_file(temp_dir.path(), "history.json", "not json")?;

    let config = Config {
        history_file: history_path.to_string_lossy().into_owned(),
        ..Config::default()
    };

    assert!(Controller::with_config(config).is_err());
    Ok(())
}
