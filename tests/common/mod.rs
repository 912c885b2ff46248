/*!
 * Common test utilities for the subtrans test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use subtrans::history::HistoryStore;
use subtrans::providers::mock::MockBackend;
use subtrans::providers::BackendRegistry;

/// Three short cues used by most scenarios
pub const HELLO_WORLD_SRT: &str = "1
00:00:01,000 --> 00:00:02,500
Hello

2
00:00:03,000 --> 00:00:04,000
World

3
00:00:05,000 --> 00:00:06,750
Bye
";

/// Initialize env_logger once for the test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates the three cue sample subtitle file
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, HELLO_WORLD_SRT)
}

/// Empty history store inside `dir`
pub fn create_history(dir: &Path) -> Result<Arc<HistoryStore>> {
    Ok(Arc::new(HistoryStore::load(dir.join("history.json"))?))
}

/// Registry where `google` is answered by the given mock
pub fn registry_with(mock: Arc<MockBackend>) -> Arc<BackendRegistry> {
    Arc::new(BackendRegistry::new().register("google", mock))
}
