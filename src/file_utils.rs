use anyhow::{Result, Context};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use tempfile::NamedTempFile;

use crate::errors::PersistenceError;

// @module: File and directory utilities

/// Extension of subtitle files handled by the pipeline
pub const SUBTITLE_EXTENSION: &str = "srt";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    // @generates: Output path for a translated subtitle
    // @params: input_file, output_dir, target_language, output_name override
    //
    // The result always lies directly inside `output_dir`: a blank override
    // counts as none and any directory part of an override is dropped.
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        target_language: &str,
        output_name: Option<&str>,
    ) -> PathBuf {
        let override_name = Self::output_name_override(output_name)
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().into_owned());

        let file_name = match override_name {
            Some(name) => format!("{}.{}", name, SUBTITLE_EXTENSION),
            None => {
                let stem = input_file.as_ref().file_stem().unwrap_or_default();
                format!("{}_{}.{}", stem.to_string_lossy(), target_language, SUBTITLE_EXTENSION)
            }
        };

        output_dir.as_ref().join(file_name)
    }

    /// Trimmed output name override, `None` when absent or blank
    pub fn output_name_override(output_name: Option<&str>) -> Option<&str> {
        output_name.map(str::trim).filter(|name| !name.is_empty())
    }

    /// Check that an output name override is a plain file name
    ///
    /// Blank names pass, since they mean "no override". Names with a path
    /// separator, `.`/`..` or a drive prefix are rejected.
    pub fn validate_output_name(output_name: &str) -> Result<(), String> {
        let name = output_name.trim();
        if name.is_empty() {
            return Ok(());
        }

        let mut components = Path::new(name).components();
        let is_plain = matches!((components.next(), components.next()), (Some(Component::Normal(_)), None));
        if !is_plain || name.contains(['/', '\\']) {
            return Err(format!("Output name must be a plain file name: '{}'", output_name));
        }

        Ok(())
    }

    /// Find files with a specific extension in a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let extension = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(extension) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Replace `path` with `content` atomically.
    ///
    /// The bytes go to a temporary file in the destination directory which is
    /// synced and then renamed over `path`, so readers see either the old or
    /// the new content.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let write_error = |message: String| PersistenceError::Write {
            path: path.to_path_buf(),
            message,
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| write_error(format!("cannot create {}: {}", parent.display(), e)))?;

        let mut temp = NamedTempFile::new_in(&parent).map_err(|e| write_error(e.to_string()))?;
        temp.write_all(content).map_err(|e| write_error(e.to_string()))?;
        temp.as_file().sync_all().map_err(|e| write_error(e.to_string()))?;
        temp.persist(path).map_err(|e| write_error(e.error.to_string()))?;

        Ok(())
    }
}
