use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

// @module: File and directory utilities

/// Suffix added to the stem of derived output files
pub const OUTPUT_SUFFIX: &str = "_translated";

/// Name of the per-directory issues log
pub const ISSUES_LOG_NAME: &str = "doctranslate.issues.log";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path for a translated document
    // @params: input_file, extension (None keeps the input's extension)
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P, extension: Option<&str>) -> PathBuf {
        let input_file = input_file.as_ref();

        let stem = input_file.file_stem().unwrap_or_default();
        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push_str(OUTPUT_SUFFIX);

        let extension = match extension {
            Some(ext) => Some(ext.trim_start_matches('.').to_string()),
            None => input_file.extension().map(|e| e.to_string_lossy().to_string()),
        };
        if let Some(ext) = extension.filter(|e| !e.is_empty()) {
            output_filename.push('.');
            output_filename.push_str(&ext);
        }

        input_file.with_file_name(output_filename)
    }

    /// Lower-cased extension of a path, empty when there is none
    pub fn extension_of<P: AsRef<Path>>(path: P) -> String {
        path.as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// Issues log placed next to an output file
    pub fn issues_log_path<P: AsRef<Path>>(output_file: P) -> PathBuf {
        match output_file.as_ref().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(ISSUES_LOG_NAME),
            _ => PathBuf::from(ISSUES_LOG_NAME),
        }
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        // Open file in append mode, create if it doesn't exist
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
