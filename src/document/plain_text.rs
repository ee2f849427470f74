use log::{debug, warn};
use std::panic;
use std::path::Path;
use std::process::Command;

use crate::errors::{DocumentError, FragmentApplyError};
use crate::file_utils::FileManager;

use super::{Fragment, FragmentLocation};

/// A document whose text can be extracted but not patched
///
/// The whole extracted text is a single fragment and the translation is
/// written out as a plain text file.
#[derive(Debug, Clone)]
pub struct PlainTextDocument {
    text: String,
    translated: Option<String>,
    fragments: Vec<Fragment>,
}

impl PlainTextDocument {
    pub fn from_text(text: String) -> Self {
        let fragments = if text.trim().is_empty() {
            Vec::new()
        } else {
            vec![Fragment {
                id: 0,
                location: FragmentLocation::WholeDocument,
                text: text.clone(),
            }]
        };

        Self {
            text,
            translated: None,
            fragments,
        }
    }

    /// Extract the text layer of a PDF
    pub fn load_pdf(path: &Path) -> Result<Self, DocumentError> {
        let extraction_error = |message: String| DocumentError::Extraction {
            path: path.to_path_buf(),
            message,
        };

        let bytes = std::fs::read(path).map_err(|e| extraction_error(e.to_string()))?;
        // pdf-extract panics on some malformed files
        let text = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
            .map_err(|_| extraction_error("PDF parser crashed".to_string()))?
            .map_err(|e| extraction_error(e.to_string()))?;

        if text.trim().is_empty() {
            warn!("No text layer found in {}", path.display());
        }
        debug!("Extracted {} characters from {}", text.len(), path.display());
        Ok(Self::from_text(text))
    }

    /// Extract the text of a legacy Word document with an external tool
    ///
    /// The tool is called as `<extractor> <path>` and must print the text
    /// to stdout.
    pub fn load_legacy(path: &Path, extractor: &str) -> Result<Self, DocumentError> {
        let extraction_error = |message: String| DocumentError::Extraction {
            path: path.to_path_buf(),
            message,
        };

        let output = Command::new(extractor)
            .arg(path)
            .output()
            .map_err(|e| extraction_error(format!("failed to run {}: {}", extractor, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(extraction_error(format!(
                "{} exited with {}: {}",
                extractor,
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("Extracted {} characters from {}", text.len(), path.display());
        Ok(Self::from_text(text))
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn apply(&mut self, id: usize, text: &str) -> Result<(), FragmentApplyError> {
        if id >= self.fragments.len() {
            return Err(FragmentApplyError::UnknownFragment(id));
        }
        if self.translated.is_some() {
            return Err(FragmentApplyError::AlreadyApplied(id));
        }
        self.translated = Some(text.to_string());
        Ok(())
    }

    /// Translated text, or the extracted text when nothing was translated
    pub fn output_text(&self) -> &str {
        self.translated.as_deref().unwrap_or(&self.text)
    }

    pub fn save(&self, output: &Path) -> Result<(), DocumentError> {
        FileManager::write_to_file(output, self.output_text()).map_err(|e| DocumentError::Save {
            path: output.to_path_buf(),
            message: e.to_string(),
        })
    }
}
