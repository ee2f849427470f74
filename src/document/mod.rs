/*!
 * Document formats and their translatable fragments.
 *
 * Each supported format is one variant of [`Document`]. Every variant can
 * list its fragments, replace a fragment's text and save the result:
 *
 * - `pptx`: PowerPoint presentations, one fragment per text run
 * - `docx`: Word documents, one fragment per body paragraph
 * - `xlsx`: Excel workbooks, one fragment per text cell
 * - `plain_text`: PDF and legacy Word documents, one fragment for the whole text
 * - `ooxml`: Zip package and XML part handling shared by the first three
 */

use std::fmt;
use std::path::{Path, PathBuf};

use crate::app_config::DocumentConfig;
use crate::errors::{DocumentError, FragmentApplyError};
use crate::file_utils::FileManager;
use crate::translation::FragmentTarget;

pub use self::docx::WordDocument;
pub use self::plain_text::PlainTextDocument;
pub use self::pptx::Presentation;
pub use self::xlsx::Workbook;

pub mod docx;
pub mod ooxml;
pub mod plain_text;
pub mod pptx;
pub mod xlsx;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Presentation,
    WordDoc,
    Spreadsheet,
    Pdf,
    LegacyDoc,
}

impl DocumentKind {
    /// Format of a file, from its extension
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        match FileManager::extension_of(path).as_str() {
            "pptx" => Ok(Self::Presentation),
            "docx" => Ok(Self::WordDoc),
            "xlsx" => Ok(Self::Spreadsheet),
            "pdf" => Ok(Self::Pdf),
            "doc" => Ok(Self::LegacyDoc),
            "" => Err(DocumentError::UnsupportedFormat(format!("{} (no extension)", path.display()))),
            other => Err(DocumentError::UnsupportedFormat(format!(".{}", other))),
        }
    }

    /// Whether translations are written back into the original format
    pub fn is_patchable(&self) -> bool {
        matches!(self, Self::Presentation | Self::WordDoc | Self::Spreadsheet)
    }

    /// Default output path for an input file of this kind
    pub fn output_path(&self, input: &Path) -> PathBuf {
        if self.is_patchable() {
            FileManager::generate_output_path(input, None)
        } else {
            FileManager::generate_output_path(input, Some("txt"))
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Presentation => "PPTX",
            Self::WordDoc => "DOCX",
            Self::Spreadsheet => "XLSX",
            Self::Pdf => "PDF",
            Self::LegacyDoc => "DOC",
        }
    }

    /// What a fragment of this kind is called in progress output
    pub fn fragment_noun(&self) -> &str {
        match self {
            Self::Presentation => "text runs",
            Self::WordDoc => "paragraphs",
            Self::Spreadsheet => "cells",
            Self::Pdf | Self::LegacyDoc => "documents",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Structural coordinates of a fragment, 1-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentLocation {
    /// A text run in a presentation
    Run {
        slide: usize,
        shape: usize,
        paragraph: usize,
        run: usize,
    },
    /// A body paragraph in a word-processing document
    Paragraph { index: usize },
    /// A spreadsheet cell
    Cell { sheet: String, row: u32, cell: String },
    /// The whole extracted text of a document
    WholeDocument,
}

impl fmt::Display for FragmentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run {
                slide,
                shape,
                paragraph,
                run,
            } => write!(f, "Slide {}, Shape {}, Paragraph {}, Run {}", slide, shape, paragraph, run),
            Self::Paragraph { index } => write!(f, "Paragraph {}", index),
            Self::Cell { sheet, cell, .. } => write!(f, "Sheet '{}', Cell {}", sheet, cell),
            Self::WholeDocument => write!(f, "Document text"),
        }
    }
}

/// A translatable piece of text and where it lives
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Index into the owning document's fragment list
    pub id: usize,
    pub location: FragmentLocation,
    pub text: String,
}

impl Fragment {
    /// Whether the fragment holds anything besides whitespace
    pub fn is_translatable(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A loaded document of any supported format
#[derive(Debug)]
pub enum Document {
    Presentation(Presentation),
    WordDoc(WordDocument),
    Spreadsheet(Workbook),
    Pdf(PlainTextDocument),
    LegacyDoc(PlainTextDocument),
}

impl Document {
    /// Load a document, choosing the format from the file extension
    ///
    /// # Errors
    /// * `NotFound` when the file does not exist
    /// * `UnsupportedFormat` for unknown extensions
    /// * `Parse` when the file cannot be read as its format
    /// * `Extraction` when PDF or legacy text extraction fails
    pub fn load(path: &Path, config: &DocumentConfig) -> Result<Self, DocumentError> {
        if !FileManager::file_exists(path) {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }

        let document = match DocumentKind::from_path(path)? {
            DocumentKind::Presentation => Self::Presentation(Presentation::load(path)?),
            DocumentKind::WordDoc => Self::WordDoc(WordDocument::load(path)?),
            DocumentKind::Spreadsheet => Self::Spreadsheet(Workbook::load(path)?),
            DocumentKind::Pdf => Self::Pdf(PlainTextDocument::load_pdf(path)?),
            DocumentKind::LegacyDoc => {
                Self::LegacyDoc(PlainTextDocument::load_legacy(path, &config.legacy_extractor)?)
            }
        };
        Ok(document)
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Presentation(_) => DocumentKind::Presentation,
            Self::WordDoc(_) => DocumentKind::WordDoc,
            Self::Spreadsheet(_) => DocumentKind::Spreadsheet,
            Self::Pdf(_) => DocumentKind::Pdf,
            Self::LegacyDoc(_) => DocumentKind::LegacyDoc,
        }
    }

    /// Translatable fragments in document order
    pub fn fragments(&self) -> &[Fragment] {
        match self {
            Self::Presentation(d) => d.fragments(),
            Self::WordDoc(d) => d.fragments(),
            Self::Spreadsheet(d) => d.fragments(),
            Self::Pdf(d) | Self::LegacyDoc(d) => d.fragments(),
        }
    }

    /// Replace the text of one fragment
    pub fn apply(&mut self, id: usize, text: &str) -> Result<(), FragmentApplyError> {
        match self {
            Self::Presentation(d) => d.apply(id, text),
            Self::WordDoc(d) => d.apply(id, text),
            Self::Spreadsheet(d) => d.apply(id, text),
            Self::Pdf(d) | Self::LegacyDoc(d) => d.apply(id, text),
        }
    }

    /// Write the document to `output`
    pub fn save(&mut self, output: &Path) -> Result<(), DocumentError> {
        match self {
            Self::Presentation(d) => d.save(output),
            Self::WordDoc(d) => d.save(output),
            Self::Spreadsheet(d) => d.save(output),
            Self::Pdf(d) | Self::LegacyDoc(d) => d.save(output),
        }
    }
}

impl FragmentTarget for Document {
    fn apply(&mut self, id: usize, text: &str) -> Result<(), FragmentApplyError> {
        Document::apply(self, id, text)
    }
}
