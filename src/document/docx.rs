use std::path::Path;

use crate::errors::{DocumentError, FragmentApplyError};

use super::ooxml::{Package, XmlPart, text_element};
use super::{Fragment, FragmentLocation};

const DOCUMENT_PART: &str = "word/document.xml";

/// A Word document
///
/// Fragments are the paragraphs directly inside the document body; table
/// cells, headers and footers are left alone. Replacing a paragraph's text
/// puts all of it into the first text element and empties the others, so
/// the first run's formatting applies to the whole paragraph.
#[derive(Debug)]
pub struct WordDocument {
    package: Package,
    xml: XmlPart,
    fragments: Vec<Fragment>,
    /// Text elements of each fragment's paragraph
    slots: Vec<Vec<usize>>,
    applied: Vec<bool>,
}

impl WordDocument {
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let package = Package::open(path)?;
        if !package.has_part(DOCUMENT_PART) {
            return Err(DocumentError::Parse {
                path: path.to_path_buf(),
                message: format!("missing {}", DOCUMENT_PART),
            });
        }
        let xml = package.read_xml(DOCUMENT_PART)?;

        let mut fragments = Vec::new();
        let mut slots = Vec::new();

        if let Some(body) = xml.elements_named("w:body").first().copied() {
            let paragraphs = xml.children(body).into_iter().filter(|&c| xml.is_element(c, "w:p"));
            for (number, paragraph) in paragraphs.enumerate() {
                let texts = xml.descendants(paragraph, "w:t");
                let text: String = texts.iter().map(|&t| xml.text(t)).collect();
                if text.trim().is_empty() {
                    continue;
                }

                fragments.push(Fragment {
                    id: fragments.len(),
                    location: FragmentLocation::Paragraph { index: number + 1 },
                    text,
                });
                slots.push(texts);
            }
        }

        Ok(Self {
            applied: vec![false; fragments.len()],
            package,
            xml,
            fragments,
            slots,
        })
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn apply(&mut self, id: usize, text: &str) -> Result<(), FragmentApplyError> {
        let texts = self.slots.get(id).ok_or(FragmentApplyError::UnknownFragment(id))?;
        if self.applied[id] {
            return Err(FragmentApplyError::AlreadyApplied(id));
        }

        for (position, &index) in texts.iter().enumerate() {
            let tag = self
                .xml
                .start_tag(index)
                .cloned()
                .ok_or_else(|| FragmentApplyError::Unwritable {
                    id,
                    message: "paragraph text element vanished".to_string(),
                })?;
            let content = if position == 0 { text } else { "" };
            self.xml.replace(index, text_element(&tag, content, position == 0));
        }

        self.applied[id] = true;
        Ok(())
    }

    pub fn save(&mut self, output: &Path) -> Result<(), DocumentError> {
        if self.xml.has_edits() {
            let bytes = self.xml.to_bytes().map_err(|e| DocumentError::Save {
                path: output.to_path_buf(),
                message: format!("{}: {}", DOCUMENT_PART, e),
            })?;
            self.package.replace_part(DOCUMENT_PART, bytes);
        }
        self.package.save(output)
    }
}
