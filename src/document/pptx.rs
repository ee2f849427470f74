use log::debug;
use std::path::Path;

use crate::errors::{DocumentError, FragmentApplyError};

use super::ooxml::{Package, XmlPart, text_element};
use super::{Fragment, FragmentLocation};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Elements that count as shapes in a slide's shape tree
const SHAPE_ELEMENTS: &[&str] = &["p:sp", "p:grpSp", "p:graphicFrame", "p:cxnSp", "p:pic", "p:contentPart"];

#[derive(Debug)]
struct Slide {
    part_name: String,
    xml: XmlPart,
}

/// Where a run's text lives
#[derive(Debug, Clone, Copy)]
struct RunSlot {
    slide: usize,
    text_index: usize,
}

/// A PowerPoint presentation
///
/// Fragments are the text runs (`a:r`) of the top-level shapes of every
/// slide, in slide, shape, paragraph, run order.
#[derive(Debug)]
pub struct Presentation {
    package: Package,
    slides: Vec<Slide>,
    fragments: Vec<Fragment>,
    slots: Vec<RunSlot>,
}

impl Presentation {
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let package = Package::open(path)?;
        let slide_parts = slide_part_names(&package)?;
        debug!("{} slides in {}", slide_parts.len(), path.display());

        let mut presentation = Self {
            package,
            slides: Vec::new(),
            fragments: Vec::new(),
            slots: Vec::new(),
        };

        for part_name in slide_parts {
            let xml = presentation.package.read_xml(&part_name)?;
            presentation.slides.push(Slide { part_name, xml });
        }

        for slide in 0..presentation.slides.len() {
            presentation.collect_runs(slide);
        }

        Ok(presentation)
    }

    fn collect_runs(&mut self, slide: usize) {
        let xml = &self.slides[slide].xml;
        let Some(tree) = xml.elements_named("p:spTree").first().copied() else {
            return;
        };

        let mut found = Vec::new();
        let mut shape_number = 0;
        for shape in xml.children(tree) {
            if !SHAPE_ELEMENTS.iter().any(|name| xml.is_element(shape, name)) {
                continue;
            }
            shape_number += 1;

            if !xml.is_element(shape, "p:sp") {
                continue;
            }
            let Some(body) = xml.child(shape, "p:txBody") else {
                continue;
            };

            let paragraphs = xml.children(body).into_iter().filter(|&c| xml.is_element(c, "a:p"));
            for (paragraph_number, paragraph) in paragraphs.enumerate() {
                let runs = xml.children(paragraph).into_iter().filter(|&c| xml.is_element(c, "a:r"));
                for (run_number, run) in runs.enumerate() {
                    let Some(text_index) = xml.child(run, "a:t") else {
                        continue;
                    };
                    let location = FragmentLocation::Run {
                        slide: slide + 1,
                        shape: shape_number,
                        paragraph: paragraph_number + 1,
                        run: run_number + 1,
                    };
                    found.push((location, text_index, xml.text(text_index)));
                }
            }
        }

        for (location, text_index, text) in found {
            if text.trim().is_empty() {
                continue;
            }
            let id = self.fragments.len();
            self.fragments.push(Fragment { id, location, text });
            self.slots.push(RunSlot { slide, text_index });
        }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn apply(&mut self, id: usize, text: &str) -> Result<(), FragmentApplyError> {
        let slot = *self.slots.get(id).ok_or(FragmentApplyError::UnknownFragment(id))?;
        let xml = &mut self.slides[slot.slide].xml;
        if xml.is_edited(slot.text_index) {
            return Err(FragmentApplyError::AlreadyApplied(id));
        }

        let tag = xml
            .start_tag(slot.text_index)
            .cloned()
            .ok_or_else(|| FragmentApplyError::Unwritable {
                id,
                message: "run has no text element".to_string(),
            })?;
        xml.replace(slot.text_index, text_element(&tag, text, false));
        Ok(())
    }

    pub fn save(&mut self, output: &Path) -> Result<(), DocumentError> {
        for slide in &self.slides {
            if !slide.xml.has_edits() {
                continue;
            }
            let bytes = slide.xml.to_bytes().map_err(|e| DocumentError::Save {
                path: output.to_path_buf(),
                message: format!("{}: {}", slide.part_name, e),
            })?;
            self.package.replace_part(&slide.part_name, bytes);
        }
        self.package.save(output)
    }
}

/// Slide part names in presentation order
///
/// The slide list of `ppt/presentation.xml` decides the order; packages
/// without it fall back to the slide number in the part name.
fn slide_part_names(package: &Package) -> Result<Vec<String>, DocumentError> {
    if package.has_part(PRESENTATION_PART) {
        let presentation = package.read_xml(PRESENTATION_PART)?;
        let relationships = package.relationships(PRESENTATION_RELS)?;

        let ordered: Vec<String> = presentation
            .elements_named("p:sldId")
            .into_iter()
            .filter_map(|i| presentation.attribute(i, "r:id"))
            .filter_map(|id| relationships.get(&id).cloned())
            .filter(|name| package.has_part(name))
            .collect();

        if !ordered.is_empty() {
            return Ok(ordered);
        }
    }

    let mut numbered: Vec<(u32, String)> = package
        .part_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    numbered.sort();

    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}
