use log::debug;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::path::Path;

use crate::errors::{DocumentError, FragmentApplyError};

use super::ooxml::{Package, XmlPart, prefix_of};
use super::{Fragment, FragmentLocation};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

#[derive(Debug)]
struct Sheet {
    name: String,
    part_name: String,
    xml: XmlPart,
}

#[derive(Debug, Clone, Copy)]
struct CellSlot {
    sheet: usize,
    cell_index: usize,
}

/// An Excel workbook
///
/// Fragments are the text cells (shared or inline strings) of every
/// worksheet, in workbook, row, cell order. Formula cells are never
/// fragments; a `str` cell without a formula is. Element names are matched
/// by local name, so prefixed SpreadsheetML reads the same. A translated
/// cell is rewritten as an inline string, so cells that shared one string
/// are translated independently.
#[derive(Debug)]
pub struct Workbook {
    package: Package,
    sheets: Vec<Sheet>,
    fragments: Vec<Fragment>,
    slots: Vec<CellSlot>,
}

impl Workbook {
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let package = Package::open(path)?;
        if !package.has_part(WORKBOOK_PART) {
            return Err(DocumentError::Parse {
                path: path.to_path_buf(),
                message: format!("missing {}", WORKBOOK_PART),
            });
        }

        let shared_strings = if package.has_part(SHARED_STRINGS_PART) {
            let xml = package.read_xml(SHARED_STRINGS_PART)?;
            xml.elements_local("si").into_iter().map(|si| string_item_text(&xml, si)).collect()
        } else {
            Vec::new()
        };

        let workbook = package.read_xml(WORKBOOK_PART)?;
        let relationships = package.relationships(WORKBOOK_RELS)?;

        let mut sheets = Vec::new();
        for index in workbook.elements_local("sheet") {
            let name = workbook.attribute(index, "name").unwrap_or_default();
            let Some(part_name) = relationship_id(&workbook, index).and_then(|id| relationships.get(&id).cloned())
            else {
                debug!("Sheet '{}' has no worksheet part, skipping", name);
                continue;
            };
            if !package.has_part(&part_name) {
                continue;
            }
            let xml = package.read_xml(&part_name)?;
            sheets.push(Sheet { name, part_name, xml });
        }

        let mut workbook = Self {
            package,
            sheets,
            fragments: Vec::new(),
            slots: Vec::new(),
        };
        for sheet in 0..workbook.sheets.len() {
            workbook.collect_cells(sheet, &shared_strings);
        }

        Ok(workbook)
    }

    fn collect_cells(&mut self, sheet: usize, shared_strings: &[String]) {
        let Sheet { name, xml, .. } = &self.sheets[sheet];
        let Some(data) = xml.elements_local("sheetData").first().copied() else {
            return;
        };

        let mut found = Vec::new();
        let rows = xml.children(data).into_iter().filter(|&c| xml.is_local(c, "row"));
        for (row_position, row) in rows.enumerate() {
            let row_number = xml
                .attribute(row, "r")
                .and_then(|r| r.parse().ok())
                .unwrap_or(row_position as u32 + 1);

            let cells = xml.children(row).into_iter().filter(|&c| xml.is_local(c, "c"));
            for (column_position, cell) in cells.enumerate() {
                let text = match xml.attribute(cell, "t").as_deref() {
                    Some("s") => xml
                        .child_local(cell, "v")
                        .and_then(|v| xml.text(v).trim().parse::<usize>().ok())
                        .and_then(|i| shared_strings.get(i).cloned()),
                    Some("inlineStr") => xml.child_local(cell, "is").map(|is| string_item_text(xml, is)),
                    // Formula results stay untranslated
                    Some("str") if xml.child_local(cell, "f").is_none() => {
                        xml.child_local(cell, "v").map(|v| xml.text(v))
                    }
                    _ => None,
                };
                let Some(text) = text else {
                    continue;
                };
                if text.trim().is_empty() {
                    continue;
                }

                let reference = xml
                    .attribute(cell, "r")
                    .unwrap_or_else(|| format!("{}{}", column_name(column_position + 1), row_number));
                let location = FragmentLocation::Cell {
                    sheet: name.clone(),
                    row: row_number,
                    cell: reference,
                };
                found.push((location, cell, text));
            }
        }

        for (location, cell_index, text) in found {
            let id = self.fragments.len();
            self.fragments.push(Fragment { id, location, text });
            self.slots.push(CellSlot { sheet, cell_index });
        }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn apply(&mut self, id: usize, text: &str) -> Result<(), FragmentApplyError> {
        let slot = *self.slots.get(id).ok_or(FragmentApplyError::UnknownFragment(id))?;
        let xml = &mut self.sheets[slot.sheet].xml;
        if xml.is_edited(slot.cell_index) {
            return Err(FragmentApplyError::AlreadyApplied(id));
        }

        let tag = xml
            .start_tag(slot.cell_index)
            .cloned()
            .ok_or_else(|| FragmentApplyError::Unwritable {
                id,
                message: "cell element vanished".to_string(),
            })?;
        xml.replace(slot.cell_index, inline_string_cell(&tag, text));
        Ok(())
    }

    pub fn save(&mut self, output: &Path) -> Result<(), DocumentError> {
        for sheet in &self.sheets {
            if !sheet.xml.has_edits() {
                continue;
            }
            let bytes = sheet.xml.to_bytes().map_err(|e| DocumentError::Save {
                path: output.to_path_buf(),
                message: format!("{}: {}", sheet.part_name, e),
            })?;
            self.package.replace_part(&sheet.part_name, bytes);
        }
        self.package.save(output)
    }
}

/// Text of a string item (`si` or `is`), leaving out phonetic runs
fn string_item_text(xml: &XmlPart, item: usize) -> String {
    let mut text = String::new();
    let end = xml.end_of(item);
    let mut cursor = item + 1;
    while cursor < end {
        if xml.is_local(cursor, "rPh") {
            cursor = xml.end_of(cursor) + 1;
            continue;
        }
        if xml.is_local(cursor, "t") {
            text.push_str(&xml.text(cursor));
            cursor = xml.end_of(cursor) + 1;
            continue;
        }
        cursor += 1;
    }
    text
}

/// Relationship id of a `sheet` element
///
/// The attribute is normally `r:id`, but any prefix bound to the
/// relationships namespace is accepted.
fn relationship_id(xml: &XmlPart, index: usize) -> Option<String> {
    if let Some(id) = xml.attribute(index, "r:id") {
        return Some(id);
    }
    let tag = xml.start_tag(index)?;
    tag.attributes()
        .flatten()
        .find(|attr| attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id")
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Events for a cell holding `text` as an inline string
///
/// Keeps the cell's reference and style, drops its previous value.
fn inline_string_cell(tag: &BytesStart<'static>, text: &str) -> Vec<Event<'static>> {
    let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
    let prefix = prefix_of(name.as_bytes());

    let mut cell = BytesStart::new(name.clone());
    for attr in tag.attributes().flatten() {
        if attr.key.as_ref() != b"t" {
            cell.push_attribute(attr);
        }
    }
    cell.push_attribute(("t", "inlineStr"));

    let inline = format!("{}is", prefix);
    let text_name = format!("{}t", prefix);
    let mut text_start = BytesStart::new(text_name.clone());
    text_start.push_attribute(("xml:space", "preserve"));

    vec![
        Event::Start(cell),
        Event::Start(BytesStart::new(inline.clone())),
        Event::Start(text_start),
        Event::Text(BytesText::new(text).into_owned()),
        Event::End(BytesEnd::new(text_name)),
        Event::End(BytesEnd::new(inline)),
        Event::End(BytesEnd::new(name)),
    ]
}

/// Spreadsheet column letters for a 1-based column number
pub fn column_name(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let remainder = (column - 1) % 26;
        letters.push((b'A' + remainder as u8) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}
