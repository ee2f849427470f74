/*!
 * Office Open XML package access.
 *
 * A package is a zip archive of XML parts. Parts are parsed into an event
 * list; edits replace whole elements and are spliced in when the part is
 * serialized, so everything that was not edited is written back exactly as
 * it was read. Parts that were never edited are copied raw from the source
 * archive.
 */

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesStart, BytesText, Event};
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::DocumentError;
use crate::file_utils::FileManager;

/// An opened OOXML package
#[derive(Debug)]
pub struct Package {
    path: PathBuf,
    bytes: Vec<u8>,
    names: Vec<String>,
    replaced: HashMap<String, Vec<u8>>,
}

impl Package {
    /// Read a package from disk
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let bytes = std::fs::read(path).map_err(|e| DocumentError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).map_err(|e| DocumentError::Parse {
            path: path.to_path_buf(),
            message: format!("not a valid package: {}", e),
        })?;
        let names = archive.file_names().map(str::to_string).collect();

        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            names,
            replaced: HashMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    fn parse_error(&self, message: String) -> DocumentError {
        DocumentError::Parse {
            path: self.path.clone(),
            message,
        }
    }

    /// Raw bytes of a part
    pub fn read_part(&self, name: &str) -> Result<Vec<u8>, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice()))
            .map_err(|e| self.parse_error(e.to_string()))?;
        let mut file = archive
            .by_name(name)
            .map_err(|e| self.parse_error(format!("{}: {}", name, e)))?;

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .map_err(|e| self.parse_error(format!("{}: {}", name, e)))?;
        Ok(buffer)
    }

    /// Parse a part as XML
    pub fn read_xml(&self, name: &str) -> Result<XmlPart, DocumentError> {
        let bytes = self.read_part(name)?;
        XmlPart::parse(&bytes).map_err(|e| self.parse_error(format!("{}: {}", name, e)))
    }

    /// Relationship targets of a `.rels` part keyed by id, resolved to part names
    ///
    /// A missing rels part yields an empty map.
    pub fn relationships(&self, rels_name: &str) -> Result<HashMap<String, String>, DocumentError> {
        let mut targets = HashMap::new();
        if !self.has_part(rels_name) {
            return Ok(targets);
        }

        let base_dir = rels_base_dir(rels_name);
        let xml = self.read_xml(rels_name)?;
        for index in xml.elements_named("Relationship") {
            if let (Some(id), Some(target)) = (xml.attribute(index, "Id"), xml.attribute(index, "Target")) {
                targets.insert(id, resolve_target(&base_dir, &target));
            }
        }
        Ok(targets)
    }

    /// Replace the content of a part on save
    pub fn replace_part(&mut self, name: &str, bytes: Vec<u8>) {
        self.replaced.insert(name.to_string(), bytes);
    }

    /// Write the package to `output`, going through a temporary file
    pub fn save(&self, output: &Path) -> Result<(), DocumentError> {
        let save_error = |message: String| DocumentError::Save {
            path: output.to_path_buf(),
            message,
        };

        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        FileManager::ensure_dir(&dir).map_err(|e| save_error(e.to_string()))?;
        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| save_error(e.to_string()))?;

        {
            let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice()))
                .map_err(|e| save_error(e.to_string()))?;
            let mut writer = ZipWriter::new(temp.as_file_mut());
            let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

            for index in 0..archive.len() {
                let file = archive.by_index_raw(index).map_err(|e| save_error(e.to_string()))?;
                match self.replaced.get(file.name()) {
                    Some(content) => {
                        let name = file.name().to_string();
                        drop(file);
                        writer
                            .start_file(name, options)
                            .map_err(|e| save_error(e.to_string()))?;
                        writer.write_all(content).map_err(|e| save_error(e.to_string()))?;
                    }
                    None => writer.raw_copy_file(file).map_err(|e| save_error(e.to_string()))?,
                }
            }

            writer.finish().map_err(|e| save_error(e.to_string()))?;
        }

        temp.persist(output).map_err(|e| save_error(e.error.to_string()))?;
        Ok(())
    }
}

/// Directory that relationship targets in a `.rels` part are relative to
fn rels_base_dir(rels_name: &str) -> String {
    // "ppt/_rels/presentation.xml.rels" -> "ppt"
    match rels_name.rsplit_once("/_rels/") {
        Some((dir, _)) => dir.to_string(),
        None => String::new(),
    }
}

/// Resolve a relationship target to a part name
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// A parsed XML part with pending element replacements
#[derive(Debug, Clone)]
pub struct XmlPart {
    events: Vec<Event<'static>>,
    /// Index of the matching end event; the event's own index for everything else
    ends: Vec<usize>,
    edits: BTreeMap<usize, Vec<Event<'static>>>,
}

impl XmlPart {
    pub fn parse(bytes: &[u8]) -> Result<Self, quick_xml::Error> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(false);

        let mut events = Vec::new();
        let mut ends = Vec::new();
        let mut open = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Eof => break,
                event => {
                    let index = events.len();
                    ends.push(index);
                    match &event {
                        Event::Start(_) => open.push(index),
                        Event::End(_) => {
                            if let Some(start) = open.pop() {
                                ends[start] = index;
                            }
                        }
                        _ => {}
                    }
                    events.push(event.into_owned());
                }
            }
            buf.clear();
        }

        Ok(Self {
            events,
            ends,
            edits: BTreeMap::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Qualified name of the element starting at `index`
    pub fn name(&self, index: usize) -> Option<&[u8]> {
        match self.events.get(index)? {
            Event::Start(e) | Event::Empty(e) => Some(e.name().into_inner()),
            _ => None,
        }
    }

    pub fn is_element(&self, index: usize, name: &str) -> bool {
        self.name(index) == Some(name.as_bytes())
    }

    /// Whether the element at `index` has the given local name, whatever its prefix
    pub fn is_local(&self, index: usize, local: &str) -> bool {
        match self.events.get(index) {
            Some(Event::Start(e)) | Some(Event::Empty(e)) => e.local_name().as_ref() == local.as_bytes(),
            _ => false,
        }
    }

    /// Indices of all elements with the given local name, in document order
    pub fn elements_local(&self, local: &str) -> Vec<usize> {
        (0..self.events.len()).filter(|&i| self.is_local(i, local)).collect()
    }

    /// First direct child element with the given local name
    pub fn child_local(&self, index: usize, local: &str) -> Option<usize> {
        self.children(index).into_iter().find(|&c| self.is_local(c, local))
    }

    /// Index of the last event belonging to the element at `index`
    pub fn end_of(&self, index: usize) -> usize {
        self.ends.get(index).copied().unwrap_or(index)
    }

    /// Start tag of the element at `index`
    pub fn start_tag(&self, index: usize) -> Option<&BytesStart<'static>> {
        match self.events.get(index)? {
            Event::Start(e) | Event::Empty(e) => Some(e),
            _ => None,
        }
    }

    /// Unescaped value of an attribute of the element at `index`
    pub fn attribute(&self, index: usize, key: &str) -> Option<String> {
        let tag = self.start_tag(index)?;
        let attr = tag.try_get_attribute(key).ok().flatten()?;
        attr.unescape_value().ok().map(|v| v.into_owned())
    }

    /// Indices of all elements with the given name, in document order
    pub fn elements_named(&self, name: &str) -> Vec<usize> {
        (0..self.events.len()).filter(|&i| self.is_element(i, name)).collect()
    }

    /// Indices of the direct child elements of the element at `index`
    pub fn children(&self, index: usize) -> Vec<usize> {
        let mut children = Vec::new();
        let end = self.end_of(index);
        let mut cursor = index + 1;
        while cursor < end {
            if self.name(cursor).is_some() {
                children.push(cursor);
            }
            cursor = self.end_of(cursor) + 1;
        }
        children
    }

    /// First direct child element with the given name
    pub fn child(&self, index: usize, name: &str) -> Option<usize> {
        self.children(index).into_iter().find(|&c| self.is_element(c, name))
    }

    /// First descendant element with the given name
    pub fn descendant(&self, index: usize, name: &str) -> Option<usize> {
        (index + 1..self.end_of(index)).find(|&i| self.is_element(i, name))
    }

    /// All descendant elements with the given name, in document order
    pub fn descendants(&self, index: usize, name: &str) -> Vec<usize> {
        (index + 1..self.end_of(index)).filter(|&i| self.is_element(i, name)).collect()
    }

    /// Concatenated character data inside the element at `index`
    pub fn text(&self, index: usize) -> String {
        let mut text = String::new();
        for event in &self.events[index + 1..self.end_of(index).max(index + 1)] {
            match event {
                Event::Text(t) => match t.unescape() {
                    Ok(value) => text.push_str(&value),
                    Err(_) => text.push_str(&String::from_utf8_lossy(t)),
                },
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(c)),
                _ => {}
            }
        }
        text
    }

    pub fn is_edited(&self, index: usize) -> bool {
        self.edits.contains_key(&index)
    }

    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Replace the element at `index` (start through matching end) on serialization
    pub fn replace(&mut self, index: usize, events: Vec<Event<'static>>) {
        self.edits.insert(index, events);
    }

    /// Serialize the part with all edits applied
    pub fn to_bytes(&self) -> Result<Vec<u8>, quick_xml::Error> {
        let mut writer = Writer::new(Vec::new());
        let mut index = 0;
        while index < self.events.len() {
            match self.edits.get(&index) {
                Some(replacement) => {
                    for event in replacement {
                        writer.write_event(event.clone())?;
                    }
                    index = self.end_of(index) + 1;
                }
                None => {
                    writer.write_event(self.events[index].clone())?;
                    index += 1;
                }
            }
        }
        Ok(writer.into_inner())
    }
}

/// Events for an element holding only `text`, keeping the attributes of `tag`
pub fn text_element(tag: &BytesStart<'static>, text: &str, preserve_space: bool) -> Vec<Event<'static>> {
    let mut start = tag.clone();
    if preserve_space && start.try_get_attribute("xml:space").ok().flatten().is_none() {
        start.push_attribute(("xml:space", "preserve"));
    }
    let end = start.to_end().into_owned();

    vec![
        Event::Start(start),
        Event::Text(BytesText::new(text).into_owned()),
        Event::End(end),
    ]
}

/// Namespace prefix of a qualified name, including the colon
pub fn prefix_of(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    match name.split_once(':') {
        Some((prefix, _)) => format!("{}:", prefix),
        None => String::new(),
    }
}
