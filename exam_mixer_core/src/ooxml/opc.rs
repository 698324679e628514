//! OPC (Open Packaging Conventions) Package Reader
//! Reads the ZIP container of a Word document, locates the main document
//! part and writes copies of the package with that one part substituted.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};

use once_cell::sync::Lazy;
use regex::Regex;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use super::error::OoxmlError;
use super::types::{ContentType, Relationship, RelationshipType};

/// Fallback location of the body part when the package metadata is silent
pub const DEFAULT_MAIN_PART: &str = "word/document.xml";

static OVERRIDE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<Override\b([^>]*?)/?>"#).expect("override pattern is valid"));
static DEFAULT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<Default\b([^>]*?)/?>"#).expect("default pattern is valid"));
static RELATIONSHIP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<Relationship\b([^>]*?)/?>"#).expect("relationship pattern is valid"));
static ATTRIBUTE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][\w.:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("attribute pattern is valid")
});

/// OPC Package Reader
#[derive(Debug, Clone, Default)]
pub struct OpcPackage {
    /// Raw archive bytes, kept for byte-exact repackaging
    data: Vec<u8>,
    /// Entry names in archive order
    pub entries: Vec<String>,
    /// All content types indexed by part name (overrides) or `/<ext>` (defaults)
    pub content_types: HashMap<String, ContentType>,
    /// Root relationships (_rels/.rels)
    pub root_relationships: Vec<Relationship>,
}

impl OpcPackage {
    /// Create a new OpcPackage from ZIP file data
    pub fn new(file_data: &[u8]) -> Result<Self, OoxmlError> {
        let mut archive = ZipArchive::new(Cursor::new(file_data))?;

        let mut package = OpcPackage {
            data: file_data.to_vec(),
            entries: Vec::with_capacity(archive.len()),
            content_types: HashMap::new(),
            root_relationships: Vec::new(),
        };

        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            package.entries.push(file.name().to_string());
        }

        if let Some(xml_data) = Self::read_file_from_archive(&mut archive, &["[Content_Types].xml"]) {
            package.parse_content_types_xml(&xml_data);
        }

        if let Some(xml_data) = Self::read_file_from_archive(&mut archive, &["_rels/.rels"]) {
            package.root_relationships = Self::parse_relationships_xml(&xml_data);
        }

        Ok(package)
    }

    /// First readable entry among `paths`, each tried with and without a
    /// leading slash
    fn read_file_from_archive<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
        paths: &[&str],
    ) -> Option<Vec<u8>> {
        for path in paths {
            for name in [path.to_string(), format!("/{}", path)] {
                let Ok(mut file) = archive.by_name(&name) else {
                    continue;
                };
                let mut data = Vec::new();
                if file.read_to_end(&mut data).is_ok() {
                    return Some(data);
                }
            }
        }
        None
    }

    /// Parse the content types XML data using regex
    fn parse_content_types_xml(&mut self, xml_data: &[u8]) {
        let xml_str = String::from_utf8_lossy(xml_data);

        // <Override PartName="/word/document.xml" ContentType="...document.main+xml"/>
        for cap in OVERRIDE_PATTERN.captures_iter(&xml_str) {
            let attrs = parse_attributes(&cap[1]);
            if let (Some(part_name), Some(content_type)) = (attrs.get("PartName"), attrs.get("ContentType")) {
                self.content_types
                    .insert(part_name.clone(), ContentType::from_string(content_type));
            }
        }

        // <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
        for cap in DEFAULT_PATTERN.captures_iter(&xml_str) {
            let attrs = parse_attributes(&cap[1]);
            if let (Some(extension), Some(content_type)) = (attrs.get("Extension"), attrs.get("ContentType")) {
                self.content_types
                    .insert(format!("/{}", extension), ContentType::from_string(content_type));
            }
        }
    }

    /// Parse relationships XML using regex
    fn parse_relationships_xml(xml_data: &[u8]) -> Vec<Relationship> {
        let xml_str = String::from_utf8_lossy(xml_data);

        // <Relationship Id="rId1" Type=".../officeDocument" Target="word/document.xml"/>
        RELATIONSHIP_PATTERN
            .captures_iter(&xml_str)
            .filter_map(|cap| {
                let attrs = parse_attributes(&cap[1]);
                Some(Relationship {
                    id: attrs.get("Id")?.clone(),
                    relationship_type: RelationshipType::from_string(attrs.get("Type")?),
                    target: attrs.get("Target")?.clone(),
                })
            })
            .collect()
    }

    /// Name of the part holding the document body.
    ///
    /// Resolved from the root `officeDocument` relationship, then from the
    /// content-type overrides, then `word/document.xml`.
    pub fn main_document_part(&self) -> Result<String, OoxmlError> {
        let from_rels = self
            .root_relationships
            .iter()
            .find(|rel| rel.relationship_type == RelationshipType::OfficeDocument)
            .map(|rel| normalize_part_name(&rel.target));

        let from_types = || {
            let mut names: Vec<&String> = self
                .content_types
                .iter()
                .filter(|(_, ct)| ct.is_main_document())
                .map(|(name, _)| name)
                .collect();
            names.sort();
            names.first().map(|name| normalize_part_name(name))
        };

        let candidate = from_rels
            .or_else(from_types)
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

        if self.entries.iter().any(|entry| normalize_part_name(entry) == candidate) {
            Ok(candidate)
        } else {
            Err(OoxmlError::PartNotFound(candidate))
        }
    }

    /// Read an entry as bytes
    pub fn read_part(&self, name: &str) -> Result<Vec<u8>, OoxmlError> {
        let mut archive = ZipArchive::new(Cursor::new(self.data.as_slice()))?;
        Self::read_file_from_archive(&mut archive, &[name])
            .ok_or_else(|| OoxmlError::PartNotFound(name.to_string()))
    }

    /// Read an entry as UTF-8 text
    pub fn read_part_string(&self, name: &str) -> Result<String, OoxmlError> {
        let data = self.read_part(name)?;
        String::from_utf8(data)
            .map_err(|e| OoxmlError::ParseError(format!("{} is not valid UTF-8: {}", name, e)))
    }

    /// Write a copy of the package where `part_name` holds `data`.
    ///
    /// Every other entry is copied raw (compressed bytes, timestamps and
    /// order untouched).
    pub fn write_with_replacement(&self, part_name: &str, data: &[u8]) -> Result<Vec<u8>, OoxmlError> {
        let target = normalize_part_name(part_name);
        let mut archive = ZipArchive::new(Cursor::new(self.data.as_slice()))?;

        let mut writer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut writer);
            let mut replaced = false;

            for i in 0..archive.len() {
                let file = archive.by_index_raw(i)?;
                if normalize_part_name(file.name()) == target {
                    let name = file.name().to_string();
                    let options = FileOptions::default()
                        .compression_method(zip::CompressionMethod::Deflated)
                        .last_modified_time(file.last_modified());
                    drop(file);
                    zip.start_file(name, options)?;
                    zip.write_all(data)?;
                    replaced = true;
                } else {
                    zip.raw_copy_file(file)?;
                }
            }

            if !replaced {
                return Err(OoxmlError::PartNotFound(target));
            }
            zip.finish()?;
        }

        Ok(writer.into_inner())
    }
}

fn normalize_part_name(name: &str) -> String {
    name.trim_start_matches('/').to_string()
}

fn parse_attributes(fragment: &str) -> HashMap<String, String> {
    ATTRIBUTE_PATTERN
        .captures_iter(fragment)
        .map(|cap| {
            let value = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());
            (cap[1].to_string(), value.to_string())
        })
        .collect()
}
