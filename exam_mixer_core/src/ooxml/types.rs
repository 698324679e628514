use serde::{Deserialize, Serialize};

use super::xml::{XmlElement, XmlNode};
use super::W_NS;

const MAIN_DOCUMENT_TYPES: [&str; 3] = [
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
    "application/vnd.ms-word.document.macroEnabled.main+xml",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml",
];

const OFFICE_DOCUMENT_RELS: [&str; 2] = [
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
    "http://purl.oclc.org/ooxml/officeDocument/relationships/officeDocument",
];

/// Content type of a part, as declared in `[Content_Types].xml`.
/// Only the main document matters here; everything else is carried through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// Body of a `.docx`, `.docm` or `.dotx`
    MainDocument,
    Other(String),
}

impl ContentType {
    pub fn from_string(s: &str) -> Self {
        if MAIN_DOCUMENT_TYPES.contains(&s) {
            ContentType::MainDocument
        } else {
            ContentType::Other(s.to_string())
        }
    }

    pub fn is_main_document(&self) -> bool {
        matches!(self, ContentType::MainDocument)
    }
}

/// Type of a package relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// Package root to main part, transitional or strict namespace
    OfficeDocument,
    Other(String),
}

impl RelationshipType {
    pub fn from_string(s: &str) -> Self {
        if OFFICE_DOCUMENT_RELS.contains(&s) {
            RelationshipType::OfficeDocument
        } else {
            RelationshipType::Other(s.to_string())
        }
    }
}

/// One `<Relationship>` of `_rels/.rels`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub relationship_type: RelationshipType,
    /// Part name relative to the package root
    pub target: String,
}

/// A top-level structural unit of the document body.
///
/// Blocks own their subtree: moving a block into a new position moves the
/// whole paragraph or table, and cloning one never aliases the original.
/// Comments and CDATA sections directly in front of the element travel
/// with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    leading: Vec<XmlNode>,
    element: XmlElement,
}

impl Block {
    pub fn new(element: XmlElement) -> Self {
        Block {
            leading: Vec::new(),
            element,
        }
    }

    /// A block preceded by non-element body nodes
    pub fn with_leading(leading: Vec<XmlNode>, element: XmlElement) -> Self {
        Block { leading, element }
    }

    /// Non-element nodes written before the element
    pub fn leading(&self) -> &[XmlNode] {
        &self.leading
    }

    pub fn element(&self) -> &XmlElement {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut XmlElement {
        &mut self.element
    }

    pub fn into_element(self) -> XmlElement {
        self.element
    }

    /// Leading nodes followed by the element, in document order
    pub fn into_nodes(self) -> impl Iterator<Item = XmlNode> {
        self.leading
            .into_iter()
            .chain(std::iter::once(XmlNode::Element(self.element)))
    }

    /// Trimmed visible text, for classification only
    pub fn text(&self) -> String {
        crate::text::extract_text(self)
    }
}

/// Formatting of a run, as far as answer marking is concerned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFormat {
    /// Text color (`w:color/@w:val`)
    pub color: Option<String>,
    /// Underline type (`w:u/@w:val`)
    pub underline: Option<String>,
    /// Highlight color (`w:highlight/@w:val`)
    pub highlight: Option<String>,
    /// Shading fill (`w:shd/@w:fill`)
    pub shading: Option<String>,
}

impl RunFormat {
    /// Read the direct formatting of a `w:r` element
    pub fn from_run(run: &XmlElement) -> Self {
        let mut format = RunFormat::default();
        let Some(rpr) = run.child(W_NS, "rPr") else {
            return format;
        };

        format.color = rpr.child(W_NS, "color").and_then(|el| el.attr("val"));
        format.underline = rpr.child(W_NS, "u").and_then(|el| el.attr("val"));
        format.highlight = rpr.child(W_NS, "highlight").and_then(|el| el.attr("val"));
        format.shading = rpr.child(W_NS, "shd").and_then(|el| el.attr("fill"));
        format
    }
}
