//! OOXML (Office Open XML) layer for Word documents (.docx)
//!
//! Reads the OPC package, parses the main document part into an owned XML
//! tree and writes the package back with only that part substituted.
//!
//! # Example
//!
//! ```rust,no_run
//! use exam_mixer_core::ooxml::parse_ooxml;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file_data = std::fs::read("exam.docx")?;
//!     let source = parse_ooxml(&file_data)?;
//!     println!("{} body blocks in {}", source.document.blocks().len(), source.part_name);
//!     Ok(())
//! }
//! ```

mod error;
mod types;
mod opc;
mod document;
mod image;
pub mod xml;

pub use error::OoxmlError;
pub use types::{Block, ContentType, Relationship, RelationshipType, RunFormat};
pub use opc::{OpcPackage, DEFAULT_MAIN_PART};
pub use document::{BodyContent, WordDocument};
pub use image::{count_floating_images, fix_floating_images};

/// WordprocessingML main namespace
pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// WordprocessingML drawing namespace (`wp:inline`, `wp:anchor`)
pub const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
/// DrawingML main namespace (`a:graphic`)
pub const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// A source package together with its parsed main document
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub package: OpcPackage,
    /// Archive entry name of the main document part
    pub part_name: String,
    pub document: WordDocument,
}

impl SourceDocument {
    /// Package bytes with the main document replaced by `document`
    pub fn repackage(&self, document: &WordDocument) -> Result<Vec<u8>, OoxmlError> {
        self.package
            .write_with_replacement(&self.part_name, document.to_xml().as_bytes())
    }
}

/// Parse OOXML document data
///
/// # Errors
///
/// Returns `OoxmlError` if:
/// - The file is not a valid ZIP archive
/// - The main document part is missing
/// - The main document part is not well-formed WordprocessingML
pub fn parse_ooxml(file_data: &[u8]) -> Result<SourceDocument, OoxmlError> {
    let package = OpcPackage::new(file_data)?;
    let part_name = package.main_document_part()?;
    let xml = package.read_part_string(&part_name)?;
    let document = WordDocument::parse(&xml)?;

    Ok(SourceDocument {
        package,
        part_name,
        document,
    })
}
