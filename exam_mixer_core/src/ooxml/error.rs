//! Errors raised while reading or writing the OOXML package

/// Failures of the package/markup layer.
///
/// Every variant is fatal for a generation request: the source archive is
/// unusable and no version is produced.
#[derive(Debug, thiserror::Error)]
pub enum OoxmlError {
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Part not found: {0}")]
    PartNotFound(String),
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}
