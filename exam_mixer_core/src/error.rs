use crate::ooxml::OoxmlError;

/// Errors that abort a whole mixing request.
///
/// Problems inside the exam content (a question without options, an
/// unmarked answer) are never errors; they are logged and show up as
/// weaker answer-key cells.
#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    #[error("Invalid source document: {0}")]
    Ooxml(#[from] OoxmlError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to export: {0}")]
    Export(String),
}

impl From<zip::result::ZipError> for MixerError {
    fn from(err: zip::result::ZipError) -> Self {
        MixerError::Ooxml(OoxmlError::Zip(err))
    }
}

pub type Result<T> = std::result::Result<T, MixerError>;
