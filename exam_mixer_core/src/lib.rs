pub mod ooxml;
pub mod pattern;
pub mod text;
pub mod emphasis;
pub mod label;
pub mod segment;
pub mod shuffle;
pub mod answer_key;
pub mod validate;
pub mod config;
pub mod error;

#[cfg(test)]
mod test_support;

pub use answer_key::{AnswerCell, AnswerKey, VersionAnswers};
pub use config::{MixerConfig, ShortAnswerPolicy, ShuffleMode, TrueFalseMode};
pub use error::{MixerError, Result};
pub use label::{relabel, RelabelStyle};
pub use ooxml::Block;
pub use validate::ValidationReport;

mod api;
pub use api::*;
