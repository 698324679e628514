//! Mixing configuration
//!
//! Every field has a default, so an empty TOML file is a valid
//! configuration:
//!
//! ```toml
//! shuffle_mode = "auto"
//! version_count = 4
//! version_code_start = 101
//! file_prefix = "KiemTra"
//! true_false_mode = "shuffle_all"
//! short_answer = "strip_marker"
//! fix_floating_images = false
//! # seed = 42
//!
//! [relabel_style]
//! enabled = true
//! color = "0000FF"
//! bold = true
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MixerError, Result};
use crate::label::RelabelStyle;

/// How the body is divided into parts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleMode {
    /// Infer parts from `PHẦN 1`..`PHẦN 4` headings
    #[default]
    Auto,
    /// One multiple-choice part, headings ignored
    #[serde(alias = "mcq")]
    McqOnly,
    /// One true/false part, headings ignored
    #[serde(alias = "tf")]
    TrueFalseOnly,
}

impl FromStr for ShuffleMode {
    type Err = MixerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ShuffleMode::Auto),
            "mcq" | "mcq_only" => Ok(ShuffleMode::McqOnly),
            "tf" | "true_false" | "true_false_only" => Ok(ShuffleMode::TrueFalseOnly),
            other => Err(MixerError::Config(format!("unknown shuffle mode '{}'", other))),
        }
    }
}

impl fmt::Display for ShuffleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShuffleMode::Auto => "auto",
            ShuffleMode::McqOnly => "mcq_only",
            ShuffleMode::TrueFalseOnly => "true_false_only",
        };
        f.write_str(name)
    }
}

/// Treatment of true/false statements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrueFalseMode {
    /// Keep the last statement in place, shuffle the others; no answer is
    /// recorded
    PinLast,
    /// Shuffle every statement and record `Đ`/`S` per final position
    #[default]
    ShuffleAll,
}

/// What happens to the `ĐS: ...` line of a short-answer question
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortAnswerPolicy {
    /// Remove the marker and the answer from the generated exam
    #[default]
    StripMarker,
    /// Leave the question text untouched
    KeepMarker,
}

/// Options for one mixing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    pub shuffle_mode: ShuffleMode,
    /// Number of versions to generate (at least 1)
    pub version_count: u32,
    /// Code of the first version; codes are consecutive
    pub version_code_start: u32,
    /// File name prefix for `<prefix>_<code>.docx`
    pub file_prefix: String,
    pub true_false_mode: TrueFalseMode,
    pub short_answer: ShortAnswerPolicy,
    /// Convert floating pictures to inline before shuffling
    pub fix_floating_images: bool,
    /// Fixed RNG seed for reproducible output
    pub seed: Option<u64>,
    pub relabel_style: RelabelStyle,
}

impl Default for MixerConfig {
    fn default() -> Self {
        MixerConfig {
            shuffle_mode: ShuffleMode::Auto,
            version_count: 4,
            version_code_start: 101,
            file_prefix: "KiemTra".to_string(),
            true_false_mode: TrueFalseMode::ShuffleAll,
            short_answer: ShortAnswerPolicy::StripMarker,
            fix_floating_images: false,
            seed: None,
            relabel_style: RelabelStyle::default(),
        }
    }
}

impl MixerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: MixerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loaded configuration from {}", path.as_ref().display());
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version_count == 0 {
            return Err(MixerError::Config("version_count must be at least 1".to_string()));
        }
        if self
            .version_code_start
            .checked_add(self.version_count - 1)
            .is_none()
        {
            return Err(MixerError::Config(format!(
                "version codes starting at {} overflow",
                self.version_code_start
            )));
        }
        let color = &self.relabel_style.color;
        if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MixerError::Config(format!(
                "relabel_style.color must be RRGGBB hex, got '{}'",
                color
            )));
        }
        if self.file_prefix.contains(['/', '\\']) {
            return Err(MixerError::Config(format!(
                "file_prefix '{}' must not contain path separators",
                self.file_prefix
            )));
        }
        Ok(())
    }

    /// Version codes in generation order
    pub fn version_codes(&self) -> Vec<String> {
        (0..self.version_count)
            .map(|i| (self.version_code_start + i).to_string())
            .collect()
    }

    /// Output file name of one version
    pub fn file_name(&self, code: &str) -> String {
        format!("{}_{}.docx", self.file_prefix, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = MixerConfig::from_toml_str("").unwrap();
        assert_eq!(config, MixerConfig::default());
        assert_eq!(config.version_codes(), vec!["101", "102", "103", "104"]);
    }

    #[test]
    fn test_toml_fields_and_aliases() {
        let config = MixerConfig::from_toml_str(
            r#"
shuffle_mode = "tf"
version_count = 2
version_code_start = 201
true_false_mode = "pin_last"
short_answer = "keep_marker"
seed = 7

[relabel_style]
enabled = false
"#,
        )
        .unwrap();
        assert_eq!(config.shuffle_mode, ShuffleMode::TrueFalseOnly);
        assert_eq!(config.version_codes(), vec!["201", "202"]);
        assert_eq!(config.true_false_mode, TrueFalseMode::PinLast);
        assert_eq!(config.short_answer, ShortAnswerPolicy::KeepMarker);
        assert_eq!(config.seed, Some(7));
        assert!(!config.relabel_style.enabled);
        assert_eq!(config.relabel_style.color, "0000FF");
        assert_eq!(config.file_name("201"), "KiemTra_201.docx");
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(matches!(
            MixerConfig::from_toml_str("version_count = 0"),
            Err(MixerError::Config(_))
        ));
        assert!(matches!(
            MixerConfig::from_toml_str("version_count = \"many\""),
            Err(MixerError::ConfigParse(_))
        ));
        assert!(matches!(
            MixerConfig::from_toml_str("[relabel_style]\ncolor = \"blue\""),
            Err(MixerError::Config(_))
        ));
        assert!(matches!(
            MixerConfig::from_toml_str("version_code_start = 4294967295\nversion_count = 2"),
            Err(MixerError::Config(_))
        ));
    }

    #[test]
    fn test_shuffle_mode_from_str() {
        assert_eq!("AUTO".parse::<ShuffleMode>().unwrap(), ShuffleMode::Auto);
        assert_eq!("mcq".parse::<ShuffleMode>().unwrap(), ShuffleMode::McqOnly);
        assert_eq!("true_false_only".parse::<ShuffleMode>().unwrap(), ShuffleMode::TrueFalseOnly);
        assert!("essay".parse::<ShuffleMode>().is_err());
        assert_eq!(ShuffleMode::McqOnly.to_string(), "mcq_only");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixer.toml");
        std::fs::write(&path, "file_prefix = \"De\"\nversion_count = 1\n").unwrap();
        let config = MixerConfig::load(&path).unwrap();
        assert_eq!(config.file_prefix, "De");
        assert_eq!(config.version_codes(), vec!["101"]);

        assert!(matches!(
            MixerConfig::load(dir.path().join("missing.toml")),
            Err(MixerError::Io(_))
        ));
    }
}
