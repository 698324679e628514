//! Answer key aggregation and export
//!
//! The key is a table with one row per version and one column per final
//! question number, sorted numerically, after a leading `Mã đề` column.

use std::collections::BTreeMap;
use std::io::Cursor;

use serde::{Deserialize, Serialize};

use crate::error::{MixerError, Result};

/// Title of the version-code column
pub const VERSION_COLUMN: &str = "Mã đề";
/// Sheet name of the exported workbook
pub const SHEET_NAME: &str = "DapAn";

/// One cell of the answer key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum AnswerCell {
    /// Letter, `Đ-S-...` string or short-answer literal
    Value(String),
    /// No marked answer could be found
    Missing,
    /// The part is not scored
    Unscored,
}

impl AnswerCell {
    /// Text written to the spreadsheet
    pub fn display(&self) -> &str {
        match self {
            AnswerCell::Value(value) => value,
            AnswerCell::Missing => "?",
            AnswerCell::Unscored => "",
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, AnswerCell::Missing)
    }
}

/// Answers of one generated version, keyed by final question number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionAnswers {
    pub code: String,
    pub answers: BTreeMap<u32, AnswerCell>,
}

impl VersionAnswers {
    pub fn new(code: impl Into<String>) -> Self {
        VersionAnswers {
            code: code.into(),
            answers: BTreeMap::new(),
        }
    }

    pub fn get(&self, question: u32) -> Option<&AnswerCell> {
        self.answers.get(&question)
    }

    pub fn missing_count(&self) -> usize {
        self.answers.values().filter(|cell| cell.is_missing()).count()
    }
}

/// Answers of every version, in generation order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey {
    pub versions: Vec<VersionAnswers>,
}

#[derive(Serialize)]
struct JsonExport<'a> {
    generated_at: String,
    versions: &'a [VersionAnswers],
}

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the answers of one version
    pub fn record(&mut self, version: VersionAnswers) {
        if self.versions.iter().any(|v| v.code == version.code) {
            log::warn!("answer key already has version {}, replacing it", version.code);
            self.versions.retain(|v| v.code != version.code);
        }
        self.versions.push(version);
    }

    pub fn version(&self, code: &str) -> Option<&VersionAnswers> {
        self.versions.iter().find(|v| v.code == code)
    }

    /// Union of all question numbers, ascending
    pub fn question_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self
            .versions
            .iter()
            .flat_map(|v| v.answers.keys().copied())
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
    }

    /// Header row followed by one row per version
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let numbers = self.question_numbers();
        let mut header = vec![VERSION_COLUMN.to_string()];
        header.extend(numbers.iter().map(|n| format!("Câu {}", n)));

        let mut rows = vec![header];
        for version in &self.versions {
            let mut row = vec![version.code.clone()];
            row.extend(numbers.iter().map(|n| {
                version
                    .get(*n)
                    .map(|cell| cell.display().to_string())
                    .unwrap_or_default()
            }));
            rows.push(row);
        }
        rows
    }

    /// Workbook bytes with the key on sheet `DapAn`.
    ///
    /// Every cell is written as text so that answers such as `-0,1` or
    /// `05` keep their exact spelling.
    pub fn to_xlsx(&self) -> Result<Vec<u8>> {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book
            .get_sheet_mut(&0)
            .ok_or_else(|| MixerError::Export("new workbook has no sheet".to_string()))?;
        sheet.set_name(SHEET_NAME);

        for (r, row) in self.to_rows().iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let cell = sheet.get_cell_mut((c as u32 + 1, r as u32 + 1));
                cell.set_value_string(value.as_str());
                if r == 0 {
                    cell.get_style_mut().get_font_mut().set_bold(true);
                }
            }
        }

        let mut out = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out)
            .map_err(|e| MixerError::Export(format!("xlsx: {:?}", e)))?;
        Ok(out.into_inner())
    }

    /// JSON document with a generation timestamp
    pub fn to_json(&self) -> Result<String> {
        let export = JsonExport {
            generated_at: chrono::Local::now().to_rfc3339(),
            versions: &self.versions,
        };
        serde_json::to_string_pretty(&export).map_err(|e| MixerError::Export(e.to_string()))
    }
}
