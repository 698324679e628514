//! Pre-flight checks of a source exam
//!
//! Mixing never fails on content problems, so authors run these checks
//! first to catch unmarked answers and incomplete option lists before the
//! answer key silently fills up with `?`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::emphasis::element_marked;
use crate::ooxml::{count_floating_images, Block};
use crate::pattern::{ANSWER_MARKER, OPTION_LETTER, QUESTION};
use crate::segment::split_into_questions;
use crate::shuffle::extract_short_answer;

/// What is wrong with a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// A multiple-choice question lacks some of `A`..`D`
    MissingOptions { letters: Vec<char> },
    /// No option of a multiple-choice question is marked
    UnmarkedAnswer,
    /// The `ĐS` line of a short-answer question is not marked
    UnmarkedShortAnswer,
    /// The question holds floating pictures
    FloatingImage { count: usize },
}

/// A finding about one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Label as written in the source, e.g. `Câu 12`
    pub question: String,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::MissingOptions { letters } => {
                let letters: Vec<String> = letters.iter().map(char::to_string).collect();
                write!(f, "{}: thiếu phương án {}", self.question, letters.join(", "))
            }
            IssueKind::UnmarkedAnswer => write!(f, "{}: chưa tô đáp án", self.question),
            IssueKind::UnmarkedShortAnswer => write!(f, "{}: 'ĐS' chưa tô màu", self.question),
            IssueKind::FloatingImage { count } => {
                write!(f, "{}: {} hình nổi (nên chuyển sang In line with text)", self.question, count)
            }
        }
    }
}

/// Findings for a whole document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Number of `Câu n` groups found
    pub questions: usize,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check every question of the body
pub fn validate_blocks(blocks: &[Block]) -> ValidationReport {
    let segments = split_into_questions(blocks.to_vec(), false);
    let mut report = ValidationReport {
        questions: segments.questions.len(),
        ..ValidationReport::default()
    };

    for question in &segments.questions {
        let label = question
            .first()
            .and_then(|block| {
                QUESTION
                    .captures(&block.text())
                    .map(|caps| format!("Câu {}", &caps[1]))
            })
            .unwrap_or_else(|| "Câu ?".to_string());
        let issue = |kind| Issue {
            question: label.clone(),
            kind,
        };

        let floating: usize = question
            .iter()
            .map(|block| count_floating_images(block.element()))
            .sum();
        if floating > 0 {
            report.warnings.push(issue(IssueKind::FloatingImage { count: floating }));
        }

        let text = question.iter().map(Block::text).collect::<Vec<_>>().join(" ");
        let letters: Vec<char> = OPTION_LETTER
            .captures_iter(&text)
            .filter_map(|caps| caps[1].chars().next())
            .collect();

        if letters.contains(&'A') && letters.contains(&'D') {
            let missing: Vec<char> = ['A', 'B', 'C', 'D']
                .into_iter()
                .filter(|letter| !letters.contains(letter))
                .collect();
            if !missing.is_empty() {
                report.errors.push(issue(IssueKind::MissingOptions { letters: missing }));
            }
            if !question.iter().any(|block| element_marked(block.element())) {
                report.errors.push(issue(IssueKind::UnmarkedAnswer));
            }
        } else if ANSWER_MARKER.is_match(&text) && extract_short_answer(question).is_none() {
            report.errors.push(issue(IssueKind::UnmarkedShortAnswer));
        }
    }

    log::debug!(
        "validated {} questions: {} errors, {} warnings",
        report.questions,
        report.errors.len(),
        report.warnings.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blocks, line, mcq, p, red_run};

    #[test]
    fn test_clean_document() {
        let body = blocks(
            &[
                mcq(1, "a", ["1", "2", "3", "4"], Some(0)),
                line("Câu 2. Tính"),
                p(&[red_run("ĐS: 4")]),
            ]
            .concat(),
        );
        let report = validate_blocks(&body);
        assert_eq!(report.questions, 2);
        assert!(report.is_ok(), "{:?}", report);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_option_and_mark() {
        let body = blocks(&[line("Câu 3. a"), line("A. 1"), line("B. 2"), line("D. 4")].concat());
        let report = validate_blocks(&body);
        assert_eq!(
            report.errors,
            vec![
                Issue {
                    question: "Câu 3".to_string(),
                    kind: IssueKind::MissingOptions { letters: vec!['C'] },
                },
                Issue {
                    question: "Câu 3".to_string(),
                    kind: IssueKind::UnmarkedAnswer,
                },
            ]
        );
        assert_eq!(report.errors[0].to_string(), "Câu 3: thiếu phương án C");
    }

    #[test]
    fn test_unmarked_short_answer() {
        let body = blocks(&[line("Câu 5. Tính"), line("ĐS: 4")].concat());
        let report = validate_blocks(&body);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, IssueKind::UnmarkedShortAnswer);
    }

    #[test]
    fn test_floating_image_warning() {
        let anchored = r#"<w:p><w:r><w:drawing><wp:anchor><wp:extent cx="1" cy="1"/></wp:anchor></w:drawing></w:r></w:p>"#;
        let body = blocks(&[line("Câu 1. Xem hình"), anchored.to_string()].concat());
        let report = validate_blocks(&body);
        assert!(report.is_ok());
        assert_eq!(report.warnings[0].kind, IssueKind::FloatingImage { count: 1 });
    }

    #[test]
    fn test_report_serializes() {
        let body = blocks(&[line("Câu 5. Tính"), line("ĐS: 4")].concat());
        let json = serde_json::to_value(validate_blocks(&body)).unwrap();
        assert_eq!(json["errors"][0]["kind"], "unmarked_short_answer");
        assert_eq!(json["errors"][0]["question"], "Câu 5");
    }
}
