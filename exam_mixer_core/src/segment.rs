//! Structural segmentation of the body into parts, questions and options

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ShuffleMode;
use crate::label::LabelKind;
use crate::ooxml::Block;
use crate::pattern::{self, MCQ_OPTION, TF_OPTION};

/// Exam semantics of a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartKind {
    /// Four options, one correct
    MultipleChoice,
    /// Statements a)..d), each true or false
    TrueFalse,
    /// Free answer extracted from a marked `ĐS:` line
    ShortAnswer,
    /// Copied as is, only renumbered
    Untouched,
}

impl PartKind {
    /// Kind of the part that starts at heading `PHẦN n`
    pub fn from_heading(n: u32) -> Option<PartKind> {
        match n {
            1 => Some(PartKind::MultipleChoice),
            2 => Some(PartKind::TrueFalse),
            3 => Some(PartKind::ShortAnswer),
            4 => Some(PartKind::Untouched),
            _ => None,
        }
    }

    fn option_pattern(self) -> Option<&'static Regex> {
        match self {
            PartKind::MultipleChoice => Some(&*MCQ_OPTION),
            PartKind::TrueFalse => Some(&*TF_OPTION),
            PartKind::ShortAnswer | PartKind::Untouched => None,
        }
    }

    /// Label grammar of this part's options
    pub fn option_label(self) -> Option<LabelKind> {
        match self {
            PartKind::MultipleChoice => Some(LabelKind::McqOption),
            PartKind::TrueFalse => Some(LabelKind::TrueFalseOption),
            PartKind::ShortAnswer | PartKind::Untouched => None,
        }
    }
}

/// Result of [`split_into_questions`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segments {
    /// Blocks before the first question
    pub intro: Vec<Block>,
    /// One group per `Câu n`, each starting with its label block
    pub questions: Vec<Vec<Block>>,
    /// A heading that closed the last group, and everything after it
    pub trailing: Vec<Block>,
}

/// One exam section
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub kind: PartKind,
    /// Heading number, `None` for an implicit part
    pub number: Option<u32>,
    /// Heading and any instructions before the first question
    pub intro: Vec<Block>,
    pub questions: Vec<Vec<Block>>,
    pub trailing: Vec<Block>,
}

impl Part {
    fn from_segments(kind: PartKind, number: Option<u32>, segments: Segments) -> Self {
        Part {
            kind,
            number,
            intro: segments.intro,
            questions: segments.questions,
            trailing: segments.trailing,
        }
    }
}

/// A body split into parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExamLayout {
    /// Title block, school name, instructions... before the first part
    pub intro: Vec<Block>,
    pub parts: Vec<Part>,
}

impl ExamLayout {
    pub fn question_count(&self) -> usize {
        self.parts.iter().map(|part| part.questions.len()).sum()
    }

    /// Blocks in their current order
    pub fn into_blocks(self) -> Vec<Block> {
        let mut blocks = self.intro;
        for part in self.parts {
            blocks.extend(part.intro);
            blocks.extend(part.questions.into_iter().flatten());
            blocks.extend(part.trailing);
        }
        blocks
    }
}

/// Position of the first `PHẦN n` heading
pub fn find_part_boundary(blocks: &[Block], n: u32) -> Option<usize> {
    blocks
        .iter()
        .position(|block| pattern::part_number(&block.text()) == Some(n))
}

/// Group blocks into questions.
///
/// With `stop_at_heading`, a `PHẦN` heading met after the first question
/// ends the current group; the heading and every later block are returned
/// as trailing material.
pub fn split_into_questions(blocks: Vec<Block>, stop_at_heading: bool) -> Segments {
    let mut segments = Segments::default();
    let mut current: Option<Vec<Block>> = None;
    let mut blocks = blocks.into_iter();

    while let Some(block) = blocks.next() {
        let text = block.text();
        if stop_at_heading && current.is_some() && pattern::is_part_heading(&text) {
            log::debug!("heading {:?} closes the question group", text);
            segments.trailing.push(block);
            segments.trailing.extend(blocks.by_ref());
            break;
        }
        if pattern::is_question_start(&text) {
            if let Some(group) = current.take() {
                segments.questions.push(group);
            }
            current = Some(vec![block]);
        } else if let Some(group) = current.as_mut() {
            group.push(block);
        } else {
            segments.intro.push(block);
        }
    }
    if let Some(group) = current {
        segments.questions.push(group);
    }
    segments
}

/// Indices of the option blocks of a question, in document order.
/// Every other block is stem text.
pub fn option_slots(question: &[Block], kind: PartKind) -> Vec<usize> {
    let Some(pattern) = kind.option_pattern() else {
        return Vec::new();
    };
    question
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, block)| pattern.is_match(&block.text()))
        .map(|(index, _)| index)
        .collect()
}

/// Split the whole body according to `mode`.
///
/// In [`ShuffleMode::Auto`] headings `PHẦN 1`..`PHẦN 4` delimit parts of
/// fixed kinds; a body without any of them is one multiple-choice part.
/// The other modes treat the body as a single part and ignore headings.
pub fn segment_document(blocks: Vec<Block>, mode: ShuffleMode) -> ExamLayout {
    match mode {
        ShuffleMode::McqOnly => single_part(blocks, PartKind::MultipleChoice, false),
        ShuffleMode::TrueFalseOnly => single_part(blocks, PartKind::TrueFalse, false),
        ShuffleMode::Auto => segment_auto(blocks),
    }
}

fn single_part(blocks: Vec<Block>, kind: PartKind, stop_at_heading: bool) -> ExamLayout {
    let segments = split_into_questions(blocks, stop_at_heading);
    ExamLayout {
        intro: Vec::new(),
        parts: vec![Part::from_segments(kind, None, segments)],
    }
}

fn segment_auto(blocks: Vec<Block>) -> ExamLayout {
    let mut boundaries: Vec<(usize, u32)> = (1..=4)
        .filter_map(|n| find_part_boundary(&blocks, n).map(|index| (index, n)))
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup_by_key(|(index, _)| *index);

    if boundaries.is_empty() {
        log::debug!("no part headings, treating the body as one multiple-choice part");
        return single_part(blocks, PartKind::MultipleChoice, true);
    }

    let mut rest = blocks;
    let mut ranges = Vec::with_capacity(boundaries.len());
    for &(index, n) in boundaries.iter().rev() {
        ranges.push((n, rest.split_off(index)));
    }
    ranges.reverse();

    let parts = ranges
        .into_iter()
        .filter_map(|(n, range)| {
            let kind = PartKind::from_heading(n)?;
            log::debug!("PHẦN {} ({:?}): {} blocks", n, kind, range.len());
            Some(Part::from_segments(kind, Some(n), split_into_questions(range, true)))
        })
        .collect();

    ExamLayout { intro: rest, parts }
}
