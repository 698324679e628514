//! Shuffle engine
//!
//! Questions are permuted as whole groups inside their part; options are
//! permuted inside their question. Stem blocks keep their slots and option
//! slots are refilled in permuted order, so a picture placed between `B.`
//! and `C.` stays between the second and third option.
//!
//! Correct answers are read before any label is rewritten.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::answer_key::AnswerCell;
use crate::config::{ShortAnswerPolicy, TrueFalseMode};
use crate::emphasis::{is_marked, marked_ranges};
use crate::label::{relabel_as, LabelKind, RelabelStyle};
use crate::ooxml::{Block, W_NS};
use crate::pattern::{inline_option_count, ANSWER_MARKER};
use crate::segment::{option_slots, Part, PartKind};
use crate::text::{element_text, set_fragment_text, text_fragments};

const MCQ_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];
const MCQ_OVERFLOW: char = 'Z';
const TF_LETTERS: [char; 4] = ['a', 'b', 'c', 'd'];
const TF_OVERFLOW: char = 'z';

/// Per-statement symbols of a composite true/false answer
const TRUE_SYMBOL: &str = "Đ";
const FALSE_SYMBOL: &str = "S";
const COMPOSITE_SEPARATOR: &str = "-";

/// Knobs that change how questions are processed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShuffleOptions {
    pub true_false: TrueFalseMode,
    pub short_answer: ShortAnswerPolicy,
    pub style: RelabelStyle,
}

/// A processed question
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionOutcome {
    pub blocks: Vec<Block>,
    pub answer: AnswerCell,
}

/// A processed part
#[derive(Debug, Clone, PartialEq)]
pub struct PartOutcome {
    pub blocks: Vec<Block>,
    /// `(final question number, answer)` in output order
    pub answers: Vec<(u32, AnswerCell)>,
    /// Number to give the first question of the next part
    pub next_number: u32,
}

fn letter(letters: &[char], overflow: char, index: usize) -> char {
    letters.get(index).copied().unwrap_or(overflow)
}

/// Shuffle and renumber one part. Questions are numbered from
/// `first_number` on.
pub fn shuffle_part<R: Rng + ?Sized>(
    part: Part,
    first_number: u32,
    options: &ShuffleOptions,
    rng: &mut R,
) -> PartOutcome {
    let Part {
        kind,
        number,
        intro,
        mut questions,
        trailing,
    } = part;

    if kind != PartKind::Untouched {
        questions.shuffle(rng);
    }

    let mut blocks = intro;
    let mut answers = Vec::with_capacity(questions.len());
    let mut next_number = first_number;

    for question in questions {
        let mut outcome = match kind {
            PartKind::MultipleChoice => shuffle_mcq_question(question, &options.style, rng),
            PartKind::TrueFalse => {
                shuffle_true_false_question(question, options.true_false, &options.style, rng)
            }
            PartKind::ShortAnswer => short_answer_question(question, options.short_answer),
            PartKind::Untouched => QuestionOutcome {
                blocks: question,
                answer: AnswerCell::Unscored,
            },
        };

        if let Some(first) = outcome.blocks.first_mut() {
            let label = format!("Câu {}", next_number);
            relabel_as(first, LabelKind::Question, &label, &options.style);
        }
        if outcome.answer.is_missing() {
            log::warn!("no marked answer for question {} (part {:?})", next_number, number);
        }

        answers.push((next_number, outcome.answer));
        blocks.extend(outcome.blocks);
        next_number += 1;
    }

    blocks.extend(trailing);
    PartOutcome {
        blocks,
        answers,
        next_number,
    }
}

/// Move the blocks at `slots` so that slot `k` receives the block that was
/// in slot `order[k]`.
fn permute_slots(blocks: Vec<Block>, slots: &[usize], order: &[usize]) -> Vec<Block> {
    let mut taken: Vec<Option<Block>> = blocks.into_iter().map(Some).collect();
    let moved: Vec<Option<Block>> = order.iter().map(|&from| taken[slots[from]].take()).collect();
    for (&slot, block) in slots.iter().zip(moved) {
        taken[slot] = block;
    }
    taken.into_iter().flatten().collect()
}

/// Shuffle the options of a multiple-choice question
pub fn shuffle_mcq_question<R: Rng + ?Sized>(
    blocks: Vec<Block>,
    style: &RelabelStyle,
    rng: &mut R,
) -> QuestionOutcome {
    let count = option_slots(&blocks, PartKind::MultipleChoice).len();
    let mut order: Vec<usize> = (0..count).collect();
    order.shuffle(rng);
    apply_mcq_order(blocks, &order, style)
}

/// Reorder the options of a multiple-choice question by `order` (a
/// permutation of the option indices) and relabel them.
///
/// With fewer than two options, or with several options sharing one
/// block (`A. 1    B. 2`), the question is returned unchanged.
pub fn apply_mcq_order(blocks: Vec<Block>, order: &[usize], style: &RelabelStyle) -> QuestionOutcome {
    let slots = option_slots(&blocks, PartKind::MultipleChoice);
    if slots.len() < 2 || order.len() != slots.len() {
        log::warn!("question with {} option(s) left unshuffled", slots.len());
        return QuestionOutcome {
            blocks,
            answer: AnswerCell::Missing,
        };
    }

    if slots.iter().any(|&slot| inline_option_count(&blocks[slot].text()) > 1) {
        log::warn!("options written on a shared line, question left unshuffled");
        return QuestionOutcome {
            blocks,
            answer: AnswerCell::Missing,
        };
    }

    // First marked option in document order wins
    let marked: Vec<usize> = (0..slots.len()).filter(|&i| is_marked(&blocks[slots[i]])).collect();
    if marked.len() > 1 {
        log::warn!("{} options marked, keeping the first", marked.len());
    }
    let correct = marked.first().copied();
    let mut blocks = permute_slots(blocks, &slots, order);

    for (position, &slot) in slots.iter().enumerate() {
        let label = letter(&MCQ_LETTERS, MCQ_OVERFLOW, position).to_string();
        relabel_as(&mut blocks[slot], LabelKind::McqOption, &label, style);
    }

    let answer = correct
        .and_then(|original| order.iter().position(|&from| from == original))
        .map(|position| AnswerCell::Value(letter(&MCQ_LETTERS, MCQ_OVERFLOW, position).to_string()))
        .unwrap_or(AnswerCell::Missing);

    QuestionOutcome { blocks, answer }
}

/// Shuffle the statements of a true/false question
pub fn shuffle_true_false_question<R: Rng + ?Sized>(
    blocks: Vec<Block>,
    mode: TrueFalseMode,
    style: &RelabelStyle,
    rng: &mut R,
) -> QuestionOutcome {
    let count = option_slots(&blocks, PartKind::TrueFalse).len();
    let mut order: Vec<usize> = (0..count).collect();
    match mode {
        TrueFalseMode::ShuffleAll => order.shuffle(rng),
        TrueFalseMode::PinLast => {
            let free = count.saturating_sub(1);
            order[..free].shuffle(rng);
        }
    }
    apply_true_false_order(blocks, &order, mode, style)
}

/// Reorder the statements of a true/false question by `order`
pub fn apply_true_false_order(
    blocks: Vec<Block>,
    order: &[usize],
    mode: TrueFalseMode,
    style: &RelabelStyle,
) -> QuestionOutcome {
    let slots = option_slots(&blocks, PartKind::TrueFalse);
    if slots.len() < 2 || order.len() != slots.len() {
        log::warn!("true/false question with {} statement(s) left unshuffled", slots.len());
        return QuestionOutcome {
            blocks,
            answer: AnswerCell::Missing,
        };
    }

    let marks: Vec<bool> = slots.iter().map(|&slot| is_marked(&blocks[slot])).collect();
    let mut blocks = permute_slots(blocks, &slots, order);

    for (position, &slot) in slots.iter().enumerate() {
        let label = letter(&TF_LETTERS, TF_OVERFLOW, position).to_string();
        relabel_as(&mut blocks[slot], LabelKind::TrueFalseOption, &label, style);
    }

    let answer = match mode {
        TrueFalseMode::PinLast => AnswerCell::Unscored,
        // All-false cannot be told apart from "author forgot to mark"
        TrueFalseMode::ShuffleAll if !marks.contains(&true) => AnswerCell::Missing,
        TrueFalseMode::ShuffleAll => AnswerCell::Value(
            order
                .iter()
                .map(|&from| if marks[from] { TRUE_SYMBOL } else { FALSE_SYMBOL })
                .collect::<Vec<_>>()
                .join(COMPOSITE_SEPARATOR),
        ),
    };

    QuestionOutcome { blocks, answer }
}

/// A short answer found in a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortAnswer {
    /// Index of the block holding the marker
    pub block: usize,
    /// Byte offset of the marker in the block's untrimmed text
    pub marker_start: usize,
    pub value: String,
}

/// Find the first marked `ĐS: <value>` in a question.
///
/// The marker or the value must be (at least partly) in a marked run.
pub fn extract_short_answer(blocks: &[Block]) -> Option<ShortAnswer> {
    blocks.iter().enumerate().find_map(|(index, block)| {
        let text = element_text(block.element());
        let marker = ANSWER_MARKER.find(&text)?;
        let value = text[marker.end()..].trim();
        if value.is_empty() {
            return None;
        }
        let span = marker.start()..text.len();
        let marked = marked_ranges(block.element())
            .iter()
            .any(|range| range.start < span.end && span.start < range.end);
        if !marked {
            log::debug!("answer marker in block {} is not marked", index);
            return None;
        }
        Some(ShortAnswer {
            block: index,
            marker_start: marker.start(),
            value: value.to_string(),
        })
    })
}

/// Cut the text of `block` from byte `offset` (of its untrimmed text) on
fn truncate_text(block: &mut Block, offset: usize) {
    let element = block.element_mut();
    let mut start = 0;
    for fragment in text_fragments(element) {
        let end = start + fragment.text.len();
        if end > offset {
            let keep = &fragment.text[..offset.saturating_sub(start)];
            if let Some(t) = element.element_at_mut(&fragment.path) {
                set_fragment_text(t, keep);
            }
        }
        start = end;
    }
}

fn short_answer_question(mut blocks: Vec<Block>, policy: ShortAnswerPolicy) -> QuestionOutcome {
    let Some(found) = extract_short_answer(&blocks) else {
        return QuestionOutcome {
            blocks,
            answer: AnswerCell::Missing,
        };
    };

    if policy == ShortAnswerPolicy::StripMarker {
        let block = &mut blocks[found.block];
        truncate_text(block, found.marker_start);
        let emptied = block.text().is_empty()
            && !block.element().contains(W_NS, "drawing")
            && block.leading().is_empty();
        if emptied && found.block > 0 {
            blocks.remove(found.block);
        }
    }

    QuestionOutcome {
        blocks,
        answer: AnswerCell::Value(found.value),
    }
}
