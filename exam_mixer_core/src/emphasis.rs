//! Correct-answer detection from run formatting
//!
//! Authors mark the right answer visually: red (or any non-default) text,
//! an underline, a highlight or a shaded background. A run counts as marked
//! when it carries visible text and any of these properties is set to a
//! non-default value.

use crate::ooxml::xml::XmlElement;
use crate::ooxml::{Block, RunFormat, W_NS};
use crate::text::element_text;

/// Colour values that mean "not coloured"
const UNMARKED_COLORS: [&str; 2] = ["auto", "000000"];
/// Shading fills that mean "no background"
const UNMARKED_FILLS: [&str; 2] = ["auto", "FFFFFF"];
const NONE: &str = "none";

impl RunFormat {
    /// Whether this formatting marks a correct answer
    pub fn is_emphasized(&self) -> bool {
        let colored = self
            .color
            .as_deref()
            .is_some_and(|c| !UNMARKED_COLORS.iter().any(|u| u.eq_ignore_ascii_case(c)));
        let underlined = self.underline.as_deref().is_some_and(|u| u != NONE);
        let highlighted = self.highlight.as_deref().is_some_and(|h| h != NONE);
        let shaded = self
            .shading
            .as_deref()
            .is_some_and(|f| !UNMARKED_FILLS.iter().any(|u| u.eq_ignore_ascii_case(f)));

        colored || underlined || highlighted || shaded
    }
}

/// Whether a single `w:r` is marked.
///
/// Runs without visible text (tabs, empty runs, whitespace) never count.
pub fn is_run_marked(run: &XmlElement) -> bool {
    if element_text(run).trim().is_empty() {
        return false;
    }
    RunFormat::from_run(run).is_emphasized()
}

/// Whether any run of the block is marked; stops at the first hit
pub fn is_marked(block: &Block) -> bool {
    element_marked(block.element())
}

/// Same as [`is_marked`] for any subtree
pub fn element_marked(element: &XmlElement) -> bool {
    if element.is(W_NS, "r") {
        return is_run_marked(element);
    }
    element
        .descendants(W_NS, "r")
        .into_iter()
        .any(is_run_marked)
}

/// Byte ranges (within the block's untrimmed text) covered by marked runs
pub fn marked_ranges(element: &XmlElement) -> Vec<std::ops::Range<usize>> {
    let mut ranges: Vec<std::ops::Range<usize>> = Vec::new();
    let mut offset = 0;
    for fragment in crate::text::text_fragments(element) {
        let start = offset;
        offset += fragment.text.len();
        let marked = fragment
            .run_path
            .as_deref()
            .and_then(|path| element.element_at(path))
            .is_some_and(|run| !fragment.text.trim().is_empty() && RunFormat::from_run(run).is_emphasized());
        if !marked {
            continue;
        }
        match ranges.last_mut() {
            Some(last) if last.end == start => last.end = offset,
            _ => ranges.push(start..offset),
        }
    }
    ranges
}
