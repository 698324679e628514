//! Textual conventions of Vietnamese exam documents
//!
//! Classification is a single prefix match on the trimmed block text, tried
//! in this order:
//!
//! 1. part heading (`PHẦN 2`, `II. PHẦN 2`): always closes the current
//!    question group
//! 2. question (`Câu 7`, `Câu 7.`, `Câu 7:`)
//! 3. option, `A.`..`D.` / `A)`..`D)` in multiple-choice parts and
//!    `a)`..`d)` in true/false parts
//!
//! Anything else is stem text. Vietnamese letters are accepted both in
//! precomposed and in decomposed form, since some editors write `â` as
//! `a` followed by a combining circumflex.

use once_cell::sync::Lazy;
use regex::Regex;

/// `PHẦN <n>` at the start of a block, optionally after an outline number
/// such as `I.`, `II -` or `2)`; captures `n`. Option letters `A`..`D` are
/// not accepted as outline numbers.
pub static PART_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:(?:[IVX]+|\d+)\s*[.):-]\s*)?PH(?:Ầ|A\x{302}\x{300})N\s*(\d+)\b")
        .expect("part heading pattern is valid")
});

/// `Câu <n>` at the start of a block; captures `n`
pub static QUESTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*C(?:â|a\x{302})u\s*(\d+)").expect("question pattern is valid")
});

/// Multiple-choice option block
pub static MCQ_OPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[A-D][.)]").expect("mcq option pattern is valid"));

/// True/false statement block
pub static TF_OPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[a-d]\)").expect("true/false option pattern is valid"));

/// Any `A.`..`D.` label inside a text; captures the letter
pub static OPTION_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-D])[.)]").expect("option letter pattern is valid"));

/// An option label followed by its text, anywhere in a block
pub static INLINE_OPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)[A-D][.)]\s+\S").expect("inline option pattern is valid"));

/// Question label grammar: leading space, label, optional punctuation
pub static QUESTION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\s*)(C(?:â|a\x{302})u\s*\d+)([.:])?").expect("question label pattern is valid")
});

/// Multiple-choice label grammar
pub static MCQ_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)([A-D])([.)])?").expect("mcq label pattern is valid"));

/// True/false label grammar
pub static TF_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)([a-d])(\))?").expect("true/false label pattern is valid"));

/// Short-answer result marker (`ĐS:`, `Đáp số:`) with its separator.
///
/// The marker must start a word and be followed by `:`, `.` or `=`, so a
/// stem mentioning "đáp số" in passing is not an answer line.
pub static ANSWER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:Đ(?:á|a\x{301})p\s*s(?:ố|ô\x{301}|o\x{302}\x{301})|ĐS)\s*[:.=]\s*")
        .expect("answer marker pattern is valid")
});

/// Number of the part heading that starts `text`, if any
pub fn part_number(text: &str) -> Option<u32> {
    PART_HEADING
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Whether `text` starts with any `PHẦN <n>` heading
pub fn is_part_heading(text: &str) -> bool {
    PART_HEADING.is_match(text)
}

/// Number of options written in `text`, e.g. 2 for `A. 1    B. 2`
pub fn inline_option_count(text: &str) -> usize {
    INLINE_OPTION.find_iter(text).count()
}

/// Whether `text` starts a question
pub fn is_question_start(text: &str) -> bool {
    QUESTION.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_heading() {
        assert_eq!(part_number("PHẦN 1. TRẮC NGHIỆM"), Some(1));
        assert_eq!(part_number("  Phần 3: Trả lời ngắn"), Some(3));
        assert_eq!(part_number("PHA\u{302}\u{300}N 2"), Some(2));
        assert_eq!(part_number("PHẦN 12"), Some(12));
        assert_eq!(part_number("Xem PHẦN 1"), None);
        assert_eq!(part_number("I. PHẦN 1: TRẮC NGHIỆM"), Some(1));
        assert_eq!(part_number("II - Phần 2. Đúng sai"), Some(2));
        assert_eq!(part_number("3) PHẦN 3"), Some(3));
        assert_eq!(part_number("A. Phần 2 của đoạn thẳng"), None);
        assert_eq!(part_number("Câu 1. PHẦN 2"), None);
        assert!(!is_part_heading("PHẦN1a"));
    }

    #[test]
    fn test_question_start() {
        assert!(is_question_start("Câu 1. Hỏi"));
        assert!(is_question_start("câu12: Hỏi"));
        assert!(is_question_start("Ca\u{302}u 3"));
        assert!(!is_question_start("Câu hỏi 1"));
        assert!(!is_question_start("Trong Câu 1"));
    }

    #[test]
    fn test_option_grammars() {
        assert!(MCQ_OPTION.is_match("A. 1"));
        assert!(MCQ_OPTION.is_match(" D) 4"));
        assert!(!MCQ_OPTION.is_match("a. 1"));
        assert!(!MCQ_OPTION.is_match("An toàn"));
        assert!(TF_OPTION.is_match("b) Đúng"));
        assert!(!TF_OPTION.is_match("b. Đúng"));
        assert!(!TF_OPTION.is_match("e) x"));
    }

    #[test]
    fn test_inline_option_count() {
        assert_eq!(inline_option_count("A. 1"), 1);
        assert_eq!(inline_option_count("A. 1    B. 2"), 2);
        assert_eq!(inline_option_count("A. 3\tB. 4\tC. 5\tD. 6"), 4);
        assert_eq!(inline_option_count("A. Trung điểm của đoạn AB."), 1);
        assert_eq!(inline_option_count("A. Điểm B."), 1);
    }

    #[test]
    fn test_answer_marker_variants() {
        for text in ["ĐS: 5", "đs. 5", "Đáp số = 5", "x = 2; ĐS:5", "Đa\u{301}p so\u{302}\u{301}: 5"] {
            let m = ANSWER_MARKER.find(text).unwrap();
            assert_eq!(&text[m.end()..], "5", "{}", text);
        }
    }

    #[test]
    fn test_answer_marker_needs_separator() {
        for text in [
            "Chọn đáp án đúng: 5",
            "Đáp số 5",
            "ĐS 5",
            "Tính đáp số của bài",
            "MĐS: 5",
        ] {
            assert!(!ANSWER_MARKER.is_match(text), "{}", text);
        }
    }
}
