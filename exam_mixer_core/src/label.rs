//! Label rewriting
//!
//! Word processors freely split text into runs and `w:t` nodes, so a label
//! such as `A.` may arrive as `A` in one run and `.` in the next. Matching is
//! therefore done on the concatenated fragment text and the match is mapped
//! back onto the fragments: the fragment holding the first label character
//! receives the new label, and whatever the match consumed from later
//! fragments is cut out of them.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ooxml::xml::{XmlElement, XmlNode};
use crate::ooxml::{Block, W_NS};
use crate::pattern::{MCQ_LABEL, QUESTION_LABEL, TF_LABEL};
use crate::text::{set_fragment_text, text_fragments, TextFragment};

/// Which label grammar a block carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelKind {
    /// `Câu 7.`
    Question,
    /// `C.`
    McqOption,
    /// `c)`
    TrueFalseOption,
}

impl LabelKind {
    fn grammar(self) -> &'static Regex {
        match self {
            LabelKind::Question => &*QUESTION_LABEL,
            LabelKind::McqOption => &*MCQ_LABEL,
            LabelKind::TrueFalseOption => &*TF_LABEL,
        }
    }

    /// Separator used when the source label has none
    pub fn default_punctuation(self) -> &'static str {
        match self {
            LabelKind::Question | LabelKind::McqOption => ".",
            LabelKind::TrueFalseOption => ")",
        }
    }

    /// Grammar of a replacement label such as `"Câu 7."`, `"C."` or `"c)"`
    pub fn infer(label: &str) -> Option<LabelKind> {
        let trimmed = label.trim_start();
        if QUESTION_LABEL.is_match(trimmed) {
            return Some(LabelKind::Question);
        }
        match trimmed.chars().next()? {
            c if c.is_ascii_uppercase() => Some(LabelKind::McqOption),
            c if c.is_ascii_lowercase() => Some(LabelKind::TrueFalseOption),
            _ => None,
        }
    }
}

/// Visual mark applied to rewritten labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelabelStyle {
    pub enabled: bool,
    /// Hex RGB colour, `RRGGBB`
    pub color: String,
    pub bold: bool,
}

impl Default for RelabelStyle {
    fn default() -> Self {
        RelabelStyle {
            enabled: true,
            color: "0000FF".to_string(),
            bold: true,
        }
    }
}

impl RelabelStyle {
    /// Leave rewritten labels formatted like the text they replace
    pub fn plain() -> Self {
        RelabelStyle {
            enabled: false,
            ..RelabelStyle::default()
        }
    }
}

/// A label found at the start of a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatch {
    /// Byte range of the label (leading whitespace excluded) in the
    /// concatenated fragment text
    pub start: usize,
    pub end: usize,
    /// Trailing `.`, `:` or `)` as written by the author
    pub punctuation: Option<String>,
}

/// Locate the label of `kind` at the start of `element`
pub fn find_label(element: &XmlElement, kind: LabelKind) -> Option<LabelMatch> {
    let text: String = text_fragments(element).into_iter().map(|f| f.text).collect();
    let caps = kind.grammar().captures(&text)?;
    let core = caps.get(2)?;
    Some(LabelMatch {
        start: core.start(),
        end: caps.get(0)?.end(),
        punctuation: caps.get(3).map(|m| m.as_str().to_string()),
    })
}

/// Replace the label at the start of `block` with `new_label`, verbatim.
///
/// The grammar to look for is inferred from `new_label`. Returns `false`
/// (and leaves the block untouched) when the block has no such label.
pub fn relabel(block: &mut Block, new_label: &str) -> bool {
    relabel_with(block, new_label, &RelabelStyle::default())
}

/// [`relabel`] with an explicit style
pub fn relabel_with(block: &mut Block, new_label: &str, style: &RelabelStyle) -> bool {
    let Some(kind) = LabelKind::infer(new_label) else {
        log::debug!("no label grammar for replacement {:?}", new_label);
        return false;
    };
    rewrite(block.element_mut(), kind, style, |_| new_label.to_string())
}

/// Renumber a block keeping the author's separator.
///
/// `ordinal` is the label without punctuation (`"Câu 7"`, `"C"`, `"c"`); the
/// separator of the old label is appended, or the kind's default if the
/// old label had none.
pub fn relabel_as(block: &mut Block, kind: LabelKind, ordinal: &str, style: &RelabelStyle) -> bool {
    rewrite(block.element_mut(), kind, style, |punctuation| {
        format!(
            "{}{}",
            ordinal,
            punctuation.unwrap_or(kind.default_punctuation())
        )
    })
}

fn rewrite<F>(element: &mut XmlElement, kind: LabelKind, style: &RelabelStyle, make_label: F) -> bool
where
    F: FnOnce(Option<&str>) -> String,
{
    let Some(found) = find_label(element, kind) else {
        log::debug!("label miss for {:?}", kind);
        return false;
    };
    let label = make_label(found.punctuation.as_deref());
    let fragments = text_fragments(element);

    let mut offset = 0;
    let mut anchor: Option<(TextFragment, String, String)> = None;
    for fragment in fragments {
        let start = offset;
        let end = offset + fragment.text.len();
        offset = end;
        if end <= found.start || start >= found.end {
            continue;
        }
        let keep_before = &fragment.text[..found.start.saturating_sub(start)];
        let keep_after = &fragment.text[found.end.min(end) - start..];
        if anchor.is_none() {
            anchor = Some((fragment.clone(), keep_before.to_string(), keep_after.to_string()));
        } else if let Some(t) = element.element_at_mut(&fragment.path) {
            set_fragment_text(t, &format!("{}{}", keep_before, keep_after));
        }
    }

    let Some((fragment, before, after)) = anchor else {
        return false;
    };

    match fragment.run_path.as_deref() {
        Some(run_path) if style.enabled => {
            let local = &fragment.path[run_path.len()..];
            split_run(element, run_path, local, &before, &label, &after, style)
        }
        _ => {
            if let Some(t) = element.element_at_mut(&fragment.path) {
                set_fragment_text(t, &format!("{}{}{}", before, label, after));
            }
        }
    }
    true
}

/// Split the run at `run_path` around its `w:t` at `t_path` so that the
/// label gets a run of its own, then style that run.
fn split_run(
    element: &mut XmlElement,
    run_path: &[usize],
    t_path: &[usize],
    before: &str,
    label: &str,
    after: &str,
    style: &RelabelStyle,
) {
    let Some((&run_index, parent_path)) = run_path.split_last() else {
        return;
    };
    let Some(parent) = element.element_at_mut(parent_path) else {
        return;
    };
    let Some(XmlNode::Element(run)) = parent.children.get(run_index).cloned() else {
        return;
    };

    // Only the top-level `w:t` of the run can be split cleanly; anything
    // nested (e.g. inside `mc:AlternateContent`) is relabelled in place.
    let [t_index] = t_path else {
        if let Some(t) = parent
            .children
            .get_mut(run_index)
            .and_then(XmlNode::as_element_mut)
            .and_then(|run| run.element_at_mut(t_path))
        {
            set_fragment_text(t, &format!("{}{}{}", before, label, after));
        }
        return;
    };
    let Some(t) = run.children.get(*t_index).and_then(XmlNode::as_element) else {
        return;
    };

    let properties = run.child(W_NS, "rPr").cloned();
    let with_text = |text: &str| {
        let mut t = t.clone();
        set_fragment_text(&mut t, text);
        t
    };
    let fresh_run = || {
        let mut r = run.new_like("r");
        r.self_closing = false;
        r.attributes = run.attributes.clone();
        if let Some(rpr) = &properties {
            r.push_element(rpr.clone());
        }
        r
    };
    let content = |node: &&XmlNode| !matches!(node, XmlNode::Element(el) if el.is(W_NS, "rPr"));

    let mut head = fresh_run();
    head.children
        .extend(run.children[..*t_index].iter().filter(content).cloned());
    if !before.is_empty() {
        head.push_element(with_text(before));
    }

    let mut middle = fresh_run();
    middle.push_element(with_text(label));
    apply_style(&mut middle, style);

    let mut tail = fresh_run();
    if !after.is_empty() {
        tail.push_element(with_text(after));
    }
    tail.children
        .extend(run.children[*t_index + 1..].iter().filter(content).cloned());

    let has_content = |r: &XmlElement| r.child_elements().any(|el| !el.is(W_NS, "rPr"));
    let mut replacement = Vec::with_capacity(3);
    if has_content(&head) {
        replacement.push(XmlNode::Element(head));
    }
    replacement.push(XmlNode::Element(middle));
    if has_content(&tail) {
        replacement.push(XmlNode::Element(tail));
    }
    parent.children.splice(run_index..=run_index, replacement);
}

/// `w:rPr` children in schema order; Word rejects out-of-order properties
const RPR_ORDER: [&str; 39] = [
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect",
    "bdr", "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout",
    "specVanish", "oMath",
];

fn rpr_rank(element: &XmlElement) -> usize {
    RPR_ORDER
        .iter()
        .position(|name| *name == element.local_name())
        .unwrap_or(RPR_ORDER.len())
}

/// Get or create the `w:rPr/w:{local}` child of a run
fn property_mut<'a>(run: &'a mut XmlElement, local: &str) -> Option<&'a mut XmlElement> {
    if run.child(W_NS, "rPr").is_none() {
        let mut rpr = run.new_like("rPr");
        rpr.self_closing = false;
        run.children.insert(0, XmlNode::Element(rpr));
    }
    let rpr = run.child_mut(W_NS, "rPr")?;
    if rpr.child(W_NS, local).is_none() {
        let property = rpr.new_like(local);
        let rank = rpr_rank(&property);
        let position = rpr
            .children
            .iter()
            .position(|node| node.as_element().is_some_and(|el| rpr_rank(el) > rank))
            .unwrap_or(rpr.children.len());
        rpr.children.insert(position, XmlNode::Element(property));
        rpr.self_closing = false;
    }
    rpr.child_mut(W_NS, local)
}

/// Apply the relabel mark to a run
pub fn apply_style(run: &mut XmlElement, style: &RelabelStyle) {
    if !style.enabled {
        return;
    }
    if let Some(color) = property_mut(run, "color") {
        color.set_attr("val", &style.color);
        for theme in ["themeColor", "themeShade", "themeTint"] {
            color.remove_attr(theme);
        }
    }
    if style.bold {
        if let Some(b) = property_mut(run, "b") {
            b.remove_attr("val");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{block, p, red_run, run, run_with};
    use crate::text::extract_text;

    fn plain(b: &mut Block, label: &str) -> bool {
        relabel_with(b, label, &RelabelStyle::plain())
    }

    #[test]
    fn test_infer_kind() {
        assert_eq!(LabelKind::infer("Câu 7."), Some(LabelKind::Question));
        assert_eq!(LabelKind::infer("C."), Some(LabelKind::McqOption));
        assert_eq!(LabelKind::infer("c)"), Some(LabelKind::TrueFalseOption));
        assert_eq!(LabelKind::infer("7"), None);
    }

    #[test]
    fn test_question_label_in_one_fragment() {
        let mut b = block(&p(&[run("Câu 12. Tính tổng")]));
        assert!(plain(&mut b, "Câu 3."));
        assert_eq!(extract_text(&b), "Câu 3. Tính tổng");
    }

    #[test]
    fn test_label_split_across_runs() {
        let mut b = block(&p(&[run("B"), run("."), run(" 42")]));
        assert!(plain(&mut b, "D."));
        assert_eq!(extract_text(&b), "D. 42");
        assert_eq!(b.element().descendants(W_NS, "t")[1].text(), "");
    }

    #[test]
    fn test_question_number_split_across_fragments() {
        let mut b = block(&p(&[run("Câ"), run("u 1"), run("0: Hỏi")]));
        assert!(plain(&mut b, "Câu 4:"));
        assert_eq!(extract_text(&b), "Câu 4: Hỏi");
    }

    #[test]
    fn test_two_text_nodes_in_one_run() {
        let mut b = block(r#"<w:p><w:r><w:t>A</w:t><w:t>) x</w:t></w:r></w:p>"#);
        assert!(plain(&mut b, "B)"));
        assert_eq!(extract_text(&b), "B) x");
    }

    #[test]
    fn test_miss_leaves_block_untouched() {
        let mut b = block(&p(&[run("Hình vẽ bên")]));
        let before = b.clone();
        assert!(!relabel(&mut b, "Câu 1."));
        assert_eq!(b, before);
    }

    #[test]
    fn test_only_first_label_rewritten() {
        let mut b = block(&p(&[run("a) đúng; b) sai")]));
        assert!(plain(&mut b, "c)"));
        assert_eq!(extract_text(&b), "c) đúng; b) sai");
    }

    #[test]
    fn test_leading_whitespace_preserved() {
        let mut b = block(&p(&[run("  C. x")]));
        assert!(plain(&mut b, "A."));
        assert_eq!(b.element().descendants(W_NS, "t")[0].text(), "  A. x");
    }

    #[test]
    fn test_relabel_as_keeps_author_separator() {
        let mut q = block(&p(&[run("Câu 3: Hỏi")]));
        assert!(relabel_as(&mut q, LabelKind::Question, "Câu 8", &RelabelStyle::plain()));
        assert_eq!(extract_text(&q), "Câu 8: Hỏi");

        let mut o = block(&p(&[run("B) 2")]));
        assert!(relabel_as(&mut o, LabelKind::McqOption, "D", &RelabelStyle::plain()));
        assert_eq!(extract_text(&o), "D) 2");

        let mut bare = block(&p(&[run("Câu 3 Hỏi")]));
        assert!(relabel_as(&mut bare, LabelKind::Question, "Câu 1", &RelabelStyle::plain()));
        assert_eq!(extract_text(&bare), "Câu 1. Hỏi");
    }

    #[test]
    fn test_restyle_splits_run() {
        let mut b = block(&p(&[run_with("<w:i/>", "A. text")]));
        assert!(relabel(&mut b, "C."));

        let runs = b.element().descendants(W_NS, "r");
        assert_eq!(runs.len(), 2);
        assert_eq!(crate::text::element_text(runs[0]), "C.");
        assert_eq!(crate::text::element_text(runs[1]), " text");

        let label_rpr = runs[0].child(W_NS, "rPr").unwrap();
        let order: Vec<&str> = label_rpr.child_elements().map(|el| el.local_name()).collect();
        assert_eq!(order, vec!["b", "i", "color"]);
        assert_eq!(label_rpr.child(W_NS, "color").unwrap().attr("val").as_deref(), Some("0000FF"));

        let rest_rpr = runs[1].child(W_NS, "rPr").unwrap();
        assert!(rest_rpr.child(W_NS, "color").is_none());
        assert!(runs[1].descendants(W_NS, "t")[0].attr("space").is_some());
    }

    #[test]
    fn test_restyle_replaces_theme_color() {
        let mut b = block(&p(&[run_with(
            r#"<w:b w:val="0"/><w:color w:val="FF0000" w:themeColor="accent2"/>"#,
            "D.",
        )]));
        assert!(relabel(&mut b, "A."));
        let runs = b.element().descendants(W_NS, "r");
        assert_eq!(runs.len(), 1);
        let rpr = runs[0].child(W_NS, "rPr").unwrap();
        let color = rpr.child(W_NS, "color").unwrap();
        assert_eq!(color.attr("val").as_deref(), Some("0000FF"));
        assert!(color.attr("themeColor").is_none());
        assert!(rpr.child(W_NS, "b").unwrap().attr("val").is_none());
    }

    #[test]
    fn test_marked_option_keeps_its_mark_after_restyle() {
        let mut b = block(&p(&[red_run("B. 2")]));
        assert!(relabel(&mut b, "A."));
        let runs = b.element().descendants(W_NS, "r");
        assert!(crate::emphasis::is_run_marked(runs[1]));
    }
}
