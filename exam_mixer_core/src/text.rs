//! Visible text of blocks
//!
//! Text is read from `w:t` nodes only; tabs, breaks and deleted text are not
//! visible characters for the purpose of classification.

use crate::ooxml::xml::XmlElement;
use crate::ooxml::{Block, W_NS};

/// One `w:t` node of a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    /// Child-index path from the block element to the `w:t`
    pub path: Vec<usize>,
    /// Path to the enclosing `w:r`, if any
    pub run_path: Option<Vec<usize>>,
    pub text: String,
}

/// Every `w:t` below `element`, in document order
pub fn text_fragments(element: &XmlElement) -> Vec<TextFragment> {
    let mut fragments = Vec::new();
    let mut path = Vec::new();
    collect_fragments(element, &mut path, None, &mut fragments);
    fragments
}

fn collect_fragments(
    element: &XmlElement,
    path: &mut Vec<usize>,
    run_path: Option<&[usize]>,
    out: &mut Vec<TextFragment>,
) {
    for (index, child) in element.children.iter().enumerate() {
        let Some(child) = child.as_element() else {
            continue;
        };
        path.push(index);
        if child.is(W_NS, "t") {
            out.push(TextFragment {
                path: path.clone(),
                run_path: run_path.map(<[usize]>::to_vec),
                text: child.text(),
            });
        } else if child.is(W_NS, "r") {
            let own = path.clone();
            collect_fragments(child, path, Some(&own), out);
        } else {
            collect_fragments(child, path, run_path, out);
        }
        path.pop();
    }
}

/// Untrimmed concatenation of all fragments below `element`
pub fn element_text(element: &XmlElement) -> String {
    text_fragments(element)
        .into_iter()
        .map(|fragment| fragment.text)
        .collect()
}

/// Visible text of a block, trimmed at both ends
pub fn extract_text(block: &Block) -> String {
    element_text(block.element()).trim().to_string()
}

/// Overwrite a `w:t` node, keeping edge whitespace visible to Word
pub(crate) fn set_fragment_text(t: &mut XmlElement, text: &str) {
    t.set_text(text);
    let needs_preserve = text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace);
    if needs_preserve && t.attr("space").is_none() {
        t.attributes
            .push(("xml:space".to_string(), "preserve".to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{block, p, run, run_with};

    #[test]
    fn test_extract_text_across_runs() {
        let b = block(&p(&[run("  Câu "), run("1"), run(". Tính  tổng  ")]));
        assert_eq!(extract_text(&b), "Câu 1. Tính  tổng");
    }

    #[test]
    fn test_extract_text_from_table() {
        let b = block(&format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>",
            p(&[run("x")]),
            p(&[run("y")])
        ));
        assert_eq!(extract_text(&b), "xy");
    }

    #[test]
    fn test_deleted_text_and_tabs_are_invisible() {
        let b = block(
            r#"<w:p><w:r><w:tab/><w:t>A.</w:t></w:r><w:del><w:r><w:delText>old</w:delText></w:r></w:del></w:p>"#,
        );
        assert_eq!(extract_text(&b), "A.");
    }

    #[test]
    fn test_fragments_know_their_run() {
        let b = block(&format!(
            "<w:p><w:hyperlink>{}</w:hyperlink>{}</w:p>",
            run_with("<w:b/>", "A"),
            run(".")
        ));
        let fragments = text_fragments(b.element());
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text, "A");
        assert_eq!(fragments[0].run_path, Some(vec![0, 0]));
        assert_eq!(fragments[0].path, vec![0, 0, 1]);
        assert_eq!(fragments[1].run_path, Some(vec![1]));
    }
}
