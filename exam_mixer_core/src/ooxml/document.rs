//! WordprocessingML main document: body blocks in, body blocks out

use super::error::OoxmlError;
use super::types::Block;
use super::xml::{XmlDocument, XmlElement, XmlNode};
use super::W_NS;

/// Parsed main document part.
///
/// The parsed tree is treated as an immutable source: every generated
/// version works on its own `clone()` of it.
#[derive(Debug, Clone, PartialEq)]
pub struct WordDocument {
    xml: XmlDocument,
}

/// Detached content of `w:body`
#[derive(Debug, Clone, PartialEq)]
pub struct BodyContent {
    /// Content blocks in document order
    pub blocks: Vec<Block>,
    /// Comments or CDATA after the last block
    pub trailing: Vec<XmlNode>,
    /// Trailing section properties; never reordered or duplicated
    pub section: Option<XmlElement>,
}

impl WordDocument {
    /// Parse `word/document.xml`
    pub fn parse(xml: &str) -> Result<Self, OoxmlError> {
        let xml = XmlDocument::parse(xml)?;
        let document = WordDocument { xml };
        document.body()?;
        Ok(document)
    }

    fn body(&self) -> Result<&XmlElement, OoxmlError> {
        self.xml
            .root()
            .filter(|root| root.is(W_NS, "document"))
            .and_then(|root| root.child(W_NS, "body"))
            .ok_or_else(|| OoxmlError::InvalidDocument("w:document/w:body not found".to_string()))
    }

    fn body_mut(&mut self) -> Result<&mut XmlElement, OoxmlError> {
        self.xml
            .root_mut()
            .filter(|root| root.is(W_NS, "document"))
            .and_then(|root| root.child_mut(W_NS, "body"))
            .ok_or_else(|| OoxmlError::InvalidDocument("w:document/w:body not found".to_string()))
    }

    /// Root element of the part (`w:document`)
    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.xml.root_mut()
    }

    /// Copy of the body blocks, `w:sectPr` excluded
    pub fn blocks(&self) -> Vec<Block> {
        self.body()
            .map(|body| split_body(body.children.iter().cloned()).blocks)
            .unwrap_or_default()
    }

    /// Detach every body child. Whitespace between blocks is dropped; the
    /// last `w:sectPr` is kept aside.
    pub fn take_body(&mut self) -> Result<BodyContent, OoxmlError> {
        let body = self.body_mut()?;
        Ok(split_body(std::mem::take(&mut body.children)))
    }

    /// Clear the body and append the content in order, section properties
    /// last.
    pub fn rebuild(&mut self, content: BodyContent) -> Result<(), OoxmlError> {
        let BodyContent { blocks, trailing, section } = content;
        let body = self.body_mut()?;
        body.children.clear();
        for block in blocks {
            body.children.extend(block.into_nodes());
        }
        body.children.extend(trailing);
        if let Some(section) = section {
            body.children.push(XmlNode::Element(section));
        }
        body.self_closing = false;
        Ok(())
    }

    /// Serialize the part
    pub fn to_xml(&self) -> String {
        self.xml.to_xml()
    }
}

fn split_body(nodes: impl IntoIterator<Item = XmlNode>) -> BodyContent {
    let mut content = BodyContent {
        blocks: Vec::new(),
        trailing: Vec::new(),
        section: None,
    };
    let mut pending = Vec::new();

    for node in nodes {
        match node {
            XmlNode::Element(el) if el.is(W_NS, "sectPr") => content.section = Some(el),
            XmlNode::Element(el) => content
                .blocks
                .push(Block::with_leading(std::mem::take(&mut pending), el)),
            XmlNode::Text(text) if text.trim().is_empty() => {}
            other => pending.push(other),
        }
    }

    content.trailing = pending;
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{document_xml, p, run};

    #[test]
    fn test_take_body_splits_blocks_and_section() {
        let xml = document_xml(&format!(
            "{}<w:tbl><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>\n<w:sectPr><w:pgSz w:w=\"11906\"/></w:sectPr>",
            p(&[run("Câu 1. Hỏi")]),
            p(&[run("ô")]),
        ));
        let mut doc = WordDocument::parse(&xml).unwrap();
        let body = doc.take_body().unwrap();

        assert_eq!(body.blocks.len(), 2);
        assert_eq!(body.blocks[0].text(), "Câu 1. Hỏi");
        assert_eq!(body.blocks[1].text(), "ô");
        assert!(body.section.is_some());
    }

    #[test]
    fn test_rebuild_keeps_section_last() {
        let xml = document_xml(&format!(
            "{}{}<w:sectPr/>",
            p(&[run("first")]),
            p(&[run("second")]),
        ));
        let mut doc = WordDocument::parse(&xml).unwrap();
        let mut body = doc.take_body().unwrap();
        body.blocks.reverse();
        doc.rebuild(body).unwrap();

        let out = doc.to_xml();
        let second = out.find("second").unwrap();
        let first = out.find("first").unwrap();
        let sect = out.find("<w:sectPr/>").unwrap();
        assert!(second < first && first < sect);
        assert_eq!(out.matches("<w:sectPr").count(), 1);
    }

    #[test]
    fn test_blocks_view_matches_take_body() {
        let xml = document_xml(&format!("{}<w:sectPr/>", p(&[run("only")])));
        let mut doc = WordDocument::parse(&xml).unwrap();
        let view = doc.blocks();
        let taken = doc.take_body().unwrap();
        assert_eq!(view, taken.blocks);
    }

    #[test]
    fn test_comments_travel_with_their_block() {
        let xml = document_xml(&format!(
            "<!-- first -->{}<![CDATA[raw]]>{}<!-- tail --><w:sectPr/>",
            p(&[run("first")]),
            p(&[run("second")]),
        ));
        let mut doc = WordDocument::parse(&xml).unwrap();
        let mut body = doc.take_body().unwrap();
        assert_eq!(body.blocks[0].leading(), &[XmlNode::Raw("<!-- first -->".to_string())]);
        assert_eq!(body.trailing, vec![XmlNode::Raw("<!-- tail -->".to_string())]);

        body.blocks.reverse();
        doc.rebuild(body).unwrap();
        let out = doc.to_xml();
        let cdata = out.find("<![CDATA[raw]]>").unwrap();
        let second = out.find("second").unwrap();
        let comment = out.find("<!-- first -->").unwrap();
        let first = out.find("first</w:t>").unwrap();
        let tail = out.find("<!-- tail -->").unwrap();
        let sect = out.find("<w:sectPr/>").unwrap();
        assert!(cdata < second && second < comment && comment < first);
        assert!(first < tail && tail < sect);
    }

    #[test]
    fn test_missing_body_is_invalid() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#;
        assert!(matches!(
            WordDocument::parse(xml),
            Err(OoxmlError::InvalidDocument(_))
        ));
    }
}
