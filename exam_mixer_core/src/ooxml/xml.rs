//! Owned XML tree for WordprocessingML parts
//!
//! `word/document.xml` is read into a tree of owned nodes so that body blocks
//! can be detached, reordered and re-attached without touching anything else
//! in the markup. Attribute values are kept in their escaped source form and
//! written back verbatim; namespace URIs are resolved once at parse time so
//! lookups do not depend on the prefixes a producer happened to choose.

use quick_xml::escape::{escape, partial_escape, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::error::OoxmlError;

/// A node of the XML tree
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Character data, unescaped
    Text(String),
    /// Markup kept verbatim (comments, CDATA sections)
    Raw(String),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// An element with its resolved namespace
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified name as written in the source (e.g. `w:p`)
    pub name: String,
    /// Namespace URI bound to the element prefix, if any
    pub namespace: Option<String>,
    /// Attributes as `(qualified name, escaped value)`
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// Written as `<x/>` when it has no children
    pub self_closing: bool,
}

impl XmlElement {
    /// Create an empty element in the same namespace and with the same
    /// prefix as `self`.
    pub fn new_like(&self, local: &str) -> XmlElement {
        let name = match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        };
        XmlElement {
            name,
            namespace: self.namespace.clone(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: true,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// Whether the element is `{ns}local`
    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.local_name() == local && self.namespace.as_deref() == Some(ns)
    }

    /// Unescaped value of the first attribute with the given local name
    pub fn attr(&self, local: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|(key, _)| local_part(key) == local)
            .map(|(_, raw)| match unescape(raw) {
                Ok(value) => value.into_owned(),
                Err(_) => raw.clone(),
            })
    }

    /// Set an attribute by local name; a new attribute takes the element's
    /// own prefix.
    pub fn set_attr(&mut self, local: &str, value: &str) {
        let escaped = escape(value).into_owned();
        if let Some(slot) = self
            .attributes
            .iter_mut()
            .find(|(key, _)| local_part(key) == local)
        {
            slot.1 = escaped;
            return;
        }
        let key = match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        };
        self.attributes.push((key, escaped));
    }

    pub fn remove_attr(&mut self, local: &str) {
        self.attributes.retain(|(key, _)| local_part(key) != local);
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn child(&self, ns: &str, local: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.is(ns, local))
    }

    pub fn child_mut(&mut self, ns: &str, local: &str) -> Option<&mut XmlElement> {
        self.children
            .iter_mut()
            .filter_map(XmlNode::as_element_mut)
            .find(|el| el.is(ns, local))
    }

    /// All descendant elements named `{ns}local`, in document order
    pub fn descendants(&self, ns: &str, local: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(ns, local, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, ns: &str, local: &str, found: &mut Vec<&'a XmlElement>) {
        for child in self.child_elements() {
            if child.is(ns, local) {
                found.push(child);
            }
            child.collect_descendants(ns, local, found);
        }
    }

    /// Whether any descendant is `{ns}local`
    pub fn contains(&self, ns: &str, local: &str) -> bool {
        self.child_elements()
            .any(|child| child.is(ns, local) || child.contains(ns, local))
    }

    /// Concatenation of the direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node
    pub fn set_text(&mut self, text: &str) {
        self.children.clear();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }

    pub fn push_element(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Follow a path of child indices
    pub fn element_at(&self, path: &[usize]) -> Option<&XmlElement> {
        let mut current = self;
        for &index in path {
            current = current.children.get(index)?.as_element()?;
        }
        Some(current)
    }

    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut current = self;
        for &index in path {
            current = current.children.get_mut(index)?.as_element_mut()?;
        }
        Some(current)
    }

    /// Serialize this element and its subtree
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

/// A parsed XML part: the raw prolog plus the top-level nodes
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// `<?xml ...?>` declaration, verbatim
    pub prolog: Option<String>,
    pub nodes: Vec<XmlNode>,
}

impl XmlDocument {
    /// Parse a complete XML part
    pub fn parse(source: &str) -> Result<Self, OoxmlError> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let (prolog, body) = split_prolog(source);

        let mut reader = Reader::from_str(body);
        reader.config_mut().trim_text(false);

        let mut top: Vec<XmlNode> = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut scopes: Vec<Vec<(String, String)>> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let (element, declared) = open_element(&start, &scopes)?;
                    scopes.push(declared);
                    stack.push(element);
                }
                Event::Empty(start) => {
                    let (mut element, _) = open_element(&start, &scopes)?;
                    element.self_closing = true;
                    attach(&mut stack, &mut top, XmlNode::Element(element));
                }
                Event::End(_) => {
                    scopes.pop();
                    let element = stack.pop().ok_or_else(|| {
                        OoxmlError::InvalidDocument("unbalanced closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut top, XmlNode::Element(element));
                }
                Event::Text(text) => {
                    let value = match text.unescape() {
                        Ok(value) => value.into_owned(),
                        Err(_) => String::from_utf8_lossy(&text).into_owned(),
                    };
                    attach(&mut stack, &mut top, XmlNode::Text(value));
                }
                Event::CData(data) => {
                    let raw = format!("<![CDATA[{}]]>", String::from_utf8_lossy(&data));
                    attach(&mut stack, &mut top, XmlNode::Raw(raw));
                }
                Event::Comment(comment) => {
                    let raw = format!("<!--{}-->", String::from_utf8_lossy(&comment));
                    attach(&mut stack, &mut top, XmlNode::Raw(raw));
                }
                Event::Eof => break,
                other => log::debug!("skipping XML event {:?}", other),
            }
        }

        if let Some(open) = stack.last() {
            return Err(OoxmlError::InvalidDocument(format!(
                "element <{}> is never closed",
                open.name
            )));
        }

        Ok(XmlDocument {
            prolog: prolog.map(str::to_string),
            nodes: top,
        })
    }

    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(XmlNode::as_element)
    }

    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.nodes.iter_mut().find_map(XmlNode::as_element_mut)
    }

    /// Serialize back to markup
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if let Some(prolog) = &self.prolog {
            out.push_str(prolog);
        }
        for node in &self.nodes {
            write_node(node, &mut out);
        }
        out
    }
}

fn split_prolog(source: &str) -> (Option<&str>, &str) {
    if source.starts_with("<?xml") {
        if let Some(end) = source.find("?>") {
            return (Some(&source[..end + 2]), &source[end + 2..]);
        }
    }
    (None, source)
}

fn local_part(key: &str) -> &str {
    key.split_once(':').map_or(key, |(_, local)| local)
}

fn attach(stack: &mut [XmlElement], top: &mut Vec<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
    }
}

/// Build an element from a start tag. Returns the element and the namespace
/// declarations it introduces.
fn open_element(
    start: &quick_xml::events::BytesStart<'_>,
    scopes: &[Vec<(String, String)>],
) -> Result<(XmlElement, Vec<(String, String)>), OoxmlError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    let mut declared = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        if key == "xmlns" {
            declared.push((String::new(), value.clone()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declared.push((prefix.to_string(), value.clone()));
        }
        attributes.push((key, value));
    }

    let prefix = name.split_once(':').map_or("", |(prefix, _)| prefix);
    let namespace = declared
        .iter()
        .rev()
        .chain(scopes.iter().rev().flat_map(|scope| scope.iter().rev()))
        .find(|(bound, _)| bound == prefix)
        .map(|(_, uri)| uri.clone());

    Ok((
        XmlElement {
            name,
            namespace,
            attributes,
            children: Vec::new(),
            self_closing: false,
        },
        declared,
    ))
}

fn write_node(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Element(el) => write_element(el, out),
        XmlNode::Text(text) => out.push_str(&partial_escape(text.as_str())),
        XmlNode::Raw(raw) => out.push_str(raw),
    }
}

fn write_element(el: &XmlElement, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for (key, value) in &el.attributes {
        // Values are stored escaped; a literal `"` can only survive from a
        // single-quoted source attribute.
        let quote = if value.contains('"') { '\'' } else { '"' };
        out.push(' ');
        out.push_str(key);
        out.push('=');
        out.push(quote);
        out.push_str(value);
        out.push(quote);
    }
    if el.children.is_empty() && el.self_closing {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}
