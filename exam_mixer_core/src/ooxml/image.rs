//! Floating image handling
//!
//! Anchored (floating) drawings are positioned relative to a paragraph or
//! the page, so after questions are reordered they end up on top of the
//! wrong text. Converting them to inline drawings makes every picture travel
//! with the paragraph that owns it.

use super::xml::{XmlElement, XmlNode};
use super::{A_NS, WP_NS};

/// Children of `wp:anchor` that are also valid in `wp:inline`, in schema order
const INLINE_CHILDREN: [(&str, &str); 5] = [
    (WP_NS, "extent"),
    (WP_NS, "effectExtent"),
    (WP_NS, "docPr"),
    (WP_NS, "cNvGraphicFramePr"),
    (A_NS, "graphic"),
];

/// Distance-from-text attributes shared by both forms
const DISTANCE_ATTRIBUTES: [&str; 4] = ["distT", "distB", "distL", "distR"];

/// Number of `wp:anchor` drawings below `element`
pub fn count_floating_images(element: &XmlElement) -> usize {
    element.descendants(WP_NS, "anchor").len() + usize::from(element.is(WP_NS, "anchor"))
}

/// Replace every `wp:anchor` below `element` with an equivalent
/// `wp:inline`. Returns the number of drawings converted.
pub fn fix_floating_images(element: &mut XmlElement) -> usize {
    let mut converted = 0;
    for child in element.children.iter_mut() {
        let XmlNode::Element(child_el) = child else {
            continue;
        };
        if child_el.is(WP_NS, "anchor") {
            *child_el = anchor_to_inline(child_el);
            converted += 1;
        } else {
            converted += fix_floating_images(child_el);
        }
    }
    converted
}

fn anchor_to_inline(anchor: &XmlElement) -> XmlElement {
    let mut inline = anchor.new_like("inline");
    inline.self_closing = false;

    for name in DISTANCE_ATTRIBUTES {
        if let Some(value) = anchor.attr(name) {
            set_plain_attr(&mut inline, name, &value);
        }
    }

    for (ns, local) in INLINE_CHILDREN {
        if let Some(child) = anchor.child(ns, local) {
            inline.push_element(child.clone());
        }
    }

    inline
}

/// Set an attribute that carries no namespace prefix
fn set_plain_attr(element: &mut XmlElement, key: &str, value: &str) {
    element.remove_attr(key);
    element
        .attributes
        .push((key.to_string(), quick_xml::escape::escape(value).into_owned()));
}
