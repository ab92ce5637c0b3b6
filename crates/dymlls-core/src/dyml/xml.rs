//! XML rendering of a parsed document.

use super::parser::{Document, Element, Node};

/// Render `document` as XML wrapped in a `<root>` element.
///
/// Whitespace-only text between elements is dropped; all other text is
/// emitted verbatim with XML special characters escaped.
#[must_use]
pub fn encode(document: &Document) -> String {
    let mut out = String::from("<root>");
    encode_nodes(&document.children, &mut out);
    out.push_str("</root>");
    out
}

fn encode_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(element) => encode_element(element, out),
            Node::Text(text) if text.trim().is_empty() => {}
            Node::Text(text) => escape_into(text, out),
        }
    }
}

fn encode_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_into(value, out);
        out.push('"');
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    encode_nodes(&element.children, out);
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
}
