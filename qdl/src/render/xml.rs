use std::fmt::Write;

use crate::QuestDocument;
use crate::node::{Node, Tag};
use crate::render::Renderer;

/// The reference renderer: one element per node, named after the node's tag,
/// nesting mirroring the containment tree. Every element carries a `line`
/// attribute so editors can map it back to its source line.
pub struct XmlRenderer;

impl Renderer for XmlRenderer {
    fn render(&self, document: &QuestDocument) -> String {
        let mut out = String::new();
        write_node(&mut out, &document.root, 0);
        out
    }
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    let pad = "  ".repeat(depth);
    let _ = write!(out, "{pad}<{}", node.tag.as_str());

    // Quest titles and choice labels render as attributes; instruction,
    // enemy, and trigger text renders as element content.
    let text_attr = match node.tag {
        Tag::Quest => Some("title"),
        Tag::Choice => Some("text"),
        _ => None,
    };
    if let Some(name) = text_attr {
        if !node.text.is_empty() {
            let _ = write!(out, " {name}=\"{}\"", escape(&node.text));
        }
    }
    for (key, value) in &node.attrs {
        let _ = write!(out, " {key}=\"{}\"", escape(value));
    }
    if let Some(target) = &node.target {
        let _ = write!(out, " goto=\"{}\"", escape(target));
    }
    let _ = write!(out, " line=\"{}\"", node.line);

    let body = if text_attr.is_some() { "" } else { node.text.as_str() };
    if node.children.is_empty() && body.is_empty() {
        let _ = writeln!(out, "/>");
        return;
    }
    if node.children.is_empty() {
        let _ = writeln!(out, ">{}</{}>", escape(body), node.tag.as_str());
        return;
    }

    let _ = writeln!(out, ">");
    if !body.is_empty() {
        let _ = writeln!(out, "{pad}  {}", escape(body));
    }
    for child in &node.children {
        write_node(out, child, depth + 1);
    }
    let _ = writeln!(out, "{pad}</{}>", node.tag.as_str());
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }
}
