mod xml;

pub use xml::XmlRenderer;

use crate::QuestDocument;

/// Serializes a parsed document into an output representation. The parser is
/// renderer-agnostic; rendering is a separate pass over the finished tree.
pub trait Renderer {
    fn render(&self, document: &QuestDocument) -> String;
}
