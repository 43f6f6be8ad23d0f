pub mod block;
pub mod log;
pub mod node;
pub mod parser;
pub mod render;

use crate::node::Node;

/// A parsed quest document.
#[derive(Debug, Clone)]
pub struct QuestDocument {
    /// The quest root node. Always present; a placeholder when the source had
    /// no usable quest header.
    pub root: Node,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl QuestDocument {
    /// The innermost node whose source span contains the given 1-based line.
    /// Used to start a playtest from an arbitrary cursor position.
    pub fn node_at_line(&self, line: usize) -> Option<&Node> {
        self.root.node_at_line(line)
    }
}
