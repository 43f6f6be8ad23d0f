use std::collections::HashMap;

use qdl::QuestDocument;
use qdl::node::{Node, Tag};

/// Per-walk index over one document: author ids, stable node keys, and the
/// fall-through successor of every card. Built fresh for each document; the
/// crawler holds non-owning references through it.
pub struct NodeRegistry<'d> {
    by_id: HashMap<String, &'d Node>,
    /// Fall-through successor (the next card in document order, outside the
    /// node's own subtree), keyed by node line.
    successors: HashMap<usize, Option<&'d Node>>,
}

impl<'d> NodeRegistry<'d> {
    pub fn from_document(document: &'d QuestDocument) -> Self {
        let mut registry = NodeRegistry {
            by_id: HashMap::new(),
            successors: HashMap::new(),
        };
        registry.index(&document.root, None);
        registry
    }

    /// Resolve an author-assigned card id.
    pub fn resolve(&self, id: &str) -> Option<&'d Node> {
        self.by_id.get(id).copied()
    }

    /// The card a choiceless card falls through to, if any.
    pub fn successor_of(&self, node: &Node) -> Option<&'d Node> {
        self.successors.get(&node.line).copied().flatten()
    }

    /// Stable identity for the crawl seen-set: the author id when present,
    /// otherwise the node's source line.
    pub fn node_key(&self, node: &Node) -> String {
        match node.id() {
            Some(id) => id.to_string(),
            None => format!("line:{}", node.line),
        }
    }

    fn index(&mut self, node: &'d Node, successor: Option<&'d Node>) {
        if let Some(id) = node.id() {
            // First definition wins; later duplicates stay unreachable by id.
            self.by_id.entry(id.to_string()).or_insert(node);
        }
        if node.is_card() || node.tag == Tag::Quest {
            self.successors.insert(node.line, successor);
        }
        for (i, child) in node.children.iter().enumerate() {
            let next_card = node.children[i + 1..].iter().find(|c| c.is_card());
            self.index(child, next_card.or(successor));
        }
    }
}
