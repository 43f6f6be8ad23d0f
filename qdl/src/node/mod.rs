use std::collections::BTreeMap;
use std::fmt;

/// Element tags a parsed node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Quest,
    Roleplay,
    Combat,
    Choice,
    Instruction,
    /// An enemy line inside a combat card.
    Enemy,
    /// A `* on win` combat event branch.
    Win,
    /// A `* on lose` combat event branch.
    Lose,
    /// A `**end**`, `**win**`, `**lose**`, or `**goto id**` marker.
    Trigger,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Quest => "quest",
            Tag::Roleplay => "roleplay",
            Tag::Combat => "combat",
            Tag::Choice => "choice",
            Tag::Instruction => "instruction",
            Tag::Enemy => "e",
            Tag::Win => "win",
            Tag::Lose => "lose",
            Tag::Trigger => "trigger",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed tree element. Containment is a tree: every node except the root
/// has exactly one parent. Choice and goto targets are ids resolved through a
/// registry at crawl time, not pointers into the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tag: Tag,
    /// Attribute map (`id`, `tier`, `title`, quest metadata, choice `if`).
    pub attrs: BTreeMap<String, String>,
    /// Node text: quest title, choice label, instruction body, enemy name.
    pub text: String,
    pub children: Vec<Node>,
    /// 1-based source line of the block that produced this node.
    pub line: usize,
    /// Last source line covered by this node and its children.
    pub end_line: usize,
    /// Jump target parsed from a `(#id)` suffix or a `**goto id**` marker.
    pub target: Option<String>,
}

impl Node {
    pub fn new(tag: Tag, text: impl Into<String>, line: usize) -> Self {
        Node {
            tag,
            attrs: BTreeMap::new(),
            text: text.into(),
            children: Vec::new(),
            line,
            end_line: line,
            target: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn is_card(&self) -> bool {
        matches!(self.tag, Tag::Roleplay | Tag::Combat)
    }

    /// The keys a player can see on this card. For combat cards these are the
    /// event names (`win`/`lose`); for roleplay cards, the labels of active
    /// choices. A choice that has no label left after its visibility
    /// condition is stripped is not active.
    pub fn visible_keys(&self) -> Vec<&str> {
        match self.tag {
            Tag::Combat => self
                .children
                .iter()
                .filter(|c| matches!(c.tag, Tag::Win | Tag::Lose))
                .map(|c| c.tag.as_str())
                .collect(),
            Tag::Roleplay => self
                .children
                .iter()
                .filter(|c| c.tag == Tag::Choice && !c.text.is_empty())
                .map(|c| c.text.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The innermost node whose span contains the given 1-based line.
    pub fn node_at_line(&self, line: usize) -> Option<&Node> {
        if line < self.line || line > self.end_line {
            return None;
        }
        for child in &self.children {
            if let Some(inner) = child.node_at_line(line) {
                return Some(inner);
            }
        }
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_with(children: Vec<Node>, tag: Tag) -> Node {
        let mut node = Node::new(tag, "", 1);
        node.children = children;
        node.end_line = 10;
        node
    }

    #[test]
    fn combat_visible_keys_are_event_names() {
        let card = card_with(
            vec![
                Node::new(Tag::Enemy, "Giant Rat", 2),
                Node::new(Tag::Win, "win", 3),
                Node::new(Tag::Lose, "lose", 4),
            ],
            Tag::Combat,
        );
        assert_eq!(card.visible_keys(), vec!["win", "lose"]);
    }

    #[test]
    fn unlabelled_choices_are_not_visible() {
        let card = card_with(
            vec![Node::new(Tag::Choice, "", 2), Node::new(Tag::Choice, "Go", 3)],
            Tag::Roleplay,
        );
        assert_eq!(card.visible_keys(), vec!["Go"]);
    }

    #[test]
    fn node_at_line_returns_innermost() {
        let mut inner = Node::new(Tag::Instruction, "text", 3);
        inner.end_line = 4;
        let mut card = Node::new(Tag::Roleplay, "", 2);
        card.end_line = 6;
        card.children.push(inner);
        let mut root = Node::new(Tag::Quest, "Q", 1);
        root.end_line = 8;
        root.children.push(card);

        assert_eq!(root.node_at_line(4).map(|n| n.tag), Some(Tag::Instruction));
        assert_eq!(root.node_at_line(6).map(|n| n.tag), Some(Tag::Roleplay));
        assert_eq!(root.node_at_line(8).map(|n| n.tag), Some(Tag::Quest));
        assert!(root.node_at_line(9).is_none());
    }
}
