use crate::QuestDocument;
use crate::block::{Block, BlockKind};
use crate::log::{Code, Logger};
use crate::node::{Node, Tag};
use crate::parser::ParseOutput;

/// `key: value` lines directly under the quest header that become quest
/// attributes rather than stray content.
const QUEST_METADATA_KEYS: &[&str] = &["summary", "author", "email", "url", "minplayers", "maxplayers"];

/// Parse a block sequence into a quest document. The grammar is enforced on a
/// best-effort basis: every diagnosable problem becomes a log message and
/// parsing continues, so downstream consumers never receive an absent result.
pub fn parse_blocks(blocks: &[Block], file_id: usize) -> ParseOutput {
    let mut state = ParseState::new(file_id);
    state.run(blocks);
    state.finish()
}

struct OpenScope {
    node: Node,
    indent: usize,
    importance: u8,
}

struct ParseState {
    file_id: usize,
    log: Logger,
    /// Stack of open nodes, innermost last. The quest root is stack[0] and is
    /// never popped until `finish`.
    stack: Vec<OpenScope>,
    /// Last source line consumed; closes get this as their end line.
    last_line: usize,
}

impl ParseState {
    fn new(file_id: usize) -> Self {
        ParseState {
            file_id,
            log: Logger::new(),
            stack: Vec::new(),
            last_line: 0,
        }
    }

    fn run(&mut self, blocks: &[Block]) {
        let Some(first) = blocks.first() else {
            self.log.log(Code::HeaderMissing, 0, "a quest must start with a header line (\"# Title\")");
            self.push_root(Node::new(Tag::Quest, "", 0));
            return;
        };

        let rest = match first.kind {
            BlockKind::Heading | BlockKind::QuotedHeading => {
                self.push_root(Node::new(Tag::Quest, first.text.clone(), first.start_line));
                self.last_line = first.end_line();
                &blocks[1..]
            }
            _ => {
                self.log.log(
                    Code::HeaderMissing,
                    first.start_line,
                    "a quest must start with a header line (\"# Title\")",
                );
                self.push_root(Node::new(Tag::Quest, "", 0));
                blocks
            }
        };

        for block in rest {
            self.attach(block);
            self.last_line = block.end_line();
        }
    }

    fn push_root(&mut self, node: Node) {
        self.stack.push(OpenScope {
            node,
            indent: 0,
            importance: BlockKind::Heading.importance(),
        });
    }

    fn finish(mut self) -> ParseOutput {
        while self.stack.len() > 1 {
            self.pop_scope();
        }
        let Some(mut root_scope) = self.stack.pop() else {
            // run() always pushes a root; degenerate fallback only.
            return ParseOutput {
                document: QuestDocument {
                    root: Node::new(Tag::Quest, "", 0),
                    source_id: self.file_id,
                },
                log: self.log,
            };
        };
        root_scope.node.end_line = self.last_line.max(root_scope.node.line);
        ParseOutput {
            document: QuestDocument {
                root: root_scope.node,
                source_id: self.file_id,
            },
            log: self.log,
        }
    }

    fn attach(&mut self, block: &Block) {
        self.close_to(block.indent, block.kind.importance());
        match block.kind {
            BlockKind::Heading | BlockKind::QuotedHeading => self.open_section(block),
            BlockKind::CardDelimiter => self.open_card(block),
            BlockKind::ListItem => self.open_list_item(block),
            BlockKind::Paragraph => self.add_paragraph(block),
        }
    }

    /// Close open scopes (bar the root) the incoming block no longer belongs
    /// to. Outdenting always exits deeper scopes; at equal indent the folding
    /// rank decides: titles close cards, cards close choices, choices close
    /// each other, but plain text stays inside the block above it.
    fn close_to(&mut self, indent: usize, importance: u8) {
        while self.stack.len() > 1 {
            let top = match self.stack.last() {
                Some(scope) => scope,
                None => return,
            };
            let outdented = top.indent > indent;
            let sibling = top.indent == indent && importance >= top.importance;
            if outdented || sibling {
                self.pop_scope();
            } else {
                break;
            }
        }
    }

    fn pop_scope(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        if let Some(mut closed) = self.stack.pop() {
            closed.node.end_line = self.last_line.max(closed.node.line);
            if let Some(parent) = self.stack.last_mut() {
                parent.node.children.push(closed.node);
            }
        }
    }

    fn add_child(&mut self, node: Node) {
        if let Some(top) = self.stack.last_mut() {
            top.node.children.push(node);
        }
    }

    fn push_scope(&mut self, node: Node, indent: usize, importance: u8) {
        self.stack.push(OpenScope {
            node,
            indent,
            importance,
        });
    }

    /// A heading after the quest header opens a section, expressed as a
    /// titled roleplay container at quest level.
    fn open_section(&mut self, block: &Block) {
        let mut node = Node::new(Tag::Roleplay, "", block.start_line);
        node.attrs.insert("title".to_string(), block.text.clone());
        self.push_scope(node, block.indent, block.kind.importance());
    }

    fn open_card(&mut self, block: &Block) {
        let (title, suffix) = split_card_delimiter(&block.text);
        let Some(title) = title else {
            self.log.log(
                Code::MalformedBlock,
                block.start_line,
                format!("could not read a card title from \"{}\"", block.text),
            );
            let node = Node::new(Tag::Roleplay, "", block.start_line);
            self.push_scope(node, block.indent, block.kind.importance());
            return;
        };

        let mut node = if title.eq_ignore_ascii_case("combat") {
            Node::new(Tag::Combat, "", block.start_line)
        } else {
            let mut n = Node::new(Tag::Roleplay, "", block.start_line);
            n.attrs.insert("title".to_string(), title.to_string());
            n
        };
        if let Some(id) = parse_id_suffix(suffix) {
            node.attrs.insert("id".to_string(), id);
        } else if !suffix.trim().is_empty() {
            self.log.log(
                Code::MalformedBlock,
                block.start_line,
                format!("unrecognized text after card delimiter: \"{}\"", suffix.trim()),
            );
        }
        self.push_scope(node, block.indent, block.kind.importance());
    }

    fn open_list_item(&mut self, block: &Block) {
        // Open scopes are always quest, card, choice, or event nodes, so the
        // innermost scope decides the list-item context.
        let in_combat = self
            .stack
            .last()
            .is_some_and(|s| s.node.tag == Tag::Combat);

        if in_combat {
            let lowered = block.text.to_lowercase();
            if lowered == "on win" {
                let node = Node::new(Tag::Win, "win", block.start_line);
                self.push_scope(node, block.indent, block.kind.importance());
            } else if lowered == "on lose" {
                let node = Node::new(Tag::Lose, "lose", block.start_line);
                self.push_scope(node, block.indent, block.kind.importance());
            } else {
                self.add_enemy(block);
            }
            return;
        }

        let (text, condition) = split_condition_prefix(&block.text);
        let (label, target) = split_target_suffix(text);
        let mut node = Node::new(Tag::Choice, label, block.start_line);
        if let Some(cond) = condition {
            node.attrs.insert("if".to_string(), cond);
        }
        node.target = target;
        self.push_scope(node, block.indent, block.kind.importance());
    }

    /// Enemy lines are leaves. A trailing JSON object supplies attribute
    /// overrides, e.g. `- Dust Wraith {"tier": 3}`.
    fn add_enemy(&mut self, block: &Block) {
        let (name, attrs_text) = match block.text.find('{') {
            Some(pos) => (block.text[..pos].trim(), Some(block.text[pos..].trim())),
            None => (block.text.as_str(), None),
        };
        let mut node = Node::new(Tag::Enemy, name, block.start_line);
        if let Some(json) = attrs_text {
            match serde_json::from_str::<serde_json::Value>(json) {
                Ok(serde_json::Value::Object(map)) => {
                    for (key, value) in map {
                        let rendered = match value {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        };
                        node.attrs.insert(key, rendered);
                    }
                }
                _ => {
                    self.log.log(
                        Code::MalformedBlock,
                        block.start_line,
                        format!("could not read enemy overrides from \"{json}\""),
                    );
                }
            }
        }
        self.add_child(node);
    }

    fn add_paragraph(&mut self, block: &Block) {
        if let Some(trigger) = parse_trigger(&block.text) {
            self.add_child(trigger_node(trigger, block.start_line));
            return;
        }

        let at_quest_level = self
            .stack
            .last()
            .is_some_and(|s| s.node.tag == Tag::Quest);
        if at_quest_level && self.consume_quest_metadata(block) {
            return;
        }
        if at_quest_level {
            self.log.log(
                Code::StrayContent,
                block.start_line,
                "text outside of a card; wrap it in a _card_ delimiter",
            );
        }

        let mut node = Node::new(Tag::Instruction, block.text.clone(), block.start_line);
        node.end_line = block.end_line();
        self.add_child(node);
    }

    /// Quest metadata paragraphs are all `key: value` lines with known keys.
    /// Returns false (and attaches nothing) if any line does not conform.
    fn consume_quest_metadata(&mut self, block: &Block) -> bool {
        let mut pairs = Vec::new();
        for line in block.text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                return false;
            };
            let key = key.trim().to_lowercase();
            if !QUEST_METADATA_KEYS.contains(&key.as_str()) {
                return false;
            }
            pairs.push((key, value.trim().to_string()));
        }
        if let Some(root) = self.stack.first_mut() {
            for (key, value) in pairs {
                root.node.attrs.insert(key, value);
            }
        }
        true
    }
}

enum TriggerKind {
    End,
    Win,
    Lose,
    Goto(String),
}

fn trigger_node(kind: TriggerKind, line: usize) -> Node {
    let mut node = match kind {
        TriggerKind::End => Node::new(Tag::Trigger, "end", line),
        TriggerKind::Win => Node::new(Tag::Trigger, "win", line),
        TriggerKind::Lose => Node::new(Tag::Trigger, "lose", line),
        TriggerKind::Goto(ref id) => Node::new(Tag::Trigger, format!("goto {id}"), line),
    };
    if let TriggerKind::Goto(id) = kind {
        node.target = Some(id);
    }
    node
}

/// A trigger is a single paragraph line of the form `**end**`, `**win**`,
/// `**lose**`, or `**goto id**` (case-insensitive keyword).
fn parse_trigger(text: &str) -> Option<TriggerKind> {
    if text.contains('\n') {
        return None;
    }
    let inner = text
        .trim()
        .strip_prefix("**")
        .and_then(|t| t.strip_suffix("**"))?
        .trim();
    if inner.contains('*') {
        return None;
    }
    if inner.eq_ignore_ascii_case("end") {
        return Some(TriggerKind::End);
    }
    if inner.eq_ignore_ascii_case("win") {
        return Some(TriggerKind::Win);
    }
    if inner.eq_ignore_ascii_case("lose") {
        return Some(TriggerKind::Lose);
    }
    let keyword = inner.get(..5)?;
    if !keyword.eq_ignore_ascii_case("goto ") {
        return None;
    }
    let id = inner[5..].trim();
    if id.is_empty() {
        None
    } else {
        Some(TriggerKind::Goto(id.to_string()))
    }
}

/// Split `_Title_ (#id)` into the title between the underscores and whatever
/// trails the closing underscore.
fn split_card_delimiter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.strip_prefix('_') else {
        return (None, text);
    };
    match rest.find('_') {
        Some(close) => (Some(rest[..close].trim()), &rest[close + 1..]),
        None => (None, text),
    }
}

/// Parse a `(#id)` suffix; ids are `[A-Za-z0-9_-]+`.
fn parse_id_suffix(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let inner = trimmed.strip_prefix("(#")?.strip_suffix(')')?;
    if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return None;
    }
    Some(inner.to_string())
}

/// Split a `{{condition}}` prefix off a choice label.
fn split_condition_prefix(text: &str) -> (&str, Option<String>) {
    let Some(rest) = text.strip_prefix("{{") else {
        return (text, None);
    };
    match rest.find("}}") {
        Some(close) => (
            rest[close + 2..].trim_start(),
            Some(rest[..close].trim().to_string()),
        ),
        None => (text, None),
    }
}

/// Split a trailing `(#id)` jump target off a choice label.
fn split_target_suffix(text: &str) -> (&str, Option<String>) {
    let trimmed = text.trim_end();
    if let Some(open) = trimmed.rfind("(#") {
        if let Some(id) = parse_id_suffix(&trimmed[open..]) {
            return (trimmed[..open].trim_end(), Some(id));
        }
    }
    (trimmed, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_markers_parse() {
        assert!(matches!(parse_trigger("**end**"), Some(TriggerKind::End)));
        assert!(matches!(parse_trigger("**Win**"), Some(TriggerKind::Win)));
        match parse_trigger("**goto Market-2**") {
            Some(TriggerKind::Goto(id)) => assert_eq!(id, "Market-2"),
            _ => panic!("expected goto trigger"),
        }
        assert!(parse_trigger("**end** of the road").is_none());
        assert!(parse_trigger("plain text").is_none());
    }

    #[test]
    fn card_delimiter_splits_title_and_id() {
        let (title, suffix) = split_card_delimiter("_The Gate_ (#gate)");
        assert_eq!(title, Some("The Gate"));
        assert_eq!(parse_id_suffix(suffix), Some("gate".to_string()));
    }

    #[test]
    fn choice_condition_and_target_split() {
        let (text, cond) = split_condition_prefix("{{gold > 5}} Bribe the guard (#inside)");
        assert_eq!(cond.as_deref(), Some("gold > 5"));
        let (label, target) = split_target_suffix(text);
        assert_eq!(label, "Bribe the guard");
        assert_eq!(target.as_deref(), Some("inside"));
    }

    #[test]
    fn condition_only_choice_has_empty_label() {
        let (text, cond) = split_condition_prefix("{{visited}}");
        assert_eq!(cond.as_deref(), Some("visited"));
        assert!(text.is_empty());
    }
}
