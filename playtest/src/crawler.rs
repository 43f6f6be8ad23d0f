//! Generic cycle-safe traversal of the navigation graph: containment edges
//! plus choice/goto target edges. The crawler knows nothing about game rules;
//! semantics plug in through a [`CrawlVisitor`].

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;

use qdl::node::{Node, Tag};

use crate::registry::NodeRegistry;

/// Stat bucket for branches that run out of structure without an explicit
/// terminal marker.
pub const IMPLICIT_END: &str = "IMPLICIT_END";
/// Stat bucket for branches that terminate on an explicit marker.
pub const END: &str = "END";

/// One queued traversal step: the node to visit and the line of the edge
/// that queued it.
#[derive(Debug, Clone, Copy)]
pub struct CrawlEntry<'d> {
    pub node: &'d Node,
    pub origin_line: usize,
}

/// Counts of total enqueued entries vs. distinct nodes dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub queued: usize,
    pub visited: usize,
}

/// Per-event accumulation of the lines where the event was observed.
#[derive(Debug, Default)]
pub struct CrawlStats {
    by_event: BTreeMap<&'static str, Vec<usize>>,
}

impl CrawlStats {
    pub fn record(&mut self, event: &'static str, line: usize) {
        self.by_event.entry(event).or_default().push(line);
    }

    pub fn lines(&self, event: &str) -> &[usize] {
        self.by_event.get(event).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Programmer misuse, as opposed to authoring-content problems: content
/// problems go to the logger, misuse fails the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlError {
    MissingStart,
}

impl fmt::Display for CrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlError::MissingStart => write!(f, "crawl invoked without a start node"),
        }
    }
}

impl std::error::Error for CrawlError {}

/// Per-node hook, called once for every distinct node a crawl dispatches.
pub trait CrawlVisitor {
    fn on_node(&mut self, entry: &CrawlEntry<'_>, key: &str, line: usize);
}

/// Visitor for reachability-only crawls.
pub struct NoopVisitor;

impl CrawlVisitor for NoopVisitor {
    fn on_node(&mut self, _entry: &CrawlEntry<'_>, _key: &str, _line: usize) {}
}

/// Breadth-first crawl from `start`. The queue and seen-set are owned by this
/// invocation, so one registry can back any number of crawls without
/// cross-contamination. A node reachable along several paths is dispatched
/// exactly once; termination follows because the seen-set only grows and the
/// graph is finite.
pub fn crawl<'d>(
    start: Option<&'d Node>,
    registry: &NodeRegistry<'d>,
    visitor: &mut dyn CrawlVisitor,
) -> Result<(CrawlSummary, CrawlStats), CrawlError> {
    let start = start.ok_or(CrawlError::MissingStart)?;

    let mut queue: VecDeque<CrawlEntry<'d>> = VecDeque::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut stats = CrawlStats::default();
    let mut summary = CrawlSummary::default();

    queue.push_back(CrawlEntry {
        node: start,
        origin_line: start.line,
    });
    summary.queued += 1;

    while let Some(entry) = queue.pop_front() {
        let key = registry.node_key(entry.node);
        if !seen.insert(key.clone()) {
            continue;
        }
        summary.visited += 1;
        visitor.on_node(&entry, &key, entry.node.line);

        for edge in outgoing_edges(entry.node, registry) {
            match edge {
                Edge::Next(node, origin_line) => {
                    queue.push_back(CrawlEntry { node, origin_line });
                    summary.queued += 1;
                }
                Edge::Terminal(line) => stats.record(END, line),
                Edge::Dangling(line) => stats.record(IMPLICIT_END, line),
            }
        }
    }

    Ok((summary, stats))
}

enum Edge<'d> {
    /// Another node to visit, plus the line of the edge that found it.
    Next(&'d Node, usize),
    /// A clean `**end**`/`**win**`/`**lose**` terminal.
    Terminal(usize),
    /// A branch that leads nowhere.
    Dangling(usize),
}

fn outgoing_edges<'d>(node: &'d Node, registry: &NodeRegistry<'d>) -> Vec<Edge<'d>> {
    match node.tag {
        Tag::Quest | Tag::Roleplay | Tag::Combat => {
            let branches: Vec<&Node> = node
                .children
                .iter()
                .filter(|c| matches!(c.tag, Tag::Choice | Tag::Win | Tag::Lose))
                .collect();
            if branches.is_empty() {
                vec![resolve_continue(node, registry)]
            } else {
                branches
                    .into_iter()
                    .map(|b| resolve_branch(b, registry))
                    .collect()
            }
        }
        _ => Vec::new(),
    }
}

/// Where a choice or combat event leads: its nested card, its jump target,
/// or a terminal trigger. Anything else is a dangling branch.
fn resolve_branch<'d>(branch: &'d Node, registry: &NodeRegistry<'d>) -> Edge<'d> {
    if let Some(target) = &branch.target {
        return match registry.resolve(target) {
            Some(node) => Edge::Next(node, branch.line),
            None => Edge::Dangling(branch.line),
        };
    }
    for child in &branch.children {
        if child.is_card() {
            return Edge::Next(child, branch.line);
        }
        if child.tag == Tag::Trigger {
            return resolve_trigger(child, registry);
        }
    }
    Edge::Dangling(branch.line)
}

/// Where a card with no outgoing branches continues: an embedded card or
/// trigger first, then the document-order fall-through.
fn resolve_continue<'d>(node: &'d Node, registry: &NodeRegistry<'d>) -> Edge<'d> {
    for child in &node.children {
        if child.is_card() {
            return Edge::Next(child, node.line);
        }
        if child.tag == Tag::Trigger {
            return resolve_trigger(child, registry);
        }
    }
    match registry.successor_of(node) {
        Some(next) => Edge::Next(next, node.line),
        None => Edge::Dangling(node.line),
    }
}

fn resolve_trigger<'d>(trigger: &'d Node, registry: &NodeRegistry<'d>) -> Edge<'d> {
    match &trigger.target {
        Some(target) => match registry.resolve(target) {
            Some(node) => Edge::Next(node, trigger.line),
            None => Edge::Dangling(trigger.line),
        },
        None => Edge::Terminal(trigger.line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NodeRegistry;
    use qdl::parser::QdlParser;

    #[test]
    fn missing_start_is_a_caller_error() {
        let output = QdlParser::new("# Quest\n", 0).parse();
        let registry = NodeRegistry::from_document(&output.document);
        let mut visitor = NoopVisitor;
        let result = crawl(None, &registry, &mut visitor);
        assert_eq!(result.unwrap_err(), CrawlError::MissingStart);
    }
}
