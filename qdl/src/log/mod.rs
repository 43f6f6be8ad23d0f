//! Severity-bucketed, line-addressed diagnostics shared by the parser and the
//! playtest validator. Codes are a closed set; each code is bound to one
//! severity and one stable string form, both part of the output contract.

use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    /// The source does not begin with a quest header.
    HeaderMissing,
    /// Text attached directly to the quest instead of a card.
    StrayContent,
    /// A block that parsed only on a best-effort basis.
    MalformedBlock,
    /// A branch that leads nowhere: dangling goto or missing `**end**`.
    ImplicitEnd,
    /// A combat card without exactly one win and one lose event.
    CombatEventImbalance,
    /// A roleplay card whose choices are all inactive.
    RoleplayNoActiveChoices,
    /// An unregistered enemy with no explicit tier override.
    EnemyMissingTier,
    /// An enemy from a content set the quest does not enable.
    ContentSetDisabled,
    /// An instruction that almost, but not quite, follows the house grammar.
    InstructionPhrasing,
    /// "player" phrasing where "adventurer" is expected.
    PlayerReference,
    /// Art markup embedded inline instead of on its own line.
    ArtInline,
}

impl Code {
    pub fn as_str(self) -> &'static str {
        match self {
            Code::HeaderMissing => "header-missing",
            Code::StrayContent => "stray-content",
            Code::MalformedBlock => "malformed-block",
            Code::ImplicitEnd => "implicit-end",
            Code::CombatEventImbalance => "combat-event-imbalance",
            Code::RoleplayNoActiveChoices => "roleplay-no-active-choices",
            Code::EnemyMissingTier => "enemy-missing-tier",
            Code::ContentSetDisabled => "content-set-disabled",
            Code::InstructionPhrasing => "instruction-phrasing",
            Code::PlayerReference => "player-reference",
            Code::ArtInline => "art-inline",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Code::StrayContent
            | Code::MalformedBlock
            | Code::ContentSetDisabled
            | Code::InstructionPhrasing
            | Code::PlayerReference => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic. Severity is derived from the code, so a message can
/// never carry the wrong severity for its code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub code: Code,
    pub message: String,
    /// 1-based source line; 0 addresses the document as a whole.
    pub line: usize,
}

impl LogMessage {
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Convert to a codespan-reporting Diagnostic given the byte span of the
    /// message's line.
    pub fn to_diagnostic(&self, file_id: usize, line_span: Range<usize>) -> Diagnostic<usize> {
        Diagnostic::new(self.severity())
            .with_message(&self.message)
            .with_code(self.code.as_str())
            .with_labels(vec![Label::primary(file_id, line_span)])
    }
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{} [{}] {}", self.line, self.code.as_str(), self.message)
    }
}

/// In-order collection of diagnostics for one pipeline run.
#[derive(Debug, Default)]
pub struct Logger {
    messages: Vec<LogMessage>,
}

impl Logger {
    pub fn new() -> Self {
        Logger::default()
    }

    pub fn log(&mut self, code: Code, line: usize, message: impl Into<String>) {
        self.messages.push(LogMessage {
            code,
            message: message.into(),
            line,
        });
    }

    pub fn messages(&self) -> &[LogMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Severity-bucketed view, insertion order preserved within each bucket.
    /// Pure over the current contents, so repeated calls return identical
    /// results.
    pub fn finalize(&self) -> LogMessageMap {
        let mut map = LogMessageMap::default();
        for msg in &self.messages {
            match msg.severity() {
                Severity::Warning => map.warning.push(msg.clone()),
                _ => map.error.push(msg.clone()),
            }
        }
        map
    }
}

/// Finalized diagnostics, grouped by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogMessageMap {
    pub error: Vec<LogMessage>,
    pub warning: Vec<LogMessage>,
}

/// Render messages one per line, the way fixtures and tests compare them.
pub fn prettify(messages: &[LogMessage]) -> String {
    messages
        .iter()
        .map(LogMessage::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
