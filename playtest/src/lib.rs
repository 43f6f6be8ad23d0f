pub mod crawler;
pub mod encounters;
pub mod registry;
pub mod rules;
pub mod settings;
pub mod validator;

pub use crawler::{CrawlError, CrawlSummary};
pub use encounters::{Encounter, EncounterRegistry};
pub use settings::PlaytestSettings;

use qdl::QuestDocument;
use qdl::log::LogMessageMap;
use qdl::parser::QdlParser;

use crate::registry::NodeRegistry;

/// Everything one playtest pass produces.
#[derive(Debug)]
pub struct PlaytestReport {
    pub document: QuestDocument,
    pub messages: LogMessageMap,
    pub summary: CrawlSummary,
}

/// Parse, crawl, and validate a quest source in one call. Pure and
/// synchronous: each invocation owns its queue, seen-set, and logger, so
/// repeated runs over the same input are deterministic and concurrent runs
/// share nothing.
pub fn run(
    source: &str,
    settings: &PlaytestSettings,
    encounters: &EncounterRegistry,
) -> PlaytestReport {
    let output = QdlParser::new(source, 0).parse();
    let mut log = output.log;
    let document = output.document;

    let summary = {
        let registry = NodeRegistry::from_document(&document);
        // The start node is always present, so the crawl cannot fail here.
        validator::crawl_with_log(Some(&document.root), &registry, settings, encounters, &mut log)
            .unwrap_or_default()
    };

    PlaytestReport {
        document,
        messages: log.finalize(),
        summary,
    }
}
