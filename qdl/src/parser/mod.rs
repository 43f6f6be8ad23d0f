mod structural;

use crate::QuestDocument;
use crate::block;
use crate::log::Logger;

/// Parser entry point.
pub struct QdlParser {
    source: String,
    file_id: usize,
}

/// What one parse produces: a document (always) and the diagnostics log. The
/// same log is handed on to the crawl pass so one finalized report mixes
/// structural and semantic findings in discovery order.
#[derive(Debug)]
pub struct ParseOutput {
    pub document: QuestDocument,
    pub log: Logger,
}

impl QdlParser {
    pub fn new(source: impl Into<String>, file_id: usize) -> Self {
        QdlParser {
            source: source.into(),
            file_id,
        }
    }

    /// Parse QDL source into a document. Content problems become log
    /// messages, never errors; a best-effort document is always produced.
    pub fn parse(&self) -> ParseOutput {
        let blocks = block::segment(&self.source);
        structural::parse_blocks(&blocks, self.file_id)
    }
}
