//! Block segmentation: raw source text to an ordered sequence of typed,
//! indented, line-numbered blocks. Segmentation is total over any input and
//! never emits diagnostics; malformed text simply falls out as paragraphs.

/// One segmented source block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Block text with the line marker stripped (headings, quoted headings,
    /// list items). Card delimiters and paragraphs keep their raw trimmed
    /// text; paragraph continuation lines are joined with '\n'.
    pub text: String,
    /// Leading-space count of the block's first line.
    pub indent: usize,
    /// 1-based line number of the block's first line.
    pub start_line: usize,
}

impl Block {
    /// 1-based line number of the block's last line.
    pub fn end_line(&self) -> usize {
        self.start_line + self.text.lines().count().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `# Title`
    Heading,
    /// `> Title`
    QuotedHeading,
    /// `_Title_`, optionally with a trailing `(#id)` suffix.
    CardDelimiter,
    /// `* item`, `+ item`, `- item`, or `1. item`.
    ListItem,
    /// Anything else: instruction text, triggers, quest metadata.
    Paragraph,
}

impl BlockKind {
    /// Folding importance. A block of rank R is closed by a later block of
    /// rank >= R at indent <= its own. Paragraphs never open a scope, so they
    /// share the lowest rank with list items.
    pub fn importance(self) -> u8 {
        match self {
            BlockKind::ListItem | BlockKind::Paragraph => 0,
            BlockKind::CardDelimiter => 1,
            BlockKind::Heading | BlockKind::QuotedHeading => 2,
        }
    }
}

/// Split source text into blocks. Blank (or whitespace-only) lines terminate
/// the current paragraph accumulation without closing enclosing blocks.
pub fn segment(source: &str) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut paragraph: Option<Block> = None;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        if raw.trim().is_empty() {
            flush(&mut blocks, &mut paragraph);
            continue;
        }

        let indent = raw.len() - raw.trim_start().len();
        let text = raw.trim();
        let kind = classify(text);

        if kind == BlockKind::Paragraph {
            // Continuation lines at the same indent extend the open paragraph.
            if let Some(open) = paragraph.as_mut() {
                if open.indent == indent {
                    open.text.push('\n');
                    open.text.push_str(text);
                    continue;
                }
                flush(&mut blocks, &mut paragraph);
            }
            paragraph = Some(Block {
                kind,
                text: text.to_string(),
                indent,
                start_line: line_no,
            });
            continue;
        }

        flush(&mut blocks, &mut paragraph);
        blocks.push(Block {
            kind,
            text: strip_marker(kind, text),
            indent,
            start_line: line_no,
        });
    }

    flush(&mut blocks, &mut paragraph);
    blocks
}

fn flush(blocks: &mut Vec<Block>, paragraph: &mut Option<Block>) {
    if let Some(block) = paragraph.take() {
        blocks.push(block);
    }
}

fn classify(text: &str) -> BlockKind {
    if text.starts_with('#') {
        return BlockKind::Heading;
    }
    if text.starts_with("> ") {
        return BlockKind::QuotedHeading;
    }
    if text.starts_with('_') && text[1..].contains('_') {
        return BlockKind::CardDelimiter;
    }
    if is_list_item(text) {
        return BlockKind::ListItem;
    }
    BlockKind::Paragraph
}

fn is_list_item(text: &str) -> bool {
    for marker in ["* ", "+ ", "- "] {
        if text.starts_with(marker) {
            return true;
        }
    }
    // Numbered items: one or more digits, a dot, a space.
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && text[digits..].starts_with(". ")
}

fn strip_marker(kind: BlockKind, text: &str) -> String {
    match kind {
        BlockKind::Heading => text.trim_start_matches('#').trim().to_string(),
        BlockKind::QuotedHeading => text[2..].trim().to_string(),
        BlockKind::ListItem => {
            if let Some(rest) = text
                .strip_prefix("* ")
                .or_else(|| text.strip_prefix("+ "))
                .or_else(|| text.strip_prefix("- "))
            {
                return rest.trim().to_string();
            }
            let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
            text[digits + 2..].trim().to_string()
        }
        BlockKind::CardDelimiter | BlockKind::Paragraph => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_blocks() {
        assert!(segment("").is_empty());
        assert!(segment("\n  \n\t\n").is_empty());
    }

    #[test]
    fn classifies_marker_kinds() {
        let blocks = segment("# Quest\n\n_Intro_\n\n* Choose\n\nSome text\n");
        let kinds: Vec<BlockKind> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Heading,
                BlockKind::CardDelimiter,
                BlockKind::ListItem,
                BlockKind::Paragraph,
            ]
        );
    }

    #[test]
    fn numbered_and_dashed_items_are_list_items() {
        let blocks = segment("1. first\n- second\n+ third\n");
        assert!(blocks.iter().all(|b| b.kind == BlockKind::ListItem));
        assert_eq!(blocks[0].text, "first");
        assert_eq!(blocks[1].text, "second");
    }

    #[test]
    fn blank_lines_split_paragraphs() {
        let blocks = segment("one\ntwo\n\nthree\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "one\ntwo");
        assert_eq!(blocks[0].start_line, 1);
        assert_eq!(blocks[0].end_line(), 2);
        assert_eq!(blocks[1].start_line, 4);
    }

    #[test]
    fn indent_change_splits_paragraphs() {
        let blocks = segment("one\n  two\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].indent, 2);
    }

    #[test]
    fn line_numbers_are_one_based() {
        let blocks = segment("\n\n# Quest\n");
        assert_eq!(blocks[0].start_line, 3);
    }

    #[test]
    fn quoted_heading_ranks_with_headings() {
        let blocks = segment("> The Long Road\n");
        assert_eq!(blocks[0].kind, BlockKind::QuotedHeading);
        assert_eq!(blocks[0].text, "The Long Road");
        assert_eq!(blocks[0].kind.importance(), BlockKind::Heading.importance());
    }
}
