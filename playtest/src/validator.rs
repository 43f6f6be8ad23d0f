//! Semantic lint rules, run as a visitor over the generic crawler. All
//! findings land in the same logger the parser used, so one finalized report
//! mixes structural and semantic diagnostics in discovery order.

use qdl::log::{Code, Logger};
use qdl::node::{Node, Tag};

use crate::crawler::{self, CrawlEntry, CrawlError, CrawlSummary, CrawlVisitor, IMPLICIT_END};
use crate::encounters::{BASE_SET, EncounterRegistry};
use crate::registry::NodeRegistry;
use crate::rules;
use crate::settings::PlaytestSettings;

/// Lints each visited card. Findings are addressed to the card's line, the
/// same line the editor gutter marks for the card.
pub struct PlaytestVisitor<'a> {
    logger: &'a mut Logger,
    settings: &'a PlaytestSettings,
    encounters: &'a EncounterRegistry,
}

impl<'a> PlaytestVisitor<'a> {
    pub fn new(
        logger: &'a mut Logger,
        settings: &'a PlaytestSettings,
        encounters: &'a EncounterRegistry,
    ) -> Self {
        PlaytestVisitor {
            logger,
            settings,
            encounters,
        }
    }

    fn verify_combat_events(&mut self, node: &Node, line: usize) {
        let keys = node.visible_keys();
        let wins = keys.iter().filter(|k| **k == "win").count();
        let loses = keys.iter().filter(|k| **k == "lose").count();
        if wins != 1 || loses != 1 {
            self.logger.log(
                Code::CombatEventImbalance,
                line,
                format!(
                    "detected a state where this card has {wins} \"win\" and {loses} \"lose\" events; want 1 and 1"
                ),
            );
        }
    }

    fn verify_enemies(&mut self, node: &Node, line: usize) {
        for child in node.children.iter().filter(|c| c.tag == Tag::Enemy) {
            match self.encounters.get(&child.text) {
                None => {
                    if child.attr("tier").is_none() {
                        self.logger.log(
                            Code::EnemyMissingTier,
                            line,
                            format!(
                                "detected a non-standard enemy \"{}\" without an explicit tier override",
                                child.text
                            ),
                        );
                    }
                }
                Some(encounter) if encounter.content_set != BASE_SET => {
                    if !self.settings.is_enabled(&encounter.content_set) {
                        self.logger.log(
                            Code::ContentSetDisabled,
                            line,
                            format!(
                                "detected a {set} enemy ({name}) but this quest does not enable the {set} content set",
                                set = encounter.content_set,
                                name = child.text,
                            ),
                        );
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn verify_choice_count(&mut self, node: &Node, line: usize) {
        let choices = node.children.iter().filter(|c| c.tag == Tag::Choice).count();
        if choices > 0 && node.visible_keys().is_empty() {
            self.logger.log(
                Code::RoleplayNoActiveChoices,
                line,
                "detected a state where this card has 0 active choices",
            );
        }
    }

    fn verify_instructions(&mut self, node: &Node, line: usize) {
        for child in node.children.iter().filter(|c| c.tag == Tag::Instruction) {
            for (code, message) in rules::check_phrasing(&child.text) {
                self.logger.log(code, line, message);
            }
        }
    }

    /// Only direct card content is checked; text nested inside a choice has
    /// its own formatting rules.
    fn verify_art(&mut self, node: &Node, line: usize) {
        for child in &node.children {
            if child.tag == Tag::Choice {
                continue;
            }
            for token in rules::inline_art_tokens(&child.text) {
                self.logger.log(
                    Code::ArtInline,
                    line,
                    format!("[art:{token}] should be on its own line"),
                );
            }
        }
    }
}

impl CrawlVisitor for PlaytestVisitor<'_> {
    fn on_node(&mut self, entry: &CrawlEntry<'_>, _key: &str, line: usize) {
        let node = entry.node;
        match node.tag {
            Tag::Combat => {
                self.verify_combat_events(node, line);
                self.verify_enemies(node, line);
            }
            Tag::Roleplay => {
                self.verify_choice_count(node, line);
                self.verify_instructions(node, line);
                self.verify_art(node, line);
            }
            _ => {}
        }
    }
}

/// Crawl with validation, then promote every implicit end into the log, one
/// error per originating line.
pub fn crawl_with_log<'d>(
    start: Option<&'d Node>,
    registry: &NodeRegistry<'d>,
    settings: &PlaytestSettings,
    encounters: &EncounterRegistry,
    logger: &mut Logger,
) -> Result<CrawlSummary, CrawlError> {
    let (summary, stats) = {
        let mut visitor = PlaytestVisitor::new(logger, settings, encounters);
        crawler::crawl(start, registry, &mut visitor)?
    };
    for &line in stats.lines(IMPLICIT_END) {
        logger.log(
            Code::ImplicitEnd,
            line,
            "an action on this card leads nowhere (invalid goto id or no **end**)",
        );
    }
    Ok(summary)
}
