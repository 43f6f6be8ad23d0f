//! Declarative instruction-phrasing rules. Each family pairs a broad matcher
//! that finds candidate phrases with a strict validator the phrase must pass;
//! adding a family never touches traversal code. Broad matching is
//! case-insensitive and enumerates every independent occurrence in a text.

use once_cell::sync::Lazy;
use regex::Regex;

use qdl::log::Code;

pub struct PhrasingRule {
    pub code: Code,
    pub broad: Regex,
    pub strict: Regex,
    /// Message template; `{}` receives the quoted offending phrase.
    pub message: &'static str,
}

pub static PHRASING_RULES: Lazy<Vec<PhrasingRule>> = Lazy::new(|| {
    vec![
        PhrasingRule {
            code: Code::InstructionPhrasing,
            broad: Regex::new(r"(?i)\w+ \w+ (?:health|hp)").expect("health matcher"),
            strict: Regex::new(r"(?:[gG]ain|[lL]ose) (?:all|\d+) health").expect("health validator"),
            message: "health-affecting instructions should follow the format \"Gain/Lose <number> health\", instead saw {}",
        },
        PhrasingRule {
            code: Code::InstructionPhrasing,
            broad: Regex::new(r"(?i)\w+ \w+ abili(?:ty|ties)").expect("ability matcher"),
            strict: Regex::new(
                r"(?:[lL]earn|[dD]iscard) (?:one|two|three|four|five|six|seven|eight|nine|ten) abili(?:ty|ties)",
            )
            .expect("ability validator"),
            message: "ability-affecting instructions should follow the format \"Learn/Discard <number> abilit(y/ies)\", instead saw {}",
        },
        PhrasingRule {
            code: Code::InstructionPhrasing,
            broad: Regex::new(r"(?i)\w*\s*\w*\s*\w+ \w+ loot").expect("loot matcher"),
            strict: Regex::new(
                r"(?:[dD]raw|[dD]iscard) (?:one|two|three|four|five|six|seven|eight|nine|ten) tier (?:I|II|III|IV|V) loot|discard \d+ loot",
            )
            .expect("loot validator"),
            message: "loot-affecting instructions should read \"Draw/Discard <number> tier <I-V> loot\", instead saw {}",
        },
    ]
});

/// Bare "player" phrasing; house style says "adventurer". Deliberately
/// case-sensitive: capitalized "Player" names a game term.
static PLAYER_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w*\s*player(?:s?)\s*\w*").expect("player matcher"));

/// Art markup tokens, e.g. `[art:dungeon_gate]`.
static ART_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[art:([A-Za-z0-9_-]+)\]").expect("art matcher"));

/// Apply every phrasing family to an instruction text. Returns one finding
/// per failing occurrence, plus at most one combined player-reference
/// finding listing every offending phrase.
pub fn check_phrasing(text: &str) -> Vec<(Code, String)> {
    let mut findings = Vec::new();

    for rule in PHRASING_RULES.iter() {
        for hit in rule.broad.find_iter(text) {
            if !rule.strict.is_match(hit.as_str()) {
                let quoted = format!("\"{}\"", hit.as_str());
                findings.push((rule.code, rule.message.replace("{}", &quoted)));
            }
        }
    }

    let offenders: Vec<String> = PLAYER_REFERENCE
        .find_iter(text)
        .map(|hit| format!("\"{}\"", hit.as_str().trim().replace('"', "'")))
        .collect();
    if !offenders.is_empty() {
        findings.push((
            Code::PlayerReference,
            format!(
                "prefer using \"adventurer\" over \"player\" (in {})",
                offenders.join(", ")
            ),
        ));
    }

    findings
}

/// Art tokens must sit alone on their line. Returns the names of tokens
/// found embedded inline.
pub fn inline_art_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for line in text.lines() {
        for caps in ART_TOKEN.captures_iter(line) {
            let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            if line.trim() != whole {
                tokens.push(caps[1].to_string());
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_health_phrasing_passes() {
        assert!(check_phrasing("Gain 2 health and rest.").is_empty());
        assert!(check_phrasing("Lose all health.").is_empty());
    }

    #[test]
    fn near_miss_health_phrasing_warns() {
        let findings = check_phrasing("gain 3 hp");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].0, Code::InstructionPhrasing);
        assert!(findings[0].1.contains("\"gain 3 hp\""));
    }

    #[test]
    fn every_occurrence_is_checked_independently() {
        let findings = check_phrasing("Take 2 health now, then earn 4 health later.");
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn ability_and_loot_families_fire() {
        let findings = check_phrasing("Gain 2 abilities. Draw 3 tier II loot.");
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn numeric_discard_loot_is_allowed() {
        assert!(check_phrasing("discard 2 loot").is_empty());
    }

    #[test]
    fn player_references_combine_into_one_finding() {
        let findings = check_phrasing("Each player stands; players cheer.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].0, Code::PlayerReference);
        assert!(findings[0].1.contains("player"));
        assert!(findings[0].1.contains(", "));
    }

    #[test]
    fn art_alone_on_line_is_fine() {
        assert!(inline_art_tokens("[art:gate]").is_empty());
        assert!(inline_art_tokens("Look up.\n[art:gate]\nGo on.").is_empty());
    }

    #[test]
    fn inline_art_is_reported_by_name() {
        assert_eq!(inline_art_tokens("The gate [art:gate] looms."), vec!["gate"]);
    }
}
