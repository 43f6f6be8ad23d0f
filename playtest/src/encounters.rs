use std::collections::HashMap;

use serde::Deserialize;

/// The implicit content set every quest may draw on.
pub const BASE_SET: &str = "base";

/// Reference data for one known enemy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Encounter {
    /// Content set the enemy ships with.
    #[serde(default = "default_set")]
    pub content_set: String,
    pub tier: u32,
}

fn default_set() -> String {
    BASE_SET.to_string()
}

/// Injected lookup table of known enemies, keyed by lowercase name. The
/// validator treats this as opaque reference data; a custom table can be
/// deserialized from TOML and swapped in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct EncounterRegistry {
    entries: HashMap<String, Encounter>,
}

impl EncounterRegistry {
    pub fn new() -> Self {
        EncounterRegistry::default()
    }

    pub fn insert(&mut self, name: &str, encounter: Encounter) {
        self.entries.insert(name.to_lowercase(), encounter);
    }

    /// Case-insensitive lookup by enemy name.
    pub fn get(&self, name: &str) -> Option<&Encounter> {
        self.entries.get(&name.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The registry shipped with the tool: the base bestiary plus the two
    /// expansion sets.
    pub fn builtin() -> Self {
        let mut registry = EncounterRegistry::new();
        for (name, tier) in [
            ("giant rat", 1),
            ("wild boar", 1),
            ("bandit", 1),
            ("brigand", 2),
            ("skeleton swordsman", 2),
            ("veteran mercenary", 3),
            ("lich", 4),
            ("archdemon", 5),
        ] {
            registry.insert(
                name,
                Encounter {
                    content_set: BASE_SET.to_string(),
                    tier,
                },
            );
        }
        for (name, tier) in [("harrowed mare", 2), ("specter", 3), ("the watcher", 5)] {
            registry.insert(
                name,
                Encounter {
                    content_set: "horror".to_string(),
                    tier,
                },
            );
        }
        for (name, tier) in [("sentry drone", 2), ("rogue automaton", 4)] {
            registry.insert(
                name,
                Encounter {
                    content_set: "future".to_string(),
                    tier,
                },
            );
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = EncounterRegistry::builtin();
        assert_eq!(registry.get("Giant Rat"), registry.get("giant rat"));
        assert!(registry.get("Giant Rat").is_some());
    }

    #[test]
    fn builtin_spans_content_sets() {
        let registry = EncounterRegistry::builtin();
        assert_eq!(registry.get("bandit").map(|e| e.content_set.as_str()), Some(BASE_SET));
        assert_eq!(
            registry.get("specter").map(|e| e.content_set.as_str()),
            Some("horror")
        );
    }
}
