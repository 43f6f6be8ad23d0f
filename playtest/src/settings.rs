use std::collections::BTreeSet;

use serde::Deserialize;

use crate::encounters::BASE_SET;

/// Which optional content sets a playtest may draw on. Base content is
/// always available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlaytestSettings {
    pub content_sets: BTreeSet<String>,
}

impl PlaytestSettings {
    pub fn new() -> Self {
        PlaytestSettings::default()
    }

    pub fn enable(&mut self, set: &str) {
        self.content_sets.insert(set.to_string());
    }

    pub fn is_enabled(&self, set: &str) -> bool {
        set == BASE_SET || self.content_sets.contains(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_is_always_enabled() {
        let settings = PlaytestSettings::new();
        assert!(settings.is_enabled(BASE_SET));
        assert!(!settings.is_enabled("horror"));
    }

    #[test]
    fn enabling_a_set_sticks() {
        let mut settings = PlaytestSettings::new();
        settings.enable("horror");
        assert!(settings.is_enabled("horror"));
    }
}
