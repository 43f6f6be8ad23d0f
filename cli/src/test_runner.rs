//! Data-driven fixture runner for `.test.md` files: TOML frontmatter between
//! `---` fences describing the expected diagnostics, followed by QDL source.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use playtest::{EncounterRegistry, PlaytestSettings};
use qdl::log::LogMessage;
use qdl::render::{Renderer, XmlRenderer};

#[derive(Debug, Deserialize)]
pub struct ExpectedMessage {
    /// The stable diagnostic code string, e.g. "implicit-end".
    pub code: String,

    /// Substring that must appear in the message text.
    #[serde(default)]
    pub contains: Option<String>,

    /// 1-based source line the message must be addressed to.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Human-readable test description.
    pub description: Option<String>,

    /// Playtest settings for this fixture (enabled content sets).
    pub settings: PlaytestSettings,

    /// Expected errors, in discovery order. Counts must match exactly.
    pub expect_error: Vec<ExpectedMessage>,

    /// Expected warnings, in discovery order. Counts must match exactly.
    pub expect_warning: Vec<ExpectedMessage>,

    /// Expected XML rendering of the parsed document, compared verbatim.
    pub expect_xml: Option<String>,
}

/// Parse a `.test.md` file into its TOML config and QDL source.
pub fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }
    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    // The closing fence may follow the opening one immediately (empty
    // frontmatter), which a "\n---" search would miss.
    let (frontmatter, rest) = if let Some(rest) = after_open.strip_prefix("---") {
        ("", rest)
    } else {
        let close_pos = after_open
            .find("\n---")
            .ok_or("missing closing --- frontmatter delimiter")?;
        (&after_open[..close_pos], &after_open[close_pos + 4..])
    };
    let source = rest.strip_prefix('\n').unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(frontmatter).map_err(|e| format!("bad frontmatter: {e}"))?;
    Ok((config, source))
}

/// Run one fixture; returns the list of failure descriptions (empty = pass).
pub fn run_one(content: &str) -> Result<Vec<String>, String> {
    let (config, source) = parse_test_file(content)?;
    let encounters = EncounterRegistry::builtin();
    let report = playtest::run(source, &config.settings, &encounters);

    let mut failures = Vec::new();
    check_bucket("error", &config.expect_error, &report.messages.error, &mut failures);
    check_bucket(
        "warning",
        &config.expect_warning,
        &report.messages.warning,
        &mut failures,
    );
    if let Some(expected) = &config.expect_xml {
        let rendered = XmlRenderer.render(&report.document);
        if rendered != *expected {
            failures.push(format!(
                "rendered XML does not match:\n--- expected\n{expected}\n--- got\n{rendered}"
            ));
        }
    }
    Ok(failures)
}

fn check_bucket(
    bucket: &str,
    expected: &[ExpectedMessage],
    actual: &[LogMessage],
    failures: &mut Vec<String>,
) {
    if expected.len() != actual.len() {
        let listing = actual
            .iter()
            .map(|m| format!("  {m}"))
            .collect::<Vec<_>>()
            .join("\n");
        failures.push(format!(
            "expected {} {bucket}(s), got {}:\n{listing}",
            expected.len(),
            actual.len()
        ));
        return;
    }
    for (want, got) in expected.iter().zip(actual) {
        if want.code != got.code.as_str() {
            failures.push(format!(
                "{bucket} code mismatch: expected {}, got {}",
                want.code,
                got.code.as_str()
            ));
        }
        if let Some(line) = want.line {
            if line != got.line {
                failures.push(format!(
                    "{bucket} line mismatch for {}: expected L{line}, got L{}",
                    want.code, got.line
                ));
            }
        }
        if let Some(substr) = &want.contains {
            if !got.message.contains(substr.as_str()) {
                failures.push(format!(
                    "{bucket} message for {} does not contain \"{substr}\": \"{}\"",
                    want.code, got.message
                ));
            }
        }
    }
}

/// Run every fixture under `path` (a file or a directory tree), optionally
/// filtered by category (immediate subfolder name). Returns the failure
/// count, suitable as a process exit code.
pub fn run_tests(path: &Path, categories: &[String]) -> i32 {
    let fixtures = collect_fixtures(path);
    if fixtures.is_empty() {
        eprintln!("no .test.md fixtures under {}", path.display());
        return 1;
    }

    let mut passed = 0;
    let mut failed = 0;
    for fixture in fixtures {
        if !categories.is_empty() {
            let category = category_of(path, &fixture);
            if !categories.iter().any(|c| Some(c.as_str()) == category.as_deref()) {
                continue;
            }
        }

        let content = match std::fs::read_to_string(&fixture) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("FAIL {}: cannot read: {e}", fixture.display());
                failed += 1;
                continue;
            }
        };
        match run_one(&content) {
            Ok(failures) if failures.is_empty() => {
                println!("ok   {}", fixture.display());
                passed += 1;
            }
            Ok(failures) => {
                eprintln!("FAIL {}", fixture.display());
                for failure in failures {
                    eprintln!("     {failure}");
                }
                failed += 1;
            }
            Err(e) => {
                eprintln!("FAIL {}: {e}", fixture.display());
                failed += 1;
            }
        }
    }

    println!("{passed} passed, {failed} failed");
    failed
}

pub fn list_categories(path: &Path) {
    let mut categories: Vec<String> = collect_fixtures(path)
        .iter()
        .filter_map(|f| category_of(path, f))
        .collect();
    categories.sort();
    categories.dedup();
    for category in categories {
        println!("{category}");
    }
}

fn category_of(root: &Path, fixture: &Path) -> Option<String> {
    let relative = fixture.strip_prefix(root).ok()?;
    let first = relative.components().next()?;
    let name = first.as_os_str().to_string_lossy();
    if name.ends_with(".test.md") {
        None
    } else {
        Some(name.into_owned())
    }
}

fn collect_fixtures(path: &Path) -> Vec<PathBuf> {
    let mut fixtures = Vec::new();
    if path.is_file() {
        fixtures.push(path.to_path_buf());
        return fixtures;
    }
    let mut stack = vec![path.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let entry_path = entry.path();
            if entry_path.is_dir() {
                stack.push(entry_path);
            } else if entry_path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().ends_with(".test.md"))
            {
                fixtures.push(entry_path);
            }
        }
    }
    fixtures.sort();
    fixtures
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = "\
---
description = \"combat imbalance is reported\"

[[expect_error]]
code = \"combat-event-imbalance\"
line = 3
contains = \"want 1 and 1\"
---
# Quest

_combat_

- Giant Rat

* on win

  **end**
";

    #[test]
    fn frontmatter_and_source_split() {
        let (config, source) = parse_test_file(FIXTURE).expect("fixture parses");
        assert_eq!(config.expect_error.len(), 1);
        assert_eq!(
            config.description.as_deref(),
            Some("combat imbalance is reported")
        );
        assert!(source.starts_with("# Quest"));
    }

    #[test]
    fn fixture_passes_against_its_own_expectations() {
        let failures = run_one(FIXTURE).expect("fixture runs");
        assert_eq!(failures, Vec::<String>::new());
    }

    #[test]
    fn empty_frontmatter_parses() {
        let (config, source) =
            parse_test_file("---\n---\n# Quest\n").expect("empty frontmatter parses");
        assert!(config.expect_error.is_empty());
        assert!(config.expect_warning.is_empty());
        assert_eq!(source, "# Quest\n");
    }

    #[test]
    fn run_tests_counts_failures() {
        // Expects no diagnostics, but the quest has a dangling branch.
        let content = "---\n---\n# Quest\n\n_Card_\n\n* Go\n";
        let failures = run_one(content).expect("fixture runs");
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("expected 0 error(s), got 1"));

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.test.md");
        let mut file = std::fs::File::create(&path).expect("create fixture");
        write!(file, "{content}").expect("write fixture");
        drop(file);
        assert_eq!(run_tests(dir.path(), &[]), 1);
    }

    #[test]
    fn expected_xml_is_compared() {
        let fixture = "---\nexpect_xml = '''\n<quest title=\"Q\" line=\"1\">\n  <trigger line=\"3\">end</trigger>\n</quest>\n'''\n---\n# Q\n\n**end**\n";
        let failures = run_one(fixture).expect("fixture runs");
        assert_eq!(failures, Vec::<String>::new());

        let mismatched = fixture.replace("<trigger line=\"3\">end</trigger>", "<trigger/>");
        let failures = run_one(&mismatched).expect("fixture runs");
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("rendered XML does not match"));
    }
}
