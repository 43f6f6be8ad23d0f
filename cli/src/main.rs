mod test_runner;

use std::ops::Range;
use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use playtest::{EncounterRegistry, PlaytestSettings};
use qdl::log::LogMessage;
use qdl::node::Node;
use qdl::render::{Renderer, XmlRenderer};

#[derive(Parser)]
#[command(name = "quest", version, about = "QDL quest compiler and playtest linter")]
struct Cli {
    /// Disable colored diagnostic output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and lint a quest, printing diagnostics
    Check(CheckArgs),

    /// Parse a quest and print its XML document
    Render(RenderArgs),

    /// Run .test.md fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct CheckArgs {
    /// QDL source file
    file: String,

    /// TOML file with playtest settings (enabled content sets)
    #[arg(long)]
    settings: Option<String>,

    /// TOML file with a custom encounter registry
    #[arg(long)]
    encounters: Option<String>,

    /// Print the card outline after checking
    #[arg(long)]
    outline: bool,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// QDL source file
    file: String,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Check(args) => do_check(args, cli.no_color),
        Command::Render(args) => do_render(args),
        Command::Test(args) => {
            let path = Path::new(&args.path);
            if args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, &args.category);
            process::exit(exit_code);
        }
    }
}

fn do_check(args: CheckArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let source = read_or_exit(&args.file);
    let settings = match &args.settings {
        Some(path) => parse_toml_or_exit::<PlaytestSettings>(path),
        None => PlaytestSettings::default(),
    };
    let encounters = match &args.encounters {
        Some(path) => parse_toml_or_exit::<EncounterRegistry>(path),
        None => EncounterRegistry::builtin(),
    };

    let report = playtest::run(&source, &settings, &encounters);

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    for message in report.messages.error.iter().chain(&report.messages.warning) {
        emit_message(&writer, &config, &files, file_id, &source, message);
    }

    if args.outline {
        print_outline(&report.document.root, 0);
    }

    eprintln!(
        "checked {}: {} cards visited, {} errors, {} warnings",
        args.file,
        report.summary.visited,
        report.messages.error.len(),
        report.messages.warning.len(),
    );
    if !report.messages.error.is_empty() {
        process::exit(1);
    }
}

fn do_render(args: RenderArgs) {
    let source = read_or_exit(&args.file);
    let output = qdl::parser::QdlParser::new(source, 0).parse();
    // Best-effort: render whatever document came out, errors and all.
    print!("{}", XmlRenderer.render(&output.document));
}

fn emit_message(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    file_id: usize,
    source: &str,
    message: &LogMessage,
) {
    let diagnostic = message.to_diagnostic(file_id, line_span(source, message.line));
    let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
}

/// Byte span of a 1-based source line; line 0 addresses the whole document
/// and maps to an empty span at the start.
fn line_span(source: &str, line: usize) -> Range<usize> {
    if line == 0 {
        return 0..0;
    }
    let mut offset = 0;
    for (idx, segment) in source.split_inclusive('\n').enumerate() {
        if idx + 1 == line {
            let end = offset + segment.trim_end_matches(['\n', '\r']).len();
            return offset..end;
        }
        offset += segment.len();
    }
    source.len()..source.len()
}

fn print_outline(node: &Node, depth: usize) {
    let pad = "  ".repeat(depth);
    let label = match node.attr("title") {
        Some(title) if !title.is_empty() => format!("{} ({})", node.tag, title),
        _ if !node.text.is_empty() => format!("{} ({})", node.tag, node.text),
        _ => node.tag.to_string(),
    };
    println!("{pad}L{} {label}", node.line);
    for child in node.children.iter().filter(|c| !c.children.is_empty() || c.is_card()) {
        print_outline(child, depth + 1);
    }
}

fn read_or_exit(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: cannot read '{path}': {e}");
            process::exit(1);
        }
    }
}

fn parse_toml_or_exit<T: serde::de::DeserializeOwned>(path: &str) -> T {
    let text = read_or_exit(path);
    match toml::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("error: cannot parse '{path}': {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::line_span;

    #[test]
    fn line_span_covers_the_line_without_newline() {
        let source = "# Quest\n\n_Card_\n";
        assert_eq!(line_span(source, 1), 0..7);
        assert_eq!(line_span(source, 3), 9..15);
        assert_eq!(line_span(source, 0), 0..0);
        assert_eq!(line_span(source, 99), source.len()..source.len());
    }
}
