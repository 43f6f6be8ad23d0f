use pretty_assertions::assert_eq;
use qdl::log::Code;
use qdl::node::Tag;
use qdl::parser::{ParseOutput, QdlParser};
use qdl::render::{Renderer, XmlRenderer};

fn parse(source: &str) -> ParseOutput {
    QdlParser::new(source, 0).parse()
}

const MILL: &str = "\
# The Old Mill

summary: A short trip.

_Setting Out_ (#start)

* Take the road (#rest)

* Stay home

  **end**

_Rest_ (#rest)

Gain 2 health.

**end**
";

#[test]
fn empty_input_reports_missing_header() {
    let output = parse("");
    let messages = output.log.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].code, Code::HeaderMissing);
    assert_eq!(messages[0].line, 0);
    assert_eq!(output.document.root.tag, Tag::Quest);
}

#[test]
fn non_heading_start_still_parses_the_content() {
    let output = parse("_Lost_\n\nNothing here.\n");
    let messages = output.log.messages();
    assert_eq!(messages[0].code, Code::HeaderMissing);
    assert_eq!(messages[0].line, 1);

    let root = &output.document.root;
    assert_eq!(root.children.len(), 1);
    let card = &root.children[0];
    assert_eq!(card.tag, Tag::Roleplay);
    assert_eq!(card.attr("title"), Some("Lost"));
    assert_eq!(card.children[0].tag, Tag::Instruction);
    assert_eq!(card.children[0].text, "Nothing here.");
}

#[test]
fn quest_metadata_lands_on_the_root() {
    let output = parse("# Q\n\nsummary: A trip.\nauthor: M. Finch\n");
    assert!(output.log.is_empty());
    let root = &output.document.root;
    assert_eq!(root.text, "Q");
    assert_eq!(root.attr("summary"), Some("A trip."));
    assert_eq!(root.attr("author"), Some("M. Finch"));
    assert!(root.children.is_empty());
}

#[test]
fn unknown_keys_are_stray_content_not_metadata() {
    let output = parse("# Q\n\nflavor: salty\n");
    let messages = output.log.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].code, Code::StrayContent);
    assert_eq!(messages[0].line, 3);
    assert_eq!(output.document.root.children[0].tag, Tag::Instruction);
}

#[test]
fn cards_choices_and_triggers_nest() {
    let output = parse(MILL);
    assert!(output.log.is_empty());

    let root = &output.document.root;
    assert_eq!(root.text, "The Old Mill");
    assert_eq!(root.children.len(), 2);

    let setting_out = &root.children[0];
    assert_eq!(setting_out.tag, Tag::Roleplay);
    assert_eq!(setting_out.attr("id"), Some("start"));
    assert_eq!(setting_out.attr("title"), Some("Setting Out"));
    assert_eq!(setting_out.children.len(), 2);

    let road = &setting_out.children[0];
    assert_eq!(road.tag, Tag::Choice);
    assert_eq!(road.text, "Take the road");
    assert_eq!(road.target.as_deref(), Some("rest"));

    let home = &setting_out.children[1];
    assert_eq!(home.text, "Stay home");
    assert_eq!(home.target, None);
    assert_eq!(home.children[0].tag, Tag::Trigger);

    let rest = &root.children[1];
    assert_eq!(rest.attr("id"), Some("rest"));
    assert_eq!(rest.children[0].tag, Tag::Instruction);
    assert_eq!(rest.children[1].tag, Tag::Trigger);
}

#[test]
fn combat_card_collects_enemies_and_events() {
    let output = parse(
        "# Q\n\n_combat_\n\n- Bandit\n- Dust Wraith {\"tier\": 2}\n\n* on win\n\n  **end**\n\n* on lose\n\n  **goto home**\n",
    );
    assert!(output.log.is_empty());

    let combat = &output.document.root.children[0];
    assert_eq!(combat.tag, Tag::Combat);
    assert_eq!(combat.children.len(), 4);

    assert_eq!(combat.children[0].tag, Tag::Enemy);
    assert_eq!(combat.children[0].text, "Bandit");
    assert_eq!(combat.children[1].text, "Dust Wraith");
    assert_eq!(combat.children[1].attr("tier"), Some("2"));

    let win = &combat.children[2];
    assert_eq!(win.tag, Tag::Win);
    assert_eq!(win.children[0].target, None);

    let lose = &combat.children[3];
    assert_eq!(lose.tag, Tag::Lose);
    assert_eq!(lose.children[0].target.as_deref(), Some("home"));
}

#[test]
fn bad_enemy_overrides_are_a_malformed_block() {
    let output = parse("# Q\n\n_combat_\n\n- Rat {tier: oops}\n");
    let messages = output.log.messages();
    assert_eq!(messages[0].code, Code::MalformedBlock);
    assert_eq!(messages[0].line, 5);
    // the enemy itself survives, without overrides
    let combat = &output.document.root.children[0];
    assert_eq!(combat.children[0].text, "Rat");
    assert_eq!(combat.children[0].attr("tier"), None);
}

#[test]
fn node_at_line_returns_the_innermost_span() {
    let output = parse(MILL);
    let doc = &output.document;

    let at_choice = doc.node_at_line(7).unwrap();
    assert_eq!(at_choice.tag, Tag::Choice);
    assert_eq!(at_choice.text, "Take the road");

    let at_trigger = doc.node_at_line(11).unwrap();
    assert_eq!(at_trigger.tag, Tag::Trigger);

    let at_card = doc.node_at_line(6).unwrap();
    assert_eq!(at_card.attr("id"), Some("start"));
}

#[test]
fn xml_render_mirrors_the_tree() {
    let output = parse("# Q\n\n_Door_ (#door)\n\n* Open it (#door)\n");
    let xml = XmlRenderer.render(&output.document);
    let expected = "\
<quest title=\"Q\" line=\"1\">
  <roleplay id=\"door\" title=\"Door\" line=\"3\">
    <choice text=\"Open it\" goto=\"door\" line=\"5\"/>
  </roleplay>
</quest>
";
    assert_eq!(xml, expected);
}
