//! Tests for the Spectr extensions layered over the CommonMark subset:
//! requirement and scenario headers, delta sections, keyword bullets, and
//! wikilinks.


use harness::{all_of_kind, child_kinds, first_of_kind, parse_clean, text_of};
use spectr_markdown::{parse, DeltaType, Keyword, NodeKind, Severity};

mod requirements {
    use super::*;

    #[test]
    fn requirement_and_scenario_with_keyword_bullets() {
        // End-to-end scenario: a requirement holding a scenario holding
        // WHEN/THEN bullets.
        let root =
            parse_clean("### Requirement: Auth\n\n#### Scenario: Login\n\n- **WHEN** x\n- **THEN** y\n");
        let requirements = all_of_kind(&root, NodeKind::Requirement);
        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements[0].name(), Some("Auth"));

        let scenarios = all_of_kind(&requirements[0], NodeKind::Scenario);
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].name(), Some("Login"));

        let lists = all_of_kind(&scenarios[0], NodeKind::List);
        assert_eq!(lists.len(), 1);
        let items = lists[0].children();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_list_item().unwrap().keyword, Keyword::When);
        assert_eq!(items[1].as_list_item().unwrap().keyword, Keyword::Then);
    }

    #[test]
    fn requirement_name_is_trimmed() {
        let root = parse_clean("### Requirement:   Spaced Name   \n");
        let requirement = first_of_kind(&root, NodeKind::Requirement);
        assert_eq!(requirement.name(), Some("Spaced Name"));
    }

    #[test]
    fn nameless_requirement_degrades_to_a_section() {
        let root = parse_clean("### Requirement:\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::Section]);
        assert_eq!(root.children()[0].as_section().unwrap().level, 3);
    }

    #[test]
    fn requirement_marker_only_applies_at_level_three() {
        let root = parse_clean("## Requirement: Wrong Level\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::Section]);
    }

    #[test]
    fn scenario_outside_requirement_is_still_a_scenario() {
        let root = parse_clean("## Plain\n\n#### Scenario: Orphan\n");
        let section = &root.children()[0];
        let scenarios = all_of_kind(section, NodeKind::Scenario);
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].name(), Some("Orphan"));
    }

    #[test]
    fn requirement_owns_blocks_until_next_same_level_header() {
        let root = parse_clean(
            "### Requirement: First\n\ntext\n\n### Requirement: Second\n",
        );
        let requirements = all_of_kind(&root, NodeKind::Requirement);
        assert_eq!(requirements.len(), 2);
        assert_eq!(child_kinds(&requirements[0]), vec![NodeKind::Paragraph]);
        assert!(requirements[1].children().is_empty());
    }
}

mod delta_sections {
    use super::*;

    #[test]
    fn added_section_contains_requirements() {
        // End-to-end scenario: delta section wrapping a requirement.
        let root = parse_clean("## ADDED Requirements\n\n### Requirement: New\n");
        let section = &root.children()[0];
        let data = section.as_section().unwrap();
        assert_eq!(data.level, 2);
        assert_eq!(data.delta, DeltaType::Added);
        let requirements = all_of_kind(section, NodeKind::Requirement);
        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements[0].name(), Some("New"));
    }

    #[test]
    fn all_four_delta_types_are_recognised() {
        for (title, delta) in [
            ("ADDED", DeltaType::Added),
            ("MODIFIED", DeltaType::Modified),
            ("REMOVED", DeltaType::Removed),
            ("RENAMED", DeltaType::Renamed),
        ] {
            let source = format!("## {title} Requirements\n");
            let root = parse_clean(&source);
            let section = first_of_kind(&root, NodeKind::Section);
            assert_eq!(section.as_section().unwrap().delta, delta, "{title}");
        }
    }

    #[test]
    fn deviations_fall_back_to_plain_sections() {
        for title in [
            "Added Requirements",
            "ADDED Requirement",
            "ADDED  Requirements",
            "ADDED Requirements extra",
        ] {
            let source = format!("## {title}\n");
            let root = parse_clean(&source);
            let section = first_of_kind(&root, NodeKind::Section);
            assert_eq!(
                section.as_section().unwrap().delta,
                DeltaType::None,
                "{title}"
            );
        }
    }

    #[test]
    fn delta_marker_only_applies_at_level_two() {
        let root = parse_clean("# ADDED Requirements\n");
        let section = first_of_kind(&root, NodeKind::Section);
        assert_eq!(section.as_section().unwrap().delta, DeltaType::None);
    }
}

mod keyword_bullets {
    use super::*;

    #[test]
    fn all_keywords_are_recognised() {
        let root = parse_clean("- **WHEN** a\n- **THEN** b\n- **AND** c\n- **GIVEN** d\n");
        let keywords: Vec<Keyword> = all_of_kind(&root, NodeKind::ListItem)
            .iter()
            .map(|item| item.as_list_item().unwrap().keyword)
            .collect();
        assert_eq!(
            keywords,
            vec![Keyword::When, Keyword::Then, Keyword::And, Keyword::Given]
        );
    }

    #[test]
    fn keyword_must_be_anchored_at_item_start() {
        let root = parse_clean("- prefix **WHEN** x\n");
        let item = first_of_kind(&root, NodeKind::ListItem);
        assert_eq!(item.as_list_item().unwrap().keyword, Keyword::None);
    }

    #[test]
    fn keyword_after_checkbox_still_counts() {
        let root = parse_clean("- [x] **WHEN** done\n");
        let item = first_of_kind(&root, NodeKind::ListItem);
        let data = item.as_list_item().unwrap();
        assert_eq!(data.checked, Some(true));
        assert_eq!(data.keyword, Keyword::When);
    }

    #[test]
    fn unknown_uppercase_words_are_not_keywords() {
        let root = parse_clean("- **MAYBE** x\n");
        let item = first_of_kind(&root, NodeKind::ListItem);
        assert_eq!(item.as_list_item().unwrap().keyword, Keyword::None);
        // The strong node itself is still there.
        assert_eq!(item.children()[0].kind(), NodeKind::Strong);
    }
}

mod wikilinks {
    use super::*;

    #[test]
    fn wikilink_between_text() {
        // End-to-end scenario: text, wikilink with anchor and display, text.
        let root = parse_clean("See [[validation#Requirement: Auth|the auth spec]].");
        let paragraph = &root.children()[0];
        assert_eq!(
            child_kinds(paragraph),
            vec![NodeKind::Text, NodeKind::Wikilink, NodeKind::Text]
        );
        assert_eq!(text_of(&paragraph.children()[0]), "See ");
        let wikilink = paragraph.children()[1].as_wikilink().unwrap();
        assert_eq!(&*wikilink.target, "validation");
        assert_eq!(wikilink.anchor.as_deref(), Some("Requirement: Auth"));
        assert_eq!(wikilink.display.as_deref(), Some("the auth spec"));
        assert_eq!(text_of(&paragraph.children()[2]), ".");
    }

    #[test]
    fn bare_target() {
        let root = parse_clean("[[notes]]\n");
        let wikilink = first_of_kind(&root, NodeKind::Wikilink);
        let data = wikilink.as_wikilink().unwrap();
        assert_eq!(&*data.target, "notes");
        assert_eq!(data.display, None);
        assert_eq!(data.anchor, None);
    }

    #[test]
    fn target_with_display() {
        let root = parse_clean("[[notes|my notes]]\n");
        let data = first_of_kind(&root, NodeKind::Wikilink);
        let data = data.as_wikilink().unwrap();
        assert_eq!(&*data.target, "notes");
        assert_eq!(data.display.as_deref(), Some("my notes"));
    }

    #[test]
    fn target_with_anchor() {
        let root = parse_clean("[[notes#section]]\n");
        let data = first_of_kind(&root, NodeKind::Wikilink);
        let data = data.as_wikilink().unwrap();
        assert_eq!(&*data.target, "notes");
        assert_eq!(data.anchor.as_deref(), Some("section"));
    }

    #[test]
    fn anchor_in_display_side_applies_to_display() {
        let root = parse_clean("[[notes|label#part]]\n");
        let data = first_of_kind(&root, NodeKind::Wikilink);
        let data = data.as_wikilink().unwrap();
        assert_eq!(&*data.target, "notes");
        assert_eq!(data.display.as_deref(), Some("label"));
        assert_eq!(data.anchor.as_deref(), Some("part"));
    }

    #[test]
    fn empty_display_after_pipe_is_preserved() {
        let root = parse_clean("[[notes|]]\n");
        let data = first_of_kind(&root, NodeKind::Wikilink);
        let data = data.as_wikilink().unwrap();
        assert_eq!(data.display.as_deref(), Some(""));
    }

    #[test]
    fn empty_target_is_an_error_and_demotes_to_text() {
        let result = parse("[[|label]]\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].severity, Severity::Warning);
        let paragraph = &result.root.children()[0];
        assert_eq!(child_kinds(paragraph), vec![NodeKind::Text]);
        assert_eq!(text_of(&paragraph.children()[0]), "[[|label]]");
    }

    #[test]
    fn unclosed_wikilink_is_text() {
        let root = parse_clean("[[never closed\n");
        let paragraph = &root.children()[0];
        assert_eq!(child_kinds(paragraph), vec![NodeKind::Text]);
    }
}
