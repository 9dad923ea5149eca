//! Block and inline structure tests over the CommonMark subset: headings,
//! lists, checkboxes, code blocks, blockquotes, links, and emphasis.


use harness::{all_of_kind, child_kinds, first_of_kind, parse_clean, text_of};
use spectr_markdown::{parse, NodeKind, Severity};

mod documents {
    use super::*;

    #[test]
    fn empty_input_is_an_empty_document() {
        let root = parse_clean("");
        assert_eq!(root.kind(), NodeKind::Document);
        assert!(root.children().is_empty());
        assert_eq!(root.span(), 0..0);
    }

    #[test]
    fn single_newline_is_an_empty_document() {
        let root = parse_clean("\n");
        assert!(root.children().is_empty());
        assert_eq!(root.span(), 0..1);
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let root = parse_clean("first paragraph\ncontinues here\n\nsecond paragraph\n");
        assert_eq!(
            child_kinds(&root),
            vec![NodeKind::Paragraph, NodeKind::Paragraph]
        );
        assert_eq!(text_of(&root.children()[0]), "first paragraph\ncontinues here");
        assert_eq!(text_of(&root.children()[1]), "second paragraph");
    }

    #[test]
    fn adjacent_text_coalesces_into_one_node() {
        let root = parse_clean("one two: three.4\n");
        let paragraph = &root.children()[0];
        assert_eq!(child_kinds(paragraph), vec![NodeKind::Text]);
        assert_eq!(text_of(&paragraph.children()[0]), "one two: three.4");
    }
}

mod headings {
    use super::*;

    #[test]
    fn checkbox_list_under_heading() {
        // End-to-end scenario: "# H" owning an unordered checkbox list.
        let root = parse_clean("# H\n\n- [x] Done\n- [ ] Todo\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::Section]);
        let section = &root.children()[0];
        let data = section.as_section().unwrap();
        assert_eq!(data.level, 1);
        assert_eq!(data.title.to_str_lossy(), "H");
        assert_eq!(child_kinds(section), vec![NodeKind::List]);

        let list = &section.children()[0];
        assert!(!list.as_list().unwrap().ordered);
        let items = list.children();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_list_item().unwrap().checked, Some(true));
        assert_eq!(text_of(&items[0].children()[0]), "Done");
        assert_eq!(items[1].as_list_item().unwrap().checked, Some(false));
        assert_eq!(text_of(&items[1].children()[0]), "Todo");
    }

    #[test]
    fn sections_nest_until_same_or_higher_level() {
        let root = parse_clean("# A\n\n## B\n\npara\n\n## C\n\n# D\n");
        let kinds = child_kinds(&root);
        assert_eq!(kinds, vec![NodeKind::Section, NodeKind::Section]);
        let a = &root.children()[0];
        assert_eq!(child_kinds(a), vec![NodeKind::Section, NodeKind::Section]);
        let b = &a.children()[0];
        assert_eq!(child_kinds(b), vec![NodeKind::Paragraph]);
    }

    #[test]
    fn seven_hashes_are_a_paragraph() {
        let root = parse_clean("####### not a heading\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::Paragraph]);
    }

    #[test]
    fn hash_without_space_is_a_paragraph() {
        let root = parse_clean("#nospace\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::Paragraph]);
    }

    #[test]
    fn heading_title_is_trimmed() {
        let root = parse_clean("## Title with trailing   \n");
        let section = first_of_kind(&root, NodeKind::Section);
        assert_eq!(
            section.as_section().unwrap().title.to_str_lossy(),
            "Title with trailing"
        );
    }
}

mod lists {
    use super::*;

    #[test]
    fn ordered_lists_use_number_dot_markers() {
        let root = parse_clean("1. one\n2. two\n10. ten\n");
        let list = first_of_kind(&root, NodeKind::List);
        assert!(list.as_list().unwrap().ordered);
        assert_eq!(list.children().len(), 3);
    }

    #[test]
    fn nested_lists_attach_to_the_preceding_item() {
        let root = parse_clean("- outer\n  - inner one\n  - inner two\n- next\n");
        let list = first_of_kind(&root, NodeKind::List);
        assert_eq!(list.children().len(), 2);
        let outer = &list.children()[0];
        let kinds = child_kinds(outer);
        assert_eq!(kinds, vec![NodeKind::Text, NodeKind::List]);
        assert_eq!(outer.children()[1].children().len(), 2);
    }

    #[test]
    fn blank_line_then_list_line_continues_the_list() {
        let root = parse_clean("- one\n\n- two\n");
        let lists = all_of_kind(&root, NodeKind::List);
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].children().len(), 2);
    }

    #[test]
    fn blank_line_then_non_list_line_ends_the_list() {
        let root = parse_clean("- one\n\npara\n");
        assert_eq!(
            child_kinds(&root),
            vec![NodeKind::List, NodeKind::Paragraph]
        );
    }

    #[test]
    fn marker_without_space_is_not_a_list() {
        let root = parse_clean("-nodash\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::Paragraph]);
    }

    #[test]
    fn checkbox_needs_exactly_one_space() {
        let root = parse_clean("- [  ] not a checkbox\n");
        let item = first_of_kind(&root, NodeKind::ListItem);
        assert_eq!(item.as_list_item().unwrap().checked, None);
    }
}

mod code_blocks {
    use super::*;

    #[test]
    fn fenced_block_with_language() {
        // End-to-end scenario: one code block, no inner tokenisation.
        let root = parse_clean("```go\ncode\n```\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::CodeBlock]);
        let code = root.children()[0].as_code_block().unwrap();
        assert_eq!(code.language.to_str_lossy(), "go");
        assert_eq!(code.content.to_str_lossy(), "code\n");
    }

    #[test]
    fn delimiters_inside_fences_stay_literal() {
        let root = parse_clean("```\n# not a heading\n*not emphasis*\n```\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::CodeBlock]);
        let code = root.children()[0].as_code_block().unwrap();
        assert_eq!(
            code.content.to_str_lossy(),
            "# not a heading\n*not emphasis*\n"
        );
    }

    #[test]
    fn tilde_fences_work() {
        let root = parse_clean("~~~\ntext\n~~~\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::CodeBlock]);
    }

    #[test]
    fn closing_fence_must_be_at_least_as_long() {
        let root = parse_clean("````\n```\n````\n");
        let code = root.children()[0].as_code_block().unwrap();
        assert_eq!(code.content.to_str_lossy(), "```\n");
    }

    #[test]
    fn unclosed_fence_closes_at_eof_with_an_error() {
        let result = parse("```rust\nlet x = 1;\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].severity, Severity::Error);
        let code = result.root.children()[0].as_code_block().unwrap();
        assert_eq!(code.content.to_str_lossy(), "let x = 1;\n");
    }

    #[test]
    fn fence_opener_at_eof_is_recovered() {
        let result = parse("```");
        assert_eq!(result.root.children().len(), 1);
        assert_eq!(result.errors.len(), 1);
    }
}

mod blockquotes {
    use super::*;

    #[test]
    fn quoted_lines_form_nested_blocks() {
        let root = parse_clean("> quoted text\n> more of it\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::Blockquote]);
        let quote = &root.children()[0];
        assert_eq!(child_kinds(quote), vec![NodeKind::Paragraph]);
    }

    #[test]
    fn quote_ends_at_unprefixed_line() {
        let root = parse_clean("> quoted\n\nplain\n");
        assert_eq!(
            child_kinds(&root),
            vec![NodeKind::Blockquote, NodeKind::Paragraph]
        );
    }

    #[test]
    fn quotes_nest() {
        let root = parse_clean("> > inner\n");
        let outer = &root.children()[0];
        assert_eq!(child_kinds(outer), vec![NodeKind::Blockquote]);
    }

    #[test]
    fn rangle_without_space_is_a_paragraph() {
        let root = parse_clean(">nospace\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::Paragraph]);
    }
}

mod inline {
    use super::*;

    #[test]
    fn strong_emphasis_and_strikethrough() {
        let root = parse_clean("**strong** *em* _em_ ~~gone~~\n");
        let paragraph = &root.children()[0];
        let kinds = child_kinds(paragraph);
        assert_eq!(
            kinds,
            vec![
                NodeKind::Strong,
                NodeKind::Text,
                NodeKind::Emphasis,
                NodeKind::Text,
                NodeKind::Emphasis,
                NodeKind::Text,
                NodeKind::Strikethrough,
            ]
        );
    }

    #[test]
    fn triple_delimiters_nest_emphasis_in_strong() {
        let root = parse_clean("***both***\n");
        let paragraph = &root.children()[0];
        assert_eq!(paragraph.children().len(), 1);
        let outer = &paragraph.children()[0];
        // Two characters pair first (strong), the remaining one wraps it.
        assert_eq!(outer.kind(), NodeKind::Emphasis);
        assert_eq!(child_kinds(outer), vec![NodeKind::Strong]);
    }

    #[test]
    fn unmatched_delimiters_demote_to_text() {
        let root = parse_clean("a *b and ~~c\n");
        let paragraph = &root.children()[0];
        assert_eq!(child_kinds(paragraph), vec![NodeKind::Text]);
        assert_eq!(text_of(&paragraph.children()[0]), "a *b and ~~c");
    }

    #[test]
    fn single_tilde_is_never_strikethrough() {
        let root = parse_clean("~one~\n");
        let paragraph = &root.children()[0];
        assert_eq!(child_kinds(paragraph), vec![NodeKind::Text]);
    }

    #[test]
    fn code_span_protects_its_content() {
        let root = parse_clean("before `*raw*` after\n");
        let paragraph = &root.children()[0];
        assert_eq!(
            child_kinds(paragraph),
            vec![NodeKind::Text, NodeKind::Code, NodeKind::Text]
        );
        let code = paragraph.children()[1].as_code().unwrap();
        assert_eq!(code.content.to_str_lossy(), "*raw*");
    }

    #[test]
    fn double_backtick_code_span_may_contain_single_backticks() {
        let root = parse_clean("``a ` b``\n");
        let code = first_of_kind(&root, NodeKind::Code);
        assert_eq!(code.as_code().unwrap().content.to_str_lossy(), "a ` b");
    }

    #[test]
    fn unclosed_code_span_demotes_and_reparses_content() {
        let root = parse_clean("a `b **c**\n");
        let paragraph = &root.children()[0];
        // The backtick is literal, the strong still resolves.
        assert_eq!(
            child_kinds(paragraph),
            vec![NodeKind::Text, NodeKind::Strong]
        );
    }

    #[test]
    fn inline_link_with_title() {
        let root = parse_clean("see [docs](https://example.com \"the title\")\n");
        let link_node = first_of_kind(&root, NodeKind::Link);
        let link = link_node.as_link().unwrap();
        assert_eq!(link.url.to_str_lossy(), "https://example.com");
        assert_eq!(
            link.title.as_ref().unwrap().to_str_lossy(),
            "the title"
        );
        assert_eq!(text_of(&link_node.children()[0]), "docs");
    }

    #[test]
    fn link_url_punctuation_is_not_tokenised() {
        let root = parse_clean("[x](./a*b_c~d)\n");
        let link_node = first_of_kind(&root, NodeKind::Link);
        assert_eq!(link_node.as_link().unwrap().url.to_str_lossy(), "./a*b_c~d");
    }

    #[test]
    fn unclosed_link_reports_and_demotes() {
        let result = parse("a [text](nourl\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].severity, Severity::Warning);
        let paragraph = &result.root.children()[0];
        assert_eq!(child_kinds(paragraph), vec![NodeKind::Text]);
    }

    #[test]
    fn bracket_without_paren_is_text() {
        let root = parse_clean("an [aside] here\n");
        let paragraph = &root.children()[0];
        assert_eq!(child_kinds(paragraph), vec![NodeKind::Text]);
        assert_eq!(text_of(&paragraph.children()[0]), "an [aside] here");
    }
}

mod link_definitions {
    use super::*;

    #[test]
    fn definition_line_becomes_a_link_def() {
        let root = parse_clean("[spec]: https://example.com/spec \"Spec\"\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::LinkDef]);
        let def = root.children()[0].as_link_def().unwrap();
        assert_eq!(def.url.to_str_lossy(), "https://example.com/spec");
        assert_eq!(def.title.as_ref().unwrap().to_str_lossy(), "Spec");
    }

    #[test]
    fn definitions_are_collected_document_wide() {
        let result = parse("[a]: /a\n\npara\n\n[b]: /b\n");
        let defs = result.link_defs();
        assert_eq!(defs.len(), 2);
    }

    #[test]
    fn malformed_definition_is_a_paragraph() {
        let root = parse_clean("[label] no colon\n");
        assert_eq!(child_kinds(&root), vec![NodeKind::Paragraph]);
    }
}

mod line_endings {
    use super::*;

    #[test]
    fn crlf_and_cr_documents_parse_like_lf() {
        for source in ["# H\r\n\r\ntext\r\n", "# H\r\rtext\r", "# H\n\ntext\n"] {
            let root = parse_clean(source);
            assert_eq!(child_kinds(&root), vec![NodeKind::Section]);
            let section = &root.children()[0];
            assert_eq!(child_kinds(section), vec![NodeKind::Paragraph]);
        }
    }

    #[test]
    fn mixed_terminators_in_one_document() {
        let root = parse_clean("a\r\nb\nc\rd\n");
        let paragraph = &root.children()[0];
        assert_eq!(text_of(paragraph), "a\r\nb\nc\rd");
    }
}
