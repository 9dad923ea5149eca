//! Structural properties that must hold for every parse: span containment,
//! sibling ordering, hash behaviour, token coverage, and the error cap.


use harness::parse_clean;
use spectr_markdown::{parse, tokenize, LineIndex, Node, TokenKind, MAX_PARSE_ERRORS};

const SAMPLES: &[&str] = &[
    "",
    "\n",
    "plain paragraph\n",
    "# H\n\n- [x] Done\n- [ ] Todo\n",
    "### Requirement: Auth\n\n#### Scenario: Login\n\n- **WHEN** x\n- **THEN** y\n",
    "## ADDED Requirements\n\n### Requirement: New\n",
    "```go\ncode\n```\n",
    "> quote\n> more\n\npara **bold** *em* ~~strike~~ `code`\n",
    "See [[validation#Requirement: Auth|the auth spec]].\n",
    "[def]: /url \"title\"\n\n[link](/inline \"t\") and [[wiki]]\n",
    "1. one\n2. two\n   - nested\n",
    "a\r\nb\rc\nmixed line endings\r\n",
];

fn assert_spans_contained(node: &Node) {
    for child in node.children() {
        assert!(
            node.start() <= child.start() && child.end() <= node.end(),
            "child {:?} escapes parent {:?}",
            child.span(),
            node.span()
        );
        assert_spans_contained(child);
    }
}

fn assert_siblings_ordered(node: &Node) {
    for window in node.children().windows(2) {
        assert!(
            window[0].end() <= window[1].start(),
            "siblings overlap: {:?} then {:?}",
            window[0].span(),
            window[1].span()
        );
    }
    for child in node.children() {
        assert_siblings_ordered(child);
    }
}

#[test]
fn span_containment_holds_everywhere() {
    for source in SAMPLES {
        assert_spans_contained(&parse(*source).root);
    }
}

#[test]
fn sibling_spans_are_ordered_and_disjoint() {
    for source in SAMPLES {
        assert_siblings_ordered(&parse(*source).root);
    }
}

#[test]
fn independent_parses_hash_identically() {
    for source in SAMPLES {
        let first = parse(*source).root;
        let second = parse(*source).root;
        assert_eq!(first.hash(), second.hash(), "hash diverged for {source:?}");
        assert!(first.deep_equal(&second));
    }
}

#[test]
fn flipping_a_byte_changes_the_root_hash() {
    let source = "# Title\n\nsome body text\n";
    let base = parse(source).root;
    for index in 0..source.len() {
        let mut mutated = source.as_bytes().to_vec();
        mutated[index] = if mutated[index] == b'z' { b'y' } else { b'z' };
        let changed = parse(mutated.as_slice()).root;
        assert_ne!(
            base.hash(),
            changed.hash(),
            "flipping byte {index} did not change the root hash"
        );
    }
}

#[test]
fn deep_equal_implies_equal_hashes() {
    for source in SAMPLES {
        let a = parse(*source).root;
        let b = parse(*source).root;
        if a.deep_equal(&b) {
            assert_eq!(a.hash(), b.hash());
        }
    }
}

#[test]
fn token_streams_cover_every_byte_exactly_once() {
    for source in SAMPLES {
        let (tokens, _) = tokenize(*source);
        let mut position = 0;
        for token in &tokens {
            assert_eq!(
                token.start(),
                position,
                "gap or overlap before {token:?} in {source:?}"
            );
            position = token.end();
        }
        assert_eq!(position, source.len());
        let eof_count = tokens
            .iter()
            .filter(|token| token.kind() == TokenKind::EOF)
            .count();
        assert_eq!(eof_count, 1);
    }
}

#[test]
fn error_list_is_capped() {
    // Far more invalid bytes than the cap allows.
    let mut source = Vec::new();
    for _ in 0..(MAX_PARSE_ERRORS * 3) {
        source.extend_from_slice(&[b'a', 0xFF, b' ']);
    }
    let result = parse(source.as_slice());
    assert_eq!(result.errors.len(), MAX_PARSE_ERRORS);
    // The tree is still produced in full.
    assert!(!result.root.children().is_empty());
}

#[test]
fn invalid_byte_is_one_error_and_content_recovers() {
    let result = parse(&b"ok \xFF still ok\n\n# Heading\n"[..]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].offset, 3);
    let kinds: Vec<_> = result
        .root
        .children()
        .iter()
        .map(|child| child.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            spectr_markdown::NodeKind::Paragraph,
            spectr_markdown::NodeKind::Section
        ]
    );
}

#[test]
fn line_index_round_trips_for_parsed_sources() {
    for source in SAMPLES {
        let index = LineIndex::new(*source);
        for offset in 0..source.len() {
            let (line, column) = index.line_col(offset);
            assert_eq!(index.offset_at(line, column), Some(offset));
        }
    }
}

#[test]
fn reparsing_a_section_source_reproduces_its_shape() {
    let source = "## Outer\n\npara **bold**\n";
    let root = parse_clean(source);
    let section = &root.children()[0];
    // Reparse the section's own source view; the subtree shape matches,
    // modulo the outer span offsets.
    let inner = parse_clean(&section.text_lossy());
    let reparsed_section = &inner.children()[0];
    assert_eq!(reparsed_section.kind(), section.kind());
    assert_eq!(
        reparsed_section.children().len(),
        section.children().len()
    );
    assert_eq!(
        reparsed_section.end() - reparsed_section.start(),
        section.end() - section.start()
    );
}

#[test]
fn ten_thousand_line_documents_parse() {
    let mut source = String::new();
    for index in 0..2_500 {
        source.push_str(&format!("## Section {index}\n\nline one\nline two\n\n"));
    }
    assert!(LineIndex::new(source.as_str()).line_count() > 10_000);
    let result = parse(source.as_str());
    assert!(result.errors.is_empty());
    assert_eq!(result.root.children().len(), 2_500);
}
