use thiserror::Error;

use super::hash::compute_node_hash;
use super::node::{Node, NodeBody};
use crate::syntax::{SourceText, TextPointer, TextSpan};

/// A validation failure while constructing a node. These indicate
/// programmer error at the construction site, not malformed input; the
/// parser only ever builds nodes whose spans it has already established.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("node span is inverted: {start}..{end}")]
    InvertedSpan { start: usize, end: usize },
    #[error("node span {start}..{end} escapes the source buffer of length {len}")]
    SpanOutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },
    #[error("child span {child_start}..{child_end} escapes parent span {start}..{end}")]
    ChildOutOfBounds {
        start: usize,
        end: usize,
        child_start: usize,
        child_end: usize,
    },
    #[error("section level must be within 1..=6, got {0}")]
    InvalidSectionLevel(u8),
}

/// Validated construction of immutable AST nodes. The builder collects the
/// node's payload, span, and children, checks the structural invariants,
/// and computes the content hash when finishing.
pub struct NodeBuilder {
    body: NodeBody,
    source: SourceText,
    span: TextSpan,
    children: Vec<Node>,
}

impl NodeBuilder {
    pub fn new(body: NodeBody, source: SourceText) -> Self {
        Self {
            body,
            source,
            span: 0..0,
            children: Vec::new(),
        }
    }

    pub fn span(mut self, span: TextSpan) -> Self {
        self.span = span;
        self
    }

    pub fn children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn append_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Validate and produce the node. Children must lie within the parent
    /// span; a Section level must be 1 through 6.
    pub fn build(self) -> Result<Node, NodeError> {
        let TextSpan { start, end } = self.span;
        if start > end {
            return Err(NodeError::InvertedSpan { start, end });
        }
        if end > self.source.len() {
            return Err(NodeError::SpanOutOfBounds {
                start,
                end,
                len: self.source.len(),
            });
        }
        for child in &self.children {
            if child.start() < start || child.end() > end {
                return Err(NodeError::ChildOutOfBounds {
                    start,
                    end,
                    child_start: child.start(),
                    child_end: child.end(),
                });
            }
        }
        if let NodeBody::Section(section) = &self.body {
            if !(1..=6).contains(&section.level) {
                return Err(NodeError::InvalidSectionLevel(section.level));
            }
        }

        let text = TextPointer::from_span(self.source, start..end);
        let hash = compute_node_hash(&self.body, &text, &self.children);
        Ok(Node::from_parts(
            self.body,
            text,
            hash,
            self.children.into_boxed_slice(),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::node::{NodeKind, Section};
    use crate::syntax::SourceText;

    fn source() -> SourceText {
        SourceText::from("# Title\n\nbody text here\n")
    }

    fn text_node(source: &SourceText, span: TextSpan) -> Node {
        NodeBuilder::new(NodeBody::Text, source.clone())
            .span(span)
            .build()
            .unwrap()
    }

    #[test]
    fn builds_a_document_with_children() {
        let source = source();
        let child = text_node(&source, 9..23);
        let node = NodeBuilder::new(NodeBody::Document, source.clone())
            .span(0..source.len())
            .children(vec![child])
            .build()
            .unwrap();
        assert_eq!(node.kind(), NodeKind::Document);
        assert_eq!(node.children().len(), 1);
    }

    #[test]
    fn rejects_inverted_spans() {
        let result = NodeBuilder::new(NodeBody::Text, source()).span(5..2).build();
        assert_eq!(
            result.unwrap_err(),
            NodeError::InvertedSpan { start: 5, end: 2 }
        );
    }

    #[test]
    fn rejects_escaping_children() {
        let source = source();
        let child = text_node(&source, 9..23);
        let result = NodeBuilder::new(NodeBody::Paragraph, source)
            .span(0..10)
            .children(vec![child])
            .build();
        assert!(matches!(result, Err(NodeError::ChildOutOfBounds { .. })));
    }

    #[test]
    fn rejects_bad_section_levels() {
        for level in [0u8, 7] {
            let result = NodeBuilder::new(
                NodeBody::Section(Section {
                    level,
                    title: TextPointer::empty_from(source()),
                    delta: Default::default(),
                }),
                source(),
            )
            .span(0..7)
            .build();
            assert_eq!(result.unwrap_err(), NodeError::InvalidSectionLevel(level));
        }
    }

    #[test]
    fn equal_content_hashes_equally() {
        let source = source();
        let a = text_node(&source, 9..23);
        let b = text_node(&source, 9..23);
        assert_eq!(a.hash(), b.hash());
        assert!(a.deep_equal(&b));
    }

    #[test]
    fn differing_content_changes_the_hash() {
        let source = source();
        let a = text_node(&source, 9..22);
        let b = text_node(&source, 9..23);
        assert_ne!(a.hash(), b.hash());
        assert!(!a.deep_equal(&b));
    }
}
