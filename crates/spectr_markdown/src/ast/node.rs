use std::borrow::Cow;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde::Serialize;

use crate::syntax::{TextPointer, TextSpan};

/// The discriminant of an AST node, used as the leading byte of the content
/// hash and as the selector for typed queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum NodeKind {
    Document = 0,
    Section,
    Requirement,
    Scenario,
    Paragraph,
    List,
    ListItem,
    CodeBlock,
    Blockquote,
    Text,
    Strong,
    Emphasis,
    Strikethrough,
    Code,
    Link,
    LinkDef,
    Wikilink,
}

impl NodeKind {
    /// Returns true for the kinds that open a named region of the document
    /// (plain sections, requirements, and scenarios).
    pub fn is_section_like(self) -> bool {
        matches!(
            self,
            NodeKind::Section | NodeKind::Requirement | NodeKind::Scenario
        )
    }
}

/// The change classification carried by a delta section header
/// (`## ADDED Requirements` and friends).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum DeltaType {
    #[default]
    None,
    Added,
    Modified,
    Removed,
    Renamed,
}

impl DeltaType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeltaType::None => "",
            DeltaType::Added => "ADDED",
            DeltaType::Modified => "MODIFIED",
            DeltaType::Removed => "REMOVED",
            DeltaType::Renamed => "RENAMED",
        }
    }
}

/// The step keyword of a scenario bullet, detected from a leading
/// `**KEYWORD**` run in the list item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Keyword {
    #[default]
    None,
    When,
    Then,
    And,
    Given,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::None => "",
            Keyword::When => "WHEN",
            Keyword::Then => "THEN",
            Keyword::And => "AND",
            Keyword::Given => "GIVEN",
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Keyword {
        match bytes {
            b"WHEN" => Keyword::When,
            b"THEN" => Keyword::Then,
            b"AND" => Keyword::And,
            b"GIVEN" => Keyword::Given,
            _ => Keyword::None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub level: u8,
    pub title: TextPointer,
    pub delta: DeltaType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Requirement {
    pub name: Box<str>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scenario {
    pub name: Box<str>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct List {
    pub ordered: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    /// None when the item has no checkbox, otherwise the checked state.
    pub checked: Option<bool>,
    pub keyword: Keyword,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CodeBlock {
    pub language: TextPointer,
    pub content: TextPointer,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Code {
    pub content: TextPointer,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub url: TextPointer,
    pub title: Option<TextPointer>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkDef {
    pub url: TextPointer,
    pub title: Option<TextPointer>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Wikilink {
    pub target: Box<str>,
    pub display: Option<Box<str>>,
    pub anchor: Option<Box<str>>,
}

/// The tagged payload of a node: one variant per kind, carrying the fields
/// specific to that kind.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeBody {
    Document,
    Section(Section),
    Requirement(Requirement),
    Scenario(Scenario),
    Paragraph,
    List(List),
    ListItem(ListItem),
    CodeBlock(CodeBlock),
    Blockquote,
    Text,
    Strong,
    Emphasis,
    Strikethrough,
    Code(Code),
    Link(Link),
    LinkDef(LinkDef),
    Wikilink(Wikilink),
}

impl NodeBody {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeBody::Document => NodeKind::Document,
            NodeBody::Section(_) => NodeKind::Section,
            NodeBody::Requirement(_) => NodeKind::Requirement,
            NodeBody::Scenario(_) => NodeKind::Scenario,
            NodeBody::Paragraph => NodeKind::Paragraph,
            NodeBody::List(_) => NodeKind::List,
            NodeBody::ListItem(_) => NodeKind::ListItem,
            NodeBody::CodeBlock(_) => NodeKind::CodeBlock,
            NodeBody::Blockquote => NodeKind::Blockquote,
            NodeBody::Text => NodeKind::Text,
            NodeBody::Strong => NodeKind::Strong,
            NodeBody::Emphasis => NodeKind::Emphasis,
            NodeBody::Strikethrough => NodeKind::Strikethrough,
            NodeBody::Code(_) => NodeKind::Code,
            NodeBody::Link(_) => NodeKind::Link,
            NodeBody::LinkDef(_) => NodeKind::LinkDef,
            NodeBody::Wikilink(_) => NodeKind::Wikilink,
        }
    }
}

struct NodeData {
    body: NodeBody,
    text: TextPointer,
    hash: u64,
    children: Box<[Node]>,
}

/// An immutable node of the syntax tree. Nodes are reference-counted, so
/// cloning one is cheap and shares the subtree, and a finished tree can be
/// read from any thread; any transformation builds a replacement node
/// through [`crate::ast::NodeBuilder`] instead of mutating.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    pub(crate) fn from_parts(
        body: NodeBody,
        text: TextPointer,
        hash: u64,
        children: Box<[Node]>,
    ) -> Self {
        Self(Arc::new(NodeData {
            body,
            text,
            hash,
            children,
        }))
    }

    pub fn kind(&self) -> NodeKind {
        self.0.body.kind()
    }

    pub fn body(&self) -> &NodeBody {
        &self.0.body
    }

    pub fn span(&self) -> TextSpan {
        self.0.text.range()
    }

    pub fn start(&self) -> usize {
        self.0.text.start()
    }

    pub fn end(&self) -> usize {
        self.0.text.end()
    }

    /// The content hash of this node: a function of its kind, its childrens'
    /// hashes, its source bytes, and its kind-specific payload. Two nodes
    /// with equal hashes have identical observable content with overwhelming
    /// probability; [`Node::deep_equal`] confirms exactly.
    pub fn hash(&self) -> u64 {
        self.0.hash
    }

    /// The bytes this node spans in the source buffer.
    pub fn source_view(&self) -> &[u8] {
        self.0.text.as_bytes()
    }

    pub fn text_pointer(&self) -> &TextPointer {
        &self.0.text
    }

    pub fn text_lossy(&self) -> Cow<str> {
        self.0.text.to_str_lossy()
    }

    pub fn children(&self) -> &[Node] {
        &self.0.children
    }

    //#region Typed casts

    pub fn as_section(&self) -> Option<&Section> {
        match self.body() {
            NodeBody::Section(section) => Some(section),
            _ => None,
        }
    }

    pub fn as_requirement(&self) -> Option<&Requirement> {
        match self.body() {
            NodeBody::Requirement(requirement) => Some(requirement),
            _ => None,
        }
    }

    pub fn as_scenario(&self) -> Option<&Scenario> {
        match self.body() {
            NodeBody::Scenario(scenario) => Some(scenario),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self.body() {
            NodeBody::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_item(&self) -> Option<&ListItem> {
        match self.body() {
            NodeBody::ListItem(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_code_block(&self) -> Option<&CodeBlock> {
        match self.body() {
            NodeBody::CodeBlock(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_code(&self) -> Option<&Code> {
        match self.body() {
            NodeBody::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self.body() {
            NodeBody::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_link_def(&self) -> Option<&LinkDef> {
        match self.body() {
            NodeBody::LinkDef(def) => Some(def),
            _ => None,
        }
    }

    pub fn as_wikilink(&self) -> Option<&Wikilink> {
        match self.body() {
            NodeBody::Wikilink(wikilink) => Some(wikilink),
            _ => None,
        }
    }

    /// The name carried by a Requirement or Scenario node.
    pub fn name(&self) -> Option<&str> {
        match self.body() {
            NodeBody::Requirement(requirement) => Some(&requirement.name),
            NodeBody::Scenario(scenario) => Some(&scenario.name),
            _ => None,
        }
    }
    //#endregion

    /// Pre-order iterator over this node and every descendant.
    pub fn descendants(&self) -> Descendants {
        Descendants {
            stack: vec![self.clone()],
        }
    }

    /// Structural equality: same kind, source bytes, payload, and children,
    /// compared recursively. An unequal hash is used as a fast reject; equal
    /// hashes are never trusted on their own.
    pub fn deep_equal(&self, other: &Node) -> bool {
        if self.kind() != other.kind() || self.hash() != other.hash() {
            return false;
        }
        if self.source_view() != other.source_view() {
            return false;
        }
        if self.children().len() != other.children().len() {
            return false;
        }
        if !body_content_eq(self.body(), other.body()) {
            return false;
        }
        self.children()
            .iter()
            .zip(other.children())
            .all(|(a, b)| a.deep_equal(b))
    }
}

/// Compare node payloads by content, so trees over different source buffers
/// still compare equal when their observable fields match.
fn body_content_eq(a: &NodeBody, b: &NodeBody) -> bool {
    fn pointer_eq(a: &TextPointer, b: &TextPointer) -> bool {
        a.content_eq(b)
    }
    fn optional_pointer_eq(a: &Option<TextPointer>, b: &Option<TextPointer>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => pointer_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    match (a, b) {
        (NodeBody::Section(a), NodeBody::Section(b)) => {
            a.level == b.level && a.delta == b.delta && pointer_eq(&a.title, &b.title)
        }
        (NodeBody::Requirement(a), NodeBody::Requirement(b)) => a.name == b.name,
        (NodeBody::Scenario(a), NodeBody::Scenario(b)) => a.name == b.name,
        (NodeBody::List(a), NodeBody::List(b)) => a.ordered == b.ordered,
        (NodeBody::ListItem(a), NodeBody::ListItem(b)) => {
            a.checked == b.checked && a.keyword == b.keyword
        }
        (NodeBody::CodeBlock(a), NodeBody::CodeBlock(b)) => {
            pointer_eq(&a.language, &b.language) && pointer_eq(&a.content, &b.content)
        }
        (NodeBody::Code(a), NodeBody::Code(b)) => pointer_eq(&a.content, &b.content),
        (NodeBody::Link(a), NodeBody::Link(b)) => {
            pointer_eq(&a.url, &b.url) && optional_pointer_eq(&a.title, &b.title)
        }
        (NodeBody::LinkDef(a), NodeBody::LinkDef(b)) => {
            pointer_eq(&a.url, &b.url) && optional_pointer_eq(&a.title, &b.title)
        }
        (NodeBody::Wikilink(a), NodeBody::Wikilink(b)) => {
            a.target == b.target && a.display == b.display && a.anchor == b.anchor
        }
        (a, b) => a.kind() == b.kind(),
    }
}

pub struct Descendants {
    stack: Vec<Node>,
}

impl Iterator for Descendants {
    type Item = Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev().cloned());
        Some(node)
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{}..{}", self.kind(), self.start(), self.end())?;
        if let Some(name) = self.name() {
            write!(f, " {name:?}")?;
        }
        if !self.children().is_empty() {
            f.debug_list().entries(self.children()).finish()?;
        }
        Ok(())
    }
}
