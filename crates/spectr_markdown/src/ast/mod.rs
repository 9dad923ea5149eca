mod builder;
mod hash;
mod node;
mod serialize;

pub use builder::{NodeBuilder, NodeError};
pub use node::{
    Code, CodeBlock, DeltaType, Descendants, Keyword, Link, LinkDef, List, ListItem, Node,
    NodeBody, NodeKind, Requirement, Scenario, Section, Wikilink,
};
