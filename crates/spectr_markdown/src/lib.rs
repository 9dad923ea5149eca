pub use ast::{
    Code, CodeBlock, DeltaType, Descendants, Keyword, Link, LinkDef, List, ListItem, Node,
    NodeBody, NodeBuilder, NodeError, NodeKind, Requirement, Scenario, Section, Wikilink,
};
pub use incremental::{
    affected_block_region, parse_incremental, EditRegion, IncrementalParseResult,
    IncrementalParseState, ReuseStats, FULL_REPARSE_THRESHOLD,
};
pub use lexer::{LexContext, LexError, Lexer};
pub use line_index::{LineIndex, Position};
pub use parser::{parse, ParseError, ParseResult, Severity, MAX_PARSE_ERRORS};
pub use position_index::PositionIndex;
pub use syntax::{SourceText, TextPointer, TextSize, TextSpan, Token, TokenKind};

pub mod ast;
mod byte_lookup;
mod incremental;
mod lexer;
mod line_index;
mod parser;
mod position_index;
mod syntax;

/// Tokenize a source buffer completely, returning every token (EOF
/// included) alongside the recoverable lexing errors that were found.
pub fn tokenize(source: impl Into<SourceText>) -> (Vec<Token>, Vec<LexError>) {
    Lexer::new(source).all_with_errors()
}
