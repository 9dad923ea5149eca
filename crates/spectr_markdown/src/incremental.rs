use rustc_hash::FxHashSet;

use crate::ast::{Node, NodeKind};
use crate::line_index::LineIndex;
use crate::parser::{parse, ParseError};
use crate::syntax::{SourceText, TextSpan};

/// Above this fraction of changed bytes the reuse analysis is skipped
/// entirely and the document is reparsed from scratch.
pub const FULL_REPARSE_THRESHOLD: f64 = 0.20;

/// The minimal byte region touched by an edit, computed from the longest
/// common prefix and suffix of the two sources: `[start, old_end)` in the
/// old text corresponds to `[start, new_end)` in the new text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditRegion {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
}

impl EditRegion {
    /// Compute the edit region between two byte buffers, or None when they
    /// are identical. The common suffix never reaches back into the common
    /// prefix, so the region is well-formed even for overlapping edits.
    pub fn compute(old: &[u8], new: &[u8]) -> Option<EditRegion> {
        if old == new {
            return None;
        }
        let prefix = old
            .iter()
            .zip(new.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let max_suffix = old.len().min(new.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        Some(EditRegion {
            start: prefix,
            old_end: old.len() - suffix,
            new_end: new.len() - suffix,
        })
    }

    /// The fraction of the old source affected by the edit, taking the
    /// larger of the removed and inserted extents.
    pub fn change_ratio(&self, old_len: usize) -> f64 {
        let old_extent = self.old_end - self.start;
        let new_extent = self.new_end - self.start;
        old_extent.max(new_extent) as f64 / old_len.max(1) as f64
    }

    /// Returns true if a span in the old source lies entirely outside the
    /// edited region.
    pub fn is_outside(&self, span: &TextSpan) -> bool {
        span.end <= self.start || span.start >= self.old_end
    }
}

/// Counters from the subtree-reuse analysis. `reusable_nodes` counts the
/// maximal new-tree subtrees whose hashes match old subtrees untouched by
/// the edit; the analysis is informational and the returned tree is always
/// deep-equal to a full reparse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReuseStats {
    pub reusable_nodes: usize,
    pub total_nodes: usize,
}

pub struct IncrementalParseResult {
    pub root: Node,
    pub errors: Vec<ParseError>,
    pub reuse: ReuseStats,
}

/// Reparse an edited document. Observationally this is always identical to
/// `parse(new_source)`; when the edit is small enough, the old tree's
/// subtree hashes are used to measure how much of the new tree was
/// preserved across the edit.
pub fn parse_incremental(
    old_tree: Option<&Node>,
    old_source: impl Into<SourceText>,
    new_source: impl Into<SourceText>,
) -> IncrementalParseResult {
    let old_source: SourceText = old_source.into();
    let new_source: SourceText = new_source.into();

    let Some(old_tree) = old_tree else {
        return full_parse(new_source);
    };
    let Some(edit) = EditRegion::compute(old_source.as_bytes(), new_source.as_bytes()) else {
        // Byte-identical sources: the old tree is already the answer.
        return IncrementalParseResult {
            root: old_tree.clone(),
            errors: Vec::new(),
            reuse: ReuseStats {
                reusable_nodes: 1,
                total_nodes: count_nodes(old_tree),
            },
        };
    };

    if edit.change_ratio(old_source.len()) > FULL_REPARSE_THRESHOLD {
        return full_parse(new_source);
    }

    // Safe fallback: parse the new source fully, then measure which old
    // subtrees survived. Hash collisions are tolerable here because the
    // stats never influence the returned tree.
    let result = parse(new_source);
    let mut reusable_hashes = FxHashSet::default();
    collect_reusable_hashes(old_tree, &edit, &mut reusable_hashes);

    let mut reuse = ReuseStats {
        reusable_nodes: 0,
        total_nodes: count_nodes(&result.root),
    };
    count_reused(&result.root, &reusable_hashes, &mut reuse.reusable_nodes);

    IncrementalParseResult {
        root: result.root,
        errors: result.errors,
        reuse,
    }
}

fn full_parse(source: SourceText) -> IncrementalParseResult {
    let result = parse(source);
    let total_nodes = count_nodes(&result.root);
    IncrementalParseResult {
        root: result.root,
        errors: result.errors,
        reuse: ReuseStats {
            reusable_nodes: 0,
            total_nodes,
        },
    }
}

fn count_nodes(root: &Node) -> usize {
    root.descendants().count()
}

/// Record the hashes of the maximal old subtrees that the edit did not
/// touch. Children of an untouched subtree are untouched too, so recursion
/// stops at the first hit.
fn collect_reusable_hashes(node: &Node, edit: &EditRegion, hashes: &mut FxHashSet<u64>) {
    if edit.is_outside(&node.span()) {
        hashes.insert(node.hash());
        return;
    }
    for child in node.children() {
        collect_reusable_hashes(child, edit, hashes);
    }
}

fn count_reused(node: &Node, hashes: &FxHashSet<u64>, reused: &mut usize) {
    if hashes.contains(&node.hash()) {
        *reused += 1;
        return;
    }
    for child in node.children() {
        count_reused(child, hashes, reused);
    }
}

/// Parse state that may be carried across incremental calls to avoid
/// rederiving document-level information.
pub struct IncrementalParseState {
    pub link_defs: Vec<Node>,
    pub line_index: LineIndex,
    pub root_hash: u64,
}

impl IncrementalParseState {
    pub fn new(root: &Node, source: impl Into<SourceText>) -> Self {
        let source: SourceText = source.into();
        Self {
            link_defs: root
                .descendants()
                .filter(|node| node.kind() == NodeKind::LinkDef)
                .collect(),
            line_index: LineIndex::new(source),
            root_hash: root.hash(),
        }
    }

    /// Link definitions can be reused verbatim when none of them overlaps
    /// the edited region of the old source.
    pub fn can_reuse_link_defs(&self, edit: &EditRegion, old_tree: &Node) -> bool {
        old_tree
            .descendants()
            .filter(|node| node.kind() == NodeKind::LinkDef)
            .all(|node| edit.is_outside(&node.span()))
    }

    /// The line index survives any edit that neither removes nor inserts
    /// line terminator bytes; otherwise it must be rebuilt.
    pub fn can_reuse_line_index(&self, edit: &EditRegion, old: &[u8], new: &[u8]) -> bool {
        let removed = &old[edit.start..edit.old_end];
        let changed = |bytes: &[u8]| bytes.iter().any(|byte| matches!(byte, b'\n' | b'\r'));
        let inserted = &new[edit.start..edit.new_end];
        !changed(removed) && !changed(inserted)
    }

    /// Advance the state to a freshly parsed tree.
    pub fn update(&mut self, root: &Node, source: impl Into<SourceText>) {
        *self = IncrementalParseState::new(root, source);
    }
}

/// Expand an edit region outward to the nearest block boundaries in the
/// given source: a blank line, a line opening with a block starter (`#`,
/// `-`, `*`, `+`, `>`, backtick, `~`, or digits followed by `.`), or the
/// ends of the buffer. The result bounds the region a block-granular
/// incremental parser would need to reprocess.
pub fn affected_block_region(source: &[u8], edit: &EditRegion) -> TextSpan {
    let mut start = line_start_before(source, edit.start.min(source.len()));
    while start > 0 {
        let previous = line_start_before(source, start.saturating_sub(1));
        if is_block_boundary_line(source, previous) {
            start = previous;
            break;
        }
        start = previous;
        if start == 0 {
            break;
        }
    }

    let mut end = edit.old_end.min(source.len());
    loop {
        let next = match memchr::memchr2(b'\r', b'\n', &source[end..]) {
            Some(offset) => {
                let mut next = end + offset + 1;
                if source.get(next - 1) == Some(&b'\r') && source.get(next) == Some(&b'\n') {
                    next += 1;
                }
                next
            }
            None => {
                end = source.len();
                break;
            }
        };
        if next >= source.len() || is_block_boundary_line(source, next) {
            end = next;
            break;
        }
        end = next;
    }

    start..end
}

fn line_start_before(source: &[u8], offset: usize) -> usize {
    source[..offset]
        .iter()
        .rposition(|byte| matches!(byte, b'\n' | b'\r'))
        .map_or(0, |index| index + 1)
}

/// A line is a block boundary when it is blank or begins (after optional
/// indentation) with a block-starter character.
fn is_block_boundary_line(source: &[u8], line_start: usize) -> bool {
    let mut index = line_start;
    while index < source.len() && matches!(source[index], b' ' | b'\t') {
        index += 1;
    }
    match source.get(index) {
        None | Some(b'\n') | Some(b'\r') => true,
        Some(b'#') | Some(b'-') | Some(b'*') | Some(b'+') | Some(b'>') | Some(b'`')
        | Some(b'~') => true,
        Some(byte) if byte.is_ascii_digit() => {
            let mut digits = index;
            while digits < source.len() && source[digits].is_ascii_digit() {
                digits += 1;
            }
            source.get(digits) == Some(&b'.')
        }
        _ => false,
    }
}
