use once_cell::sync::OnceCell;

use crate::ast::Node;

/// One entry of the interval tree: a node, its span, and its depth in the
/// tree (used to order results from outermost to innermost).
struct IntervalEntry {
    start: usize,
    end: usize,
    depth: u32,
    node: Node,
}

/// An augmented interval-tree node: entries are keyed by span start, and
/// each subtree records the maximum span end below it so whole branches can
/// be pruned during queries.
struct IntervalNode {
    entry: IntervalEntry,
    max_end: usize,
    left: Option<Box<IntervalNode>>,
    right: Option<Box<IntervalNode>>,
}

/// O(log n) point and range queries over the spans of every node in a
/// tree. The index is built lazily on the first query and holds cheap
/// clones of the nodes it indexes.
pub struct PositionIndex {
    root: Node,
    tree: OnceCell<Option<Box<IntervalNode>>>,
}

impl PositionIndex {
    pub fn new(root: Node) -> Self {
        Self {
            root,
            tree: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    fn tree(&self) -> Option<&IntervalNode> {
        self.tree
            .get_or_init(|| {
                let mut entries = Vec::new();
                collect_entries(&self.root, 0, &mut entries);
                entries.sort_by_key(|entry| (entry.start, entry.depth));
                build_balanced(entries)
            })
            .as_deref()
    }

    /// The innermost node whose span contains `offset` (start-inclusive,
    /// end-exclusive).
    pub fn node_at(&self, offset: usize) -> Option<Node> {
        self.nodes_at(offset).pop()
    }

    /// Every node whose span contains `offset`, ordered from outermost to
    /// innermost.
    pub fn nodes_at(&self, offset: usize) -> Vec<Node> {
        let mut hits: Vec<(usize, u32, Node)> = Vec::new();
        if let Some(tree) = self.tree() {
            collect_containing(tree, offset, &mut hits);
        }
        // Wider spans first; depth breaks ties between equal spans.
        hits.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        hits.into_iter().map(|(_, _, node)| node).collect()
    }

    /// Every node whose span overlaps `[start, end)`, in document order.
    pub fn nodes_in_range(&self, start: usize, end: usize) -> Vec<Node> {
        let mut hits: Vec<(usize, u32, Node)> = Vec::new();
        if let Some(tree) = self.tree() {
            collect_overlapping(tree, start, end, &mut hits);
        }
        hits.sort_by_key(|(start, depth, _)| (*start, *depth));
        hits.into_iter().map(|(_, _, node)| node).collect()
    }

    /// The nearest enclosing Section, Requirement, or Scenario at `offset`.
    pub fn enclosing_section(&self, offset: usize) -> Option<Node> {
        self.nodes_at(offset)
            .into_iter()
            .rev()
            .find(|node| node.kind().is_section_like())
    }
}

fn collect_entries(node: &Node, depth: u32, entries: &mut Vec<IntervalEntry>) {
    entries.push(IntervalEntry {
        start: node.start(),
        end: node.end(),
        depth,
        node: node.clone(),
    });
    for child in node.children() {
        collect_entries(child, depth + 1, entries);
    }
}

/// Build a balanced tree from entries sorted by start: the middle entry
/// becomes the root, recursively.
fn build_balanced(mut entries: Vec<IntervalEntry>) -> Option<Box<IntervalNode>> {
    if entries.is_empty() {
        return None;
    }
    let mid = entries.len() / 2;
    let right_entries = entries.split_off(mid + 1);
    let entry = entries.pop().expect("mid entry exists by construction");
    let left = build_balanced(entries);
    let right = build_balanced(right_entries);

    let mut max_end = entry.end;
    if let Some(left) = &left {
        max_end = max_end.max(left.max_end);
    }
    if let Some(right) = &right {
        max_end = max_end.max(right.max_end);
    }
    Some(Box::new(IntervalNode {
        entry,
        max_end,
        left,
        right,
    }))
}

fn collect_containing(tree: &IntervalNode, offset: usize, hits: &mut Vec<(usize, u32, Node)>) {
    // Nothing in this subtree reaches past the offset.
    if offset >= tree.max_end {
        return;
    }
    if let Some(left) = &tree.left {
        collect_containing(left, offset, hits);
    }
    let entry = &tree.entry;
    if entry.start <= offset && offset < entry.end {
        hits.push((entry.end - entry.start, entry.depth, entry.node.clone()));
    }
    // Entries to the right all start later; they cannot contain the offset
    // once their starts pass it.
    if entry.start <= offset {
        if let Some(right) = &tree.right {
            collect_containing(right, offset, hits);
        }
    }
}

fn collect_overlapping(
    tree: &IntervalNode,
    start: usize,
    end: usize,
    hits: &mut Vec<(usize, u32, Node)>,
) {
    if start >= tree.max_end {
        return;
    }
    if let Some(left) = &tree.left {
        collect_overlapping(left, start, end, hits);
    }
    let entry = &tree.entry;
    if entry.start < end && start < entry.end {
        hits.push((entry.start, entry.depth, entry.node.clone()));
    }
    if entry.start < end {
        if let Some(right) = &tree.right {
            collect_overlapping(right, start, end, hits);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::NodeKind;
    use crate::parser::parse;

    fn index_for(source: &str) -> PositionIndex {
        PositionIndex::new(parse(source).root)
    }

    #[test]
    fn node_at_returns_the_innermost_span() {
        // "# H\n\npara **bold**\n": bold starts at offset 10.
        let index = index_for("# H\n\npara **bold**\n");
        let node = index.node_at(13).expect("offset inside bold text");
        assert_eq!(node.kind(), NodeKind::Text);
        let all = index.nodes_at(13);
        let kinds: Vec<NodeKind> = all.iter().map(Node::kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Document,
                NodeKind::Section,
                NodeKind::Paragraph,
                NodeKind::Strong,
                NodeKind::Text
            ]
        );
    }

    #[test]
    fn nodes_in_range_finds_overlaps() {
        let index = index_for("first\n\nsecond\n");
        let hits = index.nodes_in_range(0, 6);
        assert!(hits
            .iter()
            .any(|node| node.kind() == NodeKind::Paragraph && node.start() == 0));
        assert!(!hits
            .iter()
            .any(|node| node.kind() == NodeKind::Paragraph && node.start() == 7));
    }

    #[test]
    fn enclosing_section_prefers_the_nearest() {
        let source = "## Outer\n\n### Requirement: R\n\nbody\n";
        let index = index_for(source);
        let offset = source.find("body").unwrap();
        let section = index.enclosing_section(offset).expect("inside requirement");
        assert_eq!(section.kind(), NodeKind::Requirement);
    }

    #[test]
    fn out_of_tree_offsets_return_nothing() {
        let index = index_for("a\n");
        assert!(index.node_at(500).is_none());
    }
}
