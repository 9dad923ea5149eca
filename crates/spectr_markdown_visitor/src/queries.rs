use spectr_markdown::{Node, NodeKind};

use crate::visitor::{walk, VisitControl};

/// All nodes matching the predicate, in pre-order.
pub fn find<P>(root: &Node, predicate: P) -> Vec<Node>
where
    P: Fn(&Node) -> bool,
{
    let mut matches = Vec::new();
    walk(root, |node| {
        if predicate(node) {
            matches.push(node.clone());
        }
        VisitControl::Continue
    });
    matches
}

/// The first matching node in pre-order, short-circuiting the walk.
pub fn find_first<P>(root: &Node, predicate: P) -> Option<Node>
where
    P: Fn(&Node) -> bool,
{
    let mut found = None;
    walk(root, |node| {
        if predicate(node) {
            found = Some(node.clone());
            VisitControl::Stop
        } else {
            VisitControl::Continue
        }
    });
    found
}

/// The number of matching nodes, without collecting them.
pub fn count<P>(root: &Node, predicate: P) -> usize
where
    P: Fn(&Node) -> bool,
{
    let mut total = 0;
    walk(root, |node| {
        if predicate(node) {
            total += 1;
        }
        VisitControl::Continue
    });
    total
}

/// Whether any node matches, short-circuiting on the first hit.
pub fn exists<P>(root: &Node, predicate: P) -> bool
where
    P: Fn(&Node) -> bool,
{
    find_first(root, predicate).is_some()
}

/// All nodes of the given kind, in pre-order.
pub fn find_by_kind(root: &Node, kind: NodeKind) -> Vec<Node> {
    find(root, |node| node.kind() == kind)
}

/// The first node of the given kind in pre-order.
pub fn find_first_by_kind(root: &Node, kind: NodeKind) -> Option<Node> {
    find_first(root, |node| node.kind() == kind)
}
