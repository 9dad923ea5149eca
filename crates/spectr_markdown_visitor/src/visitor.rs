use spectr_markdown::Node;

/// What a visitor wants to happen after seeing a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitControl {
    /// Descend into the node's children, then continue with its siblings.
    Continue,
    /// Skip the node's children and continue with its siblings.
    SkipChildren,
    /// Terminate the entire walk immediately.
    Stop,
}

/// Walk a tree in pre-order, calling the visitor for every node reached.
/// The traversal is deterministic (document order) and read-only.
pub fn walk<F>(root: &Node, mut visitor: F)
where
    F: FnMut(&Node) -> VisitControl,
{
    walk_node(root, &mut visitor);
}

/// Returns false once the walk has been stopped.
fn walk_node<F>(node: &Node, visitor: &mut F) -> bool
where
    F: FnMut(&Node) -> VisitControl,
{
    match visitor(node) {
        VisitControl::Stop => false,
        VisitControl::SkipChildren => true,
        VisitControl::Continue => node
            .children()
            .iter()
            .all(|child| walk_node(child, visitor)),
    }
}
