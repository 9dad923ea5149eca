use spectr_markdown::{Node, NodeKind};

use crate::queries::exists;

/// A boxed node predicate, for the variadic combinators.
pub type NodePredicate = Box<dyn Fn(&Node) -> bool>;

pub fn and<P, Q>(p: P, q: Q) -> impl Fn(&Node) -> bool
where
    P: Fn(&Node) -> bool,
    Q: Fn(&Node) -> bool,
{
    move |node| p(node) && q(node)
}

pub fn or<P, Q>(p: P, q: Q) -> impl Fn(&Node) -> bool
where
    P: Fn(&Node) -> bool,
    Q: Fn(&Node) -> bool,
{
    move |node| p(node) || q(node)
}

pub fn not<P>(p: P) -> impl Fn(&Node) -> bool
where
    P: Fn(&Node) -> bool,
{
    move |node| !p(node)
}

/// True when every predicate matches. An empty list matches everything.
pub fn all(predicates: Vec<NodePredicate>) -> NodePredicate {
    Box::new(move |node| predicates.iter().all(|predicate| predicate(node)))
}

/// True when at least one predicate matches.
pub fn any(predicates: Vec<NodePredicate>) -> NodePredicate {
    Box::new(move |node| predicates.iter().any(|predicate| predicate(node)))
}

pub fn is_kind(kind: NodeKind) -> impl Fn(&Node) -> bool {
    move |node| node.kind() == kind
}

/// Matches nodes whose kind carries a name (requirements and scenarios)
/// with exactly the given name.
pub fn has_name(name: &str) -> impl Fn(&Node) -> bool + '_ {
    move |node| node.name() == Some(name)
}

/// Matches nodes whose span overlaps `[start, end)`.
pub fn in_range(start: usize, end: usize) -> impl Fn(&Node) -> bool {
    move |node| node.start() < end && start < node.end()
}

/// Matches nodes with at least one direct child satisfying the predicate.
pub fn has_child<P>(p: P) -> impl Fn(&Node) -> bool
where
    P: Fn(&Node) -> bool,
{
    move |node| node.children().iter().any(&p)
}

/// Matches nodes with at least one strict descendant satisfying the
/// predicate.
pub fn has_descendant<P>(p: P) -> impl Fn(&Node) -> bool
where
    P: Fn(&Node) -> bool,
{
    move |node| {
        node.children()
            .iter()
            .any(|child| exists(child, |descendant| p(descendant)))
    }
}
