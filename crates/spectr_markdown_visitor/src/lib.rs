mod predicates;
mod queries;
mod visitor;

pub use predicates::{
    all, and, any, has_child, has_descendant, has_name, in_range, is_kind, not, or, NodePredicate,
};
pub use queries::{count, exists, find, find_by_kind, find_first, find_first_by_kind};
pub use visitor::{walk, VisitControl};
