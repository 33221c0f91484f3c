use crate::contract::Block;

/// How the walk arrived at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reached {
    /// A `child_page` in the outline, or the root.
    OutlineEntry,
    /// A `link_to_page` pointing at the node.
    CrossLink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Has sub-pages or cross-links; not rendered itself.
    OutlineContainer,
    /// Reached through a cross-link; rendered only when published.
    DatabasePage,
    /// Ordinary outline page; always rendered.
    PlainContentPage,
}

/// Decides what a node is from its live children and how it was reached.
pub fn classify(children: &[Block], reached: Reached) -> NodeKind {
    if children.iter().any(Block::is_outline_entry) {
        return NodeKind::OutlineContainer;
    }
    match reached {
        Reached::CrossLink => NodeKind::DatabasePage,
        Reached::OutlineEntry => NodeKind::PlainContentPage,
    }
}
