//! Per-traversal context handed to matchers and rules.

use crate::resolve::TypeResolver;
use crate::tree::{NodeId, SyntaxTree};

/// Context for one traversal session over one compilation unit.
///
/// Holds the tree, the type-resolution service and the path from the root to
/// the node currently being visited. Matchers and rules only ever see it by
/// shared reference; the scanner is the only writer of the path.
pub struct VisitorState<'a> {
    tree: &'a SyntaxTree,
    types: &'a dyn TypeResolver,
    path: Vec<NodeId>,
}

impl<'a> VisitorState<'a> {
    /// Creates a state positioned before the root.
    #[must_use]
    pub fn new(tree: &'a SyntaxTree, types: &'a dyn TypeResolver) -> Self {
        Self {
            tree,
            types,
            path: Vec::new(),
        }
    }

    /// Tree being traversed.
    #[must_use]
    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    /// Type-resolution service for this unit.
    #[must_use]
    pub fn types(&self) -> &'a dyn TypeResolver {
        self.types
    }

    /// Nodes from the root down to the current node.
    #[must_use]
    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    /// Node currently being visited.
    #[must_use]
    pub fn current(&self) -> Option<NodeId> {
        self.path.last().copied()
    }

    /// Immediate parent of `node`.
    ///
    /// For the node being visited this is read from the traversal path; for
    /// any other node it falls back to the tree's structural link.
    #[must_use]
    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        match self.path.as_slice() {
            [.., parent, current] if *current == node => Some(*parent),
            [current] if *current == node => None,
            _ => self.tree.parent(node),
        }
    }

    /// Source text of `node`.
    #[must_use]
    pub fn source_for(&self, node: NodeId) -> &'a str {
        self.tree.text(node)
    }

    pub(crate) fn enter(&mut self, node: NodeId) {
        self.path.push(node);
    }

    pub(crate) fn exit(&mut self) {
        self.path.pop();
    }
}

impl std::fmt::Debug for VisitorState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitorState")
            .field("unit", &self.tree.path())
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::TypeTable;
    use crate::tree::{Kind, TextRange, TreeBuilder};

    #[test]
    fn parent_comes_from_path_for_current_node() {
        let mut b = TreeBuilder::new("A.java", "{x;}");
        let block = b.push(Kind::Block, TextRange::new(0, 4), None);
        let stmt = b.push(Kind::ExpressionStatement, TextRange::new(1, 3), None);
        let ident = b.push(Kind::Identifier, TextRange::new(1, 2), Some("x".into()));
        b.attach(block, stmt);
        b.attach(stmt, ident);
        let tree = b.finish(block).expect("valid tree");
        let types = TypeTable::new();

        let mut state = VisitorState::new(&tree, &types);
        state.enter(block);
        assert_eq!(state.parent_of(block), None);
        state.enter(stmt);
        assert_eq!(state.current(), Some(stmt));
        assert_eq!(state.parent_of(stmt), Some(block));
        // Not on the path: structural link is used.
        assert_eq!(state.parent_of(ident), Some(stmt));
        assert_eq!(state.source_for(ident), "x");
        state.exit();
        assert_eq!(state.path(), &[block]);
    }
}
