//! Syntax tree model consumed by the engine.
//!
//! A [`SyntaxTree`] is an arena of [`Node`]s for one compilation unit. Nodes
//! refer to each other by [`NodeId`]; the ids are only meaningful for the tree
//! that produced them. Trees are built once through a [`TreeBuilder`] (by the
//! unit loader or the test fixtures) and are read-only afterwards.

use crate::unit::UnitError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the arena index of this node.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind tag of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Root of a compilation unit.
    CompilationUnit,
    /// Type declaration.
    ClassDecl,
    /// Method or function declaration.
    MethodDecl,
    /// Braced statement list.
    Block,
    /// Expression evaluated for its effect; its value is discarded.
    ExpressionStatement,
    /// Local variable declaration.
    VariableDecl,
    /// `return` statement.
    Return,
    /// `if` statement.
    If,
    /// Assignment expression (`target = value`).
    Assignment,
    /// Call; first child is the callee reference, the rest are arguments.
    MethodInvocation,
    /// Qualified reference (`receiver.name`); the only child is the receiver.
    MemberSelect,
    /// Plain name reference.
    Identifier,
    /// Literal value.
    Literal,
    /// Parenthesized expression.
    Parenthesized,
    /// Object construction.
    NewObject,
    /// Any construct the engine has no dedicated tag for.
    Other,
}

impl Kind {
    /// Returns the `snake_case` tag used in the interchange format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompilationUnit => "compilation_unit",
            Self::ClassDecl => "class_decl",
            Self::MethodDecl => "method_decl",
            Self::Block => "block",
            Self::ExpressionStatement => "expression_statement",
            Self::VariableDecl => "variable_decl",
            Self::Return => "return",
            Self::If => "if",
            Self::Assignment => "assignment",
            Self::MethodInvocation => "method_invocation",
            Self::MemberSelect => "member_select",
            Self::Identifier => "identifier",
            Self::Literal => "literal",
            Self::Parenthesized => "parenthesized",
            Self::NewObject => "new_object",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open byte range `[start, end)` into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextRange {
    /// First byte of the range.
    pub start: usize,
    /// One past the last byte of the range.
    pub end: usize,
}

impl TextRange {
    /// Creates a new range.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Creates an empty range at `offset`.
    #[must_use]
    pub fn empty(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Length of the range in bytes.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the range covers no bytes.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `other` lies entirely inside this range.
    #[must_use]
    pub fn contains_range(self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl std::fmt::Display for TextRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One program construct.
#[derive(Debug, Clone)]
pub struct Node {
    /// Kind tag.
    pub kind: Kind,
    /// Source range covered by the node.
    pub range: TextRange,
    /// Referenced or declared name, for identifiers, selects and declarations.
    pub name: Option<String>,
    /// Structural parent, `None` for the root.
    pub parent: Option<NodeId>,
    /// Children in document order.
    pub children: Vec<NodeId>,
    /// Rule identities suppressed at and below this node.
    pub suppressions: Vec<String>,
}

/// Arena of nodes for one compilation unit.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    path: PathBuf,
    source: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl SyntaxTree {
    /// Display path of the compilation unit.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original, unmodified source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root node of the unit.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Returns the node for `id`, or `None` for a foreign id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Kind tag of `id`.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Kind {
        self.node(id).kind
    }

    /// Source range of `id`.
    #[must_use]
    pub fn range(&self, id: NodeId) -> TextRange {
        self.node(id).range
    }

    /// Name carried by `id`, if any.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).name.as_deref()
    }

    /// Structural parent of `id`.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Children of `id` in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Source text covered by `id`.
    #[must_use]
    pub fn text(&self, id: NodeId) -> &str {
        let range = self.range(id);
        self.source.get(range.start..range.end).unwrap_or_default()
    }

    /// Iterates over `id` and its ancestors, innermost first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&current| self.parent(current))
    }

    /// Iterates over `id` and everything below it in pre-order.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![id];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.children(next).iter().rev().copied());
            Some(next)
        })
    }

    /// Converts a byte offset to a 1-indexed `(line, column)` pair.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let before = self.source.get(..offset).unwrap_or_default();
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        (line, offset - line_start + 1)
    }
}

/// Incremental constructor for a [`SyntaxTree`].
#[derive(Debug)]
pub struct TreeBuilder {
    path: PathBuf,
    source: String,
    nodes: Vec<Node>,
}

impl TreeBuilder {
    /// Starts a tree over `source`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            nodes: Vec::new(),
        }
    }

    /// Source text the tree is being built over.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Adds a detached node and returns its id.
    pub fn push(&mut self, kind: Kind, range: TextRange, name: Option<String>) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node {
            kind,
            range,
            name,
            parent: None,
            children: Vec::new(),
            suppressions: Vec::new(),
        });
        id
    }

    /// Appends `child` to the children of `parent`.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Marks `rule` as suppressed at and below `id`.
    pub fn suppress(&mut self, id: NodeId, rule: impl Into<String>) {
        self.nodes[id.index()].suppressions.push(rule.into());
    }

    /// Range of a node added earlier.
    #[must_use]
    pub fn range(&self, id: NodeId) -> TextRange {
        self.nodes[id.index()].range
    }

    /// Overwrites the range of a node added earlier.
    pub fn set_range(&mut self, id: NodeId, range: TextRange) {
        self.nodes[id.index()].range = range;
    }

    /// Validates the structure and returns the finished tree rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if a range is outside the source or not on a char
    /// boundary, if a child escapes its parent or overlaps an earlier sibling,
    /// or if a node is unreachable from `root`.
    pub fn finish(self, root: NodeId) -> Result<SyntaxTree, UnitError> {
        if self.nodes.get(root.index()).is_none() {
            return Err(UnitError::Structure(format!("root {root} does not exist")));
        }
        if self.nodes[root.index()].parent.is_some() {
            return Err(UnitError::Structure(format!("root {root} has a parent")));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let id = NodeId::from_index(index);
            let range = node.range;
            if range.start > range.end
                || range.end > self.source.len()
                || !self.source.is_char_boundary(range.start)
                || !self.source.is_char_boundary(range.end)
            {
                return Err(UnitError::Range {
                    node: id,
                    range,
                    source_len: self.source.len(),
                });
            }

            let mut previous_end = range.start;
            for &child in &node.children {
                let child_range = self.nodes[child.index()].range;
                if !range.contains_range(child_range) {
                    return Err(UnitError::Structure(format!(
                        "{} {child} ({child_range}) escapes its parent {} {id} ({range})",
                        self.nodes[child.index()].kind, node.kind
                    )));
                }
                if child_range.start < previous_end {
                    return Err(UnitError::Structure(format!(
                        "{} {child} ({child_range}) overlaps or precedes an earlier sibling",
                        self.nodes[child.index()].kind
                    )));
                }
                previous_end = child_range.end;
            }
        }

        let mut reachable = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut reachable[id.index()], true) {
                return Err(UnitError::Structure(format!("{id} is reachable twice")));
            }
            stack.extend(self.nodes[id.index()].children.iter().copied());
        }
        if let Some(orphan) = reachable.iter().position(|seen| !seen) {
            return Err(UnitError::Structure(format!(
                "{} is not reachable from the root",
                NodeId::from_index(orphan)
            )));
        }

        Ok(SyntaxTree {
            path: self.path,
            source: self.source,
            nodes: self.nodes,
            root,
        })
    }
}

/// Typed handle over a [`NodeId`] whose kind has been checked.
pub trait AstNode: Copy + Send + Sync + 'static {
    /// Returns the typed handle if `id` has the right shape.
    fn cast(tree: &SyntaxTree, id: NodeId) -> Option<Self>;

    /// Underlying node id.
    fn id(self) -> NodeId;
}

impl AstNode for NodeId {
    fn cast(_tree: &SyntaxTree, id: NodeId) -> Option<Self> {
        Some(id)
    }

    fn id(self) -> NodeId {
        self
    }
}

/// A [`Kind::MethodInvocation`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Invocation(NodeId);

impl Invocation {
    /// Callee reference: an [`Kind::Identifier`] or [`Kind::MemberSelect`]
    /// in well-formed trees.
    #[must_use]
    pub fn method_select(self, tree: &SyntaxTree) -> Option<NodeId> {
        tree.children(self.0).first().copied()
    }

    /// Argument expressions.
    #[must_use]
    pub fn arguments(self, tree: &SyntaxTree) -> &[NodeId] {
        tree.children(self.0).get(1..).unwrap_or_default()
    }
}

impl AstNode for Invocation {
    fn cast(tree: &SyntaxTree, id: NodeId) -> Option<Self> {
        (tree.get(id)?.kind == Kind::MethodInvocation).then_some(Self(id))
    }

    fn id(self) -> NodeId {
        self.0
    }
}

/// A [`Kind::MemberSelect`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Select(NodeId);

impl Select {
    /// Expression the member is selected from.
    #[must_use]
    pub fn receiver(self, tree: &SyntaxTree) -> Option<NodeId> {
        tree.children(self.0).first().copied()
    }
}

impl AstNode for Select {
    fn cast(tree: &SyntaxTree, id: NodeId) -> Option<Self> {
        (tree.get(id)?.kind == Kind::MemberSelect).then_some(Self(id))
    }

    fn id(self) -> NodeId {
        self.0
    }
}
