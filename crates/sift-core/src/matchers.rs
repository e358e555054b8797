//! Composable predicates over syntax nodes.
//!
//! A [`Matcher<T>`] answers one yes/no question about a node of shape `T`
//! given the current [`VisitorState`]. Matchers are pure: they read the tree
//! and the type-resolution service, never mutate anything, and fail closed
//! when a binding they need is missing.
//!
//! ```ignore
//! use sift_core::matchers::{all_of, kind_is, method_select, parent_node, receiver_has_type,
//!     returns_same_type_as_receiver, MatcherExt};
//! use sift_core::{Invocation, Kind};
//!
//! let matcher = all_of::<Invocation>(vec![
//!     parent_node(kind_is(Kind::ExpressionStatement)).boxed(),
//!     method_select(all_of(vec![
//!         receiver_has_type(["java.lang.String"]).boxed(),
//!         returns_same_type_as_receiver().boxed(),
//!     ]))
//!     .boxed(),
//! ]);
//! ```

use crate::state::VisitorState;
use crate::tree::{AstNode, Invocation, Kind, NodeId};
use std::collections::BTreeSet;
use std::marker::PhantomData;

/// A side-effect-free predicate over nodes of shape `T`.
pub trait Matcher<T>: Send + Sync {
    /// Returns true if `node` satisfies the predicate.
    fn matches(&self, node: T, state: &VisitorState<'_>) -> bool;
}

impl<T, F> Matcher<T> for F
where
    F: Fn(T, &VisitorState<'_>) -> bool + Send + Sync,
{
    fn matches(&self, node: T, state: &VisitorState<'_>) -> bool {
        self(node, state)
    }
}

/// Type alias for boxed matchers.
pub type BoxMatcher<T> = Box<dyn Matcher<T>>;

/// Convenience adapters for matchers.
pub trait MatcherExt<T>: Matcher<T> + Sized + 'static {
    /// Boxes the matcher so it can sit in a combinator list.
    fn boxed(self) -> BoxMatcher<T> {
        Box::new(self)
    }
}

impl<T, M: Matcher<T> + 'static> MatcherExt<T> for M {}

/// Matches nodes whose kind tag equals the given kind.
#[derive(Debug, Clone, Copy)]
pub struct KindIs(Kind);

impl<T: AstNode> Matcher<T> for KindIs {
    fn matches(&self, node: T, state: &VisitorState<'_>) -> bool {
        state
            .tree()
            .get(node.id())
            .is_some_and(|n| n.kind == self.0)
    }
}

/// Returns a matcher for nodes of kind `kind`.
#[must_use]
pub fn kind_is(kind: Kind) -> KindIs {
    KindIs(kind)
}

/// Matches nodes whose immediate parent satisfies the inner matcher.
#[derive(Debug, Clone, Copy)]
pub struct ParentNode<M>(M);

impl<T: AstNode, M: Matcher<NodeId>> Matcher<T> for ParentNode<M> {
    fn matches(&self, node: T, state: &VisitorState<'_>) -> bool {
        state
            .parent_of(node.id())
            .is_some_and(|parent| self.0.matches(parent, state))
    }
}

/// Returns a matcher testing the parent of a node with `inner`.
#[must_use]
pub fn parent_node<M: Matcher<NodeId>>(inner: M) -> ParentNode<M> {
    ParentNode(inner)
}

/// Matches invocations whose callee reference satisfies the inner matcher.
#[derive(Debug, Clone, Copy)]
pub struct MethodSelect<M>(M);

impl<M: Matcher<NodeId>> Matcher<Invocation> for MethodSelect<M> {
    fn matches(&self, node: Invocation, state: &VisitorState<'_>) -> bool {
        node.method_select(state.tree())
            .is_some_and(|callee| self.0.matches(callee, state))
    }
}

/// Returns a matcher applying `inner` to an invocation's callee reference.
#[must_use]
pub fn method_select<M: Matcher<NodeId>>(inner: M) -> MethodSelect<M> {
    MethodSelect(inner)
}

/// Matches callee references whose declaring type is in a fixed name set.
///
/// Examples of the type being tested:
///
/// ```text
/// a.b.foo()      => owner of foo, the type of a.b
/// a.bar().foo()  => owner of foo, the return type of a.bar()
/// this.foo()     => owner of foo, the enclosing type
/// ```
#[derive(Debug, Clone)]
pub struct ReceiverHasType {
    names: BTreeSet<String>,
}

impl ReceiverHasType {
    /// Type names this matcher accepts.
    #[must_use]
    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }
}

impl Matcher<NodeId> for ReceiverHasType {
    fn matches(&self, node: NodeId, state: &VisitorState<'_>) -> bool {
        let types = state.types();
        types
            .owner_type(node)
            .and_then(|owner| types.type_name(owner))
            .is_some_and(|name| self.names.contains(name))
    }
}

/// Returns a matcher for callee references owned by one of `names`.
#[must_use]
pub fn receiver_has_type<I, S>(names: I) -> ReceiverHasType
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ReceiverHasType {
        names: names.into_iter().map(Into::into).collect(),
    }
}

/// Matches callee references whose return type is identical to their
/// receiver type. Both types must resolve.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnsSameTypeAsReceiver;

impl Matcher<NodeId> for ReturnsSameTypeAsReceiver {
    fn matches(&self, node: NodeId, state: &VisitorState<'_>) -> bool {
        let types = state.types();
        match (types.owner_type(node), types.return_type(node)) {
            (Some(receiver), Some(returned)) => types.is_same_type(receiver, returned),
            _ => false,
        }
    }
}

/// Returns a matcher for methods returning their receiver's type.
#[must_use]
pub fn returns_same_type_as_receiver() -> ReturnsSameTypeAsReceiver {
    ReturnsSameTypeAsReceiver
}

/// Short-circuiting conjunction. Empty means true.
pub struct AllOf<T> {
    matchers: Vec<BoxMatcher<T>>,
}

impl<T: Copy> Matcher<T> for AllOf<T> {
    fn matches(&self, node: T, state: &VisitorState<'_>) -> bool {
        self.matchers.iter().all(|m| m.matches(node, state))
    }
}

/// Returns a matcher that holds when every one of `matchers` holds,
/// evaluated in order.
#[must_use]
pub fn all_of<T>(matchers: Vec<BoxMatcher<T>>) -> AllOf<T> {
    AllOf { matchers }
}

/// Short-circuiting disjunction. Empty means false.
pub struct AnyOf<T> {
    matchers: Vec<BoxMatcher<T>>,
}

impl<T: Copy> Matcher<T> for AnyOf<T> {
    fn matches(&self, node: T, state: &VisitorState<'_>) -> bool {
        self.matchers.iter().any(|m| m.matches(node, state))
    }
}

/// Returns a matcher that holds when at least one of `matchers` holds,
/// evaluated in order.
#[must_use]
pub fn any_of<T>(matchers: Vec<BoxMatcher<T>>) -> AnyOf<T> {
    AnyOf { matchers }
}

/// Negation.
pub struct Not<T, M> {
    inner: M,
    _node: PhantomData<fn(T)>,
}

impl<T, M: Matcher<T>> Matcher<T> for Not<T, M> {
    fn matches(&self, node: T, state: &VisitorState<'_>) -> bool {
        !self.inner.matches(node, state)
    }
}

/// Returns a matcher that holds when `inner` does not.
#[must_use]
pub fn not<T, M: Matcher<T>>(inner: M) -> Not<T, M> {
    Not {
        inner,
        _node: PhantomData,
    }
}
