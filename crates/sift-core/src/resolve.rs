//! Read-only type resolution facts supplied by the front end.
//!
//! The engine never infers types. It asks a [`TypeResolver`] for the bindings
//! the front end attached to nodes and for type relationships. Every lookup may
//! come back empty; callers treat that as "unresolved", never as an error.

use crate::tree::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Interned type handle, scoped to one [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u32);

/// What a bound node refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Local variable or parameter.
    Local,
    /// Field of a type.
    Field,
    /// Method; the node is a callee reference.
    Method,
    /// Type name used as an expression qualifier.
    Type,
    /// Value of an expression that names nothing (literals, calls).
    #[default]
    Value,
}

/// Resolved facts for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Binding {
    /// What the node refers to.
    pub kind: SymbolKind,
    /// Static type of the referenced entity or expression value.
    pub ty: Option<TypeId>,
    /// Type that declares the referenced member.
    pub owner: Option<TypeId>,
    /// Return type, for method references.
    pub returns: Option<TypeId>,
}

/// Type-resolution service queried by matchers and rules.
pub trait TypeResolver {
    /// Binding attached to `node`, if the front end resolved it.
    fn binding(&self, node: NodeId) -> Option<&Binding>;

    /// Fully qualified name of `ty`.
    fn type_name(&self, ty: TypeId) -> Option<&str>;

    /// Returns true if `a` and `b` denote the identical type.
    fn is_same_type(&self, a: TypeId, b: TypeId) -> bool;

    /// Returns true if a value of type `from` can be assigned to `to`.
    fn is_assignable(&self, from: TypeId, to: TypeId) -> bool;

    /// Static type of the entity `node` refers to.
    fn type_of(&self, node: NodeId) -> Option<TypeId> {
        self.binding(node)?.ty
    }

    /// Declaring type of the member `node` refers to.
    fn owner_type(&self, node: NodeId) -> Option<TypeId> {
        self.binding(node)?.owner
    }

    /// Return type of the method `node` refers to.
    fn return_type(&self, node: NodeId) -> Option<TypeId> {
        self.binding(node)?.returns
    }
}

#[derive(Debug, Clone)]
struct TypeInfo {
    name: String,
    supertypes: Vec<TypeId>,
}

/// In-memory [`TypeResolver`] built from the unit interchange document.
///
/// Types are interned by fully qualified name, so two handles are the same
/// type exactly when they are equal. Assignability follows declared
/// supertype edges transitively.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: Vec<TypeInfo>,
    by_name: HashMap<String, TypeId>,
    bindings: HashMap<NodeId, Binding>,
}

impl TypeTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `name`, adding the type if it is new.
    pub fn intern(&mut self, name: &str) -> TypeId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = TypeId(u32::try_from(self.types.len()).unwrap_or(u32::MAX));
        self.types.push(TypeInfo {
            name: name.to_string(),
            supertypes: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Looks up an interned type by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Declares `supertype` as a direct supertype of `ty`.
    pub fn add_supertype(&mut self, ty: TypeId, supertype: TypeId) {
        let supertypes = &mut self.types[ty.0 as usize].supertypes;
        if !supertypes.contains(&supertype) {
            supertypes.push(supertype);
        }
    }

    /// Attaches a binding to `node`, replacing any earlier one.
    pub fn bind(&mut self, node: NodeId, binding: Binding) {
        self.bindings.insert(node, binding);
    }

    /// Direct supertypes of `ty`.
    #[must_use]
    pub fn supertypes(&self, ty: TypeId) -> &[TypeId] {
        self.types
            .get(ty.0 as usize)
            .map_or(&[], |info| info.supertypes.as_slice())
    }

    /// Iterates over interned types in interning order.
    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len()).map(|index| TypeId(u32::try_from(index).unwrap_or(u32::MAX)))
    }

    /// Number of interned types.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Number of bound nodes.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}

impl TypeResolver for TypeTable {
    fn binding(&self, node: NodeId) -> Option<&Binding> {
        self.bindings.get(&node)
    }

    fn type_name(&self, ty: TypeId) -> Option<&str> {
        self.types.get(ty.0 as usize).map(|info| info.name.as_str())
    }

    fn is_same_type(&self, a: TypeId, b: TypeId) -> bool {
        a == b
    }

    fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        let mut seen = HashSet::new();
        let mut pending = vec![from];
        while let Some(ty) = pending.pop() {
            if ty == to {
                return true;
            }
            if !seen.insert(ty) {
                continue;
            }
            if let Some(info) = self.types.get(ty.0 as usize) {
                pending.extend(info.supertypes.iter().copied());
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> (TypeTable, TypeId, TypeId, TypeId, TypeId) {
        let mut types = TypeTable::new();
        let object = types.intern("java.lang.Object");
        let char_seq = types.intern("java.lang.CharSequence");
        let string = types.intern("java.lang.String");
        let int = types.intern("int");
        types.add_supertype(string, char_seq);
        types.add_supertype(char_seq, object);
        (types, object, char_seq, string, int)
    }

    #[test]
    fn interning_is_idempotent() {
        let (mut types, _, _, string, _) = table();
        assert_eq!(types.intern("java.lang.String"), string);
        assert_eq!(types.lookup("java.lang.String"), Some(string));
        assert_eq!(types.type_name(string), Some("java.lang.String"));
        assert_eq!(types.type_count(), 4);
    }

    #[test]
    fn assignability_is_transitive() {
        let (types, object, char_seq, string, int) = table();
        assert!(types.is_assignable(string, string));
        assert!(types.is_assignable(string, char_seq));
        assert!(types.is_assignable(string, object));
        assert!(!types.is_assignable(object, string));
        assert!(!types.is_assignable(int, object));
    }

    #[test]
    fn same_type_is_identity_not_assignability() {
        let (types, object, _, string, _) = table();
        assert!(types.is_same_type(string, string));
        assert!(!types.is_same_type(string, object));
    }

    #[test]
    fn supertype_cycles_terminate() {
        let (mut types, object, _, string, int) = table();
        types.add_supertype(object, string);
        assert!(!types.is_assignable(string, int));
    }

    #[test]
    fn unbound_nodes_resolve_to_nothing() {
        let (mut types, _, _, string, _) = table();
        let bound = NodeId::from_index(0);
        types.bind(
            bound,
            Binding {
                kind: SymbolKind::Method,
                ty: None,
                owner: Some(string),
                returns: Some(string),
            },
        );
        assert_eq!(types.owner_type(bound), Some(string));
        assert_eq!(types.type_of(bound), None);
        assert_eq!(types.return_type(NodeId::from_index(1)), None);
    }
}
