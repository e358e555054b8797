//! Compilation units handed over by the front end.
//!
//! A front end describes one compilation unit as a JSON document:
//!
//! ```json
//! {
//!   "path": "src/Main.java",
//!   "source": "s.trim();",
//!   "types": [{ "name": "java.lang.String", "supertypes": ["java.lang.Object"] }],
//!   "root": {
//!     "kind": "compilation_unit", "start": 0, "end": 9,
//!     "children": [
//!       { "kind": "expression_statement", "start": 0, "end": 9, "children": [
//!         { "kind": "method_invocation", "start": 0, "end": 8, "children": [
//!           { "kind": "member_select", "start": 0, "end": 6, "name": "trim",
//!             "binding": { "kind": "method", "owner": "java.lang.String",
//!                          "returns": "java.lang.String" },
//!             "children": [
//!               { "kind": "identifier", "start": 0, "end": 1, "name": "s",
//!                 "binding": { "kind": "local", "type": "java.lang.String" } }
//!             ] }
//!         ] }
//!       ] }
//!     ]
//!   }
//! }
//! ```
//!
//! Instead of `source`, a document may name a `source_path` relative to the
//! document itself; fixes are then written back to that file.

use crate::resolve::{Binding, SymbolKind, TypeTable};
use crate::rule::RuleRegistry;
use crate::scanner::{scan, ScanReport};
use crate::tree::{Kind, NodeId, SyntaxTree, TextRange, TreeBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating a unit.
#[derive(Debug, Error)]
pub enum UnitError {
    /// IO error reading the document or its source file.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not fit the schema.
    #[error("Invalid unit document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document carries neither `source` nor `source_path`.
    #[error("Unit {0} has no source text")]
    MissingSource(PathBuf),

    /// A node range does not fit the source text.
    #[error("Node {node} has range {range} outside a source of {source_len} bytes")]
    Range {
        /// Offending node.
        node: NodeId,
        /// Its range.
        range: TextRange,
        /// Length of the source text.
        source_len: usize,
    },

    /// The node structure is not a well-nested tree.
    #[error("Malformed tree: {0}")]
    Structure(String),
}

#[derive(Debug, Deserialize)]
struct UnitDocument {
    path: PathBuf,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    source_path: Option<PathBuf>,
    #[serde(default)]
    types: Vec<TypeDocument>,
    root: NodeDocument,
}

#[derive(Debug, Deserialize)]
struct TypeDocument {
    name: String,
    #[serde(default)]
    supertypes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NodeDocument {
    kind: Kind,
    start: usize,
    end: usize,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    binding: Option<BindingDocument>,
    #[serde(default)]
    suppress: Vec<String>,
    #[serde(default)]
    children: Vec<NodeDocument>,
}

#[derive(Debug, Deserialize)]
struct BindingDocument {
    #[serde(default)]
    kind: SymbolKind,
    #[serde(default, rename = "type")]
    ty: Option<String>,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    returns: Option<String>,
}

/// One compilation unit: its tree, its type facts and where it came from.
#[derive(Debug)]
pub struct Unit {
    /// Syntax tree over the original source.
    pub tree: SyntaxTree,
    /// Bindings and type relationships for the tree's nodes.
    pub types: TypeTable,
    /// File holding the source text, when fixes can be written back.
    pub source_file: Option<PathBuf>,
}

impl Unit {
    /// Wraps an already built tree and type table.
    #[must_use]
    pub fn new(tree: SyntaxTree, types: TypeTable) -> Self {
        Self {
            tree,
            types,
            source_file: None,
        }
    }

    /// Reads and validates a unit document from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or the document is invalid.
    pub fn load(path: &Path) -> Result<Self, UnitError> {
        let text = std::fs::read_to_string(path).map_err(|e| UnitError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&text, path.parent())
    }

    /// Parses and validates a unit document.
    ///
    /// A relative `source_path` is resolved against `base_dir`. When both
    /// `source` and `source_path` are present, the inline text wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid, the source cannot be read,
    /// or the tree is malformed.
    pub fn from_json(text: &str, base_dir: Option<&Path>) -> Result<Self, UnitError> {
        let document: UnitDocument = serde_json::from_str(text)?;

        let (source, source_file) = match (document.source, document.source_path) {
            (Some(source), _) => (source, None),
            (None, Some(relative)) => {
                let file = match base_dir {
                    Some(dir) if relative.is_relative() => dir.join(&relative),
                    _ => relative,
                };
                let source = std::fs::read_to_string(&file).map_err(|e| UnitError::Io {
                    path: file.clone(),
                    source: e,
                })?;
                (source, Some(file))
            }
            (None, None) => return Err(UnitError::MissingSource(document.path)),
        };

        let mut types = TypeTable::new();
        for decl in &document.types {
            let ty = types.intern(&decl.name);
            for supertype in &decl.supertypes {
                let supertype = types.intern(supertype);
                types.add_supertype(ty, supertype);
            }
        }

        let mut builder = TreeBuilder::new(document.path, source);
        let root = flatten(&document.root, &mut builder, &mut types);
        let tree = builder.finish(root)?;

        Ok(Self {
            tree,
            types,
            source_file,
        })
    }

    /// Runs every rule of `registry` over this unit.
    #[must_use]
    pub fn scan(&self, registry: &RuleRegistry) -> ScanReport {
        scan(&self.tree, &self.types, registry)
    }
}

/// Copies nested nodes into the builder in pre-order, attaching each node to
/// its parent as it goes so children keep document order.
fn flatten(root: &NodeDocument, builder: &mut TreeBuilder, types: &mut TypeTable) -> NodeId {
    let mut pending: Vec<(&NodeDocument, Option<NodeId>)> = vec![(root, None)];
    let mut root_id = None;

    while let Some((doc, parent)) = pending.pop() {
        let id = builder.push(doc.kind, TextRange::new(doc.start, doc.end), doc.name.clone());
        for rule in &doc.suppress {
            builder.suppress(id, rule.clone());
        }
        if let Some(binding) = &doc.binding {
            let mut intern = |name: &Option<String>| name.as_deref().map(|n| types.intern(n));
            let binding = Binding {
                kind: binding.kind,
                ty: intern(&binding.ty),
                owner: intern(&binding.owner),
                returns: intern(&binding.returns),
            };
            types.bind(id, binding);
        }
        match parent {
            Some(parent) => builder.attach(parent, id),
            None => root_id = Some(id),
        }
        pending.extend(doc.children.iter().rev().map(|child| (child, Some(id))));
    }

    root_id.unwrap_or_else(|| NodeId::from_index(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::TypeResolver;
    use std::io::Write;

    const TRIM: &str = r#"{
        "path": "src/Main.java",
        "source": "s.trim();",
        "types": [{ "name": "java.lang.String", "supertypes": ["java.lang.Object"] }],
        "root": { "kind": "compilation_unit", "start": 0, "end": 9, "children": [
            { "kind": "expression_statement", "start": 0, "end": 9, "suppress": ["SF001"], "children": [
                { "kind": "method_invocation", "start": 0, "end": 8, "children": [
                    { "kind": "member_select", "start": 0, "end": 6, "name": "trim",
                      "binding": { "kind": "method", "owner": "java.lang.String", "returns": "java.lang.String" },
                      "children": [
                        { "kind": "identifier", "start": 0, "end": 1, "name": "s",
                          "binding": { "kind": "local", "type": "java.lang.String" } }
                      ] }
                ] }
            ] }
        ] }
    }"#;

    #[test]
    fn loads_nested_nodes_in_document_order() {
        let unit = Unit::from_json(TRIM, None).expect("valid document");
        let tree = &unit.tree;
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.path(), Path::new("src/Main.java"));

        let stmt = tree.children(tree.root())[0];
        assert_eq!(tree.kind(stmt), Kind::ExpressionStatement);
        assert_eq!(tree.node(stmt).suppressions, ["SF001"]);

        let call = tree.children(stmt)[0];
        let select = tree.children(call)[0];
        let ident = tree.children(select)[0];
        assert_eq!(tree.text(call), "s.trim()");
        assert_eq!(tree.name(ident), Some("s"));

        let string = unit.types.lookup("java.lang.String").expect("interned");
        let object = unit.types.lookup("java.lang.Object").expect("interned");
        assert_eq!(unit.types.owner_type(select), Some(string));
        assert_eq!(unit.types.return_type(select), Some(string));
        assert_eq!(unit.types.type_of(ident), Some(string));
        assert!(unit.types.is_assignable(string, object));
        assert!(unit.source_file.is_none());
    }

    #[test]
    fn reads_source_from_sibling_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut source = std::fs::File::create(dir.path().join("Main.java")).expect("create");
        write!(source, "x;").expect("write");
        let doc = dir.path().join("Main.sift.json");
        std::fs::write(
            &doc,
            r#"{ "path": "Main.java", "source_path": "Main.java",
                 "root": { "kind": "compilation_unit", "start": 0, "end": 2 } }"#,
        )
        .expect("write");

        let unit = Unit::load(&doc).expect("valid document");
        assert_eq!(unit.tree.source(), "x;");
        assert_eq!(unit.source_file, Some(dir.path().join("Main.java")));
    }

    #[test]
    fn rejects_missing_source() {
        let err = Unit::from_json(
            r#"{ "path": "A.java", "root": { "kind": "other", "start": 0, "end": 0 } }"#,
            None,
        )
        .expect_err("no source");
        assert!(matches!(err, UnitError::MissingSource(_)));
    }

    #[test]
    fn rejects_out_of_range_nodes() {
        let err = Unit::from_json(
            r#"{ "path": "A.java", "source": "x;",
                 "root": { "kind": "compilation_unit", "start": 0, "end": 7 } }"#,
            None,
        )
        .expect_err("range exceeds source");
        assert!(matches!(err, UnitError::Range { source_len: 2, .. }));
    }

    #[test]
    fn rejects_unknown_kinds() {
        let err = Unit::from_json(
            r#"{ "path": "A.java", "source": "", "root": { "kind": "lambda", "start": 0, "end": 0 } }"#,
            None,
        )
        .expect_err("unknown kind");
        assert!(matches!(err, UnitError::Json(_)));
    }
}
