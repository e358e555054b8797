//! Fixture builder for constructing bound syntax trees in tests.
//!
//! [`Fixture`] reads a tiny Java-like statement language and produces a
//! [`SyntaxTree`] with every binding a real front end would attach, so rules
//! can be tested against realistic trees without a compiler:
//!
//! ```ignore
//! let unit = Fixture::java()
//!     .local("s", "java.lang.String")
//!     .parse("s.trim(); String t = s.strip();");
//! let calls = unit.invocations();
//! ```
//!
//! Supported: statements, `{ }` blocks, `if`, `return`, local declarations
//! (`Type name = expr;`), assignments, member chains, calls, `new T(..)`,
//! parentheses, `this`, string/number/boolean/`null` literals, `//` and
//! `/* */` comments, and `@Suppress(rule, ..)` before a statement or block.

use crate::resolve::{Binding, SymbolKind, TypeId, TypeResolver, TypeTable};
use crate::rule::RuleRegistry;
use crate::scanner::{scan, ScanReport};
use crate::state::VisitorState;
use crate::tree::{AstNode, Invocation, Kind, NodeId, SyntaxTree, TextRange, TreeBuilder};
use crate::unit::Unit;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

const JAVA_METHODS: &[(&str, &[&str], &str)] = &[
    (
        "java.lang.String",
        &[
            "trim",
            "strip",
            "toLowerCase",
            "toUpperCase",
            "concat",
            "substring",
            "replace",
            "intern",
            "repeat",
        ],
        "java.lang.String",
    ),
    ("java.lang.String", &["length", "indexOf"], "int"),
    ("java.lang.String", &["isEmpty", "equals", "startsWith"], "boolean"),
    ("java.lang.String", &["charAt"], "char"),
    (
        "java.math.BigInteger",
        &[
            "add", "subtract", "multiply", "divide", "negate", "abs", "pow", "mod", "valueOf",
        ],
        "java.math.BigInteger",
    ),
    ("java.math.BigInteger", &["bitLength", "signum"], "int"),
    (
        "java.math.BigDecimal",
        &["add", "subtract", "multiply", "negate", "abs", "setScale", "stripTrailingZeros"],
        "java.math.BigDecimal",
    ),
    ("java.math.BigDecimal", &["scale"], "int"),
    ("java.lang.StringBuilder", &["append", "reverse"], "java.lang.StringBuilder"),
    ("java.lang.CharSequence", &["length"], "int"),
    ("java.lang.Object", &["toString"], "java.lang.String"),
    ("java.lang.Object", &["hashCode"], "int"),
    ("java.util.List", &["size"], "int"),
    ("java.util.List", &["add", "isEmpty"], "boolean"),
];

const JAVA_SUPERTYPES: &[(&str, &str)] = &[
    ("java.lang.String", "java.lang.CharSequence"),
    ("java.lang.String", "java.lang.Object"),
    ("java.lang.CharSequence", "java.lang.Object"),
    ("java.lang.StringBuilder", "java.lang.CharSequence"),
    ("java.lang.StringBuilder", "java.lang.Object"),
    ("java.lang.Number", "java.lang.Object"),
    ("java.math.BigInteger", "java.lang.Number"),
    ("java.math.BigDecimal", "java.lang.Number"),
    ("java.util.List", "java.lang.Object"),
    ("com.example.Main", "java.lang.Object"),
];

const PRIMITIVES: &[&str] = &["int", "long", "boolean", "char", "double", "void"];

/// Declarations a fixture source is read against.
#[derive(Debug, Clone)]
pub struct Fixture {
    path: PathBuf,
    types: TypeTable,
    simple_names: HashMap<String, TypeId>,
    this_type: TypeId,
    locals: HashMap<String, TypeId>,
    fields: HashMap<String, TypeId>,
    methods: HashMap<(TypeId, String), TypeId>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Creates a fixture with primitives only; `this` is `com.example.Main`.
    #[must_use]
    pub fn new() -> Self {
        let mut types = TypeTable::new();
        let this_type = types.intern("com.example.Main");
        let mut fixture = Self {
            path: PathBuf::from("src/Main.java"),
            types,
            simple_names: HashMap::from([("Main".to_string(), this_type)]),
            this_type,
            locals: HashMap::new(),
            fields: HashMap::new(),
            methods: HashMap::new(),
        };
        for primitive in PRIMITIVES {
            fixture.ty(primitive);
        }
        fixture
    }

    /// Creates a fixture preloaded with common `java.lang`, `java.math` and
    /// `java.util` types and methods.
    #[must_use]
    pub fn java() -> Self {
        let mut fixture = Self::new();
        for (sub, sup) in JAVA_SUPERTYPES {
            fixture = fixture.subtype(sub, sup);
        }
        for (owner, names, returns) in JAVA_METHODS {
            for name in *names {
                fixture = fixture.method(owner, name, returns);
            }
        }
        fixture
    }

    /// Sets the display path of the unit.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Declares `sub` as a direct subtype of `sup`.
    #[must_use]
    pub fn subtype(mut self, sub: &str, sup: &str) -> Self {
        let sub = self.ty(sub);
        let sup = self.ty(sup);
        self.types.add_supertype(sub, sup);
        self
    }

    /// Declares method `name` on `owner` returning `returns`.
    #[must_use]
    pub fn method(mut self, owner: &str, name: &str, returns: &str) -> Self {
        let owner = self.ty(owner);
        let returns = self.ty(returns);
        self.methods.insert((owner, name.to_string()), returns);
        self
    }

    /// Declares a local variable.
    #[must_use]
    pub fn local(mut self, name: &str, ty: &str) -> Self {
        let ty = self.ty(ty);
        self.locals.insert(name.to_string(), ty);
        self
    }

    /// Declares a field of the enclosing type.
    #[must_use]
    pub fn field(mut self, name: &str, ty: &str) -> Self {
        let ty = self.ty(ty);
        self.fields.insert(name.to_string(), ty);
        self
    }

    /// Sets the type `this` refers to.
    #[must_use]
    pub fn this_type(mut self, name: &str) -> Self {
        self.this_type = self.ty(name);
        self
    }

    /// Reads `source` into a bound tree.
    ///
    /// # Panics
    ///
    /// Panics if `source` is outside the supported subset.
    #[must_use]
    #[track_caller]
    pub fn parse(self, source: &str) -> FixtureUnit {
        match self.try_parse(source) {
            Ok(unit) => unit,
            Err(message) => panic!("fixture source {source:?}: {message}"),
        }
    }

    /// Reads `source` into a bound tree.
    ///
    /// # Errors
    ///
    /// Returns a message if `source` is outside the supported subset.
    pub fn try_parse(self, source: &str) -> Result<FixtureUnit, String> {
        let tokens = lex(source)?;
        let mut parser = Parser {
            builder: TreeBuilder::new(self.path.clone(), source),
            fixture: self,
            source,
            tokens,
            pos: 0,
        };

        let mut items = Vec::new();
        while parser.peek().is_some() {
            items.push(parser.item()?);
        }
        let root = parser.node(Kind::CompilationUnit, TextRange::new(0, source.len()), None, &items);
        let Parser {
            builder, fixture, ..
        } = parser;
        let tree = builder.finish(root).map_err(|e| e.to_string())?;
        Ok(FixtureUnit {
            tree,
            types: fixture.types,
        })
    }

    fn ty(&mut self, name: &str) -> TypeId {
        let id = self.types.intern(name);
        let simple = name.rsplit('.').next().unwrap_or(name);
        self.simple_names.entry(simple.to_string()).or_insert(id);
        id
    }

    fn resolve_type_name(&self, name: &str) -> Option<TypeId> {
        self.types
            .lookup(name)
            .or_else(|| self.simple_names.get(name).copied())
    }

    fn find_method(&self, owner: TypeId, name: &str) -> Option<(TypeId, TypeId)> {
        let mut pending = VecDeque::from([owner]);
        let mut seen = HashSet::new();
        while let Some(ty) = pending.pop_front() {
            if !seen.insert(ty) {
                continue;
            }
            if let Some(&returns) = self.methods.get(&(ty, name.to_string())) {
                return Some((ty, returns));
            }
            pending.extend(self.types.supertypes(ty).iter().copied());
        }
        None
    }
}

/// A tree and type table produced by a [`Fixture`].
#[derive(Debug)]
pub struct FixtureUnit {
    /// Bound syntax tree.
    pub tree: SyntaxTree,
    /// Types and bindings for the tree.
    pub types: TypeTable,
}

impl FixtureUnit {
    /// Method invocations in document order.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.tree
            .descendants(self.tree.root())
            .filter_map(|id| Invocation::cast(&self.tree, id))
            .collect()
    }

    /// Nodes of `kind` in document order.
    #[must_use]
    pub fn nodes_of(&self, kind: Kind) -> Vec<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .filter(|&id| self.tree.kind(id) == kind)
            .collect()
    }

    /// First node in document order whose source text is `text`.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .find(|&id| self.tree.text(id) == text)
    }

    /// Runs `f` with a fresh traversal state over this unit.
    pub fn with_state<R>(&self, f: impl FnOnce(&VisitorState<'_>) -> R) -> R {
        let state = VisitorState::new(&self.tree, &self.types);
        f(&state)
    }

    /// Runs every rule of `registry` over this unit.
    #[must_use]
    pub fn scan(&self, registry: &RuleRegistry) -> ScanReport {
        scan(&self.tree, &self.types, registry)
    }

    /// Converts into an analyzer unit.
    #[must_use]
    pub fn into_unit(self) -> Unit {
        Unit::new(self.tree, self.types)
    }

    /// Renders the unit as an interchange document.
    #[must_use]
    pub fn to_json(&self) -> String {
        let types: Vec<Value> = self
            .types
            .type_ids()
            .map(|ty| {
                json!({
                    "name": self.type_name(ty),
                    "supertypes": self
                        .types
                        .supertypes(ty)
                        .iter()
                        .map(|&sup| self.type_name(sup))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        let document = json!({
            "path": self.tree.path(),
            "source": self.tree.source(),
            "types": types,
            "root": self.node_json(self.tree.root()),
        });
        document.to_string()
    }

    fn type_name(&self, ty: TypeId) -> &str {
        self.types.type_name(ty).unwrap_or_default()
    }

    fn node_json(&self, id: NodeId) -> Value {
        let node = self.tree.node(id);
        let mut object = Map::new();
        object.insert("kind".into(), json!(node.kind.as_str()));
        object.insert("start".into(), json!(node.range.start));
        object.insert("end".into(), json!(node.range.end));
        if let Some(name) = &node.name {
            object.insert("name".into(), json!(name));
        }
        if let Some(binding) = self.types.binding(id) {
            let mut b = Map::new();
            b.insert("kind".into(), json!(binding.kind));
            for (key, ty) in [
                ("type", binding.ty),
                ("owner", binding.owner),
                ("returns", binding.returns),
            ] {
                if let Some(ty) = ty {
                    b.insert(key.into(), json!(self.type_name(ty)));
                }
            }
            object.insert("binding".into(), Value::Object(b));
        }
        if !node.suppressions.is_empty() {
            object.insert("suppress".into(), json!(node.suppressions));
        }
        let children: Vec<Value> = node.children.iter().map(|&c| self.node_json(c)).collect();
        object.insert("children".into(), Value::Array(children));
        Value::Object(object)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok {
    Ident,
    Str,
    Num,
    Punct(char),
}

#[derive(Debug, Clone, Copy)]
struct Token {
    tok: Tok,
    range: TextRange,
}

fn lex(source: &str) -> Result<Vec<Token>, String> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if source[i..].starts_with("//") {
            i = source[i..].find('\n').map_or(bytes.len(), |n| i + n);
            continue;
        }
        if source[i..].starts_with("/*") {
            i = source[i + 2..]
                .find("*/")
                .map(|n| i + 2 + n + 2)
                .ok_or("unterminated comment")?;
            continue;
        }
        let tok = if c.is_ascii_alphabetic() || c == b'_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            Tok::Ident
        } else if c.is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            Tok::Num
        } else if c == b'"' {
            i += 1;
            while i < bytes.len() && bytes[i] != b'"' {
                i += if bytes[i] == b'\\' { 2 } else { 1 };
            }
            if i >= bytes.len() {
                return Err(format!("unterminated string at {start}"));
            }
            i += 1;
            Tok::Str
        } else if b"(){};.,=@".contains(&c) {
            i += 1;
            Tok::Punct(char::from(c))
        } else {
            return Err(format!("unexpected character {:?} at {start}", char::from(c)));
        };
        tokens.push(Token {
            tok,
            range: TextRange::new(start, i),
        });
    }
    Ok(tokens)
}

struct Parser<'s> {
    fixture: Fixture,
    builder: TreeBuilder,
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
}

type Expr = (NodeId, Option<TypeId>);

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<Token> {
        self.tokens.get(self.pos + offset).copied()
    }

    fn text(&self, token: Token) -> &str {
        &self.source[token.range.start..token.range.end]
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.tok == Tok::Punct(c))
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek()
            .is_some_and(|t| t.tok == Tok::Ident && self.text(t) == keyword)
    }

    fn next(&mut self) -> Result<Token, String> {
        let token = self.peek().ok_or("unexpected end of input")?;
        self.pos += 1;
        Ok(token)
    }

    fn expect_punct(&mut self, c: char) -> Result<Token, String> {
        let token = self.next()?;
        if token.tok == Tok::Punct(c) {
            Ok(token)
        } else {
            Err(format!("expected {c:?} at {}", token.range.start))
        }
    }

    fn expect_ident(&mut self) -> Result<Token, String> {
        let token = self.next()?;
        if token.tok == Tok::Ident {
            Ok(token)
        } else {
            Err(format!("expected a name at {}", token.range.start))
        }
    }

    fn node(&mut self, kind: Kind, range: TextRange, name: Option<&str>, children: &[NodeId]) -> NodeId {
        let id = self.builder.push(kind, range, name.map(String::from));
        for &child in children {
            self.builder.attach(id, child);
        }
        id
    }

    fn bind(&mut self, id: NodeId, kind: SymbolKind, ty: Option<TypeId>) {
        self.fixture.types.bind(
            id,
            Binding {
                kind,
                ty,
                ..Binding::default()
            },
        );
    }

    fn item(&mut self) -> Result<NodeId, String> {
        if self.at_punct('@') {
            return self.annotated();
        }
        if self.at_punct('{') {
            let open = self.next()?;
            let mut items = Vec::new();
            while !self.at_punct('}') {
                items.push(self.item()?);
            }
            let close = self.next()?;
            return Ok(self.node(
                Kind::Block,
                TextRange::new(open.range.start, close.range.end),
                None,
                &items,
            ));
        }
        self.statement()
    }

    fn annotated(&mut self) -> Result<NodeId, String> {
        self.expect_punct('@')?;
        let name = self.expect_ident()?;
        if self.text(name) != "Suppress" {
            return Err(format!("unknown annotation at {}", name.range.start));
        }
        self.expect_punct('(')?;
        let mut rules = Vec::new();
        loop {
            let token = self.next()?;
            match token.tok {
                Tok::Punct(')') => break,
                Tok::Punct(',') => {}
                _ => rules.push(self.text(token).trim_matches('"').to_string()),
            }
        }
        let target = self.item()?;
        for rule in rules {
            self.builder.suppress(target, rule);
        }
        Ok(target)
    }

    fn statement(&mut self) -> Result<NodeId, String> {
        let first = self.peek().ok_or("unexpected end of input")?;

        if self.at_keyword("return") {
            self.next()?;
            let value = if self.at_punct(';') {
                Vec::new()
            } else {
                vec![self.expr()?.0]
            };
            let semi = self.expect_punct(';')?;
            let range = TextRange::new(first.range.start, semi.range.end);
            return Ok(self.node(Kind::Return, range, None, &value));
        }

        if self.at_keyword("if") {
            self.next()?;
            self.expect_punct('(')?;
            let (condition, _) = self.expr()?;
            self.expect_punct(')')?;
            let mut children = vec![condition, self.item()?];
            if self.at_keyword("else") {
                self.next()?;
                children.push(self.item()?);
            }
            let end = children
                .last()
                .map_or(first.range.end, |&c| self.builder.range(c).end);
            let range = TextRange::new(first.range.start, end);
            return Ok(self.node(Kind::If, range, None, &children));
        }

        let is_declaration = first.tok == Tok::Ident
            && !["this", "new", "true", "false", "null"].contains(&self.text(first))
            && self.peek_at(1).is_some_and(|t| t.tok == Tok::Ident);
        if is_declaration {
            return self.declaration();
        }

        let (expr, _) = self.expr()?;
        let semi = self.expect_punct(';')?;
        let range = TextRange::new(self.builder.range(expr).start, semi.range.end);
        Ok(self.node(Kind::ExpressionStatement, range, None, &[expr]))
    }

    fn declaration(&mut self) -> Result<NodeId, String> {
        let type_token = self.expect_ident()?;
        let type_name = self.text(type_token).to_string();
        let ty = self
            .fixture
            .resolve_type_name(&type_name)
            .ok_or_else(|| format!("unknown type {type_name}"))?;
        let name_token = self.expect_ident()?;
        let name = self.text(name_token).to_string();

        let mut children = Vec::new();
        if self.at_punct('=') {
            self.next()?;
            children.push(self.expr()?.0);
        }
        let semi = self.expect_punct(';')?;
        let range = TextRange::new(type_token.range.start, semi.range.end);
        let id = self.node(Kind::VariableDecl, range, Some(&name), &children);
        self.bind(id, SymbolKind::Local, Some(ty));
        self.fixture.locals.insert(name, ty);
        Ok(id)
    }

    fn expr(&mut self) -> Result<Expr, String> {
        let (target, ty) = self.postfix()?;
        if !self.at_punct('=') {
            return Ok((target, ty));
        }
        self.next()?;
        let (value, _) = self.expr()?;
        let range = TextRange::new(self.builder.range(target).start, self.builder.range(value).end);
        let id = self.node(Kind::Assignment, range, None, &[target, value]);
        self.bind(id, SymbolKind::Value, ty);
        Ok((id, ty))
    }

    fn postfix(&mut self) -> Result<Expr, String> {
        let (mut receiver, mut receiver_ty) = self.primary()?;
        while self.at_punct('.') {
            self.next()?;
            let name_token = self.expect_ident()?;
            let name = self.text(name_token).to_string();
            let start = self.builder.range(receiver).start;
            let select_range = TextRange::new(start, name_token.range.end);
            let select = self.node(Kind::MemberSelect, select_range, Some(&name), &[receiver]);

            if self.at_punct('(') {
                (receiver, receiver_ty) = self.call(select, receiver_ty, &name)?;
            } else {
                let field_ty = (receiver_ty == Some(self.fixture.this_type))
                    .then(|| self.fixture.fields.get(&name).copied())
                    .flatten();
                if let Some(ty) = field_ty {
                    let owner = self.fixture.this_type;
                    self.fixture.types.bind(
                        select,
                        Binding {
                            kind: SymbolKind::Field,
                            ty: Some(ty),
                            owner: Some(owner),
                            returns: None,
                        },
                    );
                }
                receiver = select;
                receiver_ty = field_ty;
            }
        }
        Ok((receiver, receiver_ty))
    }

    /// Parses an argument list after `callee` and builds the invocation.
    fn call(&mut self, callee: NodeId, owner: Option<TypeId>, name: &str) -> Result<Expr, String> {
        let method = owner.and_then(|owner| self.fixture.find_method(owner, name));
        if let Some((declaring, returns)) = method {
            self.fixture.types.bind(
                callee,
                Binding {
                    kind: SymbolKind::Method,
                    ty: None,
                    owner: Some(declaring),
                    returns: Some(returns),
                },
            );
        }
        let returns = method.map(|(_, returns)| returns);

        let (mut children, close) = self.arguments()?;
        children.insert(0, callee);
        let range = TextRange::new(self.builder.range(callee).start, close.range.end);
        let id = self.node(Kind::MethodInvocation, range, None, &children);
        self.bind(id, SymbolKind::Value, returns);
        Ok((id, returns))
    }

    fn arguments(&mut self) -> Result<(Vec<NodeId>, Token), String> {
        self.expect_punct('(')?;
        let mut args = Vec::new();
        loop {
            if self.at_punct(')') {
                return Ok((args, self.next()?));
            }
            if !args.is_empty() {
                self.expect_punct(',')?;
            }
            args.push(self.expr()?.0);
        }
    }

    fn primary(&mut self) -> Result<Expr, String> {
        let token = self.next()?;
        match token.tok {
            Tok::Str => {
                let ty = self.fixture.resolve_type_name("java.lang.String");
                let id = self.node(Kind::Literal, token.range, None, &[]);
                self.bind(id, SymbolKind::Value, ty);
                Ok((id, ty))
            }
            Tok::Num => {
                let ty = self.fixture.resolve_type_name("int");
                let id = self.node(Kind::Literal, token.range, None, &[]);
                self.bind(id, SymbolKind::Value, ty);
                Ok((id, ty))
            }
            Tok::Punct('(') => {
                let (inner, ty) = self.expr()?;
                let close = self.expect_punct(')')?;
                let range = TextRange::new(token.range.start, close.range.end);
                let id = self.node(Kind::Parenthesized, range, None, &[inner]);
                self.bind(id, SymbolKind::Value, ty);
                Ok((id, ty))
            }
            Tok::Ident => self.name(token),
            Tok::Punct(c) => Err(format!("unexpected {c:?} at {}", token.range.start)),
        }
    }

    fn name(&mut self, token: Token) -> Result<Expr, String> {
        let text = self.text(token).to_string();
        match text.as_str() {
            "true" | "false" => {
                let ty = self.fixture.resolve_type_name("boolean");
                let id = self.node(Kind::Literal, token.range, None, &[]);
                self.bind(id, SymbolKind::Value, ty);
                Ok((id, ty))
            }
            "null" => Ok((self.node(Kind::Literal, token.range, None, &[]), None)),
            "new" => {
                let type_token = self.expect_ident()?;
                let ty = self.fixture.resolve_type_name(self.text(type_token));
                let (args, close) = self.arguments()?;
                let range = TextRange::new(token.range.start, close.range.end);
                let id = self.node(Kind::NewObject, range, None, &args);
                self.bind(id, SymbolKind::Value, ty);
                Ok((id, ty))
            }
            "this" => {
                let ty = Some(self.fixture.this_type);
                let id = self.node(Kind::Identifier, token.range, Some("this"), &[]);
                self.bind(id, SymbolKind::Local, ty);
                Ok((id, ty))
            }
            _ if self.at_punct('(') => {
                let callee = self.node(Kind::Identifier, token.range, Some(&text), &[]);
                let this_type = self.fixture.this_type;
                self.call(callee, Some(this_type), &text)
            }
            _ => {
                let id = self.node(Kind::Identifier, token.range, Some(&text), &[]);
                let binding = if let Some(&ty) = self.fixture.locals.get(&text) {
                    Some((SymbolKind::Local, ty, None))
                } else if let Some(&ty) = self.fixture.fields.get(&text) {
                    Some((SymbolKind::Field, ty, Some(self.fixture.this_type)))
                } else {
                    self.fixture
                        .resolve_type_name(&text)
                        .map(|ty| (SymbolKind::Type, ty, None))
                };
                let Some((kind, ty, owner)) = binding else {
                    return Ok((id, None));
                };
                self.fixture.types.bind(
                    id,
                    Binding {
                        kind,
                        ty: Some(ty),
                        owner,
                        returns: None,
                    },
                );
                Ok((id, Some(ty)))
            }
        }
    }
}
