use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::bind::RecordBinder;
use crate::context::{FieldRef, ParseContext};
use crate::error::Error;
use crate::lexer::Lexer;
use crate::nodes::custom::Parseable;
use crate::nodes::{GroupMode, Node, ProductionFn};
use crate::peek::PeekingLexer;
use crate::record::{Record, RecordDef, UnionDef};
use crate::stream::TokenStream;
use crate::token::{Position, TokenType, UNTYPED};
use crate::value::Value;

/// Index of a node in the grammar's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(pub(crate) usize);

/// Index of a registered record definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub(crate) usize);

/// Index of a registered union definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnionId(pub(crate) usize);

/// Default bound on every repeating group.
pub const MAX_ITERATIONS: usize = 1_000_000;

#[derive(Debug, Clone)]
pub(crate) struct GrammarConfig {
    pub lookahead: usize,
    pub max_iterations: usize,
    pub case_insensitive: HashSet<TokenType>,
    pub allow_trailing: bool,
    pub strict_coercion: bool,
    pub elide: Vec<TokenType>,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        GrammarConfig {
            // Unbounded lookahead before commitment unless configured.
            lookahead: usize::MAX,
            max_iterations: MAX_ITERATIONS,
            case_insensitive: HashSet::new(),
            allow_trailing: false,
            strict_coercion: false,
            elide: Vec::new(),
        }
    }
}

/// A built grammar: the node DAG, the registered record and union shapes,
/// one compiled binder per record, and the parse configuration.
///
/// Construct with [`GrammarBuilder`]; a `Grammar` is immutable and can be
/// shared across any number of parses.
#[derive(Debug)]
pub struct Grammar {
    pub(crate) nodes: Vec<Node>,
    pub(crate) records: Vec<Arc<RecordDef>>,
    pub(crate) unions: Vec<Arc<UnionDef>>,
    pub(crate) binders: Vec<RecordBinder>,
    pub(crate) config: GrammarConfig,
    root: NodeId,
}

impl Grammar {
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// The root record node the grammar was built with.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn record_def(&self, id: RecordId) -> &Arc<RecordDef> {
        &self.records[id.0]
    }

    pub(crate) fn union_def(&self, id: UnionId) -> &Arc<UnionDef> {
        &self.unions[id.0]
    }

    pub(crate) fn binder(&self, id: RecordId) -> &RecordBinder {
        &self.binders[id.0]
    }

    /// Lex `lexer` to completion and parse the resulting stream.
    pub fn parse<L: Lexer>(&self, lexer: L) -> Result<Record, Error> {
        let stream = TokenStream::build(lexer, self.config.elide.iter().copied())?;
        self.parse_stream(&stream)
    }

    /// Parse a pre-built token stream.
    pub fn parse_stream(&self, stream: &TokenStream) -> Result<Record, Error> {
        match self.run(stream) {
            (_, Some(error)) => Err(error),
            (Some(record), None) => Ok(record),
            (None, None) => Err(Error::parse(
                "root node produced no record",
                Position::default(),
            )),
        }
    }

    /// Parse, returning whatever partial tree was assembled alongside any
    /// error instead of discarding it.
    pub fn parse_partial(&self, stream: &TokenStream) -> (Option<Record>, Option<Error>) {
        self.run(stream)
    }

    fn run(&self, stream: &TokenStream) -> (Option<Record>, Option<Error>) {
        let mut ctx = ParseContext::new(PeekingLexer::new(stream), self.config.lookahead);
        match self.parse_node(self.root, &mut ctx) {
            Err(failure) => {
                let partial = failure.partial.into_iter().find_map(Value::into_record);
                (partial, Some(failure.error))
            }
            Ok(None) => {
                let fallback = Error::unexpected(ctx.lex.peek());
                (None, Some(ctx.deepest_error(fallback)))
            }
            Ok(Some(values)) => {
                let record = values.into_iter().find_map(Value::into_record);
                let trailing = ctx.lex.peek();
                if !self.config.allow_trailing && !trailing.is_eof() {
                    let fallback = Error::unexpected(trailing);
                    (record, Some(ctx.deepest_error(fallback)))
                } else {
                    (record, None)
                }
            }
        }
    }
}

/// Incremental constructor for a [`Grammar`].
///
/// Register record and union shapes, assemble the node DAG bottom-up, then
/// call [`GrammarBuilder::build`] with the root record node.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    nodes: Vec<Node>,
    records: Vec<Arc<RecordDef>>,
    unions: Vec<Arc<UnionDef>>,
    config: GrammarConfig,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        GrammarBuilder::default()
    }

    pub fn record(&mut self, def: RecordDef) -> RecordId {
        self.records.push(Arc::new(def));
        RecordId(self.records.len() - 1)
    }

    pub fn union(&mut self, def: UnionDef) -> UnionId {
        self.unions.push(Arc::new(def));
        UnionId(self.unions.len() - 1)
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Match a token by exact value, any type.
    pub fn literal(&mut self, value: impl Into<String>) -> NodeId {
        self.push(Node::Literal {
            value: value.into(),
            ty: None,
            ty_name: None,
        })
    }

    /// Match a token by exact value and type. Passing [`UNTYPED`] is the
    /// same as [`GrammarBuilder::literal`].
    pub fn literal_typed(
        &mut self,
        value: impl Into<String>,
        ty: TokenType,
        ty_name: impl Into<String>,
    ) -> NodeId {
        let (ty, ty_name) = if ty == UNTYPED {
            (None, None)
        } else {
            (Some(ty), Some(ty_name.into()))
        };
        self.push(Node::Literal {
            value: value.into(),
            ty,
            ty_name,
        })
    }

    /// Match a token by type alone; `name` is the symbolic name used in
    /// diagnostics.
    pub fn reference(&mut self, ty: TokenType, name: impl Into<String>) -> NodeId {
        self.push(Node::Reference {
            ty,
            name: name.into(),
        })
    }

    pub fn sequence(&mut self, items: Vec<NodeId>) -> NodeId {
        self.push(Node::Sequence { items })
    }

    /// Ordered choice over the alternatives.
    pub fn choice(&mut self, alts: Vec<NodeId>) -> NodeId {
        self.push(Node::Disjunction { alts, switch: None })
    }

    pub fn group(&mut self, expr: NodeId, mode: GroupMode) -> NodeId {
        self.push(Node::Group { expr, mode })
    }

    /// `( expr )?`
    pub fn optional(&mut self, expr: NodeId) -> NodeId {
        self.group(expr, GroupMode::ZeroOrOne)
    }

    /// `( expr )*`
    pub fn many(&mut self, expr: NodeId) -> NodeId {
        self.group(expr, GroupMode::ZeroOrMore)
    }

    /// `( expr )+`
    pub fn some(&mut self, expr: NodeId) -> NodeId {
        self.group(expr, GroupMode::OneOrMore)
    }

    /// `( expr )!`
    pub fn non_empty(&mut self, expr: NodeId) -> NodeId {
        self.group(expr, GroupMode::NonEmpty)
    }

    /// `(?= expr)`
    pub fn lookahead(&mut self, expr: NodeId) -> NodeId {
        self.push(Node::Lookahead {
            expr,
            negative: false,
        })
    }

    /// `(?! expr)`
    pub fn negative_lookahead(&mut self, expr: NodeId) -> NodeId {
        self.push(Node::Lookahead {
            expr,
            negative: true,
        })
    }

    /// `!expr`
    pub fn negation(&mut self, expr: NodeId) -> NodeId {
        self.push(Node::Negation { expr })
    }

    /// Capture the child's values into the named field of `record`.
    pub fn capture(
        &mut self,
        record: RecordId,
        field: &str,
        expr: NodeId,
    ) -> Result<NodeId, Error> {
        let def = &self.records[record.0];
        let index = def.field_index(field).ok_or_else(|| {
            Error::parse(
                format!("record {} has no field {}", def.name(), field),
                Position::default(),
            )
        })?;
        Ok(self.push(Node::Capture {
            field: FieldRef {
                record: record.0,
                index,
            },
            field_name: field.to_string(),
            expr,
        }))
    }

    /// A record (struct) boundary around `expr`.
    pub fn record_node(&mut self, def: RecordId, expr: NodeId) -> NodeId {
        self.push(Node::Record { def, expr })
    }

    /// A sum type: ordered choice over `alts`, whose matched value is
    /// converted to the corresponding member of `def`.
    pub fn union_node(&mut self, def: UnionId, alts: Vec<NodeId>) -> NodeId {
        let expr = self.choice(alts);
        self.push(Node::Union { def, expr })
    }

    /// Register a custom production under `name`.
    pub fn custom(
        &mut self,
        name: impl Into<String>,
        f: impl for<'t> Fn(&mut PeekingLexer<'t>) -> Result<Value, Error> + Send + Sync + 'static,
    ) -> NodeId {
        self.push(Node::Custom {
            name: name.into(),
            parse: ProductionFn::new(f),
        })
    }

    /// A production supplied by the target type's [`Parseable`] impl.
    pub fn parseable<T: Parseable>(&mut self) -> NodeId {
        let name = T::name().to_string();
        self.push(Node::Parseable {
            name,
            parse: ProductionFn::new(|lex: &mut PeekingLexer<'_>| {
                T::parse(lex).map(Value::custom)
            }),
        })
    }

    /// Token types to skip unless explicitly matched (whitespace, comments).
    pub fn elide(&mut self, types: impl IntoIterator<Item = TokenType>) -> &mut Self {
        self.config.elide.extend(types);
        self
    }

    /// Number of non-elided tokens a branch may consume before its failure
    /// becomes fatal instead of backtrackable. Unbounded by default.
    pub fn lookahead_limit(&mut self, tokens: usize) -> &mut Self {
        self.config.lookahead = tokens;
        self
    }

    /// Bound on every repeating group; [`MAX_ITERATIONS`] by default.
    pub fn max_iterations(&mut self, limit: usize) -> &mut Self {
        self.config.max_iterations = limit;
        self
    }

    /// Token types whose literal matches compare case-insensitively.
    pub fn case_insensitive(&mut self, types: impl IntoIterator<Item = TokenType>) -> &mut Self {
        self.config.case_insensitive.extend(types);
        self
    }

    /// Permit non-EOF tokens after the root match.
    pub fn allow_trailing(&mut self, allow: bool) -> &mut Self {
        self.config.allow_trailing = allow;
        self
    }

    /// Turn the numeric increment-on-mismatch binding rule into an error.
    pub fn strict_coercion(&mut self, strict: bool) -> &mut Self {
        self.config.strict_coercion = strict;
        self
    }

    /// Validate and finish the grammar. `root` must be a record node.
    pub fn build(mut self, root: NodeId) -> Result<Grammar, Error> {
        if root.0 >= self.nodes.len() {
            return Err(Error::parse("root node out of range", Position::default()));
        }
        if !matches!(self.nodes[root.0], Node::Record { .. }) {
            return Err(Error::parse(
                "root of a grammar must be a record node",
                Position::default(),
            ));
        }
        self.check_children()?;
        self.compile_literal_switches();
        let binders = self.records.iter().map(|d| RecordBinder::compile(d)).collect();
        Ok(Grammar {
            nodes: self.nodes,
            records: self.records,
            unions: self.unions,
            binders,
            config: self.config,
            root,
        })
    }

    fn check_children(&self) -> Result<(), Error> {
        let bound = self.nodes.len();
        let ok = |id: &NodeId| id.0 < bound;
        for node in &self.nodes {
            let valid = match node {
                Node::Sequence { items } => items.iter().all(ok),
                Node::Disjunction { alts, .. } => alts.iter().all(ok),
                Node::Group { expr, .. }
                | Node::Lookahead { expr, .. }
                | Node::Negation { expr }
                | Node::Capture { expr, .. }
                | Node::Record { expr, .. }
                | Node::Union { expr, .. } => ok(expr),
                Node::Literal { .. }
                | Node::Reference { .. }
                | Node::Custom { .. }
                | Node::Parseable { .. } => true,
            };
            if !valid {
                return Err(Error::parse(
                    "grammar node references an unregistered child",
                    Position::default(),
                ));
            }
        }
        Ok(())
    }

    /// Precompute the literal-dispatch table for disjunctions whose
    /// alternatives are all untyped literals. Skipped when any token type
    /// matches case-insensitively: the table compares values exactly.
    fn compile_literal_switches(&mut self) {
        if !self.config.case_insensitive.is_empty() {
            return;
        }
        let literal_value = |nodes: &[Node], id: NodeId| match &nodes[id.0] {
            Node::Literal {
                value, ty: None, ..
            } if !value.is_empty() => Some(value.clone()),
            _ => None,
        };
        let mut switches: Vec<(usize, HashMap<String, usize>)> = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Disjunction { alts, .. } = node {
                if alts.is_empty() {
                    continue;
                }
                let mut table = HashMap::new();
                let mut all_literals = true;
                for (alt_index, alt) in alts.iter().enumerate() {
                    match literal_value(&self.nodes, *alt) {
                        Some(value) => {
                            // First alternative wins for duplicate values.
                            table.entry(value).or_insert(alt_index);
                        }
                        None => {
                            all_literals = false;
                            break;
                        }
                    }
                }
                if all_literals {
                    switches.push((i, table));
                }
            }
        }
        for (i, table) in switches {
            if let Node::Disjunction { switch, .. } = &mut self.nodes[i] {
                *switch = Some(table);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::VecLexer;
    use crate::record::{FieldDef, FieldType};
    use crate::tests::support::{tokens, IDENT, WS};

    fn minimal_builder() -> (GrammarBuilder, RecordId) {
        let mut b = GrammarBuilder::new();
        let root = b.record(RecordDef::new(
            "Root",
            vec![FieldDef::new("value", FieldType::String)],
        ));
        (b, root)
    }

    #[test]
    fn test_root_must_be_record_node() {
        let (mut b, _root) = minimal_builder();
        let lit = b.literal("x");
        let err = b.build(lit).unwrap_err();
        match err {
            Error::Parse { message, .. } => assert!(message.contains("record node")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_capture_rejects_unknown_field() {
        let (mut b, root) = minimal_builder();
        let lit = b.literal("x");
        let err = b.capture(root, "missing", lit).unwrap_err();
        match err {
            Error::Parse { message, .. } => {
                assert!(message.contains("no field missing"), "got: {}", message)
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_end_to_end_with_elision() {
        let (mut b, root) = minimal_builder();
        b.elide([WS]);
        let a = b.literal("a");
        let b2 = b.literal("b");
        let seq = b.sequence(vec![a, b2]);
        let cap = b.capture(root, "value", seq).unwrap();
        let root_node = b.record_node(root, cap);
        let g = b.build(root_node).unwrap();

        let record = g
            .parse(VecLexer::new(tokens(&[
                (WS, " "),
                (IDENT, "a"),
                (WS, " "),
                (IDENT, "b"),
                (WS, " "),
            ])))
            .unwrap();
        assert_eq!(record.get("value").unwrap().as_str(), Some("ab"));
    }

    #[test]
    fn test_root_no_match_reports_unexpected_token() {
        let (mut b, root) = minimal_builder();
        let a = b.literal("a");
        let cap = b.capture(root, "value", a).unwrap();
        let root_node = b.record_node(root, cap);
        let g = b.build(root_node).unwrap();

        let err = g.parse(VecLexer::new(tokens(&[(IDENT, "z")]))).unwrap_err();
        match err {
            Error::UnexpectedToken(u) => assert_eq!(u.token.value, "z"),
            other => panic!("expected unexpected-token, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_from_pooled_stream() {
        let (mut b, root) = minimal_builder();
        let a = b.literal("a");
        let cap = b.capture(root, "value", a).unwrap();
        let root_node = b.record_node(root, cap);
        let g = b.build(root_node).unwrap();

        let stream =
            crate::stream::TokenStream::pooled(VecLexer::new(tokens(&[(IDENT, "a")])), []).unwrap();
        let record = g.parse_stream(&stream).unwrap();
        assert_eq!(record.get("value").unwrap().as_str(), Some("a"));
    }
}
