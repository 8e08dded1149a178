//! The grammar node evaluators.
//!
//! Every node kind implements one parse function against the shared
//! [`ParseContext`], with uniform result conventions:
//!
//! - `Ok(None)` — the node did not match and consumed no input;
//! - `Ok(Some(values))` — a match, possibly of zero captures (the two are
//!   distinct: an absent optional still counts as matched-with-empty);
//! - `Err(NodeError)` — a failure carrying a best-effort partial tree for
//!   diagnostics.

pub(crate) mod capture;
pub(crate) mod custom;
pub(crate) mod disjunction;
pub(crate) mod ebnf;
pub(crate) mod group;
pub(crate) mod literal;
pub(crate) mod lookahead;
pub(crate) mod negation;
pub(crate) mod record;
pub(crate) mod reference;
pub(crate) mod sequence;
pub(crate) mod union;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::context::{FieldRef, ParseContext};
use crate::error::Error;
use crate::grammar::{Grammar, NodeId, RecordId, UnionId};
use crate::peek::PeekingLexer;
use crate::token::TokenType;
use crate::value::Value;

/// Repetition behavior of a group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    /// `( x )` — delegate directly.
    Once,
    /// `( x )?`
    ZeroOrOne,
    /// `( x )*`
    ZeroOrMore,
    /// `( x )+`
    OneOrMore,
    /// `( x )!` — must capture at least one value if it matches.
    NonEmpty,
}

/// A user-supplied production: consumes the lexer directly and returns a
/// value, or [`Error::NoMatch`] to decline.
#[derive(Clone)]
pub struct ProductionFn(
    pub(crate) Arc<dyn for<'t> Fn(&mut PeekingLexer<'t>) -> Result<Value, Error> + Send + Sync>,
);

impl ProductionFn {
    pub fn new(
        f: impl for<'t> Fn(&mut PeekingLexer<'t>) -> Result<Value, Error> + Send + Sync + 'static,
    ) -> Self {
        ProductionFn(Arc::new(f))
    }
}

impl fmt::Debug for ProductionFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductionFn")
    }
}

/// One node of the grammar DAG. Children are arena indices, so a node can be
/// shared by several parents and recursion is an id reference.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    /// Chain of children that must all match once the first one has.
    Sequence { items: Vec<NodeId> },
    /// Ordered choice. `switch` is the literal-dispatch fast path, present
    /// when every alternative is an untyped literal and no token type is
    /// case-insensitive: value of the next token -> first alternative index.
    Disjunction {
        alts: Vec<NodeId>,
        switch: Option<HashMap<String, usize>>,
    },
    Group {
        expr: NodeId,
        mode: GroupMode,
    },
    /// `(?= x)` / `(?! x)`; never consumes, never captures.
    Lookahead {
        expr: NodeId,
        negative: bool,
    },
    /// `!x` — consume one token provided `x` does not match here.
    Negation { expr: NodeId },
    /// Match a token by exact value, optionally constrained by type.
    Literal {
        value: String,
        ty: Option<TokenType>,
        ty_name: Option<String>,
    },
    /// Match a token by type alone.
    Reference { ty: TokenType, name: String },
    /// Defer the child's captures onto a field of the enclosing record.
    Capture {
        field: FieldRef,
        field_name: String,
        expr: NodeId,
    },
    /// A record (struct) boundary: allocates the instance, injects
    /// provenance, commits deferred assignments on success.
    Record { def: RecordId, expr: NodeId },
    /// A sum type: a disjunction whose matched alternative is converted to
    /// the union member it corresponds to.
    Union { def: UnionId, expr: NodeId },
    /// Production registered for a type by the grammar author.
    Custom { name: String, parse: ProductionFn },
    /// Production supplied by the target type itself.
    Parseable { name: String, parse: ProductionFn },
}

/// A failed match: the error plus whatever partial tree the node assembled.
#[derive(Debug)]
pub(crate) struct NodeError {
    pub error: Error,
    pub partial: Vec<Value>,
}

impl NodeError {
    pub(crate) fn new(error: Error) -> Self {
        NodeError {
            error,
            partial: Vec::new(),
        }
    }

    pub(crate) fn with_partial(error: Error, partial: Vec<Value>) -> Self {
        NodeError { error, partial }
    }
}

impl From<Error> for NodeError {
    fn from(error: Error) -> Self {
        NodeError::new(error)
    }
}

pub(crate) type NodeResult = Result<Option<Vec<Value>>, NodeError>;

impl Grammar {
    /// Evaluate one node. All node kinds dispatch through here so that
    /// tracing sees every entry and exit.
    pub(crate) fn parse_node(&self, id: NodeId, ctx: &mut ParseContext<'_>) -> NodeResult {
        trace!(
            depth = ctx.depth,
            node = %self.ebnf(id),
            token = %ctx.lex.peek(),
            "parse"
        );
        ctx.depth += 1;
        let result = match self.node(id) {
            Node::Sequence { items } => sequence::parse(self, ctx, items),
            Node::Disjunction { alts, switch } => {
                disjunction::parse(self, ctx, alts, switch.as_ref())
            }
            Node::Group { expr, mode } => group::parse(self, ctx, id, *expr, *mode),
            Node::Lookahead { expr, negative } => lookahead::parse(self, ctx, *expr, *negative),
            Node::Negation { expr } => negation::parse(self, ctx, *expr),
            Node::Literal { value, ty, .. } => literal::parse(self, ctx, value, *ty),
            Node::Reference { ty, .. } => reference::parse(ctx, *ty),
            Node::Capture { field, expr, .. } => capture::parse(self, ctx, *field, *expr),
            Node::Record { def, expr } => record::parse(self, ctx, *def, *expr),
            Node::Union { def, expr } => union::parse(self, ctx, *def, *expr),
            Node::Custom { parse, .. } | Node::Parseable { parse, .. } => {
                custom::parse(ctx, parse)
            }
        };
        ctx.depth -= 1;
        match &result {
            Ok(Some(values)) => trace!(depth = ctx.depth, captures = values.len(), "match"),
            Ok(None) => trace!(depth = ctx.depth, "no match"),
            Err(failure) => trace!(depth = ctx.depth, error = %failure.error, "fail"),
        }
        result
    }
}
