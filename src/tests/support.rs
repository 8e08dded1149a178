//! Token and grammar builders shared by the unit tests.

use crate::context::ParseContext;
use crate::grammar::{Grammar, GrammarBuilder, NodeId, RecordId, UnionId};
use crate::lexer::VecLexer;
use crate::nodes::Node;
use crate::peek::PeekingLexer;
use crate::record::{FieldDef, FieldType, RecordDef, UnionDef, UnionMember};
use crate::stream::TokenStream;
use crate::token::{Position, Token, TokenType};

pub(crate) const IDENT: TokenType = 2;
pub(crate) const INT: TokenType = 3;
pub(crate) const OP: TokenType = 4;
pub(crate) const PUNCT: TokenType = 5;
pub(crate) const WS: TokenType = 6;
pub(crate) const COMMENT: TokenType = 7;

/// Lay the given tokens out back to back on one line, offsets accumulating
/// by value length.
pub(crate) fn tokens(entries: &[(TokenType, &str)]) -> Vec<Token> {
    let mut offset = 0;
    entries.iter()
        .map(|(ty, value)| {
            let t = Token::new(*ty, *value, Position::new("", offset, 1, offset + 1));
            offset += value.len();
            t
        })
        .collect()
}

/// The standard root record used by node-level tests.
fn root_record() -> RecordDef {
    RecordDef::new(
        "Root",
        vec![
            FieldDef::new("value", FieldType::String),
            FieldDef::new("count", FieldType::Int(64)),
            FieldDef::new("items", FieldType::List(Box::new(FieldType::String))),
            FieldDef::new("flag", FieldType::Bool),
        ],
    )
}

fn build(
    entries: &[(TokenType, &str)],
    elide: &[TokenType],
    root_def: RecordDef,
    configure: impl FnOnce(&mut GrammarBuilder),
    f: impl FnOnce(&mut GrammarBuilder, RecordId) -> NodeId,
) -> (Grammar, TokenStream) {
    let mut b = GrammarBuilder::new();
    b.elide(elide.iter().copied());
    configure(&mut b);
    let root = b.record(root_def);
    let expr = f(&mut b, root);
    let root_node = b.record_node(root, expr);
    let grammar = b.build(root_node).unwrap();
    let stream = TokenStream::build(VecLexer::new(tokens(entries)), elide.iter().copied()).unwrap();
    (grammar, stream)
}

/// Grammar over a "Root" record with a standard field set; the closure
/// builds the root expression.
pub(crate) fn grammar(
    entries: &[(TokenType, &str)],
    f: impl FnOnce(&mut GrammarBuilder, RecordId) -> NodeId,
) -> (Grammar, TokenStream) {
    build(entries, &[], root_record(), |_| {}, f)
}

/// Like [`grammar`], with config applied before construction.
pub(crate) fn grammar_configured(
    entries: &[(TokenType, &str)],
    configure: impl FnOnce(&mut GrammarBuilder),
    f: impl FnOnce(&mut GrammarBuilder, RecordId) -> NodeId,
) -> (Grammar, TokenStream) {
    build(entries, &[], root_record(), configure, f)
}

/// Like [`grammar`], with an elision set shared by grammar and stream.
pub(crate) fn grammar_elided(
    entries: &[(TokenType, &str)],
    elide: &[TokenType],
    f: impl FnOnce(&mut GrammarBuilder, RecordId) -> NodeId,
) -> (Grammar, TokenStream) {
    build(entries, elide, root_record(), |_| {}, f)
}

/// Root record that opts into all three provenance fields.
pub(crate) fn grammar_with_provenance(
    entries: &[(TokenType, &str)],
    elide: &[TokenType],
    f: impl FnOnce(&mut GrammarBuilder, RecordId) -> NodeId,
) -> (Grammar, TokenStream) {
    let def = RecordDef::new(
        "Root",
        vec![
            FieldDef::new("pos", FieldType::Position),
            FieldDef::new("end_pos", FieldType::Position),
            FieldDef::new("tokens", FieldType::Tokens),
            FieldDef::new("value", FieldType::String),
        ],
    );
    build(entries, elide, def, |_| {}, f)
}

/// An outer "Root" record holding an inner "Inner" record in its `sub` field.
pub(crate) fn grammar_nested(
    entries: &[(TokenType, &str)],
    f: impl FnOnce(&mut GrammarBuilder, RecordId, RecordId) -> NodeId,
) -> (Grammar, TokenStream) {
    let mut b = GrammarBuilder::new();
    let outer = b.record(RecordDef::new(
        "Root",
        vec![
            FieldDef::new("sub", FieldType::Record("Inner".to_string())),
            FieldDef::new("value", FieldType::String),
        ],
    ));
    let inner = b.record(RecordDef::new(
        "Inner",
        vec![FieldDef::new("value", FieldType::String)],
    ));
    let expr = f(&mut b, outer, inner);
    let root_node = b.record_node(outer, expr);
    let grammar = b.build(root_node).unwrap();
    let stream = TokenStream::build(VecLexer::new(tokens(entries)), []).unwrap();
    (grammar, stream)
}

pub(crate) struct UnionDefs {
    pub union: UnionId,
    pub ident_record: RecordId,
    pub int_record: RecordId,
}

/// An "Atom" union over "IdentLit" and "IntLit" member records; the root's
/// `atom` field can receive it.
pub(crate) fn grammar_union(
    entries: &[(TokenType, &str)],
    f: impl FnOnce(&mut GrammarBuilder, &UnionDefs) -> NodeId,
) -> (Grammar, TokenStream) {
    let mut b = GrammarBuilder::new();
    let root = b.record(RecordDef::new(
        "Root",
        vec![FieldDef::new("atom", FieldType::Union("Atom".to_string()))],
    ));
    let ident_record = b.record(RecordDef::new(
        "IdentLit",
        vec![FieldDef::new("value", FieldType::String)],
    ));
    let int_record = b.record(RecordDef::new(
        "IntLit",
        vec![FieldDef::new("value", FieldType::String)],
    ));
    let union = b.union(UnionDef::new(
        "Atom",
        vec![UnionMember::new("IdentLit"), UnionMember::new("IntLit")],
    ));
    let defs = UnionDefs {
        union,
        ident_record,
        int_record,
    };
    let expr = f(&mut b, &defs);
    let root_node = b.record_node(root, expr);
    let grammar = b.build(root_node).unwrap();
    let stream = TokenStream::build(VecLexer::new(tokens(entries)), []).unwrap();
    (grammar, stream)
}

/// Fresh context over the stream with unbounded lookahead.
pub(crate) fn context(stream: &TokenStream) -> ParseContext<'_> {
    ParseContext::new(PeekingLexer::new(stream), usize::MAX)
}

pub(crate) fn context_with_lookahead(stream: &TokenStream, lookahead: usize) -> ParseContext<'_> {
    ParseContext::new(PeekingLexer::new(stream), lookahead)
}

/// The inner expression of the grammar's root record node, for tests that
/// exercise a node kind directly.
pub(crate) fn root_expr(g: &Grammar) -> NodeId {
    match g.node(g.root()) {
        Node::Record { expr, .. } => *expr,
        _ => unreachable!("root is always a record node"),
    }
}
