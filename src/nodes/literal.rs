use crate::context::ParseContext;
use crate::grammar::Grammar;
use crate::nodes::NodeResult;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Match a token by exact value, optionally constrained by token type. The
/// scan crosses the elided run, so a literal can deliberately match an
/// elided token (whitespace, comments) by value. Comparison is
/// case-insensitive for token types in the configured set.
pub(crate) fn parse(
    g: &Grammar,
    ctx: &mut ParseContext<'_>,
    value: &str,
    ty: Option<TokenType>,
) -> NodeResult {
    let matches = |t: &Token| {
        let value_ok = if value.is_empty() {
            true
        } else if g.config.case_insensitive.contains(&t.ty) {
            t.value.to_lowercase() == value.to_lowercase()
        } else {
            t.value == value
        };
        let type_ok = match ty {
            None => true,
            Some(ty) => ty == t.ty,
        };
        value_ok && type_ok
    };

    let (token, cursor) = ctx.lex.peek_any(&matches);
    if matches(token) {
        ctx.lex.fast_forward(cursor);
        return Ok(Some(vec![Value::String(token.value.clone())]));
    }
    Ok(None)
}
