use crate::context::ParseContext;
use crate::nodes::NodeResult;
use crate::token::TokenType;
use crate::value::Value;

/// Match a token by type alone, returning its text. Like literals, the scan
/// crosses the elided run so that an elided type can be matched explicitly.
pub(crate) fn parse(ctx: &mut ParseContext<'_>, ty: TokenType) -> NodeResult {
    let (token, cursor) = ctx.lex.peek_any(|t| t.ty == ty);
    if token.ty != ty {
        return Ok(None);
    }
    ctx.lex.fast_forward(cursor);
    Ok(Some(vec![Value::String(token.value.clone())]))
}
