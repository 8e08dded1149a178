use crate::context::ParseContext;
use crate::error::Error;
use crate::grammar::{Grammar, NodeId};
use crate::nodes::{NodeError, NodeResult};
use crate::value::Value;

/// A chain of children. If the head does not match, the whole sequence is a
/// no-match; after the head has matched, every remaining child must match or
/// the sequence fails with an unexpected-token error at the current position.
pub(crate) fn parse(g: &Grammar, ctx: &mut ParseContext<'_>, items: &[NodeId]) -> NodeResult {
    let mut out: Option<Vec<Value>> = None;
    for (i, item) in items.iter().enumerate() {
        match g.parse_node(*item, ctx) {
            Err(failure) => {
                let mut partial = out.unwrap_or_default();
                partial.extend(failure.partial);
                return Err(NodeError::with_partial(failure.error, partial));
            }
            Ok(None) => {
                if i == 0 {
                    return Ok(None);
                }
                let token = ctx.lex.peek();
                let error = Error::unexpected_expecting(token, g.ebnf(*item));
                return Err(NodeError::with_partial(error, out.unwrap_or_default()));
            }
            Ok(Some(values)) => {
                // An empty (but matched) child still flips the accumulator
                // from no-match to matched-with-zero-captures.
                out.get_or_insert_with(Vec::new).extend(values);
            }
        }
    }
    Ok(out)
}
