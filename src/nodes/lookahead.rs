use crate::context::ParseContext;
use crate::error::Error;
use crate::grammar::{Grammar, NodeId};
use crate::nodes::{NodeError, NodeResult};

/// Lookahead assertion: parse the inner node in a branch that is never
/// committed. Positive lookahead succeeds iff the inner node matched,
/// negative iff it did not. Never advances the cursor, never captures.
pub(crate) fn parse(
    g: &Grammar,
    ctx: &mut ParseContext<'_>,
    expr: NodeId,
    negative: bool,
) -> NodeResult {
    let mut branch = ctx.branch();
    let matched = matches!(g.parse_node(expr, &mut branch), Ok(Some(_)));
    if matched == negative {
        return Err(NodeError::new(Error::unexpected(ctx.lex.peek())));
    }
    // An empty value list means a match, unlike None.
    Ok(Some(Vec::new()))
}
