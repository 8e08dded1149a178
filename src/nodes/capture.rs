use crate::context::{FieldRef, ParseContext};
use crate::grammar::{Grammar, NodeId};
use crate::nodes::{NodeError, NodeResult};
use crate::value::Value;

/// Capture: after the child matches, queue its values for assignment to a
/// field of the enclosing record, tagged with the raw token range the child
/// spanned. The assignment itself waits for the record's commit. On failure
/// the child's partial values are still queued so a best-effort partial tree
/// can include them.
pub(crate) fn parse(
    g: &Grammar,
    ctx: &mut ParseContext<'_>,
    field: FieldRef,
    expr: NodeId,
) -> NodeResult {
    let start = ctx.lex.raw_cursor();
    match g.parse_node(expr, ctx) {
        Ok(Some(values)) => {
            let tokens = ctx.lex.range(start, ctx.lex.raw_cursor()).to_vec();
            ctx.defer(field, values, tokens);
            Ok(Some(vec![Value::Bound]))
        }
        Ok(None) => Ok(None),
        Err(failure) => {
            if !failure.partial.is_empty() {
                let tokens = ctx.lex.range(start, ctx.lex.raw_cursor()).to_vec();
                ctx.defer(field, failure.partial, tokens);
            }
            Err(NodeError::with_partial(failure.error, vec![Value::Bound]))
        }
    }
}
