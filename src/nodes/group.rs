use crate::context::{current_pos, ParseContext};
use crate::error::Error;
use crate::grammar::{Grammar, NodeId};
use crate::nodes::{GroupMode, NodeError, NodeResult};
use crate::value::Value;

/// Group with cardinality. Repeating modes run each iteration in a fresh
/// branch: a failed iteration simply ends the repetition unless it
/// progressed past the commit threshold, in which case the failure is
/// fatal and carries the accumulated partial tree.
pub(crate) fn parse(
    g: &Grammar,
    ctx: &mut ParseContext<'_>,
    self_id: NodeId,
    expr: NodeId,
    mode: GroupMode,
) -> NodeResult {
    let (min, max) = match mode {
        GroupMode::Once => return g.parse_node(expr, ctx),
        GroupMode::NonEmpty => {
            let out = g.parse_node(expr, ctx)?;
            return match out {
                Some(values) if !values.is_empty() => Ok(Some(values)),
                _ => Err(NodeError::new(Error::EmptyGroup {
                    expr: g.ebnf(self_id),
                    pos: current_pos(ctx),
                })),
            };
        }
        GroupMode::ZeroOrOne => (0, 1),
        GroupMode::ZeroOrMore => (0, g.config.max_iterations),
        GroupMode::OneOrMore => (1, g.config.max_iterations),
    };

    let mut out: Option<Vec<Value>> = None;
    let mut matches = 0;
    while matches < max {
        let mut branch = ctx.branch();
        match g.parse_node(expr, &mut branch) {
            Err(failure) => {
                ctx.maybe_update_error(failure.error.clone());
                if ctx.stop(&failure.error, &mut branch) {
                    // Keep as much of the parse tree as possible.
                    let mut partial = out.unwrap_or_default();
                    partial.extend(failure.partial);
                    return Err(NodeError::with_partial(failure.error, partial));
                }
                // The optional part just didn't match any further.
                break;
            }
            Ok(None) => {
                ctx.accept(&mut branch);
                break;
            }
            Ok(Some(values)) => {
                if !values.is_empty() {
                    out.get_or_insert_with(Vec::new).extend(values);
                }
                ctx.accept(&mut branch);
                matches += 1;
            }
        }
    }

    if matches >= g.config.max_iterations {
        return Err(NodeError::new(Error::IterationLimit {
            expr: g.ebnf(self_id),
            limit: g.config.max_iterations,
            pos: current_pos(ctx),
        }));
    }
    if matches < min {
        let error = Error::parse(
            format!(
                "sub-expression {} must match at least once",
                g.ebnf(self_id)
            ),
            current_pos(ctx),
        );
        return Err(NodeError::with_partial(error, out.unwrap_or_default()));
    }
    // An absent optional is a successful match of zero captures, so parsing
    // can proceed.
    if min == 0 && out.is_none() {
        out = Some(Vec::new());
    }
    Ok(out)
}
