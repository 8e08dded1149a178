use std::collections::HashMap;

use crate::context::ParseContext;
use crate::error::Error;
use crate::grammar::{Grammar, NodeId};
use crate::nodes::{NodeError, NodeResult};

/// Ordered choice. Alternatives are tried in declaration order, each in its
/// own branch. The first match wins; when every alternative fails, the
/// failure that consumed the most non-elided tokens is surfaced (ties keep
/// the earlier alternative). A failure past the lookahead commit threshold
/// propagates immediately without trying further alternatives.
pub(crate) fn parse(
    g: &Grammar,
    ctx: &mut ParseContext<'_>,
    alts: &[NodeId],
    switch: Option<&HashMap<String, usize>>,
) -> NodeResult {
    // Literal-dispatch fast path: with no elided run pending, each literal
    // alternative can only match the very next token, so one table lookup
    // decides the outcome.
    if let Some(table) = switch {
        if !ctx.lex.elided_pending() {
            return match table.get(&ctx.lex.peek().value) {
                Some(&index) => try_alternatives(g, ctx, &alts[index..=index]),
                None => Ok(None),
            };
        }
    }
    try_alternatives(g, ctx, alts)
}

fn try_alternatives(g: &Grammar, ctx: &mut ParseContext<'_>, alts: &[NodeId]) -> NodeResult {
    let mut best: Option<NodeError> = None;
    let mut best_cursor = 0usize;

    for alt in alts {
        let mut branch = ctx.branch();
        match g.parse_node(*alt, &mut branch) {
            Err(failure) => {
                // Progressed past the commit threshold: fatal, stop trying.
                if ctx.stop(&failure.error, &mut branch) {
                    return Err(failure);
                }
                // The further an alternative got before failing, the more
                // informative its error.
                if best.is_none() || branch.lex.cursor() > best_cursor {
                    best_cursor = branch.lex.cursor();
                    best = Some(failure);
                }
            }
            Ok(Some(values)) => {
                let progressed = branch.lex.raw_cursor() != ctx.lex.raw_cursor();
                if !progressed && !branch.lex.raw_peek().is_eof() {
                    // A successful alternative that consumed nothing is a
                    // grammar bug; surfacing it here beats looping forever.
                    let token = branch.lex.raw_peek();
                    return Err(NodeError::new(Error::parse(
                        format!(
                            "branch {} was accepted but did not progress the lexer at {} ({:?})",
                            g.ebnf(*alt),
                            token.pos,
                            token.value,
                        ),
                        token.pos.clone(),
                    )));
                }
                ctx.accept(&mut branch);
                return Ok(Some(values));
            }
            Ok(None) => {}
        }
    }

    match best {
        Some(failure) => {
            ctx.maybe_update_error(failure.error.clone());
            Err(failure)
        }
        None => Ok(None),
    }
}
