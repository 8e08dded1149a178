use crate::context::ParseContext;
use crate::error::Error;
use crate::grammar::{Grammar, NodeId};
use crate::nodes::{NodeError, NodeResult};
use crate::value::Value;

/// Negation: succeed by consuming exactly one token, provided the inner node
/// does *not* match here. The inner attempt runs in a discarded branch, so
/// neither its consumption nor its errors are observable. EOF cannot be
/// negated.
pub(crate) fn parse(g: &Grammar, ctx: &mut ParseContext<'_>, expr: NodeId) -> NodeResult {
    let ahead = ctx.lex.peek();
    if ahead.is_eof() {
        return Ok(None);
    }

    let mut branch = ctx.branch();
    if let Ok(Some(_)) = g.parse_node(expr, &mut branch) {
        // What we don't want is actually here.
        return Err(NodeError::new(Error::unexpected(ahead)));
    }

    let next = ctx.lex.next();
    Ok(Some(vec![Value::String(next.value.clone())]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::*;

    #[test]
    fn test_negation_consumes_non_matching_token() {
        let (g, s) = grammar(&[(IDENT, "x"), (PUNCT, ";")], |b, _| {
            let semi = b.literal(";");
            b.negation(semi)
        });
        let mut ctx = context(&s);

        let values = g.parse_node(root_expr(&g), &mut ctx).unwrap().unwrap();
        assert_eq!(values[0].as_str(), Some("x"));
        assert_eq!(ctx.lex.peek().value, ";");
    }

    #[test]
    fn test_negation_fails_when_inner_matches() {
        let (g, s) = grammar(&[(PUNCT, ";")], |b, _| {
            let semi = b.literal(";");
            b.negation(semi)
        });
        let mut ctx = context(&s);

        let failure = g.parse_node(root_expr(&g), &mut ctx).unwrap_err();
        match failure.error {
            Error::UnexpectedToken(u) => assert_eq!(u.token.value, ";"),
            other => panic!("expected unexpected-token, got {:?}", other),
        }
        assert_eq!(ctx.lex.cursor(), 0);
    }

    #[test]
    fn test_negation_at_eof_is_no_match() {
        let (g, s) = grammar(&[], |b, _| {
            let semi = b.literal(";");
            b.negation(semi)
        });
        let mut ctx = context(&s);

        assert!(g.parse_node(root_expr(&g), &mut ctx).unwrap().is_none());
    }

    #[test]
    fn test_negation_swallows_inner_error() {
        // The inner sequence fails part-way; negation treats that the same
        // as a no-match and consumes one token.
        let (g, s) = grammar(&[(IDENT, "a"), (IDENT, "z")], |b, _| {
            let a = b.literal("a");
            let b2 = b.literal("b");
            let seq = b.sequence(vec![a, b2]);
            b.negation(seq)
        });
        let mut ctx = context(&s);

        let values = g.parse_node(root_expr(&g), &mut ctx).unwrap().unwrap();
        assert_eq!(values[0].as_str(), Some("a"));
        assert_eq!(ctx.lex.cursor(), 1);
    }

    #[test]
    fn test_negation_loop_until_delimiter() {
        // (!";" .)* style scanning: collect everything before the semicolon.
        let (g, s) = grammar(
            &[(IDENT, "a"), (IDENT, "b"), (PUNCT, ";"), (IDENT, "c")],
            |b, _| {
                let semi = b.literal(";");
                let not_semi = b.negation(semi);
                b.many(not_semi)
            },
        );
        let mut ctx = context(&s);

        let values = g.parse_node(root_expr(&g), &mut ctx).unwrap().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(ctx.lex.peek().value, ";");
    }
}
