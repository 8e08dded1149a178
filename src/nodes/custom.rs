use std::any::Any;

use crate::context::ParseContext;
use crate::error::Error;
use crate::nodes::{NodeError, NodeResult, ProductionFn};
use crate::peek::PeekingLexer;

/// A type that parses itself directly from the peeking lexer.
///
/// Return [`Error::NoMatch`] to decline so that other alternatives can be
/// attempted; any other error is fatal.
pub trait Parseable: Any + Send + Sync + Sized {
    /// Name used in diagnostics and EBNF renderings.
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }

    fn parse(lex: &mut PeekingLexer<'_>) -> Result<Self, Error>;
}

/// Shared evaluator for custom and parseable productions: hand the lexer to
/// the user code, mapping the [`Error::NoMatch`] sentinel to a no-match.
pub(crate) fn parse(ctx: &mut ParseContext<'_>, production: &ProductionFn) -> NodeResult {
    match (production.0)(&mut ctx.lex) {
        Ok(value) => Ok(Some(vec![value])),
        Err(Error::NoMatch) => Ok(None),
        Err(error) => Err(NodeError::new(error)),
    }
}
