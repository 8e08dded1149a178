use crate::error::Error;
use crate::peek::PeekingLexer;
use crate::token::{Position, Token};
use crate::value::Value;

/// Identifies one declared field of one registered record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldRef {
    pub record: usize,
    pub index: usize,
}

/// A queued field assignment, applied when the enclosing record commits.
#[derive(Debug)]
pub(crate) struct Deferred {
    pub field: FieldRef,
    pub values: Vec<Value>,
    pub tokens: Vec<Token>,
}

/// The deepest failure seen so far, measured in non-elided tokens consumed.
#[derive(Debug, Clone)]
struct DeepestError {
    error: Error,
    cursor: usize,
}

/// State threaded through the node tree during one parse: the cursor, the
/// queue of deferred field assignments for the current speculative branch,
/// and the deepest-error record.
///
/// A branch is a child context sharing the stream but carrying its own
/// cursor snapshot and its own queue; it is merged into the parent with
/// [`ParseContext::accept`] or simply dropped.
#[derive(Debug)]
pub(crate) struct ParseContext<'t> {
    pub lex: PeekingLexer<'t>,
    deferred: Vec<Deferred>,
    deepest: Option<DeepestError>,
    lookahead: usize,
    pub depth: usize,
}

impl<'t> ParseContext<'t> {
    pub fn new(lex: PeekingLexer<'t>, lookahead: usize) -> Self {
        ParseContext {
            lex,
            deferred: Vec::new(),
            deepest: None,
            lookahead,
            depth: 0,
        }
    }

    /// Snapshot a child context with an empty assignment queue.
    pub fn branch(&self) -> ParseContext<'t> {
        ParseContext {
            lex: self.lex,
            deferred: Vec::new(),
            deepest: self.deepest.clone(),
            lookahead: self.lookahead,
            depth: self.depth,
        }
    }

    /// Commit a branch: adopt its cursor, append its queued assignments, and
    /// keep its deepest error if it got further than ours.
    pub fn accept(&mut self, branch: &mut ParseContext<'t>) {
        self.lex.load_checkpoint(branch.lex.make_checkpoint());
        self.deferred.append(&mut branch.deferred);
        if let Some(theirs) = branch.deepest.take() {
            let deeper = match &self.deepest {
                Some(ours) => theirs.cursor > ours.cursor,
                None => true,
            };
            if deeper {
                self.deepest = Some(theirs);
            }
        }
    }

    /// Decide whether a branch failure is fatal: true when the branch
    /// consumed more non-elided tokens past our position than the configured
    /// lookahead allows. A fatal branch is accepted so that partial trees
    /// and error positions reflect its progress.
    pub fn stop(&mut self, err: &Error, branch: &mut ParseContext<'t>) -> bool {
        if branch.lex.cursor() > self.lex.cursor().saturating_add(self.lookahead) {
            self.maybe_update_error(err.clone());
            self.accept(branch);
            return true;
        }
        false
    }

    /// Record `err` as the deepest error if we are past the deepest recorded
    /// so far. Ties keep the earlier error.
    pub fn maybe_update_error(&mut self, error: Error) {
        let cursor = self.lex.cursor();
        let update = match &self.deepest {
            Some(deepest) => cursor > deepest.cursor,
            None => true,
        };
        if update {
            self.deepest = Some(DeepestError { error, cursor });
        }
    }

    /// Prefer the recorded deepest error over `fallback` when it is at or
    /// beyond the current cursor.
    pub fn deepest_error(&self, fallback: Error) -> Error {
        if let Some(deepest) = &self.deepest {
            if deepest.cursor >= self.lex.cursor() {
                return deepest.error.clone();
            }
        }
        fallback
    }

    /// Queue a field assignment for the enclosing record's commit.
    pub fn defer(&mut self, field: FieldRef, values: Vec<Value>, tokens: Vec<Token>) {
        self.deferred.push(Deferred {
            field,
            values,
            tokens,
        });
    }

    /// Marks the start of a record's private span of the queue. Assignments
    /// past the watermark belong to that record and are drained at its
    /// commit; entries below it belong to enclosing records.
    pub fn watermark(&self) -> usize {
        self.deferred.len()
    }

    /// Drain every assignment queued since `mark`, in parse order.
    pub fn drain_deferred(&mut self, mark: usize) -> Vec<Deferred> {
        self.deferred.split_off(mark)
    }

    /// Discard assignments queued since `mark` (used when a record node
    /// turns out not to match).
    pub fn discard_deferred(&mut self, mark: usize) {
        self.deferred.truncate(mark);
    }

    pub fn pending(&self) -> usize {
        self.deferred.len()
    }
}

/// Position of the next non-elided token; where errors raised "here" point.
pub(crate) fn current_pos(ctx: &ParseContext) -> Position {
    ctx.lex.peek().pos.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::VecLexer;
    use crate::stream::TokenStream;
    use crate::token::Token;

    fn stream(values: &[&str]) -> TokenStream {
        let tokens = values
            .iter()
            .enumerate()
            .map(|(i, v)| Token::new(2, *v, Position::new("", i, 1, i + 1)))
            .collect();
        TokenStream::build(VecLexer::new(tokens), []).unwrap()
    }

    fn err_at(s: &TokenStream, i: usize) -> Error {
        Error::unexpected(&s.tokens()[i])
    }

    #[test]
    fn test_unaccepted_branch_leaves_parent_unchanged() {
        let s = stream(&["a", "b", "c"]);
        let ctx = ParseContext::new(PeekingLexer::new(&s), usize::MAX);

        let mut branch = ctx.branch();
        branch.lex.next();
        branch.lex.next();
        branch.defer(
            FieldRef { record: 0, index: 0 },
            vec![Value::String("a".to_string())],
            vec![],
        );
        drop(branch);

        assert_eq!(ctx.lex.cursor(), 0);
        assert_eq!(ctx.pending(), 0);
    }

    #[test]
    fn test_accept_adopts_cursor_and_queue() {
        let s = stream(&["a", "b"]);
        let mut ctx = ParseContext::new(PeekingLexer::new(&s), usize::MAX);

        let mut branch = ctx.branch();
        branch.lex.next();
        branch.defer(FieldRef { record: 0, index: 0 }, vec![], vec![]);
        ctx.accept(&mut branch);

        assert_eq!(ctx.lex.cursor(), 1);
        assert_eq!(ctx.pending(), 1);
    }

    #[test]
    fn test_stop_false_within_lookahead() {
        let s = stream(&["a", "b", "c"]);
        let mut ctx = ParseContext::new(PeekingLexer::new(&s), 2);

        let mut branch = ctx.branch();
        branch.lex.next();
        branch.lex.next();
        let err = err_at(&s, 2);
        assert!(!ctx.stop(&err, &mut branch));
        assert_eq!(ctx.lex.cursor(), 0);
    }

    #[test]
    fn test_stop_true_past_lookahead_accepts_branch() {
        let s = stream(&["a", "b", "c"]);
        let mut ctx = ParseContext::new(PeekingLexer::new(&s), 1);

        let mut branch = ctx.branch();
        branch.lex.next();
        branch.lex.next();
        let err = err_at(&s, 2);
        assert!(ctx.stop(&err, &mut branch));
        // The doomed branch's progress is visible in the parent.
        assert_eq!(ctx.lex.cursor(), 2);
    }

    #[test]
    fn test_unbounded_lookahead_never_stops() {
        let s = stream(&["a", "b", "c"]);
        let mut ctx = ParseContext::new(PeekingLexer::new(&s), usize::MAX);

        let mut branch = ctx.branch();
        branch.lex.next();
        branch.lex.next();
        branch.lex.next();
        let err = err_at(&s, 2);
        assert!(!ctx.stop(&err, &mut branch));
    }

    #[test]
    fn test_deepest_error_prefers_progress() {
        let s = stream(&["a", "b", "c"]);
        let mut ctx = ParseContext::new(PeekingLexer::new(&s), usize::MAX);

        ctx.maybe_update_error(err_at(&s, 0));
        ctx.lex.next();
        ctx.lex.next();
        ctx.maybe_update_error(err_at(&s, 2));

        let got = ctx.deepest_error(err_at(&s, 0));
        assert_eq!(got.position().unwrap().offset, 2);
    }

    #[test]
    fn test_deepest_error_tie_keeps_first() {
        let s = stream(&["a", "b"]);
        let mut ctx = ParseContext::new(PeekingLexer::new(&s), usize::MAX);

        ctx.maybe_update_error(err_at(&s, 0));
        ctx.maybe_update_error(err_at(&s, 1));

        let got = ctx.deepest_error(err_at(&s, 1));
        assert_eq!(got.position().unwrap().offset, 0);
    }

    #[test]
    fn test_accept_propagates_deeper_branch_error() {
        let s = stream(&["a", "b", "c"]);
        let mut ctx = ParseContext::new(PeekingLexer::new(&s), usize::MAX);

        let mut branch = ctx.branch();
        branch.lex.next();
        branch.lex.next();
        branch.maybe_update_error(err_at(&s, 2));
        ctx.accept(&mut branch);

        let got = ctx.deepest_error(err_at(&s, 0));
        assert_eq!(got.position().unwrap().offset, 2);
    }

    #[test]
    fn test_watermark_scopes_queue() {
        let s = stream(&["a"]);
        let mut ctx = ParseContext::new(PeekingLexer::new(&s), usize::MAX);

        ctx.defer(FieldRef { record: 0, index: 0 }, vec![], vec![]);
        let mark = ctx.watermark();
        ctx.defer(FieldRef { record: 1, index: 0 }, vec![], vec![]);
        ctx.defer(FieldRef { record: 1, index: 1 }, vec![], vec![]);

        let drained = ctx.drain_deferred(mark);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].field.record, 1);
        // The enclosing record's entry is untouched.
        assert_eq!(ctx.pending(), 1);
    }
}
