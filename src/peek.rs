use crate::stream::TokenStream;
use crate::token::Token;

/// Raw index into the token array, counting elided tokens.
pub type RawCursor = usize;

/// The mutable cursor state of a [`PeekingLexer`].
///
/// Invariant: `raw <= next`, every token in `[raw, next)` is elided, and the
/// token at `next` is either EOF or non-elided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checkpoint {
    /// Raw position of the next possibly-elided token.
    raw: RawCursor,
    /// Raw position of the next non-elided token.
    next: RawCursor,
    /// How many non-elided tokens have been consumed.
    cursor: usize,
}

impl Checkpoint {
    /// Position in the stream counting only non-elided tokens. This is the
    /// unit in which parse progress is measured.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Position in the stream counting every token.
    pub fn raw_cursor(&self) -> RawCursor {
        self.raw
    }
}

/// A cursor over a [`TokenStream`] supporting arbitrary lookahead and
/// elision-aware consumption.
///
/// Copying a `PeekingLexer` copies only the cursor triple; the stream is
/// shared, which is what makes speculative branches cheap.
#[derive(Debug, Clone, Copy)]
pub struct PeekingLexer<'t> {
    stream: &'t TokenStream,
    chk: Checkpoint,
}

impl<'t> PeekingLexer<'t> {
    pub fn new(stream: &'t TokenStream) -> Self {
        let mut lex = PeekingLexer {
            stream,
            chk: Checkpoint::default(),
        };
        lex.advance_to_non_elided();
        lex
    }

    /// Peek at the next non-elided token without advancing.
    pub fn peek(&self) -> &'t Token {
        &self.stream.tokens()[self.chk.next]
    }

    /// Peek at the token under the raw cursor, which may be elided.
    pub fn raw_peek(&self) -> &'t Token {
        &self.stream.tokens()[self.chk.raw]
    }

    /// Consume and return the next non-elided token. Idempotent at EOF.
    pub fn next(&mut self) -> &'t Token {
        let t = &self.stream.tokens()[self.chk.next];
        if t.is_eof() {
            return t;
        }
        self.chk.next += 1;
        self.chk.raw = self.chk.next;
        self.chk.cursor += 1;
        self.advance_to_non_elided();
        t
    }

    /// Scan forward from the raw cursor, across elided tokens, for the first
    /// token that is EOF, satisfies `pred`, or is not elided. Returns the
    /// token and its raw index; does not advance.
    ///
    /// A successful match must be followed by [`PeekingLexer::fast_forward`]
    /// to the returned index.
    pub fn peek_any(&self, pred: impl Fn(&Token) -> bool) -> (&'t Token, RawCursor) {
        let tokens = self.stream.tokens();
        let mut i = self.chk.raw;
        loop {
            let t = &tokens[i];
            if t.is_eof() || pred(t) || !self.stream.is_elided(t.ty) {
                return (t, i);
            }
            i += 1;
        }
    }

    /// Advance the cursors to the given raw position, counting any non-elided
    /// tokens passed over, then re-skip the elided run that follows.
    pub fn fast_forward(&mut self, raw: RawCursor) {
        let tokens = self.stream.tokens();
        while self.chk.raw <= raw {
            let t = &tokens[self.chk.raw];
            if t.is_eof() {
                break;
            }
            if !self.stream.is_elided(t.ty) {
                self.chk.cursor += 1;
            }
            self.chk.raw += 1;
        }
        self.chk.next = self.chk.raw;
        self.advance_to_non_elided();
    }

    /// The raw slice of tokens in `[start, end)`, including elided tokens.
    pub fn range(&self, start: RawCursor, end: RawCursor) -> &'t [Token] {
        &self.stream.tokens()[start..end]
    }

    pub fn make_checkpoint(&self) -> Checkpoint {
        self.chk
    }

    pub fn load_checkpoint(&mut self, checkpoint: Checkpoint) {
        self.chk = checkpoint;
    }

    /// Non-elided consumption count; see [`Checkpoint::cursor`].
    pub fn cursor(&self) -> usize {
        self.chk.cursor
    }

    pub fn raw_cursor(&self) -> RawCursor {
        self.chk.raw
    }

    /// True when elided tokens sit between the raw cursor and the next
    /// non-elided token.
    pub fn elided_pending(&self) -> bool {
        self.chk.raw != self.chk.next
    }

    fn advance_to_non_elided(&mut self) {
        let tokens = self.stream.tokens();
        loop {
            let t = &tokens[self.chk.next];
            if t.is_eof() || !self.stream.is_elided(t.ty) {
                return;
            }
            self.chk.next += 1;
        }
    }
}
