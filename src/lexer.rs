use crate::error::Error;
use crate::token::{Position, Token};

/// The producer contract consumed by [`crate::stream::TokenStream`].
///
/// A lexer emits tokens until it yields one whose EOF predicate is true,
/// after which it is not called again. Any error aborts stream construction
/// and is propagated unchanged.
pub trait Lexer {
    fn next_token(&mut self) -> Result<Token, Error>;
}

impl<L: Lexer + ?Sized> Lexer for &mut L {
    fn next_token(&mut self) -> Result<Token, Error> {
        (**self).next_token()
    }
}

/// Adapter that replays an in-memory token vector.
///
/// If the vector does not already end in an EOF token, one is synthesized at
/// the position of the last token. Useful for tests and for re-parsing
/// token ranges captured from a previous parse.
pub struct VecLexer {
    tokens: std::vec::IntoIter<Token>,
    last_pos: Position,
    done: bool,
}

impl VecLexer {
    pub fn new(tokens: Vec<Token>) -> Self {
        VecLexer {
            tokens: tokens.into_iter(),
            last_pos: Position::default(),
            done: false,
        }
    }
}

impl Lexer for VecLexer {
    fn next_token(&mut self) -> Result<Token, Error> {
        if self.done {
            return Ok(Token::eof(self.last_pos.clone()));
        }
        match self.tokens.next() {
            Some(t) => {
                if t.is_eof() {
                    self.done = true;
                } else {
                    // A synthesized EOF sits just past the last real token.
                    self.last_pos = Position {
                        file: t.pos.file.clone(),
                        offset: t.pos.offset + t.value.len(),
                        line: t.pos.line,
                        column: t.pos.column + t.value.len(),
                    };
                }
                Ok(t)
            }
            None => {
                self.done = true;
                Ok(Token::eof(self.last_pos.clone()))
            }
        }
    }
}
