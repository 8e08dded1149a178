use std::collections::HashSet;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

use crate::error::Error;
use crate::lexer::Lexer;
use crate::token::{Token, TokenType};

/// An immutable, fully materialized token stream ending in exactly one EOF
/// token, together with the set of token types elided from normal matching.
///
/// Construction drains the producer to completion; no tokens are added
/// afterwards. Cursor state lives in [`crate::peek::PeekingLexer`] views, so
/// any number of speculative branches can read one stream without
/// coordination.
#[derive(Debug, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    elide: HashSet<TokenType>,
}

impl TokenStream {
    /// Drain `lexer` into a fresh stream, eliding the given token types.
    pub fn build<L: Lexer>(
        mut lexer: L,
        elide: impl IntoIterator<Item = TokenType>,
    ) -> Result<TokenStream, Error> {
        let mut stream = TokenStream::default();
        stream.fill(&mut lexer, elide)?;
        Ok(stream)
    }

    /// Like [`TokenStream::build`], but recycles a buffer from a process-wide
    /// pool. Faster when lexing thousands of similar inputs.
    ///
    /// The buffer returns to the pool when the guard is dropped. Do not drop
    /// it while a parse is still running against the stream.
    pub fn pooled<L: Lexer>(
        mut lexer: L,
        elide: impl IntoIterator<Item = TokenType>,
    ) -> Result<PooledStream, Error> {
        let mut stream = STREAM_POOL
            .lock()
            .ok()
            .and_then(|mut pool| pool.pop())
            .unwrap_or_default();
        match stream.fill(&mut lexer, elide) {
            Ok(()) => Ok(PooledStream {
                stream: Some(stream),
            }),
            Err(err) => {
                // The guard never existed, so hand the buffer back here.
                stream.reset();
                return_to_pool(stream);
                Err(err)
            }
        }
    }

    fn fill<L: Lexer>(
        &mut self,
        lexer: &mut L,
        elide: impl IntoIterator<Item = TokenType>,
    ) -> Result<(), Error> {
        self.elide.extend(elide);
        loop {
            let token = lexer.next_token()?;
            let eof = token.is_eof();
            self.tokens.push(token);
            if eof {
                return Ok(());
            }
        }
    }

    /// Truncate to empty, preserving allocated capacity.
    fn reset(&mut self) {
        self.tokens.clear();
        self.elide.clear();
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub(crate) fn is_elided(&self, ty: TokenType) -> bool {
        self.elide.contains(&ty)
    }
}

static STREAM_POOL: Mutex<Vec<TokenStream>> = Mutex::new(Vec::new());

fn return_to_pool(stream: TokenStream) {
    if let Ok(mut pool) = STREAM_POOL.lock() {
        pool.push(stream);
    }
}

/// Borrow guard for a pooled [`TokenStream`]. Dereferences to the stream;
/// returning it truncates the token buffer (keeping capacity) and clears the
/// elision set.
pub struct PooledStream {
    stream: Option<TokenStream>,
}

impl Deref for PooledStream {
    type Target = TokenStream;

    fn deref(&self) -> &TokenStream {
        self.stream.as_ref().expect("pooled stream already returned")
    }
}

impl DerefMut for PooledStream {
    fn deref_mut(&mut self) -> &mut TokenStream {
        self.stream.as_mut().expect("pooled stream already returned")
    }
}

impl Drop for PooledStream {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.reset();
            return_to_pool(stream);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::VecLexer;
    use crate::token::Position;

    fn toks(values: &[&str]) -> Vec<Token> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Token::new(2, *v, Position::new("", i, 1, i + 1)))
            .collect()
    }

    #[test]
    fn test_build_terminates_with_eof() {
        let stream = TokenStream::build(VecLexer::new(toks(&["a", "b"])), []).unwrap();

        assert_eq!(stream.len(), 3);
        assert!(stream.tokens()[2].is_eof());
        assert_eq!(stream.tokens()[0].value, "a");
    }

    #[test]
    fn test_build_empty_input_is_single_eof() {
        let stream = TokenStream::build(VecLexer::new(vec![]), []).unwrap();
        assert_eq!(stream.len(), 1);
        assert!(stream.tokens()[0].is_eof());
    }

    #[test]
    fn test_elision_set() {
        let stream = TokenStream::build(VecLexer::new(toks(&["a"])), [6, 7]).unwrap();
        assert!(stream.is_elided(6));
        assert!(stream.is_elided(7));
        assert!(!stream.is_elided(2));
    }

    #[test]
    fn test_lexer_error_aborts_construction() {
        struct Failing;
        impl Lexer for Failing {
            fn next_token(&mut self) -> Result<Token, Error> {
                Err(Error::Lexer {
                    message: "bad byte".to_string(),
                    pos: Position::default(),
                })
            }
        }

        let result = TokenStream::build(Failing, []);
        assert!(matches!(result, Err(Error::Lexer { .. })));
    }

    #[test]
    fn test_pooled_stream_resets_on_return() {
        {
            let stream = TokenStream::pooled(VecLexer::new(toks(&["a", "b", "c"])), [6]).unwrap();
            assert_eq!(stream.len(), 4);
            assert!(stream.is_elided(6));
        }
        // A reused buffer starts empty again.
        let stream = TokenStream::pooled(VecLexer::new(toks(&["x"])), []).unwrap();
        assert_eq!(stream.len(), 2);
        assert!(!stream.is_elided(6));
    }
}
