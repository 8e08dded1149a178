use std::fmt;

/// Integer class tag assigned to every token by the lexer.
///
/// User lexers allocate their own values from 2 upward; 1 is reserved for
/// [`EOF`] and -1 for [`UNTYPED`].
pub type TokenType = i32;

/// The distinguished end-of-stream token type. Every token stream ends in
/// exactly one token of this type.
pub const EOF: TokenType = 1;

/// Reserved pseudo-type used at the grammar boundary for literals that match
/// on value alone, regardless of token type.
pub const UNTYPED: TokenType = -1;

/// Source position of a token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub file: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(file: impl Into<String>, offset: usize, line: usize, column: usize) -> Self {
        Position {
            file: file.into(),
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

/// A single lexed token: a type tag, the matched text, and where it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Token {
    pub ty: TokenType,
    pub value: String,
    pub pos: Position,
}

impl Token {
    pub fn new(ty: TokenType, value: impl Into<String>, pos: Position) -> Self {
        Token {
            ty,
            value: value.into(),
            pos,
        }
    }

    /// Construct the stream-terminating token at the given position.
    pub fn eof(pos: Position) -> Self {
        Token {
            ty: EOF,
            value: String::new(),
            pos,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.ty == EOF
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_eof() {
            write!(f, "<eof>")
        } else {
            write!(f, "{:?}", self.value)
        }
    }
}
