//! # ParsiGram - Grammar-Driven Parser Engine
//!
//! A recursive-descent parsing engine that consumes a pre-lexed token stream
//! and produces structured record values according to a declaratively built
//! grammar. The engine emphasizes:
//!
//! - **Zero panics**: all parse failures are handled through `Result` types
//! - **Cheap speculation**: branches snapshot a three-integer cursor over a
//!   shared immutable token stream, so backtracking costs nothing
//! - **Informative errors**: when every alternative of an ordered choice
//!   fails, the failure that consumed the most input is the one reported
//! - **Deferred binding**: captured values are queued and assigned to record
//!   fields only when the enclosing record commits, so a failed alternative
//!   never leaves stray mutations behind
//!
//! The lexer is external: anything implementing [`Lexer`] can feed a
//! [`TokenStream`]. Grammar structure is supplied through [`GrammarBuilder`];
//! the engine is independent of how that structure is discovered.

mod bind;
mod context;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod nodes;
pub mod peek;
pub mod record;
pub mod stream;
pub mod token;
pub mod value;

#[cfg(test)]
mod tests;

pub use error::{Error, UnexpectedToken};
pub use grammar::{Grammar, GrammarBuilder, NodeId, RecordId, UnionId, MAX_ITERATIONS};
pub use lexer::{Lexer, VecLexer};
pub use nodes::custom::Parseable;
pub use nodes::GroupMode;
pub use peek::{Checkpoint, PeekingLexer, RawCursor};
pub use record::{
    FieldDef, FieldType, FieldValue, Record, RecordDef, UnionDef, UnionMember,
};
pub use stream::{PooledStream, TokenStream};
pub use token::{Position, Token, TokenType, EOF, UNTYPED};
pub use value::{CustomValue, UnionValue, Value};
