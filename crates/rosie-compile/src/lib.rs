//! Compiler front-end for the Rosie Pattern Language.
//!
//! The pipeline consumes an already-parsed AST plus a lexical environment
//! and produces compiled pattern objects over the `rosie-peg` primitives:
//! - `env` - lexically scoped environment and binding kinds
//! - `escape` - escape-sequence decoding for literals, strings, charsets
//! - `charset` - the locale table of named classes
//! - `utf8` - codepoint-interval to byte-range-tree lowering
//! - `expression` - the per-node expression compiler
//! - `grammar` - the three-pass grammar compiler
//! - `block` - the two-pass block compiler and top-level entry points
//! - `primitives` - built-in primitive functions
//!
//! Failures are appended to a `Violations` sink at the block level;
//! expression-level handlers return [`CompileError`] values that carry the
//! stable message prefixes the embedding layers match on.

pub mod block;
pub mod charset;
pub mod env;
pub mod error;
pub mod escape;
pub mod expression;
pub mod grammar;
pub mod primitives;
pub mod utf8;

// Re-export commonly used types at crate root
pub use block::{compile_block, compile_expression, LoadRequest};
pub use env::{Binding, Environment, Pat};
pub use error::CompileError;
pub use expression::{compile_exp, CompiledValue};
pub use utf8::codepoint_range;
