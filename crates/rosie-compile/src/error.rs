use thiserror::Error;

/// Compile-time errors with stable message prefixes.
///
/// Embedding layers match on the rendered prefixes, so the strings here are
/// part of the public contract. Variants map one-to-one onto the back-end's
/// structured codes where one exists; no error strings are parsed.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum CompileError {
    #[error("invalid escape sequence in literal: \\{0}")]
    BadLiteralEscape(String),

    #[error("invalid escape sequence in string: \\{0}")]
    BadStringEscape(String),

    #[error("invalid escape sequence in character set: \\{0}")]
    BadCharsetEscape(String),

    #[error("unknown named charset: {0}")]
    UnknownNamedCharset(String),

    #[error("character set intersection is not implemented")]
    IntersectionUnimplemented,

    #[error("character set difference is not implemented")]
    DifferenceUnimplemented,

    #[error("unbound identifier: {0}")]
    UnboundIdentifier(String),

    #[error("type mismatch: expected a {expected}, but '{name}' is bound to {actual}")]
    TypeMismatch {
        expected: &'static str,
        name: String,
        actual: &'static str,
    },

    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    #[error("pattern being repeated can match the empty string")]
    NullableRepetition,

    #[error("lookbehind pattern does not have fixed length: {0}")]
    LookbehindNotFixed(String),

    #[error("lookbehind pattern too long: {0}")]
    LookbehindTooLong(String),

    #[error("lookbehind pattern has captures: {0}")]
    LookbehindHasCaptures(String),

    /// Back-end text surfaced verbatim; always contains "may be left
    /// recursive".
    #[error("{0}")]
    LeftRecursion(String),

    #[error("peg compilation error: {0}")]
    PegCompilation(String),

    #[error("error in function: '{0}'")]
    FunctionFailed(String),

    /// A compiler invariant was violated; indicates a bug in a collaborator
    /// (e.g. the expander handing over an empty sequence).
    #[error("internal error: {0}")]
    Internal(String),
}
