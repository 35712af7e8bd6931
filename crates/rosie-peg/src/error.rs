use thiserror::Error;

/// Structured errors from the PEG constructors and the grammar verifier.
///
/// Callers should match on the variant, not the rendered message; the
/// messages exist for logs and for the one case (left recursion) where the
/// compiler surfaces the back-end text verbatim.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum PegError {
    #[error("loop body may accept empty string")]
    NullableLoop,

    #[error("pattern does not have fixed length")]
    BehindNotFixed,

    #[error("pattern too long ({len} bytes, limit {limit})")]
    BehindTooLong { len: u32, limit: u32 },

    #[error("pattern has captures")]
    BehindHasCaptures,

    #[error("rule '{0}' may be left recursive")]
    LeftRecursive(String),

    #[error("undefined rule '{0}'")]
    UndefinedRule(String),

    #[error("duplicate rule '{0}'")]
    DuplicateRule(String),

    #[error("grammar has no rules")]
    EmptyGrammar,

    #[error("start rule '{0}' is not in the grammar")]
    MissingStart(String),
}
