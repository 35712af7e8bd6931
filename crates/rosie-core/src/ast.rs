//! The AST the compiler consumes.
//!
//! These nodes are produced by the surface parser and the syntax expander,
//! which run before the compiler is invoked. The compiler depends only on
//! the shapes defined here; range repetitions, macros, and other sugar have
//! already been rewritten away by the expander.

use std::fmt;

use crate::ident::Identifier;
use crate::span::Span;

/// An expression node with its source span.
#[derive(Clone, PartialEq, Debug)]
pub struct Exp {
    pub kind: ExpKind,
    pub span: Span,
}

impl Exp {
    pub fn new(kind: ExpKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Predicate operators.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PredicateKind {
    /// `>p` - succeeds iff `p` matches next, consumes nothing.
    LookAhead,
    /// `<p` - succeeds iff `p` matches the bytes just before the cursor.
    LookBehind,
    /// `!p` - succeeds iff `p` does not match, consumes nothing.
    Negation,
}

/// Expression node kinds.
///
/// Character-set fields hold the raw source text; escape decoding happens in
/// the compiler so that a bad escape can be reported with the charset's own
/// message prefix.
#[derive(Clone, PartialEq, Debug)]
pub enum ExpKind {
    /// A quoted literal, escapes not yet decoded.
    Literal { value: String },
    /// A string value (argument to a primitive function), escapes not yet
    /// decoded. Not a pattern.
    RplString { value: String },
    /// An identifier-like tagged string, e.g. `#word`.
    Hashtag { value: String },
    /// Ordered sequence of expressions. Never empty.
    Sequence { exps: Vec<Exp> },
    /// Ordered choice; first match wins.
    Choice { exps: Vec<Exp> },
    /// Lookahead, lookbehind, or negation.
    Predicate { kind: PredicateKind, exp: Box<Exp> },
    /// `[f-l]`, endpoints raw.
    CsRange {
        first: String,
        last: String,
        complement: bool,
    },
    /// `[chars]`, each element raw.
    CsList { chars: Vec<String>, complement: bool },
    /// `[:name:]` - a named class from the locale table.
    CsNamed { name: String, complement: bool },
    /// A bracketed charset expression, possibly complemented.
    CsExp { cexp: Box<Exp>, complement: bool },
    /// Union of charset sub-expressions.
    CsUnion { cexps: Vec<Exp> },
    /// Intersection of charset sub-expressions (not implemented; compile error).
    CsIntersection { cexps: Vec<Exp> },
    /// Difference of charset sub-expressions (not implemented; compile error).
    CsDifference { cexps: Vec<Exp> },
    /// `p` repeated at least `min` times, greedily.
    Atleast { exp: Box<Exp>, min: u32 },
    /// `p` repeated at most `max` times, greedily.
    Atmost { exp: Box<Exp>, max: u32 },
    /// A grammar: ordered rules, the first one is the start rule.
    Grammar { rules: Vec<Binding> },
    /// Application of a primitive function to arguments.
    Application { target: Identifier, arglist: Vec<Exp> },
    /// A reference to a bound name.
    Ref(Identifier),
}

/// A binding statement: `name = exp`, possibly `alias` and/or `local`.
#[derive(Clone, PartialEq, Debug)]
pub struct Binding {
    pub id: Identifier,
    pub exp: Exp,
    pub is_alias: bool,
    pub is_local: bool,
    pub span: Span,
}

/// An import declaration. Imports are satisfied by the loader before the
/// compiler runs; the block compiler treats these as markers to skip.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ImportDecl {
    pub importpath: String,
    pub prefix: Option<String>,
}

/// A top-level block: one unit of RPL source.
#[derive(Clone, PartialEq, Debug)]
pub struct Block {
    pub package_decl: Option<String>,
    pub import_decls: Vec<ImportDecl>,
    pub stmts: Vec<Binding>,
    pub span: Span,
}

// Display renders a node back into RPL-ish surface syntax for diagnostics.
// The output is for humans; it is not guaranteed to re-parse.
impl fmt::Display for Exp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for ExpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpKind::Literal { value } => write!(f, "\"{}\"", value),
            ExpKind::RplString { value } => write!(f, "\"{}\"", value),
            ExpKind::Hashtag { value } => write!(f, "#{}", value),
            ExpKind::Sequence { exps } => {
                write!(f, "{{")?;
                for (i, e) in exps.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "}}")
            }
            ExpKind::Choice { exps } => {
                write!(f, "{{")?;
                for (i, e) in exps.iter().enumerate() {
                    if i > 0 {
                        write!(f, " / ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "}}")
            }
            ExpKind::Predicate { kind, exp } => {
                let op = match kind {
                    PredicateKind::LookAhead => ">",
                    PredicateKind::LookBehind => "<",
                    PredicateKind::Negation => "!",
                };
                write!(f, "{}{}", op, exp)
            }
            ExpKind::CsRange {
                first,
                last,
                complement,
            } => write!(
                f,
                "[{}{}-{}]",
                if *complement { "^" } else { "" },
                first,
                last
            ),
            ExpKind::CsList { chars, complement } => {
                write!(f, "[{}", if *complement { "^" } else { "" })?;
                for c in chars {
                    write!(f, "{}", c)?;
                }
                write!(f, "]")
            }
            ExpKind::CsNamed { name, complement } => {
                write!(f, "[:{}{}:]", if *complement { "^" } else { "" }, name)
            }
            ExpKind::CsExp { cexp, complement } => {
                write!(f, "[{}{}]", if *complement { "^" } else { "" }, cexp)
            }
            ExpKind::CsUnion { cexps } => {
                for (i, e) in cexps.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
            ExpKind::CsIntersection { cexps } => {
                for (i, e) in cexps.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
            ExpKind::CsDifference { cexps } => {
                for (i, e) in cexps.iter().enumerate() {
                    if i > 0 {
                        write!(f, " - ")?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
            ExpKind::Atleast { exp, min } => match min {
                0 => write!(f, "{}*", exp),
                1 => write!(f, "{}+", exp),
                n => write!(f, "{}{{{},}}", exp, n),
            },
            ExpKind::Atmost { exp, max } => match max {
                1 => write!(f, "{}?", exp),
                n => write!(f, "{}{{,{}}}", exp, n),
            },
            ExpKind::Grammar { rules } => {
                let start = rules
                    .first()
                    .map(|r| r.id.localname.as_str())
                    .unwrap_or("?");
                write!(f, "grammar {} ... end", start)
            }
            ExpKind::Application { target, arglist } => {
                write!(f, "{}:(", target)?;
                for (i, a) in arglist.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            ExpKind::Ref(id) => write!(f, "{}", id),
        }
    }
}
