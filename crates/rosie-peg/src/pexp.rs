//! Pattern-expression tree and checked constructors.
//!
//! The compiler never builds [`Pexp`] values directly; it calls the
//! constructor functions, which validate the shapes the matcher cannot
//! execute (nullable repetition bodies, unbounded or capturing lookbehind,
//! ill-formed grammars) and report [`PegError`] codes.

use crate::analysis::{self, fixed_length, has_captures, nullable};
use crate::error::PegError;

/// Longest lookbehind the matcher supports, in bytes.
pub const MAX_BEHIND: u32 = 255;

/// A compiled PEG expression.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Pexp {
    /// Matches the literal byte string.
    Lit(Vec<u8>),
    /// Matches one byte in the inclusive range.
    ByteRange(u8, u8),
    /// Ordered sequence.
    Seq(Box<Pexp>, Box<Pexp>),
    /// Ordered choice; first match wins, no backtracking past commitment.
    Alt(Vec<Pexp>),
    /// Succeeds iff the body matches next; consumes nothing.
    LookAhead(Box<Pexp>),
    /// Succeeds iff the body matches the bytes just before the cursor.
    /// The body is fixed-length and capture-free (enforced at construction).
    LookBehind(Box<Pexp>),
    /// Succeeds iff the body does not match; consumes nothing.
    Negation(Box<Pexp>),
    /// Body matched at least `n` times, greedily.
    AtLeast(Box<Pexp>, u32),
    /// Body matched at most `n` times, greedily.
    AtMost(Box<Pexp>, u32),
    /// On match, produce a record tagged with the label.
    Capture(String, Box<Pexp>),
    /// Matches empty and produces a record carrying constant text.
    ConstCapture(String, String),
    /// Mutually recursive fixpoint over named rules.
    Grammar {
        rules: Vec<(String, Pexp)>,
        start: String,
    },
    /// Reference to a rule of the innermost enclosing grammar.
    V(String),
}

pub fn lit(bytes: impl Into<Vec<u8>>) -> Pexp {
    Pexp::Lit(bytes.into())
}

pub fn byte_range(lo: u8, hi: u8) -> Pexp {
    debug_assert!(lo <= hi, "byte range endpoints out of order");
    Pexp::ByteRange(lo, hi)
}

/// Matches any single byte.
pub fn any_byte() -> Pexp {
    Pexp::ByteRange(0x00, 0xFF)
}

pub fn seq(a: Pexp, b: Pexp) -> Pexp {
    Pexp::Seq(Box::new(a), Box::new(b))
}

/// Ordered choice over the given alternatives.
///
/// A single alternative collapses to itself; nested `Alt`s are spliced in
/// place, which preserves order and therefore PEG semantics.
pub fn alt(parts: Vec<Pexp>) -> Pexp {
    debug_assert!(!parts.is_empty(), "empty choice");
    let mut flat = Vec::with_capacity(parts.len());
    for p in parts {
        match p {
            Pexp::Alt(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    if flat.len() == 1 {
        flat.pop().unwrap()
    } else {
        Pexp::Alt(flat)
    }
}

pub fn look_ahead(p: Pexp) -> Pexp {
    Pexp::LookAhead(Box::new(p))
}

/// Build a lookbehind, rejecting bodies the matcher cannot run backwards.
pub fn look_behind(p: Pexp) -> Result<Pexp, PegError> {
    let len = fixed_length(&p).ok_or(PegError::BehindNotFixed)?;
    if len > MAX_BEHIND {
        return Err(PegError::BehindTooLong {
            len,
            limit: MAX_BEHIND,
        });
    }
    if has_captures(&p) {
        return Err(PegError::BehindHasCaptures);
    }
    Ok(Pexp::LookBehind(Box::new(p)))
}

pub fn negation(p: Pexp) -> Pexp {
    Pexp::Negation(Box::new(p))
}

/// Build `p` repeated at least `n` times; rejects a nullable body.
///
/// A `V` body passes here and is re-checked with the rule map in scope when
/// the enclosing grammar is built.
pub fn rep_atleast(p: Pexp, n: u32) -> Result<Pexp, PegError> {
    if nullable(&p) {
        return Err(PegError::NullableLoop);
    }
    Ok(Pexp::AtLeast(Box::new(p), n))
}

/// Build `p` repeated at most `n` times; rejects a nullable body.
pub fn rep_atmost(p: Pexp, n: u32) -> Result<Pexp, PegError> {
    if nullable(&p) {
        return Err(PegError::NullableLoop);
    }
    Ok(Pexp::AtMost(Box::new(p), n))
}

pub fn capture(label: impl Into<String>, p: Pexp) -> Pexp {
    Pexp::Capture(label.into(), Box::new(p))
}

/// A capture that consumes nothing and carries constant text.
pub fn const_capture(label: impl Into<String>, text: impl Into<String>) -> Pexp {
    Pexp::ConstCapture(label.into(), text.into())
}

/// Reference to a grammar rule, resolved at fixpoint construction.
pub fn v(name: impl Into<String>) -> Pexp {
    Pexp::V(name.into())
}

/// Build the fixpoint over `rules`, verifying it is executable.
///
/// Rejects: an empty rule list, duplicate rule names, a start rule not in
/// the list, `V` references to rules that do not exist, left-recursive
/// rules, and repetition bodies that turn out nullable once rule bodies are
/// known.
pub fn grammar(rules: Vec<(String, Pexp)>, start: impl Into<String>) -> Result<Pexp, PegError> {
    let start = start.into();
    if rules.is_empty() {
        return Err(PegError::EmptyGrammar);
    }
    for (i, (name, _)) in rules.iter().enumerate() {
        if rules[..i].iter().any(|(n, _)| n == name) {
            return Err(PegError::DuplicateRule(name.clone()));
        }
    }
    if !rules.iter().any(|(n, _)| n == &start) {
        return Err(PegError::MissingStart(start));
    }
    analysis::verify_grammar(&rules)?;
    Ok(Pexp::Grammar { rules, start })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alt_flattens_nested_choices() {
        let p = alt(vec![
            alt(vec![lit("a"), lit("b")]),
            lit("c"),
        ]);
        match p {
            Pexp::Alt(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected Alt, got {:?}", other),
        }
    }

    #[test]
    fn alt_of_one_collapses() {
        assert_eq!(alt(vec![lit("a")]), lit("a"));
    }

    #[test]
    fn rep_rejects_nullable_body() {
        let empty = lit("");
        assert_eq!(rep_atleast(empty.clone(), 1), Err(PegError::NullableLoop));
        assert_eq!(rep_atmost(empty, 3), Err(PegError::NullableLoop));
    }

    #[test]
    fn rep_accepts_consuming_body() {
        assert!(rep_atleast(byte_range(b'0', b'9'), 0).is_ok());
        assert!(rep_atmost(lit("ab"), 2).is_ok());
    }

    #[test]
    fn look_behind_rejects_variable_length() {
        let p = rep_atleast(lit("x"), 1).unwrap();
        assert_eq!(look_behind(p), Err(PegError::BehindNotFixed));
    }

    #[test]
    fn look_behind_rejects_captures() {
        let p = capture("c", lit("x"));
        assert_eq!(look_behind(p), Err(PegError::BehindHasCaptures));
    }

    #[test]
    fn look_behind_rejects_overlong_body() {
        let long = lit(vec![b'x'; 300]);
        assert!(matches!(
            look_behind(long),
            Err(PegError::BehindTooLong { len: 300, .. })
        ));
    }

    #[test]
    fn look_behind_accepts_fixed_body() {
        assert!(look_behind(seq(lit("ab"), byte_range(0, 255))).is_ok());
    }

    #[test]
    fn grammar_rejects_duplicates_and_missing_start() {
        let r = vec![
            ("a".to_string(), lit("x")),
            ("a".to_string(), lit("y")),
        ];
        assert_eq!(
            grammar(r, "a"),
            Err(PegError::DuplicateRule("a".to_string()))
        );
        let r = vec![("a".to_string(), lit("x"))];
        assert_eq!(
            grammar(r, "b"),
            Err(PegError::MissingStart("b".to_string()))
        );
    }

    #[test]
    fn grammar_rejects_undefined_rule_ref() {
        let r = vec![("a".to_string(), v("nope"))];
        assert_eq!(
            grammar(r, "a"),
            Err(PegError::UndefinedRule("nope".to_string()))
        );
    }

    #[test]
    fn grammar_rejects_left_recursion() {
        // a = a "x"
        let r = vec![("a".to_string(), seq(v("a"), lit("x")))];
        assert_eq!(
            grammar(r, "a"),
            Err(PegError::LeftRecursive("a".to_string()))
        );
    }

    #[test]
    fn grammar_accepts_right_recursion() {
        // a = "x" a / ""
        let r = vec![(
            "a".to_string(),
            alt(vec![seq(lit("x"), v("a")), lit("")]),
        )];
        assert!(grammar(r, "a").is_ok());
    }
}
