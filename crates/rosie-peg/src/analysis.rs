//! Structural analyses over pattern expressions.
//!
//! The constructors in [`crate::pexp`] call these to validate shapes at
//! build time; the grammar verifier re-runs the nullability check with the
//! rule map in scope, since a `V` body's nullability is unknowable before
//! the fixpoint is assembled.

use std::collections::HashSet;

use crate::error::PegError;
use crate::pexp::Pexp;

/// Whether `p` can succeed without consuming input.
///
/// `V` references are treated as consuming here; the grammar verifier
/// revisits them once rule bodies are known.
pub fn nullable(p: &Pexp) -> bool {
    match p {
        Pexp::Lit(bytes) => bytes.is_empty(),
        Pexp::ByteRange(..) => false,
        Pexp::Seq(a, b) => nullable(a) && nullable(b),
        Pexp::Alt(parts) => parts.iter().any(nullable),
        Pexp::LookAhead(_) | Pexp::LookBehind(_) | Pexp::Negation(_) => true,
        Pexp::AtLeast(body, n) => *n == 0 || nullable(body),
        Pexp::AtMost(..) => true,
        Pexp::Capture(_, body) => nullable(body),
        Pexp::ConstCapture(..) => true,
        Pexp::Grammar { rules, start } => {
            let mut visiting = HashSet::new();
            nullable_rule(rules, start, &mut visiting)
        }
        Pexp::V(_) => false,
    }
}

fn nullable_in(rules: &[(String, Pexp)], p: &Pexp, visiting: &mut HashSet<String>) -> bool {
    match p {
        Pexp::Seq(a, b) => nullable_in(rules, a, visiting) && nullable_in(rules, b, visiting),
        Pexp::Alt(parts) => parts.iter().any(|p| nullable_in(rules, p, visiting)),
        Pexp::AtLeast(body, n) => *n == 0 || nullable_in(rules, body, visiting),
        Pexp::Capture(_, body) => nullable_in(rules, body, visiting),
        Pexp::V(name) => nullable_rule(rules, name, visiting),
        other => nullable(other),
    }
}

fn nullable_rule(rules: &[(String, Pexp)], name: &str, visiting: &mut HashSet<String>) -> bool {
    // A cycle reached here is left recursion; the verifier reports it, so
    // the nullability answer for the cycle itself does not matter.
    if !visiting.insert(name.to_string()) {
        return false;
    }
    let result = match rules.iter().find(|(n, _)| n == name) {
        Some((_, body)) => nullable_in(rules, body, visiting),
        None => false,
    };
    visiting.remove(name);
    result
}

/// The exact number of bytes `p` consumes on every match, if that number
/// is the same for all matches.
pub fn fixed_length(p: &Pexp) -> Option<u32> {
    match p {
        Pexp::Lit(bytes) => Some(bytes.len() as u32),
        Pexp::ByteRange(..) => Some(1),
        Pexp::Seq(a, b) => fixed_length(a)?.checked_add(fixed_length(b)?),
        Pexp::Alt(parts) => {
            let mut lens = parts.iter().map(fixed_length);
            let first = lens.next()??;
            for len in lens {
                if len? != first {
                    return None;
                }
            }
            Some(first)
        }
        Pexp::LookAhead(_) | Pexp::LookBehind(_) | Pexp::Negation(_) => Some(0),
        Pexp::AtLeast(..) => None,
        Pexp::AtMost(_, 0) => Some(0),
        Pexp::AtMost(..) => None,
        Pexp::Capture(_, body) => fixed_length(body),
        Pexp::ConstCapture(..) => Some(0),
        Pexp::Grammar { .. } | Pexp::V(_) => None,
    }
}

/// Whether a match of `p` can produce capture records.
pub fn has_captures(p: &Pexp) -> bool {
    match p {
        Pexp::Capture(..) | Pexp::ConstCapture(..) => true,
        Pexp::Lit(_) | Pexp::ByteRange(..) | Pexp::V(_) => false,
        Pexp::Seq(a, b) => has_captures(a) || has_captures(b),
        Pexp::Alt(parts) => parts.iter().any(has_captures),
        Pexp::LookAhead(body)
        | Pexp::LookBehind(body)
        | Pexp::Negation(body)
        | Pexp::AtLeast(body, _)
        | Pexp::AtMost(body, _) => has_captures(body),
        Pexp::Grammar { rules, .. } => rules.iter().any(|(_, body)| has_captures(body)),
    }
}

/// Verify a rule set before the fixpoint is built.
///
/// Checks every rule body for references to missing rules and for
/// repetition bodies that are nullable once rule bodies are known, then
/// checks each rule for left recursion by walking the positions reachable
/// without consuming input.
pub fn verify_grammar(rules: &[(String, Pexp)]) -> Result<(), PegError> {
    for (_, body) in rules {
        walk(rules, body)?;
    }
    for (name, body) in rules {
        let mut visiting = HashSet::new();
        visiting.insert(name.clone());
        check_left(rules, body, &mut visiting)?;
    }
    Ok(())
}

fn walk(rules: &[(String, Pexp)], p: &Pexp) -> Result<(), PegError> {
    match p {
        Pexp::V(name) => {
            if rules.iter().any(|(n, _)| n == name) {
                Ok(())
            } else {
                Err(PegError::UndefinedRule(name.clone()))
            }
        }
        Pexp::AtLeast(body, _) | Pexp::AtMost(body, _) => {
            if nullable_in(rules, body, &mut HashSet::new()) {
                return Err(PegError::NullableLoop);
            }
            walk(rules, body)
        }
        Pexp::Seq(a, b) => {
            walk(rules, a)?;
            walk(rules, b)
        }
        Pexp::Alt(parts) => parts.iter().try_for_each(|p| walk(rules, p)),
        Pexp::LookAhead(body)
        | Pexp::LookBehind(body)
        | Pexp::Negation(body)
        | Pexp::Capture(_, body) => walk(rules, body),
        // A nested grammar was verified against its own rules when it was
        // constructed; its V refs do not see this rule set.
        Pexp::Grammar { .. } => Ok(()),
        Pexp::Lit(_) | Pexp::ByteRange(..) | Pexp::ConstCapture(..) => Ok(()),
    }
}

fn check_left(
    rules: &[(String, Pexp)],
    p: &Pexp,
    visiting: &mut HashSet<String>,
) -> Result<(), PegError> {
    match p {
        Pexp::V(name) => {
            if visiting.contains(name) {
                return Err(PegError::LeftRecursive(name.clone()));
            }
            if let Some((_, body)) = rules.iter().find(|(n, _)| n == name) {
                visiting.insert(name.clone());
                check_left(rules, body, visiting)?;
                visiting.remove(name);
            }
            Ok(())
        }
        Pexp::Seq(a, b) => {
            check_left(rules, a, visiting)?;
            if nullable_in(rules, a, &mut HashSet::new()) {
                check_left(rules, b, visiting)?;
            }
            Ok(())
        }
        Pexp::Alt(parts) => parts
            .iter()
            .try_for_each(|p| check_left(rules, p, visiting)),
        Pexp::LookAhead(body) | Pexp::Negation(body) => check_left(rules, body, visiting),
        Pexp::AtLeast(body, _) | Pexp::AtMost(body, _) => check_left(rules, body, visiting),
        Pexp::Capture(_, body) => check_left(rules, body, visiting),
        // Fixed-length bodies cannot contain V, so lookbehind cannot recurse.
        Pexp::LookBehind(_) => Ok(()),
        Pexp::Grammar { .. } => Ok(()),
        Pexp::Lit(_) | Pexp::ByteRange(..) | Pexp::ConstCapture(..) => Ok(()),
    }
}
