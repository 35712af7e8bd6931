//! The three-pass grammar compiler.
//!
//! Pass 1 extends the environment with a frame binding every rule name to a
//! placeholder whose PEG is the back-end's rule reference, so bodies can
//! refer to rules in any order. Pass 2 compiles rule bodies in that frame,
//! wrapping non-alias rules with their capture labels. Pass 3 hands the
//! rule map to the back-end fixpoint constructor and translates its
//! structured errors.

use rosie_core::{Binding as AstBinding, Span};
use rosie_peg::{self as peg, PegError, Pexp};

use crate::env::{Binding, Environment, Pat};
use crate::error::CompileError;
use crate::expression;

/// Compile a grammar expression. The first rule is the start rule and its
/// local name becomes the grammar's effective name.
pub fn compile_grammar(
    rules: &[AstBinding],
    span: Span,
    env: &mut Environment,
    prefix: Option<&str>,
) -> Result<Pat, CompileError> {
    let first = rules
        .first()
        .ok_or_else(|| CompileError::Internal("grammar with no rules".to_string()))?;
    let gname = first.id.localname.clone();

    // Pass 1: bind rule references and compute capture labels.
    env.extend();
    for rule in rules {
        let id = &rule.id.localname;
        env.bind(
            id.clone(),
            Binding::Pattern(Pat {
                name: Some(id.clone()),
                peg: peg::v(id.clone()),
                uncap: None,
                alias: rule.is_alias,
                exported: false,
                span: rule.span,
            }),
        );
    }

    // Pass 2: compile rule bodies inside the new frame.
    let compiled = compile_rules(rules, &gname, env, prefix);
    env.retract();
    let compiled = compiled?;

    // Pass 3: build the fixpoint.
    match peg::grammar(compiled, gname.clone()) {
        Ok(g) => Ok(Pat {
            name: Some(gname),
            peg: g,
            uncap: None,
            alias: false,
            exported: false,
            span,
        }),
        // The left-recursion text is surfaced verbatim; everything else is
        // a generic peg compilation failure.
        Err(e @ PegError::LeftRecursive(_)) => Err(CompileError::LeftRecursion(e.to_string())),
        Err(e) => Err(CompileError::PegCompilation(e.to_string())),
    }
}

fn compile_rules(
    rules: &[AstBinding],
    gname: &str,
    env: &mut Environment,
    prefix: Option<&str>,
) -> Result<Vec<(String, Pexp)>, CompileError> {
    let mut compiled = Vec::with_capacity(rules.len());
    for rule in rules {
        let id = &rule.id.localname;
        let mut peg = expression::compile_pattern(&rule.exp, env, prefix)?.peg;
        if !rule.is_alias {
            peg = peg::capture(rule_label(prefix, gname, id), peg);
        }
        compiled.push((id.clone(), peg));
    }
    Ok(compiled)
}

/// Capture label for a rule: the start rule gets `prefix? . id`, every
/// other rule `prefix? . grammar . id`.
fn rule_label(prefix: Option<&str>, gname: &str, id: &str) -> String {
    let mut label = String::new();
    if let Some(p) = prefix {
        label.push_str(p);
        label.push('.');
    }
    if id != gname {
        label.push_str(gname);
        label.push('.');
    }
    label.push_str(id);
    label
}
