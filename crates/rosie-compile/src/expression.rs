//! The expression compiler: one handler per AST node kind.
//!
//! Handlers return a [`CompiledValue`]; most produce patterns, while string
//! and hashtag nodes produce the value kinds primitive functions consume.
//! Errors propagate as [`CompileError`] and are caught at the block level,
//! where the offending binding is skipped and compilation continues.

use rosie_core::{Exp, ExpKind, Identifier, PredicateKind};
use rosie_peg::{self as peg, PegError, Pexp};

use crate::charset;
use crate::env::{Binding, Environment, Pat};
use crate::error::CompileError;
use crate::escape::{self, charset_item, CharsetItem, EscapeContext};
use crate::grammar;
use crate::utf8;

/// The result of compiling one expression.
#[derive(Clone, Debug)]
pub enum CompiledValue {
    Pattern(Pat),
    Str(Vec<u8>),
    Tag(String),
}

/// Compile an expression in the given environment.
///
/// `prefix` is the package prefix applied to capture labels, when one is in
/// effect for the enclosing block.
pub fn compile_exp(
    exp: &Exp,
    env: &mut Environment,
    prefix: Option<&str>,
) -> Result<CompiledValue, CompileError> {
    match &exp.kind {
        ExpKind::Literal { value } => {
            let bytes = escape::unescape(value, EscapeContext::Literal)?;
            Ok(pattern(exp, peg::lit(bytes)))
        }
        ExpKind::RplString { value } => {
            let bytes = escape::unescape(value, EscapeContext::String)?;
            Ok(CompiledValue::Str(bytes))
        }
        ExpKind::Hashtag { value } => Ok(CompiledValue::Tag(value.clone())),
        ExpKind::Sequence { exps } => {
            if exps.is_empty() {
                return Err(CompileError::Internal("empty sequence".to_string()));
            }
            let mut pegs = Vec::with_capacity(exps.len());
            for e in exps {
                pegs.push(compile_pattern(e, env, prefix)?.peg);
            }
            let mut iter = pegs.into_iter();
            let first = iter.next().expect("sequence is non-empty");
            Ok(pattern(exp, iter.fold(first, peg::seq)))
        }
        ExpKind::Choice { exps } => {
            if exps.is_empty() {
                return Err(CompileError::Internal("empty choice".to_string()));
            }
            let mut pegs = Vec::with_capacity(exps.len());
            for e in exps {
                pegs.push(compile_pattern(e, env, prefix)?.peg);
            }
            Ok(pattern(exp, peg::alt(pegs)))
        }
        ExpKind::Predicate { kind, exp: body } => {
            let compiled = compile_pattern(body, env, prefix)?;
            let result = match kind {
                PredicateKind::LookAhead => Ok(peg::look_ahead(compiled.peg)),
                PredicateKind::Negation => Ok(peg::negation(compiled.peg)),
                PredicateKind::LookBehind => peg::look_behind(compiled.peg),
            };
            match result {
                Ok(p) => Ok(pattern(exp, p)),
                Err(PegError::BehindNotFixed) => {
                    Err(CompileError::LookbehindNotFixed(body.to_string()))
                }
                Err(PegError::BehindTooLong { .. }) => {
                    Err(CompileError::LookbehindTooLong(body.to_string()))
                }
                Err(PegError::BehindHasCaptures) => {
                    Err(CompileError::LookbehindHasCaptures(body.to_string()))
                }
                Err(e) => Err(CompileError::Internal(e.to_string())),
            }
        }
        ExpKind::CsNamed { name, complement } => {
            let p = charset::named_charset(name)
                .ok_or_else(|| CompileError::UnknownNamedCharset(name.clone()))?;
            Ok(pattern(exp, complemented(p, *complement)))
        }
        ExpKind::CsRange {
            first,
            last,
            complement,
        } => {
            let lo = charset_item(first)?
                .ok_or_else(|| CompileError::InvalidExpression(exp.to_string()))?;
            let hi = charset_item(last)?
                .ok_or_else(|| CompileError::InvalidExpression(exp.to_string()))?;
            let p = match (lo, hi) {
                (CharsetItem::Byte(a), CharsetItem::Byte(b)) if a <= b => peg::byte_range(a, b),
                (lo, hi) => {
                    let (a, b) = (codepoint_of(lo), codepoint_of(hi));
                    if a > b {
                        return Err(CompileError::InvalidExpression(exp.to_string()));
                    }
                    utf8::codepoint_range(a, b)?
                }
            };
            Ok(pattern(exp, complemented(p, *complement)))
        }
        ExpKind::CsList { chars, complement } => {
            let mut parts = Vec::with_capacity(chars.len());
            for c in chars {
                let bytes = escape::unescape(c, EscapeContext::Charset)?;
                parts.push(peg::lit(bytes));
            }
            if parts.is_empty() {
                return Err(CompileError::Internal("empty character list".to_string()));
            }
            Ok(pattern(exp, complemented(peg::alt(parts), *complement)))
        }
        ExpKind::CsExp { cexp, complement } => {
            // Nested cs_exp layers collapse: the complements XOR.
            let mut inner: &Exp = cexp;
            let mut comp = *complement;
            while let ExpKind::CsExp { cexp, complement } = &inner.kind {
                comp ^= *complement;
                inner = cexp;
            }
            match &inner.kind {
                ExpKind::CsUnion { cexps } => {
                    if cexps.is_empty() {
                        return Err(CompileError::Internal("empty charset union".to_string()));
                    }
                    let mut parts = Vec::with_capacity(cexps.len());
                    for c in cexps {
                        parts.push(compile_pattern(c, env, prefix)?.peg);
                    }
                    Ok(pattern(exp, complemented(peg::alt(parts), comp)))
                }
                ExpKind::CsIntersection { .. } => Err(CompileError::IntersectionUnimplemented),
                ExpKind::CsDifference { .. } => Err(CompileError::DifferenceUnimplemented),
                _ => {
                    let p = compile_pattern(inner, env, prefix)?;
                    Ok(pattern(exp, complemented(p.peg, comp)))
                }
            }
        }
        ExpKind::CsUnion { .. } | ExpKind::CsIntersection { .. } | ExpKind::CsDifference { .. } => {
            // Bare set-algebra nodes only occur under cs_exp; anything else
            // is an expander bug.
            match &exp.kind {
                ExpKind::CsIntersection { .. } => Err(CompileError::IntersectionUnimplemented),
                ExpKind::CsDifference { .. } => Err(CompileError::DifferenceUnimplemented),
                _ => Err(CompileError::InvalidExpression(exp.to_string())),
            }
        }
        ExpKind::Atleast { exp: body, min } => {
            let compiled = compile_pattern(body, env, prefix)?;
            match peg::rep_atleast(compiled.peg, *min) {
                Ok(p) => Ok(pattern(exp, p)),
                Err(PegError::NullableLoop) => Err(CompileError::NullableRepetition),
                Err(e) => Err(CompileError::Internal(e.to_string())),
            }
        }
        ExpKind::Atmost { exp: body, max } => {
            let compiled = compile_pattern(body, env, prefix)?;
            match peg::rep_atmost(compiled.peg, *max) {
                Ok(p) => Ok(pattern(exp, p)),
                Err(PegError::NullableLoop) => Err(CompileError::NullableRepetition),
                Err(e) => Err(CompileError::Internal(e.to_string())),
            }
        }
        ExpKind::Ref(id) => compile_ref(id, exp, env),
        ExpKind::Application { target, arglist } => {
            compile_application(target, arglist, exp, env, prefix)
        }
        ExpKind::Grammar { rules } => {
            let pat = grammar::compile_grammar(rules, exp.span, env, prefix)?;
            Ok(CompiledValue::Pattern(pat))
        }
    }
}

/// Compile an expression that must produce a pattern.
pub fn compile_pattern(
    exp: &Exp,
    env: &mut Environment,
    prefix: Option<&str>,
) -> Result<Pat, CompileError> {
    match compile_exp(exp, env, prefix)? {
        CompiledValue::Pattern(p) => Ok(p),
        CompiledValue::Str(_) | CompiledValue::Tag(_) => {
            Err(CompileError::InvalidExpression(exp.to_string()))
        }
    }
}

fn compile_ref(id: &Identifier, exp: &Exp, env: &Environment) -> Result<CompiledValue, CompileError> {
    match env.lookup(id) {
        // A forward placeholder acts as unbound: it only means "this name
        // appears later in the block" and is not referenceable.
        None | Some(Binding::Novalue { .. }) => {
            Err(CompileError::UnboundIdentifier(id.to_string()))
        }
        Some(Binding::Pattern(bound)) => Ok(CompiledValue::Pattern(Pat {
            name: Some(id.localname.clone()),
            peg: bound.peg.clone(),
            uncap: bound.uncap.clone(),
            alias: bound.alias,
            exported: false,
            span: exp.span,
        })),
        Some(other) => Err(CompileError::TypeMismatch {
            expected: "pattern",
            name: id.to_string(),
            actual: other.kind_name(),
        }),
    }
}

fn compile_application(
    target: &Identifier,
    arglist: &[Exp],
    exp: &Exp,
    env: &mut Environment,
    prefix: Option<&str>,
) -> Result<CompiledValue, CompileError> {
    let func = match env.lookup(target) {
        None => return Err(CompileError::UnboundIdentifier(target.to_string())),
        Some(Binding::PrimFn(f)) => f.clone(),
        Some(other) => {
            return Err(CompileError::TypeMismatch {
                expected: "function",
                name: target.to_string(),
                actual: other.kind_name(),
            })
        }
    };
    let mut args = Vec::with_capacity(arglist.len());
    for a in arglist {
        args.push(compile_exp(a, env, prefix)?);
    }
    let result = func
        .call(&args)
        .map_err(CompileError::FunctionFailed)?;
    Ok(CompiledValue::Pattern(Pat {
        name: Some(target.to_string()),
        peg: result,
        uncap: None,
        alias: false,
        exported: false,
        span: exp.span,
    }))
}

fn pattern(exp: &Exp, peg: Pexp) -> CompiledValue {
    CompiledValue::Pattern(Pat::anonymous(peg, exp.span))
}

fn complemented(p: Pexp, complement: bool) -> Pexp {
    if complement {
        charset::complement(p)
    } else {
        p
    }
}

fn codepoint_of(item: CharsetItem) -> u32 {
    match item {
        CharsetItem::Byte(b) => b as u32,
        CharsetItem::Codepoint(cp) => cp,
    }
}
