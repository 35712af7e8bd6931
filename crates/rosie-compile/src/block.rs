//! The two-pass block compiler and the top-level entry points.
//!
//! Pass 1 binds every statement's left-hand side to a `Novalue`
//! placeholder. Pass 2 compiles right-hand sides in source order; a failed
//! statement leaves its placeholder in place, records a violation, and
//! compilation moves on to the next statement. Forward references outside
//! grammars therefore fail today; iterating pass 2 until the `Novalue` set
//! stops shrinking would lift that.
//! TODO: iterate pass 2 to fixpoint for out-of-order top-level bindings.

use rosie_core::{Binding as AstBinding, Block, Exp, ExpKind, Violation, Violations};

use crate::env::{Binding, Environment, Pat};
use crate::error::CompileError;
use crate::expression::{self, CompiledValue};

/// Who we say we are in violation records.
const WHO: &str = "compiler";

/// What the loader tells the compiler about the unit being compiled.
///
/// Imports themselves are satisfied before compilation; only the naming
/// parts matter here.
#[derive(Clone, Debug, Default)]
pub struct LoadRequest {
    pub importpath: Option<String>,
    pub prefix: Option<String>,
    pub packagename: Option<String>,
}

impl LoadRequest {
    /// The prefix applied to capture labels, if any.
    ///
    /// Only a loaded unit (one with an import path) gets a prefix, and an
    /// explicit `.` prefix means "import at top level": no prefix at all.
    fn effective_prefix(&self) -> Option<&str> {
        if self.importpath.is_none() {
            return None;
        }
        match self.prefix.as_deref() {
            Some(".") => None,
            Some(p) => Some(p),
            None => self.packagename.as_deref(),
        }
    }
}

/// Compile a block into `env`, appending failures to `sink`.
///
/// Returns the declared package name, which the caller uses as the
/// registration key. A non-empty sink with errors means the block
/// completed with diagnostics; bindings that failed stay `Novalue`.
pub fn compile_block(
    block: &Block,
    env: &mut Environment,
    request: Option<&LoadRequest>,
    sink: &mut Violations,
) -> Option<String> {
    let prefix = request.and_then(|r| r.effective_prefix());

    // Pass 1: placeholders for every left-hand side.
    for stmt in &block.stmts {
        let prev = env.bind(
            stmt.id.localname.clone(),
            Binding::Novalue {
                exported: !stmt.is_local,
                span: stmt.span,
            },
        );
        if prev.is_some() {
            sink.push(Violation::info(
                WHO,
                format!("rebinding identifier '{}'", stmt.id.localname),
            ));
        }
    }

    // Pass 2: compile in source order.
    for stmt in &block.stmts {
        match compile_statement(stmt, env, prefix) {
            Ok(binding) => {
                env.bind(stmt.id.localname.clone(), binding);
            }
            Err(e) => sink.push(
                Violation::compile(WHO, e.to_string()).with_ast(stmt.exp.to_string()),
            ),
        }
    }

    block.package_decl.clone()
}

fn compile_statement(
    stmt: &AstBinding,
    env: &mut Environment,
    prefix: Option<&str>,
) -> Result<Binding, CompileError> {
    match expression::compile_exp(&stmt.exp, env, prefix)? {
        CompiledValue::Pattern(mut pat) => {
            let is_grammar = matches!(stmt.exp.kind, ExpKind::Grammar { .. });
            if !stmt.is_alias && !is_grammar {
                pat.wrap(&label(prefix, &stmt.id.localname));
            }
            pat.name = Some(stmt.id.localname.clone());
            pat.alias = stmt.is_alias;
            pat.exported = !stmt.is_local;
            Ok(Binding::Pattern(pat))
        }
        CompiledValue::Str(bytes) => Ok(Binding::Str(bytes)),
        CompiledValue::Tag(tag) => Ok(Binding::Hashtag(tag)),
    }
}

/// Compile an ad-hoc match expression against an existing environment.
///
/// A reference to an alias, and any non-reference expression, is wrapped
/// with the anonymous label `*` so the match output always has an outer
/// capture; the alias flag is cleared on the way out. Grammars are
/// force-wrapped here, the one place that is allowed.
pub fn compile_expression(
    exp: &Exp,
    env: &mut Environment,
    sink: &mut Violations,
) -> Option<Pat> {
    match expression::compile_exp(exp, env, None) {
        Ok(CompiledValue::Pattern(mut pat)) => {
            match exp.kind {
                ExpKind::Ref(_) => {
                    if pat.alias {
                        pat.wrap("*");
                    }
                }
                _ => pat.wrap("*"),
            }
            pat.alias = false;
            Some(pat)
        }
        Ok(_) => {
            sink.push(
                Violation::compile(WHO, CompileError::InvalidExpression(exp.to_string()).to_string())
                    .with_ast(exp.to_string()),
            );
            None
        }
        Err(e) => {
            sink.push(Violation::compile(WHO, e.to_string()).with_ast(exp.to_string()));
            None
        }
    }
}

fn label(prefix: Option<&str>, localname: &str) -> String {
    match prefix {
        Some(p) => format!("{}.{}", p, localname),
        None => localname.to_string(),
    }
}
