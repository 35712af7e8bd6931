//! Built-in primitive functions.
//!
//! These are the pre-installed bindings usable through application syntax.
//! They consume compiled argument values (patterns, strings, hashtags) and
//! produce a PEG expression; failures surface as plain text the caller
//! wraps in its own diagnostic.

use rosie_peg::{const_capture, Pexp};

use crate::env::{Binding, Environment};
use crate::expression::CompiledValue;

/// A compiler-provided builtin.
#[derive(Copy, Clone, Debug)]
pub struct PrimFunction {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    imp: fn(&[CompiledValue]) -> Result<Pexp, String>,
}

impl PrimFunction {
    /// Invoke with already-compiled arguments, checking arity first.
    pub fn call(&self, args: &[CompiledValue]) -> Result<Pexp, String> {
        if args.len() < self.min_args || args.len() > self.max_args {
            return Err(format!(
                "{} takes {} to {} arguments, got {}",
                self.name, self.min_args, self.max_args, args.len()
            ));
        }
        (self.imp)(args)
    }
}

/// Install the builtins into the root frame of `env`.
pub fn install(env: &mut Environment) {
    env.bind("message", Binding::PrimFn(MESSAGE));
    env.bind("error", Binding::PrimFn(ERROR));
}

/// `message:(text [, tag])` - consumes nothing, inserts a constant capture
/// carrying `text`, labeled by `tag` (default `message`).
const MESSAGE: PrimFunction = PrimFunction {
    name: "message",
    min_args: 1,
    max_args: 2,
    imp: |args| build_constant("message", args),
};

/// `error:(text [, tag])` - like `message`, labeled `error` by default, so
/// match output marks the position where input stopped making sense.
const ERROR: PrimFunction = PrimFunction {
    name: "error",
    min_args: 1,
    max_args: 2,
    imp: |args| build_constant("error", args),
};

fn build_constant(default_label: &str, args: &[CompiledValue]) -> Result<Pexp, String> {
    let text = match &args[0] {
        CompiledValue::Str(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        CompiledValue::Tag(tag) => tag.clone(),
        CompiledValue::Pattern(_) => {
            return Err("first argument must be a string or hashtag".to_string())
        }
    };
    let label = match args.get(1) {
        None => default_label.to_string(),
        Some(CompiledValue::Tag(tag)) => tag.clone(),
        Some(_) => return Err("second argument must be a hashtag".to_string()),
    };
    Ok(const_capture(label, text))
}
