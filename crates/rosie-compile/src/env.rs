//! The lexical environment: a stack of frames mapping local names to
//! bindings.
//!
//! Unqualified lookup searches from the innermost frame outward. Qualified
//! lookup (`pkg.name`) resolves the package part to a [`Binding::Package`]
//! entry installed by the loader, then finds the local name among that
//! package's exports. `extend`/`retract` bracket grammar compilation, which
//! introduces a frame for its rule names.

use std::collections::HashMap;

use rosie_core::{Identifier, Span};
use rosie_peg::Pexp;

use crate::primitives::PrimFunction;

/// A compiled pattern plus its metadata.
#[derive(Clone, PartialEq, Debug)]
pub struct Pat {
    /// The name the pattern is known by at the site that produced it.
    pub name: Option<String>,
    /// The externally visible form, captured where appropriate.
    pub peg: Pexp,
    /// The same PEG without the outer capture wrapper, when `peg` is
    /// `capture(label, uncap)`. Grammars never carry one.
    pub uncap: Option<Pexp>,
    /// Alias bindings contribute no capture wrapper of their own.
    pub alias: bool,
    pub exported: bool,
    pub span: Span,
}

impl Pat {
    /// An anonymous pattern around a bare PEG expression.
    pub fn anonymous(peg: Pexp, span: Span) -> Self {
        Self {
            name: None,
            peg,
            uncap: None,
            alias: false,
            exported: false,
            span,
        }
    }

    /// Whether the underlying expression is a grammar fixpoint.
    pub fn is_grammar(&self) -> bool {
        matches!(self.peg, Pexp::Grammar { .. })
            || matches!(&self.peg, Pexp::Capture(_, inner) if matches!(**inner, Pexp::Grammar { .. }))
    }

    /// Apply a capture label at a binding or rule site.
    ///
    /// A previous label is peeled off first, so `p1 = p2` captures as `p1`,
    /// not `p2`. A grammar is captured as-is and stays un-peelable: its
    /// internal rule captures are part of the fixpoint and there is no
    /// meaningful uncaptured form.
    pub fn wrap(&mut self, label: &str) {
        match self.uncap.take() {
            Some(inner) => {
                self.peg = rosie_peg::capture(label, inner.clone());
                self.uncap = Some(inner);
            }
            None if matches!(self.peg, Pexp::Grammar { .. }) => {
                let inner = std::mem::replace(&mut self.peg, Pexp::Lit(Vec::new()));
                self.peg = rosie_peg::capture(label, inner);
            }
            None => {
                let inner = std::mem::replace(&mut self.peg, Pexp::Lit(Vec::new()));
                self.uncap = Some(inner.clone());
                self.peg = rosie_peg::capture(label, inner);
            }
        }
    }
}

/// What a name can be bound to.
#[derive(Clone, Debug)]
pub enum Binding {
    Pattern(Pat),
    /// A decoded string literal; not a pattern matching that string.
    Str(Vec<u8>),
    /// An identifier-like tagged string.
    Hashtag(String),
    /// A compiler-provided builtin usable via application syntax.
    PrimFn(PrimFunction),
    /// Forward placeholder inserted in pass 1 of block compilation; only
    /// observable while the owning block compiles.
    Novalue { exported: bool, span: Span },
    /// An already-loaded package's exported bindings, installed by the
    /// loader under the import prefix.
    Package {
        name: String,
        exports: HashMap<String, Binding>,
    },
}

impl Binding {
    /// Kind name used in type-mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Binding::Pattern(_) => "pattern",
            Binding::Str(_) => "string",
            Binding::Hashtag(_) => "hashtag",
            Binding::PrimFn(_) => "function",
            Binding::Novalue { .. } => "novalue",
            Binding::Package { .. } => "package",
        }
    }
}

type Frame = HashMap<String, Binding>;

/// A stack of frames. The bottom frame is the package (or top-level)
/// environment; grammar compilation pushes and pops frames above it.
#[derive(Debug, Default)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Environment {
    /// An empty environment with a single root frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new()],
        }
    }

    /// An environment with the built-in primitive functions installed.
    pub fn standard() -> Self {
        let mut env = Self::new();
        crate::primitives::install(&mut env);
        env
    }

    /// Push a new innermost frame.
    pub fn extend(&mut self) {
        self.frames.push(Frame::new());
    }

    /// Pop the innermost frame.
    pub fn retract(&mut self) {
        debug_assert!(self.frames.len() > 1, "cannot retract the root frame");
        self.frames.pop();
    }

    /// Bind `name` in the innermost frame, returning any binding it
    /// replaces there.
    pub fn bind(&mut self, name: impl Into<String>, binding: Binding) -> Option<Binding> {
        self.frames
            .last_mut()
            .expect("environment has a root frame")
            .insert(name.into(), binding)
    }

    /// Install a package's exports under its import prefix.
    pub fn bind_package(
        &mut self,
        prefix: impl Into<String>,
        name: impl Into<String>,
        exports: HashMap<String, Binding>,
    ) {
        self.bind(
            prefix,
            Binding::Package {
                name: name.into(),
                exports,
            },
        );
    }

    /// Resolve an identifier.
    ///
    /// Qualified identifiers resolve their package part up the stack and
    /// then the local name among that package's exports; unqualified ones
    /// search the frames from innermost to outermost.
    pub fn lookup(&self, id: &Identifier) -> Option<&Binding> {
        match &id.package {
            Some(pkg) => match self.lookup_local(pkg) {
                Some(Binding::Package { exports, .. }) => exports.get(&id.localname),
                _ => None,
            },
            None => self.lookup_local(&id.localname),
        }
    }

    fn lookup_local(&self, name: &str) -> Option<&Binding> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosie_peg::{capture, lit};

    fn pat(peg: Pexp) -> Pat {
        Pat::anonymous(peg, Span::DUMMY)
    }

    #[test]
    fn lookup_searches_innermost_first() {
        let mut env = Environment::new();
        env.bind("x", Binding::Str(b"outer".to_vec()));
        env.extend();
        env.bind("x", Binding::Str(b"inner".to_vec()));
        match env.lookup(&Identifier::local("x")) {
            Some(Binding::Str(s)) => assert_eq!(s, b"inner"),
            other => panic!("unexpected binding {:?}", other),
        }
        env.retract();
        match env.lookup(&Identifier::local("x")) {
            Some(Binding::Str(s)) => assert_eq!(s, b"outer"),
            other => panic!("unexpected binding {:?}", other),
        }
    }

    #[test]
    fn qualified_lookup_goes_through_package_exports() {
        let mut env = Environment::new();
        let mut exports = HashMap::new();
        exports.insert("ipv4".to_string(), Binding::Pattern(pat(lit("stub"))));
        env.bind_package("net", "net", exports);

        assert!(env.lookup(&Identifier::qualified("net", "ipv4")).is_some());
        assert!(env.lookup(&Identifier::qualified("net", "ipv6")).is_none());
        // The local name alone does not leak out of the package.
        assert!(env.lookup(&Identifier::local("ipv4")).is_none());
    }

    #[test]
    fn wrap_sets_uncap_on_first_label() {
        let mut p = pat(lit("ab"));
        p.wrap("a");
        assert_eq!(p.peg, capture("a", lit("ab")));
        assert_eq!(p.uncap, Some(lit("ab")));
    }

    #[test]
    fn wrap_replaces_previous_label() {
        let mut p = pat(lit("ab"));
        p.wrap("p2");
        p.wrap("p1");
        assert_eq!(p.peg, capture("p1", lit("ab")));
        assert_eq!(p.uncap, Some(lit("ab")));
    }

    #[test]
    fn wrap_on_grammar_keeps_uncap_empty() {
        let g = rosie_peg::grammar(vec![("s".to_string(), lit("x"))], "s").unwrap();
        let mut p = pat(g.clone());
        p.wrap("*");
        assert_eq!(p.peg, capture("*", g));
        assert_eq!(p.uncap, None);
    }
}
