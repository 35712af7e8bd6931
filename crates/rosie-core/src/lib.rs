//! Core types for the Rosie Pattern Language compiler.
//!
//! This crate provides the foundational types shared by the compiler crates:
//! - Source positions, spans, and source references
//! - Identifiers (package-qualified names)
//! - The AST handed over by the parser and syntax expander
//! - Violation records and the collecting sink

pub mod ast;
pub mod ident;
pub mod span;
pub mod violation;

// Re-export commonly used types at crate root
pub use ast::{Binding, Block, Exp, ExpKind, ImportDecl, PredicateKind};
pub use ident::Identifier;
pub use span::{SourceRef, Span};
pub use violation::{Violation, ViolationKind, Violations};
