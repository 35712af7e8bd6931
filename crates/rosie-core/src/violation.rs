//! Violation records and the collecting sink.
//!
//! Compilation does not abort on the first problem. Each component appends
//! its failures to a [`Violations`] sink and carries on where it can; the
//! caller inspects the sink when the block is done. The records serialize to
//! JSON in the shape the embedding API exposes.

use serde::{Deserialize, Serialize};

use crate::span::SourceRef;

/// What produced a violation and how severe it is.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationKind {
    /// Reported by the parser; surfaced through the sink, never raised.
    Syntax,
    /// Reported by the compiler.
    Compile,
    /// Informational note, e.g. a rebinding.
    Info,
    Warning,
}

impl ViolationKind {
    /// Whether this kind stops the owning binding from compiling.
    pub fn is_error(self) -> bool {
        matches!(self, ViolationKind::Syntax | ViolationKind::Compile)
    }
}

/// One diagnostic record.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// The component that reported this, e.g. `"compiler"` or `"parser"`.
    pub who: String,
    pub message: String,
    /// The offending AST node, rendered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ast: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sourceref: Option<SourceRef>,
}

impl Violation {
    pub fn new(kind: ViolationKind, who: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            who: who.into(),
            message: message.into(),
            ast: None,
            sourceref: None,
        }
    }

    pub fn compile(who: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationKind::Compile, who, message)
    }

    pub fn info(who: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationKind::Info, who, message)
    }

    pub fn with_ast(mut self, ast: impl Into<String>) -> Self {
        self.ast = Some(ast.into());
        self
    }

    pub fn with_sourceref(mut self, sourceref: SourceRef) -> Self {
        self.sourceref = Some(sourceref);
        self
    }
}

/// The collecting sink.
#[derive(Clone, Debug, Default)]
pub struct Violations {
    items: Vec<Violation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, v: Violation) {
        self.items.push(v);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True if any recorded violation is an error (syntax or compile).
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|v| v.kind.is_error())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.items
    }

    /// Render the whole list as a JSON array.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.items).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_collects_in_order() {
        let mut sink = Violations::new();
        sink.push(Violation::compile("compiler", "first"));
        sink.push(Violation::info("compiler", "second"));
        let msgs: Vec<_> = sink.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(msgs, vec!["first", "second"]);
    }

    #[test]
    fn has_errors_ignores_notes() {
        let mut sink = Violations::new();
        sink.push(Violation::info("compiler", "rebinding note"));
        assert!(!sink.has_errors());
        sink.push(Violation::compile("compiler", "unbound identifier: x"));
        assert!(sink.has_errors());
    }

    #[test]
    fn json_rendering_includes_kind_and_message() {
        let mut sink = Violations::new();
        sink.push(
            Violation::compile("compiler", "unknown named charset: wxyz")
                .with_ast("[:wxyz:]"),
        );
        let json = sink.to_json();
        assert!(json.contains("\"kind\":\"compile\""));
        assert!(json.contains("unknown named charset"));
        assert!(json.contains("\"ast\":\"[:wxyz:]\""));
    }

    #[test]
    fn json_omits_missing_sourceref() {
        let mut sink = Violations::new();
        sink.push(Violation::compile("compiler", "m"));
        assert!(!sink.to_json().contains("sourceref"));
    }
}
