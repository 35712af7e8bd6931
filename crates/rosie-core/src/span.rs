use serde::{Deserialize, Serialize};

/// A half-open byte range in RPL source text.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Span {
    start: u32,
    end: u32,
}

impl Span {
    /// Dummy span at offset zero, used for synthesized nodes.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start past end");
        Self { start, end }
    }

    pub fn start(self) -> u32 {
        self.start
    }

    pub fn end(self) -> u32 {
        self.end
    }

    pub fn len(self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// A reference back into the source text that produced an AST node.
///
/// Violations carry one of these so diagnostics can point at the offending
/// text. `parent` chains through macro-expanded or imported text back to the
/// text the user actually wrote.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SourceRef {
    /// The source text the positions index into.
    pub text: String,
    /// Start position, 1-based inclusive.
    pub s: usize,
    /// End position, 1-based exclusive.
    pub e: usize,
    /// Where the text came from (a file path or module name), if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// The enclosing source this one was derived from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<SourceRef>>,
}

impl SourceRef {
    pub fn new(text: impl Into<String>, s: usize, e: usize) -> Self {
        Self {
            text: text.into(),
            s,
            e,
            origin: None,
            parent: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// The slice of `text` this reference covers.
    pub fn snippet(&self) -> &str {
        let s = self.s.saturating_sub(1).min(self.text.len());
        let e = self.e.saturating_sub(1).min(self.text.len());
        &self.text[s..e]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_cover() {
        let a = Span::new(5, 10);
        let b = Span::new(8, 20);
        assert_eq!(a.cover(b), Span::new(5, 20));
        assert_eq!(b.cover(a), Span::new(5, 20));
    }

    #[test]
    fn span_contains_is_half_open() {
        let s = Span::new(3, 6);
        assert!(s.contains(3));
        assert!(s.contains(5));
        assert!(!s.contains(6));
        assert!(!s.contains(2));
    }

    #[test]
    fn sourceref_snippet() {
        let r = SourceRef::new("digit = [0-9]", 9, 14);
        assert_eq!(r.snippet(), "[0-9]");
    }

    #[test]
    fn sourceref_snippet_clamps_out_of_range() {
        let r = SourceRef::new("abc", 2, 99);
        assert_eq!(r.snippet(), "bc");
    }
}
