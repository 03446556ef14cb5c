//! Source positions attached to syntax nodes.

/// A byte range in a source file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// A value paired with its source span.
pub type Spanned<T> = (T, Span);

/// Where a syntax node came from.
///
/// Nodes synthesized by a rewrite are *ghost* nodes: they reuse the span of
/// the user-written node they were derived from, so diagnostics from later
/// compilation stages still point at real source, but tools can tell that
/// the node itself was never written by the user.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub span: Span,
    pub ghost: bool,
}

impl Location {
    pub const fn new(span: Span) -> Self {
        Self { span, ghost: false }
    }

    /// A location for a node synthesized from source at `span`.
    pub const fn ghost(span: Span) -> Self {
        Self { span, ghost: true }
    }

    pub const fn to_ghost(self) -> Self {
        Self::ghost(self.span)
    }

    pub fn to(self, other: Location) -> Location {
        Location {
            span: self.span.to(other.span),
            ghost: self.ghost && other.ghost,
        }
    }
}

impl From<Span> for Location {
    fn from(span: Span) -> Self {
        Location::new(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_union() {
        assert_eq!(Span::new(4, 9).to(Span::new(2, 6)), Span::new(2, 9));
    }

    #[test]
    fn test_ghost_keeps_span() {
        let loc = Location::new(Span::new(3, 7));
        let ghost = loc.to_ghost();
        assert!(ghost.ghost);
        assert_eq!(ghost.span, loc.span);
        assert!(!loc.to(ghost).ghost);
    }
}
