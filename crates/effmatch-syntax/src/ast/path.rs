//! Long identifiers and literal constants.

use effmatch_core::Symbol;

/// A possibly-qualified name: `x`, `Some`, `Effect.Deep.match_with`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct Path {
    segments: Vec<Symbol>,
}

impl Path {
    /// An unqualified name.
    pub fn ident(name: Symbol) -> Self {
        Self {
            segments: vec![name],
        }
    }

    /// Build a path from already-split segments.
    ///
    /// # Panics
    ///
    /// Panics if `segments` is empty.
    pub fn from_segments(segments: Vec<Symbol>) -> Self {
        assert!(!segments.is_empty(), "a path needs at least one segment");
        Self { segments }
    }

    /// Split a dotted name into a path. Not suitable for operator names,
    /// which may themselves contain dots; use [`Path::ident`] for those.
    pub fn dotted(text: &str) -> Self {
        Self::from_segments(text.split('.').map(Symbol::from_dynamic).collect())
    }

    /// Extend a module path with one more segment.
    pub fn child(&self, name: Symbol) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name);
        Self { segments }
    }

    /// The last segment, i.e. the name this path refers to.
    pub fn name(&self) -> Symbol {
        *self
            .segments
            .last()
            .expect("paths are never empty by construction")
    }

    /// Module qualifiers in front of [`Path::name`].
    pub fn qualifier(&self) -> &[Symbol] {
        &self.segments[..self.segments.len() - 1]
    }

    pub fn segments(&self) -> &[Symbol] {
        &self.segments
    }

    /// Whether this is the unqualified name `text`.
    pub fn is_ident(&self, text: &str) -> bool {
        self.segments.len() == 1 && self.segments[0] == text
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for qualifier in self.qualifier() {
            write!(f, "{qualifier}.")?;
        }
        let name = self.name();
        if name.is_operator() {
            write!(f, "( {name} )")
        } else {
            write!(f, "{name}")
        }
    }
}

/// A literal constant. Floats keep their source spelling so a rewrite
/// reproduces them exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum Constant {
    Int(i64),
    Float(String),
    Char(char),
    String(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_path() {
        let path = Path::dotted("Effect.Deep.match_with");
        assert_eq!(path.name(), "match_with");
        assert_eq!(path.qualifier().len(), 2);
        assert_eq!(path.to_string(), "Effect.Deep.match_with");
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(Path::ident(Symbol::new("+")).to_string(), "( + )");
        assert_eq!(
            Path::dotted("Stdlib").child(Symbol::new("@")).to_string(),
            "Stdlib.( @ )"
        );
    }

    #[test]
    fn test_is_ident() {
        assert!(Path::dotted("raise").is_ident("raise"));
        assert!(!Path::dotted("Stdlib.raise").is_ident("raise"));
    }
}
