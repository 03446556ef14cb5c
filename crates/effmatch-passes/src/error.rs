//! Errors raised while expanding effect syntax.

use derive_more::Display;
use effmatch_core::{Location, Symbol};

pub type ExpandResult<T> = Result<T, ExpandError>;

/// A fatal expansion error. Expansion of the compilation unit stops at the
/// first one.
#[derive(Clone, Display, Debug, PartialEq)]
#[display("{kind}")]
pub struct ExpandError {
    pub location: Location,
    kind: Box<ExpandErrorKind>,
}

impl ExpandError {
    pub fn new(kind: ExpandErrorKind, location: Location) -> Self {
        Self {
            location,
            kind: Box::new(kind),
        }
    }

    pub fn kind(&self) -> &ExpandErrorKind {
        &self.kind
    }

    pub fn misplaced_marker(location: Location) -> Self {
        Self::new(ExpandErrorKind::MisplacedMarker, location)
    }

    pub fn unsupported_rebind(name: Symbol, location: Location) -> Self {
        Self::new(ExpandErrorKind::UnsupportedRebind { name }, location)
    }

    pub fn unsupported_guard(location: Location) -> Self {
        Self::new(ExpandErrorKind::UnsupportedGuard, location)
    }
}

#[derive(Clone, Display, Debug, PartialEq)]
pub enum ExpandErrorKind {
    #[display(
        "`[%effect]` is only allowed at the top of a match case pattern, \
         at the top of a try case pattern, or on an exception declaration"
    )]
    MisplacedMarker,

    #[display("effect `{name}` cannot be declared as a rebind of an existing effect")]
    UnsupportedRebind { name: Symbol },

    #[display("guards are not supported on effect cases or on exception cases of a match")]
    UnsupportedGuard,
}

impl std::error::Error for ExpandError {}

#[cfg(test)]
mod tests {
    use super::*;
    use effmatch_core::Span;

    #[test]
    fn test_misplaced_marker_lists_positions() {
        let err = ExpandError::misplaced_marker(Location::new(Span::new(0, 9)));
        let message = err.to_string();
        assert!(message.contains("match case pattern"));
        assert!(message.contains("try case pattern"));
        assert!(message.contains("exception declaration"));
    }

    #[test]
    fn test_rebind_names_constructor() {
        let err = ExpandError::unsupported_rebind(Symbol::new("Foo"), Location::default());
        assert_eq!(
            err.to_string(),
            "effect `Foo` cannot be declared as a rebind of an existing effect"
        );
        assert!(matches!(err.kind(), ExpandErrorKind::UnsupportedRebind { name } if *name == "Foo"));
    }
}
