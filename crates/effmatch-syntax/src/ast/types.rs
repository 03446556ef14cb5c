//! Type expressions.

use effmatch_core::{Location, Symbol};

use super::path::Path;

/// A type expression with its source location.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct CoreType {
    pub loc: Location,
    pub kind: Box<CoreTypeKind>,
}

impl CoreType {
    pub fn new(loc: Location, kind: CoreTypeKind) -> Self {
        Self {
            loc,
            kind: Box::new(kind),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum CoreTypeKind {
    /// `_`
    Any,
    /// `'a`
    Var(Symbol),
    /// `t1 -> t2`
    Arrow(CoreType, CoreType),
    /// `t1 * t2`
    Tuple(Vec<CoreType>),
    /// `int`, `'a list`, `(a, b) Effect.Deep.continuation`
    Constr { path: Path, args: Vec<CoreType> },
}
