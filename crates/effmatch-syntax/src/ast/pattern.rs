//! Pattern nodes.
//!
//! Patterns appear on the left of `match`/`try`/`function` cases, in `let`
//! bindings and as `fun` parameters. Two kinds matter to the effect
//! rewrite: `exception P` (only meaningful at the top of a match case) and
//! the extension node `[%effect? P, k]`.

use effmatch_core::{Location, Symbol};

use super::path::{Constant, Path};
use super::structure::Extension;
use super::types::CoreType;

/// A pattern with its source location.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct Pattern {
    pub loc: Location,
    pub kind: Box<PatternKind>,
}

impl Pattern {
    pub fn new(loc: Location, kind: PatternKind) -> Self {
        Self {
            loc,
            kind: Box::new(kind),
        }
    }
}

/// The different kinds of patterns.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum PatternKind {
    /// `_`
    Any,

    /// `x`
    Var(Symbol),

    /// `p as x`
    Alias { pat: Pattern, name: Symbol },

    /// `42`, `"s"`, `'c'`
    Constant(Constant),

    /// `(p1, p2)`
    Tuple(Vec<Pattern>),

    /// `None`, `Some p`, `p :: ps`
    Construct { ctor: Path, arg: Option<Pattern> },

    /// `` `A ``, `` `B p ``
    Variant { tag: Symbol, arg: Option<Pattern> },

    /// `{ f1 = p1; f2 }` or `{ f1 = p1; _ }`
    Record {
        fields: Vec<(Path, Pattern)>,
        closed: bool,
    },

    /// `[| p1; p2 |]`
    Array(Vec<Pattern>),

    /// `p1 | p2`
    Or(Pattern, Pattern),

    /// `(p : t)`
    Constraint { pat: Pattern, ty: CoreType },

    /// `lazy p`
    Lazy(Pattern),

    /// `exception p`, only valid at the top of a match case
    Exception(Pattern),

    /// Unexpanded extension node: `[%name? p]`
    Extension(Extension),
}
