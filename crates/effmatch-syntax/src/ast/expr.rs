//! Expression nodes.

use effmatch_core::{Location, Symbol};

use super::path::{Constant, Path};
use super::pattern::Pattern;
use super::structure::{Extension, ExtensionConstructor, ModuleExpr};
use super::types::CoreType;

/// An expression with its source location.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct Expr {
    pub loc: Location,
    pub kind: Box<ExprKind>,
}

impl Expr {
    pub fn new(loc: Location, kind: ExprKind) -> Self {
        Self {
            loc,
            kind: Box::new(kind),
        }
    }
}

/// The different kinds of expressions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum ExprKind {
    /// Value reference: `x`, `List.map`, `( + )`
    Ident(Path),

    /// Literal: `42`, `"text"`, `'c'`, `1.5`
    Constant(Constant),

    /// `let [rec] p1 = e1 and p2 = e2 in body`
    Let {
        rec_flag: RecFlag,
        bindings: Vec<ValueBinding>,
        body: Expr,
    },

    /// `function | p1 -> e1 | p2 -> e2`
    Function(Vec<Case>),

    /// `fun p -> body`, one parameter per node.
    Fun { param: Pattern, body: Expr },

    /// `f a1 a2`
    Apply { func: Expr, args: Vec<Expr> },

    /// `match scrutinee with cases`
    Match { scrutinee: Expr, cases: Vec<Case> },

    /// `try body with cases`
    Try { body: Expr, cases: Vec<Case> },

    /// `(e1, e2, e3)`
    Tuple(Vec<Expr>),

    /// Data constructor, possibly applied: `None`, `Some x`, `()`, `x :: xs`
    Construct { ctor: Path, arg: Option<Expr> },

    /// Polymorphic variant, possibly applied: `` `A ``, `` `B 1 ``
    Variant { tag: Symbol, arg: Option<Expr> },

    /// `{ f1 = e1; f2 = e2 }` or `{ base with f1 = e1 }`
    Record {
        fields: Vec<(Path, Expr)>,
        base: Option<Expr>,
    },

    /// `e.field`
    Field { expr: Expr, field: Path },

    /// `e.field <- value`
    SetField {
        expr: Expr,
        field: Path,
        value: Expr,
    },

    /// `[| e1; e2 |]`
    Array(Vec<Expr>),

    /// `if cond then a [else b]`
    IfThenElse {
        cond: Expr,
        then_branch: Expr,
        else_branch: Option<Expr>,
    },

    /// `first; second`
    Sequence { first: Expr, second: Expr },

    /// `while cond do body done`
    While { cond: Expr, body: Expr },

    /// `for i = start to|downto end do body done`
    For {
        var: Pattern,
        start: Expr,
        end: Expr,
        direction: ForDirection,
        body: Expr,
    },

    /// `(e : t)`
    Constraint { expr: Expr, ty: CoreType },

    /// `(e :> t)` or `(e : t1 :> t2)`
    Coerce {
        expr: Expr,
        from: Option<CoreType>,
        to: CoreType,
    },

    /// Method call: `e#m`
    Send { expr: Expr, method: Symbol },

    /// `new C`
    New(Path),

    /// Instance variable assignment inside a method: `x <- e`
    SetInstVar { name: Symbol, value: Expr },

    /// Functional object update: `{< x = e >}`
    Override(Vec<(Symbol, Expr)>),

    /// `let module M = me in body`
    LetModule {
        name: Symbol,
        module: ModuleExpr,
        body: Expr,
    },

    /// `let exception E in body`
    LetException {
        ctor: ExtensionConstructor,
        body: Expr,
    },

    /// `assert e`
    Assert(Expr),

    /// `lazy e`
    Lazy(Expr),

    /// Immediate object: `object method m = e end`
    Object(Vec<ObjectField>),

    /// Locally abstract type: `fun (type a) -> body`
    Newtype { name: Symbol, body: Expr },

    /// First-class module: `(module M)`
    Pack(ModuleExpr),

    /// Local open: `M.(e)` / `let open M in e`
    Open { module: Path, body: Expr },

    /// Unexpanded extension node: `[%name payload]`
    Extension(Extension),
}

/// Recursion flag of a `let`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecFlag {
    Nonrecursive,
    Recursive,
}

/// Direction of a `for` loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForDirection {
    Upto,
    Downto,
}

/// `pattern = expr` inside a `let`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct ValueBinding {
    pub loc: Location,
    pub pat: Pattern,
    pub expr: Expr,
}

/// One arm of a `match`, `try` or `function`: `lhs [when guard] -> rhs`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct Case {
    pub lhs: Pattern,
    pub guard: Option<Expr>,
    pub rhs: Expr,
}

impl Case {
    pub fn new(lhs: Pattern, guard: Option<Expr>, rhs: Expr) -> Self {
        Self { lhs, guard, rhs }
    }
}

/// A member of an immediate object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum ObjectField {
    /// `method name = body`
    Method { name: Symbol, body: Expr },
    /// `val [mutable] name = init`
    Val {
        name: Symbol,
        mutable: bool,
        init: Expr,
    },
}
