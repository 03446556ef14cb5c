//! Structure items, module expressions and extension nodes.

use effmatch_core::{Location, Symbol};

use super::expr::{Expr, RecFlag, ValueBinding};
use super::path::Path;
use super::pattern::Pattern;
use super::types::CoreType;

/// A compilation unit or the body of a `struct ... end`.
pub type Structure = Vec<StructureItem>;

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct StructureItem {
    pub loc: Location,
    pub kind: StructureItemKind,
}

impl StructureItem {
    pub fn new(loc: Location, kind: StructureItemKind) -> Self {
        Self { loc, kind }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum StructureItemKind {
    /// Top-level expression: `;; e`
    Eval(Expr),
    /// `let [rec] p = e and ...`
    Value {
        rec_flag: RecFlag,
        bindings: Vec<ValueBinding>,
    },
    /// `type t = ... and u = ...`
    Type(Vec<TypeDeclaration>),
    /// `type 'a t += C : ...`
    TypeExtension(TypeExtension),
    /// `exception E of t`
    Exception(ExtensionConstructor),
    /// `module M = me`
    Module { name: Symbol, expr: ModuleExpr },
    /// `open M`
    Open(Path),
    /// `[%%name payload]`, also written `keyword%name ...`
    Extension(Extension),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct ModuleExpr {
    pub loc: Location,
    pub kind: ModuleExprKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum ModuleExprKind {
    /// `M.N`
    Ident(Path),
    /// `struct ... end`
    Structure(Structure),
}

/// One declaration of a `type` item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct TypeDeclaration {
    pub loc: Location,
    pub name: Symbol,
    /// Type parameters, each a type variable or `_`.
    pub params: Vec<CoreType>,
    pub manifest: Option<CoreType>,
    pub kind: TypeDeclarationKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum TypeDeclarationKind {
    Abstract,
    Variant(Vec<ConstructorDeclaration>),
    Record(Vec<LabelDeclaration>),
    /// `= ..`
    Open,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct ConstructorDeclaration {
    pub loc: Location,
    pub name: Symbol,
    pub args: Vec<CoreType>,
    pub result: Option<CoreType>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct LabelDeclaration {
    pub loc: Location,
    pub name: Symbol,
    pub mutable: bool,
    pub ty: CoreType,
}

/// `type params path += constructors`
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct TypeExtension {
    pub loc: Location,
    pub path: Path,
    pub params: Vec<CoreType>,
    pub constructors: Vec<ExtensionConstructor>,
}

/// A constructor added to an extensible type, including exceptions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct ExtensionConstructor {
    pub loc: Location,
    pub name: Symbol,
    pub kind: ExtensionConstructorKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum ExtensionConstructorKind {
    /// `C`, `C of t1 * t2`, `C : t1 -> r`
    Decl {
        args: Vec<CoreType>,
        result: Option<CoreType>,
    },
    /// `C = M.C`
    Rebind(Path),
}

/// An extension node `[%name payload]`, left for a rewriter to expand.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub struct Extension {
    pub loc: Location,
    pub name: Symbol,
    pub payload: Payload,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum Payload {
    /// `[%name item1 ;; item2]`
    Structure(Structure),
    /// `[%name? pattern when guard]`
    Pattern { pat: Pattern, guard: Option<Expr> },
}
