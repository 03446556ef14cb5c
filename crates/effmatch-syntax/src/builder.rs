//! Helpers for synthesizing syntax nodes.
//!
//! A [`Builder`] stamps every node it creates with one location. Rewrites
//! create a builder from the ghost location of the node they are replacing,
//! so everything they synthesize points back at the user's source.

use effmatch_core::{Location, Span, Symbol};

use crate::ast::*;

/// Node factory bound to a single location.
#[derive(Clone, Copy, Debug)]
pub struct Builder {
    pub loc: Location,
}

impl Builder {
    pub fn new(loc: Location) -> Self {
        Self { loc }
    }

    /// A builder producing ghost nodes for source at `span`.
    pub fn ghost(span: Span) -> Self {
        Self {
            loc: Location::ghost(span),
        }
    }

    // === Expressions ===

    pub fn expr(&self, kind: ExprKind) -> Expr {
        Expr::new(self.loc, kind)
    }

    pub fn ident(&self, path: Path) -> Expr {
        self.expr(ExprKind::Ident(path))
    }

    /// Reference to an unqualified value name.
    pub fn evar(&self, name: Symbol) -> Expr {
        self.ident(Path::ident(name))
    }

    pub fn apply(&self, func: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Apply { func, args })
    }

    pub fn fun(&self, param: Pattern, body: Expr) -> Expr {
        self.expr(ExprKind::Fun { param, body })
    }

    pub fn function(&self, cases: Vec<Case>) -> Expr {
        self.expr(ExprKind::Function(cases))
    }

    pub fn match_(&self, scrutinee: Expr, cases: Vec<Case>) -> Expr {
        self.expr(ExprKind::Match { scrutinee, cases })
    }

    pub fn try_(&self, body: Expr, cases: Vec<Case>) -> Expr {
        self.expr(ExprKind::Try { body, cases })
    }

    pub fn construct(&self, ctor: Path, arg: Option<Expr>) -> Expr {
        self.expr(ExprKind::Construct { ctor, arg })
    }

    pub fn variant(&self, tag: Symbol, arg: Option<Expr>) -> Expr {
        self.expr(ExprKind::Variant { tag, arg })
    }

    pub fn record(&self, fields: Vec<(Path, Expr)>) -> Expr {
        self.expr(ExprKind::Record { fields, base: None })
    }

    pub fn newtype(&self, name: Symbol, body: Expr) -> Expr {
        self.expr(ExprKind::Newtype { name, body })
    }

    pub fn some(&self, value: Expr) -> Expr {
        self.construct(Path::ident(Symbol::new("Some")), Some(value))
    }

    pub fn none(&self) -> Expr {
        self.construct(Path::ident(Symbol::new("None")), None)
    }

    pub fn unit(&self) -> Expr {
        self.construct(Path::ident(Symbol::new("()")), None)
    }

    // === Patterns ===

    pub fn pat(&self, kind: PatternKind) -> Pattern {
        Pattern::new(self.loc, kind)
    }

    pub fn pvar(&self, name: Symbol) -> Pattern {
        self.pat(PatternKind::Var(name))
    }

    pub fn pany(&self) -> Pattern {
        self.pat(PatternKind::Any)
    }

    pub fn pvariant(&self, tag: Symbol, arg: Option<Pattern>) -> Pattern {
        self.pat(PatternKind::Variant { tag, arg })
    }

    pub fn pconstraint(&self, pat: Pattern, ty: CoreType) -> Pattern {
        self.pat(PatternKind::Constraint { pat, ty })
    }

    // === Cases ===

    pub fn case(&self, lhs: Pattern, rhs: Expr) -> Case {
        Case::new(lhs, None, rhs)
    }

    // === Types ===

    pub fn ty(&self, kind: CoreTypeKind) -> CoreType {
        CoreType::new(self.loc, kind)
    }

    pub fn tconstr(&self, path: Path, args: Vec<CoreType>) -> CoreType {
        self.ty(CoreTypeKind::Constr { path, args })
    }

    /// Reference to a locally abstract type, which is spelled like a
    /// nullary type constructor.
    pub fn tlocal(&self, name: Symbol) -> CoreType {
        self.tconstr(Path::ident(name), Vec::new())
    }

    pub fn tany(&self) -> CoreType {
        self.ty(CoreTypeKind::Any)
    }

    pub fn tarrow(&self, param: CoreType, result: CoreType) -> CoreType {
        self.ty(CoreTypeKind::Arrow(param, result))
    }

    pub fn ttuple(&self, elements: Vec<CoreType>) -> CoreType {
        self.ty(CoreTypeKind::Tuple(elements))
    }

    // === Structure items ===

    pub fn item(&self, kind: StructureItemKind) -> StructureItem {
        StructureItem::new(self.loc, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_stamps_ghost_location() {
        let b = Builder::ghost(Span::new(10, 20));
        let e = b.apply(b.evar(Symbol::new("f")), vec![b.unit()]);
        assert!(e.loc.ghost);
        assert_eq!(e.loc.span, Span::new(10, 20));
        let ExprKind::Apply { func, args } = &*e.kind else {
            panic!("expected application");
        };
        assert_eq!(func.loc, e.loc);
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_some_none() {
        let b = Builder::new(Location::default());
        assert!(matches!(
            &*b.none().kind,
            ExprKind::Construct { ctor, arg: None } if ctor.is_ident("None")
        ));
        assert!(matches!(
            &*b.some(b.unit()).kind,
            ExprKind::Construct { ctor, arg: Some(_) } if ctor.is_ident("Some")
        ));
    }
}
