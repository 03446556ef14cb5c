//! Syntactic approximation of "evaluating this cannot perform an effect".
//!
//! The check is an allowlist of node shapes. Anything not listed, notably
//! every function application, is assumed to possibly perform an effect.
//! A `false` answer therefore means "unknown", never "effectful".

use effmatch_syntax::{Expr, ExprKind};

pub fn is_pure(expr: &Expr) -> bool {
    match &*expr.kind {
        // Values, and expressions whose evaluation is deferred.
        ExprKind::Ident(_)
        | ExprKind::Constant(_)
        | ExprKind::Function(_)
        | ExprKind::Fun { .. }
        | ExprKind::Construct { arg: None, .. }
        | ExprKind::Variant { arg: None, .. }
        | ExprKind::Lazy(_) => true,

        // Wrappers that evaluate exactly one subexpression.
        ExprKind::Constraint { expr, .. }
        | ExprKind::Coerce { expr, .. }
        | ExprKind::Field { expr, .. }
        | ExprKind::Send { expr, .. }
        | ExprKind::Construct {
            arg: Some(expr), ..
        }
        | ExprKind::Variant {
            arg: Some(expr), ..
        }
        | ExprKind::SetInstVar { value: expr, .. }
        | ExprKind::LetException { body: expr, .. }
        | ExprKind::Assert(expr)
        | ExprKind::Newtype { body: expr, .. }
        | ExprKind::Open { body: expr, .. } => is_pure(expr),

        ExprKind::Let { .. }
        | ExprKind::Apply { .. }
        | ExprKind::Match { .. }
        | ExprKind::Try { .. }
        | ExprKind::Tuple(_)
        | ExprKind::Record { .. }
        | ExprKind::SetField { .. }
        | ExprKind::Array(_)
        | ExprKind::IfThenElse { .. }
        | ExprKind::Sequence { .. }
        | ExprKind::While { .. }
        | ExprKind::For { .. }
        | ExprKind::New(_)
        | ExprKind::Override(_)
        | ExprKind::LetModule { .. }
        | ExprKind::Object(_)
        | ExprKind::Pack(_)
        | ExprKind::Extension(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use effmatch_syntax::parse_expression;

    fn pure(source: &str) -> bool {
        is_pure(&parse_expression(source).unwrap())
    }

    #[test]
    fn test_values_are_pure() {
        assert!(pure("x"));
        assert!(pure("List.length"));
        assert!(pure("42"));
        assert!(pure("\"text\""));
        assert!(pure("fun x -> perform x"));
        assert!(pure("function A -> 1 | B -> 2"));
        assert!(pure("None"));
        assert!(pure("`Tag"));
        assert!(pure("lazy (perform Get)"));
    }

    #[test]
    fn test_transparent_wrappers() {
        assert!(pure("(x : int)"));
        assert!(pure("Some x"));
        assert!(pure("`Tag (Some y)"));
        assert!(pure("r.field"));
        assert!(pure("M.(x)"));
        assert!(pure("assert ok"));
        assert!(!pure("Some (f x)"));
        assert!(!pure("(f x : int)"));
        assert!(!pure("(get ()).field"));
    }

    #[test]
    fn test_applications_are_never_pure() {
        assert!(!pure("f x"));
        assert!(!pure("a + b"));
        assert!(!pure("let y = 1 in y"));
        assert!(!pure("(a, b)"));
        assert!(!pure("{ x = 1 }"));
        assert!(!pure("[1; 2]"));
        assert!(!pure("if c then a else b"));
        assert!(!pure("[%effect x]"));
    }
}
