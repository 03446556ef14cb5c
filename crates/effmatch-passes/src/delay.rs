//! Putting a scrutinee under an application node.
//!
//! `match_with` and `try_with` take a function and its argument rather than
//! a computation, so effects performed by the scrutinee happen inside the
//! installed handler.

use effmatch_syntax::{Builder, Expr, ExprKind};
use tracing::trace;

use crate::purity::is_pure;
use crate::runtime::SENTINEL_TAG;

/// `func arg` evaluates like the original scrutinee.
#[derive(Clone, Debug, PartialEq)]
pub struct Delayed {
    pub func: Expr,
    pub arg: Expr,
}

/// Split `f x` into its parts when both are pure; otherwise wrap the whole
/// expression as ``(fun `Effmatch_unit -> e) `Effmatch_unit``.
///
/// The sentinel is a polymorphic variant so that a user binding of `()`
/// cannot change its meaning.
pub fn delay(expr: Expr) -> Delayed {
    let Expr { loc, kind } = expr;
    match *kind {
        ExprKind::Apply { func, mut args }
            if args.len() == 1 && is_pure(&func) && is_pure(&args[0]) =>
        {
            trace!(?loc, "scrutinee is a pure application, reusing it");
            let arg = args.remove(0);
            Delayed { func, arg }
        }
        kind => {
            trace!(?loc, "delaying scrutinee under a thunk");
            let expr = Expr::new(loc, kind);
            let b = Builder::new(loc.to_ghost());
            Delayed {
                func: b.fun(b.pvariant(SENTINEL_TAG(), None), expr),
                arg: b.variant(SENTINEL_TAG(), None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use effmatch_syntax::parse_expression;

    fn delayed(source: &str) -> Delayed {
        delay(parse_expression(source).unwrap())
    }

    #[test]
    fn test_pure_application_is_reused() {
        let original = parse_expression("f x").unwrap();
        let Delayed { func, arg } = delay(original.clone());
        let ExprKind::Apply { func: f, args } = *original.kind else {
            unreachable!();
        };
        assert_eq!(func, f);
        assert_eq!(arg, args[0]);
    }

    #[test]
    fn test_let_is_thunked() {
        let Delayed { func, arg } = delayed("let y = compute () in y");
        assert_eq!(arg.to_string(), "`Effmatch_unit");
        assert!(func.loc.ghost);
        let ExprKind::Fun { param, body } = &*func.kind else {
            panic!("expected a thunk");
        };
        assert_eq!(param.to_string(), "`Effmatch_unit");
        assert!(matches!(&*body.kind, ExprKind::Let { .. }));
        assert!(!body.loc.ghost);
    }

    #[test]
    fn test_impure_parts_are_thunked() {
        for source in ["f (g x)", "(h ()) x", "f x y", "!r x"] {
            let Delayed { func, .. } = delayed(source);
            assert!(
                matches!(&*func.kind, ExprKind::Fun { .. }),
                "{source} should be thunked"
            );
        }
    }

    #[test]
    fn test_unit_argument_is_pure() {
        let Delayed { func, arg } = delayed("main ()");
        assert_eq!(func.to_string(), "main");
        assert_eq!(arg.to_string(), "()");
    }
}
