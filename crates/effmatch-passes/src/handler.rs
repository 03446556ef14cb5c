//! Emitting the handler record and the call that installs it.
//!
//! ```text
//! match e with                    Effect.Deep.match_with f x
//! | p -> a                          { retc = (function p -> a);
//! | exception E -> b      ==>         exnc = (function E -> b | ex -> Stdlib.raise ex);
//! | [%effect? Op, k] -> c             effc = (fun (type r) (eff : r Effect.t) ->
//!                                        match eff with Op -> Some (fun k -> c) | _ -> None) }
//! ```
//!
//! A `try` only gets an `effc`. Its remaining cases stay in a native
//! `try ... with` wrapped around the `try_with` call.

use effmatch_core::{Location, Symbol};
use effmatch_syntax::{Builder, Case, Expr, Path};

use crate::classify::{CaseKind, classify};
use crate::delay::{Delayed, delay};
use crate::error::{ExpandError, ExpandResult};
use crate::partition::{partition, unwrap_exception};
use crate::runtime::{EFFECT_BINDER, EXN_BINDER, RESULT_TYPE, RuntimeApi, VALUE_BINDER};

/// Lower `match scrutinee with cases`. The cases must contain at least one
/// effect case and already be expanded.
pub fn emit_match(
    loc: Location,
    scrutinee: Expr,
    cases: Vec<Case>,
    runtime: &RuntimeApi,
) -> ExpandResult<Expr> {
    let parts = partition(cases, runtime);
    reject_guards(&parts.exn)?;
    reject_guards(&parts.eff)?;

    let b = Builder::new(loc.to_ghost());
    let handler = b.record(vec![
        (runtime.handler_field("retc"), retc(&b, parts.ret)),
        (runtime.handler_field("exnc"), exnc(&b, parts.exn)),
        (runtime.handler_field("effc"), effc(&b, parts.eff, runtime)),
    ]);
    Ok(install(&b, runtime.match_with(), scrutinee, handler))
}

/// Lower `try body with cases`. Effect cases go to `effc`; the others,
/// with any `exception` wrapper removed, keep their source order in a
/// native `try`.
pub fn emit_try(
    loc: Location,
    body: Expr,
    cases: Vec<Case>,
    runtime: &RuntimeApi,
) -> ExpandResult<Expr> {
    let (effect_cases, native_cases): (Vec<_>, Vec<_>) = cases
        .into_iter()
        .partition(|case| classify(case) == CaseKind::Effect);
    let eff = partition(effect_cases, runtime).eff;
    reject_guards(&eff)?;

    let b = Builder::new(loc.to_ghost());
    let handler = b.record(vec![(runtime.handler_field("effc"), effc(&b, eff, runtime))]);
    let call = install(&b, runtime.try_with(), body, handler);
    if native_cases.is_empty() {
        return Ok(call);
    }
    let native_cases = native_cases.into_iter().map(unwrap_exception).collect();
    Ok(b.try_(call, native_cases))
}

fn reject_guards(cases: &[Case]) -> ExpandResult<()> {
    match cases.iter().find_map(|case| case.guard.as_ref()) {
        Some(guard) => Err(ExpandError::unsupported_guard(guard.loc)),
        None => Ok(()),
    }
}

/// `install (delayed scrutinee) handler`
fn install(b: &Builder, primitive: Path, scrutinee: Expr, handler: Expr) -> Expr {
    let Delayed { func, arg } = delay(scrutinee);
    b.apply(b.ident(primitive), vec![func, arg, handler])
}

/// `function <ret cases>`, or the identity when there are none.
fn retc(b: &Builder, cases: Vec<Case>) -> Expr {
    if cases.is_empty() {
        return b.fun(b.pvar(VALUE_BINDER()), b.evar(VALUE_BINDER()));
    }
    b.function(cases)
}

/// `function <exn cases> | e -> Stdlib.raise e`
fn exnc(b: &Builder, mut cases: Vec<Case>) -> Expr {
    let reraise = b.apply(
        b.ident(Path::ident(Symbol::new("Stdlib")).child(Symbol::new("raise"))),
        vec![b.evar(EXN_BINDER())],
    );
    cases.push(b.case(b.pvar(EXN_BINDER()), reraise));
    b.function(cases)
}

/// `fun (type r) (eff : r Effect.t) -> match eff with <eff cases> | _ -> None`
fn effc(b: &Builder, mut cases: Vec<Case>, runtime: &RuntimeApi) -> Expr {
    cases.push(b.case(b.pany(), b.none()));
    let dispatch = b.match_(b.evar(EFFECT_BINDER()), cases);
    let operation_ty = b.tconstr(runtime.operation_type(), vec![b.tlocal(RESULT_TYPE())]);
    let param = b.pconstraint(b.pvar(EFFECT_BINDER()), operation_ty);
    b.newtype(RESULT_TYPE(), b.fun(param, dispatch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExpandErrorKind;
    use effmatch_syntax::{ExprKind, parse_expression};

    fn lower(source: &str) -> ExpandResult<Expr> {
        let expr = parse_expression(source).unwrap();
        let loc = expr.loc;
        match *expr.kind {
            ExprKind::Match { scrutinee, cases } => {
                emit_match(loc, scrutinee, cases, &RuntimeApi::default())
            }
            ExprKind::Try { body, cases } => emit_try(loc, body, cases, &RuntimeApi::default()),
            other => panic!("expected match or try, got {other:?}"),
        }
    }

    #[test]
    fn test_match_installs_three_callbacks() {
        let out = lower(
            "match f x with \
             | v -> v \
             | exception Not_found -> 0 \
             | [%effect? Get, k] -> continue k 1",
        )
        .unwrap()
        .to_string();
        assert!(out.starts_with("Effect.Deep.match_with f x"), "{out}");
        assert!(out.contains("Effect.Deep.retc = (function"), "{out}");
        assert!(out.contains("| __effmatch_exn ->\n"), "{out}");
        assert!(out.contains("Stdlib.raise __effmatch_exn"), "{out}");
        assert!(
            out.contains("fun (type effmatch_result) (__effmatch_effect : effmatch_result Effect.t) ->"),
            "{out}"
        );
        assert!(out.contains("| _ ->\n"), "{out}");
        assert!(out.contains("None"), "{out}");
    }

    #[test]
    fn test_match_without_plain_cases_uses_identity() {
        let out = lower("match run () with [%effect? Tick, k] -> ()").unwrap();
        let ExprKind::Apply { args, .. } = &*out.kind else {
            panic!("expected a call");
        };
        let ExprKind::Record { fields, .. } = &*args[2].kind else {
            panic!("expected a handler record");
        };
        assert_eq!(fields.len(), 3);
        assert_eq!(
            fields[0].1.to_string(),
            "fun __effmatch_value ->\n  __effmatch_value"
        );
    }

    #[test]
    fn test_try_keeps_native_cases_in_order() {
        let out = lower(
            "try compute () with \
             | Not_found -> 0 \
             | [%effect? Ask, k] -> continue k 42 \
             | exception Exit -> 1",
        )
        .unwrap();
        let ExprKind::Try { body, cases } = &*out.kind else {
            panic!("expected a native try, got {out}");
        };
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].lhs.to_string(), "Not_found");
        assert_eq!(cases[1].lhs.to_string(), "Exit");
        let call = body.to_string();
        assert!(call.starts_with("Effect.Deep.try_with compute ()"), "{call}");
        assert!(!call.contains("retc"), "{call}");
        assert!(!call.contains("exnc"), "{call}");
    }

    #[test]
    fn test_try_with_only_effect_cases_is_a_bare_call() {
        let out = lower("try let x = 1 in go x with [%effect? Ask, k] -> continue k 1").unwrap();
        let ExprKind::Apply { func, args } = &*out.kind else {
            panic!("expected a call, got {out}");
        };
        assert_eq!(func.to_string(), "Effect.Deep.try_with");
        assert_eq!(args[1].to_string(), "`Effmatch_unit");
    }

    #[test]
    fn test_guarded_effect_case_is_rejected() {
        let err = lower("match e () with [%effect? Get, k] when ready -> 1 | x -> x").unwrap_err();
        assert_eq!(err.kind(), &ExpandErrorKind::UnsupportedGuard);
        let err = lower("match e () with [%effect? Get, k when ready] -> 1").unwrap_err();
        assert_eq!(err.kind(), &ExpandErrorKind::UnsupportedGuard);
    }

    #[test]
    fn test_guarded_exception_case_in_match_is_rejected() {
        let err = lower("match e () with exception Failure m when m = \"\" -> 1 | [%effect? Get, k] -> 2")
            .unwrap_err();
        assert_eq!(err.kind(), &ExpandErrorKind::UnsupportedGuard);
    }

    #[test]
    fn test_guarded_native_try_case_is_kept() {
        let out = lower("try e () with Failure m when m = \"\" -> 1 | [%effect? Get, k] -> 2").unwrap();
        let ExprKind::Try { cases, .. } = &*out.kind else {
            panic!("expected a native try");
        };
        assert!(cases[0].guard.is_some());
    }
}
