//! Splitting a case list into the three handler callbacks.

use effmatch_syntax::{Builder, Case, Pattern, PatternKind};

use crate::classify::{CaseKind, classify, into_effect_parts};
use crate::runtime::{RESULT_TYPE, RuntimeApi};

/// Cases sorted by callback, each bucket in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partition {
    /// Plain cases, unchanged.
    pub ret: Vec<Case>,
    /// Exception cases with the `exception` wrapper removed.
    pub exn: Vec<Case>,
    /// Effect cases matching on the operation alone, with bodies of the
    /// form `Some (fun (k : ...) -> body)`.
    pub eff: Vec<Case>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.ret.len() + self.exn.len() + self.eff.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn partition(cases: Vec<Case>, runtime: &RuntimeApi) -> Partition {
    let mut buckets = Partition::default();
    for case in cases {
        match classify(&case) {
            CaseKind::Plain => buckets.ret.push(case),
            CaseKind::Exception => buckets.exn.push(unwrap_exception(case)),
            CaseKind::Effect => buckets.eff.push(reshape_effect(case, runtime)),
        }
    }
    buckets
}

/// `exception P -> e` becomes `P -> e`. Other cases pass through.
pub(crate) fn unwrap_exception(case: Case) -> Case {
    let Case { lhs, guard, rhs } = case;
    match *lhs.kind {
        PatternKind::Exception(inner) => Case::new(inner, guard, rhs),
        kind => Case::new(Pattern::new(lhs.loc, kind), guard, rhs),
    }
}

/// `[%effect? Op, k] -> e` becomes
/// `Op -> Some (fun (k : (effmatch_result, _) Effect.Deep.continuation) -> e)`.
///
/// A guard written inside the payload is moved onto the case.
fn reshape_effect(case: Case, runtime: &RuntimeApi) -> Case {
    let Case { lhs, guard, rhs } = case;
    let b = Builder::new(lhs.loc.to_ghost());
    let Some(parts) = into_effect_parts(lhs) else {
        unreachable!("case was classified as an effect case");
    };

    let continuation_ty = b.tconstr(
        runtime.continuation(),
        vec![b.tlocal(RESULT_TYPE()), b.tany()],
    );
    let resume = b.fun(b.pconstraint(parts.continuation, continuation_ty), rhs);
    Case::new(parts.operation, guard.or(parts.guard), b.some(resume))
}

#[cfg(test)]
mod tests {
    use super::*;
    use effmatch_syntax::{ExprKind, parse_expression};

    fn cases_of(source: &str) -> Vec<Case> {
        let expr = parse_expression(source).unwrap();
        match *expr.kind {
            ExprKind::Match { cases, .. } => cases,
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_partition_keeps_order_within_buckets() {
        let cases = cases_of(
            "match e with \
             | [%effect? A, k] -> 1 \
             | x -> 2 \
             | exception E -> 3 \
             | [%effect? B, k] -> 4 \
             | y -> 5",
        );
        let parts = partition(cases, &RuntimeApi::default());
        assert_eq!(parts.len(), 5);
        assert_eq!(parts.ret.len(), 2);
        assert_eq!(parts.exn.len(), 1);
        assert_eq!(parts.eff.len(), 2);
        assert_eq!(parts.ret[0].lhs.to_string(), "x");
        assert_eq!(parts.ret[1].lhs.to_string(), "y");
        assert_eq!(parts.eff[0].lhs.to_string(), "A");
        assert_eq!(parts.eff[1].lhs.to_string(), "B");
    }

    #[test]
    fn test_exception_is_unwrapped() {
        let cases = cases_of("match e with exception (Failure msg) -> msg");
        let parts = partition(cases, &RuntimeApi::default());
        assert_eq!(parts.exn[0].lhs.to_string(), "Failure msg");
        assert_eq!(parts.exn[0].rhs.to_string(), "msg");
    }

    #[test]
    fn test_effect_body_binds_continuation() {
        let cases = cases_of("match e with [%effect? Get, k] -> continue k 0");
        let parts = partition(cases, &RuntimeApi::default());
        let case = &parts.eff[0];
        assert_eq!(case.lhs.to_string(), "Get");
        assert!(!case.lhs.loc.ghost);
        assert!(case.rhs.loc.ghost);
        assert_eq!(
            case.rhs.to_string(),
            "Some (fun (k : (effmatch_result, _) Effect.Deep.continuation) ->\n  continue k 0)"
        );
    }

    #[test]
    fn test_payload_guard_moves_to_case() {
        let cases = cases_of("match e with [%effect? Put v, k when v > 0] -> ()");
        let parts = partition(cases, &RuntimeApi::default());
        assert_eq!(parts.eff[0].guard.as_ref().map(ToString::to_string), Some("v > 0".to_string()));
    }
}
