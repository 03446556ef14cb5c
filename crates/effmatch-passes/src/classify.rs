//! Case classification.
//!
//! A case is sorted by the shape of its top-level pattern alone:
//!
//! ```text
//! | [%effect? Op x, k] -> ...     effect case
//! | exception Not_found -> ...    exception case
//! | Some x -> ...                 plain (return) case
//! ```

use effmatch_core::Symbol;
use effmatch_syntax::{Case, Expr, Pattern, PatternKind, Payload};

use crate::runtime::EFFECT_MARKER;

/// Which handler callback a case belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaseKind {
    Effect,
    Exception,
    Plain,
}

/// The parts of an `[%effect? operation, continuation]` pattern.
#[derive(Clone, Copy, Debug)]
pub struct EffectPattern<'a> {
    pub operation: &'a Pattern,
    pub continuation: &'a Pattern,
    /// A guard written inside the payload: `[%effect? Op, k when g]`.
    pub guard: Option<&'a Expr>,
}

pub fn is_effect_marker(name: Symbol) -> bool {
    name == EFFECT_MARKER()
}

/// Match the two-element effect pattern shape.
pub fn effect_pattern(pat: &Pattern) -> Option<EffectPattern<'_>> {
    let PatternKind::Extension(ext) = &*pat.kind else {
        return None;
    };
    if !is_effect_marker(ext.name) {
        return None;
    }
    let Payload::Pattern { pat, guard } = &ext.payload else {
        return None;
    };
    match &*pat.kind {
        PatternKind::Tuple(parts) if parts.len() == 2 => Some(EffectPattern {
            operation: &parts[0],
            continuation: &parts[1],
            guard: guard.as_ref(),
        }),
        _ => None,
    }
}

/// Owned parts of an effect pattern.
pub(crate) struct EffectParts {
    pub operation: Pattern,
    pub continuation: Pattern,
    pub guard: Option<Expr>,
}

/// Take an effect pattern apart, or `None` if `pat` does not have the
/// shape [`effect_pattern`] accepts.
pub(crate) fn into_effect_parts(pat: Pattern) -> Option<EffectParts> {
    let PatternKind::Extension(ext) = *pat.kind else {
        return None;
    };
    if !is_effect_marker(ext.name) {
        return None;
    }
    let Payload::Pattern { pat, guard } = ext.payload else {
        return None;
    };
    let PatternKind::Tuple(parts) = *pat.kind else {
        return None;
    };
    let [operation, continuation] = <[Pattern; 2]>::try_from(parts).ok()?;
    Some(EffectParts {
        operation,
        continuation,
        guard,
    })
}

pub fn classify(case: &Case) -> CaseKind {
    if effect_pattern(&case.lhs).is_some() {
        CaseKind::Effect
    } else if matches!(&*case.lhs.kind, PatternKind::Exception(_)) {
        CaseKind::Exception
    } else {
        CaseKind::Plain
    }
}

/// Whether a `match`/`try` needs rewriting at all.
pub fn contains_effect_case(cases: &[Case]) -> bool {
    cases.iter().any(|case| classify(case) == CaseKind::Effect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use effmatch_syntax::parse_expression;
    use effmatch_syntax::ExprKind;

    fn cases_of(source: &str) -> Vec<Case> {
        let expr = parse_expression(source).unwrap();
        match *expr.kind {
            ExprKind::Match { cases, .. } | ExprKind::Try { cases, .. } => cases,
            other => panic!("expected match or try, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_each_kind() {
        let cases = cases_of(
            "match f () with \
             | Some x -> x \
             | exception Not_found -> 0 \
             | [%effect? Get, k] -> continue k 1",
        );
        let kinds: Vec<_> = cases.iter().map(classify).collect();
        assert_eq!(
            kinds,
            vec![CaseKind::Plain, CaseKind::Exception, CaseKind::Effect]
        );
        assert!(contains_effect_case(&cases));
    }

    #[test]
    fn test_effect_pattern_parts() {
        let cases = cases_of("match e with [%effect? Put v, _ when v > 0] -> ()");
        let parts = effect_pattern(&cases[0].lhs).unwrap();
        assert!(matches!(&*parts.operation.kind, PatternKind::Construct { ctor, .. } if ctor.is_ident("Put")));
        assert!(matches!(&*parts.continuation.kind, PatternKind::Any));
        assert!(parts.guard.is_some());
    }

    #[test]
    fn test_malformed_marker_is_plain() {
        let cases = cases_of("match e with [%effect? Get] -> 1 | [%other? A, k] -> 2");
        assert_eq!(classify(&cases[0]), CaseKind::Plain);
        assert_eq!(classify(&cases[1]), CaseKind::Plain);
        assert!(!contains_effect_case(&cases));
    }

    #[test]
    fn test_nested_marker_is_not_top_level() {
        let cases = cases_of("match e with ([%effect? Get, k] as x) -> x");
        assert_eq!(classify(&cases[0]), CaseKind::Plain);
    }
}
