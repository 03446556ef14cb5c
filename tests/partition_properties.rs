//! Property tests for case partitioning and effect-free inputs.

use effmatch::{EffectsTransform, Transform};
use effmatch_passes::{RuntimeApi, partition};
use effmatch_syntax::{Case, ExprKind, parse_expression, parse_structure};
use proptest::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    Plain,
    Exception,
    Effect,
}

fn shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        Just(Shape::Plain),
        Just(Shape::Exception),
        Just(Shape::Effect),
    ]
}

fn render_case(i: usize, shape: Shape) -> String {
    match shape {
        Shape::Plain => format!("| V{i} -> {i}"),
        Shape::Exception => format!("| exception E{i} -> {i}"),
        Shape::Effect => format!("| [%effect? Op{i}, k] -> continue k {i}"),
    }
}

fn render_match(shapes: &[Shape]) -> String {
    let cases: Vec<_> = shapes
        .iter()
        .enumerate()
        .map(|(i, &s)| render_case(i, s))
        .collect();
    format!("match f x with {}", cases.join(" "))
}

fn cases_of(source: &str) -> Vec<Case> {
    let expr = parse_expression(source).unwrap();
    match *expr.kind {
        ExprKind::Match { cases, .. } => cases,
        other => panic!("expected a match, got {other:?}"),
    }
}

/// Index encoded in a bucketed pattern such as `V3`, `E3` or `Op3`.
fn index_of(case: &Case) -> usize {
    let name = case.lhs.to_string();
    name.trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .unwrap()
}

fn indices_where(shapes: &[Shape], wanted: Shape) -> Vec<usize> {
    shapes
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s == wanted)
        .map(|(i, _)| i)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every case lands in exactly one bucket.
    #[test]
    fn partition_is_total(shapes in prop::collection::vec(shape(), 1..12)) {
        let cases = cases_of(&render_match(&shapes));
        let parts = partition(cases, &RuntimeApi::default());
        prop_assert_eq!(parts.len(), shapes.len());

        let mut seen: Vec<usize> = parts
            .ret
            .iter()
            .chain(&parts.exn)
            .chain(&parts.eff)
            .map(index_of)
            .collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..shapes.len()).collect::<Vec<_>>());
    }

    /// Each bucket keeps the source order of its cases.
    #[test]
    fn partition_preserves_order(shapes in prop::collection::vec(shape(), 1..12)) {
        let cases = cases_of(&render_match(&shapes));
        let parts = partition(cases, &RuntimeApi::default());
        let order = |bucket: &[Case]| bucket.iter().map(index_of).collect::<Vec<_>>();

        prop_assert_eq!(order(&parts.ret), indices_where(&shapes, Shape::Plain));
        prop_assert_eq!(order(&parts.exn), indices_where(&shapes, Shape::Exception));
        prop_assert_eq!(order(&parts.eff), indices_where(&shapes, Shape::Effect));
    }

    /// Programs without effect cases come out unchanged.
    #[test]
    fn effect_free_match_is_untouched(
        shapes in prop::collection::vec(
            prop_oneof![Just(Shape::Plain), Just(Shape::Exception)],
            1..8,
        )
    ) {
        let source = format!("let r = {}", render_match(&shapes));
        let items = parse_structure(&source).unwrap();
        let out = EffectsTransform::default().apply(items.clone()).unwrap();
        prop_assert_eq!(out, items);
    }

    /// A lowered match is a single install call whatever the case mix.
    #[test]
    fn lowered_match_calls_match_with(
        shapes in prop::collection::vec(shape(), 0..8),
    ) {
        let mut shapes = shapes;
        shapes.push(Shape::Effect);
        let source = format!("let r = {}", render_match(&shapes));
        let items = parse_structure(&source).unwrap();
        let out = EffectsTransform::default().apply(items).unwrap();
        let printed = effmatch_syntax::print_structure(&out);
        prop_assert!(printed.starts_with("let r = Effect.Deep.match_with f x"), "{}", printed);
        prop_assert!(!printed.contains("%effect"), "{}", printed);
    }
}
