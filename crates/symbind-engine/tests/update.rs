//! Update, set and replace: propagation policy and all-or-nothing
//! behaviour.

use std::sync::Arc;

use symbind_core::ResolutionError;
use symbind_engine::{Resolver, ResolverConfig};
use symbind_test_utils::{fixtures, init_tracing, CountingSolver};

#[test]
fn changing_a_root_keeps_the_other_roots() {
    init_tracing();
    let resolver = Resolver::new(fixtures::rectangle());
    let mut rect = resolver
        .construct([("width", 3.0), ("height", 4.0)])
        .unwrap();
    assert_eq!(rect.real("area"), Some(12.0));
    assert_eq!(rect.real("perimeter"), Some(14.0));

    rect.set("width", 10.0).unwrap();
    assert_eq!(rect.real("height"), Some(4.0));
    assert_eq!(rect.real("area"), Some(40.0));
    assert_eq!(rect.real("perimeter"), Some(28.0));
}

#[test]
fn backward_update_releasing_two_roots_is_insufficient() {
    init_tracing();
    let resolver = Resolver::new(fixtures::rectangle());
    let mut rect = resolver
        .construct([("width", 3.0), ("height", 4.0)])
        .unwrap();
    let before = rect.clone();

    match rect.set("area", 30.0) {
        Err(ResolutionError::InsufficientInputs { missing, .. }) => {
            assert!(missing.contains(&"width".to_string()));
            assert!(missing.contains(&"height".to_string()));
        }
        other => panic!("expected InsufficientInputs, got {other:?}"),
    }
    assert_eq!(rect, before);
}

#[test]
fn backward_update_with_a_second_change_succeeds() {
    let resolver = Resolver::new(fixtures::rectangle());
    let mut rect = resolver
        .construct([("width", 3.0), ("height", 4.0)])
        .unwrap();
    rect.update([("area", 30.0), ("width", 5.0)]).unwrap();
    assert_eq!(rect.real("height"), Some(6.0));
    assert_eq!(rect.real("perimeter"), Some(22.0));
}

#[test]
fn derived_change_re_derives_its_root() {
    init_tracing();
    let resolver = Resolver::new(fixtures::temperature());
    let mut t = resolver.construct([("celsius", 100.0)]).unwrap();
    assert_eq!(t.real("fahrenheit"), Some(212.0));

    t.set("fahrenheit", 32.0).unwrap();
    assert_eq!(t.real("celsius"), Some(0.0));
    let kelvin = t.real("kelvin").unwrap();
    assert!((kelvin - 273.15).abs() < 1e-9, "kelvin = {kelvin}");
}

#[test]
fn forward_target_follows_its_parameters() {
    let resolver = Resolver::new(fixtures::person());
    let mut p = resolver
        .construct([("first", "John"), ("last", "Doe")])
        .unwrap();
    p.set("first", "Jane").unwrap();
    assert_eq!(p.text("last"), Some("Doe"));
    assert_eq!(p.text("full"), Some("Jane Doe"));
}

#[test]
fn failed_update_leaves_instance_untouched() {
    init_tracing();
    let resolver = Resolver::new(fixtures::sum());
    let mut s = resolver.construct([("a", 1.0), ("b", 2.0)]).unwrap();
    let before = s.clone();

    let err = s
        .update([("a", 1.0), ("b", 2.0), ("c", 4.0)])
        .unwrap_err();
    assert!(
        matches!(err, ResolutionError::InconsistentInputs { .. }),
        "got {err:?}"
    );
    assert_eq!(s, before);

    let err = s.set("nope", 1.0).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::UnknownField {
            name: "nope".into()
        }
    );
    assert_eq!(s, before);
}

#[test]
fn update_to_current_values_is_a_no_op() {
    init_tracing();
    let solver = CountingSolver::new();
    let resolver = Resolver::with_solver(
        fixtures::sum(),
        ResolverConfig::default(),
        Arc::new(solver.clone()),
    )
    .unwrap();
    let mut s = resolver.construct([("a", 1.0), ("b", 2.0)]).unwrap();
    assert_eq!(solver.calls(), 1);
    let before = s.clone();

    s.update([("c", 3.0), ("a", 1.0)]).unwrap();
    assert_eq!(s, before);
    assert_eq!(solver.calls(), 1);

    s.set("a", 2.0).unwrap();
    assert_eq!(solver.calls(), 2);
    assert_eq!(s.real("c"), Some(4.0));
}

#[test]
fn replace_returns_a_new_instance() {
    let resolver = Resolver::new(fixtures::sum());
    let original = resolver.construct([("a", 1.0), ("b", 2.0)]).unwrap();

    let copy = original.replace([("a", 5.0)]).unwrap();
    assert_eq!(copy.real("c"), Some(7.0));
    assert_eq!(original.real("c"), Some(3.0));

    let same = resolver
        .replace(&original, Vec::<(&str, f64)>::new())
        .unwrap();
    assert_eq!(same, original);
}

#[test]
fn failed_replace_keeps_original() {
    let resolver = Resolver::new(fixtures::square(Some("a > 0")));
    let original = resolver.construct([("a", 3.0)]).unwrap();
    assert_eq!(original.real("b"), Some(9.0));

    let err = original.replace([("b", -1.0)]).unwrap_err();
    assert!(
        matches!(err, ResolutionError::InconsistentInputs { .. }),
        "got {err:?}"
    );
    assert_eq!(original.real("a"), Some(3.0));
}

#[test]
fn resolver_for_another_entity_cannot_update() {
    let sums = Resolver::new(fixtures::sum());
    let ladders = Resolver::new(fixtures::ladder());
    let mut sum = sums.construct([("a", 1.0), ("b", 2.0)]).unwrap();
    let before = sum.clone();

    let err = ladders.update(&mut sum, [("a", 5.0)]).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::SchemaMismatch {
            expected: "Ladder".into(),
            found: "Sum".into(),
        }
    );
    assert_eq!(sum, before);

    assert!(matches!(
        ladders.replace(&sum, [("a", 5.0)]),
        Err(ResolutionError::SchemaMismatch { .. })
    ));
}

#[test]
fn resolver_for_an_identical_schema_can_update() {
    let first = Resolver::new(fixtures::sum());
    let second = Resolver::new(fixtures::sum());
    let mut sum = first.construct([("a", 1.0), ("b", 2.0)]).unwrap();
    second.update(&mut sum, [("a", 5.0)]).unwrap();
    assert_eq!(sum.real("c"), Some(7.0));
}
