//! Typing, domains, transforms, forward rules and the record surface.

use std::sync::Arc;

use symbind_core::{FieldType, ResolutionError, RuleError, Value};
use symbind_engine::{Resolver, ResolverConfig};
use symbind_schema::{Entity, Field, SchemaBuilder};
use symbind_test_utils::{fixtures, init_tracing, FixedSolver};

// ── Given values ────────────────────────────────────────────────

#[test]
fn text_for_a_real_field_is_a_type_mismatch() {
    let resolver = Resolver::new(fixtures::sum());
    let err = resolver
        .construct([("a", Value::from("one")), ("b", Value::from(2.0))])
        .unwrap_err();
    assert_eq!(
        err,
        ResolutionError::TypeMismatch {
            field: "a".into(),
            expected: FieldType::Real,
            found: Value::from("one"),
        }
    );
}

#[test]
fn non_finite_given_is_rejected() {
    let resolver = Resolver::new(fixtures::sum());
    let err = resolver
        .construct([("a", f64::NAN), ("b", 1.0)])
        .unwrap_err();
    assert!(
        matches!(err, ResolutionError::TypeMismatch { ref field, .. } if field == "a"),
        "got {err:?}"
    );
}

#[test]
fn undeclared_given_is_unknown_field() {
    let resolver = Resolver::new(fixtures::sum());
    let err = resolver.construct([("z", 1.0)]).unwrap_err();
    assert_eq!(err, ResolutionError::UnknownField { name: "z".into() });
}

#[test]
fn integers_widen_for_real_fields() {
    let resolver = Resolver::new(fixtures::sum());
    let s = resolver.construct([("a", 1), ("b", 2)]).unwrap();
    assert_eq!(s.get("a"), Some(&Value::Real(1.0)));
    assert_eq!(s.real("c"), Some(3.0));
}

// ── Domains ─────────────────────────────────────────────────────

fn counter() -> Resolver {
    Resolver::new(
        SchemaBuilder::new("Counter")
            .field(Field::integer("n"))
            .field(Field::integer("double").equation("n * 2"))
            .build()
            .unwrap(),
    )
}

#[test]
fn integer_fields_resolve_to_integers() {
    let c = counter().construct([("double", 8)]).unwrap();
    assert_eq!(c.get("n"), Some(&Value::Int(4)));
    assert_eq!(c.integer("double"), Some(8));
}

#[test]
fn non_integral_solution_for_integer_field_is_inconsistent() {
    match counter().construct([("double", 7)]) {
        Err(ResolutionError::InconsistentInputs { reason }) => {
            assert!(reason.contains("domain"), "reason: {reason}");
        }
        other => panic!("expected InconsistentInputs, got {other:?}"),
    }
}

#[test]
fn no_real_root_is_inconsistent() {
    let resolver = Resolver::new(fixtures::square(Some("a > 0")));
    let err = resolver.construct([("b", -4.0)]).unwrap_err();
    assert!(
        matches!(err, ResolutionError::InconsistentInputs { .. }),
        "got {err:?}"
    );
}

#[test]
fn constraint_picks_the_larger_root_of_a_zero_output() {
    let resolver = Resolver::new(
        SchemaBuilder::new("Parabola")
            .field(Field::real("a"))
            .field(Field::real("b").equation("a ^ 2 - 5 * a + 6"))
            .constraint("a > 2.5")
            .build()
            .unwrap(),
    );
    let p = resolver.construct([("b", 0.0)]).unwrap();
    assert_eq!(p.real("a"), Some(3.0));
    assert_eq!(p.real("b"), Some(0.0));
}

// ── Transforms and validation ───────────────────────────────────

#[test]
fn transform_rounds_derived_values() {
    init_tracing();
    let resolver = Resolver::new(fixtures::circle());
    let c = resolver.construct([("radius", 2.0)]).unwrap();
    assert_eq!(c.real("area"), Some(12.566371));
    assert_eq!(c.real("diameter"), Some(4.0));

    let from_diameter = resolver.construct([("diameter", 4.0)]).unwrap();
    assert_eq!(from_diameter, c);
}

#[test]
fn area_picks_positive_radius() {
    let resolver = Resolver::new(fixtures::circle());
    let c = resolver.construct([("area", 12.566371)]).unwrap();
    let r = c.real("radius").unwrap();
    assert!((r - 2.0).abs() < 1e-6, "radius = {r}");
}

#[test]
fn single_candidate_breaking_a_constraint_fails_validation() {
    init_tracing();
    let resolver = Resolver::new(fixtures::temperature());
    match resolver.construct([("kelvin", -10.0)]) {
        Err(ResolutionError::ValidationFailed { failures }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].subject, "constraint `kelvin >= 0`");
            assert_eq!(failures[0].actual, "false");
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
}

#[test]
fn given_forward_target_must_match_its_rule() {
    let resolver = Resolver::new(fixtures::person());
    match resolver.construct([("first", "John"), ("last", "Doe"), ("full", "Jane Roe")]) {
        Err(ResolutionError::ValidationFailed { failures }) => {
            assert_eq!(failures[0].subject, "full = <fn(first, last)>");
            assert_eq!(failures[0].expected, "John Doe");
            assert_eq!(failures[0].actual, "Jane Roe");
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
}

// ── Forward rules ───────────────────────────────────────────────

#[test]
fn forward_rule_feeds_on_solver_output() {
    let resolver = Resolver::new(fixtures::motion());
    let m = resolver
        .construct([("mass", 2.0), ("velocity", 3.0)])
        .unwrap();
    assert_eq!(m.real("momentum"), Some(6.0));
    assert_eq!(m.real("energy"), Some(9.0));
    assert_eq!(m.text("regime"), Some("fast"));

    let back = resolver
        .construct([("momentum", 6.0), ("energy", 9.0)])
        .unwrap();
    assert!((back.real("mass").unwrap() - 2.0).abs() < 1e-9);
    assert!((back.real("velocity").unwrap() - 3.0).abs() < 1e-9);
    assert_eq!(back.text("regime"), Some("fast"));
}

#[test]
fn forward_rule_returning_wrong_type_fails() {
    let schema = SchemaBuilder::new("Bad")
        .field(Field::real("a"))
        .field(Field::real("label").forward(["a"], |_| Ok(Value::from("oops"))))
        .build()
        .unwrap();
    match Resolver::new(schema).construct([("a", 1.0)]) {
        Err(ResolutionError::ForwardFailed { field, reason }) => {
            assert_eq!(field, "label");
            assert!(reason.contains("text"), "reason: {reason}");
        }
        other => panic!("expected ForwardFailed, got {other:?}"),
    }
}

#[test]
fn forward_rule_error_is_surfaced() {
    let schema = SchemaBuilder::new("Bad")
        .field(Field::real("a"))
        .field(
            Field::real("b").forward(["a"], |_| Err(RuleError::new("division by zero"))),
        )
        .build()
        .unwrap();
    let err = Resolver::new(schema).construct([("a", 1.0)]).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::ForwardFailed {
            field: "b".into(),
            reason: "division by zero".into(),
        }
    );
}

#[test]
fn defaults_fill_in_and_survive_updates() {
    let schema = SchemaBuilder::new("Reading")
        .field(Field::real("value"))
        .field(Field::text("unit").default_value("m"))
        .field(Field::real("doubled").equation("value * 2"))
        .build()
        .unwrap();
    let resolver = Resolver::new(schema);
    let mut r = resolver.construct([("value", 1.5)]).unwrap();
    assert_eq!(r.text("unit"), Some("m"));

    r.set("unit", "ft").unwrap();
    r.set("value", 2.0).unwrap();
    assert_eq!(r.text("unit"), Some("ft"));
    assert_eq!(r.real("doubled"), Some(4.0));
}

#[test]
fn unreferenced_root_must_be_given() {
    let schema = SchemaBuilder::new("Tagged")
        .field(Field::real("a"))
        .field(Field::real("b").equation("a + 1"))
        .field(Field::text("tag"))
        .build()
        .unwrap();
    match Resolver::new(schema).construct([("a", 1.0)]) {
        Err(ResolutionError::InsufficientInputs { provided, missing }) => {
            assert_eq!(provided, vec!["a".to_string()]);
            assert_eq!(missing, vec!["tag".to_string()]);
        }
        other => panic!("expected InsufficientInputs, got {other:?}"),
    }
}

// ── Custom solvers ──────────────────────────────────────────────

#[test]
fn constraint_filter_works_on_any_solver_output() {
    let solver = FixedSolver::new(&[&[("a", -2.0)], &[("a", 2.0)]]);
    let resolver = Resolver::with_solver(
        fixtures::square(Some("a > 0")),
        ResolverConfig::default(),
        Arc::new(solver),
    )
    .unwrap();
    let sq = resolver.construct([("b", 4.0)]).unwrap();
    assert_eq!(sq.real("a"), Some(2.0));
}

#[test]
fn wrong_solver_output_is_caught_by_validation() {
    let solver = FixedSolver::new(&[&[("a", 3.0)]]);
    let resolver = Resolver::with_solver(
        fixtures::square(None),
        ResolverConfig::default(),
        Arc::new(solver),
    )
    .unwrap();
    match resolver.construct([("b", 4.0)]) {
        Err(ResolutionError::ValidationFailed { failures }) => {
            assert_eq!(failures[0].subject, "b = a ^ 2");
            assert_eq!(failures[0].difference, Some(5.0));
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = ResolverConfig::default();
    config.tolerance.relative = f64::INFINITY;
    assert!(Resolver::with_config(fixtures::sum(), config).is_err());
}

// ── Record surface ──────────────────────────────────────────────

#[test]
fn display_lists_fields_in_declaration_order() {
    let resolver = Resolver::new(fixtures::person());
    let p = resolver
        .construct([("first", "Ada"), ("last", "Lovelace")])
        .unwrap();
    assert_eq!(
        p.to_string(),
        r#"Person(first="Ada", last="Lovelace", full="Ada Lovelace")"#
    );

    let s = Resolver::new(fixtures::sum())
        .construct([("a", 1.0), ("b", 2.5)])
        .unwrap();
    assert_eq!(s.to_string(), "Sum(a=1, b=2.5, c=3.5)");
}

#[test]
fn serializes_as_a_json_object() {
    let s = Resolver::new(fixtures::sum())
        .construct([("a", 1.0), ("b", 2.5)])
        .unwrap();
    assert_eq!(
        serde_json::to_string(&s).unwrap(),
        r#"{"a":1.0,"b":2.5,"c":3.5}"#
    );
    let names: Vec<&str> = s.iter().map(|(n, _)| n).collect();
    assert_eq!(names, ["a", "b", "c"]);
}

struct Account;

impl Entity for Account {
    const NAME: &'static str = "Account";

    fn declare() -> SchemaBuilder {
        SchemaBuilder::new(Self::NAME)
            .field(Field::real("principal"))
            .field(Field::real("rate"))
            .field(Field::real("interest").equation("principal * rate"))
            .constraint("principal >= 0")
    }
}

#[test]
fn entity_resolver_uses_the_registry() {
    let resolver = Resolver::for_entity::<Account>().unwrap();
    let acct = resolver
        .construct([("interest", 50.0), ("rate", 0.05)])
        .unwrap();
    let principal = acct.real("principal").unwrap();
    assert!((principal - 1000.0).abs() < 1e-9, "principal = {principal}");
    assert_eq!(acct.schema().name(), "Account");
}
