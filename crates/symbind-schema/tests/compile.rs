//! Compiler checks and dependency-graph queries over small schemas.

use symbind_core::{FieldId, FieldSet, SchemaError, Value};
use symbind_schema::{Field, SchemaBuilder};

fn chain() -> SchemaBuilder {
    SchemaBuilder::new("Chain")
        .field(Field::real("a"))
        .field(Field::real("b").equation("a + 1"))
        .field(Field::real("c").equation("b + 1"))
        .field(Field::real("d").equation("c + 1"))
}

fn person() -> SchemaBuilder {
    SchemaBuilder::new("Person")
        .field(Field::text("first"))
        .field(Field::text("last"))
        .field(Field::text("full").forward(["first", "last"], |args| {
            Ok(Value::from(format!(
                "{} {}",
                args.text("first")?,
                args.text("last")?
            )))
        }))
}

#[test]
fn upstream_roots_follow_equation_chains() {
    let schema = chain().build().unwrap();
    let graph = schema.graph();
    let a: FieldSet = [FieldId(0)].into_iter().collect();
    assert_eq!(graph.upstream_roots(FieldId(3)), a);
    assert_eq!(graph.upstream_roots(FieldId(2)), a);
    assert!(graph.upstream_roots(FieldId(0)).is_empty());
}

#[test]
fn upstream_roots_stop_at_operands_for_multi_root_equations() {
    let schema = SchemaBuilder::new("Rect")
        .field(Field::real("width"))
        .field(Field::real("height"))
        .field(Field::real("area").equation("width * height"))
        .field(Field::real("unrelated"))
        .build()
        .unwrap();
    let up = schema.graph().upstream_roots(FieldId(2));
    assert_eq!(schema.names(&up), vec!["width", "height"]);
}

#[test]
fn equation_fields_and_forward_targets() {
    let schema = chain().build().unwrap();
    assert_eq!(schema.graph().equation_fields().len(), 4);
    assert!(schema.graph().forward_targets().is_empty());

    let schema = person().build().unwrap();
    assert!(schema.graph().equation_fields().is_empty());
    assert!(schema.graph().forward_targets().contains(FieldId(2)));
}

#[test]
fn forward_readiness() {
    let schema = person().build().unwrap();
    let graph = schema.graph();
    let mut known = FieldSet::empty();
    known.insert(FieldId(0));
    assert!(!graph.is_ready(FieldId(2), &known));
    assert_eq!(graph.missing_parameters(FieldId(2), &known), vec![FieldId(1)]);
    known.insert(FieldId(1));
    assert!(graph.is_ready(FieldId(2), &known));
}

#[test]
fn forward_rules_render_as_functions() {
    let schema = person().build().unwrap();
    let rule = schema.rule_for(FieldId(2)).unwrap();
    assert!(!rule.is_invertible());
    assert_eq!(schema.describe_rule(rule), "full = <fn(first, last)>");
}

#[test]
fn forward_cycle_rejected() {
    let err = SchemaBuilder::new("Loop")
        .field(Field::real("x").forward(["y"], |a| Ok(Value::Real(a.real("y")? + 1.0))))
        .field(Field::real("y").forward(["x"], |a| Ok(Value::Real(a.real("x")? - 1.0))))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::ForwardCycle {
            fields: vec!["x".into(), "y".into()]
        }
    );
}

#[test]
fn forward_self_reference_is_a_cycle() {
    let err = SchemaBuilder::new("Selfish")
        .field(Field::real("x").forward(["x"], |a| Ok(Value::Real(a.real("x")?))))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::ForwardCycle { .. }));
}

#[test]
fn unknown_forward_parameter() {
    let err = SchemaBuilder::new("P")
        .field(Field::text("first"))
        .field(Field::text("full").forward(["first", "middle"], |a| {
            Ok(Value::from(a.text("first")?))
        }))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::UnknownParameter {
            field: "full".into(),
            parameter: "middle".into()
        }
    );
}

#[test]
fn forward_target_cannot_feed_an_equation() {
    let err = SchemaBuilder::new("Mixed")
        .field(Field::real("x"))
        .field(Field::real("y").forward(["x"], |a| Ok(Value::Real(a.real("x")?.floor()))))
        .field(Field::real("z").equation("y * 2"))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::ForwardTargetInEquation {
            field: "y".into(),
            equation: "z".into()
        }
    );
}

#[test]
fn text_fields_cannot_appear_in_equations_or_constraints() {
    let err = SchemaBuilder::new("T")
        .field(Field::text("name"))
        .field(Field::real("n").equation("name + 1"))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::NonNumericField { ref name, .. } if name == "name"));

    let err = SchemaBuilder::new("T")
        .field(Field::text("name"))
        .constraint("name > 0")
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::NonNumericField { .. }));
}

#[test]
fn constraint_without_fields_is_malformed() {
    let err = SchemaBuilder::new("C")
        .field(Field::real("a"))
        .constraint("1 > 0")
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::MalformedConstraint { .. }));
}

#[test]
fn constraint_on_unknown_field() {
    let err = SchemaBuilder::new("C")
        .field(Field::real("a"))
        .constraint("b > 0")
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::UnknownField {
            name: "b".into(),
            context: "constraint `b > 0`".into()
        }
    );
}

#[test]
fn graph_has_bidirectional_equation_edges() {
    let schema = SchemaBuilder::new("Sum")
        .field(Field::real("a"))
        .field(Field::real("b"))
        .field(Field::real("c").equation("a + b"))
        .build()
        .unwrap();
    // 3 fields + 1 rule; 3 referenced fields x 2 directions.
    assert_eq!(schema.graph().node_count(), 4);
    assert_eq!(schema.graph().edge_count(), 6);
}

mod props {
    use super::*;
    use proptest::prelude::*;

    fn ladder(n: usize) -> SchemaBuilder {
        let mut builder = SchemaBuilder::new("Ladder").field(Field::real("x0"));
        for i in 1..n {
            builder = builder.field(Field::real(format!("x{i}")).equation(format!("x{} * 2", i - 1)));
        }
        builder
    }

    proptest! {
        #[test]
        fn every_rung_leads_back_to_the_single_root(n in 2usize..40) {
            let schema = ladder(n).build().unwrap();
            let root: FieldSet = [FieldId(0)].into_iter().collect();
            prop_assert_eq!(schema.roots(), root.clone());
            prop_assert_eq!(schema.graph().equation_fields().len(), n);
            for i in 1..n {
                prop_assert_eq!(schema.graph().upstream_roots(FieldId(i as u32)), root.clone());
            }
        }
    }
}
