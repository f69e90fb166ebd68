//! Reusable fixture schemas.
//!
//! Each function compiles a small entity type exercising one part of the
//! engine:
//!
//! - [`sum`]: `c = a + b`, solvable in all three directions.
//! - [`chain`]: `b = a * 2`, `c = b + 3`.
//! - [`square`]: `b = a ^ 2` with an optional constraint on `a`.
//! - [`ladder`]: `a -> b -> c -> d`, each one more than the last.
//! - [`person`]: a forward-only `full` name.
//! - [`rectangle`], [`temperature`], [`circle`], [`motion`]: realistic
//!   entities with constraints and rounding.

use symbind_core::{RuleError, Value};
use symbind_schema::{Field, Schema, SchemaBuilder};

fn compile(builder: SchemaBuilder) -> Schema {
    match builder.build() {
        Ok(schema) => schema,
        Err(e) => panic!("fixture schema failed to compile: {e}"),
    }
}

/// `{a, b, c = a + b}`.
pub fn sum() -> Schema {
    compile(
        SchemaBuilder::new("Sum")
            .field(Field::real("a"))
            .field(Field::real("b"))
            .field(Field::real("c").equation("a + b")),
    )
}

/// `{a, b = a * 2, c = b + 3}`.
pub fn chain() -> Schema {
    compile(
        SchemaBuilder::new("Chain")
            .field(Field::real("a"))
            .field(Field::real("b").equation("a * 2"))
            .field(Field::real("c").equation("b + 3")),
    )
}

/// `{a, b = a ^ 2}`, plus `constraint` if given.
pub fn square(constraint: Option<&str>) -> Schema {
    let mut builder = SchemaBuilder::new("Square")
        .field(Field::real("a"))
        .field(Field::real("b").equation("a ^ 2"));
    if let Some(c) = constraint {
        builder = builder.constraint(c);
    }
    compile(builder)
}

/// `{a, b = a + 1, c = b + 1, d = c + 1}`.
pub fn ladder() -> Schema {
    compile(
        SchemaBuilder::new("Ladder")
            .field(Field::real("a"))
            .field(Field::real("b").equation("a + 1"))
            .field(Field::real("c").equation("b + 1"))
            .field(Field::real("d").equation("c + 1")),
    )
}

/// `{first, last, full = first + " " + last}` with `full` forward-only.
pub fn person() -> Schema {
    compile(
        SchemaBuilder::new("Person")
            .field(Field::text("first"))
            .field(Field::text("last"))
            .field(Field::text("full").forward(["first", "last"], |args| {
                Ok(Value::from(format!(
                    "{} {}",
                    args.text("first")?,
                    args.text("last")?
                )))
            })),
    )
}

/// Width, height, area and perimeter, all positive.
pub fn rectangle() -> Schema {
    compile(
        SchemaBuilder::new("Rectangle")
            .field(Field::real("width"))
            .field(Field::real("height"))
            .field(Field::real("area").equation("width * height"))
            .field(Field::real("perimeter").equation("2 * (width + height)"))
            .constraint("width > 0")
            .constraint("height > 0"),
    )
}

/// Celsius, Fahrenheit and Kelvin, above absolute zero.
pub fn temperature() -> Schema {
    compile(
        SchemaBuilder::new("Temperature")
            .field(Field::real("celsius"))
            .field(Field::real("fahrenheit").equation("celsius * 9 / 5 + 32"))
            .field(Field::real("kelvin").equation("celsius + 273.15"))
            .constraint("kelvin >= 0"),
    )
}

/// Radius, diameter, circumference and area (rounded to 6 places), with
/// a positive radius.
pub fn circle() -> Schema {
    compile(
        SchemaBuilder::new("Circle")
            .field(Field::real("radius"))
            .field(Field::real("diameter").equation("2 * radius"))
            .field(Field::real("circumference").equation("2 * pi * radius"))
            .field(Field::real("area").equation("pi * radius ^ 2").round_to(6))
            .constraint("radius > 0"),
    )
}

/// Mass, velocity, momentum and kinetic energy, with a labelled regime
/// computed forward from the velocity.
pub fn motion() -> Schema {
    compile(
        SchemaBuilder::new("Motion")
            .field(Field::real("mass"))
            .field(Field::real("velocity"))
            .field(Field::real("momentum").equation("mass * velocity"))
            .field(Field::real("energy").equation("0.5 * mass * velocity ^ 2"))
            .field(Field::text("regime").forward(["velocity"], |args| {
                let v = args.real("velocity")?;
                if !v.is_finite() {
                    return Err(RuleError::new("velocity is not finite"));
                }
                Ok(Value::from(if v.abs() < 1.0 { "slow" } else { "fast" }))
            }))
            .constraint("mass > 0"),
    )
}
