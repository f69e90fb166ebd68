//! Momentum and kinetic energy, with a forward-only classification.
//!
//! Demonstrates: a nonlinear coupled inverse (mass and velocity from
//! momentum and energy), a forward rule written in Rust, a default
//! value, a rounding transform, and the solver-facing metrics.

use symbind::prelude::*;

fn body() -> Resolver {
    let schema = SchemaBuilder::new("Body")
        .field(Field::real("mass"))
        .field(Field::real("velocity"))
        .field(Field::real("momentum").equation("mass * velocity"))
        .field(Field::real("energy").equation("0.5 * mass * velocity ^ 2").round_to(3))
        .field(Field::text("unit").default_value("SI"))
        .field(Field::text("regime").forward(["velocity"], |args| {
            let v = args.real("velocity")?;
            Ok(Value::from(if v.abs() < 1.0 { "slow" } else { "fast" }))
        }))
        .constraint("mass > 0")
        .build()
        .unwrap();
    Resolver::new(schema)
}

fn main() {
    println!("=== symbind physics demo ===\n");
    let resolver = body();

    let ball = resolver
        .construct([("mass", 0.145), ("velocity", 40.0)])
        .unwrap();
    println!("ball:      {ball}");

    let recovered = resolver
        .construct([("momentum", 5.8), ("energy", 116.0)])
        .unwrap();
    println!("recovered: {recovered}");
    let m = recovered.metrics();
    println!(
        "  {} unknowns, {} raw / {} in-domain / {} surviving candidates, {}us",
        m.solver_unknowns, m.raw_candidates, m.domain_candidates, m.surviving_candidates, m.total_us,
    );

    println!("\nas JSON:   {}", serde_json::to_string(&recovered).unwrap());

    match resolver.construct([("regime", "fast")]) {
        Ok(b) => println!("unexpected: {b}"),
        Err(e) => println!("\nregime alone: {e}"),
    }
}
