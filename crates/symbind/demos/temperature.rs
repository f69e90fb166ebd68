//! Temperature conversions resolved in every direction.
//!
//! Demonstrates: one root, two derived scales, a physical constraint,
//! construction from any scale, and updates that re-derive the root.
//!
//! Run with `RUST_LOG=symbind_engine=debug` to see the resolution steps.

use symbind::prelude::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== symbind temperature demo ===\n");

    let schema = SchemaBuilder::new("Temperature")
        .field(Field::real("celsius"))
        .field(Field::real("fahrenheit").equation("celsius * 9 / 5 + 32"))
        .field(Field::real("kelvin").equation("celsius + 273.15"))
        .constraint("kelvin >= 0")
        .build()
        .unwrap();
    let resolver = Resolver::new(schema);

    for (scale, value) in [("celsius", 100.0), ("fahrenheit", -40.0), ("kelvin", 0.0)] {
        let t = resolver.construct([(scale, value)]).unwrap();
        println!("  from {scale:<10} = {value:>7}: {t}");
    }

    let mut t = resolver.construct([("celsius", 20.0)]).unwrap();
    println!("\nroom temperature: {t}");
    t.set("fahrenheit", 98.6).unwrap();
    println!("after fahrenheit = 98.6: {t}");
    println!(
        "  resolved in {}us ({} solver unknowns)",
        t.metrics().total_us,
        t.metrics().solver_unknowns
    );

    match resolver.construct([("kelvin", -5.0)]) {
        Ok(t) => println!("\nunexpected: {t}"),
        Err(e) => println!("\nkelvin = -5 rejected: {e}"),
    }
}
