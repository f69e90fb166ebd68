//! A rectangle whose area and perimeter follow its sides.
//!
//! Demonstrates: forward derivation, root retention on update, the
//! all-or-nothing guarantee, and solving a coupled system backwards.

use symbind::prelude::*;

fn rectangle() -> Resolver {
    let schema = SchemaBuilder::new("Rectangle")
        .field(Field::real("width"))
        .field(Field::real("height"))
        .field(Field::real("area").equation("width * height"))
        .field(Field::real("perimeter").equation("2 * (width + height)"))
        .constraint("width > 0")
        .constraint("height > 0")
        .build()
        .unwrap();
    Resolver::new(schema)
}

fn main() {
    println!("=== symbind rectangle demo ===\n");
    let resolver = rectangle();

    let mut rect = resolver
        .construct([("width", 3.0), ("height", 4.0)])
        .unwrap();
    println!("built:            {rect}");

    rect.set("width", 10.0).unwrap();
    println!("width = 10:       {rect}");

    // Changing the area alone releases both sides, which is not enough.
    match rect.set("area", 30.0) {
        Ok(()) => println!("unexpected success: {rect}"),
        Err(e) => println!("area = 30 alone:  {e}"),
    }
    println!("unchanged:        {rect}");

    rect.update([("area", 30.0), ("width", 5.0)]).unwrap();
    println!("area 30, width 5: {rect}");

    // Area and perimeter together pin both sides, up to which is which.
    match resolver.construct([("area", 12.0), ("perimeter", 14.0)]) {
        Ok(r) => println!("from area/perim: {r}"),
        Err(ResolutionError::AmbiguousSolution { candidates }) => {
            println!("from area/perim:  {} candidates", candidates.len());
            for c in &candidates {
                println!("    width={} height={}", c["width"], c["height"]);
            }
        }
        Err(e) => println!("from area/perim:  {e}"),
    }
}
