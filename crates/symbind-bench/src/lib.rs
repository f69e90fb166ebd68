//! Benchmark profiles for the symbind resolution engine.
//!
//! Provides schema builders whose size can be dialled up:
//!
//! - [`ladder_profile`]: a chain of `n` fields, each one more than the last
//! - [`ledger_profile`]: `n` independent `total = price * qty` triples
//! - [`ledger_givens`]: deterministic inputs for a ledger of size `n`

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use symbind_schema::{Field, SchemaBuilder};

/// Name of the `i`th field of a ladder.
pub fn rung(i: usize) -> String {
    format!("x{i}")
}

/// Build a ladder of `n` fields: `x0` is the root and `x{i} = x{i-1} + 1`.
///
/// Giving the last rung forces the solver through every equation.
pub fn ladder_profile(n: usize) -> SchemaBuilder {
    let mut builder = SchemaBuilder::new(format!("Ladder{n}")).field(Field::real(rung(0)));
    for i in 1..n {
        builder = builder.field(Field::real(rung(i)).equation(format!("{} + 1", rung(i - 1))));
    }
    builder
}

/// Build `n` independent line items, each `total{i} = price{i} * qty{i}`
/// with `price{i} > 0`.
pub fn ledger_profile(n: usize) -> SchemaBuilder {
    let mut builder = SchemaBuilder::new(format!("Ledger{n}"));
    for i in 0..n {
        builder = builder
            .field(Field::real(format!("price{i}")))
            .field(Field::real(format!("qty{i}")))
            .field(Field::real(format!("total{i}")).equation(format!("price{i} * qty{i}")))
            .constraint(format!("price{i} > 0"));
    }
    builder
}

/// Deterministic givens for [`ledger_profile`]: every quantity and
/// total, leaving the prices to be solved for.
pub fn ledger_givens(n: usize) -> Vec<(String, f64)> {
    let mut givens = Vec::with_capacity(2 * n);
    for i in 0..n {
        let qty = (i % 7 + 1) as f64;
        let price = 1.5 + (i % 5) as f64;
        givens.push((format!("qty{i}"), qty));
        givens.push((format!("total{i}"), price * qty));
    }
    givens
}
