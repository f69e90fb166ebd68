//! The input handed to an [`EquationSolver`](crate::EquationSolver).

use indexmap::IndexMap;
use symbind_expr::Expr;

/// One solution: a value for every unknown, in system order.
pub type Candidate = IndexMap<String, f64>;

/// A labelled equality `lhs = rhs`.
#[derive(Clone, Debug, PartialEq)]
pub struct Equation {
    /// Label used in diagnostics, e.g. `c = a + b`.
    pub label: String,
    /// Left-hand side.
    pub lhs: Expr,
    /// Right-hand side.
    pub rhs: Expr,
}

impl Equation {
    /// `lhs - rhs`, the residual the solver drives to zero.
    pub fn residual(&self) -> Expr {
        self.lhs.clone() - self.rhs.clone()
    }
}

/// Unknowns, equations, and pinned known values.
///
/// ```
/// use symbind_expr::{parse_expr, Expr};
/// use symbind_solver::EquationSystem;
///
/// let mut system = EquationSystem::new();
/// system.add_unknown("c");
/// system.add_known("a", 1.0);
/// system.add_known("b", 2.0);
/// system.add_equation("c = a + b", Expr::var("c"), parse_expr("a + b").unwrap());
/// assert_eq!(system.unknowns(), ["c".to_string()]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct EquationSystem {
    unknowns: Vec<String>,
    equations: Vec<Equation>,
    knowns: IndexMap<String, f64>,
}

impl EquationSystem {
    /// An empty system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an unknown. Candidates list unknowns in declaration order.
    pub fn add_unknown(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.unknowns.contains(&name) {
            self.unknowns.push(name);
        }
    }

    /// Pin a variable to a known value.
    pub fn add_known(&mut self, name: impl Into<String>, value: f64) {
        self.knowns.insert(name.into(), value);
    }

    /// Add the equality `lhs = rhs`.
    pub fn add_equation(&mut self, label: impl Into<String>, lhs: Expr, rhs: Expr) {
        self.equations.push(Equation {
            label: label.into(),
            lhs,
            rhs,
        });
    }

    /// Declared unknowns.
    pub fn unknowns(&self) -> &[String] {
        &self.unknowns
    }

    /// Equations in insertion order.
    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    /// Known values.
    pub fn knowns(&self) -> &IndexMap<String, f64> {
        &self.knowns
    }

    /// The known value of `name`, if pinned.
    pub fn known(&self, name: &str) -> Option<f64> {
        self.knowns.get(name).copied()
    }
}
