//! Symbolic differentiation, substitution, and constant folding.
//!
//! The solver needs exact partial derivatives for its Jacobian and a
//! cheap way to bake known values into a residual before iterating.
//! All rewrites here go through simplifying constructors that fold
//! constants and drop additive zeros and multiplicative ones, so
//! derivative trees stay small enough to evaluate in a Newton loop.

use crate::ast::{BinOp, Expr, Func};
use crate::eval::apply_binary;

impl Expr {
    /// Partial derivative with respect to `var`.
    ///
    /// ```
    /// use symbind_expr::parse_expr;
    ///
    /// let e = parse_expr("x ^ 2 + 3 * x").unwrap();
    /// let d = e.derivative("x");
    /// assert_eq!(d.eval(&|_: &str| Some(2.0)), Ok(7.0));
    /// ```
    pub fn derivative(&self, var: &str) -> Expr {
        if !self.contains_var(var) {
            return Expr::Const(0.0);
        }
        match self {
            Self::Const(_) => Expr::Const(0.0),
            Self::Var(name) => Expr::Const(if name == var { 1.0 } else { 0.0 }),
            Self::Neg(u) => neg(u.derivative(var)),
            Self::Binary { op, lhs, rhs } => {
                let (u, v) = (lhs.as_ref(), rhs.as_ref());
                match op {
                    BinOp::Add => add(u.derivative(var), v.derivative(var)),
                    BinOp::Sub => sub(u.derivative(var), v.derivative(var)),
                    BinOp::Mul => add(
                        mul(u.derivative(var), v.clone()),
                        mul(u.clone(), v.derivative(var)),
                    ),
                    BinOp::Div => div(
                        sub(
                            mul(u.derivative(var), v.clone()),
                            mul(u.clone(), v.derivative(var)),
                        ),
                        pow(v.clone(), Expr::Const(2.0)),
                    ),
                    BinOp::Pow => pow_derivative(u, v, var),
                }
            }
            Self::Call { func, arg } => {
                let u = arg.as_ref();
                let du = u.derivative(var);
                let outer = match func {
                    Func::Sqrt => div(
                        Expr::Const(1.0),
                        mul(Expr::Const(2.0), call(Func::Sqrt, u.clone())),
                    ),
                    Func::Exp => call(Func::Exp, u.clone()),
                    Func::Ln => div(Expr::Const(1.0), u.clone()),
                    Func::Log10 => div(
                        Expr::Const(1.0),
                        mul(u.clone(), Expr::Const(std::f64::consts::LN_10)),
                    ),
                    Func::Sin => call(Func::Cos, u.clone()),
                    Func::Cos => neg(call(Func::Sin, u.clone())),
                    Func::Tan => div(
                        Expr::Const(1.0),
                        pow(call(Func::Cos, u.clone()), Expr::Const(2.0)),
                    ),
                    Func::Abs => div(u.clone(), call(Func::Abs, u.clone())),
                };
                mul(outer, du)
            }
        }
    }

    /// Replace every variable bound by `env` with its value, then fold.
    ///
    /// Unbound variables are left in place.
    pub fn substitute<F>(&self, env: &F) -> Expr
    where
        F: Fn(&str) -> Option<f64>,
    {
        match self {
            Self::Const(v) => Expr::Const(*v),
            Self::Var(name) => match env(name) {
                Some(v) => Expr::Const(v),
                None => Expr::Var(name.clone()),
            },
            Self::Neg(u) => neg(u.substitute(env)),
            Self::Binary { op, lhs, rhs } => {
                binary(*op, lhs.substitute(env), rhs.substitute(env))
            }
            Self::Call { func, arg } => call(*func, arg.substitute(env)),
        }
    }

    /// Constant-fold the tree.
    pub fn fold(&self) -> Expr {
        self.substitute(&|_: &str| None)
    }
}

fn pow_derivative(u: &Expr, v: &Expr, var: &str) -> Expr {
    if let Some(c) = v.as_const() {
        // d/dx u^c = c * u^(c-1) * u'
        return mul(
            mul(Expr::Const(c), pow(u.clone(), Expr::Const(c - 1.0))),
            u.derivative(var),
        );
    }
    if let Some(a) = u.as_const() {
        // d/dx a^v = a^v * ln(a) * v'
        return mul(
            mul(pow(u.clone(), v.clone()), Expr::Const(a.ln())),
            v.derivative(var),
        );
    }
    // General case: u^v * (v' ln u + v u' / u)
    mul(
        pow(u.clone(), v.clone()),
        add(
            mul(v.derivative(var), call(Func::Ln, u.clone())),
            div(mul(v.clone(), u.derivative(var)), u.clone()),
        ),
    )
}

// ── Simplifying constructors ───────────────────────────────────────

fn is_const(e: &Expr, value: f64) -> bool {
    e.as_const() == Some(value)
}

fn neg(u: Expr) -> Expr {
    match u {
        Expr::Const(v) => Expr::Const(-v),
        Expr::Neg(inner) => *inner,
        other => Expr::Neg(Box::new(other)),
    }
}

fn add(u: Expr, v: Expr) -> Expr {
    binary(BinOp::Add, u, v)
}

fn sub(u: Expr, v: Expr) -> Expr {
    binary(BinOp::Sub, u, v)
}

fn mul(u: Expr, v: Expr) -> Expr {
    binary(BinOp::Mul, u, v)
}

fn div(u: Expr, v: Expr) -> Expr {
    binary(BinOp::Div, u, v)
}

fn pow(u: Expr, v: Expr) -> Expr {
    binary(BinOp::Pow, u, v)
}

fn call(func: Func, arg: Expr) -> Expr {
    match arg {
        Expr::Const(v) => Expr::Const(func.apply(v)),
        other => Expr::call(func, other),
    }
}

fn binary(op: BinOp, u: Expr, v: Expr) -> Expr {
    if let (Some(a), Some(b)) = (u.as_const(), v.as_const()) {
        return Expr::Const(apply_binary(op, a, b));
    }
    match op {
        BinOp::Add if is_const(&u, 0.0) => v,
        BinOp::Add | BinOp::Sub if is_const(&v, 0.0) => u,
        BinOp::Sub if is_const(&u, 0.0) => neg(v),
        BinOp::Mul if is_const(&u, 0.0) || is_const(&v, 0.0) => Expr::Const(0.0),
        BinOp::Mul if is_const(&u, 1.0) => v,
        BinOp::Mul | BinOp::Div if is_const(&v, 1.0) => u,
        BinOp::Mul if is_const(&u, -1.0) => neg(v),
        BinOp::Pow if is_const(&v, 0.0) => Expr::Const(1.0),
        BinOp::Pow if is_const(&v, 1.0) => u,
        _ => Expr::binary(op, u, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;
    use proptest::prelude::*;

    fn at(x: f64) -> impl Fn(&str) -> Option<f64> {
        move |name: &str| (name == "x").then_some(x)
    }

    #[test]
    fn constant_exponent_has_no_log_term() {
        let d = parse_expr("x ^ 3").unwrap().derivative("x");
        assert_eq!(d.to_string(), "3 * x ^ 2");
    }

    #[test]
    fn derivative_of_unrelated_variable_is_zero() {
        let d = parse_expr("a * b + sqrt(b)").unwrap().derivative("x");
        assert_eq!(d, Expr::Const(0.0));
    }

    #[test]
    fn linear_derivatives_fold_to_constants() {
        let e = parse_expr("2 * x + 3 * y - 7").unwrap();
        assert_eq!(e.derivative("x"), Expr::Const(2.0));
        assert_eq!(e.derivative("y"), Expr::Const(3.0));
    }

    #[test]
    fn substitute_folds_known_values() {
        let e = parse_expr("a * b + c").unwrap();
        let s = e.substitute(&|name: &str| match name {
            "a" => Some(2.0),
            "b" => Some(5.0),
            _ => None,
        });
        assert_eq!(s, Expr::Const(10.0) + Expr::var("c"));

        let closed = e.substitute(&|_: &str| Some(1.0));
        assert_eq!(closed, Expr::Const(2.0));
    }

    #[test]
    fn fold_removes_identities() {
        let e = Expr::var("x") * 1.0 + 0.0;
        assert_eq!(e.fold(), Expr::var("x"));
        let e = Expr::Const(0.0) - Expr::var("x");
        assert_eq!(e.fold(), -Expr::var("x"));
        let e = Expr::var("x").pow(1.0);
        assert_eq!(e.fold(), Expr::var("x"));
    }

    const SAMPLES: &[&str] = &[
        "x ^ 2 - 4",
        "3 * x ^ 3 - 2 * x + 1",
        "sqrt(x) * x",
        "exp(2 * x) / (1 + x)",
        "ln(x) + log10(x)",
        "sin(x) * cos(x) + tan(x / 4)",
        "x ^ x",
        "2 ^ x",
        "abs(x - 0.25) * x",
    ];

    proptest! {
        #[test]
        fn derivative_matches_central_difference(x in 0.5f64..2.0) {
            let h = 1e-6;
            for src in SAMPLES {
                let e = parse_expr(src).unwrap();
                let d = e.derivative("x");
                let exact = d.eval(&at(x)).unwrap();
                let plus = e.eval(&at(x + h)).unwrap();
                let minus = e.eval(&at(x - h)).unwrap();
                let numeric = (plus - minus) / (2.0 * h);
                let scale = exact.abs().max(1.0);
                prop_assert!(
                    (exact - numeric).abs() <= 1e-4 * scale,
                    "{src}: exact {exact} vs numeric {numeric} at x = {x}"
                );
            }
        }

        #[test]
        fn fold_preserves_value(x in -3.0f64..3.0) {
            for src in ["x * 1 + 0 * x", "(x + 0) ^ 1 - 0", "1 * (x - 0) / 1"] {
                let e = parse_expr(src).unwrap();
                let folded = e.fold();
                prop_assert_eq!(e.eval(&at(x)), folded.eval(&at(x)));
            }
        }
    }
}
