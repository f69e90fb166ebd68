//! Numeric evaluation of expressions and relations.
//!
//! Evaluation is total over the reals in the IEEE sense: out-of-domain
//! operations (`sqrt(-1)`, `ln(0)`, `1 / 0`) produce NaN or infinities
//! rather than errors. Callers decide what a non-finite result means.
//! The only evaluation error is a variable with no binding.

use crate::ast::{BinOp, Expr, RelOp, Relation};

/// Relative tolerance used by `==` and `!=` relations.
pub const RELATION_EPSILON: f64 = 1e-9;

/// Errors from [`Expr::eval`] and [`Relation::holds`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// The environment has no value for a referenced variable.
    #[error("no value bound for variable '{name}'")]
    Unbound {
        /// The unbound variable.
        name: String,
    },
}

impl Expr {
    /// Evaluate against an environment mapping variable names to values.
    ///
    /// ```
    /// use symbind_expr::parse_expr;
    ///
    /// let e = parse_expr("a * 2 + b").unwrap();
    /// let v = e.eval(&|name: &str| match name {
    ///     "a" => Some(3.0),
    ///     "b" => Some(1.0),
    ///     _ => None,
    /// });
    /// assert_eq!(v, Ok(7.0));
    /// ```
    pub fn eval<F>(&self, env: &F) -> Result<f64, EvalError>
    where
        F: Fn(&str) -> Option<f64>,
    {
        match self {
            Self::Const(v) => Ok(*v),
            Self::Var(name) => env(name).ok_or_else(|| EvalError::Unbound { name: name.clone() }),
            Self::Neg(inner) => Ok(-inner.eval(env)?),
            Self::Binary { op, lhs, rhs } => {
                let a = lhs.eval(env)?;
                let b = rhs.eval(env)?;
                Ok(apply_binary(*op, a, b))
            }
            Self::Call { func, arg } => Ok(func.apply(arg.eval(env)?)),
        }
    }
}

/// Apply a binary operator to two numbers.
pub(crate) fn apply_binary(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Pow => power(a, b),
    }
}

/// `a ^ b`, exact for small integral exponents.
fn power(a: f64, b: f64) -> f64 {
    if b.fract() == 0.0 && b.abs() <= i32::MAX as f64 {
        a.powi(b as i32)
    } else {
        a.powf(b)
    }
}

impl Relation {
    /// Evaluate the relation. NaN on either side makes every comparison false.
    pub fn holds<F>(&self, env: &F) -> Result<bool, EvalError>
    where
        F: Fn(&str) -> Option<f64>,
    {
        let a = self.lhs.eval(env)?;
        let b = self.rhs.eval(env)?;
        if a.is_nan() || b.is_nan() {
            return Ok(false);
        }
        Ok(match self.op {
            RelOp::Lt => a < b,
            RelOp::Le => a <= b,
            RelOp::Gt => a > b,
            RelOp::Ge => a >= b,
            RelOp::Eq => approx_eq(a, b),
            RelOp::Ne => !approx_eq(a, b),
        })
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= RELATION_EPSILON * a.abs().max(b.abs()).max(1.0)
}
