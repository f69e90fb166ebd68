//! The [`Expr`] and [`Relation`] trees.
//!
//! Expressions are plain owned trees over `f64` constants and named
//! variables. They are built either by the text parser
//! ([`parse_expr`](crate::parse_expr)) or programmatically through the
//! constructors and operator overloads defined here:
//!
//! ```
//! use symbind_expr::Expr;
//!
//! let c = Expr::var("a") + Expr::var("b") * 2.0;
//! assert_eq!(c.to_string(), "a + b * 2");
//! assert_eq!(c.variables(), vec!["a".to_string(), "b".to_string()]);
//! ```

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

// ── Operators ──────────────────────────────────────────────────────

/// A binary arithmetic operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// `a ^ b`
    Pow,
}

impl BinOp {
    /// Binding strength used by the parser and the printer.
    pub(crate) fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
            Self::Pow => 4,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        }
    }
}

/// A single-argument elementary function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Func {
    /// Square root.
    Sqrt,
    /// Natural exponential.
    Exp,
    /// Natural logarithm (`ln` or `log` in text).
    Ln,
    /// Base-10 logarithm.
    Log10,
    /// Sine (radians).
    Sin,
    /// Cosine (radians).
    Cos,
    /// Tangent (radians).
    Tan,
    /// Absolute value.
    Abs,
}

impl Func {
    /// Resolve a function name as written in expression text.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqrt" => Some(Self::Sqrt),
            "exp" => Some(Self::Exp),
            "ln" | "log" => Some(Self::Ln),
            "log10" => Some(Self::Log10),
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "abs" => Some(Self::Abs),
            _ => None,
        }
    }

    /// Canonical name used when printing.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sqrt => "sqrt",
            Self::Exp => "exp",
            Self::Ln => "ln",
            Self::Log10 => "log10",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Abs => "abs",
        }
    }

    /// Apply the function to a number. Out-of-domain inputs yield NaN.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Sqrt => x.sqrt(),
            Self::Exp => x.exp(),
            Self::Ln => x.ln(),
            Self::Log10 => x.log10(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Abs => x.abs(),
        }
    }
}

// ── Expr ───────────────────────────────────────────────────────────

/// An algebraic expression over named variables.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A numeric literal (including the named constants `pi` and `E`).
    Const(f64),
    /// A reference to a named variable (a field name).
    Var(String),
    /// Unary negation.
    Neg(Box<Expr>),
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// An elementary function applied to one argument.
    Call {
        /// The function.
        func: Func,
        /// Its argument.
        arg: Box<Expr>,
    },
}

impl Expr {
    /// A numeric constant.
    pub fn constant(value: f64) -> Self {
        Self::Const(value)
    }

    /// A variable reference.
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Build a binary node without simplification.
    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Build a function call node.
    pub fn call(func: Func, arg: Expr) -> Self {
        Self::Call {
            func,
            arg: Box::new(arg),
        }
    }

    /// `self ^ exponent`.
    pub fn pow(self, exponent: impl Into<Expr>) -> Self {
        Self::binary(BinOp::Pow, self, exponent.into())
    }

    /// `sqrt(self)`.
    pub fn sqrt(self) -> Self {
        Self::call(Func::Sqrt, self)
    }

    /// `exp(self)`.
    pub fn exp(self) -> Self {
        Self::call(Func::Exp, self)
    }

    /// `ln(self)`.
    pub fn ln(self) -> Self {
        Self::call(Func::Ln, self)
    }

    /// `log10(self)`.
    pub fn log10(self) -> Self {
        Self::call(Func::Log10, self)
    }

    /// `sin(self)`.
    pub fn sin(self) -> Self {
        Self::call(Func::Sin, self)
    }

    /// `cos(self)`.
    pub fn cos(self) -> Self {
        Self::call(Func::Cos, self)
    }

    /// `tan(self)`.
    pub fn tan(self) -> Self {
        Self::call(Func::Tan, self)
    }

    /// `abs(self)`.
    pub fn abs(self) -> Self {
        Self::call(Func::Abs, self)
    }

    /// `self > rhs`.
    pub fn gt(self, rhs: impl Into<Expr>) -> Relation {
        Relation::new(self, RelOp::Gt, rhs.into())
    }

    /// `self >= rhs`.
    pub fn ge(self, rhs: impl Into<Expr>) -> Relation {
        Relation::new(self, RelOp::Ge, rhs.into())
    }

    /// `self < rhs`.
    pub fn lt(self, rhs: impl Into<Expr>) -> Relation {
        Relation::new(self, RelOp::Lt, rhs.into())
    }

    /// `self <= rhs`.
    pub fn le(self, rhs: impl Into<Expr>) -> Relation {
        Relation::new(self, RelOp::Le, rhs.into())
    }

    /// `self == rhs`.
    pub fn eq_to(self, rhs: impl Into<Expr>) -> Relation {
        Relation::new(self, RelOp::Eq, rhs.into())
    }

    /// `self != rhs`.
    pub fn ne_to(self, rhs: impl Into<Expr>) -> Relation {
        Relation::new(self, RelOp::Ne, rhs.into())
    }

    /// The constant value, if this node is a literal.
    pub fn as_const(&self) -> Option<f64> {
        match self {
            Self::Const(v) => Some(*v),
            _ => None,
        }
    }

    /// Distinct variable names in order of first appearance.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    pub(crate) fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Self::Const(_) => {}
            Self::Var(name) => {
                if !out.iter().any(|n| n == name) {
                    out.push(name.clone());
                }
            }
            Self::Neg(inner) => inner.collect_variables(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Self::Call { arg, .. } => arg.collect_variables(out),
        }
    }

    /// Whether `name` occurs anywhere in the expression.
    pub fn contains_var(&self, name: &str) -> bool {
        match self {
            Self::Const(_) => false,
            Self::Var(n) => n == name,
            Self::Neg(inner) => inner.contains_var(name),
            Self::Binary { lhs, rhs, .. } => lhs.contains_var(name) || rhs.contains_var(name),
            Self::Call { arg, .. } => arg.contains_var(name),
        }
    }

    /// Whether the expression references no variables at all.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Const(_) => true,
            Self::Var(_) => false,
            Self::Neg(inner) => inner.is_closed(),
            Self::Binary { lhs, rhs, .. } => lhs.is_closed() && rhs.is_closed(),
            Self::Call { arg, .. } => arg.is_closed(),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Const(v) if *v < 0.0 => 3,
            Self::Const(_) | Self::Var(_) | Self::Call { .. } => 5,
            Self::Neg(_) => 3,
            Self::Binary { op, .. } => op.precedence(),
        }
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Self::Const(v)
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Self {
        Self::Const(f64::from(v))
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Self::Var(name.to_string())
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<Expr>> $trait<R> for Expr {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self, rhs.into())
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, Expr::Const(self), rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, BinOp::Add);
impl_binary_op!(Sub, sub, BinOp::Sub);
impl_binary_op!(Mul, mul, BinOp::Mul);
impl_binary_op!(Div, div, BinOp::Div);

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(v) => write!(f, "{v}"),
            Self::Var(name) => f.write_str(name),
            Self::Neg(inner) => {
                if inner.precedence() <= 3 {
                    write!(f, "-({inner})")
                } else {
                    write!(f, "-{inner}")
                }
            }
            Self::Binary { op, lhs, rhs } => {
                let prec = op.precedence();
                // `^` is right-associative; everything else is left-associative.
                let (lhs_parens, rhs_parens) = if *op == BinOp::Pow {
                    (lhs.precedence() <= prec, rhs.precedence() < prec)
                } else {
                    let non_assoc = matches!(op, BinOp::Sub | BinOp::Div);
                    (
                        lhs.precedence() < prec,
                        rhs.precedence() < prec || (non_assoc && rhs.precedence() == prec),
                    )
                };
                write_operand(f, lhs, lhs_parens)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, rhs, rhs_parens)
            }
            Self::Call { func, arg } => write!(f, "{}({arg})", func.name()),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, e: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({e})")
    } else {
        write!(f, "{e}")
    }
}

// ── Relation ───────────────────────────────────────────────────────

/// A comparison operator used in constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

impl RelOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }
}

/// A relational expression `lhs op rhs`.
#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    /// Left-hand side.
    pub lhs: Expr,
    /// Comparison operator.
    pub op: RelOp,
    /// Right-hand side.
    pub rhs: Expr,
}

impl Relation {
    /// Build a relation.
    pub fn new(lhs: Expr, op: RelOp, rhs: Expr) -> Self {
        Self { lhs, op, rhs }
    }

    /// Distinct variable names across both sides, in order of first appearance.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.lhs.collect_variables(&mut out);
        self.rhs.collect_variables(&mut out);
        out
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op.symbol(), self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_overloads_build_trees() {
        let e = Expr::var("a") + 1.0;
        assert_eq!(
            e,
            Expr::binary(BinOp::Add, Expr::var("a"), Expr::Const(1.0))
        );
        let e = 2.0 * Expr::var("x");
        assert_eq!(e.to_string(), "2 * x");
    }

    #[test]
    fn display_inserts_minimal_parentheses() {
        let e = (Expr::var("a") + Expr::var("b")) * Expr::var("c");
        assert_eq!(e.to_string(), "(a + b) * c");

        let e = Expr::var("a") - (Expr::var("b") - Expr::var("c"));
        assert_eq!(e.to_string(), "a - (b - c)");

        let e = Expr::var("a").pow(Expr::var("b").pow(2.0));
        assert_eq!(e.to_string(), "a ^ b ^ 2");

        let e = Expr::var("a").pow(2.0).pow(3.0);
        assert_eq!(e.to_string(), "(a ^ 2) ^ 3");

        let e = (-Expr::var("a")).pow(2.0);
        assert_eq!(e.to_string(), "(-a) ^ 2");
    }

    #[test]
    fn variables_in_first_appearance_order() {
        let e = Expr::var("b") * Expr::var("a") + Expr::var("b").sqrt();
        assert_eq!(e.variables(), vec!["b".to_string(), "a".to_string()]);
        assert!(e.contains_var("a"));
        assert!(!e.contains_var("c"));
    }

    #[test]
    fn relation_collects_both_sides() {
        let r = (Expr::var("x") + Expr::var("y")).gt(Expr::var("z"));
        assert_eq!(r.variables(), vec!["x", "y", "z"]);
        assert_eq!(r.to_string(), "x + y > z");
    }

    #[test]
    fn closed_expressions() {
        assert!(Expr::Const(1.0).sqrt().is_closed());
        assert!(!(Expr::var("a") * 0.0).is_closed());
    }
}
