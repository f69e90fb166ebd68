//! Default solver: structural decomposition plus multi-start Newton.
//!
//! Each block is lowered to [`constraint_solver::Exp`] residuals and run
//! through the crate's Armijo-globalized Newton from every start point.
//! Acceptance uses a fixed per-equation scale, so a side that evaluates
//! to zero never stalls the line search.

use std::cmp::Ordering;
use std::collections::HashMap;

use constraint_solver::{
    Compiler, Exp, LeastSquaresWorkspace, Matrix, NewtonRaphsonSolver,
    SolverError as NewtonError, SolverOptions,
};
use symbind_expr::{BinOp, Expr, Func};
use tracing::{debug, trace};

use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::structure::{self, Block};
use crate::system::{Candidate, EquationSystem};
use crate::EquationSolver;

/// Points used to detect residuals that vanish identically.
const SAMPLE_POINTS: [f64; 4] = [0.731, -1.318, 2.917, 11.093];
/// Step halvings the backend may try before giving up on a start.
const MAX_BACKTRACKS: usize = 40;
/// A root is only accepted if one more Newton step would move it at
/// most this far (relative). Rejects "roots at infinity" such as
/// `1 / x -> 0`.
const MODEST_STEP: f64 = 1e-3;
/// Roots closer than this (relative) are the same root.
const SAME_ROOT: f64 = 1e-6;
/// Values this close (relative) to an integer are snapped to it.
const SNAP: f64 = 1e-11;
/// Known values feeding extra start magnitudes.
const MAX_KNOWN_SCALES: usize = 16;

/// Multi-start Newton solver.
///
/// See the [crate docs](crate) for the pipeline. The solver never uses
/// randomness: start points come from [`SolverConfig::start_points`]
/// plus magnitudes derived from the known values, so results are
/// reproducible.
#[derive(Clone, Debug, Default)]
pub struct NewtonSolver {
    config: SolverConfig,
}

impl NewtonSolver {
    /// Build a solver after validating `config`.
    pub fn new(config: SolverConfig) -> Result<Self, SolverError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn consistent(&self, l: f64, r: f64) -> bool {
        l.is_finite()
            && r.is_finite()
            && (l - r).abs() <= self.config.consistency_tolerance * 1f64.max(l.abs()).max(r.abs())
    }
}

/// An equation after the knowns have been substituted in.
struct Pinned {
    label: String,
    lhs: Expr,
    rhs: Expr,
}

impl EquationSolver for NewtonSolver {
    fn solve(&self, system: &EquationSystem) -> Result<Vec<Candidate>, SolverError> {
        let known = |name: &str| system.known(name);
        let mut unknowns: Vec<String> = system
            .unknowns()
            .iter()
            .filter(|u| system.known(u).is_none())
            .cloned()
            .collect();
        let mut active: Vec<Pinned> = Vec::new();

        for eq in system.equations() {
            let lhs = eq.lhs.substitute(&known);
            let rhs = eq.rhs.substitute(&known);
            let mut free = lhs.variables();
            for v in rhs.variables() {
                if !free.contains(&v) {
                    free.push(v);
                }
            }
            if free.is_empty() {
                let closed = |_: &str| None::<f64>;
                let l = lhs.eval(&closed).unwrap_or(f64::NAN);
                let r = rhs.eval(&closed).unwrap_or(f64::NAN);
                if !self.consistent(l, r) {
                    debug!(equation = %eq.label, lhs = l, rhs = r, "known values contradict equation");
                    return Err(SolverError::Contradiction {
                        equation: eq.label.clone(),
                    });
                }
                continue;
            }
            for v in free {
                if !unknowns.contains(&v) {
                    unknowns.push(v);
                }
            }
            active.push(Pinned {
                label: eq.label.clone(),
                lhs,
                rhs,
            });
        }

        if unknowns.is_empty() {
            return Ok(vec![Candidate::new()]);
        }

        let eq_vars: Vec<Vec<usize>> = active
            .iter()
            .map(|p| {
                let mut vars: Vec<usize> = unknowns
                    .iter()
                    .enumerate()
                    .filter(|(_, u)| p.lhs.contains_var(u) || p.rhs.contains_var(u))
                    .map(|(i, _)| i)
                    .collect();
                vars.sort_unstable();
                vars
            })
            .collect();

        let layout = structure::analyze(unknowns.len(), &eq_vars).map_err(|free| {
            SolverError::Underdetermined {
                unresolved: free.iter().map(|&u| unknowns[u].clone()).collect(),
            }
        })?;
        debug!(
            unknowns = unknowns.len(),
            equations = active.len(),
            blocks = layout.blocks.len(),
            surplus = layout.surplus.len(),
            "decomposed equation system"
        );

        let magnitudes = self.magnitudes(system);
        let mut partials: Vec<Vec<f64>> = vec![vec![f64::NAN; unknowns.len()]];
        for block in &layout.blocks {
            let mut next = Vec::new();
            for partial in &partials {
                let roots = self.solve_block(block, &active, &unknowns, partial, &magnitudes)?;
                for root in roots {
                    let mut extended = partial.clone();
                    for (k, &u) in block.unknowns.iter().enumerate() {
                        extended[u] = root[k];
                    }
                    next.push(extended);
                    if next.len() > self.config.max_candidates {
                        return Err(SolverError::TooManyCandidates {
                            limit: self.config.max_candidates,
                        });
                    }
                }
            }
            partials = next;
            if partials.is_empty() {
                break;
            }
        }

        // Surplus equations were never solved for; they only filter.
        partials.retain(|values| {
            let env = |name: &str| {
                unknowns
                    .iter()
                    .position(|u| u == name)
                    .map(|i| values[i])
            };
            layout.surplus.iter().all(|&e| {
                let p = &active[e];
                match (p.lhs.eval(&env), p.rhs.eval(&env)) {
                    (Ok(l), Ok(r)) => {
                        let ok = self.consistent(l, r);
                        if !ok {
                            trace!(equation = %p.label, lhs = l, rhs = r, "surplus equation rejects candidate");
                        }
                        ok
                    }
                    _ => false,
                }
            })
        });

        partials.sort_by(|a, b| lexicographic(a, b));
        partials.dedup_by(|a, b| same_root(a, b));
        debug!(candidates = partials.len(), "solved equation system");

        Ok(partials
            .into_iter()
            .map(|values| unknowns.iter().cloned().zip(values).collect())
            .collect())
    }

    fn name(&self) -> &str {
        "newton"
    }
}

// ── Block solving ──────────────────────────────────────────────────

/// One block's equations, restricted to the block's own unknowns.
struct BlockSystem {
    vars: Vec<String>,
    lhs: Vec<Expr>,
    rhs: Vec<Expr>,
    /// `jacobian[i][k] = d(lhs_i - rhs_i) / d vars[k]`.
    jacobian: Vec<Vec<Expr>>,
    /// Fixed per-equation magnitude dividing each residual.
    scales: Vec<f64>,
    tolerance: f64,
}

enum Outcome {
    Root(Vec<f64>),
    Singular,
    Diverged,
}

impl BlockSystem {
    fn lookup<'x>(&'x self, x: &'x [f64]) -> impl Fn(&str) -> Option<f64> + 'x {
        move |name: &str| self.vars.iter().position(|v| *v == name).map(|k| x[k])
    }

    /// Residuals and their scaled Euclidean norm, or `None` if anything
    /// is undefined at `x`.
    fn residuals(&self, x: &[f64]) -> Option<(Vec<f64>, f64)> {
        let env = self.lookup(x);
        let mut f = Vec::with_capacity(self.lhs.len());
        let mut sum = 0.0f64;
        for ((l, r), scale) in self.lhs.iter().zip(&self.rhs).zip(&self.scales) {
            let value = l.eval(&env).ok()? - r.eval(&env).ok()?;
            if !value.is_finite() {
                return None;
            }
            sum += (value / scale).powi(2);
            f.push(value);
        }
        Some((f, sum.sqrt()))
    }

    fn vanishes_identically(&self) -> bool {
        let n = self.vars.len();
        (0..SAMPLE_POINTS.len()).all(|j| {
            let x: Vec<f64> = (0..n)
                .map(|k| SAMPLE_POINTS[(j + k) % SAMPLE_POINTS.len()])
                .collect();
            matches!(self.residuals(&x), Some((_, norm)) if norm <= self.tolerance)
        })
    }

    /// The least-squares Newton correction at `x` and the numerical rank
    /// of the Jacobian there.
    fn linearize(&self, x: &[f64]) -> Option<(Vec<f64>, usize)> {
        let (f, _) = self.residuals(x)?;
        let env = self.lookup(x);
        let (m, n) = (self.lhs.len(), self.vars.len());
        let mut jac = Matrix::new(m, n);
        let mut rhs = Matrix::new(m, 1);
        for (i, row) in self.jacobian.iter().enumerate() {
            for (k, d) in row.iter().enumerate() {
                let v = d.eval(&env).ok().filter(|v| v.is_finite())?;
                jac[(i, k)] = v;
            }
            rhs[(i, 0)] = -f[i];
        }
        let mut step = Matrix::new(n, 1);
        let mut ws = LeastSquaresWorkspace::new(m, n);
        let info = jac.solve_least_squares_into(&rhs, &mut step, &mut ws).ok()?;
        Some(((0..n).map(|k| step[(k, 0)]).collect(), info.rank))
    }

    fn rank_deficient_at(&self, x: &[f64]) -> bool {
        self.linearize(x).is_none_or(|(_, rank)| rank < x.len())
    }

    /// Whether one more Newton step from `x` would still move it far,
    /// as it does on a residual that only vanishes at infinity.
    fn drifting_at(&self, x: &[f64]) -> bool {
        self.linearize(x)
            .is_some_and(|(step, _)| relative_step(&step, x) > MODEST_STEP)
    }

    /// Residuals lowered for the numeric backend, one per equation.
    fn lowered(&self) -> Vec<Exp> {
        self.lhs
            .iter()
            .zip(&self.rhs)
            .map(|(l, r)| Exp::sub(lower(l), lower(r)))
            .collect()
    }
}

/// A compiled block ready to run from any start point.
struct Backend {
    /// Stops as soon as the scaled residual norm is within tolerance.
    coarse: NewtonRaphsonSolver,
    /// Keeps descending from a coarse root until no step improves it.
    fine: NewtonRaphsonSolver,
    names: Vec<String>,
}

impl Backend {
    fn build(sys: &BlockSystem, config: &SolverConfig) -> Result<Self, String> {
        let compiled = Compiler::compile(&sys.lowered()).map_err(|e| e.to_string())?;
        let names = compiled.variable_names().to_vec();
        let options = |tolerance: f64| SolverOptions {
            max_iterations: config.max_iterations as usize,
            residual_tolerance: tolerance,
            max_backtracks: MAX_BACKTRACKS,
        };
        let coarse = NewtonRaphsonSolver::new(compiled.clone())
            .with_options(options(config.residual_tolerance))
            .with_equation_scales(sys.scales.clone())
            .map_err(|e| e.to_string())?;
        let fine = NewtonRaphsonSolver::new(compiled)
            .with_options(options(f64::MIN_POSITIVE))
            .with_equation_scales(sys.scales.clone())
            .map_err(|e| e.to_string())?;
        Ok(Self {
            coarse,
            fine,
            names,
        })
    }

    fn run(&self, sys: &BlockSystem, start: &[f64]) -> Outcome {
        let guess = |x: &[f64]| -> HashMap<String, f64> {
            self.names
                .iter()
                .filter_map(|name| {
                    let k = sys.vars.iter().position(|v| v == name)?;
                    Some((name.clone(), x[k]))
                })
                .collect()
        };
        let read = |values: &HashMap<String, f64>| -> Vec<f64> {
            sys.vars
                .iter()
                .zip(start)
                .map(|(v, &s)| values.get(v).copied().unwrap_or(s))
                .collect()
        };

        let mut ws = self.coarse.workspace();
        let solution = match self.coarse.solve(guess(start), &mut ws) {
            Ok(solution) => solution,
            Err(NewtonError::StationaryNonRoot(d))
                if d.last_linear_attempt
                    .is_some_and(|info| info.rank < sys.vars.len()) =>
            {
                trace!(?start, "singular jacobian");
                return Outcome::Singular;
            }
            Err(e) => {
                trace!(?start, error = %e, "start point diverged");
                return Outcome::Diverged;
            }
        };
        trace!(
            ?start,
            iterations = solution.iterations,
            residual = solution.error,
            "coarse root"
        );

        let mut ws = self.fine.workspace();
        let polished = match self.fine.solve(solution.values.clone(), &mut ws) {
            Ok(fine) => fine.values,
            Err(NewtonError::NoConvergence(d) | NewtonError::StationaryNonRoot(d))
                if d.error <= solution.error =>
            {
                d.values
            }
            Err(_) => solution.values,
        };
        Outcome::Root(read(&polished))
    }
}

impl NewtonSolver {
    fn solve_block(
        &self,
        block: &Block,
        active: &[Pinned],
        unknowns: &[String],
        partial: &[f64],
        magnitudes: &[f64],
    ) -> Result<Vec<Vec<f64>>, SolverError> {
        let solved = |name: &str| {
            unknowns
                .iter()
                .position(|u| u == name)
                .map(|i| partial[i])
                .filter(|v| !v.is_nan())
        };
        let vars: Vec<String> = block.unknowns.iter().map(|&u| unknowns[u].clone()).collect();
        let mut lhs = Vec::with_capacity(block.equations.len());
        let mut rhs = Vec::with_capacity(block.equations.len());
        let mut jacobian = Vec::with_capacity(block.equations.len());
        let mut scales = Vec::with_capacity(block.equations.len());
        for &e in &block.equations {
            let l = active[e].lhs.substitute(&solved);
            let r = active[e].rhs.substitute(&solved);
            let residual = l.clone() - r.clone();
            jacobian.push(vars.iter().map(|v| residual.derivative(v)).collect());
            scales.push(largest_constant(&residual).max(1.0));
            lhs.push(l);
            rhs.push(r);
        }
        let sys = BlockSystem {
            vars,
            lhs,
            rhs,
            jacobian,
            scales,
            tolerance: self.config.residual_tolerance,
        };

        let underdetermined = || SolverError::Underdetermined {
            unresolved: sys.vars.clone(),
        };
        if sys.vanishes_identically() {
            return Err(underdetermined());
        }

        let backend = Backend::build(&sys, &self.config).map_err(|reason| SolverError::Numeric {
            block: sys.vars.clone(),
            reason,
        })?;

        let n = sys.vars.len();
        let mut roots: Vec<Vec<f64>> = Vec::new();
        let mut singular = 0usize;
        let starts = self.starts(n, magnitudes);
        for start in &starts {
            match backend.run(&sys, start) {
                Outcome::Root(x) => {
                    if sys.drifting_at(&x) {
                        trace!(root = ?x, "root keeps moving, discarded");
                        continue;
                    }
                    let snapped: Vec<f64> = x.iter().map(|&v| snap(v)).collect();
                    let root = match sys.residuals(&snapped) {
                        Some((_, norm)) if norm <= self.config.residual_tolerance => snapped,
                        _ => x,
                    };
                    if !roots.iter().any(|r| same_root(r, &root)) {
                        roots.push(root);
                    }
                }
                Outcome::Singular => singular += 1,
                Outcome::Diverged => {}
            }
        }

        if n > 1 {
            if roots.is_empty() && singular == starts.len() {
                return Err(underdetermined());
            }
            if roots.iter().any(|r| sys.rank_deficient_at(r)) {
                return Err(underdetermined());
            }
        }

        roots.sort_by(|a, b| lexicographic(a, b));
        debug!(
            block = ?sys.vars,
            roots = roots.len(),
            starts = starts.len(),
            "solved block"
        );
        Ok(roots)
    }

    /// Positive start magnitudes: configured points plus the sizes (and
    /// square roots) of known values, ascending and deduplicated.
    fn magnitudes(&self, system: &EquationSystem) -> Vec<f64> {
        let mut mags = self.config.start_points.clone();
        for v in system.knowns().values().take(MAX_KNOWN_SCALES) {
            let a = v.abs();
            if a.is_finite() && a > 0.0 {
                mags.push(a);
                mags.push(a.sqrt());
            }
        }
        mags.sort_by(f64::total_cmp);
        mags.dedup_by(|a, b| (*a - *b).abs() <= 1e-9 * b.abs());
        mags
    }

    /// Zero, then every magnitude under each sign pattern (capped).
    fn starts(&self, n: usize, magnitudes: &[f64]) -> Vec<Vec<f64>> {
        let patterns = 1usize
            .checked_shl(n as u32)
            .unwrap_or(usize::MAX)
            .min(self.config.max_sign_patterns);
        let mut starts = vec![vec![0.0; n]];
        for &m in magnitudes {
            for p in 0..patterns {
                starts.push(
                    (0..n)
                        .map(|k| if (p >> k) & 1 == 1 { -m } else { m })
                        .collect(),
                );
            }
        }
        starts
    }
}

// ── Lowering ───────────────────────────────────────────────────────

/// Rewrite an expression in the backend's smaller vocabulary.
fn lower(e: &Expr) -> Exp {
    match e {
        Expr::Const(v) => Exp::val(*v),
        Expr::Var(name) => Exp::var(name.as_str()),
        Expr::Neg(inner) => Exp::neg(lower(inner)),
        Expr::Binary { op, lhs, rhs } => {
            let l = lower(lhs);
            match op {
                BinOp::Add => Exp::add(l, lower(rhs)),
                BinOp::Sub => Exp::sub(l, lower(rhs)),
                BinOp::Mul => Exp::mul(l, lower(rhs)),
                BinOp::Div => Exp::div(l, lower(rhs)),
                BinOp::Pow => match rhs.as_const() {
                    Some(c) => Exp::power(l, c),
                    None => Exp::exp(Exp::mul(lower(rhs), Exp::ln(l))),
                },
            }
        }
        Expr::Call { func, arg } => {
            let x = lower(arg);
            match func {
                Func::Sqrt => Exp::power(x, 0.5),
                Func::Exp => Exp::exp(x),
                Func::Ln => Exp::ln(x),
                Func::Log10 => Exp::div(Exp::ln(x), Exp::val(std::f64::consts::LN_10)),
                Func::Sin => Exp::sin(x),
                Func::Cos => Exp::cos(x),
                Func::Tan => Exp::div(Exp::sin(x.clone()), Exp::cos(x)),
                Func::Abs => Exp::power(Exp::power(x, 2.0), 0.5),
            }
        }
    }
}

fn largest_constant(e: &Expr) -> f64 {
    match e {
        Expr::Const(v) if v.is_finite() => v.abs(),
        Expr::Const(_) | Expr::Var(_) => 0.0,
        Expr::Neg(inner) => largest_constant(inner),
        Expr::Binary { lhs, rhs, .. } => largest_constant(lhs).max(largest_constant(rhs)),
        Expr::Call { arg, .. } => largest_constant(arg),
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn relative_step(dx: &[f64], x: &[f64]) -> f64 {
    dx.iter()
        .zip(x)
        .map(|(d, v)| d.abs() / v.abs().max(1.0))
        .fold(0.0, f64::max)
}

fn same_root(a: &[f64], b: &[f64]) -> bool {
    a.iter()
        .zip(b)
        .all(|(x, y)| (x - y).abs() <= SAME_ROOT * x.abs().max(y.abs()).max(1.0))
}

fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() <= SNAP * v.abs().max(1.0) {
        r + 0.0
    } else {
        v
    }
}

fn lexicographic(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}
