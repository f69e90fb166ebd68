//! Structural analysis of an equation system.
//!
//! Works purely on the incidence pattern (which unknowns appear in which
//! equations), before any numbers are involved:
//!
//! 1. A maximum matching pairs unknowns with equations that can
//!    determine them.
//! 2. Unknowns reachable by an alternating path from an unmatched unknown
//!    can be traded for it freely, so none of them is determined.
//! 3. The matched square part is split into strongly connected blocks,
//!    ordered so every block comes after the blocks it depends on.
//! 4. Unmatched equations are surplus; they filter candidates afterwards.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

/// A strongly connected set of unknowns with the equations matched to
/// them. Both lists are ascending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Block {
    pub unknowns: Vec<usize>,
    pub equations: Vec<usize>,
}

/// Result of a successful analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Structure {
    /// Blocks in solve order.
    pub blocks: Vec<Block>,
    /// Equations left over after matching.
    pub surplus: Vec<usize>,
}

/// Analyze `eq_vars[e]` = unknowns appearing in equation `e`.
///
/// Returns the undetermined unknowns (ascending) as `Err`.
pub(crate) fn analyze(n_unknowns: usize, eq_vars: &[Vec<usize>]) -> Result<Structure, Vec<usize>> {
    let (unknown_match, eq_match) = max_matching(n_unknowns, eq_vars);

    let free = undetermined(&unknown_match, &eq_match, eq_vars);
    if !free.is_empty() {
        return Err(free);
    }

    let surplus: Vec<usize> = (0..eq_vars.len()).filter(|&e| eq_match[e].is_none()).collect();

    // Edge u -> v: the equation matched to `u` also mentions `v`, so `u`
    // cannot be solved before `v`.
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(n_unknowns, 0);
    let nodes: Vec<NodeIndex> = (0..n_unknowns).map(|u| graph.add_node(u)).collect();
    for (e, vars) in eq_vars.iter().enumerate() {
        let Some(u) = eq_match[e] else {
            continue;
        };
        for &v in vars {
            if v != u {
                graph.update_edge(nodes[u], nodes[v], ());
            }
        }
    }

    // Tarjan yields components dependencies-first for these edges.
    let blocks = tarjan_scc(&graph)
        .into_iter()
        .map(|component| {
            let mut unknowns: Vec<usize> = component.iter().map(|n| graph[*n]).collect();
            unknowns.sort_unstable();
            let mut equations: Vec<usize> = unknowns
                .iter()
                .filter_map(|&u| unknown_match[u])
                .collect();
            equations.sort_unstable();
            Block {
                unknowns,
                equations,
            }
        })
        .collect();

    Ok(Structure { blocks, surplus })
}

/// Kuhn's augmenting-path matching. Returns `(unknown -> equation,
/// equation -> unknown)`.
fn max_matching(n_unknowns: usize, eq_vars: &[Vec<usize>]) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
    let mut unknown_match = vec![None; n_unknowns];
    let mut eq_match = vec![None; eq_vars.len()];
    for e in 0..eq_vars.len() {
        let mut visited = vec![false; n_unknowns];
        augment(e, eq_vars, &mut visited, &mut unknown_match, &mut eq_match);
    }
    (unknown_match, eq_match)
}

fn augment(
    e: usize,
    eq_vars: &[Vec<usize>],
    visited: &mut [bool],
    unknown_match: &mut [Option<usize>],
    eq_match: &mut [Option<usize>],
) -> bool {
    for &u in &eq_vars[e] {
        if visited[u] {
            continue;
        }
        visited[u] = true;
        let free = match unknown_match[u] {
            None => true,
            Some(other) => augment(other, eq_vars, visited, unknown_match, eq_match),
        };
        if free {
            unknown_match[u] = Some(e);
            eq_match[e] = Some(u);
            return true;
        }
    }
    false
}

/// Unknowns reachable from an unmatched unknown along alternating paths
/// (unknown -> any equation mentioning it -> that equation's matched
/// unknown -> ...).
fn undetermined(
    unknown_match: &[Option<usize>],
    eq_match: &[Option<usize>],
    eq_vars: &[Vec<usize>],
) -> Vec<usize> {
    let n = unknown_match.len();
    let mut eqs_of: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (e, vars) in eq_vars.iter().enumerate() {
        for &u in vars {
            eqs_of[u].push(e);
        }
    }

    let mut reached = vec![false; n];
    let mut stack: Vec<usize> = (0..n).filter(|&u| unknown_match[u].is_none()).collect();
    for &u in &stack {
        reached[u] = true;
    }
    while let Some(u) = stack.pop() {
        for &e in &eqs_of[u] {
            if let Some(w) = eq_match[e] {
                if !reached[w] {
                    reached[w] = true;
                    stack.push(w);
                }
            }
        }
    }
    (0..n).filter(|&u| reached[u]).collect()
}
