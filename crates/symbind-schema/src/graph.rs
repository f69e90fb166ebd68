//! Field/rule dependency graph.
//!
//! A bipartite view over the schema: one node per field, one per rule.
//! Equation rules are linked to every field they mention in both
//! directions, since the solver may run them either way. Forward rules get
//! directed edges only, from each parameter into the rule and from the
//! rule into its target.
//!
//! The graph is never used to solve anything. The engine asks it whether
//! a forward rule is ready, which roots sit upstream of a changed field,
//! and the compiler asks it for forward-only cycles.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use symbind_core::{FieldId, FieldSet, FieldSpec};

use crate::schema::Rule;

/// A node of the dependency graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphNode {
    /// A declared field.
    Field(FieldId),
    /// The rule defining `target`.
    Rule {
        /// The rule's target field.
        target: FieldId,
        /// Whether the rule is an equation.
        invertible: bool,
    },
}

/// Role a field plays for the rule at the other end of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// The field the rule defines.
    Target,
    /// A field referenced by an equation.
    Operand,
    /// A parameter of a forward function.
    Parameter,
}

/// Dependency graph derived from a schema's rules.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, Role>,
    field_nodes: Vec<NodeIndex>,
    rule_nodes: Vec<Option<NodeIndex>>,
    roots: FieldSet,
    equation_fields: FieldSet,
    forward_targets: FieldSet,
}

impl DependencyGraph {
    /// Build the graph for `fields` and the `rules` defining them.
    pub fn build(fields: &[FieldSpec], rules: &[Rule]) -> Self {
        let mut graph = DiGraph::new();
        let field_nodes: Vec<NodeIndex> = fields
            .iter()
            .map(|f| graph.add_node(GraphNode::Field(f.id)))
            .collect();
        let mut rule_nodes = vec![None; fields.len()];
        let mut equation_fields = FieldSet::empty();
        let mut forward_targets = FieldSet::empty();

        for rule in rules {
            let invertible = rule.is_invertible();
            let r = graph.add_node(GraphNode::Rule {
                target: rule.target,
                invertible,
            });
            rule_nodes[rule.target.index()] = Some(r);
            let t = field_nodes[rule.target.index()];
            if invertible {
                equation_fields.insert(rule.target);
                graph.add_edge(r, t, Role::Target);
                graph.add_edge(t, r, Role::Target);
                for &input in rule.inputs() {
                    equation_fields.insert(input);
                    let i = field_nodes[input.index()];
                    graph.add_edge(r, i, Role::Operand);
                    graph.add_edge(i, r, Role::Operand);
                }
            } else {
                forward_targets.insert(rule.target);
                graph.add_edge(r, t, Role::Target);
                for &input in rule.inputs() {
                    graph.add_edge(field_nodes[input.index()], r, Role::Parameter);
                }
            }
        }

        let roots = fields.iter().filter(|f| f.root).map(|f| f.id).collect();
        Self {
            graph,
            field_nodes,
            rule_nodes,
            roots,
            equation_fields,
            forward_targets,
        }
    }

    /// Number of nodes (fields plus rules).
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every field mentioned by at least one equation rule, as target or
    /// operand.
    pub fn equation_fields(&self) -> &FieldSet {
        &self.equation_fields
    }

    /// Targets of forward rules.
    pub fn forward_targets(&self) -> &FieldSet {
        &self.forward_targets
    }

    /// Fields with no rule.
    pub fn roots(&self) -> &FieldSet {
        &self.roots
    }

    fn rule_inputs(&self, target: FieldId, role: Role) -> impl Iterator<Item = FieldId> + '_ {
        self.rule_nodes
            .get(target.index())
            .copied()
            .flatten()
            .into_iter()
            .flat_map(move |r| {
                self.graph
                    .edges_directed(r, Direction::Incoming)
                    .filter(move |e| *e.weight() == role)
                    .filter_map(move |e| match self.graph[e.source()] {
                        GraphNode::Field(id) => Some(id),
                        GraphNode::Rule { .. } => None,
                    })
            })
    }

    /// Parameters of the forward rule for `target` that are not yet in
    /// `known`, in ascending field order. Empty when the rule is ready or
    /// `target` has no forward rule.
    pub fn missing_parameters(&self, target: FieldId, known: &FieldSet) -> Vec<FieldId> {
        let mut missing: Vec<FieldId> = self
            .rule_inputs(target, Role::Parameter)
            .filter(|p| !known.contains(*p))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    /// Whether every parameter of the forward rule for `target` is known.
    pub fn is_ready(&self, target: FieldId, known: &FieldSet) -> bool {
        self.rule_inputs(target, Role::Parameter)
            .all(|p| known.contains(p))
    }

    /// Roots lying upstream of `field` through equation rules: if `field`
    /// is an equation target, its operands, their operands if they are
    /// equation targets in turn, and so on. Only roots are returned.
    pub fn upstream_roots(&self, field: FieldId) -> FieldSet {
        let mut seen = FieldSet::empty();
        let mut stack = vec![field];
        while let Some(f) = stack.pop() {
            let Some(&node) = self.field_nodes.get(f.index()) else {
                continue;
            };
            for edge in self.graph.edges_directed(node, Direction::Incoming) {
                if *edge.weight() != Role::Target {
                    continue;
                }
                if !matches!(
                    self.graph[edge.source()],
                    GraphNode::Rule {
                        invertible: true,
                        ..
                    }
                ) {
                    continue;
                }
                for operand in self
                    .graph
                    .edges_directed(edge.source(), Direction::Outgoing)
                    .filter(|e| *e.weight() == Role::Operand)
                {
                    if let GraphNode::Field(id) = self.graph[operand.target()] {
                        if seen.insert(id) {
                            stack.push(id);
                        }
                    }
                }
            }
        }
        seen.intersection(&self.roots)
    }

    /// Cycles formed purely by forward rules, each as a list of fields in
    /// ascending order. A forward rule listing its own target as a
    /// parameter is a cycle of one.
    pub fn forward_cycles(&self) -> Vec<Vec<FieldId>> {
        let mut forward: DiGraphMap<FieldId, ()> = DiGraphMap::new();
        for edge in self.graph.edge_references() {
            if *edge.weight() != Role::Parameter {
                continue;
            }
            let (GraphNode::Field(param), GraphNode::Rule { target, .. }) =
                (self.graph[edge.source()], self.graph[edge.target()])
            else {
                continue;
            };
            forward.add_edge(param, target, ());
        }
        tarjan_scc(&forward)
            .into_iter()
            .filter(|scc| scc.len() > 1 || forward.contains_edge(scc[0], scc[0]))
            .map(|mut scc| {
                scc.sort_unstable();
                scc
            })
            .collect()
    }
}
