//! Reconciliation phase support: dependency-ordered resolution plus
//! collision push-out accumulation.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::ident::AnyHandle;
use crate::ports::Vec3;

/// Errors surfaced by [`DependencyGraph::topological_order`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconciliationError {
    /// One or more nodes could not be ordered because they participate in a
    /// dependency cycle. The cycle's nodes are skipped entirely rather than
    /// failing the whole reconciliation pass; this variant is informational
    /// and carries how many nodes were skipped.
    #[error("{skipped_count} node(s) skipped due to a dependency cycle")]
    CycleDetected {
        /// Count of nodes excluded from the returned order.
        skipped_count: usize,
    },
}

/// Result of a topological sort that may have skipped cyclic nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopoSortResult<N> {
    /// Nodes in dependency order: every edge `a -> b` places `a` before `b`.
    pub order: Vec<N>,
    /// Nodes excluded because they belong to a cycle.
    pub skipped: Vec<N>,
}

/// A directed graph of "must be resolved before" edges between entities (or
/// any other orderable key), ordered with Kahn's algorithm.
///
/// Edges are added fresh each tick; a cycle never causes reconciliation to
/// fail outright — the cyclic subgraph is excluded from the returned order
/// and reported via [`TopoSortResult::skipped`], while every acyclic node
/// still resolves normally.
pub struct DependencyGraph<N> {
    nodes: Vec<N>,
    edges: Vec<(N, N)>,
}

impl<N: Clone + Eq + Hash> DependencyGraph<N> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Registers `node`, if not already present. Nodes with no edges still
    /// appear in the topological order.
    pub fn add_node(&mut self, node: N) {
        if !self.nodes.contains(&node) {
            self.nodes.push(node);
        }
    }

    /// Declares that `before` must be resolved before `after`.
    pub fn add_edge(&mut self, before: N, after: N) {
        self.add_node(before.clone());
        self.add_node(after.clone());
        self.edges.push((before, after));
    }

    /// Computes a topological order via Kahn's algorithm. Nodes with equal
    /// in-degree at any step are dequeued in the order they were added to
    /// the graph, keeping the result deterministic.
    ///
    /// Never fails: a dependency cycle excludes its nodes from `order` and
    /// reports them in `skipped` instead of aborting reconciliation for the
    /// rest of the graph. Callers that want this surfaced as a tick-level
    /// diagnostic should check `skipped` and construct a
    /// [`ReconciliationError::CycleDetected`] themselves.
    pub fn topological_order(&self) -> TopoSortResult<N> {
        let mut in_degree: HashMap<&N, usize> = self.nodes.iter().map(|n| (n, 0)).collect();
        let mut adjacency: HashMap<&N, Vec<&N>> = HashMap::new();
        for (before, after) in &self.edges {
            *in_degree.get_mut(after).unwrap_or(&mut 0) += 1;
            adjacency.entry(before).or_default().push(after);
        }

        let mut queue: VecDeque<&N> = self
            .nodes
            .iter()
            .filter(|n| in_degree.get(n).copied().unwrap_or(0) == 0)
            .collect();

        let mut order: Vec<N> = Vec::with_capacity(self.nodes.len());
        while let Some(node) = queue.pop_front() {
            order.push(node.clone());
            if let Some(neighbors) = adjacency.get(node) {
                for &next in neighbors {
                    if let Some(degree) = in_degree.get_mut(next) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(next);
                        }
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            return TopoSortResult {
                order,
                skipped: Vec::new(),
            };
        }

        let ordered_set: std::collections::HashSet<&N> = order.iter().collect();
        let skipped: Vec<N> = self
            .nodes
            .iter()
            .filter(|n| !ordered_set.contains(n))
            .cloned()
            .collect();
        TopoSortResult { order, skipped }
    }
}

impl<N: Clone + Eq + Hash> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates per-entity push-out vectors from overlapping collision pairs
/// across one Reconciliation pass, so multiple overlaps affecting the same
/// entity sum rather than overwrite.
#[derive(Default)]
pub struct PushOutAccumulator {
    totals: FxHashMap<AnyHandle, Vec3>,
}

impl PushOutAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` to `entity`'s accumulated push-out vector.
    pub fn accumulate(&mut self, entity: AnyHandle, delta: Vec3) {
        let total = self.totals.entry(entity).or_insert(Vec3::ZERO);
        *total = total.add(&delta);
    }

    /// The accumulated push-out vector for `entity`, or the zero vector if
    /// none was recorded.
    #[must_use]
    pub fn total_for(&self, entity: AnyHandle) -> Vec3 {
        self.totals.get(&entity).copied().unwrap_or(Vec3::ZERO)
    }

    /// Every entity with a non-empty accumulated push-out, in unspecified
    /// order; callers that need determinism should sort by
    /// [`AnyHandle::index`] before applying.
    #[must_use]
    pub fn entities(&self) -> Vec<AnyHandle> {
        self.totals.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn acyclic_graph_orders_by_dependency() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");
        let result = graph.topological_order();
        assert_eq!(result.order, vec!["a", "b", "c"]);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn isolated_node_appears_in_order() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b");
        graph.add_node("isolated");
        let result = graph.topological_order();
        assert!(result.order.contains(&"isolated"));
    }

    #[test]
    fn cycle_is_skipped_not_fatal() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");
        graph.add_edge("c", "d");
        let result = graph.topological_order();
        assert_eq!(result.order, vec!["c", "d"]);
        assert_eq!(result.skipped.len(), 2);
        assert!(result.skipped.contains(&"a"));
        assert!(result.skipped.contains(&"b"));
    }

    #[test]
    fn push_out_accumulates_across_multiple_pairs() {
        use crate::arena::HandleArena;
        let arena: HandleArena<()> = HandleArena::new();
        let a = arena.allocate(()).unwrap().erase();
        let mut acc = PushOutAccumulator::new();
        acc.accumulate(a, Vec3::new(1.0, 0.0, 0.0));
        acc.accumulate(a, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(acc.total_for(a).to_array(), [1.0, 1.0, 0.0]);
    }
}
