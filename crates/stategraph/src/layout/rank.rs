//! Rank assignment: cycle breaking and longest-path layering.

use std::collections::HashSet;

use log::{debug, error};
use petgraph::{
    algo::toposort,
    graph::{DiGraph, NodeIndex},
    visit::{Control, DfsEvent, depth_first_search},
};

use stategraph_core::graph::Graph;

/// An edge of the graph oriented from its lower-rank endpoint to its
/// higher-rank endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct RankedEdge {
    /// Insertion index of the edge in the graph.
    pub edge: usize,
    /// Node index of the endpoint on the lower rank.
    pub upper: usize,
    /// Node index of the endpoint on the higher rank.
    pub lower: usize,
    /// True if the edge was reversed to break a cycle.
    pub reversed: bool,
}

#[derive(Debug, Clone, Default)]
pub(super) struct Ranking {
    /// Rank of every node, indexed by node insertion index.
    pub ranks: Vec<usize>,
    /// Every edge with resolved endpoints, in graph edge order.
    pub edges: Vec<RankedEdge>,
}

impl Ranking {
    pub fn rank_count(&self) -> usize {
        self.ranks.iter().max().map_or(0, |max| max + 1)
    }
}

/// Assigns a rank to every node of `graph`.
///
/// Back-edges found by a depth-first traversal (from the start node first,
/// then from every unvisited node in insertion order) are reversed, which
/// leaves a DAG. Ranks are then the longest path from any source of that DAG.
pub(super) fn assign_ranks(graph: &Graph) -> Ranking {
    let mut digraph =
        DiGraph::<usize, usize>::with_capacity(graph.node_count(), graph.edge_count());
    let indices: Vec<NodeIndex> = (0..graph.node_count()).map(|i| digraph.add_node(i)).collect();

    let mut endpoints = Vec::with_capacity(graph.edge_count());
    for (edge_idx, edge) in graph.edges().enumerate() {
        let (Some(source), Some(target)) = (
            graph.node_index(edge.source().as_str()),
            graph.node_index(edge.target().as_str()),
        ) else {
            if cfg!(debug_assertions) {
                panic!("Edge {} references a node missing from the graph", edge.id());
            }
            error!(edge:% = edge.id(); "Skipping edge with missing endpoint");
            continue;
        };
        digraph.add_edge(indices[source], indices[target], edge_idx);
        endpoints.push((edge_idx, source, target));
    }

    let back_edges = find_back_edges(&digraph, graph);

    let mut dag = DiGraph::<usize, ()>::with_capacity(graph.node_count(), endpoints.len());
    for i in 0..graph.node_count() {
        dag.add_node(i);
    }

    let edges: Vec<RankedEdge> = endpoints
        .into_iter()
        .map(|(edge, source, target)| {
            let reversed = back_edges.contains(&(source, target));
            let (upper, lower) = if reversed {
                (target, source)
            } else {
                (source, target)
            };
            dag.add_edge(indices[upper], indices[lower], ());
            RankedEdge {
                edge,
                upper,
                lower,
                reversed,
            }
        })
        .collect();

    let order = match toposort(&dag, None) {
        Ok(order) => order,
        Err(cycle) => {
            error!(node = cycle.node_id().index(); "Cycle left after back-edge reversal");
            dag.node_indices().collect()
        }
    };

    let mut ranks = vec![0; graph.node_count()];
    for node in order {
        let rank = ranks[node.index()];
        for successor in dag.neighbors(node) {
            let successor_rank = &mut ranks[successor.index()];
            *successor_rank = (*successor_rank).max(rank + 1);
        }
    }

    debug!(
        nodes = ranks.len(),
        edges = edges.len(),
        reversed = back_edges.len();
        "Ranks assigned"
    );

    Ranking { ranks, edges }
}

fn find_back_edges(digraph: &DiGraph<usize, usize>, graph: &Graph) -> HashSet<(usize, usize)> {
    let starts = graph
        .start_id()
        .and_then(|id| graph.node_index(id.as_str()))
        .into_iter()
        .chain(0..graph.node_count())
        .map(NodeIndex::new);

    let mut back_edges = HashSet::new();
    depth_first_search(digraph, starts, |event| {
        if let DfsEvent::BackEdge(source, target) = event {
            back_edges.insert((source.index(), target.index()));
        }
        Control::<()>::Continue
    });
    back_edges
}
