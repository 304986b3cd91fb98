//! Layered (Sugiyama-style) layout of state graphs.
//!
//! The [`LayoutEngine`] turns a [`Graph`] into a [`Layout`] in three phases:
//!
//! 1. **Ranking**: back-edges are reversed and every node gets a rank by
//!    longest path, so that transitions flow left to right.
//! 2. **Ordering**: edges spanning several ranks are split through virtual
//!    vertices and each rank is reordered with barycenter sweeps to reduce
//!    edge crossings.
//! 3. **Coordinates**: ranks become columns, orders become rows, and every
//!    edge gets a polyline route.
//!
//! Layout is a pure function of the graph structure and the engine settings:
//! labels and attributes never influence positions.

mod cache;
mod coords;
mod order;
mod rank;

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use indexmap::IndexMap;
use log::{debug, info};
use serde::Serialize;

use stategraph_core::{
    geometry::{Bounds, Point, Size},
    graph::{Edge, Graph},
    identifier::{EdgeId, NodeId},
};

use crate::config::LayoutConfig;

pub use cache::LayoutCache;

/// Where a node ended up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePlacement {
    rank: usize,
    order: usize,
    position: Point,
}

impl NodePlacement {
    /// Column index, 0 for the leftmost rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Row index among the real nodes of the rank, 0 for the topmost.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Center of the node rectangle.
    pub fn position(&self) -> Point {
        self.position
    }
}

/// Polyline an edge is drawn along.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRoute {
    points: Vec<Point>,
    reversed: bool,
}

impl EdgeRoute {
    /// Points from the source node boundary to the target node boundary.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// True for back-references, whose route runs right to left.
    pub fn reversed(&self) -> bool {
        self.reversed
    }

    /// Middle of the route, used to anchor edge labels.
    pub fn midpoint(&self) -> Option<Point> {
        let len = self.points.len();
        if len == 0 {
            return None;
        }
        if len % 2 == 1 {
            return Some(self.points[len / 2]);
        }
        Some(self.points[len / 2 - 1].midpoint(self.points[len / 2]))
    }
}

/// The positioned graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    node_size: Size,
    bounds: Bounds,
    rank_count: usize,
    crossings: usize,
    nodes: IndexMap<NodeId, NodePlacement>,
    edges: IndexMap<EdgeId, EdgeRoute>,
}

impl Layout {
    fn empty(node_size: Size) -> Self {
        Self {
            node_size,
            bounds: Bounds::default(),
            rank_count: 0,
            crossings: 0,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
        }
    }

    /// Size of every node rectangle.
    pub fn node_size(&self) -> Size {
        self.node_size
    }

    /// Bounds of the whole drawing, margin included.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn rank_count(&self) -> usize {
        self.rank_count
    }

    /// Edge crossings left after crossing reduction, virtual segments included.
    pub fn crossings(&self) -> usize {
        self.crossings
    }

    pub fn placement(&self, id: &str) -> Option<&NodePlacement> {
        self.nodes.get(id)
    }

    /// Center of the node with the given id.
    pub fn position(&self, id: &str) -> Option<Point> {
        self.nodes.get(id).map(NodePlacement::position)
    }

    /// Rectangle of the node with the given id.
    pub fn node_bounds(&self, id: &str) -> Option<Bounds> {
        self.position(id)
            .map(|center| Bounds::new_from_center(center, self.node_size))
    }

    pub fn rank(&self, id: &str) -> Option<usize> {
        self.nodes.get(id).map(NodePlacement::rank)
    }

    /// Placements in graph node order.
    pub fn placements(&self) -> impl ExactSizeIterator<Item = (&NodeId, &NodePlacement)> {
        self.nodes.iter()
    }

    /// `node id -> center` in graph node order.
    pub fn positions(&self) -> impl ExactSizeIterator<Item = (&NodeId, Point)> {
        self.nodes.iter().map(|(id, placement)| (id, placement.position))
    }

    pub fn route(&self, id: &str) -> Option<&EdgeRoute> {
        self.edges.get(id)
    }

    /// Routes in graph edge order.
    pub fn routes(&self) -> impl ExactSizeIterator<Item = (&EdgeId, &EdgeRoute)> {
        self.edges.iter()
    }

    /// Ids of the nodes of one rank, top to bottom.
    pub fn nodes_in_rank(&self, rank: usize) -> Vec<&NodeId> {
        let mut nodes: Vec<(&NodeId, usize)> = self
            .nodes
            .iter()
            .filter(|(_, placement)| placement.rank == rank)
            .map(|(id, placement)| (id, placement.order))
            .collect();
        nodes.sort_by_key(|(_, order)| *order);
        nodes.into_iter().map(|(id, _)| id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Layered layout engine.
///
/// # Examples
///
/// ```
/// use stategraph::{builder, input::GraphSource, layout::LayoutEngine};
///
/// let source = GraphSource::from_json(
///     r#"[ { "steps": [ { "page": "A" }, { "page": "B" }, { "page": "A" } ] } ]"#,
/// ).unwrap();
/// let graph = builder::build(&source);
///
/// let layout = LayoutEngine::new().layout(&graph);
/// assert_eq!(layout.rank("A"), Some(0));
/// assert_eq!(layout.rank("B"), Some(1));
/// assert!(layout.route("B->A").unwrap().reversed());
/// ```
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    node_size: Size,
    rank_gap: f32,
    node_gap: f32,
    margin: f32,
    ordering_passes: usize,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

impl LayoutEngine {
    /// Creates an engine with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine from a layout configuration. Negative sizes and
    /// gaps are treated as zero.
    pub fn from_config(config: &LayoutConfig) -> Self {
        let mut engine = Self {
            node_size: Size::default(),
            rank_gap: 0.0,
            node_gap: 0.0,
            margin: 0.0,
            ordering_passes: config.ordering_passes(),
        };
        engine
            .set_node_size(Size::new(config.node_width(), config.node_height()))
            .set_rank_gap(config.rank_gap())
            .set_node_gap(config.node_gap())
            .set_margin(config.margin());
        engine
    }

    /// Set the size of every node rectangle
    pub fn set_node_size(&mut self, size: Size) -> &mut Self {
        self.node_size = Size::new(size.width().max(0.0), size.height().max(0.0));
        self
    }

    /// Set the horizontal gap between ranks
    pub fn set_rank_gap(&mut self, gap: f32) -> &mut Self {
        self.rank_gap = gap.max(0.0);
        self
    }

    /// Set the vertical gap between nodes of a rank
    pub fn set_node_gap(&mut self, gap: f32) -> &mut Self {
        self.node_gap = gap.max(0.0);
        self
    }

    /// Set the margin around the drawing
    pub fn set_margin(&mut self, margin: f32) -> &mut Self {
        self.margin = margin.max(0.0);
        self
    }

    /// Set the number of crossing-reduction passes
    pub fn set_ordering_passes(&mut self, passes: usize) -> &mut Self {
        self.ordering_passes = passes;
        self
    }

    pub fn node_size(&self) -> Size {
        self.node_size
    }

    /// Lays out `graph`. Never fails; an empty graph gives an empty layout.
    pub fn layout(&self, graph: &Graph) -> Layout {
        if graph.is_empty() {
            debug!("Empty graph, nothing to lay out");
            return Layout::empty(self.node_size);
        }

        let ranking = rank::assign_ranks(graph);
        let mut layered = order::LayeredGraph::new(&ranking);
        let crossings = layered.reduce_crossings(self.ordering_passes);
        let coordinates = coords::assign_coordinates(&layered, self);

        let mut orders = vec![0; graph.node_count()];
        for rank in layered.ranks() {
            let real = rank.iter().filter(|&&vertex| !layered.is_virtual(vertex));
            for (order, &vertex) in real.enumerate() {
                orders[vertex] = order;
            }
        }

        let nodes: IndexMap<NodeId, NodePlacement> = graph
            .nodes()
            .enumerate()
            .map(|(idx, node)| {
                let placement = NodePlacement {
                    rank: ranking.ranks[idx],
                    order: orders[idx],
                    position: coordinates.centers[idx],
                };
                (node.id().clone(), placement)
            })
            .collect();

        let graph_edges: Vec<&Edge> = graph.edges().collect();
        let edges: IndexMap<EdgeId, EdgeRoute> = ranking
            .edges
            .iter()
            .zip(layered.chains())
            .map(|(ranked, chain)| {
                let route = EdgeRoute {
                    points: coords::route(
                        chain,
                        &coordinates.centers,
                        self.node_size,
                        ranked.reversed,
                    ),
                    reversed: ranked.reversed,
                };
                (graph_edges[ranked.edge].id().clone(), route)
            })
            .collect();

        let layout = Layout {
            node_size: self.node_size,
            bounds: coordinates.bounds,
            rank_count: ranking.rank_count(),
            crossings,
            nodes,
            edges,
        };

        info!(
            nodes = layout.nodes.len(),
            ranks = layout.rank_count,
            crossings = layout.crossings;
            "Layout calculated"
        );

        layout
    }

    /// Key identifying the layout of `graph` under these settings.
    pub fn fingerprint(&self, graph: &Graph) -> u64 {
        let mut hasher = DefaultHasher::new();
        graph.structural_fingerprint().hash(&mut hasher);
        for value in [
            self.node_size.width(),
            self.node_size.height(),
            self.rank_gap,
            self.node_gap,
            self.margin,
        ] {
            value.to_bits().hash(&mut hasher);
        }
        self.ordering_passes.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use stategraph_core::graph::Node;

    use super::*;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for id in nodes {
            graph.insert_node(Node::new(NodeId::new(*id), *id));
        }
        for (source, target) in edges {
            graph
                .insert_edge(Edge::new(NodeId::new(*source), NodeId::new(*target)))
                .unwrap();
        }
        if let Some(first) = nodes.first() {
            graph.set_start(first);
        }
        graph
    }

    /// Graph over `n` nodes named `n0..` from raw `(source, target)` index pairs,
    /// skipping self-loops and duplicates.
    fn indexed_graph(n: usize, pairs: &[(usize, usize)]) -> Graph {
        let mut graph = Graph::new();
        for i in 0..n {
            let id = format!("n{i}");
            graph.insert_node(Node::new(NodeId::new(id.as_str()), id));
        }
        for &(source, target) in pairs {
            let edge = Edge::new(
                NodeId::new(format!("n{}", source % n)),
                NodeId::new(format!("n{}", target % n)),
            );
            let _ = graph.insert_edge(edge);
        }
        graph.set_start("n0");
        graph
    }

    #[test]
    fn test_diamond_layout() {
        let g = graph(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "C"), ("A", "D"), ("D", "C")],
        );
        let layout = LayoutEngine::new().layout(&g);

        assert_eq!(layout.rank("A"), Some(0));
        assert_eq!(layout.rank("B"), Some(1));
        assert_eq!(layout.rank("D"), Some(1));
        assert_eq!(layout.rank("C"), Some(2));
        assert_eq!(layout.rank_count(), 3);
        assert_eq!(layout.crossings(), 0);
        assert_eq!(layout.nodes_in_rank(1), [&NodeId::new("B"), &NodeId::new("D")]);

        let b = layout.node_bounds("B").unwrap();
        let d = layout.node_bounds("D").unwrap();
        assert!(!b.intersects(&d));
        assert!(approx_eq!(f32, b.min_x(), d.min_x()));
    }

    #[test]
    fn test_every_node_and_edge_is_placed() {
        let g = graph(
            &["A", "B", "C", "D", "E"],
            &[("A", "B"), ("A", "C"), ("A", "E"), ("C", "D")],
        );
        let layout = LayoutEngine::new().layout(&g);

        assert_eq!(layout.placements().len(), g.node_count());
        assert_eq!(layout.routes().len(), g.edge_count());
        for node in g.nodes() {
            let bounds = layout.node_bounds(node.id().as_str()).unwrap();
            assert!(layout.bounds().contains(Point::new(bounds.min_x(), bounds.min_y())));
        }
    }

    #[test]
    fn test_long_edge_routes_through_virtual_vertex() {
        let g = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("A", "C")]);
        let layout = LayoutEngine::new().layout(&g);

        let route = layout.route("A->C").unwrap();
        assert_eq!(route.points().len(), 3);
        assert!(!route.reversed());

        let a = layout.position("A").unwrap();
        let half_width = layout.node_size().width() / 2.0;
        assert!(approx_eq!(f32, route.points()[0].x(), a.x() + half_width));
    }

    #[test]
    fn test_cycle_lays_out() {
        let g = graph(&["A", "B"], &[("A", "B"), ("B", "A")]);
        let layout = LayoutEngine::new().layout(&g);

        assert!(layout.rank("A").unwrap() < layout.rank("B").unwrap());
        let back = layout.route("B->A").unwrap();
        assert!(back.reversed());
        let points = back.points();
        assert!(points[0].x() > points[points.len() - 1].x());
    }

    #[test]
    fn test_isolated_nodes_share_rank_zero() {
        let g = graph(&["A", "B", "C"], &[]);
        let layout = LayoutEngine::new().layout(&g);

        assert_eq!(layout.rank_count(), 1);
        let orders: Vec<usize> = ["A", "B", "C"]
            .iter()
            .map(|id| layout.placement(id).unwrap().order())
            .collect();
        assert_eq!(orders, [0, 1, 2]);
    }

    #[test]
    fn test_empty_graph_gives_empty_layout() {
        let layout = LayoutEngine::new().layout(&Graph::new());
        assert!(layout.is_empty());
        assert_eq!(layout.rank_count(), 0);
        assert_eq!(layout.bounds(), Bounds::default());
    }

    #[test]
    fn test_engine_settings_affect_fingerprint() {
        let g = graph(&["A", "B"], &[("A", "B")]);
        let engine = LayoutEngine::new();
        let mut wide = LayoutEngine::new();
        wide.set_rank_gap(500.0);

        assert_eq!(engine.fingerprint(&g), LayoutEngine::new().fingerprint(&g));
        assert_ne!(engine.fingerprint(&g), wide.fingerprint(&g));
    }

    #[test]
    fn test_negative_config_values_are_clamped() {
        let mut engine = LayoutEngine::new();
        engine.set_node_gap(-10.0).set_margin(-1.0);
        let layout = engine.layout(&graph(&["A", "B", "C"], &[]));

        let a = layout.node_bounds("A").unwrap();
        let b = layout.node_bounds("B").unwrap();
        assert!(!a.intersects(&b));
        assert!(approx_eq!(f32, layout.bounds().min_x(), 0.0));
    }

    #[test]
    fn test_route_midpoint() {
        let route = EdgeRoute {
            points: vec![Point::new(0.0, 0.0), Point::new(10.0, 20.0)],
            reversed: false,
        };
        assert_eq!(route.midpoint(), Some(Point::new(5.0, 10.0)));

        let empty = EdgeRoute {
            points: Vec::new(),
            reversed: false,
        };
        assert_eq!(empty.midpoint(), None);
    }

    fn pairs_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
        (1usize..12).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..30)))
    }

    fn check_layout_is_deterministic(
        n: usize,
        pairs: &[(usize, usize)],
    ) -> Result<(), TestCaseError> {
        let g = indexed_graph(n, pairs);
        let engine = LayoutEngine::new();
        prop_assert_eq!(engine.layout(&g), engine.layout(&g.clone()));
        Ok(())
    }

    fn check_no_overlap_within_rank(
        n: usize,
        pairs: &[(usize, usize)],
    ) -> Result<(), TestCaseError> {
        let g = indexed_graph(n, pairs);
        let layout = LayoutEngine::new().layout(&g);
        prop_assert_eq!(layout.placements().len(), n);

        for rank in 0..layout.rank_count() {
            let ids = layout.nodes_in_rank(rank);
            for (i, a) in ids.iter().enumerate() {
                for b in &ids[i + 1..] {
                    let a_bounds = layout.node_bounds(a.as_str()).unwrap();
                    let b_bounds = layout.node_bounds(b.as_str()).unwrap();
                    prop_assert!(!a_bounds.intersects(&b_bounds), "{} overlaps {}", a, b);
                }
            }
        }
        Ok(())
    }

    /// Only forward pairs (`source < target`) are kept, so the graph is a DAG.
    fn check_rank_monotonicity(
        n: usize,
        pairs: &[(usize, usize)],
    ) -> Result<(), TestCaseError> {
        let forward: Vec<(usize, usize)> = pairs
            .iter()
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .filter(|(a, b)| a != b)
            .collect();
        let g = indexed_graph(n, &forward);
        let layout = LayoutEngine::new().layout(&g);

        for edge in g.edges() {
            let source = layout.rank(edge.source().as_str()).unwrap();
            let target = layout.rank(edge.target().as_str()).unwrap();
            prop_assert!(target > source, "{} breaks rank order", edge.id());
            prop_assert!(!layout.route(edge.id().as_str()).unwrap().reversed());
        }
        Ok(())
    }

    fn check_non_reversed_edges_point_right(
        n: usize,
        pairs: &[(usize, usize)],
    ) -> Result<(), TestCaseError> {
        let g = indexed_graph(n, pairs);
        let layout = LayoutEngine::new().layout(&g);

        for edge in g.edges() {
            let source = layout.rank(edge.source().as_str()).unwrap();
            let target = layout.rank(edge.target().as_str()).unwrap();
            let reversed = layout.route(edge.id().as_str()).unwrap().reversed();
            if reversed {
                prop_assert!(source > target);
            } else {
                prop_assert!(target > source);
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn layout_is_deterministic((n, pairs) in pairs_strategy()) {
            check_layout_is_deterministic(n, &pairs)?;
        }

        #[test]
        fn no_overlap_within_rank((n, pairs) in pairs_strategy()) {
            check_no_overlap_within_rank(n, &pairs)?;
        }

        #[test]
        fn rank_monotonicity_on_dags((n, pairs) in pairs_strategy()) {
            check_rank_monotonicity(n, &pairs)?;
        }

        #[test]
        fn non_reversed_edges_point_right((n, pairs) in pairs_strategy()) {
            check_non_reversed_edges_point_right(n, &pairs)?;
        }
    }
}
