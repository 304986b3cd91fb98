//! Highlight resolution: the subgraph walked by a path.
//!
//! A path is an ordered list of node ids, typically the pages one test
//! visited. [`resolve_highlight`] maps it to the node set and edge set to
//! emphasize. Stale paths are tolerated: ids that are not in the graph are
//! skipped, and consecutive pairs that are not an edge of the graph add no
//! edge.

use indexmap::IndexSet;
use log::debug;
use serde::Serialize;

use stategraph_core::{
    graph::{Edge, Graph, Node},
    identifier::{EdgeId, NodeId},
};

/// Nodes and edges to emphasize, in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightSet {
    node_ids: IndexSet<NodeId>,
    edge_ids: IndexSet<EdgeId>,
}

impl HighlightSet {
    pub fn node_ids(&self) -> &IndexSet<NodeId> {
        &self.node_ids
    }

    pub fn edge_ids(&self) -> &IndexSet<EdgeId> {
        &self.edge_ids
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_ids.contains(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge_ids.contains(id)
    }

    /// Returns true if neither a node nor an edge is highlighted.
    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty() && self.edge_ids.is_empty()
    }
}

/// Resolves `path` against `graph`.
///
/// # Examples
///
/// ```
/// use stategraph::{builder, highlight::resolve_highlight, identifier::NodeId, input::GraphSource};
///
/// let source = GraphSource::from_json(r#"[
///     { "steps": [ { "page": "A" }, { "page": "B" }, { "page": "C" } ] },
///     { "steps": [ { "page": "A" }, { "page": "D" }, { "page": "C" } ] }
/// ]"#).unwrap();
/// let graph = builder::build(&source);
///
/// let path = ["A", "B", "C"].map(NodeId::from);
/// let highlight = resolve_highlight(&graph, &path);
/// assert!(highlight.contains_edge("A->B"));
/// assert!(highlight.contains_edge("B->C"));
/// assert!(!highlight.contains_node("D"));
/// ```
pub fn resolve_highlight(graph: &Graph, path: &[NodeId]) -> HighlightSet {
    let node_ids: IndexSet<NodeId> = path
        .iter()
        .filter(|id| graph.contains_node(id.as_str()))
        .cloned()
        .collect();

    let edge_ids: IndexSet<EdgeId> = path
        .windows(2)
        .filter_map(|pair| graph.find_edge(&pair[0], &pair[1]))
        .map(|edge| edge.id().clone())
        .collect();

    debug!(
        path_len = path.len(),
        nodes = node_ids.len(),
        edges = edge_ids.len();
        "Highlight resolved"
    );

    HighlightSet { node_ids, edge_ids }
}

/// How an element is drawn relative to the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VisualState {
    /// No selection is active.
    Normal,
    /// Part of the selection.
    Highlighted,
    /// A selection is active and this element is not part of it.
    Dimmed,
}

impl VisualState {
    fn resolve(
        selection: Option<&HighlightSet>,
        selected: impl FnOnce(&HighlightSet) -> bool,
    ) -> Self {
        match selection {
            None => Self::Normal,
            Some(set) if selected(set) => Self::Highlighted,
            Some(_) => Self::Dimmed,
        }
    }
}

/// Visual state of a node plus start-node emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOverlay {
    state: VisualState,
    is_start: bool,
}

impl NodeOverlay {
    pub fn state(&self) -> VisualState {
        self.state
    }

    pub fn is_start(&self) -> bool {
        self.is_start
    }
}

/// Overlay of every node, in graph order.
///
/// With no selection every node is [`VisualState::Normal`]. With one, members
/// are highlighted and every other node is dimmed, including for an empty
/// selection.
pub fn node_overlays<'a>(
    graph: &'a Graph,
    selection: Option<&'a HighlightSet>,
) -> impl Iterator<Item = (&'a Node, NodeOverlay)> + 'a {
    graph.nodes().map(move |node| {
        let state = VisualState::resolve(selection, |set| set.contains_node(node.id().as_str()));
        let overlay = NodeOverlay {
            state,
            is_start: node.is_start(),
        };
        (node, overlay)
    })
}

/// Visual state of every edge, in graph order.
pub fn edge_overlays<'a>(
    graph: &'a Graph,
    selection: Option<&'a HighlightSet>,
) -> impl Iterator<Item = (&'a Edge, VisualState)> + 'a {
    graph.edges().map(move |edge| {
        let state = VisualState::resolve(selection, |set| set.contains_edge(edge.id().as_str()));
        (edge, state)
    })
}
