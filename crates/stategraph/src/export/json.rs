//! JSON report of a laid out graph.
//!
//! The report is a flat, self-contained document meant for other tools: every
//! node with its placement, every edge with its route, the drawing bounds and
//! the highlight sets when a selection is active.

use serde::Serialize;

use stategraph_core::{
    geometry::{Bounds, Point, Size},
    graph::{Attributes, Graph},
    identifier::{EdgeId, NodeId},
};

use super::Error;
use crate::{
    highlight::{self, HighlightSet, VisualState},
    layout::Layout,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<&'a NodeId>,
    #[serde(skip_serializing_if = "is_empty")]
    metadata: &'a Attributes,
    bounds: Bounds,
    node_size: Size,
    nodes: Vec<NodeEntry<'a>>,
    edges: Vec<EdgeEntry<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    highlight: Option<&'a HighlightSet>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeEntry<'a> {
    id: &'a NodeId,
    label: &'a str,
    is_start: bool,
    rank: usize,
    order: usize,
    position: Point,
    state: VisualState,
    #[serde(skip_serializing_if = "is_empty")]
    attributes: &'a Attributes,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeEntry<'a> {
    id: &'a EdgeId,
    source: &'a NodeId,
    target: &'a NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    observations: usize,
    reversed: bool,
    points: &'a [Point],
    state: VisualState,
    #[serde(skip_serializing_if = "is_empty")]
    attributes: &'a Attributes,
}

fn is_empty(attributes: &&Attributes) -> bool {
    attributes.is_empty()
}

/// Serializes `graph` with the placements and routes of `layout`.
///
/// # Errors
///
/// Returns [`Error::Render`] if `layout` does not cover every node and edge
/// of `graph`, or if serialization fails.
pub fn render_report(
    graph: &Graph,
    layout: &Layout,
    selection: Option<&HighlightSet>,
) -> Result<String, Error> {
    let nodes = highlight::node_overlays(graph, selection)
        .map(|(node, overlay)| {
            let placement = layout.placement(node.id().as_str()).ok_or_else(|| {
                Error::Render(format!("no placement for node `{}` in layout", node.id()))
            })?;
            Ok(NodeEntry {
                id: node.id(),
                label: node.label(),
                is_start: overlay.is_start(),
                rank: placement.rank(),
                order: placement.order(),
                position: placement.position(),
                state: overlay.state(),
                attributes: node.attributes(),
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let edges = highlight::edge_overlays(graph, selection)
        .map(|(edge, state)| {
            let route = layout.route(edge.id().as_str()).ok_or_else(|| {
                Error::Render(format!("no route for edge `{}` in layout", edge.id()))
            })?;
            Ok(EdgeEntry {
                id: edge.id(),
                source: edge.source(),
                target: edge.target(),
                label: edge.label(),
                observations: edge.observations(),
                reversed: route.reversed(),
                points: route.points(),
                state,
                attributes: edge.attributes(),
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let report = Report {
        start: graph.start_id(),
        metadata: graph.metadata(),
        bounds: layout.bounds(),
        node_size: layout.node_size(),
        nodes,
        edges,
        highlight: selection,
    };

    serde_json::to_string_pretty(&report).map_err(|err| Error::Render(err.to_string()))
}
