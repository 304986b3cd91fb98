//! Graph builder: folds raw observations into a canonical [`Graph`].
//!
//! Building is total. Records that cannot contribute to the graph (a step
//! without a page, a node without an id, an edge pointing at an unknown node,
//! a self-transition) are dropped and counted, never reported as errors.
//!
//! # Merge policy
//!
//! Observations are folded in input order and the first observation wins:
//!
//! - a repeated node keeps its first label;
//! - a repeated edge keeps its first label, unless it had none;
//! - attributes of a repeated node or edge are merged key by key: keys not yet
//!   present are added, array values present on both sides are unioned
//!   (existing order first, duplicates skipped), any other existing value is
//!   kept;
//! - every repeated edge observation increments [`Edge::observations`].

use log::{debug, info, trace};
use serde_json::Value;

use stategraph_core::{
    graph::{Attributes, Edge, EdgeRejection, Graph, Node},
    identifier::NodeId,
};

use crate::input::{GraphRecord, GraphSource, NodeRecord, TraceRecord};

/// Attribute under which trace-built edges list the traces that walked them.
pub const TRACES_ATTRIBUTE: &str = "traces";

/// Builds the canonical graph for any accepted input.
///
/// # Examples
///
/// ```
/// use stategraph::{builder, input::GraphSource};
///
/// let source = GraphSource::from_json(r#"[
///     { "id": "t1", "steps": [ { "page": "A" }, { "page": "B" }, { "page": "C" } ] },
///     { "id": "t2", "steps": [ { "page": "A" }, { "page": "D" }, { "page": "C" } ] }
/// ]"#).unwrap();
///
/// let graph = builder::build(&source);
/// assert_eq!(graph.node_count(), 4);
/// assert_eq!(graph.edge_count(), 4);
/// assert_eq!(graph.start_id().unwrap(), "A");
/// ```
pub fn build(source: &GraphSource) -> Graph {
    let graph = match source {
        GraphSource::Traces(traces) => build_from_traces(traces, Attributes::new()),
        GraphSource::TraceList(list) => build_from_traces(&list.traces, list.metadata.clone()),
        GraphSource::Wrapped(wrapped) => {
            let mut metadata = wrapped.metadata.clone();
            merge_attributes(&mut metadata, wrapped.graph.metadata.clone());
            build_from_record(&wrapped.graph, metadata)
        }
        GraphSource::Graph(record) => build_from_record(record, record.metadata.clone()),
    };

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count();
        "Graph built"
    );
    trace!(graph:?; "Built graph");

    graph
}

/// Ordered list of node ids a trace walked, with repeated locations coalesced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracePath {
    key: String,
    nodes: Vec<NodeId>,
}

impl TracePath {
    /// The trace key (id, else name, else `trace-<position>`).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The walked node ids, usable as a highlight path.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }
}

/// Returns the path of every trace of a trace-list input, in input order.
///
/// Explicit-graph inputs have no traces and yield an empty list.
pub fn trace_paths(source: &GraphSource) -> Vec<TracePath> {
    source
        .traces()
        .iter()
        .enumerate()
        .map(|(position, trace)| TracePath {
            key: trace.key(position),
            nodes: walk(trace).map(|(node, _)| node).collect(),
        })
        .collect()
}

/// Returns the path of the first trace whose key matches `key`.
pub fn trace_path(source: &GraphSource, key: &str) -> Option<TracePath> {
    trace_paths(source).into_iter().find(|path| path.key == key)
}

/// Coalesced locations of a trace, each paired with the action of the last
/// step taken there.
fn walk(trace: &TraceRecord) -> impl Iterator<Item = (NodeId, Option<String>)> + '_ {
    let mut steps = trace
        .steps
        .iter()
        .filter_map(|step| step.location().map(|page| (page, step.action.clone())))
        .peekable();

    std::iter::from_fn(move || {
        let (page, mut action) = steps.next()?;
        while let Some((next_page, next_action)) = steps.peek() {
            if *next_page != page {
                break;
            }
            action = next_action.clone();
            steps.next();
        }
        Some((NodeId::new(page), action))
    })
}

fn build_from_traces(traces: &[TraceRecord], metadata: Attributes) -> Graph {
    let mut assembler = Assembler::default();

    for (position, trace) in traces.iter().enumerate() {
        let key = trace.key(position);
        let dropped = trace.steps.len()
            - trace
                .steps
                .iter()
                .filter(|step| step.location().is_some())
                .count();
        assembler.dropped_records += dropped;

        let mut previous: Option<(NodeId, Option<String>)> = None;
        for (node_id, action) in walk(trace) {
            assembler.observe_node(Node::new(node_id.clone(), node_id.as_str()));
            if let Some((source, source_action)) = previous.take() {
                let mut attributes = Attributes::new();
                attributes.insert(
                    TRACES_ATTRIBUTE.to_string(),
                    Value::Array(vec![Value::String(key.clone())]),
                );
                assembler.observe_edge(
                    Edge::new(source, node_id.clone())
                        .with_label(source_action)
                        .with_attributes(attributes),
                );
            }
            previous = Some((node_id, action));
        }
    }

    assembler.finish(None, metadata)
}

fn build_from_record(record: &GraphRecord, metadata: Attributes) -> Graph {
    let mut assembler = Assembler::default();
    let mut entry_point = None;

    for node in &record.nodes {
        let Some(id) = node.id.as_deref().filter(|id| !id.is_empty()) else {
            assembler.dropped_records += 1;
            continue;
        };
        let id = NodeId::new(id);
        if entry_point.is_none() && node.is_entry_point() {
            entry_point = Some(id.clone());
        }
        assembler.observe_node(node_from_record(id, node));
    }

    for edge in &record.edges {
        let (Some(source), Some(target)) = (edge.source.as_deref(), edge.target.as_deref()) else {
            assembler.dropped_records += 1;
            continue;
        };
        assembler.observe_edge(
            Edge::new(NodeId::new(source), NodeId::new(target))
                .with_label(edge.label.clone())
                .with_attributes(edge.attributes.clone()),
        );
    }

    assembler.finish(entry_point, metadata)
}

fn node_from_record(id: NodeId, record: &NodeRecord) -> Node {
    let mut attributes = record.attributes.clone();
    if let Some(kind) = &record.kind {
        attributes.insert("type".to_string(), Value::String(kind.clone()));
    }
    let label = record
        .label
        .clone()
        .unwrap_or_else(|| id.as_str().to_string());
    Node::new(id, label).with_attributes(attributes)
}

/// Accumulates observations into a graph, applying the merge policy.
#[derive(Default)]
struct Assembler {
    graph: Graph,
    dropped_records: usize,
    dropped_edges: usize,
}

impl Assembler {
    fn observe_node(&mut self, node: Node) {
        if let Some(existing) = self.graph.node_mut(node.id().as_str()) {
            merge_attributes(existing.attributes_mut(), node.attributes().clone());
            return;
        }
        self.graph.insert_node(node);
    }

    fn observe_edge(&mut self, edge: Edge) {
        if let Some(existing) = self.graph.find_edge_mut(edge.source(), edge.target()) {
            existing.record_observation();
            existing.fill_label(edge.label().map(str::to_string));
            merge_attributes(existing.attributes_mut(), edge.attributes().clone());
            return;
        }

        if let Err(rejection) = self.graph.insert_edge(edge) {
            match &rejection {
                EdgeRejection::SelfLoop(_) => {
                    trace!(reason:% = rejection; "Skipping self-transition");
                }
                EdgeRejection::Dangling { .. }
                | EdgeRejection::Duplicate(_)
                | EdgeRejection::IdCollision(_) => {
                    debug!(reason:% = rejection; "Dropping edge");
                }
            }
            self.dropped_edges += 1;
        }
    }

    fn finish(mut self, entry_point: Option<NodeId>, metadata: Attributes) -> Graph {
        let start = entry_point.or_else(|| self.graph.nodes().next().map(|n| n.id().clone()));
        if let Some(start) = start {
            self.graph.set_start(start.as_str());
        }
        self.graph.set_metadata(metadata);

        if self.dropped_records > 0 || self.dropped_edges > 0 {
            debug!(
                dropped_records = self.dropped_records,
                dropped_edges = self.dropped_edges;
                "Dropped unusable input records"
            );
        }

        self.graph
    }
}

/// Merges `incoming` into `existing`: new keys are added, arrays present on
/// both sides are unioned, other existing values are kept.
fn merge_attributes(existing: &mut Attributes, incoming: Attributes) {
    for (key, value) in incoming {
        match (existing.get_mut(&key), value) {
            (None, value) => {
                existing.insert(key, value);
            }
            (Some(Value::Array(current)), Value::Array(additions)) => {
                for item in additions {
                    if !current.contains(&item) {
                        current.push(item);
                    }
                }
            }
            (Some(_), _) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn traces(json: &str) -> GraphSource {
        GraphSource::from_json(json).unwrap()
    }

    fn edge_ids(graph: &Graph) -> Vec<&str> {
        graph.edges().map(|e| e.id().as_str()).collect()
    }

    fn node_ids(graph: &Graph) -> Vec<&str> {
        graph.nodes().map(|n| n.id().as_str()).collect()
    }

    #[test]
    fn test_two_traces_sharing_endpoints() {
        let graph = build(&traces(
            r#"[
                { "id": "t1", "steps": [ { "page": "A" }, { "page": "B" }, { "page": "C" } ] },
                { "id": "t2", "steps": [ { "page": "A" }, { "page": "D" }, { "page": "C" } ] }
            ]"#,
        ));

        assert_eq!(node_ids(&graph), ["A", "B", "C", "D"]);
        assert_eq!(edge_ids(&graph), ["A->B", "B->C", "A->D", "D->C"]);
        assert_eq!(graph.start_id().unwrap(), "A");
        assert!(graph.node("A").unwrap().is_start());
    }

    #[test]
    fn test_repeated_transition_collapses() {
        let graph = build(&traces(
            r#"[
                { "id": "t1", "steps": [ { "page": "A", "action": "open" }, { "page": "B" } ] },
                { "id": "t2", "steps": [ { "page": "A", "action": "tap" }, { "page": "B" } ] },
                { "id": "t1", "steps": [ { "page": "A" }, { "page": "B" } ] }
            ]"#,
        ));

        assert_eq!(edge_ids(&graph), ["A->B"]);
        let edge = graph.edge("A->B").unwrap();
        assert_eq!(edge.observations(), 3);
        assert_eq!(edge.label(), Some("open"));
        assert_eq!(
            edge.attributes().get(TRACES_ATTRIBUTE),
            Some(&json!(["t1", "t2"]))
        );
    }

    #[test]
    fn test_consecutive_same_page_is_coalesced() {
        let graph = build(&traces(
            r#"[ { "steps": [
                { "page": "A", "action": "type email" },
                { "page": "A", "action": "submit" },
                { "page": "B" }
            ] } ]"#,
        ));

        assert_eq!(edge_ids(&graph), ["A->B"]);
        assert_eq!(graph.edge("A->B").unwrap().label(), Some("submit"));
    }

    #[test]
    fn test_single_page_trace_has_no_edges() {
        let graph = build(&traces(
            r#"[ { "steps": [ { "page": "A" }, { "page": "A" } ] } ]"#,
        ));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_steps_without_page_are_skipped() {
        let graph = build(&traces(
            r#"[ { "steps": [ { "page": "A" }, { "action": "wait" }, { "page": "" }, { "page": "B" } ] } ]"#,
        ));
        assert_eq!(node_ids(&graph), ["A", "B"]);
        assert_eq!(edge_ids(&graph), ["A->B"]);
    }

    #[test]
    fn test_revisits_produce_back_edges() {
        let graph = build(&traces(
            r#"[ { "steps": [ { "page": "A" }, { "page": "B" }, { "page": "A" } ] } ]"#,
        ));
        assert_eq!(edge_ids(&graph), ["A->B", "B->A"]);
    }

    #[test]
    fn test_empty_inputs() {
        let graph = build(&traces("[]"));
        assert!(graph.is_empty());
        assert!(graph.start_node().is_none());

        let graph = build(&traces(r#"{ "nodes": [], "edges": [] }"#));
        assert!(graph.is_empty());
        assert!(graph.start_id().is_none());
    }

    #[test]
    fn test_explicit_entry_point_wins_over_order() {
        let graph = build(&traces(
            r#"{ "nodes": [ { "id": "Y" }, { "id": "X", "type": "entry" } ], "edges": [] }"#,
        ));
        assert_eq!(graph.start_id().unwrap(), "X");
        assert!(!graph.node("Y").unwrap().is_start());
    }

    #[test]
    fn test_explicit_graph_falls_back_to_first_node() {
        let graph = build(&traces(
            r#"{ "nodes": [ { "id": "Y" }, { "id": "X" } ], "edges": [ { "source": "Y", "target": "X" } ] }"#,
        ));
        assert_eq!(graph.start_id().unwrap(), "Y");
    }

    #[test]
    fn test_explicit_graph_validation() {
        let graph = build(&traces(
            r#"{
                "nodes": [
                    { "id": "a", "label": "Alpha", "type": "page", "role": "admin" },
                    { "label": "no id" },
                    { "id": "b" },
                    { "id": "a", "label": "Duplicate", "role": "guest", "extra": 1 }
                ],
                "edges": [
                    { "source": "a", "target": "b", "label": "go", "conditions": ["x"] },
                    { "source": "a", "target": "missing" },
                    { "source": "b", "target": "b" },
                    { "source": "a" },
                    { "source": "a", "target": "b", "label": "again", "conditions": ["y", "x"] }
                ]
            }"#,
        ));

        assert_eq!(node_ids(&graph), ["a", "b"]);
        let a = graph.node("a").unwrap();
        assert_eq!(a.label(), "Alpha");
        assert_eq!(a.attributes().get("type"), Some(&json!("page")));
        assert_eq!(a.attributes().get("role"), Some(&json!("admin")));
        assert_eq!(a.attributes().get("extra"), Some(&json!(1)));
        assert_eq!(graph.node("b").unwrap().label(), "b");

        assert_eq!(edge_ids(&graph), ["a->b"]);
        let edge = graph.edge("a->b").unwrap();
        assert_eq!(edge.label(), Some("go"));
        assert_eq!(edge.observations(), 2);
        assert_eq!(edge.attributes().get("conditions"), Some(&json!(["x", "y"])));
    }

    #[test]
    fn test_metadata_passthrough() {
        let graph = build(&traces(
            r#"{ "graph": { "nodes": [ { "id": "a" } ], "version": "2" }, "environment": "prod", "version": "1" }"#,
        ));
        assert_eq!(graph.metadata().get("environment"), Some(&json!("prod")));
        assert_eq!(graph.metadata().get("version"), Some(&json!("1")));

        let graph = build(&traces(r#"{ "traces": [], "persona": "guest" }"#));
        assert_eq!(graph.metadata().get("persona"), Some(&json!("guest")));
    }

    #[test]
    fn test_build_is_deterministic() {
        let source = traces(
            r#"[
                { "id": "t1", "steps": [ { "page": "C" }, { "page": "A" }, { "page": "B" } ] },
                { "id": "t2", "steps": [ { "page": "B" }, { "page": "C" }, { "page": "D" } ] }
            ]"#,
        );
        assert_eq!(build(&source), build(&source));
    }

    #[test]
    fn test_trace_paths() {
        let source = traces(
            r#"[
                { "id": "t1", "steps": [ { "page": "A" }, { "page": "A" }, { "page": "B" } ] },
                { "name": "smoke", "steps": [ { "page": "C" } ] }
            ]"#,
        );

        let paths = trace_paths(&source);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].key(), "t1");
        assert_eq!(paths[0].nodes(), [NodeId::new("A"), NodeId::new("B")]);
        assert_eq!(paths[1].key(), "smoke");

        assert!(trace_path(&source, "smoke").is_some());
        assert!(trace_path(&source, "nope").is_none());
    }

    #[test]
    fn test_odd_records_do_not_empty_the_graph() {
        let graph = build(&traces(
            r#"{ "graph": {
                "nodes": [ { "id": "a", "isStart": "yes" }, { "id": "b" } ],
                "edges": [ { "source": "a", "target": "b" } ]
            } }"#,
        ));
        assert_eq!(node_ids(&graph), ["a", "b"]);
        assert_eq!(edge_ids(&graph), ["a->b"]);
        assert_eq!(graph.start_id().unwrap(), "a");
        assert!(graph.metadata().is_empty());

        let graph = build(&traces(
            r#"{ "traces": [
                { "id": "t1", "steps": [ { "page": "A" }, { "page": "B" } ] },
                { "id": "t2", "steps": "oops" }
            ] }"#,
        ));
        assert_eq!(node_ids(&graph), ["A", "B"]);
        assert_eq!(edge_ids(&graph), ["A->B"]);
        assert!(graph.metadata().is_empty());

        let graph = build(&traces(
            r#"{
                "nodes": [ { "id": "a" }, { "id": "b", "entry": "yes" } ],
                "edges": [ { "source": "a", "target": "b" } ]
            }"#,
        ));
        assert_eq!(node_ids(&graph), ["a", "b"]);
        assert_eq!(graph.start_id().unwrap(), "b");
    }

    #[test]
    fn test_colliding_edge_ids_are_not_merged() {
        let graph = build(&traces(
            r#"{
                "nodes": [ { "id": "A->B" }, { "id": "C" }, { "id": "A" }, { "id": "B->C" } ],
                "edges": [
                    { "source": "A->B", "target": "C", "label": "first" },
                    { "source": "A", "target": "B->C", "label": "second" }
                ]
            }"#,
        ));

        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edge("A->B->C").unwrap();
        assert_eq!(edge.source(), "A->B");
        assert_eq!(edge.target(), "C");
        assert_eq!(edge.observations(), 1);
        assert_eq!(edge.label(), Some("first"));
    }

    #[test]
    fn test_merge_attributes_policy() {
        let mut existing = Attributes::new();
        existing.insert("keep".to_string(), json!("first"));
        existing.insert("list".to_string(), json!([1, 2]));

        let mut incoming = Attributes::new();
        incoming.insert("keep".to_string(), json!("second"));
        incoming.insert("list".to_string(), json!([2, 3]));
        incoming.insert("new".to_string(), json!(true));

        merge_attributes(&mut existing, incoming);
        assert_eq!(existing.get("keep"), Some(&json!("first")));
        assert_eq!(existing.get("list"), Some(&json!([1, 2, 3])));
        assert_eq!(existing.get("new"), Some(&json!(true)));
    }
}
