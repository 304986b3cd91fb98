//! The canonical state graph.
//!
//! A [`Graph`] is an insertion-ordered set of [`Node`]s and [`Edge`]s with at
//! most one designated start node. The type itself enforces the structural
//! invariants every consumer relies on:
//!
//! - node ids are unique,
//! - every edge references two existing nodes,
//! - there is at most one edge per `(source, target)` pair,
//! - there are no self-loops,
//! - at most one node reports [`Node::is_start`].
//!
//! Deciding *which* observation wins when duplicates arrive is the builder's
//! job; the graph only reports the rejection through [`EdgeRejection`].

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::identifier::{EdgeId, NodeId, edge_id};

/// Opaque attribute mapping carried through unmodified from the input.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// A single application state or page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    id: NodeId,
    label: String,
    attributes: Attributes,
    is_start: bool,
}

impl Node {
    /// Creates a node with the given id and display label and no attributes.
    pub fn new(id: NodeId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            attributes: Attributes::new(),
            is_start: false,
        }
    }

    /// Replaces the attributes (builder style).
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Mutable access to the attributes, used when merging duplicate observations.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Returns true if this node is the graph's start node.
    pub fn is_start(&self) -> bool {
        self.is_start
    }
}

/// A directed transition between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    id: EdgeId,
    source: NodeId,
    target: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    attributes: Attributes,
    observations: usize,
}

impl Edge {
    /// Creates an edge observed once, with its canonical id derived from the endpoints.
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            id: edge_id(&source, &target),
            source,
            target,
            label: None,
            attributes: Attributes::new(),
            observations: 1,
        }
    }

    /// Sets the label (builder style).
    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    /// Replaces the attributes (builder style).
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn id(&self) -> &EdgeId {
        &self.id
    }

    /// Returns true if this edge runs from `source` to `target`.
    pub fn connects(&self, source: &NodeId, target: &NodeId) -> bool {
        &self.source == source && &self.target == target
    }

    pub fn source(&self) -> &NodeId {
        &self.source
    }

    pub fn target(&self) -> &NodeId {
        &self.target
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets the label only if the edge has none yet.
    pub fn fill_label(&mut self, label: Option<String>) {
        if self.label.is_none() {
            self.label = label;
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Mutable access to the attributes, used when merging duplicate observations.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Number of raw transitions folded into this edge.
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Counts one more observation of this transition.
    pub fn record_observation(&mut self) {
        self.observations += 1;
    }
}

/// Reason an edge was not inserted into a [`Graph`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdgeRejection {
    #[error("edge {0} is a self-loop")]
    SelfLoop(EdgeId),

    #[error("edge {edge} references unknown node {node}")]
    Dangling { edge: EdgeId, node: NodeId },

    #[error("edge {0} already exists")]
    Duplicate(EdgeId),

    /// Another edge with different endpoints already renders to the same id,
    /// e.g. `(A, B->C)` against `(A->B, C)`.
    #[error("edge {0} collides with an existing edge between other nodes")]
    IdCollision(EdgeId),
}

/// Canonical directed graph of application states.
///
/// Nodes and edges keep first-insertion order, which is the order every
/// iteration method yields them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    start: Option<NodeId>,
    metadata: Attributes,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node. Returns `false` and leaves the graph untouched if a
    /// node with the same id already exists.
    pub fn insert_node(&mut self, mut node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        node.is_start = false;
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Inserts an edge after checking referential integrity, self-loops and
    /// uniqueness.
    ///
    /// # Errors
    ///
    /// Returns the [`EdgeRejection`] describing why the edge was not added.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), EdgeRejection> {
        if edge.source == edge.target {
            return Err(EdgeRejection::SelfLoop(edge.id));
        }
        let missing = [&edge.source, &edge.target]
            .into_iter()
            .find(|endpoint| !self.nodes.contains_key(*endpoint))
            .cloned();
        if let Some(node) = missing {
            return Err(EdgeRejection::Dangling {
                edge: edge.id,
                node,
            });
        }
        if let Some(existing) = self.edges.get(&edge.id) {
            if !existing.connects(&edge.source, &edge.target) {
                return Err(EdgeRejection::IdCollision(edge.id));
            }
            return Err(EdgeRejection::Duplicate(edge.id));
        }
        self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    /// Designates the start node, clearing any previous one.
    ///
    /// Returns `false` if no node has the given id.
    pub fn set_start(&mut self, id: &str) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }
        if let Some(previous) = self.start.take() {
            if let Some(node) = self.nodes.get_mut(&previous) {
                node.is_start = false;
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.is_start = true;
            self.start = Some(node.id.clone());
        }
        true
    }

    /// Replaces the graph-level metadata.
    pub fn set_metadata(&mut self, metadata: Attributes) {
        self.metadata = metadata;
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Returns a mutable reference to the node with the given id.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Returns the insertion index of the node with the given id.
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    /// Returns an iterator over nodes in insertion order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Checks if a node with the given id exists in the graph.
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Returns the edge with the given canonical id.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Returns a mutable reference to the edge with the given canonical id.
    pub fn edge_mut(&mut self, id: &str) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    /// Returns the edge `source -> target` if it exists.
    ///
    /// Unlike a lookup by id, this never returns an edge between other nodes
    /// whose canonical id happens to be the same string.
    pub fn find_edge(&self, source: &NodeId, target: &NodeId) -> Option<&Edge> {
        self.edges
            .get(&edge_id(source, target))
            .filter(|edge| edge.connects(source, target))
    }

    /// Mutable counterpart of [`Graph::find_edge`].
    pub fn find_edge_mut(&mut self, source: &NodeId, target: &NodeId) -> Option<&mut Edge> {
        self.edges
            .get_mut(&edge_id(source, target))
            .filter(|edge| edge.connects(source, target))
    }

    /// Returns an iterator over edges in insertion order.
    pub fn edges(&self) -> impl ExactSizeIterator<Item = &Edge> {
        self.edges.values()
    }

    /// Returns the total number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Checks if an edge with the given canonical id exists in the graph.
    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    /// Returns the start node, if the graph has one.
    pub fn start_node(&self) -> Option<&Node> {
        self.start.as_ref().and_then(|id| self.nodes.get(id))
    }

    /// Returns the id of the start node, if the graph has one.
    pub fn start_id(&self) -> Option<&NodeId> {
        self.start.as_ref()
    }

    /// Returns the graph-level metadata (environment, persona, version, ...).
    pub fn metadata(&self) -> &Attributes {
        &self.metadata
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Hash of the graph structure: node ids and edge endpoints, in order.
    ///
    /// Labels, attributes and metadata do not contribute, so two graphs with
    /// the same fingerprint lay out identically.
    pub fn structural_fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.nodes.len().hash(&mut hasher);
        for id in self.nodes.keys() {
            id.hash(&mut hasher);
        }
        self.edges.len().hash(&mut hasher);
        for edge in self.edges.values() {
            edge.source.hash(&mut hasher);
            edge.target.hash(&mut hasher);
        }
        self.start.hash(&mut hasher);
        hasher.finish()
    }
}
