//! Node and edge identifiers.
//!
//! Node identity is the raw string key taken from the input (a page path or
//! an explicit node id). Edge identity is derived from its endpoints through
//! [`edge_id`], and that format is shared by the builder, the highlight
//! resolver and every renderer:
//!
//! ```
//! use stategraph_core::identifier::{NodeId, edge_id};
//!
//! let id = edge_id(&NodeId::new("/login"), &NodeId::new("/home"));
//! assert_eq!(id, "/login->/home");
//! ```
//!
//! Node ids that themselves contain `->` can produce colliding edge ids; the
//! canonical format is kept regardless since renderers match on it verbatim.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// Separator between the source and target node ids of an [`EdgeId`].
pub const EDGE_ID_SEPARATOR: &str = "->";

/// Identifier of a node (an application state or page).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Identifier of a directed edge, always `source + "->" + target`.
///
/// An `EdgeId` can only be produced by [`edge_id`] (or [`EdgeId::new`], which
/// calls it), so every component agrees on the format.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Creates the canonical id of the edge `source -> target`.
    pub fn new(source: &NodeId, target: &NodeId) -> Self {
        edge_id(source, target)
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EdgeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EdgeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for EdgeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EdgeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Canonical edge identifier for the transition `source -> target`.
pub fn edge_id(source: &NodeId, target: &NodeId) -> EdgeId {
    let mut id = String::with_capacity(
        source.as_str().len() + EDGE_ID_SEPARATOR.len() + target.as_str().len(),
    );
    id.push_str(source.as_str());
    id.push_str(EDGE_ID_SEPARATOR);
    id.push_str(target.as_str());
    EdgeId(id)
}
