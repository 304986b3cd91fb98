//! Input schemas accepted by the graph builder.
//!
//! Two shapes of input are supported:
//!
//! - a **trace list**: one record per executed test or exploration run, each
//!   an ordered list of steps naming the page the step happened on;
//! - an **explicit graph**: an already assembled node list and edge list,
//!   optionally wrapped with graph-level metadata.
//!
//! ```
//! use stategraph::input::GraphSource;
//!
//! let traces = GraphSource::from_json(r#"[
//!     { "id": "login", "steps": [ { "page": "/login" }, { "page": "/home" } ] }
//! ]"#).unwrap();
//! assert!(matches!(traces, GraphSource::Traces(_)));
//!
//! let graph = GraphSource::from_json(r#"{
//!     "nodes": [ { "id": "/login" } ],
//!     "edges": [],
//!     "environment": "staging"
//! }"#).unwrap();
//! assert!(matches!(graph, GraphSource::Graph(_)));
//! ```
//!
//! The shape is picked from the keys of the top-level value, in this order:
//!
//! - an array is a trace list;
//! - an object with `traces` is a trace list with metadata;
//! - an object with `graph` is a wrapped graph;
//! - an object with `nodes` or `edges` is an explicit graph.
//!
//! Anything else is rejected.
//!
//! Below the top level, reading is lenient. Scalar identifiers and flags
//! accept numbers, booleans and strings, and anything else reads as missing.
//! A list element that cannot be read at all (a step that is not an object)
//! is dropped, and a list field that is not a list reads as empty, so that a
//! single odd record is dropped instead of rejecting the whole document.

use log::debug;
use serde::{
    Deserialize, Deserializer,
    de::{DeserializeOwned, Error as _},
};
use serde_json::{Map, Value};

use stategraph_core::graph::Attributes;

use crate::error::StategraphError;

/// Any input the graph builder understands.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphSource {
    /// A bare list of traces.
    Traces(Vec<TraceRecord>),
    /// `{ "traces": [...], ...metadata }`
    TraceList(TraceListRecord),
    /// `{ "graph": { "nodes": [...], "edges": [...] }, ...metadata }`
    Wrapped(WrappedGraphRecord),
    /// `{ "nodes": [...], "edges": [...], ...metadata }`
    Graph(GraphRecord),
}

impl GraphSource {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`StategraphError::Input`] if the text is not JSON or its top
    /// level matches none of the accepted shapes.
    pub fn from_json(src: &str) -> Result<Self, StategraphError> {
        serde_json::from_str(src).map_err(|err| StategraphError::new_input_error(err, src))
    }

    /// Returns the traces of a trace-list input, or an empty slice.
    pub fn traces(&self) -> &[TraceRecord] {
        match self {
            Self::Traces(traces) => traces,
            Self::TraceList(list) => &list.traces,
            Self::Wrapped(_) | Self::Graph(_) => &[],
        }
    }

    fn from_object(object: Map<String, Value>) -> Result<Self, serde_json::Error> {
        if object.contains_key("traces") {
            TraceListRecord::deserialize(Value::Object(object)).map(Self::TraceList)
        } else if object.contains_key("graph") {
            WrappedGraphRecord::deserialize(Value::Object(object)).map(Self::Wrapped)
        } else if object.contains_key("nodes") || object.contains_key("edges") {
            GraphRecord::deserialize(Value::Object(object)).map(Self::Graph)
        } else {
            Err(serde_json::Error::custom(
                "expected an object with `traces`, `graph`, or `nodes` and `edges`",
            ))
        }
    }
}

impl<'de> Deserialize<'de> for GraphSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => Ok(Self::Traces(readable_elements(items))),
            Value::Object(object) => Self::from_object(object).map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "expected a list of traces or a graph object, found {}",
                kind_of(&other)
            ))),
        }
    }
}

/// Trace list wrapped in an object next to graph-level metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TraceListRecord {
    #[serde(deserialize_with = "lenient_list")]
    pub traces: Vec<TraceRecord>,
    #[serde(flatten)]
    pub metadata: Attributes,
}

/// One executed test or exploration run.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TraceRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub steps: Vec<StepRecord>,
}

impl TraceRecord {
    /// Key identifying this trace: its id, else its name, else `trace-<position>`.
    pub fn key(&self, position: usize) -> String {
        self.id
            .as_deref()
            .or(self.name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("trace-{position}"))
    }
}

/// A single step of a trace.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StepRecord {
    /// Position reported by the test runner; passed through, not used for ordering.
    #[serde(default)]
    pub index: Option<Value>,
    /// Location the step happened on; the node identity key.
    #[serde(default, deserialize_with = "lenient_string")]
    pub page: Option<String>,
    /// Action performed at `page`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub action: Option<String>,
}

impl StepRecord {
    /// Returns the page if it is present and not blank.
    pub fn location(&self) -> Option<&str> {
        self.page.as_deref().filter(|page| !page.trim().is_empty())
    }
}

/// Explicit graph wrapped under a `graph` key next to metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WrappedGraphRecord {
    pub graph: GraphRecord,
    #[serde(flatten)]
    pub metadata: Attributes,
}

/// Explicit node/edge graph.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GraphRecord {
    #[serde(default, deserialize_with = "lenient_list")]
    pub nodes: Vec<NodeRecord>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub edges: Vec<EdgeRecord>,
    /// Everything else (environment, persona, version, ...).
    #[serde(flatten)]
    pub metadata: Attributes,
}

/// Node of an explicit graph.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct NodeRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(
        default,
        alias = "isStart",
        alias = "entry",
        alias = "entryPoint",
        alias = "entry_point",
        deserialize_with = "lenient_flag"
    )]
    pub is_start: Option<bool>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl NodeRecord {
    /// Returns true if the record declares itself as the graph's entry point.
    pub fn is_entry_point(&self) -> bool {
        self.is_start.unwrap_or(false)
            || self.kind.as_deref().is_some_and(|kind| {
                kind.eq_ignore_ascii_case("entry") || kind.eq_ignore_ascii_case("start")
            })
    }
}

/// Edge of an explicit graph.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EdgeRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub target: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: Option<String>,
    /// Everything else (conditions, ids, ...).
    #[serde(flatten)]
    pub attributes: Attributes,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Reads a flag from a boolean, a `true`/`yes`/`false`/`no` string or a
/// number. Anything else is treated as missing.
fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => readable_elements(items),
        Some(other) => {
            debug!(found = kind_of(&other); "Expected a list, reading as empty");
            Vec::new()
        }
        None => Vec::new(),
    })
}

/// Deserializes every element that can be read, dropping the rest.
fn readable_elements<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    let total = items.len();
    let elements: Vec<T> = items
        .into_iter()
        .filter_map(|item| T::deserialize(item).ok())
        .collect();
    if elements.len() < total {
        debug!(
            dropped = total - elements.len(),
            kept = elements.len();
            "Dropping unreadable input records"
        );
    }
    elements
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_bare_trace_list() {
        let source = GraphSource::from_json(
            r#"[
                {
                    "id": "t1",
                    "name": "checkout",
                    "steps": [
                        { "index": 0, "page": "/cart", "action": "click checkout" },
                        { "index": 1, "page": "/pay" }
                    ]
                }
            ]"#,
        )
        .unwrap();

        let traces = source.traces();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].key(0), "t1");
        assert_eq!(traces[0].steps[0].location(), Some("/cart"));
        assert_eq!(traces[0].steps[0].action.as_deref(), Some("click checkout"));
        assert_eq!(traces[0].steps[1].action, None);
    }

    #[test]
    fn test_parse_trace_list_with_metadata() {
        let source =
            GraphSource::from_json(r#"{ "traces": [ { "steps": [] } ], "persona": "admin" }"#)
                .unwrap();
        match source {
            GraphSource::TraceList(list) => {
                assert_eq!(list.traces.len(), 1);
                assert_eq!(list.metadata.get("persona"), Some(&json!("admin")));
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_parse_explicit_graph_with_passthrough() {
        let source = GraphSource::from_json(
            r#"{
                "nodes": [
                    { "id": "home", "label": "Home", "type": "page", "url": "/home" },
                    { "id": "login", "isStart": true }
                ],
                "edges": [
                    { "source": "login", "target": "home", "label": "submit", "conditions": ["valid"] }
                ],
                "environment": "staging",
                "version": 3
            }"#,
        )
        .unwrap();

        let GraphSource::Graph(record) = source else {
            panic!("expected explicit graph");
        };
        assert_eq!(record.nodes[0].kind.as_deref(), Some("page"));
        assert_eq!(record.nodes[0].attributes.get("url"), Some(&json!("/home")));
        assert!(record.nodes[1].is_entry_point());
        assert!(!record.nodes[0].is_entry_point());
        assert_eq!(
            record.edges[0].attributes.get("conditions"),
            Some(&json!(["valid"]))
        );
        assert_eq!(record.metadata.get("environment"), Some(&json!("staging")));
        assert_eq!(record.metadata.get("version"), Some(&json!(3)));
    }

    #[test]
    fn test_parse_wrapped_graph() {
        let source = GraphSource::from_json(
            r#"{ "graph": { "nodes": [ { "id": "a" } ] }, "persona": "guest" }"#,
        )
        .unwrap();
        let GraphSource::Wrapped(wrapped) = source else {
            panic!("expected wrapped graph");
        };
        assert_eq!(wrapped.graph.nodes.len(), 1);
        assert_eq!(wrapped.metadata.get("persona"), Some(&json!("guest")));
        assert!(wrapped.graph.edges.is_empty());
    }

    #[test]
    fn test_lenient_scalars() {
        let source = GraphSource::from_json(
            r#"{ "nodes": [ { "id": 7 }, { "id": { "nested": true } } ], "edges": [ { "source": 7 } ] }"#,
        )
        .unwrap();
        let GraphSource::Graph(record) = source else {
            panic!("expected explicit graph");
        };
        assert_eq!(record.nodes[0].id.as_deref(), Some("7"));
        assert_eq!(record.nodes[1].id, None);
        assert_eq!(record.edges[0].source.as_deref(), Some("7"));
        assert_eq!(record.edges[0].target, None);
    }

    #[test]
    fn test_entry_point_by_type() {
        let node = NodeRecord {
            kind: Some("Entry".to_string()),
            ..NodeRecord::default()
        };
        assert!(node.is_entry_point());
    }

    #[test]
    fn test_blank_page_has_no_location() {
        let step = StepRecord {
            page: Some("   ".to_string()),
            ..StepRecord::default()
        };
        assert_eq!(step.location(), None);
    }

    #[test]
    fn test_invalid_json_is_input_error() {
        let err = GraphSource::from_json("[ { \"steps\": ").unwrap_err();
        assert!(matches!(err, StategraphError::Input { .. }));
    }

    #[test]
    fn test_odd_entry_flag_keeps_wrapped_graph() {
        let source = GraphSource::from_json(
            r#"{
                "graph": {
                    "nodes": [ { "id": "a", "isStart": "yes" }, { "id": "b" } ],
                    "edges": [ { "source": "a", "target": "b" } ]
                }
            }"#,
        )
        .unwrap();

        let GraphSource::Wrapped(wrapped) = source else {
            panic!("expected wrapped graph");
        };
        assert_eq!(wrapped.graph.nodes.len(), 2);
        assert_eq!(wrapped.graph.edges.len(), 1);
        assert!(wrapped.graph.nodes[0].is_entry_point());
        assert!(wrapped.metadata.is_empty());
    }

    #[test]
    fn test_odd_steps_keep_other_traces() {
        let source = GraphSource::from_json(
            r#"{
                "traces": [
                    { "id": "t1", "steps": [ { "page": "A" }, { "page": "B" } ] },
                    { "id": "t2", "steps": "oops" }
                ]
            }"#,
        )
        .unwrap();

        let GraphSource::TraceList(list) = source else {
            panic!("expected trace list");
        };
        assert_eq!(list.traces.len(), 2);
        assert_eq!(list.traces[0].steps.len(), 2);
        assert!(list.traces[1].steps.is_empty());
        assert!(list.metadata.is_empty());
    }

    #[test]
    fn test_odd_entry_flag_keeps_bare_graph() {
        let source = GraphSource::from_json(
            r#"{
                "nodes": [ { "id": "a" }, { "id": "b", "entry": "yes" }, { "id": "c", "entry": {} } ],
                "edges": [ { "source": "a", "target": "b" } ]
            }"#,
        )
        .unwrap();

        let GraphSource::Graph(record) = source else {
            panic!("expected explicit graph");
        };
        assert_eq!(record.nodes.len(), 3);
        assert!(!record.nodes[0].is_entry_point());
        assert!(record.nodes[1].is_entry_point());
        assert!(!record.nodes[2].is_entry_point());
    }

    #[test]
    fn test_unreadable_elements_are_dropped() {
        let source = GraphSource::from_json(
            r#"[ { "steps": [ { "page": "A" }, "B", 3, { "page": "C" } ] }, "not a trace" ]"#,
        )
        .unwrap();

        let traces = source.traces();
        assert_eq!(traces.len(), 1);
        let pages: Vec<_> = traces[0].steps.iter().filter_map(StepRecord::location).collect();
        assert_eq!(pages, ["A", "C"]);
    }

    #[test]
    fn test_unrecognized_top_level_is_rejected() {
        for src in ["42", r#""traces""#, r#"{ "environment": "staging" }"#, "{}"] {
            let err = GraphSource::from_json(src).unwrap_err();
            assert!(matches!(err, StategraphError::Input { .. }), "{src}");
        }
    }

    #[test]
    fn test_lenient_flag_spellings() {
        let nodes: Vec<NodeRecord> = serde_json::from_str(
            r#"[
                { "is_start": true }, { "entryPoint": "TRUE" }, { "entry_point": 1 },
                { "isStart": "no" }, { "isStart": 0 }, { "isStart": "maybe" }, { "isStart": null }
            ]"#,
        )
        .unwrap();
        let flags: Vec<_> = nodes.iter().map(|node| node.is_start).collect();
        assert_eq!(
            flags,
            [
                Some(true),
                Some(true),
                Some(true),
                Some(false),
                Some(false),
                None,
                None
            ]
        );
    }

    #[test]
    fn test_trace_key_fallbacks() {
        let named = TraceRecord {
            name: Some("smoke".to_string()),
            ..TraceRecord::default()
        };
        assert_eq!(named.key(3), "smoke");
        assert_eq!(TraceRecord::default().key(3), "trace-3");
    }
}
