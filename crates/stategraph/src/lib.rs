//! Stategraph - state graphs of applications, collected from UI exploration and test runs.
//!
//! The crate folds raw observations (test traces or an explicit node/edge
//! list) into a canonical directed graph, lays it out left to right with a
//! layered algorithm, and resolves the subgraph walked by one path so that it
//! can be emphasized when drawn.
//!
//! The pipeline stages are available as modules ([`input`], [`builder`],
//! [`layout`], [`highlight`], [`export`]) and through the [`Pipeline`]
//! facade, which also memoizes layouts.

pub mod builder;
pub mod config;
pub mod export;
pub mod highlight;
pub mod input;
pub mod layout;

mod error;

pub use stategraph_core::{color, geometry, graph, identifier};

pub use error::StategraphError;

use std::{cell::RefCell, fs, path::Path, rc::Rc};

use log::{debug, info};

use config::AppConfig;
use graph::Graph;
use highlight::HighlightSet;
use identifier::NodeId;
use input::GraphSource;
use layout::{Layout, LayoutCache, LayoutEngine};

/// Facade over parsing, building, layout, highlighting and export.
///
/// # Examples
///
/// ```rust
/// use stategraph::{Pipeline, config::AppConfig, identifier::NodeId};
///
/// let pipeline = Pipeline::new(AppConfig::default());
///
/// let graph = pipeline
///     .load(r#"[
///         { "id": "t1", "steps": [ { "page": "A" }, { "page": "B" }, { "page": "C" } ] },
///         { "id": "t2", "steps": [ { "page": "A" }, { "page": "D" }, { "page": "C" } ] }
///     ]"#)
///     .expect("Failed to load graph");
///
/// let layout = pipeline.layout(&graph);
/// let path = ["A", "B", "C"].map(NodeId::from);
/// let selection = pipeline.highlight(&graph, &path);
///
/// let svg = pipeline
///     .render_svg(&graph, &layout, Some(&selection))
///     .expect("Failed to render");
/// assert!(svg.contains("<svg"));
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: AppConfig,
    engine: LayoutEngine,
    cache: RefCell<LayoutCache>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Pipeline {
    /// Create a new pipeline with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let engine = LayoutEngine::from_config(config.layout());
        Self {
            config,
            engine,
            cache: RefCell::new(LayoutCache::default()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a JSON document into a [`GraphSource`].
    ///
    /// # Errors
    ///
    /// Returns [`StategraphError::Input`] if the text is not JSON or matches
    /// none of the accepted input shapes.
    pub fn parse(&self, src: &str) -> Result<GraphSource, StategraphError> {
        info!(bytes = src.len(); "Parsing graph input");
        let source = GraphSource::from_json(src)?;
        debug!(traces = source.traces().len(); "Graph input parsed");
        Ok(source)
    }

    /// Build the canonical graph of a parsed input. Never fails.
    pub fn build(&self, source: &GraphSource) -> Graph {
        builder::build(source)
    }

    /// Parse and build in one step.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::parse`].
    pub fn load(&self, src: &str) -> Result<Graph, StategraphError> {
        let source = self.parse(src)?;
        Ok(self.build(&source))
    }

    /// Read, parse and build a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`StategraphError::Io`] if the file cannot be read, otherwise
    /// see [`Pipeline::parse`].
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Graph, StategraphError> {
        let src = fs::read_to_string(path)?;
        self.load(&src)
    }

    /// Lay out `graph`, reusing the layout of a structurally identical graph
    /// when one is cached.
    pub fn layout(&self, graph: &Graph) -> Rc<Layout> {
        self.cache.borrow_mut().get_or_compute(&self.engine, graph)
    }

    /// Resolve the nodes and edges walked by `path`.
    pub fn highlight(&self, graph: &Graph, path: &[NodeId]) -> HighlightSet {
        highlight::resolve_highlight(graph, path)
    }

    /// Resolve the path walked by the trace with key `trace` of `source`.
    ///
    /// Returns `None` if `source` has no such trace.
    pub fn highlight_trace(
        &self,
        source: &GraphSource,
        graph: &Graph,
        trace: &str,
    ) -> Option<HighlightSet> {
        let path = builder::trace_path(source, trace)?;
        Some(self.highlight(graph, path.nodes()))
    }

    /// Render `graph` at the positions of `layout` to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns [`StategraphError::Export`] if a style color is invalid or the
    /// layout does not belong to `graph`.
    pub fn render_svg(
        &self,
        graph: &Graph,
        layout: &Layout,
        selection: Option<&HighlightSet>,
    ) -> Result<String, StategraphError> {
        let renderer = export::svg::SvgRenderer::new(self.config.style())?;
        Ok(renderer.render_to_string(graph, layout, selection)?)
    }

    /// Render `graph` and `layout` as a JSON report.
    ///
    /// # Errors
    ///
    /// Returns [`StategraphError::Export`] if the layout does not belong to
    /// `graph`.
    pub fn render_json(
        &self,
        graph: &Graph,
        layout: &Layout,
        selection: Option<&HighlightSet>,
    ) -> Result<String, StategraphError> {
        Ok(export::json::render_report(graph, layout, selection)?)
    }
}
