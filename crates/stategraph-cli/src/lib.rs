//! CLI logic for the Stategraph tool.
//!
//! This module contains the core CLI logic: reading an input file, folding
//! it into a state graph, laying it out, optionally highlighting one path,
//! and writing the drawing.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, OutputFormat};

use std::fs;

use log::{info, warn};

use stategraph::{
    Pipeline, StategraphError, graph::Graph, highlight::HighlightSet, identifier::NodeId,
    input::GraphSource,
};

/// Run the Stategraph CLI application
///
/// This function processes the input file through the Stategraph pipeline
/// and writes the resulting SVG or JSON report to the output file.
///
/// # Errors
///
/// Returns `StategraphError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Input parsing errors
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), StategraphError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing state graph"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let src = fs::read_to_string(&args.input)?;

    let pipeline = Pipeline::new(app_config);
    let source = pipeline.parse(&src)?;
    let graph = pipeline.build(&source);
    let layout = pipeline.layout(&graph);
    let selection = select(&pipeline, &source, &graph, args);

    let output = match args.format {
        OutputFormat::Svg => pipeline.render_svg(&graph, &layout, selection.as_ref())?,
        OutputFormat::Json => pipeline.render_json(&graph, &layout, selection.as_ref())?,
    };

    fs::write(&args.output, output)?;

    info!(output_file = args.output, format:? = args.format; "Output exported successfully");

    Ok(())
}

/// Resolves the highlight requested on the command line, if any.
fn select(
    pipeline: &Pipeline,
    source: &GraphSource,
    graph: &Graph,
    args: &Args,
) -> Option<HighlightSet> {
    if let Some(key) = &args.trace {
        let selection = pipeline.highlight_trace(source, graph, key);
        if selection.is_none() {
            warn!(trace = key.as_str(); "No trace with this key, drawing without highlight");
        }
        return selection;
    }

    if args.path.is_empty() {
        return None;
    }

    let path: Vec<NodeId> = args.path.iter().map(|id| NodeId::new(id.trim())).collect();
    let selection = pipeline.highlight(graph, &path);
    info!(
        nodes = selection.node_ids().len(),
        edges = selection.edge_ids().len();
        "Path highlighted"
    );
    Some(selection)
}
