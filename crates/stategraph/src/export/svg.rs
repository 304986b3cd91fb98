//! SVG rendering of a laid out state graph.
//!
//! The renderer draws edges first and nodes on top. Visual states from the
//! highlight overlays decide colors and opacity: highlighted elements use the
//! highlight color, dimmed ones are drawn with the dimmed opacity, and the
//! start node always gets its own stroke.

use indexmap::IndexSet;
use log::{debug, info};
use svg::{
    Document,
    node::{
        self,
        element::{Definitions, Group, Marker, Path, Rectangle, Text},
    },
};

use stategraph_core::{color::Color, geometry::Point, graph::Graph};

use super::Error;
use crate::{
    config::StyleConfig,
    highlight::{self, HighlightSet, VisualState},
    layout::{EdgeRoute, Layout},
};

const NODE_CORNER_RADIUS: f32 = 6.0;
const EDGE_WIDTH: f32 = 1.5;
const HIGHLIGHT_WIDTH: f32 = 3.0;
const LABEL_PADDING: f32 = 8.0;
/// Average glyph width relative to the font size, used to shorten labels.
const GLYPH_WIDTH_RATIO: f32 = 0.6;

/// Renders graphs and layouts to SVG documents with one resolved style.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    background: Option<Color>,
    node_fill: Color,
    node_stroke: Color,
    start_stroke: Color,
    edge_color: Color,
    highlight_color: Color,
    text_color: Color,
    dimmed_opacity: f32,
    font_family: String,
    font_size: f32,
}

impl SvgRenderer {
    /// Resolves every color of `style`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Style`] for the first color that does not parse.
    pub fn new(style: &StyleConfig) -> Result<Self, Error> {
        Ok(Self {
            background: style.background_color().map_err(Error::Style)?,
            node_fill: style.node_fill().map_err(Error::Style)?,
            node_stroke: style.node_stroke().map_err(Error::Style)?,
            start_stroke: style.start_stroke().map_err(Error::Style)?,
            edge_color: style.edge_color().map_err(Error::Style)?,
            highlight_color: style.highlight_color().map_err(Error::Style)?,
            text_color: style.text_color().map_err(Error::Style)?,
            dimmed_opacity: style.dimmed_opacity(),
            font_family: style.font_family().to_string(),
            font_size: style.font_size(),
        })
    }

    /// Draws `graph` at the positions of `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if `layout` has no placement for a node or
    /// no route for an edge of `graph`, i.e. it was computed for another graph.
    pub fn render(
        &self,
        graph: &Graph,
        layout: &Layout,
        selection: Option<&HighlightSet>,
    ) -> Result<Document, Error> {
        let bounds = layout.bounds();
        let mut doc = Document::new()
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    bounds.min_x(),
                    bounds.min_y(),
                    bounds.width(),
                    bounds.height()
                ),
            )
            .set("width", bounds.width())
            .set("height", bounds.height());

        if let Some(background) = self.background {
            doc = doc.add(
                Rectangle::new()
                    .set("x", bounds.min_x())
                    .set("y", bounds.min_y())
                    .set("width", bounds.width())
                    .set("height", bounds.height())
                    .set("fill", background)
                    .set("fill-opacity", background.alpha()),
            );
        }

        let marker_colors: IndexSet<Color> = [self.edge_color, self.highlight_color]
            .into_iter()
            .collect();
        doc = doc.add(create_marker_definitions(marker_colors.iter()));

        let mut edges = Group::new().set("class", "edges");
        for (edge, state) in highlight::edge_overlays(graph, selection) {
            let route = layout.route(edge.id().as_str()).ok_or_else(|| {
                Error::Render(format!("no route for edge `{}` in layout", edge.id()))
            })?;
            edges = edges.add(self.render_edge(route, edge.label(), state));
        }
        doc = doc.add(edges);

        let mut nodes = Group::new().set("class", "nodes");
        for (node, overlay) in highlight::node_overlays(graph, selection) {
            let placement = layout.placement(node.id().as_str()).ok_or_else(|| {
                Error::Render(format!("no placement for node `{}` in layout", node.id()))
            })?;
            nodes = nodes.add(self.render_node(
                placement.position(),
                layout.node_size().width(),
                layout.node_size().height(),
                node.label(),
                overlay,
            ));
        }
        doc = doc.add(nodes);

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            highlighted = selection.is_some();
            "SVG document rendered"
        );
        Ok(doc)
    }

    /// Same as [`SvgRenderer::render`], serialized to a string.
    ///
    /// # Errors
    ///
    /// See [`SvgRenderer::render`].
    pub fn render_to_string(
        &self,
        graph: &Graph,
        layout: &Layout,
        selection: Option<&HighlightSet>,
    ) -> Result<String, Error> {
        let doc = self.render(graph, layout, selection)?;
        info!("SVG rendered successfully");
        Ok(doc.to_string())
    }

    fn render_edge(&self, route: &EdgeRoute, label: Option<&str>, state: VisualState) -> Group {
        let (color, width) = match state {
            VisualState::Highlighted => (self.highlight_color, HIGHLIGHT_WIDTH),
            VisualState::Normal | VisualState::Dimmed => (self.edge_color, EDGE_WIDTH),
        };

        let mut path = Path::new()
            .set("d", create_path_data_from_points(route.points()))
            .set("fill", "none")
            .set("stroke", color)
            .set("stroke-width", width)
            .set(
                "marker-end",
                format!("url(#arrow-right-{})", color.to_id_safe_string()),
            );
        if route.reversed() {
            path = path.set("stroke-dasharray", "6 4");
        }

        let mut group = Group::new()
            .set("class", format!("edge {}", state_class(state)))
            .add(path);

        if let (Some(label), Some(anchor)) = (label, route.midpoint()) {
            let text = Text::new("")
                .set("x", anchor.x())
                .set("y", anchor.y() - LABEL_PADDING / 2.0)
                .set("text-anchor", "middle")
                .set("font-family", self.font_family.as_str())
                .set("font-size", self.font_size * 0.85)
                .set("fill", self.text_color)
                .add(node::Text::new(label));
            group = group.add(text);
        }

        if state == VisualState::Dimmed {
            group = group.set("opacity", self.dimmed_opacity);
        }
        group
    }

    fn render_node(
        &self,
        center: Point,
        width: f32,
        height: f32,
        label: &str,
        overlay: highlight::NodeOverlay,
    ) -> Group {
        let (stroke, stroke_width) = match overlay.state() {
            VisualState::Highlighted => (self.highlight_color, HIGHLIGHT_WIDTH),
            _ if overlay.is_start() => (self.start_stroke, 2.5),
            _ => (self.node_stroke, 1.0),
        };

        let rect = Rectangle::new()
            .set("x", center.x() - width / 2.0)
            .set("y", center.y() - height / 2.0)
            .set("width", width)
            .set("height", height)
            .set("rx", NODE_CORNER_RADIUS)
            .set("fill", self.node_fill)
            .set("stroke", stroke)
            .set("stroke-width", stroke_width);

        let text = Text::new("")
            .set("x", center.x())
            .set("y", center.y())
            .set("text-anchor", "middle")
            .set("dominant-baseline", "central")
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size)
            .set("fill", self.text_color)
            .add(node::Text::new(fit_label(label, width, self.font_size)));

        let mut class = format!("node {}", state_class(overlay.state()));
        if overlay.is_start() {
            class.push_str(" start");
        }

        let mut group = Group::new().set("class", class).add(rect).add(text);
        if overlay.state() == VisualState::Dimmed {
            group = group.set("opacity", self.dimmed_opacity);
        }
        group
    }
}

fn state_class(state: VisualState) -> &'static str {
    match state {
        VisualState::Normal => "normal",
        VisualState::Highlighted => "highlighted",
        VisualState::Dimmed => "dimmed",
    }
}

/// Creates one arrow-head marker per stroke color in use
fn create_marker_definitions<'a, I>(colors: I) -> Definitions
where
    I: Iterator<Item = &'a Color>,
{
    let mut defs = Definitions::new();

    for color in colors {
        let arrow_right = Marker::new()
            .set("id", format!("arrow-right-{}", color.to_id_safe_string()))
            .set("viewBox", "0 0 10 10")
            .set("refX", 9)
            .set("refY", 5)
            .set("markerWidth", 6)
            .set("markerHeight", 6)
            .set("orient", "auto")
            .add(
                Path::new()
                    .set("d", "M 0 0 L 10 5 L 0 10 z")
                    .set("fill", color.to_string()),
            );
        defs = defs.add(arrow_right);
    }

    defs
}

/// Create a path data string through all points
fn create_path_data_from_points(points: &[Point]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let command = if i == 0 { "M" } else { "L" };
            format!("{command} {} {}", point.x(), point.y())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shortens `label` with an ellipsis so it fits in a node of `width`.
fn fit_label(label: &str, width: f32, font_size: f32) -> String {
    let glyph_width = (font_size * GLYPH_WIDTH_RATIO).max(1.0);
    let max_chars = ((width - 2.0 * LABEL_PADDING) / glyph_width).floor().max(1.0) as usize;

    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut fitted: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    fitted.push('…');
    fitted
}
