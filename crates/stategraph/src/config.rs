//! Configuration types for Stategraph layout and rendering.
//!
//! All types implement [`serde::Deserialize`] with per-field defaults, so a
//! configuration file only needs to name the values it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and style settings.
//! - [`LayoutConfig`] - Node size, spacing and crossing-reduction effort.
//! - [`StyleConfig`] - Colors and fonts used by the SVG exporter.
//!
//! # Example
//!
//! ```
//! # use stategraph::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().node_width(), 180.0);
//! assert!(config.style().highlight_color().is_ok());
//! ```

use serde::Deserialize;

use stategraph_core::color::Color;

/// Top-level configuration combining layout and style settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified layout and style configurations.
    pub fn new(layout: LayoutConfig, style: StyleConfig) -> Self {
        Self { layout, style }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

/// Geometry settings of the layered layout.
///
/// Every node is drawn as a `node_width` x `node_height` rectangle. Ranks
/// are columns `rank_gap` apart; nodes in a column are `node_gap` apart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    node_width: f32,
    node_height: f32,
    rank_gap: f32,
    node_gap: f32,
    margin: f32,
    /// Number of down+up barycenter sweeps during crossing reduction.
    ordering_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 180.0,
            node_height: 56.0,
            rank_gap: 96.0,
            node_gap: 32.0,
            margin: 40.0,
            ordering_passes: 4,
        }
    }
}

impl LayoutConfig {
    pub fn node_width(&self) -> f32 {
        self.node_width
    }

    pub fn node_height(&self) -> f32 {
        self.node_height
    }

    pub fn rank_gap(&self) -> f32 {
        self.rank_gap
    }

    pub fn node_gap(&self) -> f32 {
        self.node_gap
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    pub fn ordering_passes(&self) -> usize {
        self.ordering_passes
    }

    /// Sets the node rectangle size (builder style).
    pub fn with_node_size(mut self, width: f32, height: f32) -> Self {
        self.node_width = width;
        self.node_height = height;
        self
    }

    /// Sets the gaps between ranks and between nodes of a rank (builder style).
    pub fn with_gaps(mut self, rank_gap: f32, node_gap: f32) -> Self {
        self.rank_gap = rank_gap;
        self.node_gap = node_gap;
        self
    }
}

/// Visual styling configuration for exported drawings.
///
/// Colors are CSS color strings. Unset fields fall back to the renderer
/// defaults returned by the accessors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    background_color: Option<String>,
    node_fill: String,
    node_stroke: String,
    start_stroke: String,
    edge_color: String,
    highlight_color: String,
    text_color: String,
    /// Opacity applied to elements outside the current highlight.
    dimmed_opacity: f32,
    font_family: String,
    font_size: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: None,
            node_fill: "#f8fafc".to_string(),
            node_stroke: "#475569".to_string(),
            start_stroke: "#16a34a".to_string(),
            edge_color: "#64748b".to_string(),
            highlight_color: "#f97316".to_string(),
            text_color: "#0f172a".to_string(),
            dimmed_opacity: 0.25,
            font_family: "sans-serif".to_string(),
            font_size: 13.0,
        }
    }
}

impl StyleConfig {
    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }

    pub fn node_fill(&self) -> Result<Color, String> {
        parse_color("node_fill", &self.node_fill)
    }

    pub fn node_stroke(&self) -> Result<Color, String> {
        parse_color("node_stroke", &self.node_stroke)
    }

    pub fn start_stroke(&self) -> Result<Color, String> {
        parse_color("start_stroke", &self.start_stroke)
    }

    pub fn edge_color(&self) -> Result<Color, String> {
        parse_color("edge_color", &self.edge_color)
    }

    pub fn highlight_color(&self) -> Result<Color, String> {
        parse_color("highlight_color", &self.highlight_color)
    }

    pub fn text_color(&self) -> Result<Color, String> {
        parse_color("text_color", &self.text_color)
    }

    /// Opacity for dimmed elements, clamped to `0.0..=1.0`.
    pub fn dimmed_opacity(&self) -> f32 {
        self.dimmed_opacity.clamp(0.0, 1.0)
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }
}

fn parse_color(field: &str, value: &str) -> Result<Color, String> {
    Color::new(value).map_err(|err| format!("Invalid {field} in config: {err}"))
}
