//! Drawing exporters for laid out state graphs.
//!
//! This is the final stage of the Stategraph pipeline. An exporter takes the
//! canonical [`Graph`], the [`Layout`] computed for it and an optional
//! [`HighlightSet`], and turns them into an output document.
//!
//! # Pipeline Position
//!
//! ```text
//! JSON input (traces or explicit graph)
//!     ↓ parse
//! GraphSource
//!     ↓ build
//! Graph
//!     ↓ layout            ↓ highlight
//! Layout               HighlightSet
//!     ↓ export (this module)
//! SVG document / JSON report
//! ```
//!
//! # Available Backends
//!
//! - [`svg`]: standalone SVG drawing via [`svg::SvgRenderer`]
//! - [`json`]: machine-readable report via [`json::render_report`]
//!
//! # Error Handling
//!
//! Export operations return [`Error`]. It converts into
//! [`StategraphError::Export`] at the crate boundary.
//!
//! [`Graph`]: crate::graph::Graph
//! [`Layout`]: crate::layout::Layout
//! [`HighlightSet`]: crate::highlight::HighlightSet
//! [`StategraphError::Export`]: crate::StategraphError::Export

/// JSON report backend.
pub mod json;
/// SVG export backend.
pub mod svg;

/// Errors that can occur during export.
///
/// This type is converted into [`StategraphError::Export`] at the crate
/// boundary via the [`From`] implementation in `error.rs`.
///
/// [`StategraphError::Export`]: crate::StategraphError::Export
#[derive(Debug)]
pub enum Error {
    /// A style setting could not be turned into a drawing attribute.
    Style(String),
    /// The layout does not match the graph being drawn, or the output could
    /// not be serialized.
    Render(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Style(msg) => write!(f, "Style error: {msg}"),
            Self::Render(msg) => write!(f, "Render error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
