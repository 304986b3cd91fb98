//! Stategraph Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Stategraph
//! builder, layout engine and renderers. It includes:
//!
//! - **Identifiers**: Node and edge identifiers, and the canonical edge id format ([`identifier`])
//! - **Graph**: The canonical, deduplicated state graph ([`graph`] module)
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)

pub mod color;
pub mod geometry;
pub mod graph;
pub mod identifier;
