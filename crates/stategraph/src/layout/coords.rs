//! Coordinate assignment and edge routing.
//!
//! Ranks are columns read left to right. Within a column the vertices are
//! stacked top to bottom in their final order, real nodes taking the full
//! node height and virtual vertices none, with `node_gap` between
//! consecutive vertices. Every column is centered vertically against the
//! tallest one.

use stategraph_core::geometry::{Bounds, Point, Size};

use super::{LayoutEngine, order::LayeredGraph};

/// Vertex centers plus the drawing bounds they produce.
#[derive(Debug, Clone, Default)]
pub(super) struct Coordinates {
    /// Center of every vertex, real and virtual, indexed by vertex.
    pub centers: Vec<Point>,
    pub bounds: Bounds,
}

pub(super) fn assign_coordinates(layered: &LayeredGraph, engine: &LayoutEngine) -> Coordinates {
    let ranks = layered.ranks();
    if ranks.is_empty() {
        return Coordinates::default();
    }

    let node_width = engine.node_size.width();
    let vertex_height = |vertex: usize| {
        if layered.is_virtual(vertex) {
            0.0
        } else {
            engine.node_size.height()
        }
    };

    let rank_heights: Vec<f32> = ranks
        .iter()
        .map(|rank| {
            let heights: f32 = rank.iter().map(|&vertex| vertex_height(vertex)).sum();
            heights + engine.node_gap * rank.len().saturating_sub(1) as f32
        })
        .collect();
    let tallest = rank_heights.iter().copied().fold(0.0_f32, f32::max);

    let mut centers = vec![Point::default(); layered.vertex_count()];
    for (rank_idx, rank) in ranks.iter().enumerate() {
        let x = engine.margin + rank_idx as f32 * (node_width + engine.rank_gap) + node_width / 2.0;
        let mut y = engine.margin + (tallest - rank_heights[rank_idx]) / 2.0;

        for (position, &vertex) in rank.iter().enumerate() {
            if position > 0 {
                y += engine.node_gap;
            }
            let height = vertex_height(vertex);
            centers[vertex] = Point::new(x, y + height / 2.0);
            y += height;
        }
    }

    let rank_count = ranks.len() as f32;
    let size = Size::new(
        2.0 * engine.margin + rank_count * node_width + (rank_count - 1.0) * engine.rank_gap,
        2.0 * engine.margin + tallest,
    );

    Coordinates {
        centers,
        bounds: Bounds::new_from_top_left(Point::default(), size),
    }
}

/// Polyline for one chain: from the right side of the upper node, through
/// the virtual vertices, to the left side of the lower node. Reversed edges
/// run the other way.
pub(super) fn route(
    chain: &[usize],
    centers: &[Point],
    node_size: Size,
    reversed: bool,
) -> Vec<Point> {
    let half_width = node_size.width() / 2.0;
    let last = chain.len().saturating_sub(1);

    let mut points: Vec<Point> = chain
        .iter()
        .enumerate()
        .map(|(i, &vertex)| {
            let center = centers[vertex];
            if i == 0 {
                center.with_x(center.x() + half_width)
            } else if i == last {
                center.with_x(center.x() - half_width)
            } else {
                center
            }
        })
        .collect();

    if reversed {
        points.reverse();
    }
    points
}
