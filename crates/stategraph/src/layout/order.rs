//! Vertex ordering within ranks: virtual vertices and crossing reduction.

use log::{debug, trace};

use super::rank::Ranking;

/// The ranked graph with every multi-rank edge split into unit segments.
///
/// Vertices `0..real_count` are the graph's nodes, in insertion order;
/// vertices from `real_count` on are virtual vertices, appended in edge order.
#[derive(Debug, Clone)]
pub(super) struct LayeredGraph {
    real_count: usize,
    /// Vertices of every rank, in their current order.
    ranks: Vec<Vec<usize>>,
    vertex_rank: Vec<usize>,
    /// Neighbors on the previous rank.
    upper: Vec<Vec<usize>>,
    /// Neighbors on the next rank.
    lower: Vec<Vec<usize>>,
    /// Per ranked edge: upper endpoint, virtual vertices, lower endpoint.
    chains: Vec<Vec<usize>>,
}

impl LayeredGraph {
    pub fn new(ranking: &Ranking) -> Self {
        let real_count = ranking.ranks.len();
        let mut layered = Self {
            real_count,
            ranks: vec![Vec::new(); ranking.rank_count()],
            vertex_rank: ranking.ranks.clone(),
            upper: vec![Vec::new(); real_count],
            lower: vec![Vec::new(); real_count],
            chains: Vec::with_capacity(ranking.edges.len()),
        };

        for (vertex, &rank) in ranking.ranks.iter().enumerate() {
            layered.ranks[rank].push(vertex);
        }

        for edge in &ranking.edges {
            let upper_rank = layered.vertex_rank[edge.upper];
            let lower_rank = layered.vertex_rank[edge.lower];

            let mut chain = Vec::with_capacity(lower_rank - upper_rank + 1);
            chain.push(edge.upper);
            for rank in upper_rank + 1..lower_rank {
                chain.push(layered.add_virtual_vertex(rank));
            }
            chain.push(edge.lower);

            for segment in chain.windows(2) {
                layered.lower[segment[0]].push(segment[1]);
                layered.upper[segment[1]].push(segment[0]);
            }
            layered.chains.push(chain);
        }

        layered
    }

    fn add_virtual_vertex(&mut self, rank: usize) -> usize {
        let vertex = self.vertex_rank.len();
        self.vertex_rank.push(rank);
        self.upper.push(Vec::new());
        self.lower.push(Vec::new());
        self.ranks[rank].push(vertex);
        vertex
    }

    pub fn ranks(&self) -> &[Vec<usize>] {
        &self.ranks
    }

    pub fn chains(&self) -> &[Vec<usize>] {
        &self.chains
    }

    pub fn is_virtual(&self, vertex: usize) -> bool {
        vertex >= self.real_count
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_rank.len()
    }

    /// Position of every vertex within its rank.
    fn positions(&self) -> Vec<usize> {
        let mut positions = vec![0; self.vertex_count()];
        for rank in &self.ranks {
            for (position, &vertex) in rank.iter().enumerate() {
                positions[vertex] = position;
            }
        }
        positions
    }

    /// Number of pairwise segment crossings between adjacent ranks.
    pub fn count_crossings(&self) -> usize {
        let positions = self.positions();
        let mut total = 0;

        for rank in &self.ranks {
            let segments: Vec<(usize, usize)> = rank
                .iter()
                .flat_map(|&vertex| {
                    self.lower[vertex]
                        .iter()
                        .map(move |&next| (vertex, next))
                })
                .map(|(from, to)| (positions[from], positions[to]))
                .collect();

            for (i, &(a_from, a_to)) in segments.iter().enumerate() {
                for &(b_from, b_to) in &segments[i + 1..] {
                    if (a_from < b_from && a_to > b_to) || (a_from > b_from && a_to < b_to) {
                        total += 1;
                    }
                }
            }
        }

        total
    }

    /// Reorders one rank by the barycenter of each vertex's neighbors on the
    /// adjacent rank. Vertices without such neighbors keep their position as
    /// their key; equal keys fall back to insertion order.
    fn sort_rank(&mut self, rank: usize, downward: bool) {
        let positions = self.positions();
        let neighbors = if downward { &self.upper } else { &self.lower };

        let mut keyed: Vec<(f64, usize)> = self.ranks[rank]
            .iter()
            .enumerate()
            .map(|(position, &vertex)| {
                let adjacent = &neighbors[vertex];
                let key = if adjacent.is_empty() {
                    position as f64
                } else {
                    let sum: usize = adjacent.iter().map(|&n| positions[n]).sum();
                    sum as f64 / adjacent.len() as f64
                };
                (key, vertex)
            })
            .collect();

        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        self.ranks[rank] = keyed.into_iter().map(|(_, vertex)| vertex).collect();
    }

    /// Runs `passes` rounds of downward and upward barycenter sweeps and keeps
    /// the ordering with the fewest crossings seen. Returns that count.
    pub fn reduce_crossings(&mut self, passes: usize) -> usize {
        let mut best_crossings = self.count_crossings();
        let mut best_ranks = self.ranks.clone();
        let initial = best_crossings;

        for pass in 0..passes {
            if best_crossings == 0 {
                break;
            }

            for rank in 1..self.ranks.len() {
                self.sort_rank(rank, true);
            }
            self.keep_if_better(&mut best_ranks, &mut best_crossings);

            for rank in (0..self.ranks.len().saturating_sub(1)).rev() {
                self.sort_rank(rank, false);
            }
            self.keep_if_better(&mut best_ranks, &mut best_crossings);

            trace!(pass = pass, crossings = best_crossings; "Ordering pass done");
        }

        self.ranks = best_ranks;
        debug!(
            initial = initial,
            crossings = best_crossings,
            vertices = self.vertex_count();
            "Crossing reduction done"
        );
        best_crossings
    }

    fn keep_if_better(&self, best_ranks: &mut Vec<Vec<usize>>, best_crossings: &mut usize) {
        let crossings = self.count_crossings();
        if crossings < *best_crossings {
            *best_crossings = crossings;
            best_ranks.clone_from(&self.ranks);
        }
    }
}
