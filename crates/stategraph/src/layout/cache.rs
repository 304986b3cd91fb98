//! Memoization of layouts by graph structure.

use std::{collections::VecDeque, rc::Rc};

use log::debug;

use stategraph_core::graph::Graph;

use super::{Layout, LayoutEngine};

const DEFAULT_CAPACITY: usize = 8;

/// Keeps the most recently used layouts, keyed by
/// [`LayoutEngine::fingerprint`].
///
/// A graph that differs from a cached one only in labels, attributes or
/// metadata gets the cached layout back without recomputation.
#[derive(Debug)]
pub struct LayoutCache {
    capacity: usize,
    /// Most recently used first.
    entries: VecDeque<(u64, Rc<Layout>)>,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LayoutCache {
    /// Creates a cache holding at most `capacity` layouts. A zero capacity
    /// disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Returns the cached layout of `graph`, computing and storing it on a miss.
    pub fn get_or_compute(&mut self, engine: &LayoutEngine, graph: &Graph) -> Rc<Layout> {
        let key = engine.fingerprint(graph);

        if let Some(idx) = self.entries.iter().position(|(k, _)| *k == key) {
            debug!(key = key; "Layout cache hit");
            if let Some(entry) = self.entries.remove(idx) {
                let layout = Rc::clone(&entry.1);
                self.entries.push_front(entry);
                return layout;
            }
        }

        debug!(key = key; "Layout cache miss");
        let layout = Rc::new(engine.layout(graph));
        if self.capacity > 0 {
            self.entries.truncate(self.capacity - 1);
            self.entries.push_front((key, Rc::clone(&layout)));
        }
        layout
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
