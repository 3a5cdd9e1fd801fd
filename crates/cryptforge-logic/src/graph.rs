//! Module adjacency implied by connector peer links.
//!
//! Modules never reference each other directly; two modules are adjacent when
//! one of their connectors is linked to the other's. `ConnectorGraph` turns
//! those links into an adjacency list and answers reachability questions.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};

/// A connected connector pair, by owning module id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorLink {
    pub module_a: u32,
    pub module_b: u32,
}

/// Undirected module graph built from connector links.
#[derive(Debug, Clone, Default)]
pub struct ConnectorGraph {
    /// module id → adjacent module ids (one entry per link)
    adj: HashMap<u32, Vec<u32>>,
    link_count: usize,
}

impl ConnectorGraph {
    /// Build the graph. Every id in `modules` becomes a node even without links.
    pub fn from_links(modules: impl IntoIterator<Item = u32>, links: &[ConnectorLink]) -> Self {
        let mut adj: HashMap<u32, Vec<u32>> = HashMap::new();
        for id in modules {
            adj.entry(id).or_default();
        }
        for link in links {
            adj.entry(link.module_a).or_default().push(link.module_b);
            adj.entry(link.module_b).or_default().push(link.module_a);
        }
        Self {
            adj,
            link_count: links.len(),
        }
    }

    pub fn neighbors(&self, module: u32) -> &[u32] {
        self.adj.get(&module).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn has_module(&self, module: u32) -> bool {
        self.adj.contains_key(&module)
    }

    pub fn module_count(&self) -> usize {
        self.adj.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_count
    }

    /// BFS hop count from `start` to every reachable module (start included at 0).
    pub fn distances_from(&self, start: u32) -> HashMap<u32, u32> {
        let mut dist = HashMap::new();
        if !self.has_module(start) {
            return dist;
        }
        let mut queue = VecDeque::new();
        dist.insert(start, 0);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let d = dist[&current];
            for &next in self.neighbors(current) {
                if let Entry::Vacant(e) = dist.entry(next) {
                    e.insert(d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }

    pub fn reachable_from(&self, start: u32) -> HashSet<u32> {
        self.distances_from(start).into_keys().collect()
    }

    /// Modules that cannot be reached from `start`, sorted by id.
    pub fn unreachable_from(&self, start: u32) -> Vec<u32> {
        let reached = self.reachable_from(start);
        let mut missing: Vec<u32> = self
            .adj
            .keys()
            .copied()
            .filter(|id| !reached.contains(id))
            .collect();
        missing.sort_unstable();
        missing
    }

    /// Shortest module path from `from` to `to`, both ends included.
    pub fn path(&self, from: u32, to: u32) -> Option<Vec<u32>> {
        if !self.has_module(from) || !self.has_module(to) {
            return None;
        }
        if from == to {
            return Some(vec![from]);
        }

        let mut came_from: HashMap<u32, u32> = HashMap::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for &next in self.neighbors(current) {
                if !visited.insert(next) {
                    continue;
                }
                came_from.insert(next, current);
                if next == to {
                    let mut path = vec![to];
                    let mut at = to;
                    while let Some(&prev) = came_from.get(&at) {
                        path.push(prev);
                        at = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }
}
