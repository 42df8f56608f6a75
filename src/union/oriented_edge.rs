use std::collections::BTreeMap;

/// A point on the compressed integer grid.
pub type GridPoint = (usize, usize);

/// A sequence of grid points linked by consecutive edges.
pub type Chain = Vec<GridPoint>;

/// A directed segment between two grid points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedEdge {
    x1: usize,
    y1: usize,
    x2: usize,
    y2: usize,
}

impl OrientedEdge {
    #[must_use]
    pub fn new(x1: usize, y1: usize, x2: usize, y2: usize) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[must_use]
    pub fn x1(&self) -> usize {
        self.x1
    }

    #[must_use]
    pub fn y1(&self) -> usize {
        self.y1
    }

    #[must_use]
    pub fn x2(&self) -> usize {
        self.x2
    }

    #[must_use]
    pub fn y2(&self) -> usize {
        self.y2
    }

    #[must_use]
    pub fn start(&self) -> GridPoint {
        (self.x1, self.y1)
    }

    #[must_use]
    pub fn end(&self) -> GridPoint {
        (self.x2, self.y2)
    }

    /// Returns `true` if the edge goes toward increasing `y`.
    #[must_use]
    pub fn is_downward(&self) -> bool {
        self.y1 < self.y2
    }

    #[must_use]
    pub fn is_vertical(&self) -> bool {
        self.x1 == self.x2
    }
}

/// Stitches directed edges into chains.
///
/// Each chain starts at the first unvisited edge and follows, from the end
/// point of the current edge, the most recently indexed edge starting there.
/// A chain stops when no unused edge leaves its last point. Closed loops
/// repeat their first point at the end.
#[must_use]
pub fn extract_chains(edges: &[OrientedEdge]) -> Vec<Chain> {
    let mut index: BTreeMap<GridPoint, Vec<usize>> = BTreeMap::new();
    for (i, edge) in edges.iter().enumerate() {
        index.entry(edge.start()).or_default().push(i);
    }

    let mut visited = vec![false; edges.len()];
    let mut chains = Vec::new();

    for first in 0..edges.len() {
        if visited[first] {
            continue;
        }

        let mut chain = vec![edges[first].start()];
        let mut current = first;

        loop {
            visited[current] = true;
            let edge = &edges[current];

            if let Some(outgoing) = index.get_mut(&edge.start()) {
                outgoing.pop();
            }
            chain.push(edge.end());

            match index.get(&edge.end()).and_then(|outgoing| outgoing.last()) {
                Some(&next) => current = next,
                None => break,
            }
        }

        chains.push(chain);
    }

    chains
}
