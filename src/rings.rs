use std::collections::{HashSet, VecDeque};

use petgraph::algo::connected_components;
use petgraph::graph::NodeIndex;

use crate::mol::Mol;

/// Smallest ring through every ring bond.
///
/// Each ring is stored as a closed path: consecutive entries (and the last
/// and first) are bonded. For fused systems this finds the rings an SSSR
/// would, plus occasionally an extra envelope ring.
#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    rings: Vec<Vec<NodeIndex>>,
}

impl RingInfo {
    pub fn smallest_rings<A, B>(mol: &Mol<A, B>) -> Self {
        if Self::expected_ring_count(mol) == 0 {
            return Self::default();
        }

        let mut seen: HashSet<Vec<NodeIndex>> = HashSet::new();
        let mut rings = Vec::new();
        for (a, b) in mol.bond_pairs() {
            let Some(ring) = shortest_cycle_through(mol, a, b) else {
                continue;
            };
            let mut key = ring.clone();
            key.sort();
            if seen.insert(key) {
                rings.push(ring);
            }
        }
        rings.sort_by_key(Vec::len);

        Self { rings }
    }

    /// Cyclomatic number: bonds - atoms + connected components.
    pub fn expected_ring_count<A, B>(mol: &Mol<A, B>) -> usize {
        let components = connected_components(mol.graph());
        (mol.bond_count() + components).saturating_sub(mol.atom_count())
    }

    pub fn num_rings(&self) -> usize {
        self.rings.len()
    }

    pub fn rings(&self) -> &[Vec<NodeIndex>] {
        &self.rings
    }

    pub fn is_ring_atom(&self, atom: NodeIndex) -> bool {
        self.rings.iter().any(|ring| ring.contains(&atom))
    }

    pub fn is_ring_bond(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.rings
            .iter()
            .any(|ring| ring_bonds(ring).any(|(x, y)| (x == a && y == b) || (x == b && y == a)))
    }
}

/// Consecutive atom pairs of a closed ring path.
pub fn ring_bonds(ring: &[NodeIndex]) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
    let len = ring.len();
    (0..len).map(move |i| (ring[i], ring[(i + 1) % len]))
}

/// Shortest path from `a` to `b` that does not use the bond `a`-`b`,
/// closed into a ring. Neighbors are explored in index order so the
/// result is deterministic.
fn shortest_cycle_through<A, B>(
    mol: &Mol<A, B>,
    a: NodeIndex,
    b: NodeIndex,
) -> Option<Vec<NodeIndex>> {
    let mut prev: Vec<Option<NodeIndex>> = vec![None; mol.atom_count()];
    let mut visited = vec![false; mol.atom_count()];
    let mut queue = VecDeque::new();
    visited[a.index()] = true;
    queue.push_back(a);

    while let Some(u) = queue.pop_front() {
        let mut next: Vec<NodeIndex> = mol.neighbors(u).collect();
        next.sort();
        for v in next {
            if u == a && v == b {
                continue;
            }
            if visited[v.index()] {
                continue;
            }
            visited[v.index()] = true;
            prev[v.index()] = Some(u);
            if v == b {
                let mut path = vec![b];
                let mut cur = b;
                while let Some(p) = prev[cur.index()] {
                    path.push(p);
                    cur = p;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(v);
        }
    }
    None
}
