//! Subgraph matching between a reference (pattern) and a target molecule.
//!
//! A [`Correspondence`] maps every pattern atom to a distinct target atom
//! such that every pattern bond lands on a target bond. Extra target bonds
//! are allowed, which is what lets spurious connectivity be pruned later.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::{Mol, Molecule};

/// Injective map from reference atom indices to target atom indices,
/// stored by reference index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Correspondence(Vec<NodeIndex>);

impl Correspondence {
    /// `targets[i]` is the target atom paired with reference atom `i`.
    pub fn new(targets: Vec<NodeIndex>) -> Self {
        Self(targets)
    }

    pub fn target_of(&self, reference: NodeIndex) -> Option<NodeIndex> {
        self.0.get(reference.index()).copied()
    }

    pub fn reference_of(&self, target: NodeIndex) -> Option<NodeIndex> {
        self.0
            .iter()
            .position(|&t| t == target)
            .map(NodeIndex::new)
    }

    /// Inverse lookup table sized for a target of `target_count` atoms.
    pub fn inverse(&self, target_count: usize) -> Vec<Option<NodeIndex>> {
        let mut inv = vec![None; target_count];
        for (r, &t) in self.0.iter().enumerate() {
            if let Some(slot) = inv.get_mut(t.index()) {
                *slot = Some(NodeIndex::new(r));
            }
        }
        inv
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(reference, target)` pairs in reference order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.0.iter().enumerate().map(|(r, &t)| (NodeIndex::new(r), t))
    }

    pub fn as_slice(&self) -> &[NodeIndex] {
        &self.0
    }

    /// Whether this is a structure-preserving embedding of `pattern` into
    /// `target`: total, injective, in range and bond preserving.
    pub fn is_embedding<A, B, A2, B2>(&self, pattern: &Mol<A, B>, target: &Mol<A2, B2>) -> bool {
        if self.0.len() != pattern.atom_count() {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.0.len());
        if !self
            .0
            .iter()
            .all(|t| t.index() < target.atom_count() && seen.insert(*t))
        {
            return false;
        }
        pattern
            .bond_pairs()
            .into_iter()
            .all(|(a, b)| target.bond_between(self.0[a.index()], self.0[b.index()]).is_some())
    }
}

/// Whether correspondences that cover the same target atoms count once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    /// Report one correspondence per distinct target atom set.
    Unique,
    /// Report every correspondence, including symmetry-equivalent ones.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("subgraph search gave up after {visits} candidate visits")]
    BudgetExhausted { visits: u64 },
}

/// Finds embeddings of a pattern molecule in a target molecule.
pub trait GraphMatcher {
    /// Correspondences in ascending lexicographic order of the target
    /// sequence, at most `limit` of them. An empty vector means no
    /// embedding exists; running out of search budget is an error.
    fn find_matches(
        &self,
        pattern: &Molecule,
        target: &Molecule,
        mode: MatchMode,
        limit: Option<usize>,
    ) -> Result<Vec<Correspondence>, MatchError>;

    fn find_first(
        &self,
        pattern: &Molecule,
        target: &Molecule,
        mode: MatchMode,
    ) -> Result<Option<Correspondence>, MatchError> {
        Ok(self
            .find_matches(pattern, target, mode, Some(1))?
            .into_iter()
            .next())
    }
}

impl<M: GraphMatcher + ?Sized> GraphMatcher for &M {
    fn find_matches(
        &self,
        pattern: &Molecule,
        target: &Molecule,
        mode: MatchMode,
        limit: Option<usize>,
    ) -> Result<Vec<Correspondence>, MatchError> {
        (**self).find_matches(pattern, target, mode, limit)
    }
}

/// Same element; a charged pattern atom also needs the same charge.
pub fn atoms_compatible(pattern: &Atom, target: &Atom) -> bool {
    pattern.atomic_num == target.atomic_num
        && (pattern.formal_charge == 0 || pattern.formal_charge == target.formal_charge)
}

/// Equal order, or both bonds aromatic.
pub fn bonds_compatible(pattern: &Bond, target: &Bond) -> bool {
    pattern.order == target.order || (pattern.is_aromatic && target.is_aromatic)
}

/// Depth-first VF2-style matcher.
///
/// Pattern atoms are assigned in index order and target candidates are
/// tried in ascending index order, so correspondences come out in
/// lexicographic order. `max_visits` caps the number of (pattern atom,
/// target atom) pairs examined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vf2Matcher {
    pub max_visits: Option<u64>,
}

impl Vf2Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(max_visits: u64) -> Self {
        Self {
            max_visits: Some(max_visits),
        }
    }
}

impl GraphMatcher for Vf2Matcher {
    fn find_matches(
        &self,
        pattern: &Molecule,
        target: &Molecule,
        mode: MatchMode,
        limit: Option<usize>,
    ) -> Result<Vec<Correspondence>, MatchError> {
        if pattern.atom_count() > target.atom_count() || pattern.bond_count() > target.bond_count()
        {
            return Ok(Vec::new());
        }
        let mut state = Vf2::new(pattern, target, atoms_compatible, bonds_compatible);
        state.max_visits = self.max_visits;
        state.limit = limit;
        state.unique = mode == MatchMode::Unique;
        state.recurse(0)?;
        Ok(state.results)
    }
}

struct Vf2<'a, A, B, FA, FB> {
    pattern: &'a Mol<A, B>,
    target: &'a Mol<A, B>,
    atom_match: FA,
    bond_match: FB,
    pattern_map: Vec<Option<NodeIndex>>,
    target_used: Vec<bool>,
    /// Pattern neighbors with a lower index, per pattern atom.
    back_neighbors: Vec<Vec<NodeIndex>>,
    max_visits: Option<u64>,
    visits: u64,
    limit: Option<usize>,
    unique: bool,
    seen_sets: HashSet<Vec<usize>>,
    results: Vec<Correspondence>,
}

impl<'a, A, B, FA, FB> Vf2<'a, A, B, FA, FB>
where
    FA: Fn(&A, &A) -> bool,
    FB: Fn(&B, &B) -> bool,
{
    fn new(pattern: &'a Mol<A, B>, target: &'a Mol<A, B>, atom_match: FA, bond_match: FB) -> Self {
        let back_neighbors = pattern
            .atoms()
            .map(|p| {
                let mut earlier: Vec<NodeIndex> =
                    pattern.neighbors(p).filter(|&q| q < p).collect();
                earlier.sort();
                earlier
            })
            .collect();
        Self {
            pattern,
            target,
            atom_match,
            bond_match,
            pattern_map: vec![None; pattern.atom_count()],
            target_used: vec![false; target.atom_count()],
            back_neighbors,
            max_visits: None,
            visits: 0,
            limit: None,
            unique: false,
            seen_sets: HashSet::new(),
            results: Vec::new(),
        }
    }

    fn done(&self) -> bool {
        self.limit.is_some_and(|l| self.results.len() >= l)
    }

    fn recurse(&mut self, depth: usize) -> Result<(), MatchError> {
        if depth == self.pattern.atom_count() {
            self.record();
            return Ok(());
        }

        let pattern_node = NodeIndex::new(depth);
        for target_node in self.candidates(pattern_node) {
            if self.target_used[target_node.index()] {
                continue;
            }

            self.visits += 1;
            if self.max_visits.is_some_and(|max| self.visits > max) {
                return Err(MatchError::BudgetExhausted {
                    visits: self.visits - 1,
                });
            }

            if !self.is_feasible(pattern_node, target_node) {
                continue;
            }

            self.pattern_map[depth] = Some(target_node);
            self.target_used[target_node.index()] = true;

            let outcome = self.recurse(depth + 1);

            self.pattern_map[depth] = None;
            self.target_used[target_node.index()] = false;

            outcome?;
            if self.done() {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Target atoms adjacent to the image of an already mapped neighbor,
    /// or every target atom when none is mapped yet. Ascending order.
    fn candidates(&self, pattern_node: NodeIndex) -> Vec<NodeIndex> {
        let anchor = self.back_neighbors[pattern_node.index()]
            .first()
            .and_then(|q| self.pattern_map[q.index()]);
        match anchor {
            Some(image) => {
                let mut around: Vec<NodeIndex> = self.target.neighbors(image).collect();
                around.sort();
                around
            }
            None => self.target.atoms().collect(),
        }
    }

    fn is_feasible(&self, pattern_node: NodeIndex, target_node: NodeIndex) -> bool {
        if self.pattern.degree(pattern_node) > self.target.degree(target_node) {
            return false;
        }
        if !(self.atom_match)(self.pattern.atom(pattern_node), self.target.atom(target_node)) {
            return false;
        }

        self.back_neighbors[pattern_node.index()].iter().all(|&q| {
            let Some(t_mapped) = self.pattern_map[q.index()] else {
                return false;
            };
            match (
                self.pattern.bond_between(pattern_node, q),
                self.target.bond_between(target_node, t_mapped),
            ) {
                (Some(pb), Some(tb)) => (self.bond_match)(self.pattern.bond(pb), self.target.bond(tb)),
                _ => false,
            }
        })
    }

    fn record(&mut self) {
        let targets: Vec<NodeIndex> = self.pattern_map.iter().flatten().copied().collect();
        if self.unique {
            let mut key: Vec<usize> = targets.iter().map(|t| t.index()).collect();
            key.sort_unstable();
            if !self.seen_sets.insert(key) {
                return;
            }
        }
        self.results.push(Correspondence::new(targets));
    }
}
