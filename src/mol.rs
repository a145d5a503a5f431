use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::atom::Atom;
use crate::bond::Bond;

/// The concrete molecule type every stage of reconciliation works on.
pub type Molecule = Mol<Atom, Bond>;

/// Undirected molecular graph. Node indices are atom indices and stay
/// stable for the lifetime of a value; at most one bond joins a pair.
pub struct Mol<A, B> {
    graph: UnGraph<A, B>,
}

impl<A, B> Mol<A, B> {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
        }
    }

    pub fn with_capacity(atoms: usize, bonds: usize) -> Self {
        Self {
            graph: UnGraph::with_capacity(atoms, bonds),
        }
    }

    pub fn graph(&self) -> &UnGraph<A, B> {
        &self.graph
    }

    pub fn atom(&self, idx: NodeIndex) -> &A {
        &self.graph[idx]
    }

    pub fn atom_mut(&mut self, idx: NodeIndex) -> &mut A {
        &mut self.graph[idx]
    }

    pub fn bond(&self, idx: EdgeIndex) -> &B {
        &self.graph[idx]
    }

    pub fn bond_mut(&mut self, idx: EdgeIndex) -> &mut B {
        &mut self.graph[idx]
    }

    pub fn add_atom(&mut self, atom: A) -> NodeIndex {
        self.graph.add_node(atom)
    }

    /// Add a bond between two distinct atoms. If the pair is already bonded
    /// the existing bond is replaced and its index returned.
    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: B) -> EdgeIndex {
        debug_assert_ne!(a, b, "self-bonds are not allowed");
        self.graph.update_edge(a, b, bond)
    }

    /// Remove the bond between `a` and `b`, if any.
    ///
    /// petgraph moves the last bond into the freed slot, so previously
    /// obtained `EdgeIndex` values may be invalidated. Atom indices are not
    /// affected.
    pub fn remove_bond(&mut self, a: NodeIndex, b: NodeIndex) -> Option<B> {
        let edge = self.graph.find_edge(a, b)?;
        self.graph.remove_edge(edge)
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges(idx).count()
    }

    pub fn bonds_of(&self, idx: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges(idx).map(|e| e.id())
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn bonds(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    pub fn bond_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    /// All bonds as `(a, b)` pairs with `a < b`, in bond-index order.
    pub fn bond_pairs(&self) -> Vec<(NodeIndex, NodeIndex)> {
        self.graph
            .edge_references()
            .map(|e| {
                let (s, t) = (e.source(), e.target());
                if s.index() <= t.index() {
                    (s, t)
                } else {
                    (t, s)
                }
            })
            .collect()
    }

    /// Build a new molecule with the same topology and index layout,
    /// transforming every atom and bond.
    pub fn map<A2, B2>(
        &self,
        mut atom_fn: impl FnMut(&A) -> A2,
        mut bond_fn: impl FnMut(&B) -> B2,
    ) -> Mol<A2, B2> {
        Mol {
            graph: self.graph.map(|_, a| atom_fn(a), |_, b| bond_fn(b)),
        }
    }
}

impl<A: Clone, B: Clone> Clone for Mol<A, B> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
        }
    }
}

impl<A, B> Default for Mol<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Two molecules are equal when they have the same atoms in the same order
/// and the same set of bonds, regardless of bond insertion order.
impl<A: PartialEq, B: PartialEq> PartialEq for Mol<A, B> {
    fn eq(&self, other: &Self) -> bool {
        if self.atom_count() != other.atom_count() || self.bond_count() != other.bond_count() {
            return false;
        }
        if self.atoms().any(|idx| self.atom(idx) != other.atom(idx)) {
            return false;
        }
        self.bonds().all(|edge| {
            let Some((a, b)) = self.bond_endpoints(edge) else {
                return false;
            };
            other
                .bond_between(a, b)
                .is_some_and(|o| self.bond(edge) == other.bond(o))
        })
    }
}

impl<A: std::fmt::Debug, B: std::fmt::Debug> std::fmt::Debug for Mol<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mol")
            .field("atom_count", &self.atom_count())
            .field("bond_count", &self.bond_count())
            .finish()
    }
}
