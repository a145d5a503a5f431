//! Removal of explicit hydrogen nodes.

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::mol::Molecule;

/// Fold explicit hydrogen atoms into the `hydrogen_count` of their heavy
/// neighbor and drop them from the graph.
///
/// A hydrogen is removed when it is neutral and bonded to exactly one
/// non-hydrogen atom. Bare protons, hydride ions and H–H pairs stay as
/// graph nodes. Surviving atoms keep their relative order.
pub fn remove_hs(mol: &Molecule) -> Molecule {
    let node_count = mol.atom_count();
    let mut removable = vec![false; node_count];
    let mut extra_h: Vec<u8> = vec![0; node_count];

    for idx in mol.atoms() {
        let atom = mol.atom(idx);
        if !atom.is_hydrogen() || atom.formal_charge != 0 {
            continue;
        }
        let neighbors: Vec<NodeIndex> = mol.neighbors(idx).collect();
        if let &[parent] = neighbors.as_slice() {
            if !mol.atom(parent).is_hydrogen() {
                removable[idx.index()] = true;
                extra_h[parent.index()] = extra_h[parent.index()].saturating_add(1);
            }
        }
    }

    if !removable.contains(&true) {
        return mol.clone();
    }

    let mut result = Molecule::with_capacity(node_count, mol.bond_count());
    let mut index_map: Vec<Option<NodeIndex>> = vec![None; node_count];

    for idx in mol.atoms() {
        if removable[idx.index()] {
            continue;
        }
        let atom = mol.atom(idx);
        let new_idx = result.add_atom(Atom {
            hydrogen_count: atom.hydrogen_count.saturating_add(extra_h[idx.index()]),
            ..atom.clone()
        });
        index_map[idx.index()] = Some(new_idx);
    }

    for (a, b) in mol.bond_pairs() {
        let (Some(new_a), Some(new_b)) = (index_map[a.index()], index_map[b.index()]) else {
            continue;
        };
        if let Some(edge) = mol.bond_between(a, b) {
            result.add_bond(new_a, new_b, mol.bond(edge).clone());
        }
    }

    result
}
