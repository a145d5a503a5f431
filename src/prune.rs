//! Removal of target bonds the reference does not support.

use petgraph::graph::NodeIndex;

use crate::mol::Molecule;
use crate::substruct::Correspondence;

/// Target bonds between two mapped atoms whose reference preimages are not
/// bonded. Pairs are `(low, high)` target indices in ascending order.
pub fn unsupported_bonds(
    reference: &Molecule,
    target: &Molecule,
    correspondence: &Correspondence,
) -> Vec<(NodeIndex, NodeIndex)> {
    let inverse = correspondence.inverse(target.atom_count());
    target
        .bond_pairs()
        .into_iter()
        .filter(|&(u, v)| match (inverse[u.index()], inverse[v.index()]) {
            (Some(a), Some(b)) => reference.bond_between(a, b).is_none(),
            _ => false,
        })
        .collect()
}

/// Delete every unsupported target bond. Bonds touching an atom outside
/// the correspondence image are kept. Returns the pruned copy and the
/// removed pairs in target indices.
pub fn prune_spurious_bonds(
    reference: &Molecule,
    target: &Molecule,
    correspondence: &Correspondence,
) -> (Molecule, Vec<(NodeIndex, NodeIndex)>) {
    let spurious = unsupported_bonds(reference, target, correspondence);
    let mut out = target.clone();
    for &(u, v) in &spurious {
        out.remove_bond(u, v);
    }
    (out, spurious)
}
