//! Atom renumbering.

use petgraph::graph::NodeIndex;
use thiserror::Error;

use crate::mol::Mol;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenumberError {
    #[error("new order lists {got} atoms, molecule has {expected}")]
    WrongLength { got: usize, expected: usize },
    #[error("atom {} is out of range or listed twice", .0.index())]
    NotAPermutation(NodeIndex),
}

/// Rebuild `mol` so that new atom `i` is old atom `order[i]`. Bonds are
/// carried over between the renumbered endpoints.
pub fn renumber_atoms<A: Clone, B: Clone>(
    mol: &Mol<A, B>,
    order: &[NodeIndex],
) -> Result<Mol<A, B>, RenumberError> {
    let n = mol.atom_count();
    if order.len() != n {
        return Err(RenumberError::WrongLength {
            got: order.len(),
            expected: n,
        });
    }

    let mut new_index: Vec<Option<NodeIndex>> = vec![None; n];
    for (new, &old) in order.iter().enumerate() {
        if new_index.get(old.index()) != Some(&None) {
            return Err(RenumberError::NotAPermutation(old));
        }
        new_index[old.index()] = Some(NodeIndex::new(new));
    }

    let mut out = Mol::with_capacity(n, mol.bond_count());
    for &old in order {
        out.add_atom(mol.atom(old).clone());
    }
    for edge in mol.bonds() {
        let Some((a, b)) = mol.bond_endpoints(edge) else {
            continue;
        };
        if let (Some(na), Some(nb)) = (new_index[a.index()], new_index[b.index()]) {
            out.add_bond(na, nb, mol.bond(edge).clone());
        }
    }
    Ok(out)
}

/// Order that puts `leading` first, in the given order, followed by every
/// other atom of a molecule of `atom_count` atoms in ascending index
/// order. Entries of `leading` that are out of range or repeated are
/// passed through so that [`renumber_atoms`] reports them.
pub fn leading_order(leading: &[NodeIndex], atom_count: usize) -> Vec<NodeIndex> {
    let mut listed = vec![false; atom_count];
    for idx in leading {
        if let Some(flag) = listed.get_mut(idx.index()) {
            *flag = true;
        }
    }
    leading
        .iter()
        .copied()
        .chain(
            (0..atom_count)
                .filter(|&i| !listed[i])
                .map(NodeIndex::new),
        )
        .collect()
}
