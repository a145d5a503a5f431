//! Copying chemical attributes from a reference onto a target under a
//! correspondence. Both functions leave their inputs untouched and return
//! the annotated target.

use petgraph::graph::NodeIndex;
use thiserror::Error;

use crate::mol::Molecule;
use crate::substruct::Correspondence;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The correspondence does not describe an embedding of the reference
    /// into the target.
    #[error("reference bond {}-{} has no target bond between {}-{}", .reference.0.index(), .reference.1.index(), .target.0.index(), .target.1.index())]
    MissingBond {
        reference: (NodeIndex, NodeIndex),
        target: (NodeIndex, NodeIndex),
    },
    #[error("reference atom {} maps to target atom {}, which does not exist", .reference.index(), .target.index())]
    AtomOutOfRange {
        reference: NodeIndex,
        target: NodeIndex,
    },
    #[error("correspondence covers {covered} atoms but the reference has {expected}")]
    WrongLength { covered: usize, expected: usize },
    #[error("target atom {} is assigned to more than one reference atom", .0.index())]
    DuplicateTarget(NodeIndex),
}

fn check_shape(
    reference: &Molecule,
    target: &Molecule,
    correspondence: &Correspondence,
) -> Result<(), TransferError> {
    if correspondence.len() != reference.atom_count() {
        return Err(TransferError::WrongLength {
            covered: correspondence.len(),
            expected: reference.atom_count(),
        });
    }
    let mut taken = vec![false; target.atom_count()];
    for (r, t) in correspondence.iter() {
        match taken.get_mut(t.index()) {
            None => {
                return Err(TransferError::AtomOutOfRange {
                    reference: r,
                    target: t,
                })
            }
            Some(true) => return Err(TransferError::DuplicateTarget(t)),
            Some(flag) => *flag = true,
        }
    }
    Ok(())
}

/// Give every target bond that a reference bond maps onto the reference's
/// order and aromatic flag. Target bonds without a reference counterpart
/// keep what they had.
pub fn transfer_bond_attributes(
    reference: &Molecule,
    target: &Molecule,
    correspondence: &Correspondence,
) -> Result<Molecule, TransferError> {
    check_shape(reference, target, correspondence)?;
    let mut out = target.clone();
    for edge in reference.bonds() {
        let Some((a, b)) = reference.bond_endpoints(edge) else {
            continue;
        };
        let ta = correspondence.as_slice()[a.index()];
        let tb = correspondence.as_slice()[b.index()];
        let target_edge = out
            .bond_between(ta, tb)
            .ok_or(TransferError::MissingBond {
                reference: (a, b),
                target: (ta, tb),
            })?;
        let source = reference.bond(edge);
        let bond = out.bond_mut(target_edge);
        bond.order = source.order;
        bond.is_aromatic = source.is_aromatic;
    }
    Ok(out)
}

/// Copy hybridization, aromaticity, hydrogen count and formal charge of
/// each reference atom onto its target atom. With `restore_element` the
/// target atom also takes the reference's atomic number. Coordinates are
/// never touched.
pub fn transfer_atom_attributes(
    reference: &Molecule,
    target: &Molecule,
    correspondence: &Correspondence,
    restore_element: bool,
) -> Result<Molecule, TransferError> {
    check_shape(reference, target, correspondence)?;
    let mut out = target.clone();
    for (r, t) in correspondence.iter() {
        let source = reference.atom(r);
        let atom = out.atom_mut(t);
        atom.hybridization = source.hybridization;
        atom.is_aromatic = source.is_aromatic;
        atom.hydrogen_count = source.hydrogen_count;
        atom.formal_charge = source.formal_charge;
        if restore_element {
            atom.atomic_num = source.atomic_num;
        }
    }
    Ok(out)
}
