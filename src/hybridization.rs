//! Hybridization perception.
//!
//! Orbital count = σ neighbors (graph neighbors plus attached hydrogens)
//! + lone pairs + unpaired electrons. Four orbitals on an atom that takes
//! part in a conjugated bond (amide N, phenol O, pyrrole N) are counted as
//! sp2.
//!
//! Expects a Kekulé molecule with atom aromaticity already perceived:
//! aromatic bond orders would undercount the valence.

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Hybridization;
use crate::bond::BondOrder;
use crate::element::{outer_shell_electrons, Element};
use crate::mol::Mol;
use crate::traits::{
    HasAromaticity, HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount,
};
use crate::valence::total_valence;

/// Hybridization of every atom, indexed by atom index.
pub fn assign_hybridization<A, B>(mol: &Mol<A, B>) -> Vec<Hybridization>
where
    A: HasAtomicNum + HasHydrogenCount + HasFormalCharge + HasAromaticity,
    B: HasBondOrder,
{
    let conjugated = conjugated_bonds(mol);
    mol.atoms()
        .map(|idx| {
            let has_conj = mol.bonds_of(idx).any(|e| conjugated[e.index()]);
            atom_hybridization(mol, idx, has_conj)
        })
        .collect()
}

fn sigma_degree<A: HasHydrogenCount, B>(mol: &Mol<A, B>, idx: NodeIndex) -> u8 {
    (mol.degree(idx) as u8).saturating_add(mol.atom(idx).hydrogen_count())
}

fn atom_hybridization<A, B>(
    mol: &Mol<A, B>,
    idx: NodeIndex,
    has_conjugated_bond: bool,
) -> Hybridization
where
    A: HasAtomicNum + HasHydrogenCount + HasFormalCharge,
    B: HasBondOrder,
{
    let atomic_num = mol.atom(idx).atomic_num();
    if atomic_num == 0 {
        return Hybridization::Other;
    }

    let degree = sigma_degree(mol, idx) as i16;
    let norbs = if atomic_num == 1 || atomic_num >= 89 {
        degree
    } else {
        degree + electron_domains(mol, idx)
    };

    match norbs {
        i16::MIN..=1 => Hybridization::S,
        2 => Hybridization::SP,
        3 => Hybridization::SP2,
        4 if degree <= 3 && has_conjugated_bond => Hybridization::SP2,
        4 => Hybridization::SP3,
        5 => Hybridization::SP3D,
        6 => Hybridization::SP3D2,
        _ => Hybridization::Other,
    }
}

/// Lone pairs plus unpaired electrons. Radicals only count for atoms
/// short of an octet.
fn electron_domains<A, B>(mol: &Mol<A, B>, idx: NodeIndex) -> i16
where
    A: HasAtomicNum + HasHydrogenCount + HasFormalCharge,
    B: HasBondOrder,
{
    let atom = mol.atom(idx);
    let nouter = outer_shell_electrons(atom.atomic_num()) as i16;
    let valence = total_valence(mol, idx) as i16;
    let charge = atom.formal_charge() as i16;
    let free = nouter - (valence + charge);

    if valence + nouter - charge < 8 {
        let radicals = num_radical_electrons(mol, idx) as i16;
        (free - radicals) / 2 + radicals
    } else {
        free / 2
    }
}

/// Unpaired electrons on an atom, inferred from the gap between its
/// valence shell and its bonding.
pub fn num_radical_electrons<A, B>(mol: &Mol<A, B>, idx: NodeIndex) -> u8
where
    A: HasAtomicNum + HasHydrogenCount + HasFormalCharge,
    B: HasBondOrder,
{
    let atom = mol.atom(idx);
    let Some(elem) = Element::from_atomic_num(atom.atomic_num()) else {
        return 0;
    };
    let charge = atom.formal_charge() as i16;
    let n_outer = outer_shell_electrons(atom.atomic_num()) as i16;
    let valences = elem.default_valences();

    if valences.is_empty() {
        // metals: only isolated ions with an odd shell count
        if mol.degree(idx) > 0 {
            return 0;
        }
        return (n_outer - charge).max(0).rem_euclid(2) as u8;
    }

    let valence = total_valence(mol, idx) as i16;
    let shell = if atom.atomic_num() <= 2 { 2 } else { 8 };

    let mut radicals = shell - n_outer - valence + charge;
    if radicals < 0 {
        radicals = if valences.len() > 1 {
            valences
                .iter()
                .map(|&v| v as i16 - valence + charge)
                .find(|&r| r >= 0)
                .unwrap_or(0)
        } else {
            0
        };
    }

    let from_shell = n_outer - valence - charge;
    if (0..radicals).contains(&from_shell) {
        radicals = from_shell;
    }
    radicals.clamp(0, u8::MAX as i16) as u8
}

/// Atoms that can donate or accept π density: lowest default valence of at
/// least two, at most three σ neighbors, and an electron count left over.
/// Heavier chalcogens and pnictogens only qualify as terminal atoms.
fn is_conj_candidate<A, B>(mol: &Mol<A, B>, idx: NodeIndex) -> bool
where
    A: HasAtomicNum + HasHydrogenCount + HasFormalCharge,
    B: HasBondOrder,
{
    let atom = mol.atom(idx);
    let anum = atom.atomic_num();
    let Some(&default_val) =
        Element::from_atomic_num(anum).and_then(|e| e.default_valences().first())
    else {
        return false;
    };
    if default_val <= 1 {
        return false;
    }

    if atom.formal_charge() == 0 && total_valence(mol, idx) > default_val {
        return false;
    }

    let nouter = outer_shell_electrons(anum);
    let degree = sigma_degree(mol, idx);
    let row_ok = anum <= 10 || (nouter != 5 && nouter != 6) || (nouter == 6 && degree < 2);
    if !row_ok || degree > 3 {
        return false;
    }

    let lone = (nouter as i16 - default_val as i16 - atom.formal_charge() as i16).max(0);
    let radicals = num_radical_electrons(mol, idx) as i16;
    default_val as i16 - degree as i16 + lone - radicals > 0
}

fn other_end<A, B>(mol: &Mol<A, B>, edge: EdgeIndex, from: NodeIndex) -> Option<NodeIndex> {
    let (a, b) = mol.bond_endpoints(edge)?;
    Some(if a == from { b } else { a })
}

/// Per-bond conjugation flags, indexed by bond index. Bonds between
/// aromatic atoms are conjugated; otherwise a multiple bond and a
/// neighboring bond on a candidate atom are conjugated together.
fn conjugated_bonds<A, B>(mol: &Mol<A, B>) -> Vec<bool>
where
    A: HasAtomicNum + HasHydrogenCount + HasFormalCharge + HasAromaticity,
    B: HasBondOrder,
{
    let mut conjugated = vec![false; mol.bond_count()];

    for edge in mol.bonds() {
        if let Some((a, b)) = mol.bond_endpoints(edge) {
            conjugated[edge.index()] = mol.atom(a).is_aromatic() && mol.atom(b).is_aromatic();
        }
    }

    for center in mol.atoms() {
        if !(2..=3).contains(&sigma_degree(mol, center)) || !is_conj_candidate(mol, center) {
            continue;
        }
        let bonds: Vec<EdgeIndex> = mol.bonds_of(center).collect();

        for &multiple in &bonds {
            let order = mol.bond(multiple).bond_order();
            if !matches!(order, BondOrder::Double | BondOrder::Triple) {
                continue;
            }
            if !other_end(mol, multiple, center).is_some_and(|o| is_conj_candidate(mol, o)) {
                continue;
            }
            for &partner in &bonds {
                if partner == multiple {
                    continue;
                }
                let Some(far) = other_end(mol, partner, center) else {
                    continue;
                };
                if sigma_degree(mol, far) <= 3 && is_conj_candidate(mol, far) {
                    conjugated[multiple.index()] = true;
                    conjugated[partner.index()] = true;
                }
            }
        }
    }

    conjugated
}
