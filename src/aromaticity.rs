//! Hückel aromaticity on Kekulé structures.
//!
//! Each smallest ring is tested on its own: every member must be able to
//! contribute a π count and the ring total must be 4n+2.

use petgraph::graph::NodeIndex;

use crate::bond::BondOrder;
use crate::mol::{Mol, Molecule};
use crate::rings::{ring_bonds, RingInfo};
use crate::traits::{HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount};

const SP2_CAPABLE: [u8; 9] = [
    5,  // B
    6,  // C
    7,  // N
    8,  // O
    15, // P
    16, // S
    33, // As
    34, // Se
    52, // Te
];

/// Atoms and bonds that lie in at least one aromatic ring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AromaticSet {
    /// Indexed by atom index.
    pub atoms: Vec<bool>,
    /// Indexed by bond index.
    pub bonds: Vec<bool>,
}

pub fn find_aromatic<A, B>(mol: &Mol<A, B>) -> AromaticSet
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
    B: HasBondOrder,
{
    let mut set = AromaticSet {
        atoms: vec![false; mol.atom_count()],
        bonds: vec![false; mol.bond_count()],
    };

    for ring in RingInfo::smallest_rings(mol).rings() {
        if !is_aromatic_ring(mol, ring) {
            continue;
        }
        for &atom_idx in ring {
            set.atoms[atom_idx.index()] = true;
        }
        for (a, b) in ring_bonds(ring) {
            if let Some(edge) = mol.bond_between(a, b) {
                set.bonds[edge.index()] = true;
            }
        }
    }

    set
}

/// Overwrite the aromatic flags of every atom and bond with the perceived
/// ones. Bond orders are left alone.
pub fn set_aromaticity(mol: &mut Molecule) {
    let aromatic = find_aromatic(mol);
    let atoms: Vec<NodeIndex> = mol.atoms().collect();
    for idx in atoms {
        mol.atom_mut(idx).is_aromatic = aromatic.atoms[idx.index()];
    }
    let bonds: Vec<_> = mol.bonds().collect();
    for edge in bonds {
        mol.bond_mut(edge).is_aromatic = aromatic.bonds[edge.index()];
    }
}

fn is_aromatic_ring<A, B>(mol: &Mol<A, B>, ring: &[NodeIndex]) -> bool
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
    B: HasBondOrder,
{
    if ring.len() < 3 {
        return false;
    }
    if !ring
        .iter()
        .all(|&idx| SP2_CAPABLE.contains(&mol.atom(idx).atomic_num()))
    {
        return false;
    }
    let has_triple = ring_bonds(ring).any(|(a, b)| {
        mol.bond_between(a, b)
            .is_some_and(|e| mol.bond(e).bond_order() == BondOrder::Triple)
    });
    if has_triple {
        return false;
    }

    let mut pi_total: u8 = 0;
    for (i, &atom_idx) in ring.iter().enumerate() {
        match pi_electrons(mol, atom_idx, ring, i) {
            Some(e) => pi_total = pi_total.saturating_add(e),
            None => return false,
        }
    }

    is_huckel(pi_total)
}

/// Where a ring atom's double bond goes, if it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DoubleBond {
    None,
    InRing,
    /// Exocyclic, to an atom of the given atomic number.
    Exocyclic(u8),
}

fn double_bond_kind<A, B>(
    mol: &Mol<A, B>,
    atom_idx: NodeIndex,
    ring: &[NodeIndex],
    pos_in_ring: usize,
) -> DoubleBond
where
    A: HasAtomicNum,
    B: HasBondOrder,
{
    let len = ring.len();
    let prev = ring[(pos_in_ring + len - 1) % len];
    let next = ring[(pos_in_ring + 1) % len];

    let mut kind = DoubleBond::None;
    for edge in mol.bonds_of(atom_idx) {
        if mol.bond(edge).bond_order() != BondOrder::Double {
            continue;
        }
        let Some((a, b)) = mol.bond_endpoints(edge) else {
            continue;
        };
        let other = if a == atom_idx { b } else { a };
        if other == prev || other == next {
            return DoubleBond::InRing;
        }
        kind = DoubleBond::Exocyclic(mol.atom(other).atomic_num());
    }
    kind
}

fn pi_electrons<A, B>(
    mol: &Mol<A, B>,
    atom_idx: NodeIndex,
    ring: &[NodeIndex],
    pos_in_ring: usize,
) -> Option<u8>
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
    B: HasBondOrder,
{
    let atom = mol.atom(atom_idx);
    let double = double_bond_kind(mol, atom_idx, ring, pos_in_ring);
    let has_double = double != DoubleBond::None;
    let total_degree = mol.degree(atom_idx) + atom.hydrogen_count() as usize;

    match (atom.atomic_num(), atom.formal_charge()) {
        // carbonyl-like carbons give their π electrons to the heteroatom
        (6, 0) => match double {
            DoubleBond::InRing => Some(1),
            DoubleBond::Exocyclic(7 | 8 | 16) => Some(0),
            DoubleBond::Exocyclic(_) => Some(1),
            DoubleBond::None => None,
        },
        (6, -1) => Some(2),
        (6, 1) => Some(if has_double { 1 } else { 0 }),
        (7, 0) | (15, 0) | (33, 0) => {
            if has_double {
                Some(1)
            } else if total_degree <= 3 {
                Some(2)
            } else {
                None
            }
        }
        (7, 1) => (double == DoubleBond::InRing).then_some(1),
        (8 | 16 | 34 | 52, _) => match double {
            DoubleBond::InRing => Some(1),
            DoubleBond::None => Some(2),
            DoubleBond::Exocyclic(_) => None,
        },
        (5, _) => Some(if has_double { 1 } else { 0 }),
        _ => None,
    }
}

fn is_huckel(pi_electrons: u8) -> bool {
    pi_electrons >= 2 && (pi_electrons - 2) % 4 == 0
}
