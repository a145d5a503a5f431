use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::mol::Molecule;
use crate::smiles::parse_tree::{ParseAtom, ParseTree};
use crate::smiles::tokenizer::BondToken;

pub fn build_mol(tree: &ParseTree) -> Molecule {
    let mut mol = Molecule::with_capacity(tree.atoms.len(), tree.atoms.len());
    let node_indices: Vec<NodeIndex> = tree
        .atoms
        .iter()
        .map(|parse_atom| {
            mol.add_atom(Atom {
                atomic_num: parse_atom.element.atomic_num(),
                formal_charge: parse_atom.charge,
                is_aromatic: parse_atom.is_aromatic,
                ..Atom::default()
            })
        })
        .collect();

    for (i, parse_atom) in tree.atoms.iter().enumerate() {
        for neighbor in &parse_atom.neighbors {
            let j = neighbor.atom_idx;
            if j < i {
                continue;
            }
            let order = resolve_bond_order(
                neighbor.bond,
                parse_atom.is_aromatic,
                tree.atoms[j].is_aromatic,
            );
            mol.add_bond(node_indices[i], node_indices[j], Bond::with_order(order));
        }
    }

    for (i, parse_atom) in tree.atoms.iter().enumerate() {
        let h = match parse_atom.hcount {
            Some(explicit) => explicit,
            None => implicit_hydrogens(&mol, node_indices[i], parse_atom),
        };
        mol.atom_mut(node_indices[i]).hydrogen_count = h;
    }

    mol
}

/// An unwritten bond between two aromatic atoms is aromatic; any other
/// unwritten bond is single.
fn resolve_bond_order(
    bond_tok: Option<BondToken>,
    from_aromatic: bool,
    to_aromatic: bool,
) -> BondOrder {
    match bond_tok {
        Some(BondToken::Single) => BondOrder::Single,
        Some(BondToken::Double) => BondOrder::Double,
        Some(BondToken::Triple) => BondOrder::Triple,
        Some(BondToken::Aromatic) => BondOrder::Aromatic,
        None if from_aromatic && to_aromatic => BondOrder::Aromatic,
        None => BondOrder::Single,
    }
}

/// Hydrogens needed to reach the lowest default valence that accommodates
/// the explicit bonds. Aromatic atoms give one valence unit to the ring.
fn implicit_hydrogens(mol: &Molecule, node: NodeIndex, parse_atom: &ParseAtom) -> u8 {
    let valences = parse_atom.element.default_valences();
    let bond_sum: u8 = mol
        .bonds_of(node)
        .map(|e| mol.bond(e).order.valence())
        .fold(0u8, u8::saturating_add);

    let Some(&target) = valences.iter().find(|&&v| v >= bond_sum) else {
        return 0;
    };

    let h = target - bond_sum;
    if parse_atom.is_aromatic {
        h.saturating_sub(1)
    } else {
        h
    }
}
