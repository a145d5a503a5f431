//! Attribute stripping used to widen the matching search. Both functions
//! return a new molecule with identical topology and atom indices.

use crate::atom::Atom;
use crate::bond::Bond;
use crate::element::Element;
use crate::mol::Molecule;

/// Reduce a molecule to element-labelled topology: every bond becomes a
/// non-aromatic single bond and every formal charge zero. Idempotent.
pub fn normalize(mol: &Molecule) -> Molecule {
    mol.map(
        |atom| Atom {
            formal_charge: 0,
            ..atom.clone()
        },
        |_| Bond::single(),
    )
}

/// Relabel F, Cl, Br and I as carbon so that a reference halogen can pair
/// with whatever element the structure file guessed for that position.
pub fn generalize_halogens(mol: &Molecule) -> Molecule {
    mol.map(
        |atom| match atom.element() {
            Some(e) if e.is_halogen() => Atom {
                atomic_num: Element::C.atomic_num(),
                ..atom.clone()
            },
            _ => atom.clone(),
        },
        Bond::clone,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::BondOrder;
    use crate::smiles::{parse_smiles, reference_from_smiles};
    use petgraph::graph::NodeIndex;

    #[test]
    fn normalize_flattens_bonds_and_charges() {
        let mol = reference_from_smiles("C[N+](=O)[O-]").unwrap();
        let flat = normalize(&mol);
        assert_eq!(flat.atom_count(), mol.atom_count());
        assert_eq!(flat.bond_pairs(), mol.bond_pairs());
        for e in flat.bonds() {
            assert_eq!(flat.bond(e).order, BondOrder::Single);
            assert!(!flat.bond(e).is_aromatic);
        }
        assert!(flat.atoms().all(|i| flat.atom(i).formal_charge == 0));
    }

    #[test]
    fn normalize_keeps_other_atom_attributes() {
        let mol = reference_from_smiles("c1ccccc1").unwrap();
        let flat = normalize(&mol);
        for i in flat.atoms() {
            assert_eq!(flat.atom(i).atomic_num, 6);
            assert_eq!(flat.atom(i).hydrogen_count, 1);
            assert!(flat.atom(i).is_aromatic);
        }
    }

    #[test]
    fn normalize_is_idempotent_and_pure() {
        let mol = reference_from_smiles("O=C([O-])c1ccncc1").unwrap();
        let before = mol.clone();
        let once = normalize(&mol);
        assert_eq!(normalize(&once), once);
        assert_eq!(mol, before);
    }

    #[test]
    fn halogens_become_carbon() {
        let mol = parse_smiles("FC(Cl)(Br)CI").unwrap();
        let generalized = generalize_halogens(&mol);
        for i in generalized.atoms() {
            assert_eq!(generalized.atom(i).atomic_num, 6);
        }
        assert_eq!(generalized.atom(NodeIndex::new(0)).hydrogen_count, 0);
        assert_eq!(generalized.bond_pairs(), mol.bond_pairs());
    }

    #[test]
    fn non_halogens_untouched() {
        let mol = parse_smiles("OC(=O)CN[As]").unwrap();
        assert_eq!(generalize_halogens(&mol), mol);
    }
}
