use petgraph::graph::NodeIndex;
use thiserror::Error;

use crate::element::Element;
use crate::mol::Mol;
use crate::traits::{HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "atom {} ({}): valence {actual_valence} exceeds maximum {max_valence}",
    .atom_idx.index(),
    symbol(.atomic_num)
)]
pub struct ValenceError {
    pub atom_idx: NodeIndex,
    pub atomic_num: u8,
    pub actual_valence: u8,
    pub max_valence: u8,
}

fn symbol(atomic_num: &u8) -> &'static str {
    Element::from_atomic_num(*atomic_num).map_or("?", Element::symbol)
}

/// Bond-order sum plus attached hydrogens. Aromatic bonds count one.
pub fn total_valence<A, B>(mol: &Mol<A, B>, atom: NodeIndex) -> u8
where
    A: HasHydrogenCount,
    B: HasBondOrder,
{
    mol.bonds_of(atom)
        .map(|ei| mol.bond(ei).bond_order().valence())
        .fold(mol.atom(atom).hydrogen_count(), u8::saturating_add)
}

/// Reject neutral atoms whose valence exceeds the element's highest
/// default valence. Charged atoms and elements without tabulated valences
/// are not checked.
pub fn check_valence<A, B>(mol: &Mol<A, B>) -> Result<(), Vec<ValenceError>>
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
    B: HasBondOrder,
{
    let errors: Vec<ValenceError> = mol
        .atoms()
        .filter_map(|idx| {
            let atom = mol.atom(idx);
            if atom.formal_charge() != 0 {
                return None;
            }
            let elem = Element::from_atomic_num(atom.atomic_num())?;
            let max_valence = elem.default_valences().iter().copied().max()?;
            let v = total_valence(mol, idx);
            (v > max_valence).then_some(ValenceError {
                atom_idx: idx,
                atomic_num: atom.atomic_num(),
                actual_valence: v,
                max_valence,
            })
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::Bond;
    use crate::mol::Molecule;
    use crate::smiles::parse_smiles;

    #[test]
    fn common_molecules_valid() {
        for smiles in ["C", "CC", "O", "N", "c1ccccc1", "CS(=O)(=O)C", "S(F)(F)(F)(F)(F)F"] {
            let mol = parse_smiles(smiles).unwrap();
            assert!(check_valence(&mol).is_ok(), "{smiles}");
        }
    }

    #[test]
    fn under_valent_is_accepted() {
        let mol = parse_smiles("[CH2]").unwrap();
        assert!(check_valence(&mol).is_ok());
    }

    #[test]
    fn pentavalent_carbon_invalid() {
        let mut mol = Molecule::new();
        let c = mol.add_atom(Atom {
            atomic_num: 6,
            hydrogen_count: 5,
            ..Default::default()
        });
        let errs = check_valence(&mol).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].atom_idx, c);
        assert_eq!(errs[0].actual_valence, 5);
        assert_eq!(errs[0].max_valence, 4);
        assert_eq!(errs[0].to_string(), "atom 0 (C): valence 5 exceeds maximum 4");
    }

    #[test]
    fn double_bonded_halogen_invalid() {
        let mut mol = Molecule::new();
        let c = mol.add_atom(Atom {
            atomic_num: 6,
            hydrogen_count: 2,
            ..Default::default()
        });
        let cl = mol.add_atom(Atom {
            atomic_num: 17,
            ..Default::default()
        });
        mol.add_bond(c, cl, Bond::with_order(crate::bond::BondOrder::Double));
        let errs = check_valence(&mol).unwrap_err();
        assert_eq!(errs[0].atom_idx, cl);
    }

    #[test]
    fn charged_and_metal_atoms_skipped() {
        assert!(check_valence(&parse_smiles("[NH4+]").unwrap()).is_ok());
        assert!(check_valence(&parse_smiles("[Fe]").unwrap()).is_ok());
    }

    #[test]
    fn ethene_total_valence() {
        let mol = parse_smiles("C=C").unwrap();
        for idx in mol.atoms() {
            assert_eq!(total_valence(&mol, idx), 4);
        }
    }
}
