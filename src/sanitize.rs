//! Chemistry perception for a heavy-atom graph: Kekulé form, valence check,
//! aromaticity and hybridization.

use thiserror::Error;
use tracing::debug;

use crate::aromaticity::set_aromaticity;
use crate::bond::BondOrder;
use crate::hybridization::assign_hybridization;
use crate::kekulize::{kekulize, KekulizeError};
use crate::mol::Molecule;
use crate::valence::{check_valence, ValenceError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    #[error(transparent)]
    Kekulize(#[from] KekulizeError),
    #[error("valence check failed: {}", join(.errors))]
    Valence { errors: Vec<ValenceError> },
}

fn join(errors: &[ValenceError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Return a sanitized copy of `mol`.
///
/// 1. aromatic bond orders are kekulized;
/// 2. neutral atoms above their highest default valence are rejected;
/// 3. aromatic rings are perceived on the Kekulé form and the atom and
///    bond flags overwritten;
/// 4. hybridization is assigned;
/// 5. bonds inside aromatic rings get order [`BondOrder::Aromatic`].
///
/// Hydrogen counts and formal charges are taken as given.
pub fn sanitize(mol: &Molecule) -> Result<Molecule, SanitizeError> {
    let mut out = kekulize(mol)?;
    check_valence(&out).map_err(|errors| SanitizeError::Valence { errors })?;

    set_aromaticity(&mut out);

    let hybridization = assign_hybridization(&out);
    let atoms: Vec<_> = out.atoms().collect();
    for idx in atoms {
        out.atom_mut(idx).hybridization = hybridization[idx.index()];
    }

    let bonds: Vec<_> = out.bonds().collect();
    for edge in bonds {
        let bond = out.bond_mut(edge);
        if bond.is_aromatic {
            bond.order = BondOrder::Aromatic;
        }
    }

    debug!(
        atoms = out.atom_count(),
        aromatic_atoms = out.atoms().filter(|&i| out.atom(i).is_aromatic).count(),
        "sanitized molecule"
    );
    Ok(out)
}
