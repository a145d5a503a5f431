//! SMILES reading. Only the connectivity, element, charge and hydrogen
//! information is kept; stereo markers, isotopes and atom classes are
//! accepted and dropped.

mod builder;
pub mod error;
mod parse_tree;
mod tokenizer;

use tracing::debug;

use crate::hydrogen::remove_hs;
use crate::mol::Molecule;
use crate::sanitize::sanitize;
pub use error::SmilesError;

/// Parse a SMILES string into a molecular graph.
///
/// Aromatic atoms written next to each other get an `Aromatic` bond; no
/// perception or kekulization is done here. Use [`reference_from_smiles`]
/// for a fully annotated reference structure.
pub fn parse_smiles(s: &str) -> Result<Molecule, SmilesError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let tokens = tokenizer::tokenize(trimmed)?;
    if tokens.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let tree = parse_tree::build_parse_tree(&tokens)?;
    Ok(builder::build_mol(&tree))
}

/// Parse, fold explicit hydrogens into their heavy neighbors and sanitize.
///
/// The result carries bond orders, aromaticity, hybridization, hydrogen
/// counts and formal charges, which is everything reconciliation transfers.
pub fn reference_from_smiles(s: &str) -> Result<Molecule, SmilesError> {
    let parsed = parse_smiles(s)?;
    let heavy = remove_hs(&parsed);
    let reference = sanitize(&heavy)?;
    debug!(
        atoms = reference.atom_count(),
        bonds = reference.bond_count(),
        "built reference from SMILES"
    );
    Ok(reference)
}
