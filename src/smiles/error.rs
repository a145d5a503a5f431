use thiserror::Error;

use crate::sanitize::SanitizeError;

/// Errors produced when turning a SMILES string into a reference molecule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmilesError {
    /// The input string was empty or contained only whitespace.
    #[error("empty SMILES string")]
    EmptyInput,
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    #[error("invalid element '{text}' at position {pos}")]
    InvalidElement { pos: usize, text: String },
    /// A bracket atom `[` was opened but never closed with `]`.
    #[error("unclosed bracket atom starting at position {pos}")]
    UnclosedBracket { pos: usize },
    /// A ring-opening digit was never matched by a ring-closing digit.
    #[error("unclosed ring {digit}")]
    UnclosedRing { digit: u16 },
    #[error("unmatched parenthesis at position {pos}")]
    UnmatchedParen { pos: usize },
    #[error("invalid charge in bracket atom at position {pos}")]
    InvalidCharge { pos: usize },
    /// A ring-closure digit appeared before any atom.
    #[error("ring bond {digit} at position {pos} has no preceding atom")]
    InvalidRingBond { digit: u16, pos: usize },
    /// The two ends of a ring closure specify different bond symbols.
    #[error("conflicting bond types on ring closure {digit}")]
    RingBondConflict { digit: u16 },
    /// A ring closure would bond an atom to itself or duplicate a bond.
    #[error("ring closure {digit} duplicates an existing bond")]
    DuplicateBond { digit: u16 },
    /// The parsed graph failed sanitization.
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
}
