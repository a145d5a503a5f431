//! Assign bond orders, formal charges, hydrogen counts and aromaticity to a
//! coordinate structure by reconciling it against a reference SMILES.
//!
//! ```
//! use bondcrab::{assign_bond_orders_from_str, AssignOptions, Format};
//!
//! let pdb = "\
//! HETATM    1  C1  LIG A   1       0.000   0.000   0.000  1.00  0.00           C
//! HETATM    2  O1  LIG A   1       1.220   0.000   0.000  1.00  0.00           O
//! HETATM    3  O2  LIG A   1      -0.610   1.060   0.000  1.00  0.00           O
//! HETATM    4  C2  LIG A   1      -0.770  -1.280   0.000  1.00  0.00           C
//! END
//! ";
//! let molfile =
//!     assign_bond_orders_from_str(pdb, Format::Pdb, "CC(=O)[O-]", &AssignOptions::default())
//!         .unwrap();
//! assert!(molfile.contains("M  CHG  1   4  -1"));
//! ```

pub mod aromaticity;
pub mod assign;
pub mod atom;
pub mod bond;
pub mod element;
pub mod graph_ops;
pub mod hybridization;
pub mod hydrogen;
pub mod io;
pub mod kekulize;
pub mod mol;
pub mod prune;
pub mod reconcile;
pub mod rings;
pub mod sanitize;
pub mod smiles;
pub mod strip;
pub mod substruct;
pub mod traits;
pub mod transfer;
pub mod valence;

pub use petgraph::graph::NodeIndex;

pub use assign::{assign, assign_bond_orders, assign_bond_orders_from_str, AssignError, AssignOptions};
pub use atom::{Atom, Hybridization};
pub use bond::{Bond, BondOrder};
pub use element::Element;
pub use graph_ops::{renumber_atoms, RenumberError};
pub use hydrogen::remove_hs;
pub use io::{Format, PdbOptions, WriteOptions};
pub use kekulize::{kekulize, KekulizeError};
pub use mol::{Mol, Molecule};
pub use prune::prune_spurious_bonds;
pub use reconcile::{
    PrunePolicy, ReconcileError, ReconcileOptions, Reconciler, Reconciliation, Stage, Strategy,
};
pub use sanitize::{sanitize, SanitizeError};
pub use smiles::{parse_smiles, reference_from_smiles, SmilesError};
pub use strip::{generalize_halogens, normalize};
pub use substruct::{Correspondence, GraphMatcher, MatchError, MatchMode, Vf2Matcher};
pub use transfer::{transfer_atom_attributes, transfer_bond_attributes, TransferError};
