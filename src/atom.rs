use serde::{Deserialize, Serialize};

use crate::element::Element;

/// Orbital hybridization of an atom.
///
/// `Unspecified` is what readers produce before any perception has run;
/// everything else is assigned by [`sanitize`](crate::sanitize::sanitize) or
/// copied over from a reference structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Hybridization {
    #[default]
    Unspecified,
    S,
    SP,
    SP2,
    SP3,
    SP3D,
    SP3D2,
    Other,
}

/// Heavy-atom node of a molecular graph.
///
/// Hydrogens are normally not graph nodes: after
/// [`remove_hs`](crate::hydrogen::remove_hs) their multiplicity lives in
/// `hydrogen_count`. The same type is used for the reference built from
/// SMILES (no coordinates) and for the target read from a coordinate file.
///
/// # Examples
///
/// ```
/// use bondcrab::Atom;
///
/// let oxygen = Atom {
///     atomic_num: 8,
///     hydrogen_count: 1,
///     ..Atom::default()
/// };
/// assert_eq!(oxygen.symbol(), "O");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Atom {
    /// Atomic number (1 = H, 6 = C, 7 = N, …).
    pub atomic_num: u8,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Number of hydrogens attached to this atom that are not graph nodes.
    pub hydrogen_count: u8,
    /// Whether this atom is part of an aromatic ring system.
    pub is_aromatic: bool,
    pub hybridization: Hybridization,
    /// Cartesian coordinates in ångström, when the source had them.
    pub position: Option<[f64; 3]>,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            atomic_num: element.atomic_num(),
            ..Self::default()
        }
    }

    pub fn element(&self) -> Option<Element> {
        Element::from_atomic_num(self.atomic_num)
    }

    /// Element symbol, `"*"` for dummy or unknown atomic numbers.
    pub fn symbol(&self) -> &'static str {
        self.element().map_or("*", Element::symbol)
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atomic_num == 1
    }
}

impl crate::traits::HasAtomicNum for Atom {
    fn atomic_num(&self) -> u8 {
        self.atomic_num
    }
}

impl crate::traits::HasFormalCharge for Atom {
    fn formal_charge(&self) -> i8 {
        self.formal_charge
    }
}

impl crate::traits::HasHydrogenCount for Atom {
    fn hydrogen_count(&self) -> u8 {
        self.hydrogen_count
    }
}

impl crate::traits::HasAromaticity for Atom {
    fn is_aromatic(&self) -> bool {
        self.is_aromatic
    }
}

impl crate::traits::HasPosition3D for Atom {
    fn position_3d(&self) -> Option<[f64; 3]> {
        self.position
    }
}
