use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to an atom's valence. Aromatic bonds count as one;
    /// valence checks run on the Kekulé form, where none remain.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    /// Raise the order by one step, saturating at triple. Used when a
    /// connection table lists the same pair more than once.
    pub fn increment(self) -> Self {
        match self {
            BondOrder::Single | BondOrder::Aromatic => BondOrder::Double,
            BondOrder::Double | BondOrder::Triple => BondOrder::Triple,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub order: BondOrder,
    pub is_aromatic: bool,
}

impl Bond {
    pub fn single() -> Self {
        Self::default()
    }

    pub fn aromatic() -> Self {
        Self {
            order: BondOrder::Aromatic,
            is_aromatic: true,
        }
    }

    pub fn with_order(order: BondOrder) -> Self {
        Self {
            order,
            is_aromatic: order == BondOrder::Aromatic,
        }
    }
}

impl Default for Bond {
    fn default() -> Self {
        Self {
            order: BondOrder::Single,
            is_aromatic: false,
        }
    }
}

impl crate::traits::HasBondOrder for Bond {
    fn bond_order(&self) -> BondOrder {
        self.order
    }
}
