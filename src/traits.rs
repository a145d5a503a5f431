use crate::bond::BondOrder;

pub trait HasAtomicNum {
    fn atomic_num(&self) -> u8;
}

pub trait HasFormalCharge {
    fn formal_charge(&self) -> i8;
}

pub trait HasHydrogenCount {
    fn hydrogen_count(&self) -> u8;
}

pub trait HasAromaticity {
    fn is_aromatic(&self) -> bool;
}

pub trait HasPosition3D {
    fn position_3d(&self) -> Option<[f64; 3]>;
}

pub trait HasBondOrder {
    fn bond_order(&self) -> BondOrder;
}
