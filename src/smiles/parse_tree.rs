use crate::element::Element;
use crate::smiles::error::SmilesError;
use crate::smiles::tokenizer::{AtomToken, BondToken, Token};

/// Atom in SMILES order together with the neighbors written next to it.
#[derive(Debug, Clone)]
pub struct ParseAtom {
    pub element: Element,
    pub is_aromatic: bool,
    pub hcount: Option<u8>,
    pub charge: i8,
    pub neighbors: Vec<Neighbor>,
}

impl ParseAtom {
    fn is_bonded_to(&self, idx: usize) -> bool {
        self.neighbors.iter().any(|n| n.atom_idx == idx)
    }
}

#[derive(Debug, Clone)]
pub struct Neighbor {
    pub bond: Option<BondToken>,
    pub atom_idx: usize,
}

#[derive(Debug, Clone)]
pub struct ParseTree {
    pub atoms: Vec<ParseAtom>,
}

pub fn build_parse_tree(tokens: &[Token]) -> Result<ParseTree, SmilesError> {
    let mut atoms: Vec<ParseAtom> = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new(); // (branch atom, paren position)
    let mut current: Option<usize> = None;
    let mut pending_bond: Option<BondToken> = None;
    let mut ring_opens: Vec<Option<(usize, Option<BondToken>)>> = vec![None; 100];

    for token in tokens {
        match token {
            Token::Atom(atom_tok) => {
                let idx = atoms.len();
                atoms.push(parse_atom_from_token(atom_tok));

                if let Some(cur) = current {
                    let bond = pending_bond.take();
                    atoms[cur].neighbors.push(Neighbor {
                        bond,
                        atom_idx: idx,
                    });
                    atoms[idx].neighbors.push(Neighbor {
                        bond,
                        atom_idx: cur,
                    });
                } else {
                    pending_bond = None;
                }

                current = Some(idx);
            }
            Token::Bond(b) => {
                pending_bond = Some(*b);
            }
            Token::RingClosure { bond, digit, pos } => {
                let d = *digit as usize;
                let cur = current.ok_or(SmilesError::InvalidRingBond {
                    digit: *digit,
                    pos: *pos,
                })?;

                if let Some((open_idx, open_bond)) = ring_opens[d].take() {
                    if open_idx == cur || atoms[cur].is_bonded_to(open_idx) {
                        return Err(SmilesError::DuplicateBond { digit: *digit });
                    }
                    let ring_bond = match (bond.or(pending_bond.take()), open_bond) {
                        (None, None) => None,
                        (Some(b), None) | (None, Some(b)) => Some(b),
                        (Some(b1), Some(b2)) => {
                            if b1 == b2 {
                                Some(b1)
                            } else {
                                return Err(SmilesError::RingBondConflict { digit: *digit });
                            }
                        }
                    };

                    atoms[open_idx].neighbors.push(Neighbor {
                        bond: ring_bond,
                        atom_idx: cur,
                    });
                    atoms[cur].neighbors.push(Neighbor {
                        bond: ring_bond,
                        atom_idx: open_idx,
                    });
                } else {
                    ring_opens[d] = Some((cur, bond.or(pending_bond.take())));
                }
            }
            Token::OpenParen(pos) => {
                let cur = current.ok_or(SmilesError::UnmatchedParen { pos: *pos })?;
                stack.push((cur, *pos));
            }
            Token::CloseParen(pos) => {
                let (branch_atom, _) = stack
                    .pop()
                    .ok_or(SmilesError::UnmatchedParen { pos: *pos })?;
                current = Some(branch_atom);
                pending_bond = None;
            }
            Token::Dot(_) => {
                current = None;
                pending_bond = None;
            }
        }
    }

    if let Some(&(_, pos)) = stack.last() {
        return Err(SmilesError::UnmatchedParen { pos });
    }

    for (digit, entry) in ring_opens.iter().enumerate() {
        if entry.is_some() {
            return Err(SmilesError::UnclosedRing {
                digit: digit as u16,
            });
        }
    }

    Ok(ParseTree { atoms })
}

fn parse_atom_from_token(tok: &AtomToken) -> ParseAtom {
    ParseAtom {
        element: tok.element,
        is_aromatic: tok.is_aromatic,
        hcount: tok.hcount,
        charge: tok.charge,
        neighbors: Vec::new(),
    }
}
