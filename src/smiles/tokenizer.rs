use crate::element::Element;
use crate::smiles::error::SmilesError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Atom(AtomToken),
    Bond(BondToken),
    RingClosure {
        bond: Option<BondToken>,
        digit: u16,
        pos: usize,
    },
    OpenParen(usize),
    CloseParen(usize),
    Dot(usize),
}

/// An atom as written. Isotope labels, stereo markers and atom classes are
/// consumed but not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomToken {
    pub element: Element,
    pub is_aromatic: bool,
    /// `Some` for bracket atoms (an omitted `H` means zero).
    pub hcount: Option<u8>,
    pub charge: i8,
    pub pos: usize,
}

/// Explicit bond symbol. Directional `/` and `\` read as single bonds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondToken {
    Single,
    Double,
    Triple,
    Aromatic,
}

const ORGANIC_TWO_LETTER: [(&str, Element); 2] = [("Cl", Element::Cl), ("Br", Element::Br)];

const BRACKET_AROMATIC: [(&str, Element); 9] = [
    ("se", Element::Se),
    ("te", Element::Te),
    ("as", Element::As),
    ("b", Element::B),
    ("c", Element::C),
    ("n", Element::N),
    ("o", Element::O),
    ("p", Element::P),
    ("s", Element::S),
];

const CHIRAL_CLASSES: [&str; 5] = ["TH", "AL", "SP", "TB", "OH"];

pub fn tokenize(input: &str) -> Result<Vec<Token>, SmilesError> {
    let mut lexer = Lexer {
        chars: input.chars().collect(),
        pos: 0,
    };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token(&mut tokens)? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn starts_with(&self, pat: &str) -> bool {
        pat.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn digits(&mut self) -> Option<u32> {
        let start = self.pos;
        let mut val: u32 = 0;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            val = val.saturating_mul(10).saturating_add(d);
            self.pos += 1;
        }
        (self.pos > start).then_some(val)
    }

    /// Produce the next token. A ring-closure digit directly after a bond
    /// symbol absorbs that symbol, so `tokens` may be popped.
    fn next_token(&mut self, tokens: &mut Vec<Token>) -> Result<Option<Token>, SmilesError> {
        while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\n')) {
            self.pos += 1;
        }
        let Some(ch) = self.peek() else {
            return Ok(None);
        };
        let start = self.pos;

        let token = match ch {
            '[' => Token::Atom(self.bracket_atom()?),
            '-' | '/' | '\\' => self.bond(BondToken::Single),
            '=' => self.bond(BondToken::Double),
            '#' => self.bond(BondToken::Triple),
            ':' => self.bond(BondToken::Aromatic),
            '(' => {
                self.pos += 1;
                Token::OpenParen(start)
            }
            ')' => {
                self.pos += 1;
                Token::CloseParen(start)
            }
            '.' => {
                self.pos += 1;
                Token::Dot(start)
            }
            '%' => {
                self.pos += 1;
                let (Some(d1), Some(d2)) = (
                    self.peek().and_then(|c| c.to_digit(10)),
                    self.peek_at(1).and_then(|c| c.to_digit(10)),
                ) else {
                    return Err(SmilesError::UnexpectedChar { pos: start, ch: '%' });
                };
                self.pos += 2;
                ring_closure(tokens, (d1 * 10 + d2) as u16, start)
            }
            '0'..='9' => {
                self.pos += 1;
                ring_closure(tokens, ch as u16 - '0' as u16, start)
            }
            _ => Token::Atom(self.organic_atom()?),
        };
        Ok(Some(token))
    }

    fn bond(&mut self, bond: BondToken) -> Token {
        self.pos += 1;
        Token::Bond(bond)
    }

    fn organic_atom(&mut self) -> Result<AtomToken, SmilesError> {
        let pos = self.pos;
        for (sym, element) in ORGANIC_TWO_LETTER {
            if self.starts_with(sym) {
                self.pos += 2;
                return Ok(bare_atom(element, false, pos));
            }
        }
        let ch = self.peek().unwrap_or('\0');
        let (element, aromatic) = match ch {
            'B' => (Element::B, false),
            'C' => (Element::C, false),
            'N' => (Element::N, false),
            'O' => (Element::O, false),
            'P' => (Element::P, false),
            'S' => (Element::S, false),
            'F' => (Element::F, false),
            'I' => (Element::I, false),
            'b' => (Element::B, true),
            'c' => (Element::C, true),
            'n' => (Element::N, true),
            'o' => (Element::O, true),
            'p' => (Element::P, true),
            's' => (Element::S, true),
            _ => return Err(SmilesError::UnexpectedChar { pos, ch }),
        };
        self.pos += 1;
        Ok(bare_atom(element, aromatic, pos))
    }

    fn bracket_atom(&mut self) -> Result<AtomToken, SmilesError> {
        let start = self.pos;
        self.pos += 1; // '['

        // isotope label, not tracked
        let _ = self.digits();
        let (element, is_aromatic) = self.bracket_element(start)?;
        self.skip_chirality();

        let hcount = if self.eat('H') {
            self.digits().map_or(1, |n| n.min(u8::MAX as u32) as u8)
        } else {
            0
        };
        let charge = self.charge(start)?;
        if self.eat(':') {
            // atom class, not tracked
            let _ = self.digits();
        }

        if !self.eat(']') {
            return Err(SmilesError::UnclosedBracket { pos: start });
        }

        Ok(AtomToken {
            element,
            is_aromatic,
            hcount: Some(hcount),
            charge,
            pos: start,
        })
    }

    fn bracket_element(&mut self, bracket_start: usize) -> Result<(Element, bool), SmilesError> {
        if self.peek().is_none() {
            return Err(SmilesError::UnclosedBracket { pos: bracket_start });
        }

        for (pat, element) in BRACKET_AROMATIC {
            if self.starts_with(pat) {
                self.pos += pat.len();
                return Ok((element, true));
            }
        }

        let first = self.peek().unwrap_or('\0');
        if first.is_ascii_uppercase() {
            if let Some(second) = self.peek_at(1).filter(char::is_ascii_lowercase) {
                let sym: String = [first, second].iter().collect();
                if let Some(e) = Element::from_symbol(&sym) {
                    self.pos += 2;
                    return Ok((e, false));
                }
            }
            if let Some(e) = Element::from_symbol(&first.to_string()) {
                self.pos += 1;
                return Ok((e, false));
            }
        }

        Err(SmilesError::InvalidElement {
            pos: self.pos,
            text: first.to_string(),
        })
    }

    fn skip_chirality(&mut self) {
        if !self.eat('@') {
            return;
        }
        if self.eat('@') {
            return;
        }
        if CHIRAL_CLASSES.iter().any(|class| self.starts_with(class)) {
            self.pos += 2;
            let _ = self.digits();
        }
    }

    fn charge(&mut self, bracket_start: usize) -> Result<i8, SmilesError> {
        let sign: i8 = match self.peek() {
            Some('+') => 1,
            Some('-') => -1,
            _ => return Ok(0),
        };
        let symbol = if sign > 0 { '+' } else { '-' };
        self.pos += 1;

        if let Some(n) = self.digits() {
            let magnitude =
                i8::try_from(n).map_err(|_| SmilesError::InvalidCharge { pos: bracket_start })?;
            return Ok(sign * magnitude);
        }

        let mut magnitude: i8 = 1;
        while self.eat(symbol) {
            magnitude = magnitude
                .checked_add(1)
                .ok_or(SmilesError::InvalidCharge { pos: bracket_start })?;
        }
        Ok(sign * magnitude)
    }
}

fn bare_atom(element: Element, is_aromatic: bool, pos: usize) -> AtomToken {
    AtomToken {
        element,
        is_aromatic,
        hcount: None,
        charge: 0,
        pos,
    }
}

fn ring_closure(tokens: &mut Vec<Token>, digit: u16, pos: usize) -> Token {
    let bond = match tokens.last() {
        Some(Token::Bond(b)) => {
            let b = *b;
            tokens.pop();
            Some(b)
        }
        _ => None,
    };
    Token::RingClosure { bond, digit, pos }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_atom(smiles: &str) -> AtomToken {
        match tokenize(smiles).unwrap().as_slice() {
            [Token::Atom(a)] => a.clone(),
            other => panic!("expected one atom token, got {other:?}"),
        }
    }

    #[test]
    fn organic_subset_atoms() {
        let a = single_atom("C");
        assert_eq!(a.element, Element::C);
        assert_eq!(a.hcount, None);
        assert!(!a.is_aromatic);

        assert_eq!(single_atom("Cl").element, Element::Cl);
        assert_eq!(single_atom("Br").element, Element::Br);
        assert!(single_atom("n").is_aromatic);
    }

    #[test]
    fn bracket_atom_with_hydrogens_and_charge() {
        let a = single_atom("[NH4+]");
        assert_eq!(a.element, Element::N);
        assert_eq!(a.hcount, Some(4));
        assert_eq!(a.charge, 1);
    }

    #[test]
    fn bracket_without_h_means_zero() {
        assert_eq!(single_atom("[C]").hcount, Some(0));
    }

    #[test]
    fn isotope_chirality_and_class_are_skipped() {
        let a = single_atom("[13C@@H:7]");
        assert_eq!(a.element, Element::C);
        assert_eq!(a.hcount, Some(1));
        assert_eq!(a.charge, 0);

        let b = single_atom("[C@TH2H]");
        assert_eq!(b.hcount, Some(1));
    }

    #[test]
    fn charge_forms() {
        assert_eq!(single_atom("[O-]").charge, -1);
        assert_eq!(single_atom("[O-2]").charge, -2);
        assert_eq!(single_atom("[O--]").charge, -2);
        assert_eq!(single_atom("[Fe+++]").charge, 3);
        assert!(tokenize("[C+999]").is_err());
    }

    #[test]
    fn aromatic_bracket_two_letter() {
        let a = single_atom("[se]");
        assert!(a.is_aromatic);
        assert_eq!(a.element, Element::Se);
    }

    #[test]
    fn ring_closure_absorbs_bond_symbol() {
        let tokens = tokenize("C=1CC1").unwrap();
        assert!(matches!(
            tokens[1],
            Token::RingClosure {
                bond: Some(BondToken::Double),
                digit: 1,
                ..
            }
        ));
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn percent_ring_closure() {
        let tokens = tokenize("C%12CC%12").unwrap();
        assert!(matches!(tokens[1], Token::RingClosure { digit: 12, .. }));
        assert!(tokenize("C%1").is_err());
    }

    #[test]
    fn directional_bonds_read_as_single() {
        let tokens = tokenize("F/C=C\\F").unwrap();
        assert_eq!(tokens[1], Token::Bond(BondToken::Single));
        assert_eq!(tokens[5], Token::Bond(BondToken::Single));
    }

    #[test]
    fn unknown_characters() {
        assert_eq!(
            tokenize("CX").unwrap_err(),
            SmilesError::UnexpectedChar { pos: 1, ch: 'X' }
        );
        assert!(matches!(
            tokenize("[Xx]").unwrap_err(),
            SmilesError::InvalidElement { .. }
        ));
        assert_eq!(
            tokenize("[CH4").unwrap_err(),
            SmilesError::UnclosedBracket { pos: 0 }
        );
    }
}
