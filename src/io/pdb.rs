//! PDB atom records of the first model, with `CONECT` and proximity bonds.

use std::collections::HashMap;
use std::io::BufRead;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::element::Element;
use crate::io::error::Error;
use crate::mol::{Mol, Molecule};
use crate::traits::{HasAtomicNum, HasPosition3D};

const FORMAT: &str = "PDB";

/// How bonds missing from `CONECT` records are guessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdbOptions {
    /// Bond atom pairs closer than the sum of their covalent radii plus
    /// `bond_tolerance`.
    pub proximity_bonds: bool,
    /// Slack in ångström added to the covalent radius sum.
    pub bond_tolerance: f64,
    /// Pairs closer than this are overlapping atoms, not bonded ones.
    pub min_bond_distance: f64,
}

impl Default for PdbOptions {
    fn default() -> Self {
        Self {
            proximity_bonds: true,
            bond_tolerance: 0.45,
            min_bond_distance: 0.4,
        }
    }
}

/// Reads the atoms of the first model.
///
/// Elements come from columns 77-78 or, when blank, from the atom name.
/// Alternate locations other than `A` are skipped. Pairs listed more than
/// once in an atom's `CONECT` records get a bond of that multiplicity.
///
/// # Errors
///
/// [`Error::EmptyRecord`] without atom records, [`Error::Parse`] for
/// malformed coordinates or serials and [`Error::UnknownElement`] when no
/// element can be derived.
pub fn read<R: BufRead>(reader: R, options: &PdbOptions) -> Result<Molecule, Error> {
    let mut mol = Molecule::new();
    let mut serials: HashMap<u32, NodeIndex> = HashMap::new();
    // atom serial -> partner serial -> times listed
    let mut conect: HashMap<u32, HashMap<u32, u8>> = HashMap::new();
    let mut in_later_model = false;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::from_io(e, None))?;
        let line_number = idx + 1;
        let record = line.get(..6).unwrap_or(line.as_str()).trim_end();

        match record {
            "MODEL" if mol.atom_count() > 0 => in_later_model = true,
            "ENDMDL" if mol.atom_count() > 0 => in_later_model = true,
            "END" => break,
            "ATOM" | "HETATM" if !in_later_model => {
                if let Some((serial, atom)) = parse_atom(&line, line_number)? {
                    let node = mol.add_atom(atom);
                    if serials.insert(serial, node).is_some() {
                        return Err(Error::parse(FORMAT, line_number, "duplicate atom serial"));
                    }
                }
            }
            "CONECT" => {
                let (origin, partners) = parse_conect(&line, line_number)?;
                let listed = conect.entry(origin).or_default();
                for partner in partners {
                    let times = listed.entry(partner).or_default();
                    *times = times.saturating_add(1);
                }
            }
            _ => {}
        }
    }

    if mol.atom_count() == 0 {
        return Err(Error::empty_record(FORMAT));
    }

    add_conect_bonds(&mut mol, &serials, &conect);
    if options.proximity_bonds {
        add_proximity_bonds(&mut mol, options);
    }
    debug!(atoms = mol.atom_count(), bonds = mol.bond_count(), "read PDB model");
    Ok(mol)
}

fn column(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_atom(line: &str, line_number: usize) -> Result<Option<(u32, Atom)>, Error> {
    if line.len() < 54 {
        return Err(Error::parse(FORMAT, line_number, "atom record too short"));
    }
    let alt_loc = line.as_bytes()[16];
    if alt_loc != b' ' && alt_loc != b'A' {
        return Ok(None);
    }

    let serial = column(line, 6, 11)
        .parse::<u32>()
        .map_err(|_| Error::parse(FORMAT, line_number, "invalid atom serial"))?;
    let coord = |start: usize, axis: &str| -> Result<f64, Error> {
        column(line, start, start + 8)
            .parse()
            .map_err(|_| Error::parse(FORMAT, line_number, format!("invalid {axis} coordinate")))
    };
    let position = [coord(30, "X")?, coord(38, "Y")?, coord(46, "Z")?];

    let name = line.get(12..16).unwrap_or("");
    let element = match column(line, 76, 78) {
        "" => element_from_name(name),
        symbol => Element::from_symbol_ignore_case(symbol),
    }
    .ok_or_else(|| {
        let shown = match column(line, 76, 78) {
            "" => name.trim(),
            symbol => symbol,
        };
        Error::unknown_element(FORMAT, line_number, shown)
    })?;

    Ok(Some((
        serial,
        Atom {
            formal_charge: parse_charge(column(line, 78, 80)),
            position: Some(position),
            ..Atom::new(element)
        },
    )))
}

/// Element from a four-character atom name. A letter in the first column
/// marks a two-letter element (`CL1 `, `FE  `); otherwise the element is
/// the first letter of the name (` CA `, ` N1 `).
fn element_from_name(name: &str) -> Option<Element> {
    let letters: String = name
        .chars()
        .skip_while(|c| c.is_whitespace())
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    if !name.starts_with(' ') && letters.len() >= 2 {
        if let Some(e) = Element::from_symbol_ignore_case(&letters[..2]) {
            return Some(e);
        }
    }
    Element::from_symbol_ignore_case(&letters[..1])
}

/// `2+`, `1-` and the like; anything else is neutral.
fn parse_charge(field: &str) -> i8 {
    let bytes = field.as_bytes();
    match bytes {
        [d @ b'0'..=b'9', b'+'] => (d - b'0') as i8,
        [d @ b'0'..=b'9', b'-'] => -((d - b'0') as i8),
        _ => 0,
    }
}

fn parse_conect(line: &str, line_number: usize) -> Result<(u32, Vec<u32>), Error> {
    let field = |start: usize| -> Result<Option<u32>, Error> {
        match column(line, start, start + 5) {
            "" => Ok(None),
            s => s
                .parse()
                .map(Some)
                .map_err(|_| Error::parse(FORMAT, line_number, "invalid CONECT serial")),
        }
    };
    let origin = field(6)?
        .ok_or_else(|| Error::parse(FORMAT, line_number, "CONECT record without atom serial"))?;
    let mut partners = Vec::with_capacity(4);
    for start in [11, 16, 21, 26] {
        if let Some(partner) = field(start)? {
            partners.push(partner);
        }
    }
    Ok((origin, partners))
}

fn add_conect_bonds(
    mol: &mut Molecule,
    serials: &HashMap<u32, NodeIndex>,
    conect: &HashMap<u32, HashMap<u32, u8>>,
) {
    let mut pairs: Vec<(NodeIndex, NodeIndex, u8)> = Vec::new();
    for (origin, partners) in conect {
        for (partner, &times) in partners {
            let (Some(&a), Some(&b)) = (serials.get(origin), serials.get(partner)) else {
                debug!(origin, partner, "CONECT names an atom outside the model");
                continue;
            };
            if a == b {
                continue;
            }
            // each side may list the pair; the larger count wins
            let reverse = conect
                .get(partner)
                .and_then(|p| p.get(origin))
                .copied()
                .unwrap_or(0);
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            pairs.push((lo, hi, times.max(reverse)));
        }
    }
    pairs.sort();
    pairs.dedup();

    for (a, b, times) in pairs {
        if mol.bond_between(a, b).is_some() {
            continue;
        }
        let order = (1..times).fold(BondOrder::Single, |order, _| order.increment());
        mol.add_bond(a, b, Bond::with_order(order));
    }
}

fn add_proximity_bonds<A>(mol: &mut Mol<A, Bond>, options: &PdbOptions)
where
    A: HasAtomicNum + HasPosition3D,
{
    let atoms: Vec<(NodeIndex, [f64; 3], f64, bool)> = mol
        .atoms()
        .filter_map(|idx| {
            let atom = mol.atom(idx);
            let radius = Element::from_atomic_num(atom.atomic_num())?.covalent_radius()?;
            Some((idx, atom.position_3d()?, radius, atom.atomic_num() == 1))
        })
        .collect();

    let mut added = 0usize;
    for (i, &(a, pa, ra, a_is_h)) in atoms.iter().enumerate() {
        for &(b, pb, rb, b_is_h) in &atoms[i + 1..] {
            if a_is_h && b_is_h {
                continue;
            }
            if mol.bond_between(a, b).is_some() {
                continue;
            }
            let dist = distance(pa, pb);
            if dist < options.min_bond_distance || dist > ra + rb + options.bond_tolerance {
                continue;
            }
            // hydrogens take a single partner
            if (a_is_h && mol.degree(a) > 0) || (b_is_h && mol.degree(b) > 0) {
                continue;
            }
            mol.add_bond(a, b, Bond::single());
            added += 1;
        }
    }
    debug!(added, "proximity bonds");
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
