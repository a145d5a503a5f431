//! MDL molfile / SDF connection tables.
//!
//! The reader accepts V2000 and V3000 tables and stops at the end of the
//! first record. The writer emits V2000 only.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::element::Element;
use crate::io::error::Error;
use crate::kekulize::kekulize;
use crate::mol::Molecule;

const FORMAT: &str = "molfile";

/// Largest atom or bond count a V2000 counts line can hold.
const V2000_MAX: usize = 999;

/// Reads the first record of a molfile or SDF stream.
///
/// Coordinates, elements, formal charges (atom block charge codes or
/// `M  CHG` lines) and bonds of type 1 to 4 are kept; query bond types
/// read as single. Hydrogen atoms stay graph nodes.
///
/// # Errors
///
/// [`Error::EmptyRecord`] when the first record has no atoms,
/// [`Error::Parse`] for malformed counts, atom or bond lines and
/// [`Error::UnknownElement`] for symbols outside the periodic table.
pub fn read<R: BufRead>(reader: R) -> Result<Molecule, Error> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| Error::from_io(e, None))?;
        if line.starts_with("$$$$") {
            break;
        }
        lines.push(line);
    }
    if lines.iter().all(|l| l.trim().is_empty()) {
        return Err(Error::empty_record(FORMAT));
    }
    let counts = lines
        .get(3)
        .ok_or_else(|| Error::parse(FORMAT, lines.len(), "record ends before the counts line"))?;

    let mol = if counts.contains("V3000") {
        read_v3000(&lines)?
    } else {
        read_v2000(&lines)?
    };
    if mol.atom_count() == 0 {
        return Err(Error::empty_record(FORMAT));
    }
    debug!(atoms = mol.atom_count(), bonds = mol.bond_count(), "read molfile record");
    Ok(mol)
}

fn column(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_count(line: &str, start: usize, line_number: usize, what: &str) -> Result<usize, Error> {
    column(line, start, start + 3)
        .parse()
        .map_err(|_| Error::parse(FORMAT, line_number, format!("invalid {what} count")))
}

fn element_for(symbol: &str, line_number: usize) -> Result<Element, Error> {
    match symbol {
        "D" | "T" => Ok(Element::H),
        _ => Element::from_symbol(symbol)
            .or_else(|| Element::from_symbol_ignore_case(symbol))
            .ok_or_else(|| Error::unknown_element(FORMAT, line_number, symbol)),
    }
}

/// Atom block charge codes; 4 is a doublet radical, not a charge.
fn charge_from_code(code: i32) -> i8 {
    match code {
        1 => 3,
        2 => 2,
        3 => 1,
        5 => -1,
        6 => -2,
        7 => -3,
        _ => 0,
    }
}

fn bond_from_type(code: i32, line_number: usize) -> Result<Bond, Error> {
    Ok(match code {
        1 => Bond::single(),
        2 => Bond::with_order(BondOrder::Double),
        3 => Bond::with_order(BondOrder::Triple),
        4 => Bond::aromatic(),
        5..=8 => {
            warn!(line = line_number, bond_type = code, "query bond type read as single");
            Bond::single()
        }
        _ => {
            return Err(Error::parse(
                FORMAT,
                line_number,
                format!("unsupported bond type {code}"),
            ))
        }
    })
}

fn add_bond_checked(
    mol: &mut Molecule,
    a: usize,
    b: usize,
    bond: Bond,
    line_number: usize,
) -> Result<(), Error> {
    let n = mol.atom_count();
    if a == 0 || b == 0 || a > n || b > n {
        return Err(Error::parse(FORMAT, line_number, "bond references a missing atom"));
    }
    if a == b {
        return Err(Error::parse(FORMAT, line_number, "bond joins an atom to itself"));
    }
    mol.add_bond(NodeIndex::new(a - 1), NodeIndex::new(b - 1), bond);
    Ok(())
}

fn read_v2000(lines: &[String]) -> Result<Molecule, Error> {
    let counts = &lines[3];
    let atom_count = parse_count(counts, 0, 4, "atom")?;
    let bond_count = parse_count(counts, 3, 4, "bond")?;

    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    let props_start = bond_start + bond_count;
    if lines.len() < props_start {
        return Err(Error::parse(
            FORMAT,
            lines.len(),
            format!("counts line promises {atom_count} atoms and {bond_count} bonds"),
        ));
    }

    let mut mol = Molecule::with_capacity(atom_count, bond_count);
    for (offset, line) in lines[atom_start..bond_start].iter().enumerate() {
        let line_number = atom_start + offset + 1;
        let coord = |start: usize, axis: &str| -> Result<f64, Error> {
            column(line, start, start + 10)
                .parse()
                .map_err(|_| Error::parse(FORMAT, line_number, format!("invalid {axis} coordinate")))
        };
        let position = [coord(0, "X")?, coord(10, "Y")?, coord(20, "Z")?];
        let element = element_for(column(line, 31, 34), line_number)?;
        let code = column(line, 36, 39).parse().unwrap_or(0);
        mol.add_atom(Atom {
            formal_charge: charge_from_code(code),
            position: Some(position),
            ..Atom::new(element)
        });
    }

    for (offset, line) in lines[bond_start..props_start].iter().enumerate() {
        let line_number = bond_start + offset + 1;
        let field = |start: usize, what: &str| -> Result<i32, Error> {
            column(line, start, start + 3)
                .parse()
                .map_err(|_| Error::parse(FORMAT, line_number, format!("invalid {what}")))
        };
        let a = field(0, "first bond atom")?;
        let b = field(3, "second bond atom")?;
        let bond = bond_from_type(field(6, "bond type")?, line_number)?;
        let index = |v: i32| usize::try_from(v).unwrap_or(0);
        add_bond_checked(&mut mol, index(a), index(b), bond, line_number)?;
    }

    let mut charges_reset = false;
    for (offset, line) in lines[props_start..].iter().enumerate() {
        let line_number = props_start + offset + 1;
        if line.starts_with("M  END") {
            break;
        }
        if !line.starts_with("M  CHG") {
            continue;
        }
        // the first M  CHG line supersedes every atom block charge
        if !charges_reset {
            let atoms: Vec<_> = mol.atoms().collect();
            for idx in atoms {
                mol.atom_mut(idx).formal_charge = 0;
            }
            charges_reset = true;
        }
        let values: Vec<i32> = line[6..]
            .split_whitespace()
            .map(|t| t.parse())
            .collect::<Result<_, _>>()
            .map_err(|_| Error::parse(FORMAT, line_number, "invalid M  CHG entry"))?;
        let Some((&entries, pairs)) = values.split_first() else {
            continue;
        };
        let expected = usize::try_from(entries)
            .ok()
            .and_then(|n| n.checked_mul(2))
            .ok_or_else(|| Error::parse(FORMAT, line_number, "invalid M  CHG entry count"))?;
        if pairs.len() != expected {
            return Err(Error::parse(FORMAT, line_number, "M  CHG entry count mismatch"));
        }
        for pair in pairs.chunks_exact(2) {
            let idx = usize::try_from(pair[0]).unwrap_or(0);
            if idx == 0 || idx > mol.atom_count() {
                return Err(Error::parse(FORMAT, line_number, "M  CHG names a missing atom"));
            }
            let charge = i8::try_from(pair[1])
                .map_err(|_| Error::parse(FORMAT, line_number, "M  CHG charge out of range"))?;
            mol.atom_mut(NodeIndex::new(idx - 1)).formal_charge = charge;
        }
    }

    Ok(mol)
}

/// Joins `M  V30` continuation lines (trailing `-`) and strips the prefix.
fn v30_lines(lines: &[String]) -> Vec<(usize, String)> {
    let mut out: Vec<(usize, String)> = Vec::new();
    let mut pending: Option<(usize, String)> = None;
    for (idx, line) in lines.iter().enumerate() {
        let Some(body) = line.strip_prefix("M  V30 ") else {
            continue;
        };
        let (line_number, mut text) = pending.take().unwrap_or((idx + 1, String::new()));
        match body.trim_end().strip_suffix('-') {
            Some(head) => {
                text.push_str(head);
                pending = Some((line_number, text));
            }
            None => {
                text.push_str(body.trim_end());
                out.push((line_number, text));
            }
        }
    }
    out.extend(pending);
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum V30Block {
    Other,
    Atom,
    Bond,
}

fn read_v3000(lines: &[String]) -> Result<Molecule, Error> {
    let mut mol = Molecule::new();
    let mut ids: HashMap<u32, NodeIndex> = HashMap::new();
    let mut block = V30Block::Other;

    for (line_number, text) in v30_lines(lines) {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.as_slice() {
            ["BEGIN", "ATOM", ..] => block = V30Block::Atom,
            ["BEGIN", "BOND", ..] => block = V30Block::Bond,
            ["END", "CTAB", ..] => break,
            ["END", ..] => block = V30Block::Other,
            [id, symbol, x, y, z, _map, rest @ ..] if block == V30Block::Atom => {
                let id: u32 = id
                    .parse()
                    .map_err(|_| Error::parse(FORMAT, line_number, "invalid atom id"))?;
                let coord = |s: &str, axis: &str| -> Result<f64, Error> {
                    s.parse().map_err(|_| {
                        Error::parse(FORMAT, line_number, format!("invalid {axis} coordinate"))
                    })
                };
                let position = [coord(*x, "X")?, coord(*y, "Y")?, coord(*z, "Z")?];
                let element = element_for(*symbol, line_number)?;
                let formal_charge = rest
                    .iter()
                    .find_map(|kv| kv.strip_prefix("CHG="))
                    .map(|v| {
                        v.parse::<i8>()
                            .map_err(|_| Error::parse(FORMAT, line_number, "invalid CHG value"))
                    })
                    .transpose()?
                    .unwrap_or(0);
                let idx = mol.add_atom(Atom {
                    formal_charge,
                    position: Some(position),
                    ..Atom::new(element)
                });
                if ids.insert(id, idx).is_some() {
                    return Err(Error::parse(FORMAT, line_number, "duplicate atom id"));
                }
            }
            [_id, kind, a, b, ..] if block == V30Block::Bond => {
                let parse = |s: &str, what: &str| -> Result<u32, Error> {
                    s.parse()
                        .map_err(|_| Error::parse(FORMAT, line_number, format!("invalid {what}")))
                };
                let bond = bond_from_type(parse(*kind, "bond type")? as i32, line_number)?;
                let (Some(&na), Some(&nb)) = (
                    ids.get(&parse(*a, "first bond atom")?),
                    ids.get(&parse(*b, "second bond atom")?),
                ) else {
                    return Err(Error::parse(FORMAT, line_number, "bond references a missing atom"));
                };
                if na == nb {
                    return Err(Error::parse(FORMAT, line_number, "bond joins an atom to itself"));
                }
                mol.add_bond(na, nb, bond);
            }
            _ if block != V30Block::Other => {
                return Err(Error::parse(FORMAT, line_number, "truncated V3000 entry"));
            }
            _ => {}
        }
    }
    Ok(mol)
}

/// Molfile writer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Write aromatic bonds as alternating single and double bonds. When
    /// kekulization fails the aromatic type 4 is written instead.
    pub kekulize: bool,
    /// First header line.
    pub title: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            kekulize: true,
            title: String::new(),
        }
    }
}

fn bond_type(bond: &Bond) -> u8 {
    match bond.order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 4,
    }
}

/// Writes `mol` as one V2000 record terminated by `M  END`.
///
/// Atoms without coordinates are placed at the origin. Formal charges go
/// to `M  CHG` lines with at most eight entries each.
pub fn write<W: Write>(mol: &Molecule, mut writer: W, options: &WriteOptions) -> Result<(), Error> {
    if mol.atom_count() > V2000_MAX || mol.bond_count() > V2000_MAX {
        return Err(Error::parse(
            FORMAT,
            0,
            format!(
                "{} atoms and {} bonds exceed the V2000 limit of {V2000_MAX}",
                mol.atom_count(),
                mol.bond_count()
            ),
        ));
    }

    let kekulized;
    let mol = if options.kekulize {
        match kekulize(mol) {
            Ok(k) => {
                kekulized = k;
                &kekulized
            }
            Err(e) => {
                warn!(error = %e, "writing aromatic bond types");
                mol
            }
        }
    } else {
        mol
    };

    let io = |e| Error::from_io(e, None);
    let dimension = if mol.atoms().any(|i| mol.atom(i).position.is_some()) {
        "3D"
    } else {
        "2D"
    };
    writeln!(writer, "{}", options.title).map_err(io)?;
    writeln!(writer, "  bondcrab          {dimension}").map_err(io)?;
    writeln!(writer).map_err(io)?;
    writeln!(
        writer,
        "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
        mol.atom_count(),
        mol.bond_count()
    )
    .map_err(io)?;

    for idx in mol.atoms() {
        let atom = mol.atom(idx);
        let [x, y, z] = atom.position.unwrap_or([0.0; 3]);
        writeln!(
            writer,
            "{x:>10.4}{y:>10.4}{z:>10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0",
            atom.symbol()
        )
        .map_err(io)?;
    }

    for (a, b) in mol.bond_pairs() {
        let Some(edge) = mol.bond_between(a, b) else {
            continue;
        };
        writeln!(
            writer,
            "{:>3}{:>3}{:>3}  0",
            a.index() + 1,
            b.index() + 1,
            bond_type(mol.bond(edge))
        )
        .map_err(io)?;
    }

    let charged: Vec<(usize, i8)> = mol
        .atoms()
        .filter(|&i| mol.atom(i).formal_charge != 0)
        .map(|i| (i.index() + 1, mol.atom(i).formal_charge))
        .collect();
    for chunk in charged.chunks(8) {
        write!(writer, "M  CHG{:>3}", chunk.len()).map_err(io)?;
        for (idx, charge) in chunk {
            write!(writer, " {idx:>3} {charge:>3}").map_err(io)?;
        }
        writeln!(writer).map_err(io)?;
    }
    writeln!(writer, "M  END").map_err(io)?;
    writer.flush().map_err(io)
}

/// [`write`] into a `String`.
pub fn to_string(mol: &Molecule, options: &WriteOptions) -> Result<String, Error> {
    let mut buf = Vec::new();
    write(mol, &mut buf, options)?;
    String::from_utf8(buf).map_err(|e| Error::parse(FORMAT, 0, e.to_string()))
}
