//! Structure file reading and molfile writing.
//!
//! Readers take any buffered source and return the first record as a
//! [`Molecule`](crate::Molecule) with coordinates and explicit hydrogen
//! nodes. Path-based helpers pick the format from the file extension and
//! attach the path to errors.

mod error;
mod molfile;
mod pdb;

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::mol::Molecule;

pub use error::Error;
pub use molfile::{read as read_molfile, to_string as molfile_to_string, write as write_molfile, WriteOptions};
pub use pdb::{read as read_pdb, PdbOptions};

/// Supported structure formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Pdb,
    /// MDL molfile or SDF.
    Molfile,
}

impl Format {
    /// `.pdb` / `.ent`, `.sdf` / `.mol` / `.sd`, case-insensitive.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdb" | "ent") => Ok(Format::Pdb),
            Some("sdf" | "mol" | "sd") => Ok(Format::Molfile),
            _ => Err(Error::UnsupportedFormat {
                path: Some(path.to_path_buf()),
            }),
        }
    }
}

/// Reads the first record of `text`.
pub fn read_structure_str(text: &str, format: Format, pdb: &PdbOptions) -> Result<Molecule, Error> {
    let reader = Cursor::new(text.as_bytes());
    match format {
        Format::Pdb => read_pdb(reader, pdb),
        Format::Molfile => read_molfile(reader),
    }
}

/// Reads the first record of the file at `path`, format by extension.
pub fn read_structure_file(path: &Path, pdb: &PdbOptions) -> Result<Molecule, Error> {
    let format = Format::from_path(path)?;
    let file = File::open(path).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;
    let reader = BufReader::new(file);
    match format {
        Format::Pdb => read_pdb(reader, pdb),
        Format::Molfile => read_molfile(reader),
    }
    .map_err(|e| e.with_path(path))
}

/// Writes `mol` as a V2000 molfile at `path`, replacing any existing file.
pub fn write_molfile_file(mol: &Molecule, path: &Path, options: &WriteOptions) -> Result<(), Error> {
    let file = File::create(path).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;
    write_molfile(mol, BufWriter::new(file), options).map_err(|e| e.with_path(path))
}
