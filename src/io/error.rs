use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while reading or writing structure files.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error for {path_desc}: {source}", path_desc = PathDisplay(path))]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "failed to parse {format} {path_desc}: {details} (line {line_number})",
        path_desc = PathDisplay(path)
    )]
    Parse {
        format: &'static str,
        path: Option<PathBuf>,
        line_number: usize,
        details: String,
    },

    /// The first record holds no atoms.
    #[error("{format} {path_desc} contains no atoms", path_desc = PathDisplay(path))]
    EmptyRecord {
        format: &'static str,
        path: Option<PathBuf>,
    },

    #[error("cannot infer a structure format for {path_desc}", path_desc = PathDisplay(path))]
    UnsupportedFormat { path: Option<PathBuf> },

    #[error(
        "unknown element '{symbol}' in {format} {path_desc} (line {line_number})",
        path_desc = PathDisplay(path)
    )]
    UnknownElement {
        format: &'static str,
        path: Option<PathBuf>,
        line_number: usize,
        symbol: String,
    },
}

impl Error {
    pub fn from_io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { path, source }
    }

    pub fn parse(format: &'static str, line_number: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            path: None,
            line_number,
            details: details.into(),
        }
    }

    pub fn empty_record(format: &'static str) -> Self {
        Self::EmptyRecord { format, path: None }
    }

    pub fn unknown_element(
        format: &'static str,
        line_number: usize,
        symbol: impl Into<String>,
    ) -> Self {
        Self::UnknownElement {
            format,
            path: None,
            line_number,
            symbol: symbol.into(),
        }
    }

    /// Attach `path` to an error raised by a stream reader. An existing
    /// path is kept.
    pub fn with_path(mut self, file: &Path) -> Self {
        let slot = match &mut self {
            Self::Io { path, .. }
            | Self::Parse { path, .. }
            | Self::EmptyRecord { path, .. }
            | Self::UnsupportedFormat { path }
            | Self::UnknownElement { path, .. } => path,
        };
        if slot.is_none() {
            *slot = Some(file.to_path_buf());
        }
        self
    }
}

struct PathDisplay<'a>(&'a Option<PathBuf>);

impl fmt::Display for PathDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, "file '{}'", p.display()),
            None => write!(f, "stream source"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_source() {
        let err = Error::parse("PDB", 7, "invalid X coordinate");
        assert_eq!(
            err.to_string(),
            "failed to parse PDB stream source: invalid X coordinate (line 7)"
        );
        let err = err.with_path(Path::new("ligand.pdb"));
        assert_eq!(
            err.to_string(),
            "failed to parse PDB file 'ligand.pdb': invalid X coordinate (line 7)"
        );
    }

    #[test]
    fn with_path_keeps_existing_path() {
        let err = Error::UnsupportedFormat {
            path: Some(PathBuf::from("a.xyz")),
        }
        .with_path(Path::new("b.xyz"));
        assert_eq!(err.to_string(), "cannot infer a structure format for file 'a.xyz'");
    }

    #[test]
    fn empty_record_message() {
        assert_eq!(
            Error::empty_record("SDF").to_string(),
            "SDF stream source contains no atoms"
        );
    }
}
