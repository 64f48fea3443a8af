//! Plain-text spin and bond lists.
//!
//! Both formats are whitespace separated with one record per line. Blank
//! lines and anything after `#` are ignored. Node ids are 1-based.
//!
//! ```text
//! # spins: node field
//! 1 0.0
//! 2 0.5
//!
//! # bonds: node node coupling
//! 1 2 1.0
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::LatticeModel;
use crate::spins::SpinAlphabet;

fn records<'a>(text: &'a str) -> impl Iterator<Item = (usize, Vec<&'a str>)> + 'a {
    text.lines().enumerate().filter_map(|(idx, line)| {
        let content = line.split('#').next().unwrap_or("");
        let tokens: Vec<&str> = content.split_whitespace().collect();
        (!tokens.is_empty()).then_some((idx + 1, tokens))
    })
}

fn token<T: FromStr>(path: &Path, line: usize, what: &str, tok: &str) -> Result<T> {
    tok.parse().map_err(|_| Error::Parse {
        path: path.to_path_buf(),
        line,
        message: format!("invalid {what} '{tok}'"),
    })
}

fn arity(path: &Path, line: usize, expected: usize, found: usize) -> Result<()> {
    if found != expected {
        return Err(Error::Parse {
            path: path.to_path_buf(),
            line,
            message: format!("expected {expected} fields, found {found}"),
        });
    }
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse `node field` records. `path` only labels errors.
pub fn parse_spin_list(text: &str, path: &Path) -> Result<Vec<(usize, f64)>> {
    records(text)
        .map(|(line, toks)| {
            arity(path, line, 2, toks.len())?;
            Ok((
                token(path, line, "node", toks[0])?,
                token(path, line, "field", toks[1])?,
            ))
        })
        .collect()
}

/// Parse `node node coupling` records. `path` only labels errors.
pub fn parse_bond_list(text: &str, path: &Path) -> Result<Vec<(usize, usize, f64)>> {
    records(text)
        .map(|(line, toks)| {
            arity(path, line, 3, toks.len())?;
            Ok((
                token(path, line, "node", toks[0])?,
                token(path, line, "node", toks[1])?,
                token(path, line, "coupling", toks[2])?,
            ))
        })
        .collect()
}

pub fn read_spin_file(path: impl AsRef<Path>) -> Result<Vec<(usize, f64)>> {
    let path = path.as_ref();
    parse_spin_list(&read(path)?, path)
}

pub fn read_bond_file(path: impl AsRef<Path>) -> Result<Vec<(usize, usize, f64)>> {
    let path = path.as_ref();
    parse_bond_list(&read(path)?, path)
}

/// Read both files and build a model. Nothing is constructed if either file
/// fails to read or parse.
pub fn load_model<S: SpinAlphabet>(
    spin_path: impl AsRef<Path>,
    bond_path: impl AsRef<Path>,
    seed: Option<u64>,
) -> Result<LatticeModel<S>> {
    let sites = read_spin_file(spin_path)?;
    let bonds = read_bond_file(bond_path)?;
    LatticeModel::initialize(&sites, &bonds, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spins::Spin;
    use std::io::Write;

    #[test]
    fn test_parse_spin_list() {
        let text = "# header\n1 0.5\n\n2   -1\n3 0 # trailing\n";
        let sites = parse_spin_list(text, Path::new("spins.txt")).unwrap();
        assert_eq!(sites, vec![(1, 0.5), (2, -1.0), (3, 0.0)]);
    }

    #[test]
    fn test_parse_bond_list() {
        let text = "1 2 1.0\n2 3 -0.5\n";
        let bonds = parse_bond_list(text, Path::new("bonds.txt")).unwrap();
        assert_eq!(bonds, vec![(1, 2, 1.0), (2, 3, -0.5)]);
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse_spin_list("1 0.5\n2 abc\n", Path::new("s.txt")).unwrap_err();
        match err {
            Error::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("abc"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = parse_bond_list("1 2\n", Path::new("b.txt")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));

        // negative node ids are not representable
        assert!(parse_bond_list("-1 2 1.0\n", Path::new("b.txt")).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = read_spin_file("/nonexistent/spins.txt").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_load_model() {
        let mut spins = tempfile::NamedTempFile::new().unwrap();
        writeln!(spins, "1 0.0\n2 0.0\n3 1.0").unwrap();
        let mut bonds = tempfile::NamedTempFile::new().unwrap();
        writeln!(bonds, "1 2 1.0\n2 3 1.0").unwrap();

        let model = load_model::<Spin>(spins.path(), bonds.path(), Some(3)).unwrap();
        assert_eq!(model.site_count(), 3);
        assert_eq!(model.bonds().count(), 2);
        assert_eq!(model.fields(), &[0.0, 0.0, 1.0]);
    }
}
