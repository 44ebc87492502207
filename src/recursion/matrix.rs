//!
//! Symbolic dense matrix for silent loop resolution
//!
//! Entries are C++ expressions. The matrix starts as the identity and
//! transition weights are subtracted from it, building `I - T` for a silent
//! component; once the generator asked for its inverse it is frozen.
//!
use crate::error::{fail, ErrorKind, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    name: String,
    dim: usize,
    entries: Vec<String>,
    frozen: bool,
}

impl Matrix {
    pub fn identity<S: Into<String>>(name: S, dim: usize) -> Self {
        let entries = (0..dim * dim)
            .map(|k| if k / dim == k % dim { "1.0" } else { "0.0" }.to_string())
            .collect();
        Matrix {
            name: name.into(),
            dim,
            entries,
            frozen: false,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn dim(&self) -> usize {
        self.dim
    }
    fn index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.dim || col >= self.dim {
            fail(ErrorKind::MatrixOutOfBounds {
                matrix: self.name.clone(),
                row,
                col,
                dim: self.dim,
            })
        } else {
            Ok(row * self.dim + col)
        }
    }
    pub fn entry(&self, row: usize, col: usize) -> Result<&str> {
        let k = self.index(row, col)?;
        Ok(&self.entries[k])
    }
    ///
    /// `M[row][col] -= value`
    ///
    pub fn subtract(&mut self, row: usize, col: usize, value: &str) -> Result<()> {
        if self.frozen {
            return fail(ErrorKind::MatrixFrozen {
                matrix: self.name.clone(),
            });
        }
        let k = self.index(row, col)?;
        let entry = &mut self.entries[k];
        *entry = match entry.as_str() {
            "0.0" => format!("-({})", value),
            _ => format!("{} - ({})", entry, value),
        };
        Ok(())
    }
    pub fn freeze(&mut self) {
        self.frozen = true;
    }
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
    ///
    /// Assignments filling a row-major C++ array `var`
    ///
    pub fn assignments(&self, var: &str) -> Vec<String> {
        self.entries
            .iter()
            .enumerate()
            .map(|(k, e)| format!("{}[{}] = {};", var, k, e))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_minus_transitions() {
        let mut m = Matrix::identity("m", 2);
        m.subtract(0, 1, "0.5").unwrap();
        m.subtract(1, 1, "p").unwrap();
        assert_eq!(m.entry(0, 0).unwrap(), "1.0");
        assert_eq!(m.entry(0, 1).unwrap(), "-(0.5)");
        assert_eq!(m.entry(1, 1).unwrap(), "1.0 - (p)");
        assert_eq!(
            m.assignments("a"),
            vec!["a[0] = 1.0;", "a[1] = -(0.5);", "a[2] = 0.0;", "a[3] = 1.0 - (p);"]
        );
    }

    #[test]
    fn bounds_and_freezing() {
        let mut m = Matrix::identity("m", 2);
        assert!(matches!(
            m.subtract(2, 0, "x").unwrap_err().kind(),
            ErrorKind::MatrixOutOfBounds { row: 2, col: 0, dim: 2, .. }
        ));
        assert!(m.entry(0, 5).is_err());
        m.freeze();
        assert!(m.is_frozen());
        assert_eq!(
            m.subtract(0, 0, "x").unwrap_err().kind(),
            &ErrorKind::MatrixFrozen {
                matrix: "m".to_string()
            }
        );
    }
}
