//! Atom and molecule records produced by the extractors.

use crate::xyz::writer;
use serde::{Deserialize, Serialize};

/// One atom: element symbol plus coordinates.
///
/// The `*_str` fields hold the canonical decimal text the coordinate was
/// recovered from; they are what gets written, so the source precision
/// survives untouched. Each always parses back to its `f64` counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomRecord {
    pub element: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub x_str: String,
    pub y_str: String,
    pub z_str: String,
}

impl AtomRecord {
    /// Build a record from coordinate strings, parsing each one.
    ///
    /// Returns `None` if any coordinate is not a valid float.
    pub fn from_strs(
        element: impl Into<String>,
        x_str: impl Into<String>,
        y_str: impl Into<String>,
        z_str: impl Into<String>,
    ) -> Option<Self> {
        let (x_str, y_str, z_str) = (x_str.into(), y_str.into(), z_str.into());
        Some(Self {
            element: element.into(),
            x: x_str.parse().ok()?,
            y: y_str.parse().ok()?,
            z: z_str.parse().ok()?,
            x_str,
            y_str,
            z_str,
        })
    }

    /// `(element, x, y, z)` as written to the XYZ file.
    pub fn fields(&self) -> [&str; 4] {
        [&self.element, &self.x_str, &self.y_str, &self.z_str]
    }
}

/// An ordered list of atoms. Atom order is the order found in the source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Molecule {
    /// File stem used when the molecule is written to disk.
    pub name: String,
    pub atoms: Vec<AtomRecord>,
}

impl Molecule {
    pub fn new(name: impl Into<String>, atoms: Vec<AtomRecord>) -> Self {
        Self {
            name: name.into(),
            atoms,
        }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Render the molecule in XYZ format.
    pub fn to_xyz(&self) -> String {
        writer::to_xyz_string(&self.atoms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_strs_parses_coordinates() {
        let atom = AtomRecord::from_strs("C", "1.5", "-2.25", "3.0e-05").unwrap();
        assert_eq!(atom.x, 1.5);
        assert_eq!(atom.y, -2.25);
        assert_eq!(atom.z, 3.0e-05);
        assert_eq!(atom.fields(), ["C", "1.5", "-2.25", "3.0e-05"]);
    }

    #[test]
    fn test_from_strs_rejects_garbage() {
        assert!(AtomRecord::from_strs("C", "1.5", "x", "3.0").is_none());
    }
}
