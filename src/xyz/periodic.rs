//! Atomic number → element symbol lookup.
//!
//! Coordinate tables sometimes list atomic numbers (`6`, `46`) instead of
//! symbols. The lookup sits behind the [`PeriodicTable`] trait so callers can
//! plug in their own table; [`StandardPeriodicTable`] covers Z = 1..=118.

use crate::error::Pdf2XyzError;

/// Symbols indexed by `Z - 1`.
const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", //
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", //
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", //
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", //
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", //
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", //
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", //
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", //
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", //
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", //
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", //
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Resolve an atomic number to its element symbol.
pub trait PeriodicTable: Send + Sync {
    /// Returns [`Pdf2XyzError::UnknownAtomicNumber`] for numbers the table
    /// does not know.
    fn symbol(&self, atomic_number: u32) -> Result<&str, Pdf2XyzError>;
}

/// The IUPAC periodic table, hydrogen through oganesson.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPeriodicTable;

impl PeriodicTable for StandardPeriodicTable {
    fn symbol(&self, atomic_number: u32) -> Result<&str, Pdf2XyzError> {
        (atomic_number as usize)
            .checked_sub(1)
            .and_then(|idx| SYMBOLS.get(idx))
            .copied()
            .ok_or(Pdf2XyzError::UnknownAtomicNumber {
                number: atomic_number,
            })
    }
}
