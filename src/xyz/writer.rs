//! XYZ serialisation.
//!
//! ```text
//! 3
//!
//! O	0.000000000	0.000000000	0.117300000
//! H	0.000000000	0.757200000	-0.469200000
//! H	0.000000000	-0.757200000	-0.469200000
//! ```
//!
//! Line 1 is the atom count, line 2 is an empty comment line, then one
//! tab-separated `element x y z` line per atom in input order.

use crate::error::Pdf2XyzError;
use crate::xyz::molecule::AtomRecord;
use std::io::{self, Write};
use std::path::Path;

/// Render atoms as an XYZ document.
pub fn to_xyz_string(atoms: &[AtomRecord]) -> String {
    let mut out = format!("{}\n\n", atoms.len());
    for atom in atoms {
        out.push_str(&atom.fields().join("\t"));
        out.push('\n');
    }
    out
}

/// Write atoms in XYZ format to any sink.
pub fn write_xyz<W: Write>(mut sink: W, atoms: &[AtomRecord]) -> io::Result<()> {
    sink.write_all(to_xyz_string(atoms).as_bytes())?;
    sink.flush()
}

/// Write an XYZ file atomically: temp file in the same directory, then rename.
///
/// A failed write never leaves a truncated `.xyz` behind.
pub fn write_xyz_file(path: &Path, atoms: &[AtomRecord]) -> Result<(), Pdf2XyzError> {
    let write_err = |source: io::Error| Pdf2XyzError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    write_xyz(&mut tmp, atoms).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
