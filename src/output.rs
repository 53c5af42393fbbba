//! Output types: the molecules recovered from a document, plus what was lost.

use crate::error::{LineError, PageError, Pdf2XyzError};
use crate::xyz::molecule::Molecule;
use crate::xyz::writer::write_xyz_file;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything an extraction produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Molecules in document order.
    pub molecules: Vec<Molecule>,
    /// Lines dropped while parsing, in the order they were met.
    pub skipped_lines: Vec<LineError>,
    /// Pages that could not be read. Their molecules are missing.
    pub page_errors: Vec<PageError>,
    pub stats: ExtractionStats,
}

/// Counters for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the PDF.
    pub total_pages: usize,
    /// Pages whose text reached the parser.
    pub processed_pages: usize,
    /// Pages that produced no text (render or OCR failure).
    pub failed_pages: usize,
    pub molecule_count: usize,
    pub atom_count: usize,
    pub skipped_line_count: usize,
    /// Prompt tokens spent on LLM cleanup and vision OCR.
    pub total_input_tokens: u64,
    /// Completion tokens spent on LLM cleanup and vision OCR.
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
}

impl ExtractionOutput {
    /// Recompute the molecule, atom, and skipped-line counters.
    pub fn refresh_counts(&mut self) {
        self.stats.molecule_count = self.molecules.len();
        self.stats.atom_count = self.molecules.iter().map(Molecule::len).sum();
        self.stats.skipped_line_count = self.skipped_lines.len();
    }

    /// Write one `<name>.xyz` per molecule into `dir`.
    ///
    /// Names are made filesystem-safe and unique (`name`, `name_2`, ...).
    /// Returns the written paths in molecule order.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, Pdf2XyzError> {
        let mut used = HashSet::new();
        let mut written = Vec::with_capacity(self.molecules.len());

        for (idx, molecule) in self.molecules.iter().enumerate() {
            let stem = unique_stem(&sanitize_file_stem(&molecule.name, idx), &mut used);
            let path = dir.join(format!("{stem}.xyz"));
            write_xyz_file(&path, &molecule.atoms)?;
            written.push(path);
        }

        info!("Wrote {} XYZ files to {}", written.len(), dir.display());
        Ok(written)
    }
}

/// Replace characters that are unsafe in file names with `_`.
///
/// An empty result falls back to `molecule_<idx>`.
pub fn sanitize_file_stem(name: &str, idx: usize) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(['_', '.']);
    if cleaned.is_empty() {
        format!("molecule_{idx}")
    } else {
        cleaned.to_string()
    }
}

fn unique_stem(stem: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = stem.to_string();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{stem}_{n}");
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xyz::molecule::AtomRecord;

    fn water(name: &str) -> Molecule {
        Molecule::new(
            name,
            vec![
                AtomRecord::from_strs("O", "0.0", "0.0", "0.1173").unwrap(),
                AtomRecord::from_strs("H", "0.0", "0.7572", "-0.4692").unwrap(),
                AtomRecord::from_strs("H", "0.0", "-0.7572", "-0.4692").unwrap(),
            ],
        )
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("molecule1_ocr", 0), "molecule1_ocr");
        assert_eq!(sanitize_file_stem("Complex A / conformer 2", 0), "Complex_A___conformer_2");
        assert_eq!(sanitize_file_stem("../etc", 3), "etc");
        assert_eq!(sanitize_file_stem("  ", 4), "molecule_4");
    }

    #[test]
    fn test_refresh_counts() {
        let mut out = ExtractionOutput {
            molecules: vec![water("a"), water("b")],
            skipped_lines: vec![LineError::EmptyLine],
            ..Default::default()
        };
        out.refresh_counts();
        assert_eq!(out.stats.molecule_count, 2);
        assert_eq!(out.stats.atom_count, 6);
        assert_eq!(out.stats.skipped_line_count, 1);
    }

    #[test]
    fn test_write_to_dir_dedupes_names() {
        let dir = tempfile::tempdir().unwrap();
        let out = ExtractionOutput {
            molecules: vec![water("water"), water("water"), water("")],
            ..Default::default()
        };
        let paths = out.write_to_dir(dir.path()).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["water.xyz", "water_2.xyz", "molecule_2.xyz"]);

        let text = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(text.starts_with("3\n\nO\t"));
    }
}
