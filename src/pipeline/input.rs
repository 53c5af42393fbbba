//! Input validation: check a user-supplied path is a readable PDF.
//!
//! pdfium reports a missing or non-PDF file as a generic load failure. The
//! magic-byte check (`%PDF`) here gives callers a specific error instead.

use crate::error::Pdf2XyzError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with `%PDF`.
pub fn resolve_input(path: impl AsRef<Path>) -> Result<PathBuf, Pdf2XyzError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(Pdf2XyzError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2XyzError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2XyzError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2XyzError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file() {
        let err = resolve_input("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, Pdf2XyzError::FileNotFound { .. }));
    }

    #[test]
    fn test_not_a_pdf() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"GIF89a....").unwrap();
        let err = resolve_input(tmp.path()).unwrap_err();
        match err {
            Pdf2XyzError::NotAPdf { magic, .. } => assert_eq!(&magic, b"GIF8"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pdf_magic_accepted() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.7\n").unwrap();
        assert_eq!(resolve_input(tmp.path()).unwrap(), tmp.path());
    }
}
