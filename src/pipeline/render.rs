//! pdfium boundary: page count, text-layer extraction, and rasterisation.
//!
//! pdfium is not async-safe, so every entry point here moves its work onto
//! the blocking pool with `tokio::task::spawn_blocking`.
//!
//! OCR renders at a multiple of the page's point size (`ocr_scale`, default
//! 8). An 8× US-letter page is about 4900 × 6300 px, so pages are rendered one
//! at a time and converted to 8-bit grayscale straight away. Callers hold a
//! [`RenderSlot`] from [`acquire_render_slot`] until the bitmap is encoded and
//! dropped; OCR and cleanup of other pages still run concurrently.

use crate::error::Pdf2XyzError;
use image::DynamicImage;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

static RENDER_GATE: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Exclusive right to hold a full-resolution page bitmap.
pub type RenderSlot = MutexGuard<'static, ()>;

/// Wait until no other page bitmap is alive in this process.
pub async fn acquire_render_slot() -> RenderSlot {
    RENDER_GATE.lock().await
}

/// Bind to pdfium: `PDFIUM_LIB_PATH` first, then the system library.
fn bind_pdfium() -> Result<Pdfium, Pdf2XyzError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(dir) if !dir.is_empty() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Pdf2XyzError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2XyzError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2XyzError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2XyzError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2XyzError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

async fn blocking<T, F>(what: &str, f: F) -> Result<T, Pdf2XyzError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Pdf2XyzError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Pdf2XyzError::Internal(format!("{what} task panicked: {e}")))?
}

/// Number of pages in the document.
pub async fn page_count(pdf_path: &Path, password: Option<&str>) -> Result<usize, Pdf2XyzError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);

    blocking("Page count", move || {
        let pdfium = bind_pdfium()?;
        let document = load_document(&pdfium, &path, password.as_deref())?;
        let total = document.pages().len() as usize;
        info!("PDF loaded: {} pages", total);
        Ok(total)
    })
    .await
}

/// Extract the text layer of the selected pages.
///
/// # Returns
/// `(page_index_0based, text)` in `page_indices` order.
pub async fn extract_text(
    pdf_path: &Path,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<(usize, String)>, Pdf2XyzError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);
    let indices = page_indices.to_vec();

    blocking("Text extraction", move || {
        extract_text_blocking(&path, password.as_deref(), &indices)
    })
    .await
}

fn extract_text_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<(usize, String)>, Pdf2XyzError> {
    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, pdf_path, password)?;
    let pages = document.pages();
    let total_pages = pages.len() as usize;

    let mut results = Vec::with_capacity(page_indices.len());
    for &idx in page_indices {
        if idx >= total_pages {
            return Err(Pdf2XyzError::PageOutOfRange {
                page: idx + 1,
                total: total_pages,
            });
        }
        let text_err = |e: PdfiumError| Pdf2XyzError::TextExtractionFailed {
            page: idx + 1,
            detail: format!("{:?}", e),
        };
        let page = pages.get(idx as u16).map_err(text_err)?;
        let text = page.text().map_err(text_err)?.all();
        debug!("Page {}: {} chars of text", idx + 1, text.len());
        results.push((idx, text));
    }

    Ok(results)
}

/// Render one page for OCR at `scale` × its point size, as grayscale.
pub async fn render_page(
    pdf_path: &Path,
    password: Option<&str>,
    page_index: usize,
    scale: f32,
) -> Result<DynamicImage, Pdf2XyzError> {
    let path: PathBuf = pdf_path.to_path_buf();
    let password = password.map(str::to_string);

    blocking("Render", move || {
        render_page_blocking(&path, password.as_deref(), page_index, scale)
    })
    .await
}

fn render_page_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    page_index: usize,
    scale: f32,
) -> Result<DynamicImage, Pdf2XyzError> {
    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, pdf_path, password)?;
    let pages = document.pages();
    let total_pages = pages.len() as usize;

    if page_index >= total_pages {
        return Err(Pdf2XyzError::PageOutOfRange {
            page: page_index + 1,
            total: total_pages,
        });
    }

    let render_err = |e: PdfiumError| Pdf2XyzError::RasterisationFailed {
        page: page_index + 1,
        detail: format!("{:?}", e),
    };

    let page = pages.get(page_index as u16).map_err(render_err)?;
    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
    let bitmap = page.render_with_config(&render_config).map_err(render_err)?;

    let image = DynamicImage::ImageLuma8(bitmap.as_image().to_luma8());
    debug!(
        "Rendered page {} → {}x{} px",
        page_index + 1,
        image.width(),
        image.height()
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_render_slots_are_exclusive() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks = (0..4).map(|_| {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            tokio::spawn(async move {
                let _slot = acquire_render_slot().await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            })
        });
        for task in futures::future::join_all(tasks).await {
            task.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
