//! Image encoding for the OCR engines.
//!
//! Tesseract takes PNG bytes; vision models take the same bytes base64-wrapped
//! in an `ImageData`. PNG is lossless, which matters here: a JPEG artefact
//! next to a decimal point is enough to turn `0.5` into `05`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rendered page as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded page → {} bytes PNG", buf.len());
    Ok(buf)
}

/// Wrap PNG bytes for a vision-model request.
///
/// `detail: "high"` keeps the model from downsampling the page to a single
/// low-resolution tile, which loses small digits.
pub fn to_image_data(png: &[u8]) -> ImageData {
    ImageData::new(STANDARD.encode(png), "image/png").with_detail("high")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn encode_grayscale_page() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(12, 8, Luma([200])));
        let png = encode_png(&img).expect("encode should succeed");
        assert_eq!(&png[1..4], b"PNG");

        let data = to_image_data(&png);
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(decoded, png);
    }
}
