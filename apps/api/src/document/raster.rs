//! Image strategy: render page 1 to a JPEG and wrap it as an inline attachment.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, RgbaImage};
use pdfium_render::prelude::{PdfRenderConfig, Pdfium};
use serde::{Deserialize, Serialize};

use super::ExtractionError;

pub const JPEG_MIME: &str = "image/jpeg";

/// Rendered page width in pixels. Height follows the page aspect ratio.
const DEFAULT_TARGET_WIDTH: i32 = 1240;

/// Inline image part for a multimodal prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    pub mime_type: String,
    /// Standard base64, padded.
    pub data: String,
}

/// Rasterizes the first page of a PDF. Swappable so tests need no native renderer.
pub trait PageRasterizer: Send + Sync {
    fn render_first_page(&self, pdf: &[u8]) -> Result<DynamicImage, ExtractionError>;
}

/// Renders with the pdfium shared library.
///
/// The library is bound and initialized once and shared by every render;
/// pdfium must not be torn down while another render is in flight.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    target_width: i32,
}

impl PdfiumRasterizer {
    /// Binds pdfium from `library_path`, or from the system library search path.
    pub fn new(library_path: Option<&str>) -> Result<Self, ExtractionError> {
        let bindings = match library_path {
            Some(path) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ExtractionError::Render(format!("pdfium library unavailable: {e:?}")))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            target_width: DEFAULT_TARGET_WIDTH,
        })
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn render_first_page(&self, pdf: &[u8]) -> Result<DynamicImage, ExtractionError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| ExtractionError::Parse(format!("{e:?}")))?;

        let pages = document.pages();
        if pages.len() == 0 {
            return Err(ExtractionError::NoPages);
        }
        let page = pages
            .get(0)
            .map_err(|e| ExtractionError::Render(format!("{e:?}")))?;

        let config = PdfRenderConfig::new().set_target_width(self.target_width);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| ExtractionError::Render(format!("{e:?}")))?;

        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        let rgba = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(|| {
            ExtractionError::Render(format!("bitmap size mismatch for {width}x{height}"))
        })?;
        Ok(DynamicImage::ImageRgba8(rgba))
    }
}

/// Stands in when pdfium could not be bound at startup. Every render fails.
pub struct UnavailableRasterizer {
    reason: String,
}

impl UnavailableRasterizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl PageRasterizer for UnavailableRasterizer {
    fn render_first_page(&self, _pdf: &[u8]) -> Result<DynamicImage, ExtractionError> {
        Err(ExtractionError::Render(self.reason.clone()))
    }
}

/// Renders page 1 only and encodes it as a JPEG attachment, regardless of page count.
pub fn first_page_attachment(
    rasterizer: &dyn PageRasterizer,
    pdf: &[u8],
) -> Result<InlineImage, ExtractionError> {
    let page = rasterizer.render_first_page(pdf)?;
    encode_jpeg(&page)
}

/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn encode_jpeg(image: &DynamicImage) -> Result<InlineImage, ExtractionError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| ExtractionError::Encode(e.to_string()))?;

    Ok(InlineImage {
        mime_type: JPEG_MIME.to_string(),
        data: STANDARD.encode(buffer.into_inner()),
    })
}
