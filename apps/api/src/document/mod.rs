//! Document Extractor: turns an uploaded resume PDF into prompt-ready content.
//!
//! Two interchangeable strategies:
//! - [`ExtractionStrategy::Text`]: every page's text layer, concatenated in page order.
//! - [`ExtractionStrategy::Image`]: page 1 only, rasterized, JPEG-encoded, base64-wrapped.
//!
//! Both run on the blocking pool; PDF parsing and rendering are CPU-bound.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

pub mod raster;
pub mod text;

pub use raster::{InlineImage, PageRasterizer, PdfiumRasterizer, UnavailableRasterizer};

/// How many leading bytes are searched for the `%PDF-` header.
const PDF_HEADER_SEARCH_WINDOW: usize = 1024;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("uploaded file is not a PDF")]
    NotPdf,

    #[error("failed to parse PDF: {0}")]
    Parse(String),

    #[error("failed to render PDF page: {0}")]
    Render(String),

    #[error("PDF has no pages")]
    NoPages,

    #[error("failed to encode page image: {0}")]
    Encode(String),

    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Which extraction strategy an analysis variant uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    Text,
    #[default]
    Image,
}

/// An uploaded resume. Request-scoped; consumed once per analysis.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub bytes: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl ResumeDocument {
    /// Wraps an upload. An empty upload counts as no upload at all.
    pub fn from_upload(
        bytes: Bytes,
        file_name: Option<String>,
        content_type: Option<String>,
    ) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        Some(Self {
            bytes,
            file_name,
            content_type,
        })
    }

    /// Fails with `MissingInput` when no resume was supplied.
    pub fn require(document: Option<Self>) -> Result<Self, AppError> {
        document.ok_or_else(|| AppError::MissingInput("Please upload the resume first".to_string()))
    }

    /// Checks for the `%PDF-` header near the start of the file.
    pub fn ensure_pdf(&self) -> Result<(), ExtractionError> {
        let window = &self.bytes[..self.bytes.len().min(PDF_HEADER_SEARCH_WINDOW)];
        if window.windows(5).any(|w| w == b"%PDF-") {
            Ok(())
        } else {
            Err(ExtractionError::NotPdf)
        }
    }
}

/// Resume content as handed to the prompt builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResumeContent {
    Text { text: String },
    Image(InlineImage),
}

/// Extracts resume content with the given strategy on the blocking pool.
pub async fn extract(
    document: &ResumeDocument,
    strategy: ExtractionStrategy,
    rasterizer: Arc<dyn PageRasterizer>,
) -> Result<ResumeContent, ExtractionError> {
    document.ensure_pdf()?;

    let bytes = document.bytes.clone();
    let content = tokio::task::spawn_blocking(move || match strategy {
        ExtractionStrategy::Text => {
            text::extract_text(&bytes).map(|extracted| ResumeContent::Text {
                text: extracted.joined(),
            })
        }
        ExtractionStrategy::Image => {
            raster::first_page_attachment(rasterizer.as_ref(), &bytes).map(ResumeContent::Image)
        }
    })
    .await
    .map_err(|e| ExtractionError::Task(e.to_string()))??;

    debug!(
        "Extracted resume {:?} ({:?}, {} bytes) with {:?} strategy",
        document.file_name.as_deref().unwrap_or("<unnamed>"),
        document.content_type.as_deref().unwrap_or("unknown"),
        document.bytes.len(),
        strategy
    );
    Ok(content)
}
