//! PDF collaborators backed by pdfium.
//!
//! pdfium wraps a C++ library with thread-local state and must not be
//! called from async contexts; both implementations here are blocking
//! and expected to run via `spawn_blocking` (the extract-text node and
//! the executor's render step both do so).

use doccore::{DocumentRenderer, ExtractionError, RenderError, TextExtractor};
use pdfium_render::prelude::*;

const PAGE_MARGIN: f32 = 56.0;
const FONT_SIZE: f32 = 11.0;
const LINE_HEIGHT: f32 = 14.0;
const MAX_LINE_CHARS: usize = 90;

/// Text extraction via pdfium, one page at a time
pub struct PdfiumExtractor;

impl TextExtractor for PdfiumExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let pdfium = Pdfium::default();

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ExtractionError(format!("failed to open PDF: {e:?}")))?;

        let mut text = String::new();
        for page in document.pages().iter() {
            let page_text = page
                .text()
                .map_err(|e| ExtractionError(format!("failed to read page text: {e:?}")))?;
            text.push_str(&page_text.all());
            text.push('\n');
        }

        Ok(text)
    }
}

/// Renders plain text into a single-column A4 document
pub struct PdfiumRenderer;

impl DocumentRenderer for PdfiumRenderer {
    fn render(&self, text: &str) -> Result<Vec<u8>, RenderError> {
        let pdfium = Pdfium::default();

        let mut document = pdfium
            .create_new_pdf()
            .map_err(|e| RenderError(format!("failed to create PDF: {e:?}")))?;

        let font = document.fonts_mut().helvetica();

        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .map_err(|e| RenderError(format!("failed to add page: {e:?}")))?;

        let top = page.height().value - PAGE_MARGIN;
        let mut y = top;

        for line in wrap_lines(text) {
            if y < PAGE_MARGIN {
                page = document
                    .pages_mut()
                    .create_page_at_end(PdfPagePaperSize::a4())
                    .map_err(|e| RenderError(format!("failed to add page: {e:?}")))?;
                y = top;
            }

            if !line.is_empty() {
                page.objects_mut()
                    .create_text_object(
                        PdfPoints::new(PAGE_MARGIN),
                        PdfPoints::new(y),
                        &line,
                        font,
                        PdfPoints::new(FONT_SIZE),
                    )
                    .map_err(|e| RenderError(format!("failed to place text: {e:?}")))?;
            }

            y -= LINE_HEIGHT;
        }

        drop(page);

        document
            .save_to_bytes()
            .map_err(|e| RenderError(format!("failed to serialize PDF: {e:?}")))
    }
}

/// Split text into page lines, wrapping at word boundaries where
/// possible
fn wrap_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();

    for raw in text.lines() {
        let mut rest = raw;
        loop {
            if rest.chars().count() <= MAX_LINE_CHARS {
                lines.push(rest.to_string());
                break;
            }

            let cut = rest
                .char_indices()
                .take(MAX_LINE_CHARS + 1)
                .filter(|(_, c)| c.is_whitespace())
                .map(|(i, _)| i)
                .last()
                .unwrap_or_else(|| {
                    rest.char_indices()
                        .nth(MAX_LINE_CHARS)
                        .map(|(i, _)| i)
                        .unwrap_or(rest.len())
                });

            lines.push(rest[..cut].trim_end().to_string());
            rest = rest[cut..].trim_start();
        }
    }

    lines
}
