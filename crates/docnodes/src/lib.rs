//! Standard node processor library
//!
//! The three node kinds a pipeline can be built from, plus the concrete
//! collaborators they need: a local file store and pdfium-backed PDF
//! extraction/rendering.

mod extract_text;
mod files;
mod formatter;
mod generative_ai;
mod pdf;

pub use extract_text::{ExtractTextProcessor, NO_TEXT_EXTRACTED};
pub use files::LocalFileStore;
pub use formatter::FormatterProcessor;
pub use generative_ai::{GenerativeAiProcessor, OpenRouterConfig, DEFAULT_MODEL, EMPTY_AI_RESPONSE};
pub use pdf::{PdfiumExtractor, PdfiumRenderer};

use doccore::{FileStore, TextExtractor};
use docruntime::ProcessorRegistry;
use std::sync::Arc;

/// Register the standard processors with a registry
pub fn register_all(
    registry: &mut ProcessorRegistry,
    files: Arc<dyn FileStore>,
    extractor: Arc<dyn TextExtractor>,
    ai_config: OpenRouterConfig,
) {
    registry.register(Arc::new(FormatterProcessor));
    registry.register(Arc::new(ExtractTextProcessor::new(files, extractor)));
    registry.register(Arc::new(GenerativeAiProcessor::new(ai_config)));
}
