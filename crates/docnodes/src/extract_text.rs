use async_trait::async_trait;
use doccore::{FileStore, NodeError, NodeKind, NodeProcessor, TextExtractor, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Returned instead of empty output when a PDF contains no extractable
/// text; a valid result, not an error.
pub const NO_TEXT_EXTRACTED: &str = "No text could be extracted from the PDF";

/// PDF text extraction node.
///
/// The file reference is resolved from the running pipeline input when
/// it matches the upload-path convention, falling back to the node's
/// `file_path` config. This dual resolution mirrors how uploads hand
/// their logical path to the first node of a PDF workflow.
pub struct ExtractTextProcessor {
    files: Arc<dyn FileStore>,
    extractor: Arc<dyn TextExtractor>,
}

impl ExtractTextProcessor {
    pub fn new(files: Arc<dyn FileStore>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self { files, extractor }
    }

    fn resolve_path(
        &self,
        config: &HashMap<String, Value>,
        input: Option<&str>,
    ) -> Result<String, NodeError> {
        if let Some(candidate) = input.map(str::trim) {
            if is_upload_path(candidate) {
                return Ok(candidate.to_string());
            }
        }

        match config.get("file_path") {
            Some(Value::String(path)) if !path.is_empty() => Ok(path.clone()),
            Some(Value::String(_)) | None => Err(NodeError::MissingInput(
                "no PDF file reference in input or file_path config".into(),
            )),
            Some(_) => Err(NodeError::InvalidInput("file_path must be a string".into())),
        }
    }
}

/// Upload-path convention: stored under `uploads/` with a `.pdf`
/// extension, case-insensitive
fn is_upload_path(candidate: &str) -> bool {
    let lower = candidate.to_ascii_lowercase();
    lower.starts_with("uploads/") && lower.ends_with(".pdf")
}

#[async_trait]
impl NodeProcessor for ExtractTextProcessor {
    fn kind(&self) -> NodeKind {
        NodeKind::ExtractText
    }

    async fn process(
        &self,
        config: &HashMap<String, Value>,
        input: Option<&str>,
    ) -> Result<String, NodeError> {
        let path = self.resolve_path(config, input)?;

        if !self.files.exists(&path).await {
            return Err(NodeError::FileNotFound(path));
        }

        let bytes = self
            .files
            .read_binary(&path)
            .await
            .map_err(|e| NodeError::ExtractionFailed(format!("failed to read {path}: {e}")))?;

        tracing::debug!("Extracting text from {} ({} bytes)", path, bytes.len());

        // pdfium is CPU-bound and not async-safe; run it on the
        // blocking pool.
        let extractor = Arc::clone(&self.extractor);
        let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| NodeError::ExtractionFailed(format!("extraction task panicked: {e}")))?
            .map_err(|e| NodeError::ExtractionFailed(e.to_string()))?;

        if text.trim().is_empty() {
            Ok(NO_TEXT_EXTRACTED.to_string())
        } else {
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_path_convention_is_case_insensitive() {
        assert!(is_upload_path("uploads/report.pdf"));
        assert!(is_upload_path("uploads/1733822400_Report.PDF"));
        assert!(!is_upload_path("report.pdf"));
        assert!(!is_upload_path("uploads/report.txt"));
        assert!(!is_upload_path("hello world"));
    }
}
