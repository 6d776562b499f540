use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors return the text layer of every page in physical order, each
/// non-empty page followed by a newline. Question harvesting lives in
/// `weekquiz_parsing`.
pub trait PdfBackend: Send + Sync {
    /// Extract the full text content of a PDF file.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}

/// Run `backend` against `path`, degrading every failure to an empty string.
///
/// An unreadable document or one without a text layer is not fatal to the
/// process: the failure is logged and callers see "no content".
pub fn acquire_text(backend: &dyn PdfBackend, path: &Path) -> String {
    match backend.extract_text(path) {
        Ok(text) if text.trim().is_empty() => {
            tracing::warn!(path = %path.display(), "PDF has no extractable text layer");
            String::new()
        }
        Ok(text) => {
            tracing::info!(path = %path.display(), chars = text.len(), "extracted PDF text");
            text
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "PDF text extraction failed");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<&'static str, &'static str>);

    impl PdfBackend for Fixed {
        fn extract_text(&self, _path: &Path) -> Result<String, BackendError> {
            self.0
                .map(str::to_string)
                .map_err(|e| BackendError::OpenError(e.to_string()))
        }
    }

    #[test]
    fn text_passes_through() {
        let backend = Fixed(Ok("1. What is a heap?\nAnswer: a tree\n"));
        assert_eq!(
            acquire_text(&backend, Path::new("a.pdf")),
            "1. What is a heap?\nAnswer: a tree\n"
        );
    }

    #[test]
    fn open_failure_yields_empty() {
        let backend = Fixed(Err("no such file"));
        assert_eq!(acquire_text(&backend, Path::new("missing.pdf")), "");
    }

    #[test]
    fn whitespace_only_text_yields_empty() {
        let backend = Fixed(Ok("\n\n  \n"));
        assert_eq!(acquire_text(&backend, Path::new("scan.pdf")), "");
    }
}
