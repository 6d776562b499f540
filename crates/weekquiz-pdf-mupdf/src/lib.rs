use std::path::Path;

use mupdf::{Document, TextPageFlags};

use weekquiz_core::{BackendError, PdfBackend};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// Keeps the AGPL-licensed mupdf dependency out of the rest of the
/// workspace. Pages are read in physical order; a page without a text layer
/// contributes nothing, every other page contributes its lines followed by
/// a newline.
#[derive(Debug, Clone, Default)]
pub struct MupdfBackend {
    /// Fraction of page height from the top to skip (running headers).
    /// `None` keeps the whole page.
    header_exclusion_ratio: Option<f32>,
    /// Fraction of page height from the bottom to skip (page numbers,
    /// footers). `None` keeps the whole page.
    footer_exclusion_ratio: Option<f32>,
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip text blocks lying entirely in the top `ratio` of each page.
    pub fn with_header_exclusion(mut self, ratio: f32) -> Self {
        self.header_exclusion_ratio = (ratio > 0.0).then_some(ratio);
        self
    }

    /// Skip text blocks starting in the bottom `ratio` of each page.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = (ratio > 0.0).then_some(ratio);
        self
    }

    fn page_text(&self, page: &mupdf::Page) -> Result<String, BackendError> {
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        let bounds = page
            .bounds()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        let height = bounds.y1 - bounds.y0;
        let header_limit = self.header_exclusion_ratio.map(|r| bounds.y0 + height * r);
        let footer_limit = self.footer_exclusion_ratio.map(|r| bounds.y1 - height * r);

        let mut text = String::new();
        for block in text_page.blocks() {
            let block_bounds = block.bounds();
            if header_limit.is_some_and(|limit| block_bounds.y1 <= limit) {
                continue;
            }
            if footer_limit.is_some_and(|limit| block_bounds.y0 >= limit) {
                continue;
            }
            for line in block.lines() {
                text.extend(line.chars().map(|c| c.char().unwrap_or('\u{FFFD}')));
                text.push('\n');
            }
        }
        Ok(text)
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        if !path.exists() {
            return Err(BackendError::OpenError(format!(
                "{} does not exist",
                path.display()
            )));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut text = String::new();
        let mut empty_pages = 0usize;
        for (number, page) in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
            .enumerate()
        {
            let page = page.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let page_text = self.page_text(&page)?;
            if page_text.trim().is_empty() {
                tracing::debug!(page = number + 1, "page has no text layer");
                empty_pages += 1;
                continue;
            }
            text.push_str(&page_text);
            text.push('\n');
        }

        if empty_pages > 0 {
            tracing::warn!(path = %path.display(), empty_pages, "skipped pages without text");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_document_is_an_open_error() {
        let err = MupdfBackend::new()
            .extract_text(Path::new("/definitely/not/here.pdf"))
            .unwrap_err();
        assert!(matches!(err, BackendError::OpenError(_)));
    }

    #[test]
    fn missing_document_degrades_to_empty_text() {
        let text = weekquiz_core::acquire_text(&MupdfBackend::new(), Path::new("/nope.pdf"));
        assert!(text.is_empty());
    }

    #[test]
    fn zero_ratio_disables_exclusion() {
        let backend = MupdfBackend::new()
            .with_header_exclusion(0.0)
            .with_footer_exclusion(0.05);
        assert!(backend.header_exclusion_ratio.is_none());
        assert_eq!(backend.footer_exclusion_ratio, Some(0.05));
    }
}
