use std::path::Path;

use weekquiz_core::{PdfBackend, QuestionRecord, acquire_text};

use crate::HarvestError;
use crate::config::HarvestConfig;
use crate::heuristic::scan_questions_with_config;
use crate::tolerant::parse_records;

/// Configurable question harvester.
///
/// Wraps a [`HarvestConfig`] and exposes one entry point per source kind.
/// The text and PDF paths never fail: missing content yields an empty pool,
/// which pagination then rejects.
#[derive(Debug, Clone, Default)]
pub struct QuestionHarvester {
    config: HarvestConfig,
}

impl QuestionHarvester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HarvestConfig) -> Self {
        Self { config }
    }

    /// Extract text from `pdf_path` with `backend` and harvest it.
    pub fn harvest_pdf(&self, pdf_path: &Path, backend: &dyn PdfBackend) -> Vec<QuestionRecord> {
        let text = acquire_text(backend, pdf_path);
        self.harvest_text(&text)
    }

    /// Heuristically segment `text` into questions, keeping only answered
    /// ones unless the config says otherwise.
    pub fn harvest_text(&self, text: &str) -> Vec<QuestionRecord> {
        if text.trim().is_empty() {
            tracing::warn!("no text content to harvest");
            return Vec::new();
        }

        let found = scan_questions_with_config(text, &self.config);
        let total = found.len();
        let kept: Vec<QuestionRecord> = if self.config.require_answer {
            found.into_iter().filter(QuestionRecord::has_answer).collect()
        } else {
            found
        };

        tracing::info!(
            candidates = total,
            kept = kept.len(),
            "harvested questions from text"
        );
        kept
    }

    /// Clean up and parse a loosely-JSON record collection.
    pub fn harvest_records(&self, raw: &str) -> Result<Vec<QuestionRecord>, HarvestError> {
        parse_records(raw)
    }
}
