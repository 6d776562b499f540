use std::path::Path;

use thiserror::Error;

pub mod config;
pub mod harvester;
pub mod heuristic;
pub mod tolerant;

pub use config::{HarvestConfig, HarvestConfigBuilder};
pub use harvester::QuestionHarvester;
// Re-export domain types from core (canonical definitions live there)
pub use weekquiz_core::{BackendError, PdfBackend, QuestionRecord};

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("record collection is not valid JSON after cleanup (line {line}, column {column}): {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("record collection must be a JSON array, found {found}")]
    NotASequence { found: &'static str },
}

/// Harvest answered questions from a PDF using the given backend.
///
/// Pipeline:
/// 1. Extract text via `backend` (failures degrade to an empty string)
/// 2. Segment question lines and attach trailing answers
/// 3. Drop questions without an answer
pub fn harvest_pdf(pdf_path: &Path, backend: &dyn PdfBackend) -> Vec<QuestionRecord> {
    QuestionHarvester::new().harvest_pdf(pdf_path, backend)
}

/// Harvest answered questions from already-extracted text.
pub fn harvest_text(text: &str) -> Vec<QuestionRecord> {
    QuestionHarvester::new().harvest_text(text)
}

/// Parse a loosely-JSON record collection into well-formed questions.
pub fn harvest_records(raw: &str) -> Result<Vec<QuestionRecord>, HarvestError> {
    QuestionHarvester::new().harvest_records(raw)
}
