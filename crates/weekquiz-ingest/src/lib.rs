use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

// Re-export domain types for convenience
pub use weekquiz_core::{
    EmitError, PaginateError, PaginationConfig, PdfBackend, QuestionRecord, QuizDataset,
    ShortPoolPolicy,
};
pub use weekquiz_parsing::{HarvestConfig, HarvestError, QuestionHarvester};

use weekquiz_core::{paginate, write_dataset};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("record parsing failed: {0}")]
    Harvest(#[from] HarvestError),
    #[error("pagination failed: {0}")]
    Paginate(#[from] PaginateError),
    #[error("writing dataset failed: {0}")]
    Emit(#[from] EmitError),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of weekquiz-ingest)")]
    NoPdfSupport,
}

/// How an input file is harvested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// PDF document, text layer harvested heuristically.
    Pdf,
    /// Plain text already extracted from a document.
    Text,
    /// Loosely-JSON array of question records.
    Records,
}

impl SourceKind {
    /// Pick a kind from the file extension: `.pdf` and `.txt` map to
    /// [`Pdf`](Self::Pdf) and [`Text`](Self::Text), anything else is treated
    /// as a record collection.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "pdf" => SourceKind::Pdf,
            "txt" => SourceKind::Text,
            _ => SourceKind::Records,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::Pdf => "pdf",
            SourceKind::Text => "text",
            SourceKind::Records => "records",
        })
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(SourceKind::Pdf),
            "text" | "txt" => Ok(SourceKind::Text),
            "records" | "json" => Ok(SourceKind::Records),
            other => Err(format!("unknown source kind: {other}")),
        }
    }
}

/// Page margins the PDF backend leaves out, as fractions of page height.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PdfOptions {
    /// Skip text blocks that end in the top `header_exclusion` of a page.
    pub header_exclusion: Option<f32>,
    /// Skip text blocks that start in the bottom `footer_exclusion` of a page.
    pub footer_exclusion: Option<f32>,
}

/// Everything a pipeline run needs besides its paths.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Explicit source kind; inferred from the extension when `None`.
    pub kind: Option<SourceKind>,
    pub harvest: HarvestConfig,
    pub pagination: PaginationConfig,
    pub pdf: PdfOptions,
}

impl PipelineOptions {
    pub fn kind_for(&self, path: &Path) -> SourceKind {
        self.kind.unwrap_or_else(|| SourceKind::from_path(path))
    }
}

/// Harvest the candidate pool from `path`.
///
/// PDFs go through the MuPDF backend (requires the `pdf` feature).
pub fn load_pool(path: &Path, options: &PipelineOptions) -> Result<Vec<QuestionRecord>, IngestError> {
    match options.kind_for(path) {
        SourceKind::Pdf => load_pdf(path, options),
        kind => {
            let harvester = QuestionHarvester::with_config(options.harvest.clone());
            load_textual(path, kind, &harvester)
        }
    }
}

/// Like [`load_pool`], but PDFs are read with the given backend instead of
/// MuPDF.
pub fn load_pool_with_backend(
    path: &Path,
    options: &PipelineOptions,
    backend: &dyn PdfBackend,
) -> Result<Vec<QuestionRecord>, IngestError> {
    let harvester = QuestionHarvester::with_config(options.harvest.clone());
    match options.kind_for(path) {
        SourceKind::Pdf => Ok(harvester.harvest_pdf(path, backend)),
        kind => load_textual(path, kind, &harvester),
    }
}

fn load_textual(
    path: &Path,
    kind: SourceKind,
    harvester: &QuestionHarvester,
) -> Result<Vec<QuestionRecord>, IngestError> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), %kind, chars = content.len(), "read source");

    match kind {
        SourceKind::Records => Ok(harvester.harvest_records(&content)?),
        _ => Ok(harvester.harvest_text(&content)),
    }
}

#[cfg(feature = "pdf")]
fn load_pdf(path: &Path, options: &PipelineOptions) -> Result<Vec<QuestionRecord>, IngestError> {
    let mut backend = weekquiz_pdf_mupdf::MupdfBackend::new();
    if let Some(ratio) = options.pdf.header_exclusion {
        backend = backend.with_header_exclusion(ratio);
    }
    if let Some(ratio) = options.pdf.footer_exclusion {
        backend = backend.with_footer_exclusion(ratio);
    }
    load_pool_with_backend(path, options, &backend)
}

#[cfg(not(feature = "pdf"))]
fn load_pdf(_path: &Path, _options: &PipelineOptions) -> Result<Vec<QuestionRecord>, IngestError> {
    Err(IngestError::NoPdfSupport)
}

/// Harvest `input` and paginate it into a dataset. Nothing is written.
pub fn build_dataset(input: &Path, options: &PipelineOptions) -> Result<QuizDataset, IngestError> {
    let pool = load_pool(input, options)?;
    finish(pool, options)
}

/// Like [`build_dataset`], but PDFs are read with the given backend.
pub fn build_dataset_with_backend(
    input: &Path,
    options: &PipelineOptions,
    backend: &dyn PdfBackend,
) -> Result<QuizDataset, IngestError> {
    let pool = load_pool_with_backend(input, options, backend)?;
    finish(pool, options)
}

fn finish(pool: Vec<QuestionRecord>, options: &PipelineOptions) -> Result<QuizDataset, IngestError> {
    tracing::info!(pool = pool.len(), "paginating question pool");
    let dataset = paginate(pool, &options.pagination)?;
    tracing::info!(
        questions = dataset.total_questions,
        weeks = dataset.weeks.len(),
        "built quiz dataset"
    );
    Ok(dataset)
}

/// Run the whole pipeline and persist the result at `output`.
///
/// Any harvesting or pagination failure aborts before the output file is
/// touched.
pub fn build_and_write(
    input: &Path,
    output: &Path,
    options: &PipelineOptions,
) -> Result<QuizDataset, IngestError> {
    let dataset = build_dataset(input, options)?;
    write_dataset(&dataset, output)?;
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(SourceKind::from_path(Path::new("ADS.PDF")), SourceKind::Pdf);
        assert_eq!(SourceKind::from_path(Path::new("notes.txt")), SourceKind::Text);
        assert_eq!(SourceKind::from_path(Path::new("questions.json")), SourceKind::Records);
        assert_eq!(SourceKind::from_path(Path::new("questions")), SourceKind::Records);
    }

    #[test]
    fn kind_from_str() {
        assert_eq!("PDF".parse::<SourceKind>(), Ok(SourceKind::Pdf));
        assert_eq!("json".parse::<SourceKind>(), Ok(SourceKind::Records));
        assert!("docx".parse::<SourceKind>().is_err());
        assert_eq!(SourceKind::Text.to_string(), "text");
    }

    #[test]
    fn explicit_kind_overrides_extension() {
        let options = PipelineOptions {
            kind: Some(SourceKind::Text),
            ..PipelineOptions::default()
        };
        assert_eq!(options.kind_for(Path::new("dump.json")), SourceKind::Text);
    }

    #[test]
    fn unreadable_source_is_reported() {
        let err = load_pool(Path::new("/no/such/questions.json"), &PipelineOptions::default())
            .unwrap_err();
        assert!(matches!(err, IngestError::Read { .. }));
    }
}
