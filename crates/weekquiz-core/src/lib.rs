//! Data model and dataset assembly for weekly quiz generation.
//!
//! Harvested [`QuestionRecord`]s are paginated into a fixed grid of
//! [`WeekGroup`]s by [`paginate`], then persisted as a [`QuizDataset`] with
//! [`write_dataset`]. Text extraction from PDFs is abstracted behind
//! [`PdfBackend`] so the MuPDF dependency stays in its own crate.

pub mod backend;
pub mod config_file;
pub mod emit;
pub mod model;
pub mod paginate;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend, acquire_text};
pub use emit::{EmitError, read_dataset, to_json_string, write_dataset};
pub use model::{InvariantViolation, QuestionRecord, QuizDataset, WeekGroup};
pub use paginate::{PaginateError, PaginationConfig, ShortPoolPolicy, paginate};
