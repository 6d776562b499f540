use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::model::QuizDataset;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("refusing to write a dataset with no questions")]
    EmptyDataset,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pretty-printed JSON for `dataset`: 2-space indent, non-ASCII text kept
/// as-is, fields in declaration order.
pub fn to_json_string(dataset: &QuizDataset) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(dataset)
}

/// Persist `dataset` at `path`.
///
/// The document is written to a temporary file next to `path` and renamed
/// over it only once fully flushed, so a failed write never leaves a
/// truncated file behind nor clobbers an existing one.
pub fn write_dataset(dataset: &QuizDataset, path: &Path) -> Result<(), EmitError> {
    if dataset.full_series.is_empty() {
        return Err(EmitError::EmptyDataset);
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        serde_json::to_writer_pretty(&mut writer, dataset)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| EmitError::Io(e.error))?;

    tracing::info!(
        path = %path.display(),
        questions = dataset.total_questions,
        weeks = dataset.weeks.len(),
        "wrote quiz dataset"
    );
    Ok(())
}

/// Load a previously emitted dataset.
pub fn read_dataset(path: &Path) -> Result<QuizDataset, EmitError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
