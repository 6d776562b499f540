use once_cell::sync::Lazy;
use regex::Regex;

use weekquiz_core::QuestionRecord;

use crate::config::HarvestConfig;

/// Question-boundary patterns, tried in order. A match only has to prove the
/// line is a question; nothing is extracted from it.
pub static DEFAULT_QUESTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // 1. Question text?
        r"\d+\.\s*[^?]*\?",
        // Q1: Question text?  (also Q1- and Q1.)
        r"Q\d+[:\-.]\s*[^?]*\?",
        // 1) Question text?
        r"\d+\)\s*[^?]*\?",
        // Any capitalized sentence ending in a question mark
        r"[A-Z][^?]*\?",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Answer indicators. Group 1 captures the answer up to the first period.
pub static DEFAULT_ANSWER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)answer[:\s]*([^.\n]+)",
        r"(?i)solution[:\s]*([^.\n]+)",
        r"(?i)correct[:\s]*([^.\n]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Scanner state: either between questions or accumulating one.
#[derive(Debug)]
enum ScanState {
    NoOpenQuestion,
    QuestionOpen(QuestionRecord),
}

impl ScanState {
    fn step(self, line: &str, config: &HarvestConfig, out: &mut Vec<QuestionRecord>) -> Self {
        if config.is_question(line) {
            self.close(out);
            return ScanState::QuestionOpen(QuestionRecord::new(line));
        }

        match self {
            ScanState::QuestionOpen(mut record) => {
                if let Some(answer) = config.answer_in(line) {
                    record.answer = answer;
                }
                ScanState::QuestionOpen(record)
            }
            ScanState::NoOpenQuestion => ScanState::NoOpenQuestion,
        }
    }

    fn close(self, out: &mut Vec<QuestionRecord>) {
        if let ScanState::QuestionOpen(record) = self {
            out.push(record);
        }
    }
}

/// Segment extracted text into question records.
///
/// Every non-blank line is trimmed and classified: a question line closes the
/// open question and opens a new one, an answer line sets the open question's
/// answer, anything else is ignored. Answers are not filtered here.
pub fn scan_questions(text: &str) -> Vec<QuestionRecord> {
    scan_questions_with_config(text, &HarvestConfig::default())
}

/// Config-aware version of [`scan_questions`].
pub(crate) fn scan_questions_with_config(text: &str, config: &HarvestConfig) -> Vec<QuestionRecord> {
    let mut out = Vec::new();
    let mut state = ScanState::NoOpenQuestion;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        state = state.step(line, config, &mut out);
    }
    state.close(&mut out);

    out
}
