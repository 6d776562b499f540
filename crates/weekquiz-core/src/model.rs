use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single quiz question.
///
/// Harvested records carry an empty `id`; identifiers are only assigned
/// during pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub id: String,
}

impl QuestionRecord {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    /// A record with options is presented as multiple choice.
    pub fn is_multiple_choice(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn has_answer(&self) -> bool {
        !self.answer.trim().is_empty()
    }
}

/// One week's page of questions.
///
/// Serialized with the capitalized field names the quiz front end reads;
/// lowercase spellings are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekGroup {
    #[serde(rename = "Week_id", alias = "week_id")]
    pub week_id: u32,
    #[serde(rename = "Week_name", alias = "week_name")]
    pub week_name: String,
    pub questions: Vec<QuestionRecord>,
}

impl WeekGroup {
    /// Display name for a 1-based week number, e.g. `"Week 3"`.
    pub fn display_name(week_id: u32) -> String {
        format!("Week {week_id}")
    }
}

/// Root document persisted for the serving layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDataset {
    pub total_questions: usize,
    #[serde(rename = "Weeks", alias = "weeks")]
    pub weeks: Vec<WeekGroup>,
    pub full_series: Vec<QuestionRecord>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("total_questions is {declared} but full_series holds {actual}")]
    TotalMismatch { declared: usize, actual: usize },
    #[error("week at position {position} has id {found}, expected {expected}")]
    WeekIdGap {
        position: usize,
        expected: u32,
        found: u32,
    },
    #[error("week {week_id} is named {found:?}")]
    WeekName { week_id: u32, found: String },
    #[error("question at series index {index} has no id")]
    MissingId { index: usize },
    #[error("id {id:?} appears more than once")]
    DuplicateId { id: String },
    #[error("full_series has {series} entries but weeks hold {grouped}")]
    SeriesLength { series: usize, grouped: usize },
    #[error("full_series[{index}] does not match its week entry")]
    SeriesMismatch { index: usize },
}

impl QuizDataset {
    /// Number of week groups.
    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    /// Number of questions whose text, past the `"Week N, QM: "` prefix,
    /// starts with `marker`.
    pub fn count_marked(&self, marker: &str) -> usize {
        if marker.is_empty() {
            return 0;
        }
        self.full_series
            .iter()
            .filter(|q| {
                let body = q
                    .question
                    .strip_prefix("Week ")
                    .and_then(|rest| rest.split_once(": "))
                    .map_or(q.question.as_str(), |(_, body)| body);
                body.starts_with(marker)
            })
            .count()
    }

    /// Verify the structural guarantees of an emitted dataset: contiguous
    /// week ids, unique non-empty question ids, and a `full_series` that
    /// mirrors the week groups in order.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.total_questions != self.full_series.len() {
            return Err(InvariantViolation::TotalMismatch {
                declared: self.total_questions,
                actual: self.full_series.len(),
            });
        }

        for (position, week) in self.weeks.iter().enumerate() {
            let expected = position as u32 + 1;
            if week.week_id != expected {
                return Err(InvariantViolation::WeekIdGap {
                    position,
                    expected,
                    found: week.week_id,
                });
            }
            if week.week_name != WeekGroup::display_name(week.week_id) {
                return Err(InvariantViolation::WeekName {
                    week_id: week.week_id,
                    found: week.week_name.clone(),
                });
            }
        }

        let grouped: Vec<&QuestionRecord> =
            self.weeks.iter().flat_map(|w| w.questions.iter()).collect();
        if grouped.len() != self.full_series.len() {
            return Err(InvariantViolation::SeriesLength {
                series: self.full_series.len(),
                grouped: grouped.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.full_series.len());
        for (index, (flat, nested)) in self.full_series.iter().zip(grouped).enumerate() {
            if flat != nested {
                return Err(InvariantViolation::SeriesMismatch { index });
            }
            if flat.id.is_empty() {
                return Err(InvariantViolation::MissingId { index });
            }
            if !seen.insert(flat.id.as_str()) {
                return Err(InvariantViolation::DuplicateId {
                    id: flat.id.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> QuestionRecord {
        QuestionRecord {
            id: id.to_string(),
            ..QuestionRecord::new(format!("Question {id}?"))
        }
    }

    fn dataset(ids: &[&[&str]]) -> QuizDataset {
        let weeks: Vec<WeekGroup> = ids
            .iter()
            .enumerate()
            .map(|(i, qs)| WeekGroup {
                week_id: i as u32 + 1,
                week_name: WeekGroup::display_name(i as u32 + 1),
                questions: qs.iter().map(|id| record(id)).collect(),
            })
            .collect();
        let full_series: Vec<QuestionRecord> =
            weeks.iter().flat_map(|w| w.questions.clone()).collect();
        QuizDataset {
            total_questions: full_series.len(),
            weeks,
            full_series,
        }
    }

    #[test]
    fn record_fields_default_when_missing() {
        let parsed: QuestionRecord = serde_json::from_str(r#"{"question": "Why?"}"#).unwrap();
        assert_eq!(parsed, QuestionRecord::new("Why?"));
        assert!(!parsed.is_multiple_choice());
        assert!(!parsed.has_answer());
    }

    #[test]
    fn week_fields_use_front_end_names() {
        let week = WeekGroup {
            week_id: 2,
            week_name: WeekGroup::display_name(2),
            questions: vec![],
        };
        let json = serde_json::to_string(&week).unwrap();
        assert_eq!(json, r#"{"Week_id":2,"Week_name":"Week 2","questions":[]}"#);
    }

    #[test]
    fn lowercase_aliases_are_accepted() {
        let json = r#"{"total_questions":0,"weeks":[{"week_id":1,"week_name":"Week 1","questions":[]}],"full_series":[]}"#;
        let parsed: QuizDataset = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.week_count(), 1);
        assert_eq!(parsed.weeks[0].week_name, "Week 1");
    }

    #[test]
    fn well_formed_dataset_passes() {
        let ds = dataset(&[&["w1_q1", "w1_q2"], &["w2_q1", "w2_q2"]]);
        assert_eq!(ds.check_invariants(), Ok(()));
    }

    #[test]
    fn only_leading_markers_are_counted() {
        let mut ds = dataset(&[&["w1_q1", "w1_q2", "w1_q3", "w1_q4"]]);
        let texts = [
            "Week 1, Q1: Is \"[Variation] \" part of this question?",
            "Week 1, Q2: [Variation] Is \"[Variation] \" part of this question?",
            "Week 1, Q3: (copy) What is a quorum?",
            "Week 1, Q4: What is a quorum?",
        ];
        for (record, text) in ds.full_series.iter_mut().zip(texts) {
            record.question = text.to_string();
        }
        assert_eq!(ds.count_marked("[Variation] "), 1);
        assert_eq!(ds.count_marked("(copy) "), 1);
        assert_eq!(ds.count_marked(""), 0);
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let ds = dataset(&[&["w1_q1", "w1_q1"]]);
        assert_eq!(
            ds.check_invariants(),
            Err(InvariantViolation::DuplicateId {
                id: "w1_q1".to_string()
            })
        );
    }

    #[test]
    fn week_gap_is_reported() {
        let mut ds = dataset(&[&["w1_q1"], &["w2_q1"]]);
        ds.weeks[1].week_id = 3;
        assert!(matches!(
            ds.check_invariants(),
            Err(InvariantViolation::WeekIdGap { expected: 2, found: 3, .. })
        ));
    }

    #[test]
    fn series_drift_is_reported() {
        let mut ds = dataset(&[&["w1_q1", "w1_q2"]]);
        ds.full_series.swap(0, 1);
        assert_eq!(
            ds.check_invariants(),
            Err(InvariantViolation::SeriesMismatch { index: 0 })
        );
    }

    #[test]
    fn total_mismatch_is_reported() {
        let mut ds = dataset(&[&["w1_q1"]]);
        ds.total_questions = 120;
        assert!(matches!(
            ds.check_invariants(),
            Err(InvariantViolation::TotalMismatch { declared: 120, actual: 1 })
        ));
    }
}
