use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{QuestionRecord, QuizDataset, WeekGroup};

pub const DEFAULT_WEEKS: usize = 12;
pub const DEFAULT_QUESTIONS_PER_WEEK: usize = 10;
pub const DEFAULT_VARIATION_MARKER: &str = "[Variation] ";

/// What to do when the harvested pool cannot fill every week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortPoolPolicy {
    /// Append marked clones of the pool until the grid is full.
    #[default]
    PadWithMarkedDuplicates,
    /// Refuse to build a dataset.
    Fail,
}

#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub weeks: usize,
    pub questions_per_week: usize,
    pub on_short_pool: ShortPoolPolicy,
    /// Prefix applied to every backfilled clone's question text.
    pub variation_marker: String,
    /// Restrict backfill to the first N pool entries. `None` cycles the
    /// whole pool.
    pub backfill_window: Option<usize>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            weeks: DEFAULT_WEEKS,
            questions_per_week: DEFAULT_QUESTIONS_PER_WEEK,
            on_short_pool: ShortPoolPolicy::default(),
            variation_marker: DEFAULT_VARIATION_MARKER.to_string(),
            backfill_window: None,
        }
    }
}

impl PaginationConfig {
    /// Total number of questions in a complete dataset, or `None` when the
    /// product overflows.
    pub fn target_len(&self) -> Option<usize> {
        self.weeks.checked_mul(self.questions_per_week)
    }

    /// The grid size, provided both dimensions are non-zero and every week
    /// and question number fits in a `u32`.
    fn checked_shape(&self) -> Result<(u32, u32, usize), PaginateError> {
        let invalid = || PaginateError::InvalidShape {
            weeks: self.weeks,
            per_week: self.questions_per_week,
        };
        let weeks = u32::try_from(self.weeks).map_err(|_| invalid())?;
        let per_week = u32::try_from(self.questions_per_week).map_err(|_| invalid())?;
        if weeks == 0 || per_week == 0 {
            return Err(invalid());
        }
        let target = self.target_len().ok_or_else(invalid)?;
        Ok((weeks, per_week, target))
    }

    fn window(&self, available: usize) -> usize {
        self.backfill_window
            .filter(|&w| w > 0)
            .map_or(available, |w| w.min(available))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaginateError {
    #[error("no valid questions to paginate")]
    EmptyPool,
    #[error("only {available} valid questions, {required} required")]
    ShortPool { available: usize, required: usize },
    #[error("invalid layout: {weeks} weeks of {per_week} questions")]
    InvalidShape { weeks: usize, per_week: usize },
}

/// Lay a flat question pool out as `weeks × questions_per_week`.
///
/// Long pools keep their first `target_len()` entries; short pools are
/// padded or rejected according to `on_short_pool`. An empty pool is always
/// rejected. Every emitted record gets an id `w<week>_q<index>` and its
/// question is prefixed with `"Week <week>, Q<index>: "`.
pub fn paginate(
    pool: Vec<QuestionRecord>,
    config: &PaginationConfig,
) -> Result<QuizDataset, PaginateError> {
    let (week_count, per_week, target) = config.checked_shape()?;
    let series = fill_to_target(pool, target, config)?;

    let mut full_series = Vec::with_capacity(series.len());
    let mut records = series.into_iter();
    let mut weeks = Vec::new();

    for week in 1..=week_count {
        let questions: Vec<QuestionRecord> = records
            .by_ref()
            .take(per_week as usize)
            .zip(1..=per_week)
            .map(|(record, index)| stamp(record, week, index))
            .collect();
        full_series.extend(questions.iter().cloned());
        weeks.push(WeekGroup {
            week_id: week,
            week_name: WeekGroup::display_name(week),
            questions,
        });
    }

    Ok(QuizDataset {
        total_questions: full_series.len(),
        weeks,
        full_series,
    })
}

fn fill_to_target(
    mut pool: Vec<QuestionRecord>,
    target: usize,
    config: &PaginationConfig,
) -> Result<Vec<QuestionRecord>, PaginateError> {
    let available = pool.len();

    if available == 0 {
        return Err(PaginateError::EmptyPool);
    }

    if available >= target {
        if available > target {
            tracing::info!(available, dropped = available - target, "truncating question pool");
        }
        pool.truncate(target);
        return Ok(pool);
    }

    match config.on_short_pool {
        ShortPoolPolicy::Fail => Err(PaginateError::ShortPool {
            available,
            required: target,
        }),
        ShortPoolPolicy::PadWithMarkedDuplicates => {
            let window = config.window(available);
            let clones: Vec<QuestionRecord> =
                marked_duplicates(&pool[..window], &config.variation_marker)
                    .take(target - available)
                    .collect();
            tracing::warn!(
                available,
                padded = clones.len(),
                window,
                "short question pool padded with marked duplicates"
            );
            pool.extend(clones);
            Ok(pool)
        }
    }
}

/// Endless cycle over `originals`, each clone tagged with `marker`.
fn marked_duplicates<'a>(
    originals: &'a [QuestionRecord],
    marker: &'a str,
) -> impl Iterator<Item = QuestionRecord> + 'a {
    originals.iter().cycle().map(move |q| QuestionRecord {
        question: format!("{marker}{}", q.question),
        ..q.clone()
    })
}

fn stamp(mut record: QuestionRecord, week: u32, index: u32) -> QuestionRecord {
    record.id = format!("w{week}_q{index}");
    record.question = format!("Week {week}, Q{index}: {}", record.question);
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: usize) -> Vec<QuestionRecord> {
        (0..n)
            .map(|i| QuestionRecord {
                answer: format!("A{i}"),
                ..QuestionRecord::new(format!("Q{i}?"))
            })
            .collect()
    }

    #[test]
    fn exact_pool_is_laid_out_in_order() {
        let ds = paginate(pool(120), &PaginationConfig::default()).unwrap();
        assert_eq!(ds.total_questions, 120);
        assert_eq!(ds.weeks.len(), 12);
        assert_eq!(ds.weeks[0].questions[0].id, "w1_q1");
        assert_eq!(ds.weeks[0].questions[0].question, "Week 1, Q1: Q0?");
        assert_eq!(ds.weeks[11].questions[9].id, "w12_q10");
        assert_eq!(ds.weeks[11].questions[9].question, "Week 12, Q10: Q119?");
        assert_eq!(ds.weeks[4].week_name, "Week 5");
    }

    #[test]
    fn long_pool_is_truncated() {
        let ds = paginate(pool(200), &PaginationConfig::default()).unwrap();
        assert_eq!(ds.full_series.len(), 120);
        assert_eq!(ds.full_series[119].answer, "A119");
    }

    #[test]
    fn short_pool_cycles_whole_pool() {
        let ds = paginate(pool(15), &PaginationConfig::default()).unwrap();
        assert_eq!(ds.full_series.len(), 120);
        // Entry 15 is the first clone of entry 0, entry 29 the clone of 14.
        assert_eq!(ds.full_series[15].question, "Week 2, Q6: [Variation] Q0?");
        assert_eq!(ds.full_series[29].question, "Week 3, Q10: [Variation] Q14?");
        assert_eq!(ds.full_series[30].question, "Week 4, Q1: [Variation] Q0?");
    }

    #[test]
    fn backfill_window_limits_sources() {
        let config = PaginationConfig {
            backfill_window: Some(10),
            ..PaginationConfig::default()
        };
        let ds = paginate(pool(15), &config).unwrap();
        assert_eq!(ds.full_series[24].question, "Week 3, Q5: [Variation] Q9?");
        assert_eq!(ds.full_series[25].question, "Week 3, Q6: [Variation] Q0?");
    }

    #[test]
    fn clones_are_never_marked_twice() {
        let ds = paginate(pool(1), &PaginationConfig::default()).unwrap();
        for q in &ds.full_series[1..] {
            assert_eq!(q.question.matches("[Variation]").count(), 1);
            assert_eq!(q.answer, "A0");
        }
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert_eq!(
            paginate(Vec::new(), &PaginationConfig::default()),
            Err(PaginateError::EmptyPool)
        );
    }

    #[test]
    fn fail_policy_rejects_short_pool() {
        let config = PaginationConfig {
            on_short_pool: ShortPoolPolicy::Fail,
            ..PaginationConfig::default()
        };
        assert_eq!(
            paginate(pool(119), &config),
            Err(PaginateError::ShortPool {
                available: 119,
                required: 120
            })
        );
        assert!(paginate(pool(120), &config).is_ok());
    }

    #[test]
    fn custom_marker_is_applied() {
        let config = PaginationConfig {
            variation_marker: "(copy) ".to_string(),
            ..PaginationConfig::default()
        };
        let ds = paginate(pool(2), &config).unwrap();
        assert_eq!(ds.full_series[2].question, "Week 1, Q3: (copy) Q0?");
    }

    #[test]
    fn custom_shape_is_respected() {
        let config = PaginationConfig {
            weeks: 3,
            questions_per_week: 4,
            ..PaginationConfig::default()
        };
        let ds = paginate(pool(12), &config).unwrap();
        assert_eq!(ds.weeks.len(), 3);
        assert_eq!(ds.weeks[2].questions[3].id, "w3_q4");
    }

    #[test]
    fn zero_sized_shape_is_rejected() {
        let config = PaginationConfig {
            weeks: 0,
            ..PaginationConfig::default()
        };
        assert!(matches!(
            paginate(pool(5), &config),
            Err(PaginateError::InvalidShape { weeks: 0, .. })
        ));
    }

    #[test]
    fn overflowing_shape_is_rejected() {
        let config = PaginationConfig {
            weeks: usize::MAX / 2,
            questions_per_week: 3,
            ..PaginationConfig::default()
        };
        assert_eq!(config.target_len(), None);
        assert!(matches!(
            paginate(pool(5), &config),
            Err(PaginateError::InvalidShape { per_week: 3, .. })
        ));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn week_count_beyond_u32_is_rejected() {
        let config = PaginationConfig {
            weeks: u32::MAX as usize + 1,
            questions_per_week: 1,
            ..PaginationConfig::default()
        };
        assert!(matches!(
            paginate(pool(5), &config),
            Err(PaginateError::InvalidShape { .. })
        ));
    }

    #[test]
    fn short_pool_policy_parses_from_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            on_short_pool: ShortPoolPolicy,
        }
        let w: Wrapper = toml::from_str("on_short_pool = \"fail\"").unwrap();
        assert_eq!(w.on_short_pool, ShortPoolPolicy::Fail);
        let w: Wrapper =
            toml::from_str("on_short_pool = \"pad_with_marked_duplicates\"").unwrap();
        assert_eq!(w.on_short_pool, ShortPoolPolicy::PadWithMarkedDuplicates);
    }
}
