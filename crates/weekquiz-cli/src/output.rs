use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;
use weekquiz_core::{QuestionRecord, QuizDataset};
use weekquiz_ingest::SourceKind;

const PREVIEW_WEEKS: usize = 2;
const PREVIEW_QUESTIONS: usize = 2;
const QUESTION_PREVIEW_CHARS: usize = 100;
const ANSWER_PREVIEW_CHARS: usize = 50;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn print_build_start(
    w: &mut dyn Write,
    input_name: &str,
    kind: SourceKind,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "Harvesting questions from {} ({})...", input_name.bold(), kind)?;
    } else {
        writeln!(w, "Harvesting questions from {} ({})...", input_name, kind)?;
    }
    Ok(())
}

/// Print the totals of a built or loaded dataset. `variations` is the number
/// of padded clones, shown only when non-zero.
pub fn print_build_summary(
    w: &mut dyn Write,
    dataset: &QuizDataset,
    variations: usize,
    path: &Path,
    color: ColorMode,
) -> std::io::Result<()> {
    let per_week = dataset.weeks.first().map_or(0, |week| week.questions.len());

    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", "DATASET SUMMARY".bold())?;
        writeln!(w, "{}", "=".repeat(60).dimmed())?;
        writeln!(w, "  Total questions:  {}", dataset.total_questions.bold())?;
        writeln!(
            w,
            "  Weeks:            {} x {} questions",
            dataset.week_count().bold(),
            per_week
        )?;
        if variations > 0 {
            writeln!(w, "  Variations:       {}", variations.yellow())?;
        }
        writeln!(w, "  Saved to:         {}", path.display().green())?;
    } else {
        writeln!(w, "DATASET SUMMARY")?;
        writeln!(w, "{}", "=".repeat(60))?;
        writeln!(w, "  Total questions:  {}", dataset.total_questions)?;
        writeln!(
            w,
            "  Weeks:            {} x {} questions",
            dataset.week_count(),
            per_week
        )?;
        if variations > 0 {
            writeln!(w, "  Variations:       {}", variations)?;
        }
        writeln!(w, "  Saved to:         {}", path.display())?;
    }
    Ok(())
}

/// Print the first questions of the first weeks.
pub fn print_preview(
    w: &mut dyn Write,
    dataset: &QuizDataset,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    for week in dataset.weeks.iter().take(PREVIEW_WEEKS) {
        if color.enabled() {
            writeln!(w, "{}", week.week_name.bold().cyan())?;
        } else {
            writeln!(w, "{}", week.week_name)?;
        }
        for question in week.questions.iter().take(PREVIEW_QUESTIONS) {
            print_question(w, question, color)?;
        }
    }
    Ok(())
}

fn print_question(w: &mut dyn Write, q: &QuestionRecord, color: ColorMode) -> std::io::Result<()> {
    let text = truncate(&q.question, QUESTION_PREVIEW_CHARS);
    if color.enabled() {
        writeln!(w, "  {} {}", format!("[{}]", q.id).dimmed(), text)?;
    } else {
        writeln!(w, "  [{}] {}", q.id, text)?;
    }
    if q.is_multiple_choice() {
        writeln!(w, "      {} options", q.options.len())?;
    }
    if q.has_answer() {
        let answer = truncate(&q.answer, ANSWER_PREVIEW_CHARS);
        if color.enabled() {
            writeln!(w, "      Answer: {}", answer.green())?;
        } else {
            writeln!(w, "      Answer: {}", answer)?;
        }
    }
    Ok(())
}

/// Print a harvested pool for `--dry-run`.
pub fn print_pool(
    w: &mut dyn Write,
    input_name: &str,
    pool: &[QuestionRecord],
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Harvested {} questions from {}", pool.len(), input_name)?;
    writeln!(w)?;

    for (i, q) in pool.iter().enumerate() {
        if color.enabled() {
            writeln!(w, "{}", format!("[{}]", i + 1).bold())?;
        } else {
            writeln!(w, "[{}]", i + 1)?;
        }
        writeln!(w, "  Question: {}", q.question)?;
        for option in &q.options {
            writeln!(w, "    - {}", option)?;
        }
        if q.has_answer() {
            writeln!(w, "  Answer:   {}", q.answer)?;
        } else if color.enabled() {
            writeln!(w, "  {}", "(no answer found)".yellow())?;
        } else {
            writeln!(w, "  (no answer found)")?;
        }
        if !q.explanation.is_empty() {
            writeln!(w, "  Explanation: {}", q.explanation)?;
        }
        writeln!(w)?;
    }

    if pool.is_empty() {
        if color.enabled() {
            writeln!(w, "{}", "Nothing to paginate: the pool is empty".red())?;
        } else {
            writeln!(w, "Nothing to paginate: the pool is empty")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weekquiz_core::{PaginationConfig, paginate};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn sample_dataset() -> QuizDataset {
        let mut q = QuestionRecord::new("What is a quorum?");
        q.answer = "A majority of replicas that must agree before a write commits".into();
        q.options = vec!["A majority".into(), "A single node".into()];
        paginate(vec![q], &PaginationConfig::default()).unwrap()
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("héllo wörld", 5), "héllo...");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn summary_reports_grid_and_variations() {
        let dataset = sample_dataset();
        let variations = dataset.count_marked("[Variation] ");
        let out = render(|w| {
            print_build_summary(
                w,
                &dataset,
                variations,
                Path::new("quiz_data.json"),
                ColorMode(false),
            )
        });
        assert!(out.contains("Total questions:  120"));
        assert!(out.contains("12 x 10 questions"));
        assert!(out.contains("Variations:       119"));
        assert!(out.contains("quiz_data.json"));
    }

    #[test]
    fn full_pool_reports_no_variations() {
        let dataset = sample_dataset();
        let out = render(|w| {
            print_build_summary(w, &dataset, 0, Path::new("quiz_data.json"), ColorMode(false))
        });
        assert!(!out.contains("Variations"));
    }

    #[test]
    fn preview_shows_two_weeks_of_two_questions() {
        let dataset = sample_dataset();
        let out = render(|w| print_preview(w, &dataset, ColorMode(false)));
        assert!(out.contains("Week 1"));
        assert!(out.contains("Week 2"));
        assert!(!out.contains("Week 3\n"));
        assert!(out.contains("[w1_q1] Week 1, Q1: What is a quorum?"));
        assert!(out.contains("[w2_q2]"));
        assert!(!out.contains("[w1_q3]"));
        assert!(out.contains("Answer: A majority of replicas that must agree before a wr..."));
    }

    #[test]
    fn empty_pool_is_called_out() {
        let out = render(|w| print_pool(w, "notes.pdf", &[], ColorMode(false)));
        assert!(out.contains("Harvested 0 questions from notes.pdf"));
        assert!(out.contains("pool is empty"));
    }
}
