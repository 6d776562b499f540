use regex::Regex;

use crate::heuristic::{DEFAULT_ANSWER_PATTERNS, DEFAULT_QUESTION_PATTERNS};

/// Configuration for question harvesting.
///
/// Pattern lists are tried in order and the first match wins. Answer
/// patterns should expose the answer text as capture group 1; the whole
/// match is used otherwise.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub(crate) question_patterns: Vec<Regex>,
    pub(crate) answer_patterns: Vec<Regex>,
    /// Drop text-path questions that never picked up an answer.
    pub(crate) require_answer: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            question_patterns: DEFAULT_QUESTION_PATTERNS.to_vec(),
            answer_patterns: DEFAULT_ANSWER_PATTERNS.to_vec(),
            require_answer: true,
        }
    }
}

impl HarvestConfig {
    pub fn require_answer(&self) -> bool {
        self.require_answer
    }

    pub(crate) fn is_question(&self, line: &str) -> bool {
        self.question_patterns.iter().any(|re| re.is_match(line))
    }

    pub(crate) fn answer_in(&self, line: &str) -> Option<String> {
        self.answer_patterns.iter().find_map(|re| {
            let caps = re.captures(line)?;
            let text = caps.get(1).or_else(|| caps.get(0))?;
            Some(text.as_str().trim().to_string())
        })
    }
}

/// Builder for [`HarvestConfig`].
///
/// Patterns are given as strings and compiled in [`build()`](Self::build),
/// which fails fast with `regex::Error` on the first invalid one. A replaced
/// list drops the built-in patterns; extra patterns are tried after whichever
/// list is in effect.
#[derive(Debug, Clone, Default)]
pub struct HarvestConfigBuilder {
    question_patterns: Option<Vec<String>>,
    extra_question_patterns: Vec<String>,
    answer_patterns: Option<Vec<String>>,
    extra_answer_patterns: Vec<String>,
    require_answer: Option<bool>,
}

impl HarvestConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn question_patterns(mut self, patterns: Vec<String>) -> Self {
        self.question_patterns = Some(patterns);
        self
    }

    pub fn extra_question_patterns(mut self, patterns: Vec<String>) -> Self {
        self.extra_question_patterns.extend(patterns);
        self
    }

    pub fn answer_patterns(mut self, patterns: Vec<String>) -> Self {
        self.answer_patterns = Some(patterns);
        self
    }

    pub fn extra_answer_patterns(mut self, patterns: Vec<String>) -> Self {
        self.extra_answer_patterns.extend(patterns);
        self
    }

    pub fn require_answer(mut self, require: bool) -> Self {
        self.require_answer = Some(require);
        self
    }

    pub fn build(self) -> Result<HarvestConfig, regex::Error> {
        Ok(HarvestConfig {
            question_patterns: pattern_list(
                self.question_patterns,
                self.extra_question_patterns,
                &DEFAULT_QUESTION_PATTERNS,
            )?,
            answer_patterns: pattern_list(
                self.answer_patterns,
                self.extra_answer_patterns,
                &DEFAULT_ANSWER_PATTERNS,
            )?,
            require_answer: self.require_answer.unwrap_or(true),
        })
    }
}

fn pattern_list(
    replacement: Option<Vec<String>>,
    extra: Vec<String>,
    defaults: &[Regex],
) -> Result<Vec<Regex>, regex::Error> {
    let mut list = match replacement {
        Some(patterns) => patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?,
        None => defaults.to_vec(),
    };
    for pattern in &extra {
        list.push(Regex::new(pattern)?);
    }
    Ok(list)
}
