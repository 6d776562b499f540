//! Cleanup of hand- or LLM-authored question collections that are "almost
//! JSON", followed by structural parsing.
//!
//! Each rewrite is a pure text-to-text function; [`normalize`] applies them
//! in the only order that works (comments must go before trailing commas
//! are detected, citations before escapes are checked). Running
//! [`normalize`] over its own output returns it unchanged.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use weekquiz_core::QuestionRecord;

use crate::HarvestError;

/// Characters that may legally follow a backslash in a JSON string.
const VALID_ESCAPES: [char; 8] = ['"', '\\', '/', 'b', 'f', 'n', 'r', 't'];
const UNICODE_ESCAPE: char = 'u';

/// Remove every line whose first non-blank characters are `//`.
pub fn strip_line_comments(text: &str) -> Cow<'_, str> {
    static COMMENT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*//.*(?:\n|$)").unwrap());
    COMMENT_LINE.replace_all(text, "")
}

/// Remove bare `[cite_start]` markers.
pub fn strip_citation_starts(text: &str) -> Cow<'_, str> {
    static CITE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[cite_start\]").unwrap());
    CITE_START.replace_all(text, "")
}

/// Remove `[cite: …]` markers together with their payload.
pub fn strip_citation_spans(text: &str) -> Cow<'_, str> {
    static CITE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[cite:[^\]]*\]").unwrap());
    CITE_SPAN.replace_all(text, "")
}

/// Drop a comma that directly precedes (modulo whitespace) `]` or `}`.
///
/// String literals are matched first and copied through, so a `,]` inside
/// question text is left alone.
pub fn strip_trailing_commas(text: &str) -> Cow<'_, str> {
    static TRAILING_COMMA: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#""(?:[^"\\]|\\.)*"|,(\s*[\]}])"#).unwrap());
    TRAILING_COMMA.replace_all(text, |caps: &regex::Captures| match caps.get(1) {
        Some(close) => close.as_str().to_string(),
        None => caps[0].to_string(),
    })
}

/// Double every backslash that does not start a valid JSON escape.
///
/// A valid pair (`\\`, `\n`, …) is consumed as a unit, so an already
/// doubled backslash is left alone.
pub fn escape_stray_backslashes(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(&next) if VALID_ESCAPES.contains(&next) || next == UNICODE_ESCAPE => {
                out.push('\\');
                out.push(next);
                chars.next();
            }
            _ => out.push_str("\\\\"),
        }
    }
    Cow::Owned(out)
}

/// Apply every rewrite in order, producing text a strict JSON parser accepts
/// (unless the input is broken beyond these artifacts).
pub fn normalize(raw: &str) -> String {
    let text = strip_line_comments(raw);
    let text = strip_citation_starts(&text);
    let text = strip_citation_spans(&text);
    let text = strip_trailing_commas(&text);
    let text = escape_stray_backslashes(&text);
    text.into_owned()
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    question: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Normalize `raw`, parse it, and keep the entries that are usable questions.
///
/// The document must be a JSON array. Entries that are not objects, lack a
/// string `question`, carry an empty one, or have wrongly typed optional
/// fields are skipped.
pub fn parse_records(raw: &str) -> Result<Vec<QuestionRecord>, HarvestError> {
    let canonical = normalize(raw);
    let doc: Value = serde_json::from_str(&canonical).map_err(|e| HarvestError::Parse {
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })?;

    let items = match doc {
        Value::Array(items) => items,
        other => {
            return Err(HarvestError::NotASequence {
                found: value_kind(&other),
            });
        }
    };

    let total = items.len();
    let records: Vec<QuestionRecord> = items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| well_formed(position, item))
        .collect();

    tracing::info!(total, kept = records.len(), "parsed record collection");
    Ok(records)
}

fn well_formed(position: usize, item: Value) -> Option<QuestionRecord> {
    match serde_json::from_value::<RawRecord>(item) {
        Ok(raw) if raw.question.trim().is_empty() => {
            tracing::debug!(position, "dropping record with empty question");
            None
        }
        Ok(raw) => Some(QuestionRecord {
            question: raw.question,
            options: raw.options.unwrap_or_default(),
            answer: raw.answer.unwrap_or_default(),
            explanation: raw.explanation.unwrap_or_default(),
            id: String::new(),
        }),
        Err(e) => {
            tracing::debug!(position, error = %e, "dropping malformed record");
            None
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_lines_are_removed() {
        let text = "[\n  // first batch\n    //indented\n  {\"question\": \"a // b\"}\n]";
        assert_eq!(
            strip_line_comments(text),
            "[\n  {\"question\": \"a // b\"}\n]"
        );
    }

    #[test]
    fn trailing_comment_without_newline_is_removed() {
        assert_eq!(strip_line_comments("[]\n// done"), "[]\n");
    }

    #[test]
    fn citation_markers_are_removed() {
        let text = r#"{"question": "[cite_start]What is Chord? [cite: 12, 14]"}"#;
        let text = strip_citation_starts(text);
        let text = strip_citation_spans(&text);
        assert_eq!(text, r#"{"question": "What is Chord? "}"#);
    }

    #[test]
    fn trailing_commas_are_removed() {
        assert_eq!(strip_trailing_commas("[1, 2,]"), "[1, 2]");
        assert_eq!(strip_trailing_commas("{\"a\": 1,\n}"), "{\"a\": 1\n}");
        assert_eq!(strip_trailing_commas("[1, 2]"), "[1, 2]");
    }

    #[test]
    fn trailing_commas_inside_strings_are_kept() {
        let text = r#"[{"question": "Is [1, 2,] valid syntax?", "answer": "{a,}",},]"#;
        assert_eq!(
            strip_trailing_commas(text),
            r#"[{"question": "Is [1, 2,] valid syntax?", "answer": "{a,}"}]"#
        );
        let escaped = r#"["say \"x,]\" ok",]"#;
        assert_eq!(strip_trailing_commas(escaped), r#"["say \"x,]\" ok"]"#);
    }

    #[test]
    fn stray_backslashes_are_doubled() {
        assert_eq!(escape_stray_backslashes(r#"O(\log n)"#), r#"O(\\log n)"#);
        assert_eq!(escape_stray_backslashes(r#"a\nb \"q\" \u00e9"#), r#"a\nb \"q\" \u00e9"#);
        assert_eq!(escape_stray_backslashes(r#"ends with \"#), r#"ends with \\"#);
    }

    #[test]
    fn escaping_is_idempotent() {
        let once = escape_stray_backslashes(r#"\alpha \\beta \d"#).into_owned();
        assert_eq!(once, r#"\\alpha \\beta \\d"#);
        assert_eq!(escape_stray_backslashes(&once), once);
    }

    #[test]
    fn normalize_is_noop_on_clean_json() {
        let clean = r#"[
  {
    "question": "Which is faster, \"A\" or B?",
    "options": ["A", "B"],
    "answer": "A",
    "explanation": "path C:\\tmp"
  }
]"#;
        assert_eq!(normalize(clean), clean);
        let bracketed = r#"[{"question": "Is [1, 2,] valid syntax?", "answer": "{a,}"}]"#;
        assert_eq!(normalize(bracketed), bracketed);
        let records = parse_records(bracketed).unwrap();
        assert_eq!(records[0].question, "Is [1, 2,] valid syntax?");
        assert_eq!(records[0].answer, "{a,}");
        let once = normalize("[\n// x\n{\"question\": \"\\q [cite: 1]\",},\n]");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let raw = r#"[
            {"question": "Kept?", "answer": "yes"},
            {"answer": "no question"},
            {"question": "   "},
            {"question": 42},
            {"question": "Bad options?", "options": [1, 2]},
            "just a string",
            {"question": "Null fields?", "answer": null, "options": null}
        ]"#;
        let records = parse_records(raw).unwrap();
        let questions: Vec<&str> = records.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(questions, vec!["Kept?", "Null fields?"]);
        assert_eq!(records[0].answer, "yes");
        assert!(records[1].options.is_empty());
        assert_eq!(records[1].answer, "");
    }

    #[test]
    fn unknown_fields_and_ids_are_ignored() {
        let raw = r#"[{"question": "Q?", "id": "g1_q1", "difficulty": 3}]"#;
        let records = parse_records(raw).unwrap();
        assert_eq!(records[0].id, "");
    }

    #[test]
    fn broken_document_reports_position() {
        let err = parse_records("[\n  {\"question\": \"open\"\n]").unwrap_err();
        match err {
            HarvestError::Parse { line, column, .. } => {
                assert_eq!(line, 3);
                assert!(column > 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_array_document_is_rejected() {
        let err = parse_records(r#"{"question": "alone?"}"#).unwrap_err();
        assert!(matches!(err, HarvestError::NotASequence { found: "an object" }));
    }

    #[test]
    fn empty_array_parses_to_nothing() {
        assert!(parse_records("[]").unwrap().is_empty());
    }
}
