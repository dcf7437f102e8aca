//! Parsers for model replies.
//!
//! Every assumption about the textual shape of a reply lives here, paired
//! with the markers in [`crate::prompts`].

use crate::error::{WorkflowError, WorkflowResult};
use crate::prompts::{ACKNOWLEDGEMENT_MARKER, QUESTIONS_MARKER, UPDATED_SUMMARY_MARKER};

/// Number of clarifying questions a clarification reply must contain.
pub const QUESTION_COUNT: usize = 5;

/// Level-3 headers that are layout, not framework names.
const HEADER_STOPLIST: &[&str] = &[
    "Critique Round",
    "Critique Round 1",
    "Critique Round 2",
    "Critique Round 3",
    "Critique Output",
];

/// Extract the five numbered clarifying questions.
///
/// Only text after the questions marker is searched; without a marker the
/// whole reply is. For each N in 1..=5 the first line starting with `"N. "`
/// supplies question N. Lines numbered 6 and up are ignored. A missing number
/// is a malformed reply; nothing is padded or truncated.
pub fn extract_questions(output: &str) -> WorkflowResult<Vec<String>> {
    let block = output
        .split_once(QUESTIONS_MARKER)
        .map(|(_, tail)| tail)
        .unwrap_or(output);
    let lines: Vec<&str> = block.lines().map(str::trim).collect();

    (1..=QUESTION_COUNT)
        .map(|n| {
            let prefix = format!("{}. ", n);
            lines
                .iter()
                .find_map(|line| line.strip_prefix(prefix.as_str()))
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .ok_or_else(|| WorkflowError::MalformedOutput {
                    stage: "clarify".to_string(),
                    reason: format!(
                        "expected {} numbered questions, question {} is missing",
                        QUESTION_COUNT, n
                    ),
                })
        })
        .collect()
}

/// Text before the questions marker, trimmed.
///
/// A decorative emoji left dangling before the marker is dropped. Without
/// a marker the whole reply is the understanding.
pub fn reframed_understanding(output: &str) -> String {
    let head = output
        .split_once(QUESTIONS_MARKER)
        .map(|(head, _)| head)
        .unwrap_or(output)
        .trim_end();
    head.trim_end_matches('🧩').trim().to_string()
}

/// Framework names from `### Name` headers, stoplist removed, deduplicated
/// in order of first appearance.
pub fn extract_framework_names(critique: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for line in critique.lines() {
        let Some(rest) = line.strip_prefix("###") else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }
        let name = rest.trim();
        if name.is_empty() || HEADER_STOPLIST.contains(&name) {
            continue;
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Split a context update reply into acknowledgement and new summary.
///
/// Returns `None` when either marker is missing or they are out of order.
/// A `---` separator ending the acknowledgement is dropped.
pub fn parse_fold(raw: &str) -> Option<(String, String)> {
    let (_, after_ack) = raw.split_once(ACKNOWLEDGEMENT_MARKER)?;
    let (ack, summary) = after_ack.split_once(UPDATED_SUMMARY_MARKER)?;

    let ack = ack.trim();
    let ack = ack.strip_suffix("---").unwrap_or(ack).trim();

    Some((ack.to_string(), summary.trim().to_string()))
}
