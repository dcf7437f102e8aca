//! Context accumulation: folding a round of reflections into the summary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::keys::StateKey;
use super::parse::parse_fold;
use super::state::SessionState;
use crate::error::LangbaseResult;
use crate::langbase::{GenerationRequest, Generator, Stage};
use crate::prompts::context_update_prompt;

/// Acknowledgement used when a context update reply lacks its markers.
pub const FALLBACK_ACKNOWLEDGEMENT: &str =
    "Formatting issue: the model reply did not follow the expected format, so the full reply was kept as the updated context summary.";

/// Whether the reply followed the two-part marker format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldFormat {
    /// Both markers were found.
    Structured,
    /// Markers were missing; the whole reply became the summary.
    Fallback,
}

/// Result of a fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldOutcome {
    /// Acknowledgement shown back to the user.
    pub acknowledgement: String,
    /// Replacement context summary.
    pub summary: String,
    /// How the reply was interpreted.
    pub format: FoldFormat,
}

impl FoldOutcome {
    /// Interpret a raw context update reply.
    pub fn from_reply(raw: &str) -> Self {
        match parse_fold(raw) {
            Some((acknowledgement, summary)) => Self {
                acknowledgement,
                summary,
                format: FoldFormat::Structured,
            },
            None => Self {
                acknowledgement: FALLBACK_ACKNOWLEDGEMENT.to_string(),
                summary: raw.trim().to_string(),
                format: FoldFormat::Fallback,
            },
        }
    }
}

/// Fold one round's critique and reflections into a replacement summary.
///
/// A reply missing its markers degrades to [`FoldFormat::Fallback`]; only a
/// failed generation call is an error.
pub async fn fold(
    generator: &dyn Generator,
    round: u8,
    previous_summary: &str,
    critique: &str,
    feedback: &str,
) -> LangbaseResult<FoldOutcome> {
    let prompt = context_update_prompt(round, previous_summary, critique, feedback);
    let raw = generator
        .generate(GenerationRequest::for_stage(Stage::ContextUpdate, prompt))
        .await?;

    let outcome = FoldOutcome::from_reply(&raw);
    match outcome.format {
        FoldFormat::Structured => info!(
            round,
            summary_len = outcome.summary.len(),
            "Context summary folded"
        ),
        FoldFormat::Fallback => warn!(
            round,
            reply_len = raw.len(),
            "Context update reply missing markers, keeping full reply as summary"
        ),
    }
    Ok(outcome)
}

/// Render reflections in framework order for prompts.
pub fn format_reflections(frameworks: &[String], responses: &BTreeMap<String, String>) -> String {
    frameworks
        .iter()
        .filter_map(|fw| {
            responses
                .get(fw)
                .map(|answer| format!("💡 **{}**\n{}", fw, answer.trim()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every present critique, in round order, each preceded by a separator.
pub fn combined_critiques(state: &SessionState) -> String {
    (1..=3)
        .filter_map(StateKey::critique)
        .filter_map(|key| state.text(key))
        .map(|text| format!("\n---\n{}", text))
        .collect()
}

/// Every present round of reflections, in round order.
pub fn combined_reflections(state: &SessionState) -> String {
    (1..=3)
        .filter_map(|round| round_reflections(state, round))
        .map(|text| format!("\n---\n{}", text))
        .collect()
}

/// Formatted reflections for one round, if submitted.
pub fn round_reflections(state: &SessionState, round: u8) -> Option<String> {
    let responses = state.map(StateKey::responses(round)?)?;
    let frameworks = StateKey::frameworks(round)
        .and_then(|key| state.list(key))
        .unwrap_or_default();
    Some(format_reflections(frameworks, responses))
}
