//! The closed set of workflow actions and their typed payloads.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::keys::StateKey;
use super::state::SessionState;
use crate::error::{WorkflowError, WorkflowResult};
use crate::prompts::UNDERSTANDING_CORRECTION_LABEL;

/// Default critique abstraction level when none is supplied.
pub const DEFAULT_ABSTRACTION_LEVEL: u8 = 5;

/// Highest critique abstraction level.
pub const MAX_ABSTRACTION_LEVEL: u8 = 10;

/// Highest `answer_N` field read from an `update_summary` form.
const MAX_ANSWER_FIELDS: usize = 32;

/// Most frameworks a user may pick for round 3.
pub const MAX_ROUND_3_FRAMEWORKS: usize = 3;

/// Action names accepted by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Submit the idea and request clarifying questions.
    SubmitIdea,
    /// Answer the questions and build the context summary.
    UpdateSummary,
    /// First critique round over the whole catalog.
    RunCritique1,
    /// Reflections on round 1.
    SubmitR1,
    /// Second critique round with fresh frameworks.
    RunCritique2,
    /// Reflections on round 2.
    SubmitR2,
    /// Third critique round with user-picked frameworks.
    RunRound3,
    /// Skip round 3.
    SkipRound3,
    /// Reflections on round 3.
    SubmitR3,
    /// Synthesize the critique rounds.
    RunSynthesis,
    /// Propose mitigations.
    RunMitigations,
    /// Build the exportable context prompt.
    GenerateContextPrompt,
    /// Clear the session.
    ResetApp,
}

impl ActionKind {
    /// Every action, in pipeline order.
    pub const ALL: [ActionKind; 13] = [
        ActionKind::SubmitIdea,
        ActionKind::UpdateSummary,
        ActionKind::RunCritique1,
        ActionKind::SubmitR1,
        ActionKind::RunCritique2,
        ActionKind::SubmitR2,
        ActionKind::RunRound3,
        ActionKind::SkipRound3,
        ActionKind::SubmitR3,
        ActionKind::RunSynthesis,
        ActionKind::RunMitigations,
        ActionKind::GenerateContextPrompt,
        ActionKind::ResetApp,
    ];

    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::SubmitIdea => "submit_idea",
            ActionKind::UpdateSummary => "update_summary",
            ActionKind::RunCritique1 => "run_critique_1",
            ActionKind::SubmitR1 => "submit_r1",
            ActionKind::RunCritique2 => "run_critique_2",
            ActionKind::SubmitR2 => "submit_r2",
            ActionKind::RunRound3 => "run_round_3",
            ActionKind::SkipRound3 => "skip_round_3",
            ActionKind::SubmitR3 => "submit_r3",
            ActionKind::RunSynthesis => "run_synthesis",
            ActionKind::RunMitigations => "run_mitigations",
            ActionKind::GenerateContextPrompt => "generate_context_prompt",
            ActionKind::ResetApp => "reset_app",
        }
    }

    /// Round number for reflection submissions.
    pub fn reflection_round(&self) -> Option<u8> {
        match self {
            ActionKind::SubmitR1 => Some(1),
            ActionKind::SubmitR2 => Some(2),
            ActionKind::SubmitR3 => Some(3),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| WorkflowError::Validation {
                field: "action".to_string(),
                reason: format!("Unknown action: {}", s),
            })
    }
}

/// The idea as first submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredInput {
    /// Problem statement.
    pub problem: String,
    /// Proposed approach.
    pub approach: String,
    /// Primary stakeholder, possibly blank.
    pub stakeholder: String,
    /// Non-blank constraint lines.
    pub constraints: Vec<String>,
    /// Critique abstraction level, 0 to 10.
    pub abstraction_level: u8,
}

impl StructuredInput {
    /// Build from raw form text. Fields are trimmed, constraints split one
    /// per line with blank lines dropped, abstraction clamped to the max.
    pub fn from_raw(
        problem: &str,
        approach: &str,
        stakeholder: &str,
        constraints: &str,
        abstraction_level: u8,
    ) -> Self {
        Self {
            problem: problem.trim().to_string(),
            approach: approach.trim().to_string(),
            stakeholder: stakeholder.trim().to_string(),
            constraints: constraints
                .lines()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect(),
            abstraction_level: abstraction_level.min(MAX_ABSTRACTION_LEVEL),
        }
    }

    /// The text block handed to the clarification and summary prompts.
    pub fn formatted(&self) -> String {
        let constraints = self
            .constraints
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Problem:\n{}\n\nProposed Approach:\n{}\n\nPrimary Stakeholder:\n{}\n\n\
             Constraints & Non-Negotiables:\n{}\n\nCritique Abstraction Level: {}",
            self.problem, self.approach, self.stakeholder, constraints, self.abstraction_level
        )
    }
}

/// Clarification answers as submitted, positional to the extracted questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClarificationForm {
    /// Correction to the reframed understanding, or `-`.
    pub understanding_correction: String,
    /// One answer per question, in question order.
    pub answers: Vec<String>,
}

/// A parsed action with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// See [`ActionKind::SubmitIdea`].
    SubmitIdea(StructuredInput),
    /// See [`ActionKind::UpdateSummary`].
    UpdateSummary(ClarificationForm),
    /// See [`ActionKind::RunCritique1`].
    RunCritique1 {
        /// User-edited context summary; replaces the stored one when non-blank.
        edited_summary: Option<String>,
    },
    /// Reflections for one critique round.
    SubmitReflections {
        /// Round number, 1 to 3.
        round: u8,
        /// Reflection text keyed by framework name.
        responses: BTreeMap<String, String>,
    },
    /// See [`ActionKind::RunCritique2`].
    RunCritique2,
    /// See [`ActionKind::RunRound3`].
    RunRound3 {
        /// Framework names as picked, deduplicated.
        frameworks: Vec<String>,
    },
    /// See [`ActionKind::SkipRound3`].
    SkipRound3,
    /// See [`ActionKind::RunSynthesis`].
    RunSynthesis,
    /// See [`ActionKind::RunMitigations`].
    RunMitigations,
    /// See [`ActionKind::GenerateContextPrompt`].
    GenerateContextPrompt,
    /// See [`ActionKind::ResetApp`].
    ResetApp,
}

impl Action {
    /// The action's name.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::SubmitIdea(_) => ActionKind::SubmitIdea,
            Action::UpdateSummary(_) => ActionKind::UpdateSummary,
            Action::RunCritique1 { .. } => ActionKind::RunCritique1,
            Action::SubmitReflections { round: 1, .. } => ActionKind::SubmitR1,
            Action::SubmitReflections { round: 2, .. } => ActionKind::SubmitR2,
            Action::SubmitReflections { .. } => ActionKind::SubmitR3,
            Action::RunCritique2 => ActionKind::RunCritique2,
            Action::RunRound3 { .. } => ActionKind::RunRound3,
            Action::SkipRound3 => ActionKind::SkipRound3,
            Action::RunSynthesis => ActionKind::RunSynthesis,
            Action::RunMitigations => ActionKind::RunMitigations,
            Action::GenerateContextPrompt => ActionKind::GenerateContextPrompt,
            Action::ResetApp => ActionKind::ResetApp,
        }
    }

    /// Parse an action name and its form fields.
    ///
    /// Form field names:
    /// - `submit_idea`: `problem`, `approach`, `stakeholder`, `constraints`
    ///   (one per line), `abstraction` (0-10, default 5)
    /// - `update_summary`: `understanding_correction`, `answer_1`..`answer_5`
    /// - `run_critique_1`: optional `context_summary`
    /// - `submit_r1`/`submit_r2`/`submit_r3`: one field per framework name
    /// - `run_round_3`: `frameworks`, names separated by newlines or commas
    ///
    /// Only the shape is checked here. Required-field validation happens in
    /// the dispatcher against the session state.
    pub fn from_form(name: &str, form: &HashMap<String, String>) -> WorkflowResult<Self> {
        let kind: ActionKind = name.trim().parse()?;
        let field = |key: &str| form.get(key).map(String::as_str).unwrap_or("");

        let action = match kind {
            ActionKind::SubmitIdea => {
                let abstraction = parse_abstraction(field("abstraction"))?;
                Action::SubmitIdea(StructuredInput::from_raw(
                    field("problem"),
                    field("approach"),
                    field("stakeholder"),
                    field("constraints"),
                    abstraction,
                ))
            }
            ActionKind::UpdateSummary => {
                let mut answers: Vec<(usize, String)> = form
                    .iter()
                    .filter_map(|(key, value)| {
                        key.strip_prefix("answer_")
                            .and_then(|n| n.parse::<usize>().ok())
                            .filter(|n| (1..=MAX_ANSWER_FIELDS).contains(n))
                            .map(|n| (n, value.trim().to_string()))
                    })
                    .collect();
                answers.sort_by_key(|(n, _)| *n);

                // Positional; a gap leaves an empty answer for validation to reject.
                let count = answers.last().map(|(n, _)| *n).unwrap_or(0);
                let mut positional = vec![String::new(); count];
                for (n, value) in answers {
                    positional[n - 1] = value;
                }

                Action::UpdateSummary(ClarificationForm {
                    understanding_correction: field("understanding_correction").trim().to_string(),
                    answers: positional,
                })
            }
            ActionKind::RunCritique1 => {
                let edited = field("context_summary").trim();
                Action::RunCritique1 {
                    edited_summary: (!edited.is_empty()).then(|| edited.to_string()),
                }
            }
            ActionKind::SubmitR1 | ActionKind::SubmitR2 | ActionKind::SubmitR3 => {
                Action::SubmitReflections {
                    round: kind.reflection_round().unwrap_or(1),
                    responses: form
                        .iter()
                        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                        .collect(),
                }
            }
            ActionKind::RunCritique2 => Action::RunCritique2,
            ActionKind::RunRound3 => {
                let mut frameworks: Vec<String> = Vec::new();
                for name in field("frameworks")
                    .split(['\n', ','])
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                {
                    if !frameworks.iter().any(|f| f == name) {
                        frameworks.push(name.to_string());
                    }
                }
                Action::RunRound3 { frameworks }
            }
            ActionKind::SkipRound3 => Action::SkipRound3,
            ActionKind::RunSynthesis => Action::RunSynthesis,
            ActionKind::RunMitigations => Action::RunMitigations,
            ActionKind::GenerateContextPrompt => Action::GenerateContextPrompt,
            ActionKind::ResetApp => Action::ResetApp,
        };

        Ok(action)
    }
}

/// Form fields for `update_summary` as `(field name, label)` pairs.
///
/// The understanding correction comes first, then one field per extracted
/// question. Empty until clarification has run.
pub fn update_summary_fields(state: &SessionState) -> Vec<(String, String)> {
    let Some(questions) = state.list(StateKey::ClarificationQuestions) else {
        return Vec::new();
    };

    std::iter::once((
        "understanding_correction".to_string(),
        UNDERSTANDING_CORRECTION_LABEL.to_string(),
    ))
    .chain(
        questions
            .iter()
            .enumerate()
            .map(|(i, q)| (format!("answer_{}", i + 1), q.clone())),
    )
    .collect()
}

fn parse_abstraction(raw: &str) -> WorkflowResult<u8> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_ABSTRACTION_LEVEL);
    }
    raw.parse::<i64>()
        .map(|n| n.clamp(0, i64::from(MAX_ABSTRACTION_LEVEL)) as u8)
        .map_err(|_| WorkflowError::Validation {
            field: "abstraction".to_string(),
            reason: format!("Abstraction level must be a whole number from 0 to 10, got '{}'", raw),
        })
}
