//! Action dispatch.
//!
//! Every action runs in two phases. The first validates the payload and
//! calls the generator against a read-only view of the state, producing a
//! list of staged writes. The second invalidates downstream keys and applies
//! those writes. A failure in the first phase leaves the state untouched.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::actions::{
    Action, ActionKind, ClarificationForm, StructuredInput, DEFAULT_ABSTRACTION_LEVEL,
    MAX_ABSTRACTION_LEVEL, MAX_ROUND_3_FRAMEWORKS,
};
use super::context::{self, combined_critiques, combined_reflections, FoldFormat};
use super::keys::{StateKey, StateValue};
use super::parse::{extract_framework_names, extract_questions, reframed_understanding};
use super::registry::invalidate;
use super::state::SessionState;
use super::step::{derive_step, Step};
use crate::error::{WorkflowError, WorkflowResult};
use crate::frameworks::{catalog_text, selection_text, FrameworkCatalog};
use crate::langbase::{GenerationRequest, Generator, Stage};
use crate::prompts;

/// Result of a successful action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Action that ran.
    pub action: ActionKind,
    /// Step derived after the writes.
    pub step: Step,
    /// Set for reflection submissions; `Fallback` flags a degraded acknowledgement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgement_format: Option<FoldFormat>,
}

/// Writes produced by a validated action, applied after invalidation.
#[derive(Debug, Default)]
struct Staged {
    writes: Vec<(StateKey, StateValue)>,
    acknowledgement_format: Option<FoldFormat>,
}

impl Staged {
    fn write(mut self, key: StateKey, value: impl Into<StateValue>) -> Self {
        self.writes.push((key, value.into()));
        self
    }
}

/// Applies actions to a session's state.
#[derive(Clone)]
pub struct Dispatcher {
    generator: Arc<dyn Generator>,
    catalog: Arc<FrameworkCatalog>,
}

impl Dispatcher {
    /// Create a dispatcher over a generator and a framework catalog.
    pub fn new(generator: Arc<dyn Generator>, catalog: Arc<FrameworkCatalog>) -> Self {
        Self { generator, catalog }
    }

    /// The shared framework catalog.
    pub fn catalog(&self) -> &FrameworkCatalog {
        &self.catalog
    }

    /// Run one action against the state.
    pub async fn dispatch(
        &self,
        state: &mut SessionState,
        action: Action,
    ) -> WorkflowResult<Outcome> {
        let start = Instant::now();
        let kind = action.kind();

        if kind == ActionKind::ResetApp {
            state.clear();
            info!(action = %kind, "Session state cleared");
            return Ok(Outcome {
                action: kind,
                step: Step::Initial,
                acknowledgement_format: None,
            });
        }

        let staged = match self.stage(state, action).await {
            Ok(staged) => staged,
            Err(e) => {
                let latency_ms = start.elapsed().as_millis() as u64;
                if e.is_recoverable() {
                    warn!(action = %kind, error = %e, latency_ms, "Action rejected");
                } else {
                    error!(action = %kind, error = %e, latency_ms, "Action failed");
                }
                return Err(e);
            }
        };

        invalidate(state, kind);
        let written = staged.writes.len();
        for (key, value) in staged.writes {
            state.set(key, value);
        }

        let step = derive_step(state);
        info!(
            action = %kind,
            step = step.number(),
            written,
            latency_ms = start.elapsed().as_millis() as u64,
            "Action completed"
        );

        Ok(Outcome {
            action: kind,
            step,
            acknowledgement_format: staged.acknowledgement_format,
        })
    }

    /// Validate and generate without touching the state.
    async fn stage(&self, state: &SessionState, action: Action) -> WorkflowResult<Staged> {
        match action {
            Action::SubmitIdea(input) => self.submit_idea(input).await,
            Action::UpdateSummary(form) => self.update_summary(state, form).await,
            Action::RunCritique1 { edited_summary } => {
                self.run_critique_1(state, edited_summary).await
            }
            Action::SubmitReflections { round, responses } => {
                self.submit_reflections(state, round, responses).await
            }
            Action::RunCritique2 => self.run_critique_2(state).await,
            Action::RunRound3 { frameworks } => self.run_round_3(state, frameworks).await,
            Action::SkipRound3 => {
                require_text(state, StateKey::AcknowledgementRound2)?;
                Ok(Staged::default().write(StateKey::Round3Skipped, true))
            }
            Action::RunSynthesis => self.run_synthesis(state).await,
            Action::RunMitigations => self.run_mitigations(state).await,
            Action::GenerateContextPrompt => generate_context_prompt(state),
            Action::ResetApp => Ok(Staged::default()),
        }
    }

    async fn generate(&self, stage: Stage, prompt: String) -> WorkflowResult<String> {
        let start = Instant::now();
        let text = self
            .generator
            .generate(GenerationRequest::for_stage(stage, prompt))
            .await?;
        info!(
            stage = %stage,
            latency_ms = start.elapsed().as_millis() as u64,
            "Generation succeeded"
        );
        Ok(text)
    }

    async fn submit_idea(&self, input: StructuredInput) -> WorkflowResult<Staged> {
        if input.problem.is_empty() || input.approach.is_empty() {
            let field = if input.problem.is_empty() {
                "problem"
            } else {
                "approach"
            };
            return Err(validation(
                field,
                "Please fill in both the problem and the approach.",
            ));
        }

        let formatted = input.formatted();
        let raw = self
            .generate(Stage::Clarify, prompts::clarification_prompt(&formatted))
            .await?;
        let questions = extract_questions(&raw)?;
        let reframed = reframed_understanding(&raw);

        Ok(Staged::default()
            .write(StateKey::Problem, input.problem)
            .write(StateKey::Approach, input.approach)
            .write(StateKey::Stakeholder, input.stakeholder)
            .write(StateKey::Constraints, input.constraints)
            .write(StateKey::AbstractionLevel, i64::from(input.abstraction_level))
            .write(StateKey::FormattedInput, formatted)
            .write(StateKey::ClarificationOutput, raw)
            .write(StateKey::ReframedUnderstanding, reframed)
            .write(StateKey::ClarificationQuestions, questions))
    }

    async fn update_summary(
        &self,
        state: &SessionState,
        form: ClarificationForm,
    ) -> WorkflowResult<Staged> {
        let questions = require_list(state, StateKey::ClarificationQuestions)?;
        let formatted = require_text(state, StateKey::FormattedInput)?;

        const MESSAGE: &str = "Please answer all questions before continuing (use '-' for none).";
        if form.understanding_correction.is_empty() {
            return Err(validation("understanding_correction", MESSAGE));
        }
        let mut pairs = Vec::with_capacity(questions.len());
        for (i, question) in questions.iter().enumerate() {
            match form.answers.get(i).filter(|a| !a.is_empty()) {
                Some(answer) => pairs.push((question.clone(), answer.clone())),
                None => return Err(validation(&format!("answer_{}", i + 1), MESSAGE)),
            }
        }

        let summary = self
            .generate(
                Stage::Summary,
                prompts::summary_prompt(formatted, &form.understanding_correction, &pairs),
            )
            .await?;

        let answers: BTreeMap<String, String> = pairs.into_iter().collect();
        Ok(Staged::default()
            .write(
                StateKey::UnderstandingCorrection,
                form.understanding_correction,
            )
            .write(StateKey::ClarificationAnswers, answers)
            .write(StateKey::ContextSummary, summary.trim()))
    }

    async fn run_critique_1(
        &self,
        state: &SessionState,
        edited_summary: Option<String>,
    ) -> WorkflowResult<Staged> {
        let stored = require_text(state, StateKey::ContextSummary)?;
        let summary = edited_summary.as_deref().unwrap_or(stored);

        let prompt = prompts::critique_round_1_prompt(
            summary,
            abstraction_level(state),
            &catalog_text(&self.catalog.all()),
        );
        let critique = self.generate(Stage::Critique, prompt).await?;
        let names = framework_names(&critique, &[])?;

        let mut staged = Staged::default();
        if let Some(edited) = edited_summary {
            staged = staged.write(StateKey::ContextSummary, edited);
        }
        Ok(staged
            .write(StateKey::CritiqueRound1, critique)
            .write(StateKey::FrameworksRound1, names))
    }

    async fn run_critique_2(&self, state: &SessionState) -> WorkflowResult<Staged> {
        let summary = require_text(state, StateKey::ContextSummary)?;
        require_text(state, StateKey::AcknowledgementRound1)?;
        let used = require_list(state, StateKey::FrameworksRound1)?;

        let candidates = self.catalog.excluding(used);
        if candidates.is_empty() {
            return Err(validation(
                "frameworks",
                "No unused frameworks remain for round 2.",
            ));
        }

        let prompt = prompts::critique_round_2_prompt(
            summary,
            abstraction_level(state),
            used,
            &catalog_text(&candidates),
        );
        let critique = self.generate(Stage::Critique, prompt).await?;
        let names = framework_names(&critique, used)?;

        Ok(Staged::default()
            .write(StateKey::CritiqueRound2, critique)
            .write(StateKey::FrameworksRound2, names))
    }

    async fn run_round_3(
        &self,
        state: &SessionState,
        frameworks: Vec<String>,
    ) -> WorkflowResult<Staged> {
        let summary = require_text(state, StateKey::ContextSummary)?;
        require_text(state, StateKey::AcknowledgementRound2)?;

        if frameworks.is_empty() || frameworks.len() > MAX_ROUND_3_FRAMEWORKS {
            return Err(validation(
                "frameworks",
                "Please select between 1 and 3 frameworks.",
            ));
        }
        let selected = self.catalog.selected(&frameworks).map_err(|unknown| {
            validation("frameworks", &format!("Unknown framework: {}", unknown))
        })?;

        let prompt = prompts::critique_round_3_prompt(
            summary,
            abstraction_level(state),
            &selection_text(&selected),
        );
        let critique = self.generate(Stage::Critique, prompt).await?;

        let names: Vec<String> = selected.iter().map(|fw| fw.name.clone()).collect();
        Ok(Staged::default()
            .write(StateKey::SelectedFrameworksRound3, names)
            .write(StateKey::CritiqueRound3, critique))
    }

    async fn submit_reflections(
        &self,
        state: &SessionState,
        round: u8,
        responses: BTreeMap<String, String>,
    ) -> WorkflowResult<Staged> {
        let (critique_key, frameworks_key, responses_key, ack_key) = match (
            StateKey::critique(round),
            StateKey::frameworks(round),
            StateKey::responses(round),
            StateKey::acknowledgement(round),
        ) {
            (Some(c), Some(f), Some(r), Some(a)) => (c, f, r, a),
            _ => return Err(validation("round", "Round must be 1, 2 or 3.")),
        };

        let summary = require_text(state, StateKey::ContextSummary)?;
        let critique = require_text(state, critique_key)?;
        let frameworks = require_list(state, frameworks_key)?;

        let mut kept = BTreeMap::new();
        for fw in frameworks {
            match responses.get(fw).filter(|r| !r.trim().is_empty()) {
                Some(reflection) => {
                    kept.insert(fw.clone(), reflection.trim().to_string());
                }
                None => {
                    return Err(validation(
                        fw,
                        "Please provide a reflection for every framework before continuing.",
                    ))
                }
            }
        }

        let feedback = context::format_reflections(frameworks, &kept);
        let outcome = context::fold(
            self.generator.as_ref(),
            round,
            summary,
            critique,
            &feedback,
        )
        .await?;

        let mut staged = Staged::default()
            .write(responses_key, kept)
            .write(ack_key, outcome.acknowledgement)
            .write(StateKey::ContextSummary, outcome.summary);
        staged.acknowledgement_format = Some(outcome.format);
        Ok(staged)
    }

    async fn run_synthesis(&self, state: &SessionState) -> WorkflowResult<Staged> {
        let summary = require_text(state, StateKey::ContextSummary)?;

        let prompt = prompts::synthesis_prompt(
            summary,
            &combined_critiques(state),
            &combined_reflections(state),
        );
        let synthesis = self.generate(Stage::Synthesis, prompt).await?;

        Ok(Staged::default().write(StateKey::CritiqueSynthesis, synthesis))
    }

    async fn run_mitigations(&self, state: &SessionState) -> WorkflowResult<Staged> {
        let synthesis = require_text(state, StateKey::CritiqueSynthesis)?;
        let summary = require_text(state, StateKey::ContextSummary)?;

        let prompt = prompts::mitigation_prompt(
            summary,
            synthesis,
            &combined_reflections(state),
            abstraction_level(state),
        );
        let mitigations = self.generate(Stage::Mitigation, prompt).await?;

        Ok(Staged::default().write(StateKey::MitigationOutput, mitigations))
    }
}

fn generate_context_prompt(state: &SessionState) -> WorkflowResult<Staged> {
    let synthesis = require_text(state, StateKey::CritiqueSynthesis)?;
    let mitigations = require_text(state, StateKey::MitigationOutput)?;

    Ok(Staged::default().write(
        StateKey::ContextPrompt,
        prompts::export_context_prompt(synthesis, mitigations),
    ))
}

/// Framework names from a critique, minus any already used.
fn framework_names(critique: &str, used: &[String]) -> WorkflowResult<Vec<String>> {
    let extracted = extract_framework_names(critique);
    let total = extracted.len();
    let names: Vec<String> = extracted
        .into_iter()
        .filter(|name| !used.contains(name))
        .collect();

    if names.len() < total {
        warn!(
            dropped = total - names.len(),
            "Critique reused frameworks from an earlier round"
        );
    }
    if names.is_empty() {
        return Err(WorkflowError::MalformedOutput {
            stage: "critique".to_string(),
            reason: "no framework sections found".to_string(),
        });
    }
    Ok(names)
}

fn abstraction_level(state: &SessionState) -> u8 {
    state
        .number(StateKey::AbstractionLevel)
        .map(|n| n.clamp(0, i64::from(MAX_ABSTRACTION_LEVEL)) as u8)
        .unwrap_or(DEFAULT_ABSTRACTION_LEVEL)
}

fn require_text(state: &SessionState, key: StateKey) -> WorkflowResult<&str> {
    state
        .text(key)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing(key))
}

fn require_list(state: &SessionState, key: StateKey) -> WorkflowResult<&[String]> {
    state
        .list(key)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| missing(key))
}

fn missing(key: StateKey) -> WorkflowError {
    WorkflowError::MissingPrerequisite {
        key: key.as_str().to_string(),
    }
}

fn validation(field: &str, reason: &str) -> WorkflowError {
    WorkflowError::Validation {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
