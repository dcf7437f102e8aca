//! The text generation seam used by the workflow.
//!
//! The workflow only ever calls [`Generator::generate`]. [`LangbaseClient`]
//! is the production implementation; tests substitute scripted or mocked
//! generators.
//!
//! [`LangbaseClient`]: super::LangbaseClient

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LangbaseResult;
use crate::prompts;

/// Workflow stage a generation call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reframe the idea and ask clarifying questions.
    Clarify,
    /// Consolidate the idea and clarification answers into the first summary.
    Summary,
    /// Critique the idea through selected frameworks.
    Critique,
    /// Acknowledge reflections and replace the context summary.
    ContextUpdate,
    /// Rank unresolved concerns across rounds.
    Synthesis,
    /// Propose mitigations and improvements.
    Mitigation,
}

impl Stage {
    /// All stages, in pipeline order.
    pub const ALL: [Stage; 6] = [
        Stage::Clarify,
        Stage::Summary,
        Stage::Critique,
        Stage::ContextUpdate,
        Stage::Synthesis,
        Stage::Mitigation,
    ];

    /// Get the stage name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Clarify => "clarify",
            Stage::Summary => "summary",
            Stage::Critique => "critique",
            Stage::ContextUpdate => "context_update",
            Stage::Synthesis => "synthesis",
            Stage::Mitigation => "mitigation",
        }
    }

    /// Sampling temperature used for this stage.
    pub fn temperature(&self) -> f64 {
        match self {
            Stage::Clarify | Stage::Summary => 1.0,
            Stage::Critique | Stage::ContextUpdate | Stage::Synthesis => 0.7,
            Stage::Mitigation => 0.55,
        }
    }

    /// System instructions sent with every call for this stage.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Stage::Clarify | Stage::Summary => prompts::CLARIFY_SYSTEM_PROMPT,
            Stage::Critique => prompts::CRITIQUE_SYSTEM_PROMPT,
            Stage::ContextUpdate => prompts::CONTEXT_UPDATE_SYSTEM_PROMPT,
            Stage::Synthesis => prompts::SYNTHESIS_SYSTEM_PROMPT,
            Stage::Mitigation => prompts::MITIGATION_SYSTEM_PROMPT,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Stage that selects the pipe.
    pub stage: Stage,
    /// System instructions, sent ahead of the prompt.
    pub system: String,
    /// User prompt.
    pub prompt: String,
    /// Sampling temperature, sent with every run.
    pub temperature: f64,
}

impl GenerationRequest {
    /// Build a request with the stage's default system prompt and temperature.
    pub fn for_stage(stage: Stage, prompt: impl Into<String>) -> Self {
        Self {
            stage,
            system: stage.system_prompt().to_string(),
            prompt: prompt.into(),
            temperature: stage.temperature(),
        }
    }
}

/// Text generation backend.
///
/// Implementations own retries, model selection and authentication.
/// Callers treat any error as fatal to the current action.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for the given request.
    async fn generate(&self, request: GenerationRequest) -> LangbaseResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_temperatures() {
        assert_eq!(Stage::Critique.temperature(), 0.7);
        assert_eq!(Stage::ContextUpdate.temperature(), 0.7);
        assert_eq!(Stage::Mitigation.temperature(), 0.55);
        assert_eq!(Stage::Clarify.temperature(), 1.0);
    }

    #[test]
    fn test_for_stage_uses_stage_defaults() {
        let req = GenerationRequest::for_stage(Stage::Synthesis, "prompt body");
        assert_eq!(req.stage, Stage::Synthesis);
        assert_eq!(req.system, prompts::SYNTHESIS_SYSTEM_PROMPT);
        assert_eq!(req.prompt, "prompt body");
        assert_eq!(req.temperature, 0.7);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::ContextUpdate.to_string(), "context_update");
        assert_eq!(Stage::ALL.len(), 6);
    }
}
