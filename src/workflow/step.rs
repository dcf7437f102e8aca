use serde::Serialize;

use super::keys::StateKey;
use super::state::SessionState;

/// Where a session stands, derived from the keys present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Nothing submitted yet.
    Initial,
    /// Clarifying questions are waiting for answers.
    ClarifyShown,
    /// Context summary is ready for review.
    SummaryReady,
    /// Round 1 critique is waiting for reflections.
    Round1Shown,
    /// Round 1 reflections have been folded in.
    Round1Acknowledged,
    /// Round 2 critique is waiting for reflections.
    Round2Shown,
    /// Round 2 is folded in; round 3 can be picked or skipped.
    Round3Selector,
    /// Round 3 critique is waiting for reflections.
    Round3Shown,
    /// Critique rounds are done.
    PreSynthesis,
    /// Synthesis is ready.
    SynthesisDone,
    /// Mitigations are ready.
    Final,
}

impl Step {
    /// Numeric step as shown to clients.
    pub fn number(&self) -> u8 {
        match self {
            Step::Initial => 0,
            Step::ClarifyShown => 1,
            Step::SummaryReady => 2,
            Step::Round1Shown => 3,
            Step::Round1Acknowledged => 4,
            Step::Round2Shown => 5,
            Step::Round3Selector => 7,
            Step::Round3Shown => 8,
            Step::PreSynthesis => 10,
            Step::SynthesisDone => 11,
            Step::Final => 12,
        }
    }

    /// Snake-case step name.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Initial => "initial",
            Step::ClarifyShown => "clarify_shown",
            Step::SummaryReady => "summary_ready",
            Step::Round1Shown => "round_1_shown",
            Step::Round1Acknowledged => "round_1_acknowledged",
            Step::Round2Shown => "round_2_shown",
            Step::Round3Selector => "round_3_selector",
            Step::Round3Shown => "round_3_shown",
            Step::PreSynthesis => "pre_synthesis",
            Step::SynthesisDone => "synthesis_done",
            Step::Final => "final",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.number())
    }
}

/// Derive the step from the state, most advanced artifact first.
pub fn derive_step(state: &SessionState) -> Step {
    if state.is_set(StateKey::MitigationOutput) {
        Step::Final
    } else if state.is_set(StateKey::CritiqueSynthesis) {
        Step::SynthesisDone
    } else if state.is_set(StateKey::AcknowledgementRound3) || state.flag(StateKey::Round3Skipped)
    {
        Step::PreSynthesis
    } else if state.is_set(StateKey::CritiqueRound3) {
        Step::Round3Shown
    } else if state.is_set(StateKey::AcknowledgementRound2) {
        Step::Round3Selector
    } else if state.is_set(StateKey::CritiqueRound2) {
        Step::Round2Shown
    } else if state.is_set(StateKey::AcknowledgementRound1) {
        Step::Round1Acknowledged
    } else if state.is_set(StateKey::CritiqueRound1) {
        Step::Round1Shown
    } else if state.is_set(StateKey::ContextSummary) {
        Step::SummaryReady
    } else if state.is_set(StateKey::ClarificationOutput) {
        Step::ClarifyShown
    } else {
        Step::Initial
    }
}
