//! Key ownership and downstream invalidation.
//!
//! Each action owns the keys it writes. Re-running an action clears its own
//! keys and every key owned by an action later in [`PIPELINE`].

use std::collections::BTreeSet;
use tracing::debug;

use super::actions::ActionKind;
use super::keys::StateKey;
use super::state::SessionState;

/// Pipeline positions in order. Actions sharing a slot are alternatives.
pub const PIPELINE: &[&[ActionKind]] = &[
    &[ActionKind::SubmitIdea],
    &[ActionKind::UpdateSummary],
    &[ActionKind::RunCritique1],
    &[ActionKind::SubmitR1],
    &[ActionKind::RunCritique2],
    &[ActionKind::SubmitR2],
    &[ActionKind::RunRound3, ActionKind::SkipRound3],
    &[ActionKind::SubmitR3],
    &[ActionKind::RunSynthesis],
    &[ActionKind::RunMitigations],
    &[ActionKind::GenerateContextPrompt],
];

/// Keys an action writes directly.
///
/// `submit_r1`..`submit_r3` also replace `context_summary`, which stays owned
/// by `update_summary`: one summary value exists and each fold overwrites it.
pub fn owned_keys(kind: ActionKind) -> &'static [StateKey] {
    match kind {
        ActionKind::SubmitIdea => &[
            StateKey::Problem,
            StateKey::Approach,
            StateKey::Stakeholder,
            StateKey::Constraints,
            StateKey::AbstractionLevel,
            StateKey::FormattedInput,
            StateKey::ClarificationOutput,
            StateKey::ReframedUnderstanding,
            StateKey::ClarificationQuestions,
        ],
        ActionKind::UpdateSummary => &[
            StateKey::UnderstandingCorrection,
            StateKey::ClarificationAnswers,
            StateKey::ContextSummary,
        ],
        ActionKind::RunCritique1 => &[StateKey::CritiqueRound1, StateKey::FrameworksRound1],
        ActionKind::SubmitR1 => &[
            StateKey::UserResponsesRound1,
            StateKey::AcknowledgementRound1,
        ],
        ActionKind::RunCritique2 => &[StateKey::CritiqueRound2, StateKey::FrameworksRound2],
        ActionKind::SubmitR2 => &[
            StateKey::UserResponsesRound2,
            StateKey::AcknowledgementRound2,
        ],
        ActionKind::RunRound3 => &[
            StateKey::SelectedFrameworksRound3,
            StateKey::CritiqueRound3,
        ],
        ActionKind::SkipRound3 => &[StateKey::Round3Skipped],
        ActionKind::SubmitR3 => &[
            StateKey::UserResponsesRound3,
            StateKey::AcknowledgementRound3,
        ],
        ActionKind::RunSynthesis => &[StateKey::CritiqueSynthesis],
        ActionKind::RunMitigations => &[StateKey::MitigationOutput],
        ActionKind::GenerateContextPrompt => &[StateKey::ContextPrompt],
        ActionKind::ResetApp => &[],
    }
}

/// Pipeline position of an action, `None` for `reset_app`.
pub fn position(kind: ActionKind) -> Option<usize> {
    PIPELINE.iter().position(|slot| slot.contains(&kind))
}

/// Keys owned by the action's pipeline slot or any later slot.
///
/// `reset_app` maps to every key.
pub fn downstream_keys(kind: ActionKind) -> BTreeSet<StateKey> {
    let Some(start) = position(kind) else {
        return StateKey::ALL.into_iter().collect();
    };

    PIPELINE[start..]
        .iter()
        .flat_map(|slot| slot.iter())
        .flat_map(|action| owned_keys(*action).iter().copied())
        .collect()
}

/// Remove every downstream key of `kind` from the state.
///
/// Absent keys are skipped; calling this twice equals calling it once.
pub fn invalidate(state: &mut SessionState, kind: ActionKind) {
    let mut removed = 0usize;
    for key in downstream_keys(kind) {
        if state.pop(key).is_some() {
            removed += 1;
        }
    }
    debug!(action = %kind, removed, "Invalidated downstream keys");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::keys::StateValue;

    fn full_state() -> SessionState {
        StateKey::ALL
            .into_iter()
            .map(|key| (key, StateValue::Text(format!("v-{}", key))))
            .collect()
    }

    #[test]
    fn test_every_key_has_one_owner() {
        for key in StateKey::ALL {
            let owners: Vec<ActionKind> = ActionKind::ALL
                .into_iter()
                .filter(|kind| owned_keys(*kind).contains(&key))
                .collect();
            assert_eq!(owners.len(), 1, "{} owned by {:?}", key, owners);
        }
    }

    #[test]
    fn test_every_action_has_a_position_except_reset() {
        for kind in ActionKind::ALL {
            assert_eq!(position(kind).is_none(), kind == ActionKind::ResetApp);
        }
    }

    #[test]
    fn test_invalidate_removes_exactly_downstream_and_is_idempotent() {
        for kind in ActionKind::ALL {
            let mut state = full_state();
            let downstream = downstream_keys(kind);
            invalidate(&mut state, kind);

            for key in StateKey::ALL {
                assert_eq!(
                    state.contains(key),
                    !downstream.contains(&key),
                    "{} after invalidating {}",
                    key,
                    kind
                );
            }

            let once = state.clone();
            invalidate(&mut state, kind);
            assert_eq!(state, once);
        }
    }

    #[test]
    fn test_round_3_alternatives_share_downstream_set() {
        let run = downstream_keys(ActionKind::RunRound3);
        let skip = downstream_keys(ActionKind::SkipRound3);
        assert_eq!(run, skip);
        assert!(run.contains(&StateKey::Round3Skipped));
        assert!(run.contains(&StateKey::CritiqueRound3));
        assert!(run.contains(&StateKey::UserResponsesRound3));
        assert!(!run.contains(&StateKey::AcknowledgementRound2));
    }

    #[test]
    fn test_downstream_closure_shrinks_along_pipeline() {
        let sizes: Vec<usize> = PIPELINE
            .iter()
            .map(|slot| downstream_keys(slot[0]).len())
            .collect();
        assert!(sizes.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(
            downstream_keys(ActionKind::SubmitIdea).len(),
            StateKey::ALL.len()
        );
    }

    #[test]
    fn test_invalidate_on_empty_state_is_noop() {
        let mut state = SessionState::new();
        invalidate(&mut state, ActionKind::RunCritique1);
        assert!(state.is_empty());
    }

    #[test]
    fn test_submit_r1_keeps_context_summary() {
        let mut state = full_state();
        invalidate(&mut state, ActionKind::SubmitR1);
        assert!(state.contains(StateKey::ContextSummary));
        assert!(state.contains(StateKey::FrameworksRound1));
        assert!(!state.contains(StateKey::AcknowledgementRound1));
    }
}
