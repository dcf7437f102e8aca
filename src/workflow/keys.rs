use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every key the session store may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKey {
    /// Problem statement as submitted.
    Problem,
    /// Proposed approach as submitted.
    Approach,
    /// Primary stakeholder, possibly blank.
    Stakeholder,
    /// Constraints, one entry per submitted line.
    Constraints,
    /// Critique abstraction level, 0 to 10.
    AbstractionLevel,
    /// The idea rendered as one prompt block.
    FormattedInput,
    /// Raw clarification reply.
    ClarificationOutput,
    /// Model's restatement of the idea.
    ReframedUnderstanding,
    /// The five clarifying questions.
    ClarificationQuestions,
    /// User's correction to the restatement, or `-`.
    UnderstandingCorrection,
    /// Answers keyed by question text.
    ClarificationAnswers,
    /// Running context summary, rewritten by every fold.
    ContextSummary,
    /// Round 1 critique text.
    CritiqueRound1,
    /// Frameworks used in round 1.
    FrameworksRound1,
    /// Round 1 reflections keyed by framework.
    UserResponsesRound1,
    /// Acknowledgement of the round 1 reflections.
    AcknowledgementRound1,
    /// Round 2 critique text.
    CritiqueRound2,
    /// Frameworks used in round 2.
    FrameworksRound2,
    /// Round 2 reflections keyed by framework.
    UserResponsesRound2,
    /// Acknowledgement of the round 2 reflections.
    AcknowledgementRound2,
    /// Frameworks the user picked for round 3.
    SelectedFrameworksRound3,
    /// Round 3 critique text.
    CritiqueRound3,
    /// Set when round 3 was skipped.
    Round3Skipped,
    /// Round 3 reflections keyed by framework.
    UserResponsesRound3,
    /// Acknowledgement of the round 3 reflections.
    AcknowledgementRound3,
    /// Synthesis across all critique rounds.
    CritiqueSynthesis,
    /// Mitigations and improvements.
    MitigationOutput,
    /// Exportable context prompt.
    ContextPrompt,
}

impl StateKey {
    /// All keys, in pipeline order.
    pub const ALL: [StateKey; 28] = [
        StateKey::Problem,
        StateKey::Approach,
        StateKey::Stakeholder,
        StateKey::Constraints,
        StateKey::AbstractionLevel,
        StateKey::FormattedInput,
        StateKey::ClarificationOutput,
        StateKey::ReframedUnderstanding,
        StateKey::ClarificationQuestions,
        StateKey::UnderstandingCorrection,
        StateKey::ClarificationAnswers,
        StateKey::ContextSummary,
        StateKey::CritiqueRound1,
        StateKey::FrameworksRound1,
        StateKey::UserResponsesRound1,
        StateKey::AcknowledgementRound1,
        StateKey::CritiqueRound2,
        StateKey::FrameworksRound2,
        StateKey::UserResponsesRound2,
        StateKey::AcknowledgementRound2,
        StateKey::SelectedFrameworksRound3,
        StateKey::CritiqueRound3,
        StateKey::Round3Skipped,
        StateKey::UserResponsesRound3,
        StateKey::AcknowledgementRound3,
        StateKey::CritiqueSynthesis,
        StateKey::MitigationOutput,
        StateKey::ContextPrompt,
    ];

    /// Get the key name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::Problem => "problem",
            StateKey::Approach => "approach",
            StateKey::Stakeholder => "stakeholder",
            StateKey::Constraints => "constraints",
            StateKey::AbstractionLevel => "abstraction_level",
            StateKey::FormattedInput => "formatted_input",
            StateKey::ClarificationOutput => "clarification_output",
            StateKey::ReframedUnderstanding => "reframed_understanding",
            StateKey::ClarificationQuestions => "clarification_questions",
            StateKey::UnderstandingCorrection => "understanding_correction",
            StateKey::ClarificationAnswers => "clarification_answers",
            StateKey::ContextSummary => "context_summary",
            StateKey::CritiqueRound1 => "critique_round_1",
            StateKey::FrameworksRound1 => "frameworks_used_round_1",
            StateKey::UserResponsesRound1 => "user_responses_round_1",
            StateKey::AcknowledgementRound1 => "acknowledgement_round_1",
            StateKey::CritiqueRound2 => "critique_round_2",
            StateKey::FrameworksRound2 => "frameworks_used_round_2",
            StateKey::UserResponsesRound2 => "user_responses_round_2",
            StateKey::AcknowledgementRound2 => "acknowledgement_round_2",
            StateKey::SelectedFrameworksRound3 => "user_selected_frameworks",
            StateKey::CritiqueRound3 => "critique_round_3",
            StateKey::Round3Skipped => "done_round_3",
            StateKey::UserResponsesRound3 => "user_responses_round_3",
            StateKey::AcknowledgementRound3 => "acknowledgement_round_3",
            StateKey::CritiqueSynthesis => "critique_synthesis",
            StateKey::MitigationOutput => "mitigation_improvement_output",
            StateKey::ContextPrompt => "context_prompt",
        }
    }

    /// Critique text key for a round (1-3).
    pub fn critique(round: u8) -> Option<StateKey> {
        match round {
            1 => Some(StateKey::CritiqueRound1),
            2 => Some(StateKey::CritiqueRound2),
            3 => Some(StateKey::CritiqueRound3),
            _ => None,
        }
    }

    /// Framework name list key for a round (1-3).
    pub fn frameworks(round: u8) -> Option<StateKey> {
        match round {
            1 => Some(StateKey::FrameworksRound1),
            2 => Some(StateKey::FrameworksRound2),
            3 => Some(StateKey::SelectedFrameworksRound3),
            _ => None,
        }
    }

    /// Reflection map key for a round (1-3).
    pub fn responses(round: u8) -> Option<StateKey> {
        match round {
            1 => Some(StateKey::UserResponsesRound1),
            2 => Some(StateKey::UserResponsesRound2),
            3 => Some(StateKey::UserResponsesRound3),
            _ => None,
        }
    }

    /// Acknowledgement key for a round (1-3).
    pub fn acknowledgement(round: u8) -> Option<StateKey> {
        match round {
            1 => Some(StateKey::AcknowledgementRound1),
            2 => Some(StateKey::AcknowledgementRound2),
            3 => Some(StateKey::AcknowledgementRound3),
            _ => None,
        }
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StateKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StateKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("Unknown state key: {}", s))
    }
}

/// A stored value.
///
/// Serialized untagged so persisted entries read as plain JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    /// Boolean marker.
    Flag(bool),
    /// Integer value.
    Number(i64),
    /// Free text.
    Text(String),
    /// Ordered strings.
    List(Vec<String>),
    /// String map with sorted keys.
    Map(BTreeMap<String, String>),
}

impl StateValue {
    /// Whether the value counts as present for step derivation.
    pub fn is_truthy(&self) -> bool {
        match self {
            StateValue::Flag(b) => *b,
            StateValue::Number(n) => *n != 0,
            StateValue::Text(s) => !s.is_empty(),
            StateValue::List(items) => !items.is_empty(),
            StateValue::Map(entries) => !entries.is_empty(),
        }
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        StateValue::Text(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::Text(value.to_string())
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        StateValue::Flag(value)
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        StateValue::Number(value)
    }
}

impl From<Vec<String>> for StateValue {
    fn from(value: Vec<String>) -> Self {
        StateValue::List(value)
    }
}

impl From<BTreeMap<String, String>> for StateValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        StateValue::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_key_round_trips_through_str() {
        for key in StateKey::ALL {
            assert_eq!(key.as_str().parse::<StateKey>().unwrap(), key);
        }
    }

    #[test]
    fn test_state_key_names_are_unique() {
        let mut names: Vec<&str> = StateKey::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StateKey::ALL.len());
    }

    #[test]
    fn test_state_key_from_str_unknown() {
        let err = "current_step".parse::<StateKey>().unwrap_err();
        assert_eq!(err, "Unknown state key: current_step");
    }

    #[test]
    fn test_round_key_helpers() {
        assert_eq!(StateKey::critique(2), Some(StateKey::CritiqueRound2));
        assert_eq!(
            StateKey::frameworks(3),
            Some(StateKey::SelectedFrameworksRound3)
        );
        assert_eq!(StateKey::responses(4), None);
        assert_eq!(StateKey::acknowledgement(0), None);
    }

    #[test]
    fn test_state_value_untagged_json() {
        let values = vec![
            StateValue::Flag(true),
            StateValue::Number(7),
            StateValue::Text("hello".to_string()),
            StateValue::List(vec!["a".to_string()]),
            StateValue::Map(BTreeMap::from([("q".to_string(), "a".to_string())])),
        ];
        for value in values {
            let json = serde_json::to_string(&value).unwrap();
            let back: StateValue = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value);
        }
        assert_eq!(
            serde_json::to_string(&StateValue::Text("x".to_string())).unwrap(),
            "\"x\""
        );
    }

    #[test]
    fn test_state_value_truthiness() {
        assert!(!StateValue::Flag(false).is_truthy());
        assert!(!StateValue::Text(String::new()).is_truthy());
        assert!(!StateValue::List(vec![]).is_truthy());
        assert!(StateValue::Text("-".to_string()).is_truthy());
        assert!(!StateValue::Number(0).is_truthy());
    }
}
