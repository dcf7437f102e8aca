//! Centralized prompt definitions for the hardening workflow
//!
//! This module contains every system prompt and prompt builder used by the
//! server. The output formats requested here are the contracts the parsers in
//! `workflow::parse` depend on; change them together.

/// Header preceding the numbered clarifying questions.
pub const QUESTIONS_MARKER: &str = "Clarifying Questions:";

/// Marker preceding the acknowledgement in a context update reply.
pub const ACKNOWLEDGEMENT_MARKER: &str = "ACKNOWLEDGEMENT:";

/// Marker preceding the replacement context summary in a context update reply.
pub const UPDATED_SUMMARY_MARKER: &str = "UPDATED CONTEXT SUMMARY:";

/// System prompt for the clarification and initial summary stages.
pub const CLARIFY_SYSTEM_PROMPT: &str =
    "You are a helpful and structured idea critique assistant.";

/// System prompt for every critique round.
pub const CRITIQUE_SYSTEM_PROMPT: &str = "You are a structured and rigorous critique assistant.";

/// System prompt for the context update after each round of reflections.
pub const CONTEXT_UPDATE_SYSTEM_PROMPT: &str =
    "You are a clear and concise context summarization assistant.";

/// System prompt for the cross-round synthesis.
pub const SYNTHESIS_SYSTEM_PROMPT: &str =
    "You are a concise prioritization and synthesis assistant.";

/// System prompt for mitigation and improvement suggestions.
pub const MITIGATION_SYSTEM_PROMPT: &str =
    "You are a structured and practical mitigation recommender.";

/// Label for the understanding-correction field shown above the questions.
pub const UNDERSTANDING_CORRECTION_LABEL: &str =
    "Correct the model's understanding (type '-' if none)";

const ABSTRACTION_CALIBRATION: &str = r#"Calibrate the depth and angle of your critique to this level:
- Level 0-3 (Practical): Focus on execution risks: specific resource gaps, named actors, near-term blockers, and operational failure modes.
- Level 4-6 (Balanced): Balance structural concerns with concrete execution risks.
- Level 7-10 (Abstract): Focus on structural and conceptual risks: incentive dynamics, logical dependencies, systemic assumptions, and model-level flaws."#;

const CRITIQUE_OUTPUT_FORMAT: &str = r#"Output Format:
(important information should be outlined with **...**, to make it stand out in markdown)

### Framework Name 1
[Framework 1 output structure]

### Framework Name 2
[Framework 2 output structure]

### Framework Name 3
[Framework 3 output structure]"#;

/// Build the clarification prompt for a freshly submitted idea.
pub fn clarification_prompt(formatted_input: &str) -> String {
    format!(
        r#"ROLE: You are the Clarifier in the Idea Hardener process. Your only job is to ensure you fully understand the user's idea before any critique happens.
CONTEXT: The user has submitted an early-stage idea. Carefully reframe it, decompose it, and uncover missing elements by asking precise clarifying questions.

USER INPUT:
---
{formatted_input}
---

INSTRUCTIONS:
1. Rephrase the idea in a more holistic and structured way. Summarize it logically.
2. Decompose it into parts: problem, proposed solution, personas, assumptions.
3. Identify what is missing or ambiguous (constraints, stakeholders, logic gaps).
4. Ask exactly 5 clarifying questions to resolve these gaps.
   - Be targeted and specific.
   - DO NOT include suggestions or critique.

FINAL OUTPUT FORMAT:
Reframed Understanding:
[Your holistic, structured restatement of the idea.]

{QUESTIONS_MARKER}
1. ...
2. ...
3. ...
4. ...
5. ...
"#
    )
}

/// Build the prompt that produces the first context summary.
pub fn summary_prompt(
    formatted_input: &str,
    understanding_correction: &str,
    answers: &[(String, String)],
) -> String {
    let answers_text = answers
        .iter()
        .map(|(question, answer)| format!("Q: {}\nA: {}", question, answer))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are the Summarizer in the Idea Hardener process.
Here is the structured context provided by the user so far:

{formatted_input}

Correction to the model's understanding:
{understanding_correction}

Clarification Answers:
{answers_text}

Your task:
1. Produce a concise, logically structured summary that captures:
   - The problem being tackled
   - The proposed idea
   - The relevant stakeholder(s)
   - Any constraints or boundaries
   - Key clarifications just added. If the clarification answers were gibberish, one-word, or otherwise unhelpful, include one plain sentence noting this.
2. Write in an assertive tone. This summary becomes the base memory for every later step.

Output format:
**Updated Idea Summary:**
[Your 6-8 sentence structured summary]
"#
    )
}

/// Build the round 1 critique prompt over the full catalog.
pub fn critique_round_1_prompt(
    context_summary: &str,
    abstraction_level: u8,
    catalog_text: &str,
) -> String {
    format!(
        r#"You are the Critique Engine in the Idea Hardener workflow.

Here is the user's idea context:
---
{context_summary}
---

Critique Abstraction Level: {abstraction_level}
{ABSTRACTION_CALIBRATION}

Below is a list of possible critique frameworks. Select exactly three (3) that will surface the most distinct and non-obvious risks for this specific idea, not the most generic ones.

Available frameworks:
{catalog_text}

Your task:
Select 3 frameworks and critique the idea through each one.
- Be direct and specific. A real risk should be stated as a real risk.
- Where something is a potentially fatal flaw, say so explicitly.
- Focus ONLY on critique and DO NOT propose solutions or mitigations.
- Use the output instructions included in the framework list to guide your critique format.

{CRITIQUE_OUTPUT_FORMAT}
"#
    )
}

/// Build the round 2 critique prompt. `used` frameworks are listed as
/// forbidden and never appear among the candidates.
pub fn critique_round_2_prompt(
    context_summary: &str,
    abstraction_level: u8,
    used: &[String],
    candidates_text: &str,
) -> String {
    let used_text = used.join(", ");
    format!(
        r#"You are the Critique Engine in the Idea Hardener workflow.

Here is the UPDATED user's idea context:
---
{context_summary}
---

Critique Abstraction Level: {abstraction_level}
{ABSTRACTION_CALIBRATION}

The following critique frameworks were already used in Round 1.
You MUST NOT use them again and must choose orthogonal alternatives.

Used frameworks (DO NOT select):
{used_text}

Available frameworks:
{candidates_text}

Your task:
- Select exactly three (3) frameworks from the available list.
- Ensure they are meaningfully different from those used in Round 1.
- For each selected framework, follow its output instructions and focus ONLY on critique (risks, assumptions, blind spots, constraints).
- DO NOT propose solutions or mitigations.
- Avoid repeating critique already covered in Round 1.

{CRITIQUE_OUTPUT_FORMAT}
"#
    )
}

/// Build the round 3 critique prompt over user-selected frameworks.
pub fn critique_round_3_prompt(
    context_summary: &str,
    abstraction_level: u8,
    selected_text: &str,
) -> String {
    format!(
        r#"You are the Critique Engine in the Idea Hardener workflow.

Here is the UPDATED user's idea context:
---
{context_summary}
---

Critique Abstraction Level: {abstraction_level}
{ABSTRACTION_CALIBRATION}

The user has chosen the following frameworks for critique:
{selected_text}

Your task:
- Critique only through the selected frameworks. No additions, no extras.
- This is the final round. Prioritize depth over breadth and surface the risks earlier rounds circled around but did not confront.
- Do not re-raise issues the user has genuinely resolved. If they addressed something poorly or introduced new assumptions, that is fair game.
- Where something is a potentially fatal flaw, say so explicitly.
- Focus ONLY on critique and DO NOT propose solutions or mitigations.

{CRITIQUE_OUTPUT_FORMAT}
"#
    )
}

/// Build the context update prompt that folds one round of reflections
/// into a replacement summary.
pub fn context_update_prompt(
    round: u8,
    previous_summary: &str,
    critique_text: &str,
    user_feedback: &str,
) -> String {
    format!(
        r#"You are the Context Updater in the Idea Hardener process.

We have completed Round {round} of critique. Acknowledge the user's reflections and produce an updated context summary that carries forward into the next step.

Here is the previous context summary (all context accumulated so far):
---
{previous_summary}
---

Here is the critique output from Round {round}:
---
{critique_text}
---

Here is the user's response to that critique:
---
{user_feedback}
---

Part 1, Acknowledgement:
Write a short response directly to the user in the second person ("you said", "you suggested"). Aim for 5-6 sentences covering the most substantive points they raised. If their response was vague, one-word, or gibberish, say so plainly.

Part 2, Updated Context Summary:
Produce a structured summary that consolidates everything known so far. It replaces the previous summary entirely, so it must be complete and self-contained. Include:
- Problem
- Idea / Approach
- Stakeholder / Audience
- Constraints & Non-Negotiables
- Key reflections and position updates from ALL critique rounds so far
- Unresolved tensions or open questions the user has not yet addressed

Output format:

{ACKNOWLEDGEMENT_MARKER}
[5-6 sentences directly to the user]

---

{UPDATED_SUMMARY_MARKER}
[Full structured summary]
"#
    )
}

/// Build the synthesis prompt over every round's critique and reflections.
pub fn synthesis_prompt(
    context_summary: &str,
    all_critiques: &str,
    all_reflections: &str,
) -> String {
    format!(
        r#"You are the Synthesis Engine in the Idea Hardener workflow.

The user has completed the critique rounds and reflected on each. Do not summarize what happened. Tell them what it means: the most important unresolved problems, where their thinking has genuinely strengthened, and where they may be fooling themselves.

Here is the FINAL consolidated context summary:
---
{context_summary}
---

Here are ALL critiques raised across the critique rounds:
---
{all_critiques}
---

Here are the user's reflections across all critique rounds:
---
{all_reflections}
---

Your task:
1. Cross-cutting themes: 2-3 concerns that appeared across multiple frameworks or rounds.
2. Resolved vs. unresolved: for each major concern, has the user genuinely addressed it or only acknowledged it?
3. Blind spots that remain, only if clearly supported by the material.
4. Criticality ranking: the top 3 unresolved concerns in order, each with one sentence, a High / Medium / Low rating, and one sentence on why.

Output format:

**Critique Synthesis**

**Cross-cutting themes:**
**What you've genuinely resolved:**
**What remains unresolved:**
**Remaining blind spot:**
**Top 3 concerns going into mitigation:**
1. [Concern] - Criticality: High/Medium/Low - [Why]
2. [Concern] - Criticality: High/Medium/Low - [Why]
3. [Concern] - Criticality: High/Medium/Low - [Why]
"#
    )
}

/// Build the mitigation prompt.
pub fn mitigation_prompt(
    context_summary: &str,
    critique_synthesis: &str,
    all_reflections: &str,
    abstraction_level: u8,
) -> String {
    format!(
        r#"You are the Mitigation & Improvement Engine in the Idea Hardener workflow.

Here is the final consolidated context summary:
---
{context_summary}
---

Here is the critique synthesis with criticality levels:
---
{critique_synthesis}
---

Here are the user's reflections across all critique rounds:
---
{all_reflections}
---

Critique Abstraction Level: {abstraction_level}

For each critique insight:
1) Provide 2 mitigation strategies: realistic steps that reduce the identified risk.
2) Provide 2 idea improvement suggestions that strengthen or pivot the idea while staying true to its intent.
3) Frame recommendations with the stakeholder, the constraints and the abstraction level in mind.

Do NOT repeat critique points; focus on actionable ideas.

Output format:

**Mitigations & Improvement Ideas**

**[Framework / Critique]**
**Criticality:** High | Medium | Low

1) Mitigation Strategies:
- ...
- ...

2) Idea Improvement Suggestions:
- ...
- ...
"#
    )
}

/// Build the copy-paste context prompt for continuing in another assistant.
///
/// No generation call is involved, and only the synthesis and mitigations
/// are carried over.
pub fn export_context_prompt(
    critique_synthesis: &str,
    mitigations: &str,
) -> String {
    format!(
        r#"You are an expert reasoning assistant.

I previously worked through a structured critique process to stress-test an idea. Help me continue working on that idea using the full context below.

Your task:
- Do NOT re-critique unless explicitly asked
- Focus on constructive solution development

AGGREGATED CRITIQUE SUMMARY
{critique_synthesis}

MITIGATIONS & IMPROVEMENTS
{mitigations}

INSTRUCTIONS
Using the context above, help me continue productively.
[ADD YOUR PRIORITIES, FOCUS TOPICS (MITIGATIONS) OR OTHER INSTRUCTIONS]"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clarification_prompt_requests_question_marker() {
        let prompt = clarification_prompt("Problem:\nX");
        assert!(prompt.contains("Problem:\nX"));
        assert!(prompt.contains(QUESTIONS_MARKER));
        assert!(prompt.contains("5. ..."));
    }

    #[test]
    fn test_context_update_prompt_requests_both_markers() {
        let prompt = context_update_prompt(2, "old summary", "critique", "feedback");
        assert!(prompt.contains("Round 2"));
        let ack = prompt.find(ACKNOWLEDGEMENT_MARKER).unwrap();
        let summary = prompt.find(UPDATED_SUMMARY_MARKER).unwrap();
        assert!(ack < summary);
    }

    #[test]
    fn test_round_2_prompt_separates_used_and_available() {
        let used = vec!["Alpha".to_string(), "Beta".to_string()];
        let prompt = critique_round_2_prompt("ctx", 5, &used, "Gamma:\ndesc");
        let (head, available) = prompt.split_once("Available frameworks:").unwrap();
        assert!(head.contains("Alpha, Beta"));
        assert!(available.contains("Gamma:"));
        assert!(!available.contains("Alpha"));
    }

    #[test]
    fn test_summary_prompt_lists_answers() {
        let answers = vec![("Who pays?".to_string(), "-".to_string())];
        let prompt = summary_prompt("input", "none", &answers);
        assert!(prompt.contains("Q: Who pays?\nA: -"));
        assert!(prompt.contains("Correction to the model's understanding:\nnone"));
    }

    #[test]
    fn test_export_context_prompt_is_static_format() {
        let prompt = export_context_prompt("synth", "mit");
        assert!(prompt.starts_with("You are an expert reasoning assistant."));
        assert!(!prompt.contains("IDEA CONTEXT"));
        assert!(prompt.contains("AGGREGATED CRITIQUE SUMMARY\nsynth"));
        assert!(prompt.contains("MITIGATIONS & IMPROVEMENTS\nmit"));
    }
}
