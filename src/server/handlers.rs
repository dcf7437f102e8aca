use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use super::SharedState;
use crate::error::{McpError, McpResult};
use crate::frameworks::FrameworkOption;
use crate::storage::{Invocation, Storage};
use crate::workflow::{
    derive_step, update_summary_fields, Action, ActionKind, FoldFormat, SessionState, StateValue,
    Step,
};

/// Route tool calls to appropriate handlers
pub async fn handle_tool_call(
    state: &SharedState,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    match tool_name {
        "hardener_action" => handle_action(state, arguments).await,
        "hardener_state" => handle_state(state, arguments).await,
        "hardener_frameworks" => handle_frameworks(state).await,
        _ => Err(McpError::UnknownTool {
            tool_name: tool_name.to_string(),
        }),
    }
}

/// Parameters for `hardener_action`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionParams {
    /// Session to act on; a new session is started when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Action name.
    pub action: String,
    /// Form fields. Non-string values are converted to text.
    #[serde(default)]
    pub form: HashMap<String, Value>,
}

/// Result of `hardener_action`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Session the action ran against.
    pub session_id: String,
    /// Step number after the action.
    pub step: u8,
    /// Step name after the action.
    pub step_name: String,
    /// Set when the action was rejected; the state is unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// How the reflections were folded, for reflection submissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgement_format: Option<FoldFormat>,
    /// Keys present after the action.
    pub keys: Vec<String>,
}

impl ActionResult {
    fn new(session_id: &str, step: Step, session: &SessionState) -> Self {
        Self {
            session_id: session_id.to_string(),
            step: step.number(),
            step_name: step.name().to_string(),
            message: None,
            acknowledgement_format: None,
            keys: session.keys().iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// A single `update_summary` form field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    /// Form key to submit.
    pub field: String,
    /// Label to show, usually the question text.
    pub label: String,
}

/// Result of `hardener_state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateView {
    /// Session identifier.
    pub session_id: String,
    /// Derived step number.
    pub step: u8,
    /// Derived step name.
    pub step_name: String,
    /// Stored entries keyed by name.
    pub entries: BTreeMap<String, StateValue>,
    /// Fields to fill for `update_summary`, once clarification has run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clarification_fields: Vec<FormField>,
}

/// Result of `hardener_frameworks`.
#[derive(Debug, Clone, Serialize)]
pub struct FrameworksResult {
    /// Catalog entries, in catalog order.
    pub frameworks: Vec<FrameworkOption>,
}

/// Handle hardener_action: load, dispatch, persist, log.
async fn handle_action(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let start = Instant::now();
    let params: ActionParams = parse_arguments("hardener_action", arguments)?;

    let session_id = params
        .session_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut session = state
        .storage
        .load_state(&session_id)
        .await?
        .unwrap_or_default();

    let invocation = Invocation::new(
        params.action.clone(),
        serde_json::to_value(&params).unwrap_or_default(),
    )
    .with_session(&session_id);

    let form = form_to_strings(&params.form);
    let dispatched = match Action::from_form(&params.action, &form) {
        Ok(action) => state.dispatcher.dispatch(&mut session, action).await,
        Err(e) => Err(e),
    };
    let latency_ms = start.elapsed().as_millis() as i64;

    match dispatched {
        Ok(outcome) => {
            if outcome.action == ActionKind::ResetApp {
                state.storage.delete_session(&session_id).await?;
            } else {
                state.storage.save_state(&session_id, &session).await?;
            }

            let mut result = ActionResult::new(&session_id, outcome.step, &session);
            result.acknowledgement_format = outcome.acknowledgement_format;
            let output = serde_json::to_value(&result)?;

            state
                .storage
                .log_invocation(&invocation.success(output.clone(), latency_ms))
                .await?;
            info!(
                session_id = %session_id,
                action = %outcome.action,
                step = outcome.step.number(),
                latency_ms,
                "Action persisted"
            );
            Ok(output)
        }
        Err(e) if e.is_recoverable() => {
            warn!(session_id = %session_id, action = %params.action, error = %e, "Action rejected");
            state
                .storage
                .log_invocation(&invocation.failure(e.to_string(), latency_ms))
                .await?;

            let mut result = ActionResult::new(&session_id, derive_step(&session), &session);
            result.message = Some(e.to_string());
            Ok(serde_json::to_value(result)?)
        }
        Err(e) => {
            state
                .storage
                .log_invocation(&invocation.failure(e.to_string(), latency_ms))
                .await?;
            Err(McpError::ExecutionFailed {
                message: e.to_string(),
            })
        }
    }
}

/// Handle hardener_state: the stored state and its derived step
async fn handle_state(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    #[derive(Deserialize)]
    struct StateParams {
        session_id: String,
    }

    let params: StateParams = parse_arguments("hardener_state", arguments)?;

    let session = state
        .storage
        .load_state(&params.session_id)
        .await?
        .ok_or_else(|| McpError::InvalidParameters {
            tool_name: "hardener_state".to_string(),
            message: format!("Session not found: {}", params.session_id),
        })?;

    let step = derive_step(&session);
    let view = StateView {
        session_id: params.session_id,
        step: step.number(),
        step_name: step.name().to_string(),
        entries: session
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect(),
        clarification_fields: update_summary_fields(&session)
            .into_iter()
            .map(|(field, label)| FormField { field, label })
            .collect(),
    };

    serde_json::to_value(view).map_err(McpError::Json)
}

/// Handle hardener_frameworks: catalog names and tooltips
async fn handle_frameworks(state: &SharedState) -> McpResult<Value> {
    let result = FrameworksResult {
        frameworks: state.catalog().options(),
    };
    serde_json::to_value(result).map_err(McpError::Json)
}

/// Flatten JSON form values to the text the workflow parses.
///
/// Arrays become newline-separated lines; null becomes empty.
fn form_to_strings(form: &HashMap<String, Value>) -> HashMap<String, String> {
    form.iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        Some(args) => serde_json::from_value(args).map_err(|e| McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: e.to_string(),
        }),
        None => Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: "Missing arguments".to_string(),
        }),
    }
}
