//! Respond command - answer a pending prompt.

use anyhow::{Result, bail};
use serde_json::Value;

use tollgate_bridge::{PromptAction, PromptBridge, PromptResponse};

use crate::theme::Theme;

/// Map the `--decline` / `--cancel` flags to an action.
pub(crate) fn action_from_flags(decline: bool, cancel: bool) -> PromptAction {
    if cancel {
        PromptAction::Cancel
    } else if decline {
        PromptAction::Decline
    } else {
        PromptAction::Accept
    }
}

/// Interpret the answer argument: JSON when it parses, text otherwise.
pub(crate) fn parse_answer(raw: Option<&str>) -> Value {
    match raw {
        None => Value::Null,
        Some(text) => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned())),
    }
}

/// Submit the answer. Fails when the bridge does not accept it.
pub(crate) fn run_respond(
    bridge: &PromptBridge,
    id: &str,
    action: PromptAction,
    answer: Option<&str>,
) -> Result<()> {
    let response = PromptResponse::new(id, action, parse_answer(answer));
    if !bridge.submit_response(response)? {
        bail!("prompt '{id}' was not accepted: it does not exist or is already answered");
    }
    println!("{}", Theme::success(&format!("Sent {action} for prompt {id}")));
    Ok(())
}
