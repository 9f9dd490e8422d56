//! Ask command - enqueue a question and wait for the answer.

use std::time::Duration;

use anyhow::{Result, bail};
use serde_json::Value;

use tollgate_bridge::{Prompt, PromptAction, PromptBridge, Question};

use crate::theme::Theme;

/// Ask `message` and print the answer on stdout.
///
/// Progress goes to stderr so the answer can be piped.
pub(crate) async fn run_ask(
    bridge: &PromptBridge,
    message: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let prompt = Prompt::new(Question::new(message));
    let id = prompt.id.clone();
    bridge.enqueue(prompt)?;
    eprintln!(
        "{}",
        Theme::info(&format!("Waiting for an answer to prompt {id}"))
    );

    let response = bridge.wait_for_response(&id, timeout, poll_interval).await?;
    match response.action {
        PromptAction::Accept => {
            println!("{}", render_answer(&response.answer));
            Ok(())
        },
        action => {
            eprintln!("{}", Theme::warning(&format!("Prompt {id} got {action}")));
            bail!("no answer: responder chose {action}")
        },
    }
}

/// Strings print bare; everything else prints as JSON.
fn render_answer(answer: &Value) -> String {
    match answer {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tollgate_bridge::PromptResponse;

    #[test]
    fn test_render_answer() {
        assert_eq!(render_answer(&json!("main")), "main");
        assert_eq!(render_answer(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(render_answer(&Value::Null), "null");
    }

    #[tokio::test]
    async fn test_ask_declined_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = PromptBridge::new(dir.path().join("bridge.json"));

        let responder = bridge.clone();
        let handle = std::thread::spawn(move || {
            for _ in 0..200 {
                if let Some(p) = responder.list_pending().unwrap().into_iter().next() {
                    responder
                        .submit_response(PromptResponse::new(p.id, PromptAction::Decline, Value::Null))
                        .unwrap();
                    return;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
        });

        let result = run_ask(&bridge, "Continue?", Duration::from_secs(5), Duration::from_millis(10)).await;
        handle.join().unwrap();
        assert!(result.is_err());
        assert!(bridge.list_pending().unwrap().is_empty());
    }
}
