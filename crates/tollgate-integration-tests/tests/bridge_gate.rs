//! The approval gate driven by a human answering through the prompt bridge.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;

use tollgate_approval::{ApprovalError, ApprovalGate, ApprovalPolicy, ApprovalRequest};
use tollgate_bridge::{BridgeApprovalHandler, Prompt, PromptAction, PromptBridge, PromptResponse};
use tollgate_core::ToolCall;
use tollgate_test::{RecordingSink, test_policy};

const POLL: Duration = Duration::from_millis(10);

/// Play the human: wait for the single pending prompt and answer it.
fn answer_when_asked(bridge: PromptBridge, action: PromptAction, answer: Value) -> Prompt {
    let deadline = std::time::Instant::now()
        .checked_add(Duration::from_secs(10))
        .unwrap();
    loop {
        if let Some(prompt) = bridge.list_pending().unwrap().into_iter().next() {
            let response = PromptResponse::new(prompt.id.clone(), action, answer);
            assert!(bridge.submit_response(response).unwrap());
            return prompt;
        }
        assert!(std::time::Instant::now() < deadline, "no prompt appeared");
        std::thread::sleep(POLL);
    }
}

fn gate_over(bridge: &PromptBridge, policy: ApprovalPolicy) -> ApprovalGate {
    let handler = BridgeApprovalHandler::new(bridge.clone())
        .with_timeout(Duration::from_secs(10))
        .with_poll_interval(POLL);
    ApprovalGate::new(policy, Arc::new(handler))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn accepted_prompt_runs_the_tool_with_redacted_details() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prompt-bridge.json");
    let agent = PromptBridge::new(&path);
    let sink = RecordingSink::new();
    let gate = gate_over(&agent, ApprovalPolicy::new(true)).with_sink(Arc::new(sink.clone()));

    let human = std::thread::spawn({
        let bridge = PromptBridge::new(&path);
        move || answer_when_asked(bridge, PromptAction::Accept, Value::Null)
    });

    let call = ToolCall::new("writeFile", json!({"path": "/tmp/out", "apiKey": "sk-123"}));
    let result: anyhow::Result<Value> = gate
        .execute_with_approval(call, |call| async move { Ok(call.args) })
        .await;

    assert_eq!(result.unwrap()["apiKey"], json!("sk-123"));

    let prompt = human.join().unwrap();
    let details = prompt.question.details.unwrap();
    let request: ApprovalRequest = serde_json::from_value(details).unwrap();
    assert_eq!(request.tool_name, "writeFile");
    assert_eq!(prompt.id, request.trace_id.to_string());
    assert!(!prompt.question.message.contains("sk-123"));
    assert_ne!(request.display_args["apiKey"], json!("sk-123"));

    assert!(agent.list_pending().unwrap().is_empty());
    assert_eq!(sink.names(), vec!["approval_requested", "approval_approved"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn declined_prompt_is_a_denial_with_the_humans_words() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prompt-bridge.json");
    let agent = PromptBridge::new(&path);
    let gate = gate_over(&agent, test_policy());

    let human = std::thread::spawn({
        let bridge = PromptBridge::new(&path);
        move || answer_when_asked(bridge, PromptAction::Decline, json!("not today"))
    });

    let ran = AtomicBool::new(false);
    let result: Result<(), ApprovalError> = gate
        .execute_with_approval(ToolCall::new("deleteFile", json!({"path": "/"})), |_call| {
            ran.store(true, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

    let prompt = human.join().unwrap();
    match result {
        Err(ApprovalError::Denied {
            trace_id,
            tool_name,
            reason,
        }) => {
            assert_eq!(tool_name, "deleteFile");
            assert_eq!(reason.as_deref(), Some("not today"));
            assert_eq!(trace_id.to_string(), prompt.id);
        },
        other => panic!("expected denial, got {other:?}"),
    }
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn accepted_override_reaches_the_executor() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prompt-bridge.json");
    let gate = gate_over(&PromptBridge::new(&path), ApprovalPolicy::new(true));

    let human = std::thread::spawn({
        let bridge = PromptBridge::new(&path);
        move || {
            answer_when_asked(
                bridge,
                PromptAction::Accept,
                json!({"override_args": {"path": "/tmp/sandbox"}}),
            )
        }
    });

    let result: anyhow::Result<Value> = gate
        .execute_with_approval(
            ToolCall::new("writeFile", json!({"path": "/etc/passwd"})),
            |call| async move { Ok(call.args) },
        )
        .await;

    human.join().unwrap();
    assert_eq!(result.unwrap(), json!({"path": "/tmp/sandbox"}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_prompt_denies_the_call() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prompt-bridge.json");
    let gate = gate_over(&PromptBridge::new(&path), ApprovalPolicy::new(true));

    let human = std::thread::spawn({
        let bridge = PromptBridge::new(&path);
        move || answer_when_asked(bridge, PromptAction::Cancel, Value::Null)
    });

    let result: Result<(), ApprovalError> = gate
        .execute_with_approval(ToolCall::new("shell", json!({"cmd": "ls"})), |_call| async {
            Ok(())
        })
        .await;

    human.join().unwrap();
    let err = result.unwrap_err();
    assert!(err.is_denied());
    assert!(err.to_string().contains("cancelled"));
}

#[tokio::test]
async fn unanswered_prompt_fails_the_handler_and_is_withdrawn() {
    let dir = TempDir::new().unwrap();
    let bridge = PromptBridge::new(dir.path().join("prompt-bridge.json"));
    let handler = BridgeApprovalHandler::new(bridge.clone())
        .with_timeout(Duration::from_millis(40))
        .with_poll_interval(POLL);
    let gate = ApprovalGate::new(ApprovalPolicy::new(true), Arc::new(handler));

    let result: Result<(), ApprovalError> = gate
        .execute_with_approval(ToolCall::new("writeFile", json!({})), |_call| async {
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(ApprovalError::HandlerFailed(_))));
    assert!(bridge.list_pending().unwrap().is_empty());
}

#[tokio::test]
async fn allowlisted_tool_never_touches_the_bridge() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prompt-bridge.json");
    let gate = gate_over(&PromptBridge::new(&path), test_policy());

    let result: anyhow::Result<&str> = gate
        .execute_with_approval(ToolCall::new("readFile", json!({"path": "a"})), |_call| async {
            Ok("contents")
        })
        .await;

    assert_eq!(result.unwrap(), "contents");
    assert!(!path.exists());
}
