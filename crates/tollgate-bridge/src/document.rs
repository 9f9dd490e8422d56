//! The shared bridge document and its entries.
//!
//! On disk the document is a single JSON object:
//!
//! ```json
//! {
//!   "version": 1,
//!   "prompts": [{ "id": "…", "createdAt": "…", "question": { "message": "…" } }],
//!   "responses": [{ "promptId": "…", "action": "accept", "answer": "…", "respondedAt": "…" }]
//! }
//! ```
//!
//! A prompt with no matching response is *pending*. A response with no
//! matching prompt is an orphan and is ignored by every operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

use tollgate_core::Timestamp;

/// Current document version. Any other version reads as an empty document.
pub const DOCUMENT_VERSION: u32 = 1;

/// What the responder is asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Text shown to the human.
    pub message: String,
    /// Optional structured context (for example a redacted approval request).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl Question {
    /// A plain text question.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured context.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// A question waiting in the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    /// Unique prompt id. Never reused once the prompt is consumed.
    pub id: String,
    /// When the prompt was created.
    pub created_at: Timestamp,
    /// The question payload.
    pub question: Question,
}

impl Prompt {
    /// Create a prompt with a fresh random id.
    #[must_use]
    pub fn new(question: Question) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), question)
    }

    /// Create a prompt with a caller-chosen id.
    #[must_use]
    pub fn with_id(id: impl Into<String>, question: Question) -> Self {
        Self {
            id: id.into(),
            created_at: Timestamp::now(),
            question,
        }
    }
}

/// How the responder answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptAction {
    /// The human answered.
    Accept,
    /// The human refused to answer.
    Decline,
    /// The question was dismissed.
    Cancel,
}

impl fmt::Display for PromptAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Decline => write!(f, "decline"),
            Self::Cancel => write!(f, "cancel"),
        }
    }
}

/// An answer to a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    /// Id of the prompt being answered.
    pub prompt_id: String,
    /// Accept, decline or cancel.
    pub action: PromptAction,
    /// Free-form answer; `null` when there is none.
    #[serde(default)]
    pub answer: Value,
    /// When the answer was submitted.
    pub responded_at: Timestamp,
}

impl PromptResponse {
    /// Create a response stamped with the current time.
    #[must_use]
    pub fn new(prompt_id: impl Into<String>, action: PromptAction, answer: Value) -> Self {
        Self {
            prompt_id: prompt_id.into(),
            action,
            answer,
            responded_at: Timestamp::now(),
        }
    }

    /// An accepting response.
    #[must_use]
    pub fn accept(prompt_id: impl Into<String>, answer: Value) -> Self {
        Self::new(prompt_id, PromptAction::Accept, answer)
    }
}

/// The whole bridge state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeDocument {
    /// Format version.
    pub version: u32,
    /// Prompts that have not been consumed yet.
    #[serde(default)]
    pub prompts: Vec<Prompt>,
    /// Submitted answers.
    #[serde(default)]
    pub responses: Vec<PromptResponse>,
}

impl Default for BridgeDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            prompts: Vec::new(),
            responses: Vec::new(),
        }
    }
}

impl BridgeDocument {
    /// Decode a document, falling back to the empty state when the bytes
    /// are corrupt or carry another version.
    #[must_use]
    pub fn decode(bytes: &[u8], origin: &str) -> Self {
        match serde_json::from_slice::<Self>(bytes) {
            Ok(doc) if doc.version == DOCUMENT_VERSION => doc,
            Ok(doc) => {
                warn!(
                    path = origin,
                    found = doc.version,
                    expected = DOCUMENT_VERSION,
                    "bridge document version mismatch; starting from empty state"
                );
                Self::default()
            },
            Err(e) => {
                warn!(path = origin, error = %e, "corrupt bridge document; starting from empty state");
                Self::default()
            },
        }
    }

    /// Check whether `prompt_id` has an answer on file.
    #[must_use]
    pub fn has_response(&self, prompt_id: &str) -> bool {
        self.responses.iter().any(|r| r.prompt_id == prompt_id)
    }

    /// Look up a prompt by id.
    #[must_use]
    pub fn prompt(&self, prompt_id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == prompt_id)
    }

    /// Prompts without an answer, oldest first.
    #[must_use]
    pub fn pending(&self) -> Vec<&Prompt> {
        let mut pending: Vec<&Prompt> = self
            .prompts
            .iter()
            .filter(|p| !self.has_response(&p.id))
            .collect();
        pending.sort_by_key(|p| p.created_at);
        pending
    }

    /// Remove `prompt_id` and return its answer, if one is on file.
    ///
    /// Orphan responses are never returned and never removed here.
    pub fn take_response(&mut self, prompt_id: &str) -> Option<PromptResponse> {
        self.prompt(prompt_id)?;
        let index = self
            .responses
            .iter()
            .position(|r| r.prompt_id == prompt_id)?;
        let response = self.responses.remove(index);
        self.responses.retain(|r| r.prompt_id != prompt_id);
        self.prompts.retain(|p| p.id != prompt_id);
        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn prompt_at(id: &str, offset_secs: i64) -> Prompt {
        let mut prompt = Prompt::with_id(id, Question::new(id));
        prompt.created_at = Timestamp::from_datetime(
            prompt.created_at.into_inner() + Duration::seconds(offset_secs),
        );
        prompt
    }

    #[test]
    fn test_decode_corrupt_is_empty() {
        let doc = BridgeDocument::decode(b"{not json", "test");
        assert_eq!(doc, BridgeDocument::default());
    }

    #[test]
    fn test_decode_version_mismatch_is_empty() {
        let bytes = serde_json::to_vec(&json!({"version": 2, "prompts": [], "responses": []}))
            .unwrap();
        let doc = BridgeDocument::decode(&bytes, "test");
        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert!(doc.prompts.is_empty());
    }

    #[test]
    fn test_decode_wire_format() {
        let bytes = serde_json::to_vec(&json!({
            "version": 1,
            "prompts": [{
                "id": "p1",
                "createdAt": "2026-01-01T00:00:00Z",
                "question": {"message": "Proceed?"}
            }],
            "responses": [{
                "promptId": "p1",
                "action": "decline",
                "respondedAt": "2026-01-01T00:00:05Z"
            }]
        }))
        .unwrap();

        let doc = BridgeDocument::decode(&bytes, "test");
        assert_eq!(doc.prompts[0].question.message, "Proceed?");
        assert_eq!(doc.responses[0].action, PromptAction::Decline);
        assert_eq!(doc.responses[0].answer, Value::Null);
    }

    #[test]
    fn test_pending_is_sorted_oldest_first() {
        let doc = BridgeDocument {
            prompts: vec![prompt_at("late", 10), prompt_at("early", -10), prompt_at("mid", 0)],
            ..BridgeDocument::default()
        };
        let ids: Vec<&str> = doc.pending().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_pending_excludes_answered() {
        let doc = BridgeDocument {
            prompts: vec![prompt_at("a", 0), prompt_at("b", 1)],
            responses: vec![PromptResponse::accept("a", json!("yes"))],
            ..BridgeDocument::default()
        };
        let ids: Vec<&str> = doc.pending().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_take_response_consumes_prompt_and_answer() {
        let mut doc = BridgeDocument {
            prompts: vec![prompt_at("a", 0)],
            responses: vec![PromptResponse::accept("a", json!("yes"))],
            ..BridgeDocument::default()
        };
        let response = doc.take_response("a").unwrap();
        assert_eq!(response.answer, json!("yes"));
        assert!(doc.prompts.is_empty());
        assert!(doc.responses.is_empty());
    }

    #[test]
    fn test_orphan_response_is_inert() {
        let mut doc = BridgeDocument {
            responses: vec![PromptResponse::accept("ghost", json!("boo"))],
            ..BridgeDocument::default()
        };
        let before = doc.clone();
        assert!(doc.take_response("ghost").is_none());
        assert_eq!(doc, before);
        assert!(doc.pending().is_empty());
    }
}
