//! C11: external collaborator interfaces.
//!
//! Authentication, the event log, the LLM, and the SVG receipt renderer are
//! all collaborators the Shield core depends on through traits only — this
//! crate never implements a production LLM/DB/auth integration. Each trait
//! ships exactly one deterministic stub, used as the default `Services`
//! wiring and in every test.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ShieldResult;

/// Intent classification result from the LLM collaborator.
#[derive(Debug, Clone, Default)]
pub struct IntentResult {
    pub category: String,
    pub parameters: Value,
    pub confidence: f64,
}

/// `classifyIntent` — degrades to `general`/0.0 confidence on failure,
/// never propagates an error into the analysis path.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify_intent(&self, message: &str) -> IntentResult;
}

/// `generateExplanation`/free-form agent chat. Both operations are
/// advisory text only — the verdict always comes from the scoring engine.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_explanation(&self, data: &Value, context: &str) -> Option<String>;
    async fn agent_chat(&self, message: &str) -> Option<String>;
}

/// One best-effort audit event.
#[derive(Debug, Clone)]
pub struct ShieldEvent {
    pub user_id: String,
    pub event_type: &'static str,
    pub chain: String,
    pub target: Option<String>,
    pub tx_hash: Option<String>,
    pub risk: Option<u8>,
    pub trust: Option<u8>,
    pub result: Option<String>,
}

/// `log(...)` — best-effort, fire-and-forget; failures never propagate.
#[async_trait]
pub trait EventLogger: Send + Sync {
    async fn log(&self, event: ShieldEvent);
}

/// A verified caller identity.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: String,
}

/// `getCurrentUser` — remote-verification shape only.
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn get_current_user(&self, bearer_token: &str) -> ShieldResult<User>;
}

/// SVG receipt card rendering — pure templating, out of core scope.
#[async_trait]
pub trait ReceiptRenderer: Send + Sync {
    async fn render_svg(&self, summary: &str) -> String;
}

/// Deterministic in-memory collaborator stubs.
pub mod stub {
    use super::*;

    /// Classifies everything as `general` with zero confidence — exercises
    /// the chat router's degrade path without ever fabricating intent.
    pub struct StubIntentClassifier;

    #[async_trait]
    impl IntentClassifier for StubIntentClassifier {
        async fn classify_intent(&self, _message: &str) -> IntentResult {
            IntentResult {
                category: "general".to_string(),
                parameters: Value::Null,
                confidence: 0.0,
            }
        }
    }

    /// Never produces text — exercises the "advisory text absent" path.
    pub struct StubTextGenerator;

    #[async_trait]
    impl TextGenerator for StubTextGenerator {
        async fn generate_explanation(&self, _data: &Value, _context: &str) -> Option<String> {
            None
        }

        async fn agent_chat(&self, _message: &str) -> Option<String> {
            None
        }
    }

    /// Discards events; logs at debug for visibility in tests.
    pub struct StubEventLogger;

    #[async_trait]
    impl EventLogger for StubEventLogger {
        async fn log(&self, event: ShieldEvent) {
            tracing::debug!(
                event_type = event.event_type,
                user = %event.user_id,
                "stub event logger (discarded)"
            );
        }
    }

    /// Returns a fixed anonymous user for every bearer token.
    pub struct StubAuthVerifier;

    #[async_trait]
    impl AuthVerifier for StubAuthVerifier {
        async fn get_current_user(&self, _bearer_token: &str) -> ShieldResult<User> {
            Ok(User {
                id: "stub-user".to_string(),
                email: "stub@example.invalid".to_string(),
                role: "member".to_string(),
            })
        }
    }

    /// Returns an empty SVG payload — real rendering is a front-end
    /// collaborator's responsibility.
    pub struct StubReceiptRenderer;

    #[async_trait]
    impl ReceiptRenderer for StubReceiptRenderer {
        async fn render_svg(&self, _summary: &str) -> String {
            String::new()
        }
    }
}
