//! LLM boundary. The core assembles a [`Prompt`] and consumes
//! an [`LlmReply`]; which model answers it is an external concern. A real
//! client is wired in by the embedding application — [`StubLlmClient`] only
//! documents the seam.

use async_trait::async_trait;
use cpi_api::{Error, ErrorCode, RiskLevel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
}

/// The reply shape validated against. `risk_level` and
/// `change_intent` are required; missing either triggers the one retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmReply {
    pub risk_level: Option<RiskLevel>,
    pub change_intent: Option<String>,
    #[serde(default)]
    pub downstream_dependency_notes: Option<String>,
    #[serde(default)]
    pub cross_service_impact: Option<String>,
    #[serde(default)]
    pub functional_impact: Option<String>,
    #[serde(default)]
    pub test_strategy: Vec<String>,
}

impl LlmReply {
    pub fn has_required_fields(&self) -> bool {
        self.risk_level.is_some() && self.change_intent.is_some()
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<LlmReply, Error>;
}

pub struct StubLlmClient;

#[async_trait]
impl LlmClient for StubLlmClient {
    async fn complete(&self, _prompt: &Prompt) -> Result<LlmReply, Error> {
        Err(Error::new(
            ErrorCode::LlmError,
            "no LLM client configured; StubLlmClient never succeeds",
        ))
    }
}

/// Fixed-reply fake for tests that exercise the orchestrator end to end
/// without a real model.
pub struct FixedLlmClient {
    pub reply: LlmReply,
}

#[async_trait]
impl LlmClient for FixedLlmClient {
    async fn complete(&self, _prompt: &Prompt) -> Result<LlmReply, Error> {
        Ok(self.reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_client_always_errors() {
        let client = StubLlmClient;
        let err = client.complete(&Prompt { text: String::new() }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::LlmError);
    }

    #[test]
    fn reply_missing_required_fields_is_detected() {
        let reply = LlmReply {
            risk_level: None,
            change_intent: Some("adds a field".to_string()),
            downstream_dependency_notes: None,
            cross_service_impact: None,
            functional_impact: None,
            test_strategy: Vec::new(),
        };
        assert!(!reply.has_required_fields());
    }
}
