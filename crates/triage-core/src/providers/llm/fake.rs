use super::{LlmClient, LlmResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted stand-in for the inference backend. Pops replies in order;
/// falls back to the fixed response (or a minimal valid JSON object) when
/// the script runs dry.
pub struct FakeClient {
    model: String,
    script: Mutex<VecDeque<Result<String, String>>>,
    fixed_response: Option<String>,
}

impl FakeClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Mutex::new(VecDeque::new()),
            fixed_response: None,
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Queue a successful reply.
    pub fn push_text(&self, text: impl Into<String>) {
        self.script.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue a failed call (simulates a backend error for one item).
    pub fn push_error(&self, message: impl Into<String>) {
        self.script.lock().unwrap().push_back(Err(message.into()));
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, _prompt: &str, _system: Option<&str>) -> anyhow::Result<LlmResponse> {
        let scripted = self.script.lock().unwrap().pop_front();
        let text = match scripted {
            Some(Ok(text)) => text,
            Some(Err(message)) => anyhow::bail!("fake inference error: {}", message),
            None => self
                .fixed_response
                .clone()
                .unwrap_or_else(|| r#"{"verdict": "N/A", "justification": "fake"}"#.to_string()),
        };

        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
