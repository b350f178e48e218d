pub mod fake;
pub mod openai;

pub use fake::FakeClient;
pub use openai::OpenAiCompatClient;

use crate::registry::ModelFamily;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
}

/// Opaque inference call. Implementations return the raw model text; the
/// stage executors own prompt construction and output parsing.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> anyhow::Result<LlmResponse>;

    fn provider_name(&self) -> &'static str;
}

/// Maps a model family to its deployed client. Both families may share one
/// client (common in offline runs).
#[derive(Clone)]
pub struct ClientRouter {
    qwen: Arc<dyn LlmClient>,
    smol: Arc<dyn LlmClient>,
}

impl ClientRouter {
    pub fn new(qwen: Arc<dyn LlmClient>, smol: Arc<dyn LlmClient>) -> Self {
        Self { qwen, smol }
    }

    pub fn single(client: Arc<dyn LlmClient>) -> Self {
        Self {
            qwen: client.clone(),
            smol: client,
        }
    }

    pub fn for_family(&self, family: ModelFamily) -> Arc<dyn LlmClient> {
        match family {
            ModelFamily::Qwen => self.qwen.clone(),
            ModelFamily::Smol => self.smol.clone(),
        }
    }
}
