use crate::model::LlmResponse;
use async_trait::async_trait;

pub mod fake;
pub mod openai;

pub use fake::FakeClient;
pub use openai::OpenAIClient;

/// Text-completion backend used as the judge.
///
/// Implementations report failures as `anyhow::Error` wrapping a
/// [`crate::errors::ProviderError`] where the failure kind is known, so the
/// judge can tell transient failures from permanent ones.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str, system: Option<&[String]>)
        -> anyhow::Result<LlmResponse>;

    fn provider_name(&self) -> &'static str;

    fn model_id(&self) -> String {
        "default".to_string()
    }
}
