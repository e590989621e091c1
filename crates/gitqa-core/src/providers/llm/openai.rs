use super::LlmClient;
use crate::errors::ProviderError;
use crate::model::LlmResponse;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat completions client.
pub struct OpenAIClient {
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(model: String, api_key: String, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model,
            api_key,
            temperature,
            max_tokens,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point at another OpenAI-compatible endpoint (proxies, local gateways, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn map_status(
        status: reqwest::StatusCode,
        retry_after: Option<Duration>,
        body: String,
    ) -> ProviderError {
        match status.as_u16() {
            401 | 403 => ProviderError::Auth {
                status: status.as_u16(),
                message: body,
            },
            429 => ProviderError::RateLimited { retry_after },
            code @ 500..=599 => ProviderError::Server {
                status: code,
                message: body,
            },
            code => ProviderError::BadResponse {
                message: format!("HTTP {}: {}", code, body),
            },
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::new();
        for s in system.unwrap_or_default() {
            messages.push(json!({ "role": "system", "content": s }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e))?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            let error_text = resp.text().await.unwrap_or_default();
            return Err(Self::map_status(status, retry_after, error_text).into());
        }

        let json: serde_json::Value =
            resp.json()
                .await
                .map_err(|e| ProviderError::BadResponse {
                    message: format!("invalid JSON body: {}", e),
                })?;

        let text = json
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::BadResponse {
                message: "response missing choices[0].message.content".to_string(),
            })?
            .to_string();

        Ok(LlmResponse {
            text,
            provider: "openai".to_string(),
            model: self.model.clone(),
            meta: json.get("usage").cloned().unwrap_or(serde_json::Value::Null),
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_id(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_separates_transient_from_permanent() {
        use reqwest::StatusCode;

        let rate = OpenAIClient::map_status(
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(2)),
            String::new(),
        );
        assert_eq!(
            rate,
            ProviderError::RateLimited {
                retry_after: Some(Duration::from_secs(2))
            }
        );
        assert!(rate.is_transient());

        let server =
            OpenAIClient::map_status(StatusCode::BAD_GATEWAY, None, "upstream".to_string());
        assert!(server.is_transient());

        let auth = OpenAIClient::map_status(StatusCode::UNAUTHORIZED, None, "bad key".to_string());
        assert!(!auth.is_transient());

        let bad = OpenAIClient::map_status(StatusCode::BAD_REQUEST, None, "nope".to_string());
        assert!(matches!(bad, ProviderError::BadResponse { .. }));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OpenAIClient::new("gpt-4o-mini".into(), "k".into(), 0.0, 8)
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }
}
