use super::LlmClient;
use crate::model::LlmResponse;
use async_trait::async_trait;

/// Deterministic offline judge for dry runs and tests.
#[derive(Debug)]
pub struct FakeClient {
    model: String,
    fixed_response: Option<String>,
}

impl FakeClient {
    pub fn new(model: String) -> Self {
        Self {
            model,
            fixed_response: None,
        }
    }

    pub fn with_response(mut self, response: String) -> Self {
        self.fixed_response = Some(response);
        self
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(
        &self,
        _prompt: &str,
        _system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse> {
        let text = self.fixed_response.clone().unwrap_or_else(|| {
            serde_json::json!({
                "pattern_recognition": 0,
                "pattern_recognition_justification": "fake judge",
                "specific_evidence": 0,
                "specific_evidence_justification": "fake judge",
                "root_cause_analysis": 0,
                "root_cause_analysis_justification": "fake judge",
                "actionable_insights": 0,
                "actionable_insights_justification": "fake judge",
                "total_score": 0,
                "overall_assessment": "Fake judge: no scoring performed."
            })
            .to_string()
        });

        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: self.model.clone(),
            meta: serde_json::json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_id(&self) -> String {
        self.model.clone()
    }
}
