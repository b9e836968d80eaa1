use super::LlmClient;
use crate::model::LlmResponse;
use async_trait::async_trait;
use serde_json::json;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    pub model: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(model: String, api_key: String, max_tokens: u32) -> Self {
        Self {
            model,
            api_key,
            max_tokens,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> anyhow::Result<LlmResponse> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error ({}): {}", status, error_text);
        }

        let json: serde_json::Value = resp.json().await?;

        let text = json
            .pointer("/content/0/text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Anthropic API response missing content text"))?
            .to_string();

        let meta = json!({
            "stop_reason": json.get("stop_reason").cloned().unwrap_or_default(),
            "usage": json.get("usage").cloned().unwrap_or_default(),
        });

        Ok(LlmResponse {
            text,
            provider: "anthropic".to_string(),
            model: self.model.clone(),
            meta,
        })
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }
}
