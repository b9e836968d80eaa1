use super::LlmClient;
use crate::model::LlmResponse;
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Deterministic scripted client for tests and offline dry runs.
///
/// Replies are consumed in order; when the script runs out, every further
/// call returns the last reply (or an error if the script was empty).
pub struct FakeClient {
    replies: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
}

impl FakeClient {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
        }
    }

    /// Convenience: wraps each statement in the `<sql_query>` contract.
    pub fn scripted_sql(statements: &[&str]) -> Self {
        Self::new(
            statements
                .iter()
                .map(|s| format!("<answer><sql_query>{}</sql_query></answer>", s))
                .collect(),
        )
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<LlmResponse> {
        let next = self.replies.lock().unwrap().pop_front();
        let text = match next {
            Some(t) => {
                *self.last.lock().unwrap() = Some(t.clone());
                t
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| anyhow::anyhow!("fake client has no scripted replies"))?,
        };

        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: "fake".to_string(),
            meta: json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
