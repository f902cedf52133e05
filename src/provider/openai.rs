// src/provider/openai.rs — OpenAI Chat Completions provider
//
// Also serves any OpenAI-compatible endpoint via `with_base_url`.

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, CompletionStop, ModelInfo, ModelProvider, Role, TokenUsage};
use crate::infra::errors::TandemError;

pub struct OpenAiProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: "https://api.openai.com/v1".into(),
        }
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut messages = Vec::new();

        if let Some(system) = &request.system {
            messages.push(serde_json::json!({
                "role": "system",
                "content": system,
            }));
        }

        for m in &request.messages {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(serde_json::json!({
                "role": role,
                "content": m.content,
            }));
        }

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        body
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn id(&self) -> &str {
        "openai"
    }

    fn name(&self) -> &str {
        "OpenAI"
    }

    fn models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo {
                id: "gpt-4o".into(),
                name: "GPT-4o".into(),
                context_window: 128_000,
                max_output_tokens: 16_384,
                input_price_per_mtok: 2.5,
                output_price_per_mtok: 10.0,
            },
            ModelInfo {
                id: "gpt-4o-mini".into(),
                name: "GPT-4o Mini".into(),
                context_window: 128_000,
                max_output_tokens: 16_384,
                input_price_per_mtok: 0.15,
                output_price_per_mtok: 0.6,
            },
            ModelInfo {
                id: "gpt-4.1".into(),
                name: "GPT-4.1".into(),
                context_window: 1_047_576,
                max_output_tokens: 32_768,
                input_price_per_mtok: 2.0,
                output_price_per_mtok: 8.0,
            },
        ]
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, TandemError> {
        let body = self.build_request_body(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| TandemError::Provider {
                provider: "openai".into(),
                message: e.to_string(),
                retriable: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TandemError::RateLimited {
                provider: "openai".into(),
                retry_after_ms: 5000,
            });
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(TandemError::Provider {
                provider: "openai".into(),
                message: format!("HTTP {}: {}", status, error_body),
                retriable: status.is_server_error(),
            });
        }

        let resp: serde_json::Value = response.json().await.map_err(|e| TandemError::Provider {
            provider: "openai".into(),
            message: format!("Failed to parse response: {}", e),
            retriable: false,
        })?;

        let choice = &resp["choices"][0];
        let content = choice["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        let usage = TokenUsage {
            input_tokens: resp["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: resp["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        };

        let stop = match choice["finish_reason"].as_str() {
            Some("stop") => CompletionStop::EndTurn,
            Some("length") => CompletionStop::MaxTokens,
            _ => CompletionStop::Unknown,
        };

        Ok(ChatResponse {
            content,
            usage,
            stop,
        })
    }
}
